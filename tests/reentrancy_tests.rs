// tests/reentrancy_tests.rs
//
// Registered functions may call back into the resolver. The depth limit is
// shared across those calls, so a callback chain cannot run away.

use std::cell::RefCell;

use ftl_engine::ast::Resource;
use ftl_engine::runtime::current_depth;
use ftl_engine::{
    parse, resolve, EntryIndex, FunctionRegistry, ResolverConfig, ResolverError, Value,
};
use once_cell::sync::Lazy;
use pretty_assertions::assert_eq;

const SOURCE: &str = "\
outer = { NEST() }
explode = { NEST_THEN_PANIC() }
";

static RESOURCE: Lazy<Resource> = Lazy::new(|| parse(SOURCE));
static INDEX: Lazy<EntryIndex<'static>> = Lazy::new(|| EntryIndex::from_resource(&RESOURCE));
static FUNCTIONS: Lazy<FunctionRegistry> = Lazy::new(|| {
    let mut functions = FunctionRegistry::with_builtins();
    functions.register("NEST", |_, _| {
        let (text, errors) = reenter("outer");
        INNER_ERRORS.with(|seen| seen.borrow_mut().extend(errors));
        Ok(Value::from(format!("[{text}]")))
    });
    functions.register("NEST_THEN_PANIC", |_, _| {
        let (text, _) = reenter("outer");
        panic!("giving up after {text}");
    });
    functions
});

const MAX_DEPTH: usize = 10;

thread_local! {
    static INNER_ERRORS: RefCell<Vec<ResolverError>> = const { RefCell::new(Vec::new()) };
}

fn config() -> ResolverConfig {
    ResolverConfig::default()
        .with_isolating(false)
        .with_max_expression_depth(MAX_DEPTH)
}

fn reenter(id: &str) -> (String, Vec<ResolverError>) {
    resolve(&INDEX, id, None, None, "en", &FUNCTIONS, config())
}

fn take_inner_errors() -> Vec<ResolverError> {
    INNER_ERRORS.with(|seen| seen.take())
}

// ---
// Depth across callbacks
// ---

#[test]
fn test_reentrant_chain_is_bounded() {
    take_inner_errors();
    let (text, errors) = reenter("outer");

    // Each level wraps the level below it; the innermost hits the limit.
    let levels = text.chars().take_while(|&ch| ch == '[').count();
    assert!(levels >= 3, "expected at least three nested calls, got {text}");
    assert!(levels < MAX_DEPTH);
    assert!(text.contains("{???}"));
    assert!(errors.is_empty());

    let inner = take_inner_errors();
    assert_eq!(inner, vec![ResolverError::DepthExceeded { max: MAX_DEPTH }]);
    assert_eq!(current_depth(), 0);
}

#[test]
fn test_depth_is_released_after_callback_panic() {
    take_inner_errors();
    let (text, errors) = reenter("explode");
    assert_eq!(text, "{NEST_THEN_PANIC()}");
    assert_eq!(
        errors,
        vec![ResolverError::FunctionPanicked {
            name: "NEST_THEN_PANIC".into()
        }]
    );
    assert_eq!(current_depth(), 0);

    // The thread is still usable afterwards.
    let (again, _) = reenter("outer");
    assert!(again.starts_with("[[["));
    assert_eq!(current_depth(), 0);
}

#[test]
fn test_default_limit_does_not_overflow_the_stack() {
    let (text, _) = resolve(
        &INDEX,
        "outer",
        None,
        None,
        "en",
        &FUNCTIONS,
        ResolverConfig::default().with_isolating(false),
    );
    // The callback itself uses the smaller limit, so the chain stops there.
    assert!(text.contains("{???}"));
    assert_eq!(current_depth(), 0);
}

#[test]
fn test_threads_have_independent_depth() {
    let handles: Vec<_> = (0..4)
        .map(|_| {
            std::thread::spawn(|| {
                let (text, _) = reenter("outer");
                (text, current_depth())
            })
        })
        .collect();
    let (expected, _) = reenter("outer");
    for handle in handles {
        let (text, depth) = handle.join().unwrap();
        assert_eq!(text, expected);
        assert_eq!(depth, 0);
    }
}
