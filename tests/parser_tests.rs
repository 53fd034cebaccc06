// tests/parser_tests.rs

use ftl_engine::ast::{
    AnnotationCode, CommentLevel, Entry, Expression, Literal, Pattern, PatternElement, Resource,
    VariantKey,
};
use ftl_engine::{parse, parse_with_config, ParserConfig};
use pretty_assertions::assert_eq;

// A helper to get the value pattern of the only message in a resource.
fn only_message_value(resource: &Resource) -> &Pattern {
    let messages: Vec<_> = resource.messages().collect();
    assert_eq!(messages.len(), 1, "expected exactly one message");
    messages[0].value.as_ref().expect("message has a value")
}

fn only_placeable(pattern: &Pattern) -> &Expression {
    match pattern.elements.as_slice() {
        [PatternElement::Placeable(placeable)] => placeable.expression.as_ref(),
        other => panic!("expected a single placeable, got {other:?}"),
    }
}

fn annotation_codes(resource: &Resource) -> Vec<AnnotationCode> {
    resource
        .junk()
        .flat_map(|junk| junk.annotations.iter().map(|a| a.code))
        .collect()
}

// ---
// Messages and patterns
// ---

#[test]
fn test_parse_simple_message() {
    let resource = parse("hello = Hello, world!\n");
    assert_eq!(only_message_value(&resource), &Pattern::text("Hello, world!"));
}

#[test]
fn test_parse_multiline_with_common_indent() {
    let source = "\
poem =
    Roses are red,
      violets are blue,

    FTL is neat.
";
    let resource = parse(source);
    assert_eq!(
        only_message_value(&resource),
        &Pattern::text("Roses are red,\n  violets are blue,\n\nFTL is neat.")
    );
}

#[test]
fn test_parse_trailing_spaces_trimmed() {
    let resource = parse("key = value   \n");
    assert_eq!(only_message_value(&resource), &Pattern::text("value"));
}

#[test]
fn test_parse_message_with_only_attributes() {
    let resource = parse("login =\n    .placeholder = Email\n    .aria-label = Login\n");
    let message = resource.messages().next().unwrap();
    assert!(message.value.is_none());
    assert_eq!(message.attributes.len(), 2);
    assert_eq!(
        message.attribute("aria-label").map(|a| &a.value),
        Some(&Pattern::text("Login"))
    );
}

#[test]
fn test_parse_message_without_value_or_attributes_is_junk() {
    let resource = parse("empty =\nnext = ok\n");
    assert_eq!(resource.junk().count(), 1);
    assert_eq!(resource.messages().count(), 1);
}

#[test]
fn test_parse_term_requires_value() {
    let resource = parse("-brand =\n    .gender = masculine\n");
    assert_eq!(resource.terms().count(), 0);
    assert_eq!(resource.junk().count(), 1);
}

// ---
// Expressions
// ---

#[test]
fn test_parse_string_escapes() {
    let resource = parse(r#"quote = { "\"\u0041\\" }"#);
    match only_placeable(only_message_value(&resource)) {
        Expression::StringLiteral(literal) => {
            assert_eq!(literal.value(), "\"A\\");
            assert_eq!(literal.raw(), r#"\"\u0041\\"#);
        }
        other => panic!("expected a string literal, got {other:?}"),
    }
}

#[test]
fn test_parse_line_feed_escape() {
    let resource = parse("lines = { \"one\\ntwo\" }\n");
    assert!(!resource.has_errors());
    match only_placeable(only_message_value(&resource)) {
        Expression::StringLiteral(literal) => assert_eq!(literal.value(), "one\ntwo"),
        other => panic!("expected a string literal, got {other:?}"),
    }
}

#[test]
fn test_parse_unknown_escape_is_junk() {
    let resource = parse("bad = { \"\\t\" }\n");
    assert_eq!(annotation_codes(&resource), vec![AnnotationCode::ParseJunk]);
}

#[test]
fn test_parse_function_with_named_arguments() {
    let resource = parse("price = { NUMBER($amount, minimumFractionDigits: 2, style: \"currency\") }\n");
    let Expression::FunctionReference { id, arguments } =
        only_placeable(only_message_value(&resource))
    else {
        panic!("expected a function call");
    };
    assert_eq!(id.as_str(), "NUMBER");
    assert_eq!(arguments.positional().len(), 1);
    let named: Vec<_> = arguments.named().iter().map(|a| a.name.as_str()).collect();
    assert_eq!(named, vec!["minimumFractionDigits", "style"]);
    assert!(matches!(arguments.named()[0].value, Literal::NumberLiteral(_)));
}

#[test]
fn test_parse_term_reference_with_arguments() {
    let resource = parse("-brand = Firefox\nabout = About { -brand(case: \"genitive\") }\n");
    let message = resource.messages().next().unwrap();
    let pattern = message.value.as_ref().unwrap();
    let PatternElement::Placeable(placeable) = &pattern.elements[1] else {
        panic!("expected a placeable");
    };
    let Expression::TermReference { id, arguments, .. } = placeable.expression.as_ref() else {
        panic!("expected a term reference");
    };
    assert_eq!(id.as_str(), "brand");
    assert_eq!(arguments.as_ref().map(|a| a.named().len()), Some(1));
}

#[test]
fn test_parse_select_expression() {
    let source = "\
emails = { $count ->
    [0] No emails
    [one] One email
   *[other] { $count } emails
}
";
    let resource = parse(source);
    let Expression::SelectExpression(select) = only_placeable(only_message_value(&resource))
    else {
        panic!("expected a select expression");
    };
    let keys: Vec<_> = select.variants().iter().map(|v| v.key.text()).collect();
    assert_eq!(keys, vec!["0", "one", "other"]);
    assert!(matches!(select.variants()[0].key, VariantKey::NumberLiteral(_)));
    assert_eq!(select.default_variant().key.text(), "other");
}

#[test]
fn test_parse_select_without_default_is_junk() {
    let resource = parse("m = { $x ->\n    [a] A\n    [b] B\n}\n");
    assert_eq!(resource.messages().count(), 0);
    assert_eq!(annotation_codes(&resource), vec![AnnotationCode::ParseJunk]);
}

#[test]
fn test_parse_select_with_two_defaults_is_junk() {
    let resource = parse("m = { $x ->\n   *[a] A\n   *[b] B\n}\n");
    assert_eq!(resource.messages().count(), 0);
}

#[test]
fn test_parse_message_reference_selector_is_junk() {
    let resource = parse("m = { other ->\n   *[a] A\n}\nother = x\n");
    assert_eq!(resource.junk().count(), 1);
    assert_eq!(resource.messages().count(), 1);
}

#[test]
fn test_parse_named_argument_must_be_literal() {
    let resource = parse("bad = { FUNC($x, digits: $y) }\ngood = { FUNC($x, digits: 2) }\n");
    assert_eq!(resource.junk().count(), 1);
    let ids: Vec<_> = resource.messages().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["good"]);
}

// ---
// Comments
// ---

#[test]
fn test_parse_comment_levels() {
    let resource = parse("### Resource\n\n## Group\n\n# Standalone\n\nkey = value\n");
    let levels: Vec<_> = resource
        .entries
        .iter()
        .filter_map(|entry| match entry {
            Entry::Comment(comment) => Some(comment.level),
            _ => None,
        })
        .collect();
    assert_eq!(
        levels,
        vec![CommentLevel::Resource, CommentLevel::Group, CommentLevel::Comment]
    );
}

#[test]
fn test_parse_attached_comment() {
    let resource = parse("# Greeting shown on the home page.\n# Keep it short.\nhello = Hi\n");
    assert_eq!(resource.entries.len(), 1);
    let message = resource.messages().next().unwrap();
    assert_eq!(
        message.comment.as_ref().map(|c| c.content.as_str()),
        Some("Greeting shown on the home page.\nKeep it short.")
    );
}

#[test]
fn test_parse_four_hashes_is_junk() {
    let resource = parse("#### too deep\nkey = value\n");
    assert_eq!(resource.junk().next().map(|j| j.content.as_str()), Some("#### too deep\n"));
    assert_eq!(resource.messages().count(), 1);
}

// ---
// Recovery and limits
// ---

#[test]
fn test_junk_preserves_original_text() {
    let source = "ok = 1\nbroken = { \n  more broken\n# comment\nfine = 2\n";
    let resource = parse(source);
    let junk = resource.junk().next().unwrap();
    assert_eq!(junk.content, "broken = { \n  more broken\n");
    assert_eq!(&source[junk.span.start..junk.span.end], junk.content);
    assert_eq!(resource.messages().count(), 2);
}

fn nested_placeables(depth: usize) -> String {
    format!("m = {}1{}\n", "{ ".repeat(depth), " }".repeat(depth))
}

fn nested_selects(depth: usize) -> String {
    let mut pattern = "leaf".to_string();
    for _ in 0..depth {
        pattern = format!("{{ $x ->\n    [b] B\n   *[a] {pattern}\n}}");
    }
    format!("m = {pattern}\n")
}

fn assert_depth_boundary(nested: fn(usize) -> String) {
    for depth in [1usize, 2, 17, 100, 500] {
        let config = ParserConfig::default().with_max_nesting_depth(depth);

        let at_limit = parse_with_config(&nested(depth), &config);
        assert!(!at_limit.has_errors(), "depth {depth} should parse");

        let over = parse_with_config(&nested(depth + 1), &config);
        assert_eq!(
            annotation_codes(&over),
            vec![AnnotationCode::NestingDepthExceeded],
            "depth {} should be rejected",
            depth + 1
        );
    }
}

// Both run on the default test thread.
#[test]
fn test_nesting_depth_boundary() {
    assert_depth_boundary(nested_placeables);
}

#[test]
fn test_nested_select_depth_boundary() {
    assert_depth_boundary(nested_selects);
}

#[test]
fn test_error_limit() {
    let source = "!1\n!2\n!3\nlate = never parsed\n";
    let config = ParserConfig::default().with_max_parse_errors(1);
    let resource = parse_with_config(source, &config);
    assert_eq!(resource.entries.len(), 1);
    let junk = resource.junk().next().unwrap();
    assert_eq!(junk.content, source);
    assert!(annotation_codes(&resource).contains(&AnnotationCode::ParseErrorLimit));
}

#[test]
fn test_crlf_and_cr_line_endings() {
    let lf = parse("a = one\n    two\nb = three\n");
    assert_eq!(parse("a = one\r\n    two\r\nb = three\r\n"), lf);
    assert_eq!(parse("a = one\r    two\rb = three\r"), lf);
}

#[test]
fn test_identifier_length_limit() {
    let long = format!("{} = x\n", "a".repeat(300));
    let resource = parse(&long);
    assert_eq!(resource.messages().count(), 0);
    assert!(resource.has_errors());
}
