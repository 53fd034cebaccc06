//! FTL Resolver - Message Formatting
//!
//! Turns a message (or one of its attributes) into a display string. Resolution
//! never fails as a whole: every problem is recorded as a [`ResolverError`] and
//! replaced in the output by a readable placeholder such as `{$name}` or
//! `{missing-message}`, so callers always get something to show.
//!
//! ## Placeholders
//!
//! | Problem                       | Output            |
//! |-------------------------------|-------------------|
//! | unknown variable              | `{$name}`         |
//! | unknown message / no value    | `{id}`            |
//! | unknown attribute             | `{id.attr}`       |
//! | unknown term                  | `{-id}`           |
//! | unknown / failing function    | `{NAME()}`        |
//! | cyclic reference              | `{id}`            |
//! | depth limit                   | `{???}`           |
//!
//! ## Safety net
//!
//! Registered functions run under `catch_unwind`; a panicking function is
//! reported as an error and resolution continues. The whole resolution is
//! wrapped the same way as a last resort.

use std::panic::{self, AssertUnwindSafe};
use std::ptr;

use rust_decimal::prelude::ToPrimitive;
use tracing::{debug, trace, warn};
use unic_langid::LanguageIdentifier;

use crate::ast::{
    CallArguments, Expression, Literal, NamedArgument, Pattern, PatternElement,
    SelectExpression, Variant, VariantKey,
};
use crate::config::ResolverConfig;
use crate::errors::ResolverError;
use crate::runtime::bidi;
use crate::runtime::index::EntryIndex;
use crate::runtime::plural::{default_plurals, PluralService};
use crate::runtime::registry::FunctionRegistry;
use crate::runtime::scope::DepthGuard;
use crate::runtime::value::{Args, NumberValue, Value};

const DEPTH_PLACEHOLDER: &str = "{???}";

// ============================================================================
// RESOLVER
// ============================================================================

/// Formats messages from an [`EntryIndex`] for one locale.
///
/// A resolver only borrows its inputs, so it is cheap to build per call and
/// safe to share between threads when the index and registry are.
///
/// # Examples
///
/// ```rust
/// use ftl_engine::runtime::{Args, EntryIndex, FunctionRegistry, Resolver};
/// use ftl_engine::syntax::parse;
///
/// let resource = parse("hello = Hello, { $name }!\n");
/// let index = EntryIndex::from_resource(&resource);
/// let functions = FunctionRegistry::with_builtins();
/// let resolver = Resolver::new(&index, &functions, "en-US".parse().unwrap());
///
/// let mut args = Args::new();
/// args.set("name", "Ana");
/// let (text, errors) = resolver.format("hello", None, Some(&args));
/// assert_eq!(text, "Hello, \u{2068}Ana\u{2069}!");
/// assert!(errors.is_empty());
/// ```
pub struct Resolver<'a> {
    index: &'a EntryIndex<'a>,
    functions: &'a FunctionRegistry,
    plurals: &'a dyn PluralService,
    locale: LanguageIdentifier,
    config: ResolverConfig,
}

impl<'a> Resolver<'a> {
    pub fn new(
        index: &'a EntryIndex<'a>,
        functions: &'a FunctionRegistry,
        locale: LanguageIdentifier,
    ) -> Self {
        Self {
            index,
            functions,
            plurals: default_plurals(),
            locale,
            config: ResolverConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_plural_service(mut self, plurals: &'a dyn PluralService) -> Self {
        self.plurals = plurals;
        self
    }

    pub fn locale(&self) -> &LanguageIdentifier {
        &self.locale
    }

    /// Formats message `id`, or its attribute `attribute` when given.
    pub fn format(
        &self,
        id: &str,
        attribute: Option<&str>,
        args: Option<&Args>,
    ) -> (String, Vec<ResolverError>) {
        let label = placeholder_label(id, attribute);
        self.contained(&label, args, |scope| {
            let _guard = match scope.enter() {
                Some(guard) => guard,
                None => return DEPTH_PLACEHOLDER.to_string(),
            };
            match scope.resolve_message(id, attribute) {
                Ok(value) => value.as_string().into_owned(),
                Err(placeholder) => placeholder,
            }
        })
    }

    /// Formats an arbitrary pattern, e.g. one that is not in the index.
    pub fn format_pattern(
        &self,
        pattern: &'a Pattern,
        args: Option<&Args>,
    ) -> (String, Vec<ResolverError>) {
        self.contained("pattern", args, |scope| {
            let _guard = match scope.enter() {
                Some(guard) => guard,
                None => return DEPTH_PLACEHOLDER.to_string(),
            };
            let mut out = String::new();
            scope.write_pattern(pattern, "pattern", &mut out);
            out
        })
    }

    /// Runs `body` in a fresh scope, turning a panic into an internal error.
    fn contained<F>(&self, label: &str, args: Option<&Args>, body: F) -> (String, Vec<ResolverError>)
    where
        F: FnOnce(&mut Scope<'_, 'a>) -> String,
    {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut scope = Scope::new(self, args);
            let text = body(&mut scope);
            (text, scope.errors)
        }));
        let (text, errors) = outcome.unwrap_or_else(|_| {
            warn!(id = label, "panic while resolving; returning placeholder");
            (
                format!("{{{label}}}"),
                vec![ResolverError::Internal(label.to_string())],
            )
        });
        for error in &errors {
            debug!(
                id = label,
                category = %error.category(),
                code = error.code_suffix(),
                %error,
                "recoverable resolver error"
            );
        }
        trace!(id = label, errors = errors.len(), "resolved message");
        (text, errors)
    }
}

/// One-shot convenience: builds a [`Resolver`] and formats `id`.
///
/// An unparseable `locale` falls back to the root locale, whose plural rules
/// select `other` for every number.
pub fn resolve(
    index: &EntryIndex<'_>,
    id: &str,
    attribute: Option<&str>,
    args: Option<&Args>,
    locale: &str,
    functions: &FunctionRegistry,
    config: ResolverConfig,
) -> (String, Vec<ResolverError>) {
    let locale = locale.parse::<LanguageIdentifier>().unwrap_or_else(|_| {
        debug!(locale, "unparseable locale; using the root locale");
        LanguageIdentifier::default()
    });
    Resolver::new(index, functions, locale)
        .with_config(config)
        .format(id, attribute, args)
}

fn placeholder_label(id: &str, attribute: Option<&str>) -> String {
    match attribute {
        Some(attribute) => format!("{id}.{attribute}"),
        None => id.to_string(),
    }
}

// ============================================================================
// SCOPE
// ============================================================================

/// The state of one `format` call: arguments, errors so far and the patterns
/// currently being resolved (for cycle detection).
struct Scope<'s, 'a> {
    resolver: &'s Resolver<'a>,
    args: Option<&'s Args>,
    /// Set while resolving a term: terms only see the arguments passed to them.
    local_args: Option<Args>,
    travelled: Vec<&'a Pattern>,
    errors: Vec<ResolverError>,
}

/// `Err` carries the placeholder text; the error is already recorded.
type Resolved = Result<Value, String>;

impl<'s, 'a> Scope<'s, 'a> {
    fn new(resolver: &'s Resolver<'a>, args: Option<&'s Args>) -> Self {
        Self {
            resolver,
            args,
            local_args: None,
            travelled: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn add_error(&mut self, error: ResolverError) {
        self.errors.push(error);
    }

    fn enter(&mut self) -> Option<DepthGuard> {
        match DepthGuard::enter(self.resolver.config.max_expression_depth) {
            Ok(guard) => Some(guard),
            Err(error) => {
                self.add_error(error);
                None
            }
        }
    }

    // ------------------------------------------------------------------------
    // Patterns
    // ------------------------------------------------------------------------

    fn write_pattern(&mut self, pattern: &'a Pattern, label: &str, out: &mut String) {
        if self.travelled.iter().any(|seen| ptr::eq(*seen, pattern)) {
            self.add_error(ResolverError::Cyclic(label.to_string()));
            out.push('{');
            out.push_str(label);
            out.push('}');
            return;
        }
        self.travelled.push(pattern);
        let isolate = self.resolver.config.use_isolating && pattern.elements.len() > 1;
        for element in &pattern.elements {
            match element {
                PatternElement::TextElement { value } => out.push_str(value),
                PatternElement::Placeable(placeable) => {
                    let expression: &'a Expression = &placeable.expression;
                    let text = match self.resolve_expression(expression) {
                        Ok(value) => value.as_string().into_owned(),
                        Err(placeholder) => placeholder,
                    };
                    bidi::push_isolated(out, &text, isolate && needs_isolation(expression));
                }
            }
        }
        self.travelled.pop();
    }

    // ------------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------------

    fn resolve_expression(&mut self, expression: &'a Expression) -> Resolved {
        // Wrapper placeables add no work, so they do not take a level.
        let mut expression = expression;
        while let Expression::Placeable(placeable) = expression {
            expression = placeable.expression.as_ref();
        }
        let Some(_guard) = self.enter() else {
            return Err(DEPTH_PLACEHOLDER.to_string());
        };
        match expression {
            Expression::StringLiteral(literal) => Ok(Value::String(literal.value().to_string())),
            Expression::NumberLiteral(number) => Ok(Value::Number(NumberValue::from_literal(number))),
            Expression::VariableReference { id } => self.resolve_variable(id.as_str()),
            Expression::MessageReference { id, attribute } => {
                self.resolve_message(id.as_str(), attribute.as_ref().map(|a| a.as_str()))
            }
            Expression::TermReference {
                id,
                attribute,
                arguments,
            } => self.resolve_term(
                id.as_str(),
                attribute.as_ref().map(|a| a.as_str()),
                arguments.as_ref(),
            ),
            Expression::FunctionReference { id, arguments } => {
                self.call_function(id.as_str(), arguments)
            }
            Expression::SelectExpression(select) => {
                let variant = self.select_variant(select);
                let mut out = String::new();
                self.write_pattern(&variant.value, "select", &mut out);
                Ok(Value::String(out))
            }
            // Peeled above.
            Expression::Placeable(placeable) => self.resolve_expression(&placeable.expression),
        }
    }

    fn resolve_variable(&mut self, name: &str) -> Resolved {
        let found = match &self.local_args {
            Some(local) => local.get(name).cloned(),
            None => self.args.and_then(|args| args.get(name)).cloned(),
        };
        found.ok_or_else(|| {
            self.add_error(ResolverError::UnknownVariable(name.to_string()));
            format!("{{${name}}}")
        })
    }

    fn resolve_message(&mut self, id: &str, attribute: Option<&str>) -> Resolved {
        let index = self.resolver.index;
        let Some(message) = index.message(id) else {
            self.add_error(ResolverError::UnknownMessage(id.to_string()));
            return Err(format!("{{{id}}}"));
        };
        let label = placeholder_label(id, attribute);
        let pattern = match attribute {
            Some(name) => match message.attribute(name) {
                Some(attribute) => &attribute.value,
                None => {
                    self.add_error(ResolverError::UnknownAttribute {
                        id: id.to_string(),
                        attribute: name.to_string(),
                    });
                    return Err(format!("{{{label}}}"));
                }
            },
            None => match &message.value {
                Some(value) => value,
                None => {
                    self.add_error(ResolverError::NoValue(id.to_string()));
                    return Err(format!("{{{id}}}"));
                }
            },
        };
        let mut out = String::new();
        self.write_pattern(pattern, &label, &mut out);
        Ok(Value::String(out))
    }

    fn resolve_term(
        &mut self,
        id: &str,
        attribute: Option<&str>,
        arguments: Option<&'a CallArguments>,
    ) -> Resolved {
        let index = self.resolver.index;
        let Some(term) = index.term(id) else {
            self.add_error(ResolverError::UnknownTerm(id.to_string()));
            return Err(format!("{{-{id}}}"));
        };
        let label = format!("-{}", placeholder_label(id, attribute));
        let pattern = match attribute {
            Some(name) => match term.attribute(name) {
                Some(attribute) => &attribute.value,
                None => {
                    self.add_error(ResolverError::UnknownAttribute {
                        id: format!("-{id}"),
                        attribute: name.to_string(),
                    });
                    return Err(format!("{{{label}}}"));
                }
            },
            None => &term.value,
        };
        // Terms never see the caller's arguments, only their own named ones.
        let local = arguments
            .map(|arguments| named_literals(arguments.named()))
            .unwrap_or_default();
        let outer = self.local_args.replace(local);
        let mut out = String::new();
        self.write_pattern(pattern, &label, &mut out);
        self.local_args = outer;
        Ok(Value::String(out))
    }

    fn call_function(&mut self, name: &str, arguments: &'a CallArguments) -> Resolved {
        let placeholder = format!("{{{name}()}}");
        let Some(function) = self.resolver.functions.get(name).cloned() else {
            self.add_error(ResolverError::UnknownFunction(name.to_string()));
            return Err(placeholder);
        };
        let mut positional = Vec::with_capacity(arguments.positional().len());
        for argument in arguments.positional() {
            match self.resolve_expression(argument) {
                Ok(value) => positional.push(value),
                // The argument's own error is already recorded.
                Err(_) => return Err(placeholder),
            }
        }
        let named = named_literals(arguments.named());
        match panic::catch_unwind(AssertUnwindSafe(|| function(&positional, &named))) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(source)) => {
                self.add_error(ResolverError::FunctionFailed {
                    name: name.to_string(),
                    source,
                });
                Err(placeholder)
            }
            Err(_) => {
                warn!(function = name, "registered function panicked");
                self.add_error(ResolverError::FunctionPanicked {
                    name: name.to_string(),
                });
                Err(placeholder)
            }
        }
    }

    // ------------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------------

    /// Exact key match first, then the plural category, then the default.
    fn select_variant(&mut self, select: &'a SelectExpression) -> &'a Variant {
        let Ok(selector) = self.resolve_expression(select.selector()) else {
            return select.default_variant();
        };
        if let Some(variant) = select
            .variants()
            .iter()
            .find(|variant| key_matches(&variant.key, &selector))
        {
            return variant;
        }
        if let Value::Number(number) = &selector {
            let category = self
                .resolver
                .plurals
                .category(number, &self.resolver.locale);
            if let Some(variant) = select.variants().iter().find(|variant| {
                matches!(&variant.key, VariantKey::Identifier(id) if id.as_str() == category.as_str())
            }) {
                return variant;
            }
        }
        select.default_variant()
    }
}

fn key_matches(key: &VariantKey, selector: &Value) -> bool {
    match (key, selector) {
        (VariantKey::Identifier(id), Value::String(text)) => id.as_str() == text,
        (VariantKey::NumberLiteral(number), Value::String(text)) => number.raw() == text,
        (VariantKey::NumberLiteral(number), Value::Number(value)) => {
            number.value().to_f64() == Some(value.value)
        }
        _ => false,
    }
}

/// References and string literals are already plain text from the same
/// resource, so they are not isolated.
fn needs_isolation(expression: &Expression) -> bool {
    !matches!(
        expression,
        Expression::MessageReference { .. }
            | Expression::TermReference { .. }
            | Expression::StringLiteral(_)
    )
}

fn named_literals(named: &[NamedArgument]) -> Args {
    named
        .iter()
        .map(|argument| {
            let value = match &argument.value {
                Literal::StringLiteral(literal) => Value::String(literal.value().to_string()),
                Literal::NumberLiteral(number) => Value::Number(NumberValue::from_literal(number)),
            };
            (argument.name.name.clone(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::scope::current_depth;
    use crate::syntax::parse;

    fn format_plain(source: &str, id: &str, args: Option<&Args>) -> (String, Vec<ResolverError>) {
        let resource = parse(source);
        let index = EntryIndex::from_resource(&resource);
        let functions = FunctionRegistry::with_builtins();
        resolve(
            &index,
            id,
            None,
            args,
            "en-US",
            &functions,
            ResolverConfig::default().with_isolating(false),
        )
    }

    #[test]
    fn test_missing_variable_placeholder() {
        let (text, errors) = format_plain("hi = Hi { $name }\n", "hi", None);
        assert_eq!(text, "Hi {$name}");
        assert_eq!(errors, vec![ResolverError::UnknownVariable("name".into())]);
    }

    #[test]
    fn test_cycle_is_reported() {
        let (text, errors) = format_plain("a = { b }\nb = { a }\n", "a", None);
        assert_eq!(text, "{a}");
        assert!(matches!(errors.as_slice(), [ResolverError::Cyclic(_)]));
        assert_eq!(current_depth(), 0);
    }

    #[test]
    fn test_message_without_value() {
        let (text, errors) = format_plain("m =\n    .attr = A\n", "m", None);
        assert_eq!(text, "{m}");
        assert_eq!(errors, vec![ResolverError::NoValue("m".into())]);
    }

    #[test]
    fn test_number_literal_key_matches_string_selector() {
        let source = "m = { \"1\" ->\n    [1] exact\n   *[other] fallback\n}\n";
        let (text, errors) = format_plain(source, "m", None);
        assert_eq!(text, "exact");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_depth_limit_placeholder() {
        let resource = parse("a = { b }\nb = { c }\nc = deep\n");
        let index = EntryIndex::from_resource(&resource);
        let functions = FunctionRegistry::new();
        let resolver = Resolver::new(&index, &functions, LanguageIdentifier::default())
            .with_config(ResolverConfig::default().with_max_expression_depth(2));
        let (text, errors) = resolver.format("a", None, None);
        assert_eq!(text, DEPTH_PLACEHOLDER);
        assert_eq!(errors, vec![ResolverError::DepthExceeded { max: 2 }]);
        assert_eq!(current_depth(), 0);
    }
}
