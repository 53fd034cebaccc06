//! AST module for FTL resources
//!
//! This module provides the immutable syntax tree produced by the parser and
//! consumed by the resolver, the serializer and any external validator.
//! Nodes are plain values: once the parser has built them nothing mutates them.
//!
//! Invariant-carrying nodes (`NumberLiteral`, `StringLiteral`,
//! `SelectExpression`, `CallArguments`) keep their fields private and are only
//! constructed through the checked constructors in [`builder`]. Deserialization
//! goes through the same checks.

// ============================================================================
// IMPORTS
// ============================================================================

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub mod builder;

// ============================================================================
// SOURCE LOCATIONS
// ============================================================================

/// Represents a byte span in the (line-ending normalized) source text.
///
/// # Examples
///
/// ```rust
/// use ftl_engine::ast::Span;
/// let span = Span { start: 0, end: 5 };
/// assert_eq!(span.len(), 5);
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// RESOURCE & ENTRIES
// ============================================================================

/// A parsed FTL resource: the ordered list of everything found in the source.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Resource {
    pub entries: Vec<Entry>,
}

/// A single top-level item of a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Entry {
    Message(Message),
    Term(Term),
    Comment(Comment),
    Junk(Junk),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    pub name: String,
}

/// A public message: `id = value` plus optional attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Identifier,
    pub value: Option<Pattern>,
    pub attributes: Vec<Attribute>,
    /// A `#` comment placed directly above the message.
    pub comment: Option<Comment>,
}

/// A private term: `-id = value`. Unlike messages, a value is mandatory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub id: Identifier,
    pub value: Pattern,
    pub attributes: Vec<Attribute>,
    pub comment: Option<Comment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub id: Identifier,
    pub value: Pattern,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommentLevel {
    /// `#`
    Comment,
    /// `##`
    Group,
    /// `###`
    Resource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub level: CommentLevel,
    pub content: String,
}

/// A span of source that could not be parsed as any entry.
///
/// `content` is the exact original text, kept for diagnostics and tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Junk {
    pub content: String,
    pub annotations: Vec<Annotation>,
    pub span: Span,
}

/// Machine-readable reason attached to a piece of junk.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnnotationCode {
    /// Generic syntax error.
    ParseJunk,
    /// A placeable or call nested deeper than the configured limit.
    NestingDepthExceeded,
    /// The parse stopped early because too many entries failed.
    ParseErrorLimit,
    /// The source was larger than the configured limit and was not parsed.
    SourceTooLarge,
}

impl AnnotationCode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ParseJunk => "PARSE_JUNK",
            Self::NestingDepthExceeded => "PARSE_NESTING_DEPTH_EXCEEDED",
            Self::ParseErrorLimit => "PARSE_ERROR_LIMIT",
            Self::SourceTooLarge => "PARSE_SOURCE_TOO_LARGE",
        }
    }
}

impl std::fmt::Display for AnnotationCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub code: AnnotationCode,
    pub message: String,
    pub span: Span,
}

// ============================================================================
// PATTERNS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Pattern {
    pub elements: Vec<PatternElement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PatternElement {
    TextElement { value: String },
    Placeable(Placeable),
}

/// An interpolated `{ ... }` expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placeable {
    pub expression: Box<Expression>,
}

// ============================================================================
// EXPRESSIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Expression {
    StringLiteral(StringLiteral),
    NumberLiteral(NumberLiteral),
    VariableReference {
        id: Identifier,
    },
    MessageReference {
        id: Identifier,
        attribute: Option<Identifier>,
    },
    TermReference {
        id: Identifier,
        attribute: Option<Identifier>,
        arguments: Option<CallArguments>,
    },
    FunctionReference {
        id: Identifier,
        arguments: CallArguments,
    },
    SelectExpression(SelectExpression),
    /// A placeable used as an inline expression: `{ { $x } }`.
    Placeable(Placeable),
}

/// A quoted string literal. `value` is unescaped, `raw` is as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "builder::StringLiteralRepr", into = "builder::StringLiteralRepr")]
pub struct StringLiteral {
    pub(crate) value: String,
    pub(crate) raw: String,
}

/// A number literal whose `raw` text is guaranteed to parse exactly into `value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "builder::NumberLiteralRepr", into = "builder::NumberLiteralRepr")]
pub struct NumberLiteral {
    pub(crate) value: Decimal,
    pub(crate) raw: String,
}

/// `selector -> variants`, with exactly one default variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "builder::SelectExpressionRepr",
    into = "builder::SelectExpressionRepr"
)]
pub struct SelectExpression {
    pub(crate) selector: Box<Expression>,
    pub(crate) variants: Vec<Variant>,
    pub(crate) default_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub key: VariantKey,
    pub value: Pattern,
    pub default: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum VariantKey {
    Identifier(Identifier),
    NumberLiteral(NumberLiteral),
}

/// Arguments of a function or term call. Named argument names are unique.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "builder::CallArgumentsRepr", into = "builder::CallArgumentsRepr")]
pub struct CallArguments {
    pub(crate) positional: Vec<Expression>,
    pub(crate) named: Vec<NamedArgument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedArgument {
    pub name: Identifier,
    pub value: Literal,
}

/// The only values a named argument may carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Literal {
    StringLiteral(StringLiteral),
    NumberLiteral(NumberLiteral),
}

// ============================================================================
// PUBLIC API IMPLEMENTATION
// ============================================================================

impl Resource {
    /// Iterates over all junk entries.
    pub fn junk(&self) -> impl Iterator<Item = &Junk> {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::Junk(junk) => Some(junk),
            _ => None,
        })
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::Message(message) => Some(message),
            _ => None,
        })
    }

    pub fn terms(&self) -> impl Iterator<Item = &Term> {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::Term(term) => Some(term),
            _ => None,
        })
    }

    /// True if any part of the source failed to parse.
    pub fn has_errors(&self) -> bool {
        self.junk().next().is_some()
    }
}

impl Identifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl Message {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attr| attr.id.name == name)
    }
}

impl Term {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attr| attr.id.name == name)
    }
}

impl Pattern {
    pub fn new(elements: Vec<PatternElement>) -> Self {
        Self { elements }
    }

    /// Builds a pattern holding a single text element.
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            elements: vec![PatternElement::TextElement {
                value: value.into(),
            }],
        }
    }
}

impl Placeable {
    pub fn new(expression: Expression) -> Self {
        Self {
            expression: Box::new(expression),
        }
    }
}

impl StringLiteral {
    /// The unescaped value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The literal as written between the quotes, escapes included.
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl NumberLiteral {
    pub fn value(&self) -> Decimal {
        self.value
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Number of digits written after the decimal point.
    pub fn precision(&self) -> usize {
        self.raw
            .split_once('.')
            .map(|(_, fraction)| fraction.len())
            .unwrap_or(0)
    }
}

impl SelectExpression {
    pub fn selector(&self) -> &Expression {
        &self.selector
    }

    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    /// The variant marked with `*`. Always present by construction.
    pub fn default_variant(&self) -> &Variant {
        &self.variants[self.default_index]
    }
}

impl CallArguments {
    pub fn positional(&self) -> &[Expression] {
        &self.positional
    }

    pub fn named(&self) -> &[NamedArgument] {
        &self.named
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }
}

impl VariantKey {
    /// The key's literal text as it appears between the brackets.
    pub fn text(&self) -> &str {
        match self {
            VariantKey::Identifier(id) => id.as_str(),
            VariantKey::NumberLiteral(number) => number.raw(),
        }
    }
}

/// Serializes a resource to pretty-printed JSON, mainly for debugging and
/// snapshotting.
pub fn to_json(resource: &Resource) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(resource)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_iterators() {
        let resource = Resource {
            entries: vec![
                Entry::Message(Message {
                    id: Identifier::new("hello"),
                    value: Some(Pattern::text("Hi")),
                    attributes: vec![],
                    comment: None,
                }),
                Entry::Junk(Junk {
                    content: "oops\n".into(),
                    annotations: vec![],
                    span: Span::new(9, 14),
                }),
            ],
        };
        assert_eq!(resource.messages().count(), 1);
        assert_eq!(resource.terms().count(), 0);
        assert!(resource.has_errors());
    }

    #[test]
    fn test_number_literal_precision() {
        let number = NumberLiteral::new("1.50").unwrap();
        assert_eq!(number.precision(), 2);
        assert_eq!(NumberLiteral::new("-3").unwrap().precision(), 0);
    }

    #[test]
    fn test_to_json_shape() {
        let resource = crate::syntax::parse("hello = Hi { $name }\n!!\n");
        let json = to_json(&resource).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let entries = &value["entries"];
        assert_eq!(entries[0]["type"], "Message");
        assert_eq!(entries[0]["id"]["name"], "hello");
        assert_eq!(entries[0]["value"]["elements"][1]["type"], "Placeable");
        assert_eq!(
            entries[0]["value"]["elements"][1]["expression"]["type"],
            "VariableReference"
        );
        assert_eq!(entries[1]["type"], "Junk");
        assert_eq!(entries[1]["content"], "!!\n");

        let back: Resource = serde_json::from_str(&json).unwrap();
        assert_eq!(back, resource);
    }

    #[test]
    fn test_annotation_codes() {
        assert_eq!(
            AnnotationCode::NestingDepthExceeded.to_string(),
            "PARSE_NESTING_DEPTH_EXCEEDED"
        );
        assert_eq!(AnnotationCode::ParseJunk.as_str(), "PARSE_JUNK");
    }
}
