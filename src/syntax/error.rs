//! Parse failures.
//!
//! A `ParseFailure` is the advisory diagnostic that travels in the `Err` arm of
//! every rule. The parser only reads it to build the junk annotation; it never
//! decides where junk ends.

use std::fmt;

use thiserror::Error;

use crate::errors::AstError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    /// Byte offset where the rule gave up.
    pub position: usize,
    pub kind: FailureKind,
    /// Human-readable descriptions of what would have been accepted.
    pub expected: Vec<&'static str>,
}

impl ParseFailure {
    pub fn new(position: usize, kind: FailureKind) -> Self {
        Self {
            position,
            kind,
            expected: Vec::new(),
        }
    }

    pub fn expecting(mut self, expected: &[&'static str]) -> Self {
        self.expected.extend_from_slice(expected);
        self
    }

    pub fn is_depth_exceeded(&self) -> bool {
        matches!(self.kind, FailureKind::NestingDepthExceeded(_))
    }
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if !self.expected.is_empty() {
            write!(f, " (expected {})", self.expected.join(" or "))?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseFailure {}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureKind {
    #[error("expected an entry start")]
    ExpectedEntry,
    #[error("expected token \"{0}\"")]
    ExpectedToken(char),
    #[error("expected a character from range {0}")]
    ExpectedCharRange(&'static str),
    #[error("expected a line end")]
    ExpectedLineEnd,
    #[error("expected message \"{0}\" to have a value or attributes")]
    ExpectedMessageField(String),
    #[error("expected term \"-{0}\" to have a value")]
    ExpectedTermField(String),
    #[error("expected a value")]
    MissingValue,
    #[error("expected an inline expression")]
    ExpectedInlineExpression,
    #[error("expected a simple expression as selector")]
    ExpectedSimpleExpressionAsSelector,
    #[error("message references cannot be used as selectors")]
    MessageReferenceAsSelector,
    #[error("terms can only be used as selectors through an attribute")]
    TermReferenceAsSelector,
    #[error("term attributes cannot be used as placeables")]
    TermAttributeAsPlaceable,
    #[error("unterminated string literal")]
    UnterminatedStringLiteral,
    #[error("line endings are not allowed in string literals")]
    LineEndInStringLiteral,
    #[error("unescaped quote in string literal")]
    UnescapedQuote,
    #[error("unknown escape sequence \\{0}")]
    UnknownEscapeSequence(String),
    #[error("invalid unicode escape sequence \\{0}")]
    InvalidUnicodeEscapeSequence(String),
    #[error("positional arguments must not follow named arguments")]
    PositionalArgumentFollowsNamed,
    #[error("named argument \"{0}\" is given more than once")]
    DuplicatedNamedArgument(String),
    #[error("named argument values must be string or number literals")]
    NamedArgumentNotLiteral,
    #[error("unbalanced closing brace in text")]
    UnbalancedClosingBrace,
    #[error("select expression has no variants")]
    MissingVariants,
    #[error("select expression needs exactly one default variant")]
    MissingDefaultVariant,
    #[error("select expression has more than one default variant")]
    MultipleDefaultVariants,
    #[error("comments start with one to three '#' characters")]
    TooManyCommentHashes,
    #[error("{what} exceeds the maximum length of {max}")]
    TokenTooLong { what: &'static str, max: usize },
    #[error("invalid number literal: {0}")]
    InvalidNumber(String),
    #[error("nesting depth exceeds the maximum of {0}")]
    NestingDepthExceeded(usize),
}

impl From<AstError> for FailureKind {
    fn from(error: AstError) -> Self {
        match error {
            AstError::InvalidNumber { raw, reason } => {
                FailureKind::InvalidNumber(format!("{raw}: {reason}"))
            }
            AstError::InvalidString { reason, .. } => {
                FailureKind::InvalidUnicodeEscapeSequence(reason)
            }
            AstError::MissingVariants => FailureKind::MissingVariants,
            AstError::MissingDefaultVariant => FailureKind::MissingDefaultVariant,
            AstError::MultipleDefaultVariants => FailureKind::MultipleDefaultVariants,
            AstError::InvalidSelector(_) => FailureKind::ExpectedSimpleExpressionAsSelector,
            AstError::DuplicatedNamedArgument(name) => FailureKind::DuplicatedNamedArgument(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_expected_set() {
        let failure = ParseFailure::new(3, FailureKind::ExpectedInlineExpression)
            .expecting(&["a string", "a number"]);
        assert_eq!(
            failure.to_string(),
            "expected an inline expression (expected a string or a number)"
        );
    }

    #[test]
    fn test_depth_detection() {
        assert!(ParseFailure::new(0, FailureKind::NestingDepthExceeded(2)).is_depth_exceeded());
        assert!(!ParseFailure::new(0, FailureKind::MissingValue).is_depth_exceeded());
    }
}
