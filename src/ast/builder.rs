//! # AST Builder Module
//!
//! Checked constructors for the nodes that carry invariants. The parser and
//! serde deserialization both go through these, so an AST value that exists is
//! an AST value that is well formed:
//!
//! - a `NumberLiteral`'s raw text parses exactly into its decimal value
//! - a `StringLiteral`'s raw text is a valid escaped form of its value
//! - a `SelectExpression` has variants, exactly one default, and a selector
//!   that may legally be selected on
//! - `CallArguments` never repeat a named argument

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{
    CallArguments, Expression, NamedArgument, NumberLiteral, SelectExpression, StringLiteral,
    Variant,
};
use crate::errors::AstError;
use crate::syntax::primitives;

// ============================================================================
// LITERALS
// ============================================================================

impl NumberLiteral {
    /// Builds a number literal from its source text.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ftl_engine::ast::NumberLiteral;
    /// let n = NumberLiteral::new("-12.50").unwrap();
    /// assert_eq!(n.raw(), "-12.50");
    /// assert!(NumberLiteral::new("1e5").is_err());
    /// ```
    pub fn new(raw: impl Into<String>) -> Result<Self, AstError> {
        let raw = raw.into();
        if !is_number_text(&raw) {
            return Err(AstError::InvalidNumber {
                raw,
                reason: "expected digits with an optional sign and fraction".into(),
            });
        }
        let value = Decimal::from_str_exact(&raw).map_err(|e| AstError::InvalidNumber {
            raw: raw.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self { value, raw })
    }
}

/// Checks `-?[0-9]+(\.[0-9]+)?`.
fn is_number_text(raw: &str) -> bool {
    let unsigned = raw.strip_prefix('-').unwrap_or(raw);
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (unsigned, None),
    };
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    all_digits(integer) && fraction.map_or(true, all_digits)
}

impl StringLiteral {
    /// Builds a string literal from an unescaped value, escaping as needed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ftl_engine::ast::StringLiteral;
    /// let s = StringLiteral::new("say \"hi\"");
    /// assert_eq!(s.raw(), "say \\\"hi\\\"");
    /// ```
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let mut raw = String::with_capacity(value.len());
        for ch in value.chars() {
            match ch {
                '\\' => raw.push_str("\\\\"),
                '"' => raw.push_str("\\\""),
                '\n' => raw.push_str("\\n"),
                '\r' => raw.push_str("\\u000D"),
                other => raw.push(other),
            }
        }
        Self { value, raw }
    }

    /// Builds a string literal from the text written between the quotes.
    pub fn from_raw(raw: impl Into<String>) -> Result<Self, AstError> {
        let raw = raw.into();
        let value = primitives::unescape(&raw).map_err(|kind| AstError::InvalidString {
            raw: raw.clone(),
            reason: kind.to_string(),
        })?;
        Ok(Self { value, raw })
    }

    /// Trusted constructor for the parser, which has already validated `raw`.
    pub(crate) fn from_parts(value: String, raw: String) -> Self {
        Self { value, raw }
    }
}

// ============================================================================
// COMPOUND NODES
// ============================================================================

impl SelectExpression {
    /// Builds a select expression, enforcing the selector and variant rules.
    pub fn new(selector: Expression, variants: Vec<Variant>) -> Result<Self, AstError> {
        check_selector(&selector)?;
        if variants.is_empty() {
            return Err(AstError::MissingVariants);
        }
        let mut defaults = variants
            .iter()
            .enumerate()
            .filter(|(_, variant)| variant.default)
            .map(|(index, _)| index);
        let default_index = defaults.next().ok_or(AstError::MissingDefaultVariant)?;
        if defaults.next().is_some() {
            return Err(AstError::MultipleDefaultVariants);
        }
        Ok(Self {
            selector: Box::new(selector),
            variants,
            default_index,
        })
    }
}

fn check_selector(selector: &Expression) -> Result<(), AstError> {
    match selector {
        Expression::StringLiteral(_)
        | Expression::NumberLiteral(_)
        | Expression::VariableReference { .. }
        | Expression::FunctionReference { .. } => Ok(()),
        Expression::TermReference {
            attribute: Some(_), ..
        } => Ok(()),
        Expression::TermReference { .. } => Err(AstError::InvalidSelector(
            "terms can only be selected on through an attribute".into(),
        )),
        Expression::MessageReference { .. } => Err(AstError::InvalidSelector(
            "messages cannot be used as selectors".into(),
        )),
        Expression::SelectExpression(_) | Expression::Placeable(_) => Err(
            AstError::InvalidSelector("expected a simple expression as selector".into()),
        ),
    }
}

impl CallArguments {
    /// Builds a call argument list, rejecting repeated named arguments.
    pub fn new(positional: Vec<Expression>, named: Vec<NamedArgument>) -> Result<Self, AstError> {
        for (index, arg) in named.iter().enumerate() {
            if named[..index].iter().any(|prev| prev.name == arg.name) {
                return Err(AstError::DuplicatedNamedArgument(arg.name.name.clone()));
            }
        }
        Ok(Self { positional, named })
    }
}

// ============================================================================
// SERDE REPRESENTATIONS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StringLiteralRepr {
    #[serde(default)]
    pub value: String,
    pub raw: String,
}

impl From<StringLiteral> for StringLiteralRepr {
    fn from(literal: StringLiteral) -> Self {
        Self {
            value: literal.value,
            raw: literal.raw,
        }
    }
}

impl TryFrom<StringLiteralRepr> for StringLiteral {
    type Error = AstError;

    fn try_from(repr: StringLiteralRepr) -> Result<Self, Self::Error> {
        StringLiteral::from_raw(repr.raw)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumberLiteralRepr {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Decimal>,
    pub raw: String,
}

impl From<NumberLiteral> for NumberLiteralRepr {
    fn from(literal: NumberLiteral) -> Self {
        Self {
            value: Some(literal.value),
            raw: literal.raw,
        }
    }
}

impl TryFrom<NumberLiteralRepr> for NumberLiteral {
    type Error = AstError;

    fn try_from(repr: NumberLiteralRepr) -> Result<Self, Self::Error> {
        let literal = NumberLiteral::new(repr.raw)?;
        match repr.value {
            Some(value) if value != literal.value => Err(AstError::InvalidNumber {
                raw: literal.raw,
                reason: format!("value {value} does not match the raw text"),
            }),
            _ => Ok(literal),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectExpressionRepr {
    pub selector: Expression,
    pub variants: Vec<Variant>,
}

impl From<SelectExpression> for SelectExpressionRepr {
    fn from(select: SelectExpression) -> Self {
        Self {
            selector: *select.selector,
            variants: select.variants,
        }
    }
}

impl TryFrom<SelectExpressionRepr> for SelectExpression {
    type Error = AstError;

    fn try_from(repr: SelectExpressionRepr) -> Result<Self, Self::Error> {
        SelectExpression::new(repr.selector, repr.variants)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallArgumentsRepr {
    #[serde(default)]
    pub positional: Vec<Expression>,
    #[serde(default)]
    pub named: Vec<NamedArgument>,
}

impl From<CallArguments> for CallArgumentsRepr {
    fn from(args: CallArguments) -> Self {
        Self {
            positional: args.positional,
            named: args.named,
        }
    }
}

impl TryFrom<CallArgumentsRepr> for CallArguments {
    type Error = AstError;

    fn try_from(repr: CallArgumentsRepr) -> Result<Self, Self::Error> {
        CallArguments::new(repr.positional, repr.named)
    }
}

impl FromStr for NumberLiteral {
    type Err = AstError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NumberLiteral::new(s)
    }
}
