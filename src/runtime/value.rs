//! Runtime values passed as arguments and produced by functions.

use std::borrow::Cow;
use std::fmt;

use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::ast::NumberLiteral;

// ============================================================================
// VALUES
// ============================================================================

/// A value a message can interpolate or select on.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Value {
    String(String),
    Number(NumberValue),
    /// The absence of a value; formats as an empty string.
    #[default]
    None,
}

impl Value {
    /// The display form used when the value is interpolated into text.
    pub fn as_string(&self) -> Cow<'_, str> {
        match self {
            Value::String(s) => Cow::Borrowed(s),
            Value::Number(number) => Cow::Owned(number.format()),
            Value::None => Cow::Borrowed(""),
        }
    }

    pub fn as_number(&self) -> Option<&NumberValue> {
        match self {
            Value::Number(number) => Some(number),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

/// Whether plural selection uses cardinal or ordinal rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NumberKind {
    #[default]
    Cardinal,
    Ordinal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NumberOptions {
    pub minimum_fraction_digits: Option<usize>,
    pub maximum_fraction_digits: Option<usize>,
    pub kind: NumberKind,
}

/// A number together with the options that control how it is shown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberValue {
    pub value: f64,
    pub options: NumberOptions,
}

impl NumberValue {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            options: NumberOptions::default(),
        }
    }

    /// A literal keeps the fraction digits it was written with, so `1.50`
    /// formats as `1.50` and selects plural forms like `1.50` would.
    pub fn from_literal(literal: &NumberLiteral) -> Self {
        let precision = literal.precision();
        Self {
            value: literal.value().to_f64().unwrap_or_default(),
            options: NumberOptions {
                minimum_fraction_digits: (precision > 0).then_some(precision),
                ..NumberOptions::default()
            },
        }
    }

    pub fn with_options(mut self, options: NumberOptions) -> Self {
        self.options = options;
        self
    }

    /// Formats the number with its fraction-digit options applied.
    pub fn format(&self) -> String {
        let value = self.value;
        if !value.is_finite() {
            return value.to_string();
        }
        let natural = value.to_string();
        let NumberOptions {
            minimum_fraction_digits: min,
            maximum_fraction_digits: max,
            ..
        } = self.options;
        if min.is_none() && max.is_none() {
            return natural;
        }
        let mut digits = natural
            .split_once('.')
            .map(|(_, fraction)| fraction.len())
            .unwrap_or(0);
        if let Some(max) = max {
            digits = digits.min(max);
        }
        if let Some(min) = min {
            digits = digits.max(min);
        }
        format!("{value:.digits$}")
    }
}

impl fmt::Display for NumberValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Cow<'_, str>> for Value {
    fn from(s: Cow<'_, str>) -> Self {
        Value::String(s.into_owned())
    }
}

impl From<NumberValue> for Value {
    fn from(number: NumberValue) -> Self {
        Value::Number(number)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::None, Into::into)
    }
}

macro_rules! from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Value::Number(NumberValue::new(n as f64))
                }
            }
        )*
    };
}

from_number!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

// ============================================================================
// ARGUMENTS
// ============================================================================

/// Named values passed to a message, or to a function as named arguments.
///
/// Keys are kept sorted, so lookups are binary searches and iteration order is
/// stable.
///
/// # Examples
///
/// ```rust
/// use ftl_engine::runtime::{Args, Value};
/// let mut args = Args::new();
/// args.set("name", "Ana");
/// args.set("count", 3);
/// assert_eq!(args.get("name"), Some(&Value::from("Ana")));
/// assert_eq!(args.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args(Vec<(String, Value)>);

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    /// Inserts or replaces a value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.0.binary_search_by(|(k, _)| k.as_str().cmp(&key)) {
            Ok(index) => self.0[index].1 = value,
            Err(index) => self.0.insert(index, (key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0
            .binary_search_by(|(k, _)| k.as_str().cmp(key))
            .ok()
            .map(|index| &self.0[index].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Args {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut args = Args::new();
        for (key, value) in iter {
            args.set(key, value);
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_number_format() {
        assert_eq!(NumberValue::new(5.0).format(), "5");
        assert_eq!(NumberValue::new(1.5).format(), "1.5");
        assert_eq!(NumberValue::new(-0.25).format(), "-0.25");
    }

    #[test]
    fn test_fraction_digit_options() {
        let mut number = NumberValue::new(1.0);
        number.options.minimum_fraction_digits = Some(2);
        assert_eq!(number.format(), "1.00");

        let mut rounded = NumberValue::new(3.14159);
        rounded.options.maximum_fraction_digits = Some(2);
        assert_eq!(rounded.format(), "3.14");
    }

    #[test]
    fn test_literal_keeps_precision() {
        let literal = NumberLiteral::new("1.50").unwrap();
        assert_eq!(NumberValue::from_literal(&literal).format(), "1.50");
        let integer = NumberLiteral::new("7").unwrap();
        assert_eq!(NumberValue::from_literal(&integer).format(), "7");
    }

    #[test]
    fn test_args_replace_and_order() {
        let args: Args = [("b", 1), ("a", 2), ("b", 3)].into_iter().collect();
        let keys: Vec<_> = args.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["a", "b"]);
        assert_eq!(args.get("b"), Some(&Value::from(3)));
        assert_eq!(args.get("c"), None);
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::from("x").to_string(), "x");
        assert_eq!(Value::from(2.5).to_string(), "2.5");
        assert_eq!(Value::None.to_string(), "");
        assert_eq!(Value::from(None::<&str>), Value::None);
    }
}
