//! Function registry
//!
//! Maps upper-case function names (`NUMBER`, `DATETIME`, ...) to callables.
//! A registry is built once by the host and shared by reference with every
//! resolver. Functions must be thread-safe; they may call back into the
//! resolver.
//!
//! ## Usage
//! ```rust
//! use ftl_engine::runtime::{Args, FunctionRegistry, Value};
//! let mut functions = FunctionRegistry::with_builtins();
//! functions.register("SHOUT", |positional: &[Value], _named: &Args| {
//!     Ok(Value::from(positional.first().map(|v| v.to_string().to_uppercase())))
//! });
//! assert!(functions.has("shout"));
//! assert_eq!(functions.list(), vec!["NUMBER", "SHOUT"]);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::errors::FunctionError;
use crate::runtime::value::{Args, NumberKind, NumberValue, Value};

/// Signature shared by every registered function: positional arguments,
/// named arguments, and a value or an error back.
pub type Function = dyn Fn(&[Value], &Args) -> Result<Value, FunctionError> + Send + Sync;

#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, Arc<Function>>,
}

impl FunctionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in functions.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        register_builtins(&mut registry);
        registry
    }

    /// Registers `func` under `name`, replacing any previous entry. Names are
    /// stored upper-case.
    pub fn register<F>(&mut self, name: &str, func: F)
    where
        F: Fn(&[Value], &Args) -> Result<Value, FunctionError> + Send + Sync + 'static,
    {
        self.functions
            .insert(name.to_ascii_uppercase(), Arc::new(func));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Function>> {
        self.functions.get(&name.to_ascii_uppercase())
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<Function>> {
        self.functions.remove(&name.to_ascii_uppercase())
    }

    /// Registered names, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<_> = self.functions.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn clear(&mut self) {
        self.functions.clear();
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.list())
            .finish()
    }
}

// ============================================================================
// BUILT-INS
// ============================================================================

pub fn register_builtins(registry: &mut FunctionRegistry) {
    registry.register("NUMBER", number);
}

/// `NUMBER($value, minimumFractionDigits: 2, maximumFractionDigits: 3, type: "ordinal")`
///
/// Unrecognized named options are ignored.
pub fn number(positional: &[Value], named: &Args) -> Result<Value, FunctionError> {
    let [value] = positional else {
        return Err(FunctionError::Arity {
            expected: 1,
            actual: positional.len(),
        });
    };
    let mut number = match value {
        Value::Number(number) => number.clone(),
        Value::String(text) => text
            .trim()
            .parse::<f64>()
            .map(NumberValue::new)
            .map_err(|_| FunctionError::InvalidArgument {
                name: "value".into(),
                reason: format!("'{text}' is not a number"),
            })?,
        Value::None => {
            return Err(FunctionError::InvalidArgument {
                name: "value".into(),
                reason: "missing value".into(),
            })
        }
    };
    for (name, option) in named.iter() {
        match name {
            "minimumFractionDigits" => {
                number.options.minimum_fraction_digits = Some(digit_count(name, option)?)
            }
            "maximumFractionDigits" => {
                number.options.maximum_fraction_digits = Some(digit_count(name, option)?)
            }
            "type" => {
                number.options.kind = match option.as_string().as_ref() {
                    "cardinal" => NumberKind::Cardinal,
                    "ordinal" => NumberKind::Ordinal,
                    other => {
                        return Err(FunctionError::InvalidArgument {
                            name: name.into(),
                            reason: format!("unknown plural type '{other}'"),
                        })
                    }
                }
            }
            _ => {}
        }
    }
    Ok(Value::Number(number))
}

const MAX_FRACTION_DIGITS: usize = 100;

fn digit_count(name: &str, option: &Value) -> Result<usize, FunctionError> {
    let invalid = || FunctionError::InvalidArgument {
        name: name.into(),
        reason: format!("expected an integer between 0 and {MAX_FRACTION_DIGITS}"),
    };
    let n = option.as_number().ok_or_else(invalid)?.value;
    if n.fract() != 0.0 || !(0.0..=MAX_FRACTION_DIGITS as f64).contains(&n) {
        return Err(invalid());
    }
    Ok(n as usize)
}
