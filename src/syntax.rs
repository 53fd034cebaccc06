//! Syntax module for FTL
//!
//! Everything between source text and the AST: a hand-written recursive
//! descent parser built from small rules over an immutable [`cursor::Cursor`],
//! plus the serializer that goes the other way.
//!
//! - **`cursor`**: position tracking over normalized source
//! - **`primitives`**: identifiers, numbers, string literals, escapes
//! - **`rules`**: entries, patterns, placeables, expressions
//! - **`parser`**: the fault-tolerant resource driver
//! - **`serializer`**: canonical FTL output

pub mod cursor;
pub mod error;
pub mod parser;
pub mod primitives;
pub mod rules;
pub mod serializer;

pub use error::{FailureKind, ParseFailure};
pub use parser::{normalize_line_endings, parse, parse_with_config};
pub use serializer::{serialize, serialize_pattern};
