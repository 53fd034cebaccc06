//! Runtime module for FTL
//!
//! Formats messages out of parsed resources.
//!
//! - **`value`**: runtime values and argument maps
//! - **`index`**: message and term lookup
//! - **`registry`**: callable functions such as `NUMBER`
//! - **`plural`**: CLDR plural categories
//! - **`bidi`**: directional isolation marks
//! - **`scope`**: the per-thread depth guard
//! - **`eval`**: the resolver itself

pub mod bidi;
pub mod eval;
pub mod index;
pub mod plural;
pub mod registry;
pub mod scope;
pub mod value;

pub use eval::{resolve, Resolver};
pub use index::EntryIndex;
pub use plural::{default_plurals, CldrPlurals, PluralCategory, PluralService};
pub use registry::{Function, FunctionRegistry};
pub use scope::current_depth;
pub use value::{Args, NumberKind, NumberOptions, NumberValue, Value};
