//! # ftl-engine
//!
//! A fault-tolerant parser and resolver for Fluent (FTL) localization files.
//!
//! The pipeline has two halves:
//!
//! - [`syntax`] turns FTL source into an immutable [`ast::Resource`]. Parsing
//!   never fails; broken entries become `Junk` with annotations.
//! - [`runtime`] formats messages from one or more resources, reporting
//!   problems as a list of [`ResolverError`]s next to a best-effort string.
//!
//! ```rust
//! use ftl_engine::{parse, resolve, Args, EntryIndex, FunctionRegistry, ResolverConfig};
//!
//! let resource = parse("emails = { $count ->\n    [one] One email\n   *[other] { $count } emails\n}\n");
//! let index = EntryIndex::from_resource(&resource);
//! let functions = FunctionRegistry::with_builtins();
//! let mut args = Args::new();
//! args.set("count", 5);
//! let config = ResolverConfig::default().with_isolating(false);
//! let (text, errors) = resolve(&index, "emails", None, Some(&args), "en-US", &functions, config);
//! assert_eq!(text, "5 emails");
//! assert!(errors.is_empty());
//! ```

pub use crate::config::{EngineConfig, ParserConfig, ResolverConfig};
pub use crate::errors::{
    print_error, render_error, syntax_errors, AstError, ErrorCategory, FunctionError, ResolverError,
    SourceContext, SyntaxError,
};
pub use crate::runtime::{resolve, Args, EntryIndex, FunctionRegistry, Resolver, Value};
pub use crate::syntax::{parse, parse_with_config, serialize};

pub mod ast;
pub mod config;
pub mod errors;
pub mod runtime;
pub mod syntax;
