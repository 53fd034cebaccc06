//! FTL Error Handling - Unified Taxonomy
//!
//! Nothing in this crate reports a data-level problem by panicking or by
//! returning `Err` from `parse`/`resolve`. Instead:
//!
//! - the parser records syntax problems as `Junk` entries with annotations,
//!   which can be turned into rich [`SyntaxError`] diagnostics on demand
//! - the resolver returns a displayable string plus an ordered list of
//!   [`ResolverError`]s, each classified by [`ErrorCategory`]
//!
//! `Err` results are reserved for constructing invalid AST nodes
//! ([`AstError`]), loading configuration ([`ConfigError`]) and functions
//! reporting failure to the resolver ([`FunctionError`]).

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceSpan};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::ast::{AnnotationCode, Entry, Resource, Span};

// ============================================================================
// SOURCE CONTEXT - Error reporting infrastructure
// ============================================================================

/// Names a piece of FTL source for diagnostics.
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub name: String,
    pub content: String,
}

impl SourceContext {
    /// Create a source context from real file content
    pub fn from_file(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Convert to NamedSource for use with miette error reporting
    pub fn to_named_source(&self) -> Arc<NamedSource<String>> {
        Arc::new(NamedSource::new(self.name.clone(), self.content.clone()))
    }
}

// ============================================================================
// CATEGORIES
// ============================================================================

/// Coarse classification shared by every error the engine records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Parser-level: surfaced as junk plus annotation.
    Syntax,
    /// Unknown variables, cycles, depth limits.
    Resolution,
    /// A function failed, or a value could not be formatted.
    Formatting,
    /// A message, term, attribute or function that does not exist.
    Reference,
}

impl ErrorCategory {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Syntax => "SYNTAX",
            Self::Resolution => "RESOLUTION",
            Self::Formatting => "FORMATTING",
            Self::Reference => "REFERENCE",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// RESOLVER ERRORS
// ============================================================================

/// A recoverable problem met while formatting a message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolverError {
    #[error("unknown variable: ${0}")]
    UnknownVariable(String),
    #[error("unknown message: {0}")]
    UnknownMessage(String),
    #[error("unknown term: -{0}")]
    UnknownTerm(String),
    #[error("unknown attribute: {id}.{attribute}")]
    UnknownAttribute { id: String, attribute: String },
    #[error("message {0} has no value")]
    NoValue(String),
    #[error("unknown function: {0}")]
    UnknownFunction(String),
    #[error("cyclic reference detected at {0}")]
    Cyclic(String),
    #[error("maximum expression depth of {max} exceeded")]
    DepthExceeded { max: usize },
    #[error("function {name} failed: {source}")]
    FunctionFailed {
        name: String,
        #[source]
        source: FunctionError,
    },
    #[error("function {name} panicked")]
    FunctionPanicked { name: String },
    #[error("internal error while resolving {0}")]
    Internal(String),
}

impl ResolverError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnknownVariable(_)
            | Self::Cyclic(_)
            | Self::DepthExceeded { .. }
            | Self::Internal(_) => ErrorCategory::Resolution,

            Self::UnknownMessage(_)
            | Self::UnknownTerm(_)
            | Self::UnknownAttribute { .. }
            | Self::NoValue(_)
            | Self::UnknownFunction(_) => ErrorCategory::Reference,

            Self::FunctionFailed { .. } | Self::FunctionPanicked { .. } => {
                ErrorCategory::Formatting
            }
        }
    }

    /// Stable machine-readable code, e.g. for metrics labels.
    pub const fn code_suffix(&self) -> &'static str {
        match self {
            Self::UnknownVariable(_) => "unknown_variable",
            Self::UnknownMessage(_) => "unknown_message",
            Self::UnknownTerm(_) => "unknown_term",
            Self::UnknownAttribute { .. } => "unknown_attribute",
            Self::NoValue(_) => "no_value",
            Self::UnknownFunction(_) => "unknown_function",
            Self::Cyclic(_) => "cyclic_reference",
            Self::DepthExceeded { .. } => "depth_exceeded",
            Self::FunctionFailed { .. } => "function_failed",
            Self::FunctionPanicked { .. } => "function_panicked",
            Self::Internal(_) => "internal",
        }
    }
}

/// Failure reported by a registered function.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FunctionError {
    #[error("expected {expected} positional argument(s), got {actual}")]
    Arity { expected: usize, actual: usize },
    #[error("invalid argument {name}: {reason}")]
    InvalidArgument { name: String, reason: String },
    #[error("{0}")]
    Custom(String),
}

// ============================================================================
// CONSTRUCTION & CONFIGURATION ERRORS
// ============================================================================

/// Raised by the checked AST constructors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AstError {
    #[error("invalid number literal '{raw}': {reason}")]
    InvalidNumber { raw: String, reason: String },
    #[error("invalid string literal '{raw}': {reason}")]
    InvalidString { raw: String, reason: String },
    #[error("select expression has no variants")]
    MissingVariants,
    #[error("select expression has no default variant")]
    MissingDefaultVariant,
    #[error("select expression has more than one default variant")]
    MultipleDefaultVariants,
    #[error("invalid selector: {0}")]
    InvalidSelector(String),
    #[error("named argument '{0}' is given more than once")]
    DuplicatedNamedArgument(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

// ============================================================================
// SYNTAX DIAGNOSTICS
// ============================================================================

/// Context-specific source information
#[derive(Debug, Clone)]
pub struct SourceInfo {
    pub source: Arc<NamedSource<String>>,
    pub primary_span: SourceSpan,
}

/// Diagnostic enhancement data
#[derive(Debug, Clone)]
pub struct DiagnosticInfo {
    pub help: Option<String>,
    pub error_code: String,
}

/// A junk annotation rendered as a miette diagnostic.
#[derive(Debug)]
pub struct SyntaxError {
    pub code: AnnotationCode,
    pub message: String,
    pub source_info: SourceInfo,
    pub diagnostic_info: DiagnosticInfo,
}

impl std::error::Error for SyntaxError {}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Syntax error: {}", self.message)
    }
}

impl Diagnostic for SyntaxError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(&self.diagnostic_info.error_code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diagnostic_info
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let labels = vec![LabeledSpan::new_with_span(
            Some(primary_label(self.code).into()),
            self.source_info.primary_span,
        )];
        Some(Box::new(labels.into_iter()))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&*self.source_info.source)
    }
}

fn primary_label(code: AnnotationCode) -> &'static str {
    match code {
        AnnotationCode::ParseJunk => "unexpected input here",
        AnnotationCode::NestingDepthExceeded => "nested too deeply",
        AnnotationCode::ParseErrorLimit => "parsing stopped here",
        AnnotationCode::SourceTooLarge => "source too large",
    }
}

fn help_for(code: AnnotationCode) -> Option<String> {
    match code {
        AnnotationCode::ParseJunk => None,
        AnnotationCode::NestingDepthExceeded => {
            Some("flatten the nested placeables or raise max_nesting_depth".into())
        }
        AnnotationCode::ParseErrorLimit => {
            Some("fix the earlier errors or raise max_parse_errors".into())
        }
        AnnotationCode::SourceTooLarge => {
            Some("split the resource or raise max_source_size".into())
        }
    }
}

/// Converts a Span to a miette SourceSpan.
pub fn to_source_span(span: Span) -> SourceSpan {
    SourceSpan::from(span.start..span.end)
}

/// Builds one diagnostic per junk annotation in `resource`.
///
/// `source` must hold the text the resource was parsed from (after line-ending
/// normalization, which is a no-op for LF sources).
pub fn syntax_errors(resource: &Resource, source: &SourceContext) -> Vec<SyntaxError> {
    let named = source.to_named_source();
    resource
        .entries
        .iter()
        .filter_map(|entry| match entry {
            Entry::Junk(junk) => Some(junk),
            _ => None,
        })
        .flat_map(|junk| junk.annotations.iter())
        .map(|annotation| SyntaxError {
            code: annotation.code,
            message: annotation.message.clone(),
            source_info: SourceInfo {
                source: Arc::clone(&named),
                primary_span: to_source_span(annotation.span),
            },
            diagnostic_info: DiagnosticInfo {
                help: help_for(annotation.code),
                error_code: format!(
                    "ftl::syntax::{}",
                    annotation.code.as_str().to_ascii_lowercase()
                ),
            },
        })
        .collect()
}

// ============================================================================
// ERROR FORMATTING UTILITIES
// ============================================================================

/// Renders a diagnostic the way miette's installed report handler shows it.
pub fn render_error<E>(error: E) -> String
where
    E: Diagnostic + Send + Sync + 'static,
{
    let report = miette::Report::new(error);
    format!("{report:?}")
}

/// Prints a diagnostic with full miette rendering to stderr.
pub fn print_error<E>(error: E)
where
    E: Diagnostic + Send + Sync + 'static,
{
    eprintln!("{}", render_error(error));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolver_error_categories() {
        assert_eq!(
            ResolverError::UnknownVariable("x".into()).category(),
            ErrorCategory::Resolution
        );
        assert_eq!(
            ResolverError::UnknownMessage("m".into()).category(),
            ErrorCategory::Reference
        );
        assert_eq!(
            ResolverError::FunctionPanicked { name: "F".into() }.category(),
            ErrorCategory::Formatting
        );
        assert_eq!(
            ResolverError::DepthExceeded { max: 3 }.code_suffix(),
            "depth_exceeded"
        );
    }

    #[test]
    fn test_resolver_error_display() {
        let err = ResolverError::FunctionFailed {
            name: "NUMBER".into(),
            source: FunctionError::Arity {
                expected: 1,
                actual: 0,
            },
        };
        assert_eq!(
            err.to_string(),
            "function NUMBER failed: expected 1 positional argument(s), got 0"
        );
    }

    #[test]
    fn test_syntax_errors_from_junk() {
        let source = "key = { $x\n";
        let resource = crate::syntax::parser::parse(source);
        let errors = syntax_errors(&resource, &SourceContext::from_file("test.ftl", source));
        assert_eq!(errors.len(), 1);
        let code = errors[0].code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("ftl::syntax::parse_junk"));
        assert!(errors[0].labels().is_some());
    }

    #[test]
    fn test_render_syntax_error() {
        let source = "ok = 1\nkey = { $x\n";
        let resource = crate::syntax::parser::parse(source);
        let mut errors = syntax_errors(&resource, &SourceContext::from_file("menu.ftl", source));
        let rendered = render_error(errors.remove(0));
        assert!(rendered.contains("ftl::syntax::parse_junk"), "{rendered}");
        assert!(rendered.contains("menu.ftl"), "{rendered}");
        assert!(rendered.contains("Syntax error"), "{rendered}");
    }

    #[test]
    fn test_print_error_accepts_every_diagnostic() {
        let source = "!!\n";
        let resource = crate::syntax::parser::parse(source);
        for error in syntax_errors(&resource, &SourceContext::from_file("bad.ftl", source)) {
            print_error(error);
        }
    }
}
