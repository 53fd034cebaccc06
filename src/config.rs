//! Engine limits and switches.
//!
//! Every limit has a safe default. A value of `0` for `max_parse_errors` or
//! `max_source_size` means "unlimited". Configs can be built in code with the
//! `with_*` builders or loaded from YAML/JSON documents; missing fields keep
//! their defaults.

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

// ============================================================================
// CONSTANTS
// ============================================================================

pub const DEFAULT_MAX_NESTING_DEPTH: usize = 100;
pub const DEFAULT_MAX_PARSE_ERRORS: usize = 100;
pub const DEFAULT_MAX_SOURCE_SIZE: usize = 10 * 1024 * 1024;
/// Room for a message nested to the parser's default limit, plus the
/// message itself and a select's selector.
pub const DEFAULT_MAX_EXPRESSION_DEPTH: usize = 128;

const _: () = assert!(DEFAULT_MAX_EXPRESSION_DEPTH > DEFAULT_MAX_NESTING_DEPTH + 2);

pub const MAX_IDENTIFIER_LENGTH: usize = 256;
pub const MAX_NUMBER_LENGTH: usize = 1000;
pub const MAX_STRING_LITERAL_LENGTH: usize = 65_536;

// ============================================================================
// PARSER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Deepest allowed `{ ... }` / call-argument nesting.
    pub max_nesting_depth: usize,
    /// Junk entries after which parsing stops. `0` disables the limit.
    pub max_parse_errors: usize,
    /// Largest accepted source in bytes. `0` disables the limit.
    pub max_source_size: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            max_parse_errors: DEFAULT_MAX_PARSE_ERRORS,
            max_source_size: DEFAULT_MAX_SOURCE_SIZE,
        }
    }
}

impl ParserConfig {
    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    pub fn with_max_parse_errors(mut self, count: usize) -> Self {
        self.max_parse_errors = count;
        self
    }

    pub fn with_max_source_size(mut self, bytes: usize) -> Self {
        self.max_source_size = bytes;
        self
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Wrap interpolated values in Unicode directional isolates.
    pub use_isolating: bool,
    /// Deepest allowed chain of nested resolutions, callbacks included.
    pub max_expression_depth: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            use_isolating: true,
            max_expression_depth: DEFAULT_MAX_EXPRESSION_DEPTH,
        }
    }
}

impl ResolverConfig {
    pub fn with_isolating(mut self, use_isolating: bool) -> Self {
        self.use_isolating = use_isolating;
        self
    }

    pub fn with_max_expression_depth(mut self, depth: usize) -> Self {
        self.max_expression_depth = depth;
        self
    }
}

// ============================================================================
// COMBINED
// ============================================================================

/// Both halves of the engine configuration, as loaded from a document.
///
/// # Examples
///
/// ```rust
/// use ftl_engine::config::EngineConfig;
/// let config = EngineConfig::from_yaml_str("parser:\n  max_nesting_depth: 8\n").unwrap();
/// assert_eq!(config.parser.max_nesting_depth, 8);
/// assert!(config.resolver.use_isolating);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub parser: ParserConfig,
    pub resolver: ResolverConfig,
}

impl EngineConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.parser.max_nesting_depth == 0 {
            return Err(ConfigError::Invalid(
                "parser.max_nesting_depth must be at least 1".into(),
            ));
        }
        if self.resolver.max_expression_depth == 0 {
            return Err(ConfigError::Invalid(
                "resolver.max_expression_depth must be at least 1".into(),
            ));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.parser.max_nesting_depth, DEFAULT_MAX_NESTING_DEPTH);
        assert_eq!(config.parser.max_parse_errors, DEFAULT_MAX_PARSE_ERRORS);
        assert_eq!(
            config.resolver.max_expression_depth,
            DEFAULT_MAX_EXPRESSION_DEPTH
        );
    }

    #[test]
    fn test_json_partial_config() {
        let config = EngineConfig::from_json_str(
            r#"{"resolver": {"use_isolating": false}, "parser": {"max_parse_errors": 0}}"#,
        )
        .unwrap();
        assert!(!config.resolver.use_isolating);
        assert_eq!(config.parser.max_parse_errors, 0);
        assert_eq!(config.parser.max_source_size, DEFAULT_MAX_SOURCE_SIZE);
    }

    #[test]
    fn test_rejects_zero_depth() {
        let err = EngineConfig::from_yaml_str("parser:\n  max_nesting_depth: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_malformed_document() {
        assert!(matches!(
            EngineConfig::from_json_str("{not json"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_builders() {
        let parser = ParserConfig::default()
            .with_max_nesting_depth(4)
            .with_max_parse_errors(2)
            .with_max_source_size(10);
        assert_eq!(parser.max_nesting_depth, 4);
        assert_eq!(parser.max_parse_errors, 2);
        assert_eq!(parser.max_source_size, 10);
        let resolver = ResolverConfig::default()
            .with_isolating(false)
            .with_max_expression_depth(5);
        assert!(!resolver.use_isolating);
        assert_eq!(resolver.max_expression_depth, 5);
    }
}
