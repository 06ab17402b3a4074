//! Tuple engine configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_MAX_PACKED_WORDS, DEFAULT_MAX_SPECIALIZED_WIDTH, DEFAULT_MAX_VIEW_DEPTH,
    MIN_SPECIALIZED_WIDTH,
};
use crate::error::{TupleError, TupleResult};

/// Tuple engine configuration.
///
/// # Example
///
/// ```rust
/// use tessera_common::config::TupleConfig;
///
/// let config = TupleConfig::default();
/// assert_eq!(config.max_specialized_width, 32);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TupleConfig {
    /// Maximum number of fields specialized directly.
    /// Wider layouts are split into a head of this width and a tail.
    /// Default: 32
    #[serde(default = "default_max_specialized_width")]
    pub max_specialized_width: usize,

    /// Maximum number of 64-bit value words in a packed layout.
    /// Default: 64
    #[serde(default = "default_max_packed_words")]
    pub max_packed_words: usize,

    /// Maximum nesting depth of views built in automatic transform mode.
    /// Deeper chains are materialized instead.
    /// Default: 4
    #[serde(default = "default_max_view_depth")]
    pub max_view_depth: usize,

    /// Specialize new layouts synchronously inside `create`.
    /// Default: false
    #[serde(default)]
    pub drain_on_create: bool,
}

fn default_max_specialized_width() -> usize {
    DEFAULT_MAX_SPECIALIZED_WIDTH
}

fn default_max_packed_words() -> usize {
    DEFAULT_MAX_PACKED_WORDS
}

fn default_max_view_depth() -> usize {
    DEFAULT_MAX_VIEW_DEPTH
}

impl Default for TupleConfig {
    fn default() -> Self {
        Self {
            max_specialized_width: default_max_specialized_width(),
            max_packed_words: default_max_packed_words(),
            max_view_depth: default_max_view_depth(),
            drain_on_create: false,
        }
    }
}

impl TupleConfig {
    /// Creates a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration for tests: a narrow specialization width so
    /// head/tail splitting is exercised with small rows, and eager
    /// specialization.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            max_specialized_width: 4,
            drain_on_create: true,
            ..Default::default()
        }
    }

    /// Creates a builder for configuration.
    #[must_use]
    pub fn builder() -> TupleConfigBuilder {
        TupleConfigBuilder::new()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TupleError::InvalidConfig`] describing the first invalid
    /// setting.
    pub fn validate(&self) -> TupleResult<()> {
        if self.max_specialized_width < MIN_SPECIALIZED_WIDTH {
            return Err(TupleError::invalid_config(format!(
                "max_specialized_width must be at least {MIN_SPECIALIZED_WIDTH}"
            )));
        }

        if self.max_packed_words == 0 {
            return Err(TupleError::invalid_config(
                "max_packed_words must be at least 1",
            ));
        }

        if self.max_view_depth == 0 {
            return Err(TupleError::invalid_config(
                "max_view_depth must be at least 1",
            ));
        }

        Ok(())
    }

    /// Parses and validates a configuration from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`TupleError::InvalidConfig`] on malformed or invalid input.
    pub fn from_toml(content: &str) -> TupleResult<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| TupleError::invalid_config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, or
    /// [`TupleError::InvalidConfig`] if its content is invalid.
    pub fn from_file(path: &Path) -> TupleResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Saves configuration to a file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be written.
    pub fn save(&self, path: &Path) -> TupleResult<()> {
        let content = self.to_toml()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Converts configuration to a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`TupleError::Internal`] if serialization fails.
    pub fn to_toml(&self) -> TupleResult<String> {
        toml::to_string_pretty(self).map_err(|e| TupleError::internal(e.to_string()))
    }
}

/// Builder for tuple engine configuration.
#[derive(Debug, Default)]
pub struct TupleConfigBuilder {
    config: TupleConfig,
}

impl TupleConfigBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum directly specialized width.
    #[must_use]
    pub fn max_specialized_width(mut self, width: usize) -> Self {
        self.config.max_specialized_width = width;
        self
    }

    /// Sets the maximum number of packed value words.
    #[must_use]
    pub fn max_packed_words(mut self, words: usize) -> Self {
        self.config.max_packed_words = words;
        self
    }

    /// Sets the maximum view depth for automatic mode.
    #[must_use]
    pub fn max_view_depth(mut self, depth: usize) -> Self {
        self.config.max_view_depth = depth;
        self
    }

    /// Enables synchronous specialization in `create`.
    #[must_use]
    pub fn drain_on_create(mut self, enabled: bool) -> Self {
        self.config.drain_on_create = enabled;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> TupleConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = TupleConfig::default();
        assert_eq!(config.max_specialized_width, DEFAULT_MAX_SPECIALIZED_WIDTH);
        assert_eq!(config.max_packed_words, DEFAULT_MAX_PACKED_WORDS);
        assert_eq!(config.max_view_depth, DEFAULT_MAX_VIEW_DEPTH);
        assert!(!config.drain_on_create);
    }

    #[test]
    fn test_builder() {
        let config = TupleConfig::builder()
            .max_specialized_width(8)
            .max_view_depth(2)
            .drain_on_create(true)
            .build();

        assert_eq!(config.max_specialized_width, 8);
        assert_eq!(config.max_view_depth, 2);
        assert!(config.drain_on_create);
    }

    #[test]
    fn test_validate() {
        assert!(TupleConfig::for_testing().validate().is_ok());

        let config = TupleConfig::builder().max_specialized_width(1).build();
        assert!(config.validate().is_err());

        let config = TupleConfig::builder().max_view_depth(0).build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_toml_defaults() {
        let config = TupleConfig::from_toml("max_specialized_width = 16").unwrap();
        assert_eq!(config.max_specialized_width, 16);
        assert_eq!(config.max_packed_words, DEFAULT_MAX_PACKED_WORDS);
    }

    #[test]
    fn test_from_toml_invalid() {
        assert!(TupleConfig::from_toml("max_specialized_width = 0").is_err());
        assert!(TupleConfig::from_toml("max_view_depth = \"deep\"").is_err());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tessera.toml");

        let config = TupleConfig::builder().max_specialized_width(12).build();
        config.save(&path).unwrap();

        let loaded = TupleConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
