//! Finder Configuration
//!
//! Configuration can be set programmatically, loaded from TOML, or
//! overridden from environment variables.
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `REFLEX_TAG` | Label attached to every diagnostic | `Method` |
//! | `REFLEX_CACHE` | Memoize resolutions ("true"/"false") | true |
//! | `REFLEX_REPORT_FOUND` | Report resolved members | true |
//! | `REFLEX_REPORT_FAILURES` | Report failed resolutions | true |
//!
//! # Example
//!
//! ```
//! use reflex::FinderConfig;
//!
//! let config = FinderConfig::from_toml_str("tag = \"Hooks\"\ncache_enabled = false").unwrap();
//! assert_eq!(config.tag, "Hooks");
//! assert!(!config.cache_enabled);
//! assert!(config.report_failures);
//! ```

use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value `{value}` for {key}")]
    Env { key: String, value: String },
}

/// Configuration for a [`Finder`](crate::Finder).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinderConfig {
    /// Label attached to every diagnostic.
    pub tag: String,

    /// Memoize resolutions by (type, rule set).
    pub cache_enabled: bool,

    /// Emit an event for every resolved member.
    pub report_found_members: bool,

    /// Emit an event when a resolution without a remedy plan fails.
    pub report_failures: bool,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            tag: "Method".to_string(),
            cache_enabled: true,
            report_found_members: true,
            report_failures: true,
        }
    }
}

impl FinderConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a builder.
    pub fn builder() -> FinderConfigBuilder {
        FinderConfigBuilder::default()
    }

    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Load a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    /// Apply `REFLEX_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides_from(|key| env::var(key).ok())
    }

    /// Apply `REFLEX_*` overrides from an arbitrary lookup.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(tag) = lookup("REFLEX_TAG") {
            self.tag = tag;
        }
        if let Some(value) = lookup("REFLEX_CACHE") {
            self.cache_enabled = parse_bool("REFLEX_CACHE", &value)?;
        }
        if let Some(value) = lookup("REFLEX_REPORT_FOUND") {
            self.report_found_members = parse_bool("REFLEX_REPORT_FOUND", &value)?;
        }
        if let Some(value) = lookup("REFLEX_REPORT_FAILURES") {
            self.report_failures = parse_bool("REFLEX_REPORT_FAILURES", &value)?;
        }
        Ok(self)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Env {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Builder for [`FinderConfig`].
#[derive(Debug, Default)]
pub struct FinderConfigBuilder {
    config: FinderConfig,
}

impl FinderConfigBuilder {
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.config.tag = tag.into();
        self
    }

    pub fn cache_enabled(mut self, enabled: bool) -> Self {
        self.config.cache_enabled = enabled;
        self
    }

    pub fn report_found_members(mut self, enabled: bool) -> Self {
        self.config.report_found_members = enabled;
        self
    }

    pub fn report_failures(mut self, enabled: bool) -> Self {
        self.config.report_failures = enabled;
        self
    }

    pub fn build(self) -> FinderConfig {
        self.config
    }
}
