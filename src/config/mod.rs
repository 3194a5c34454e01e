//! Configuration file support
//!
//! The relay reads a TOML file with three optional sections:
//!
//! ```toml
//! [reporter]
//! api_key = "0123456789abcdef0123456789abcdef"
//! auto_notify = true
//! notify_level = "error"
//! use_secure_transport = true
//!
//! [metadata]
//! user_id = "player-17"
//! context = "Main Menu"
//! release_stage = "production"
//!
//! [metadata.tabs.device]
//! gpu = "m2"
//!
//! [output]
//! max_stack_trace_len = 16384
//! ```
//!
//! Every field has a default, so an empty file is valid.

use crate::error::ConfigError;
use crate::forwarder::ForwardingConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Complete relay configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Forwarding gate and backend registration
    pub reporter: ForwardingConfig,
    /// Metadata attached to every report
    pub metadata: Metadata,
    /// Output settings for the JSON-lines notifier
    pub output: OutputConfig,
}

/// Report metadata applied to the notifier at startup
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Metadata {
    pub user_id: Option<String>,
    pub context: Option<String>,
    pub release_stage: Option<String>,
    /// Named tabs of key/value attributes
    pub tabs: BTreeMap<String, BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputConfig {
    /// Maximum number of bytes of stack trace written per report
    pub max_stack_trace_len: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_stack_trace_len: 16 * 1024,
        }
    }
}

impl Config {
    /// Load and validate configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadError` if the file cannot be read,
    /// `ConfigError::TomlError` if it is not valid TOML for this schema, and
    /// `ConfigError::ValidationError` if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that the schema alone cannot constrain
    pub fn validate(&self) -> Result<(), ConfigError> {
        let api_key = &self.reporter.api_key;
        if !api_key.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ConfigError::ValidationError(
                "reporter.api_key must contain only ASCII letters and digits".to_string(),
            ));
        }

        if self.output.max_stack_trace_len == 0 {
            return Err(ConfigError::ValidationError(
                "output.max_stack_trace_len must be greater than zero".to_string(),
            ));
        }

        if let Some(tab) = self.metadata.tabs.keys().find(|name| name.trim().is_empty()) {
            return Err(ConfigError::ValidationError(format!(
                "metadata tab names must not be blank, got '{}'",
                tab
            )));
        }

        Ok(())
    }
}
