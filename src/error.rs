use thiserror::Error;

/// Errors that can occur while reading a text log into the log stream
#[derive(Error, Debug)]
pub enum CollectorError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors that can occur during configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Invalid configuration value: {0}")]
    ValidationError(String),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Error returned when a severity or log kind name is not recognized
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown severity '{0}', expected one of: log, warning, assert, error, exception")]
pub struct ParseSeverityError(pub String);
