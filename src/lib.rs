/// Error types for configuration and collection
pub mod error;

/// Log events, kinds and severities
pub mod events;

/// Severity mapping and message parsing
pub mod classify;

/// Forwarding decision and live configuration
pub mod forwarder;

/// Crash-reporting backend interface and implementations
pub mod notifier;

/// Process-wide log stream and its feeds
pub mod stream;

/// Reporter lifecycle
pub mod reporter;

/// Configuration management
pub mod config;

/// Text log collectors
pub mod collectors;

// Re-export commonly used types
pub use error::{CollectorError, ConfigError, ParseSeverityError};
pub use events::{ErrorReport, LogEvent, LogKind, Severity};
pub use forwarder::{ConfigHandle, Forwarder, ForwardingConfig};
pub use notifier::Notifier;
pub use reporter::{LifecycleState, Reporter};
pub use stream::{LogStream, LogSubscriber};
