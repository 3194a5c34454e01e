//! Core event types and enums for the crash relay
//!
//! This module defines the values that flow through the forwarding pipeline:
//! the platform log kind, the forwarding severity, the observed log event and
//! the report handed to a notifier.

use crate::error::ParseSeverityError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Timestamp type for consistent time handling across the application
pub type Timestamp = DateTime<Utc>;

/// Forwarding priority of a log event
///
/// Variants are declared in ascending order of how likely an event should be
/// reported. This does not follow the numeric order of platform log codes:
/// `Assert` sits below `Error` on purpose.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Plain log output
    Log,
    /// Warning output
    Warning,
    /// Failed assertion
    Assert,
    /// Error output
    Error,
    /// Uncaught exception or panic
    #[default]
    Exception,
}

impl Severity {
    /// All severities from lowest to highest
    pub const ALL: [Severity; 5] = [
        Severity::Log,
        Severity::Warning,
        Severity::Assert,
        Severity::Error,
        Severity::Exception,
    ];

    /// Lowercase name used in configuration and output
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Log => "log",
            Severity::Warning => "warning",
            Severity::Assert => "assert",
            Severity::Error => "error",
            Severity::Exception => "exception",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Severity::ALL
            .into_iter()
            .find(|severity| severity.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseSeverityError(s.to_string()))
    }
}

/// Kind of log entry as reported by the platform logging subsystem
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Log,
    Warning,
    Assert,
    Error,
    Exception,
    /// Anything the platform emits that we do not recognize
    Unknown,
}

impl LogKind {
    /// Map a numeric platform log code to a kind
    ///
    /// The platform numbers its kinds Error=0, Assert=1, Warning=2, Log=3,
    /// Exception=4. Every other code is `Unknown`.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => LogKind::Error,
            1 => LogKind::Assert,
            2 => LogKind::Warning,
            3 => LogKind::Log,
            4 => LogKind::Exception,
            _ => LogKind::Unknown,
        }
    }

    /// Map a textual kind name (case-insensitive) to a kind
    ///
    /// Accepts the kind names and a few common aliases. Unrecognized names
    /// become `Unknown` rather than an error.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "log" | "info" | "debug" | "trace" => LogKind::Log,
            "warning" | "warn" => LogKind::Warning,
            "assert" => LogKind::Assert,
            "error" => LogKind::Error,
            "exception" | "fatal" | "panic" => LogKind::Exception,
            _ => LogKind::Unknown,
        }
    }
}

impl From<log::Level> for LogKind {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => LogKind::Error,
            log::Level::Warn => LogKind::Warning,
            log::Level::Info | log::Level::Debug | log::Level::Trace => LogKind::Log,
        }
    }
}

/// One observed log or exception occurrence
///
/// Produced by the ambient logging subsystem and consumed once by the
/// current log stream subscriber.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogEvent {
    /// When the entry was emitted
    pub timestamp: Timestamp,
    /// Raw, unstructured log text
    pub message: String,
    /// Stack trace accompanying the entry, empty when none was captured
    pub stack_trace: String,
    /// Platform kind of the entry
    pub kind: LogKind,
    /// Severity attached by the producer, overriding the kind mapping
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

impl LogEvent {
    /// Create an event stamped with the current time
    pub fn new(message: impl Into<String>, stack_trace: impl Into<String>, kind: LogKind) -> Self {
        Self {
            timestamp: Utc::now(),
            message: message.into(),
            stack_trace: stack_trace.into(),
            kind,
            severity: None,
        }
    }

    /// Attach an explicit severity to the event
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Severity used for the forwarding decision
    pub fn effective_severity(&self) -> Severity {
        self.severity
            .unwrap_or_else(|| crate::classify::map_severity(self.kind))
    }
}

/// Structured error report handed to a notifier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorReport {
    /// Error class, e.g. the exception type name
    pub error_class: String,
    /// Human-readable message, absent when none could be extracted
    pub error_message: Option<String>,
    /// Stack trace, possibly empty
    pub stack_trace: String,
}
