/// Notifier that discards every call
pub mod noop;

/// Notifier that writes reports as JSON lines
pub mod json_lines;

pub use json_lines::JsonLinesNotifier;
pub use noop::NoopNotifier;

use crate::events::ErrorReport;

/// Crash-reporting backend reached by the forwarder
///
/// Implementations bind a concrete reporting SDK. Every call is
/// fire-and-forget: transport, retries and persistence are the
/// implementation's business and failures are never surfaced to callers.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    /// Register the application with the backend using its API key
    fn register(&self, api_key: &str);

    /// Choose whether reports are sent over a secure transport
    fn set_use_secure_transport(&self, secure: bool);

    /// Tell the backend whether uncaught errors are reported automatically
    fn set_auto_notify(&self, auto_notify: bool);

    fn set_user_id(&self, user_id: &str);

    fn set_context(&self, context: &str);

    fn set_release_stage(&self, release_stage: &str);

    /// Send one error report
    fn notify(&self, report: &ErrorReport);

    /// Attach a key/value attribute to a named metadata tab
    fn add_to_tab(&self, tab_name: &str, attribute_name: &str, attribute_value: &str);

    /// Remove all attributes from a named metadata tab
    fn clear_tab(&self, tab_name: &str);
}
