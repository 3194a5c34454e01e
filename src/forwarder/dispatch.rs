use super::{ConfigHandle, ForwardingConfig};
use crate::classify::parse_message;
use crate::events::{ErrorReport, LogEvent};
use crate::notifier::Notifier;
use crate::stream::LogSubscriber;
use log::debug;
use std::sync::Arc;

/// Forward `event` to `notifier` if it passes the configured gate
///
/// The event qualifies when auto-notify is on and its severity is at least
/// the notify level. A qualifying event is parsed into an error class and
/// message and sent with exactly one `notify` call; nothing is retried or
/// buffered here.
///
/// # Returns
///
/// `true` if the event was handed to the notifier
pub fn handle(event: &LogEvent, config: &ForwardingConfig, notifier: &dyn Notifier) -> bool {
    let severity = event.effective_severity();
    if !config.should_forward(severity) {
        return false;
    }

    let parsed = parse_message(&event.message);
    debug!("Forwarding {} event as {}", severity, parsed.error_class);
    notifier.notify(&ErrorReport {
        error_class: parsed.error_class,
        error_message: parsed.error_message,
        stack_trace: event.stack_trace.clone(),
    });
    true
}

/// Log stream subscriber that forwards qualifying events to a notifier
///
/// Each event reads one snapshot of the shared configuration; the config
/// lock is released before the notifier is called.
#[derive(Clone)]
pub struct Forwarder {
    config: ConfigHandle,
    notifier: Arc<dyn Notifier>,
}

impl Forwarder {
    pub fn new(config: ConfigHandle, notifier: Arc<dyn Notifier>) -> Self {
        Self { config, notifier }
    }

    /// Handle one event against the current configuration
    pub fn forward(&self, event: &LogEvent) -> bool {
        let config = self.config.snapshot();
        handle(event, &config, self.notifier.as_ref())
    }

    pub fn config(&self) -> &ConfigHandle {
        &self.config
    }
}

impl LogSubscriber for Forwarder {
    fn on_log(&self, event: &LogEvent) {
        self.forward(event);
    }
}
