//! Reporter lifecycle: registration, metadata and log stream attachment
//!
//! A [`Reporter`] owns the forwarding configuration and the notifier for one
//! application. It registers with the backend on [`Reporter::start`], pushes
//! user/context/release metadata to the notifier, and attaches a
//! [`Forwarder`] to a [`LogStream`] so that qualifying log events are
//! reported automatically.

use crate::config::Metadata;
use crate::events::{ErrorReport, Severity};
use crate::forwarder::{ConfigHandle, Forwarder, ForwardingConfig};
use crate::notifier::Notifier;
use crate::stream::{LogStream, LogSubscriber};
use log::{debug, info, warn};
use std::backtrace::{Backtrace, BacktraceStatus};
use std::sync::Arc;

/// Where the reporter is in its attach/detach cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Never attached to a log stream
    Uninitialized,
    /// Forwarding events from the log stream
    Attached,
    /// Previously attached, currently not forwarding
    Detached,
}

/// Connects a log stream to a crash-reporting notifier
pub struct Reporter {
    config: ConfigHandle,
    notifier: Arc<dyn Notifier>,
    stream: Arc<LogStream>,
    subscriber: Arc<dyn LogSubscriber>,
    state: LifecycleState,
}

impl Reporter {
    /// Create a reporter for `stream`; nothing is registered or attached yet
    pub fn new(
        config: ForwardingConfig,
        notifier: Arc<dyn Notifier>,
        stream: Arc<LogStream>,
    ) -> Self {
        let config = ConfigHandle::new(config);
        let subscriber: Arc<dyn LogSubscriber> =
            Arc::new(Forwarder::new(config.clone(), Arc::clone(&notifier)));
        Self {
            config,
            notifier,
            stream,
            subscriber,
            state: LifecycleState::Uninitialized,
        }
    }

    /// Register with the backend and push transport settings
    pub fn start(&self) {
        let config = self.config.snapshot();
        if config.api_key.is_empty() {
            warn!("No API key configured, the backend will reject reports");
        }
        self.notifier.register(&config.api_key);
        self.notifier.set_use_secure_transport(config.use_secure_transport);
        self.notifier.set_auto_notify(config.auto_notify);
        info!(
            "Reporter started (auto_notify={}, notify_level={})",
            config.auto_notify, config.notify_level
        );
    }

    /// Push configured metadata and tabs to the notifier
    pub fn apply_metadata(&self, metadata: &Metadata) {
        if let Some(user_id) = &metadata.user_id {
            self.set_user_id(user_id);
        }
        if let Some(context) = &metadata.context {
            self.set_context(context);
        }
        if let Some(release_stage) = &metadata.release_stage {
            self.set_release_stage(release_stage);
        }
        for (tab_name, attributes) in &metadata.tabs {
            for (name, value) in attributes {
                self.add_to_tab(tab_name, name, value);
            }
        }
    }

    /// Start forwarding events from the log stream
    ///
    /// Replaces whatever subscriber the stream had, including this
    /// reporter's own, so events are never delivered twice.
    pub fn attach(&mut self) {
        if self.stream.subscribe(Arc::clone(&self.subscriber)).is_some() {
            debug!("Attach replaced the previous log stream subscriber");
        }
        self.state = LifecycleState::Attached;
        info!("Reporter attached to log stream");
    }

    /// Stop forwarding events from the log stream
    ///
    /// Calling this when not attached does nothing. If another subscriber
    /// has replaced this reporter on the stream, it is left in place.
    pub fn detach(&mut self) {
        if self.state != LifecycleState::Attached {
            return;
        }
        if !self.stream.unsubscribe_if(&self.subscriber) {
            debug!("Reporter was already replaced on the log stream");
        }
        self.state = LifecycleState::Detached;
        info!("Reporter detached from log stream");
    }

    /// Current lifecycle state
    ///
    /// A reporter that another subscriber has replaced on the stream is no
    /// longer forwarding and reports `Detached`.
    pub fn state(&self) -> LifecycleState {
        match self.state {
            LifecycleState::Attached if !self.stream.is_subscribed(&self.subscriber) => {
                LifecycleState::Detached
            }
            state => state,
        }
    }

    /// Current forwarding configuration
    pub fn config(&self) -> ForwardingConfig {
        self.config.snapshot()
    }

    /// Turn automatic forwarding on or off
    pub fn set_auto_notify(&self, auto_notify: bool) {
        self.config.set_auto_notify(auto_notify);
        self.notifier.set_auto_notify(auto_notify);
    }

    /// Change the lowest severity that is forwarded
    pub fn set_notify_level(&self, notify_level: Severity) {
        self.config.set_notify_level(notify_level);
    }

    pub fn set_user_id(&self, user_id: &str) {
        self.notifier.set_user_id(user_id);
    }

    pub fn set_context(&self, context: &str) {
        self.notifier.set_context(context);
    }

    pub fn set_release_stage(&self, release_stage: &str) {
        self.notifier.set_release_stage(release_stage);
    }

    /// Set the context to the level that was just loaded
    pub fn set_level_context(&self, level_name: &str, level_index: usize) {
        self.set_context(&format!("{}: Level {}", level_name, level_index));
    }

    pub fn add_to_tab(&self, tab_name: &str, attribute_name: &str, attribute_value: &str) {
        self.notifier.add_to_tab(tab_name, attribute_name, attribute_value);
    }

    pub fn clear_tab(&self, tab_name: &str) {
        self.notifier.clear_tab(tab_name);
    }

    /// Report an error explicitly
    ///
    /// The error's type name becomes the error class and its display text
    /// the message. The stack trace lists the `source()` chain followed by a
    /// backtrace when one can be captured. Explicit reports skip the
    /// severity gate. `E` must be a concrete error type; unwrap boxed
    /// errors first so the class names the real type.
    pub fn notify_error<E>(&self, error: &E)
    where
        E: std::error::Error + 'static,
    {
        let report = error_report(error, &Backtrace::capture());
        debug!("Reporting error explicitly: {}", report.error_class);
        self.notifier.notify(&report);
    }
}

impl Drop for Reporter {
    fn drop(&mut self) {
        self.detach();
    }
}

fn error_report<E>(error: &E, backtrace: &Backtrace) -> ErrorReport
where
    E: std::error::Error + 'static,
{
    let mut stack_trace = String::new();
    let mut source = error.source();
    while let Some(cause) = source {
        stack_trace.push_str("Caused by: ");
        stack_trace.push_str(&cause.to_string());
        stack_trace.push('\n');
        source = cause.source();
    }
    if backtrace.status() == BacktraceStatus::Captured {
        stack_trace.push_str(&backtrace.to_string());
    }

    ErrorReport {
        error_class: std::any::type_name::<E>().to_string(),
        error_message: Some(error.to_string()),
        stack_trace: stack_trace.trim_end().to_string(),
    }
}
