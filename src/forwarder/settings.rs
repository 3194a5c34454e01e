use crate::events::Severity;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};

/// Settings consulted for every forwarded event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ForwardingConfig {
    /// API key registered with the reporting backend
    pub api_key: String,
    /// Whether qualifying log events are forwarded at all
    pub auto_notify: bool,
    /// Lowest severity that is forwarded
    pub notify_level: Severity,
    /// Whether the backend should use a secure transport
    #[serde(alias = "use_ssl")]
    pub use_secure_transport: bool,
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            auto_notify: true,
            notify_level: Severity::Exception,
            use_secure_transport: true,
        }
    }
}

impl ForwardingConfig {
    /// Whether an event of `severity` passes the forwarding gate
    pub fn should_forward(&self, severity: Severity) -> bool {
        self.auto_notify && severity >= self.notify_level
    }
}

/// Shared handle to a [`ForwardingConfig`] that may change while events flow
///
/// Readers take a whole snapshot under the lock, so one forwarding decision
/// never mixes fields from two updates. A poisoned lock still yields the
/// last written value.
#[derive(Debug, Clone, Default)]
pub struct ConfigHandle {
    inner: Arc<RwLock<ForwardingConfig>>,
}

impl ConfigHandle {
    pub fn new(config: ForwardingConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Copy of the current configuration
    pub fn snapshot(&self) -> ForwardingConfig {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Apply `change` to the configuration under the write lock
    pub fn update(&self, change: impl FnOnce(&mut ForwardingConfig)) {
        let mut config = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        change(&mut config);
    }

    /// Replace the whole configuration
    pub fn replace(&self, config: ForwardingConfig) {
        self.update(|current| *current = config);
    }

    pub fn set_auto_notify(&self, auto_notify: bool) {
        self.update(|config| config.auto_notify = auto_notify);
    }

    pub fn set_notify_level(&self, notify_level: Severity) {
        self.update(|config| config.notify_level = notify_level);
    }
}
