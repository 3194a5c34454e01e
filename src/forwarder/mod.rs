/// Live-read forwarding configuration
pub mod settings;

/// Forwarding decision and dispatch to the notifier
pub mod dispatch;

pub use dispatch::{handle, Forwarder};
pub use settings::{ConfigHandle, ForwardingConfig};
