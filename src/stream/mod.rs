/// Process-wide single-subscriber log stream
pub mod log_stream;

/// `log` facade bridge feeding the log stream
pub mod bridge;

/// Panic hook feeding the log stream
pub mod panic_hook;

pub use bridge::LogBridge;
pub use log_stream::{LogStream, LogSubscriber};
pub use panic_hook::install_panic_hook;
