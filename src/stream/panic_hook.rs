use super::bridge::ForwardingGuard;
use super::LogStream;
use crate::events::{LogEvent, LogKind};
use std::any::Any;
use std::backtrace::Backtrace;
use std::sync::Arc;

/// Report panics on `stream` as exception events
///
/// The previously installed hook still runs afterwards, so the default
/// panic message is printed as usual. A panic raised while an event is
/// being forwarded on the same thread is not reported again.
pub fn install_panic_hook(stream: Arc<LogStream>) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if let Some(_guard) = ForwardingGuard::enter() {
            let location = info
                .location()
                .map(|loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()));
            let backtrace = Backtrace::force_capture().to_string();
            let event = panic_event(info.payload(), location.as_deref(), &backtrace);
            stream.emit(&event);
        }
        previous(info);
    }));
}

/// Text carried by a panic payload
fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "Box<dyn Any>"
    }
}

fn panic_event(payload: &(dyn Any + Send), location: Option<&str>, backtrace: &str) -> LogEvent {
    let mut stack_trace = String::new();
    if let Some(location) = location {
        stack_trace.push_str("at ");
        stack_trace.push_str(location);
        stack_trace.push('\n');
    }
    stack_trace.push_str(backtrace);

    LogEvent::new(
        format!("panic: {}", panic_message(payload)),
        stack_trace.trim_end(),
        LogKind::Exception,
    )
}
