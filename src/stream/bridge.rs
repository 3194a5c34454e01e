use super::LogStream;
use crate::events::{LogEvent, LogKind};
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::cell::Cell;
use std::sync::Arc;

/// Records from this crate root or its modules are never forwarded
const OWN_TARGET: &str = env!("CARGO_CRATE_NAME");

thread_local! {
    static FORWARDING: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as forwarding into a stream until dropped
pub(crate) struct ForwardingGuard;

impl ForwardingGuard {
    /// `None` when the thread is already forwarding
    pub(crate) fn enter() -> Option<Self> {
        FORWARDING.with(|flag| {
            if flag.get() {
                None
            } else {
                flag.set(true);
                Some(ForwardingGuard)
            }
        })
    }
}

impl Drop for ForwardingGuard {
    fn drop(&mut self) {
        FORWARDING.with(|flag| flag.set(false));
    }
}

/// `log` facade backend that feeds a [`LogStream`]
///
/// Every record at or above the forward level becomes a [`LogEvent`] on the
/// stream and is then handed to the optional inner logger for normal
/// output. Records logged by this crate, and records logged while a forward
/// is already running on the same thread, go to the inner logger only, so a
/// notifier that logs cannot feed itself.
pub struct LogBridge {
    stream: Arc<LogStream>,
    inner: Option<Box<dyn Log>>,
    forward_level: LevelFilter,
}

impl LogBridge {
    /// Create a bridge forwarding every level to `stream`
    pub fn new(stream: Arc<LogStream>) -> Self {
        Self {
            stream,
            inner: None,
            forward_level: LevelFilter::Trace,
        }
    }

    /// Pass records on to `inner` after forwarding them
    pub fn with_inner(mut self, inner: Box<dyn Log>) -> Self {
        self.inner = Some(inner);
        self
    }

    /// Only forward records at or above `level`
    pub fn with_forward_level(mut self, level: LevelFilter) -> Self {
        self.forward_level = level;
        self
    }

    /// Install the bridge as the global `log` backend
    ///
    /// The global max level is the more verbose of the forward level and
    /// `inner_filter`, the level the inner logger was built with.
    pub fn install(self, inner_filter: LevelFilter) -> Result<(), SetLoggerError> {
        let max_level = self.forward_level.max(inner_filter);
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(max_level);
        Ok(())
    }

    fn should_forward(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.forward_level && !is_own_target(metadata.target())
    }
}

fn is_own_target(target: &str) -> bool {
    target
        .strip_prefix(OWN_TARGET)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

impl Log for LogBridge {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.should_forward(metadata)
            || self
                .inner
                .as_ref()
                .is_some_and(|inner| inner.enabled(metadata))
    }

    fn log(&self, record: &Record) {
        if self.should_forward(record.metadata()) {
            if let Some(_guard) = ForwardingGuard::enter() {
                let event = LogEvent::new(record.args().to_string(), "", LogKind::from(record.level()));
                self.stream.emit(&event);
            }
        }

        if let Some(inner) = &self.inner {
            if inner.enabled(record.metadata()) {
                inner.log(record);
            }
        }
    }

    fn flush(&self) {
        if let Some(inner) = &self.inner {
            inner.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::LogSubscriber;
    use log::Level;
    use std::sync::Mutex;

    fn recording_stream() -> (Arc<LogStream>, Arc<Mutex<Vec<LogEvent>>>) {
        let stream = Arc::new(LogStream::new());
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let subscriber: Arc<dyn LogSubscriber> = Arc::new(move |event: &LogEvent| {
            sink.lock().unwrap().push(event.clone());
        });
        stream.subscribe(subscriber);
        (stream, events)
    }

    fn log_at(bridge: &LogBridge, level: Level, target: &str, message: &str) {
        bridge.log(
            &Record::builder()
                .level(level)
                .target(target)
                .args(format_args!("{}", message))
                .build(),
        );
    }

    #[test]
    fn test_records_become_events() {
        let (stream, events) = recording_stream();
        let bridge = LogBridge::new(stream);

        log_at(&bridge, Level::Error, "game::net", "SocketError: reset by peer");
        log_at(&bridge, Level::Info, "game::ui", "menu opened");

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, LogKind::Error);
        assert_eq!(events[0].message, "SocketError: reset by peer");
        assert!(events[0].stack_trace.is_empty());
        assert_eq!(events[1].kind, LogKind::Log);
    }

    #[test]
    fn test_forward_level_filters_records() {
        let (stream, events) = recording_stream();
        let bridge = LogBridge::new(stream).with_forward_level(LevelFilter::Warn);

        log_at(&bridge, Level::Debug, "game", "noise");
        log_at(&bridge, Level::Warn, "game", "low memory");

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, LogKind::Warning);
    }

    #[test]
    fn test_own_records_are_not_forwarded() {
        let (stream, events) = recording_stream();
        let bridge = LogBridge::new(stream);

        log_at(&bridge, Level::Error, "crash_relay::notifier", "write failed");

        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_similar_targets_are_forwarded() {
        let (stream, events) = recording_stream();
        let bridge = LogBridge::new(stream);

        log_at(&bridge, Level::Error, "crash_relay", "root");
        log_at(&bridge, Level::Error, "crash_relay_ext::upload", "Timeout: 30s");
        log_at(&bridge, Level::Error, "crash_relayer", "other crate");

        let events = events.lock().unwrap();
        let messages: Vec<&str> = events.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["Timeout: 30s", "other crate"]);
    }

    #[test]
    fn test_reentrant_records_are_not_forwarded() {
        let stream = Arc::new(LogStream::new());
        let bridge = Arc::new(LogBridge::new(Arc::clone(&stream)));
        let count = Arc::new(Mutex::new(0));

        let inner_bridge = Arc::clone(&bridge);
        let seen = Arc::clone(&count);
        let subscriber: Arc<dyn LogSubscriber> = Arc::new(move |_: &LogEvent| {
            *seen.lock().unwrap() += 1;
            log_at(&inner_bridge, Level::Error, "sdk", "upload failed");
        });
        stream.subscribe(subscriber);

        log_at(&bridge, Level::Error, "game", "Boom: bad");
        assert_eq!(*count.lock().unwrap(), 1);

        // The guard is released once the outer forward completes
        log_at(&bridge, Level::Error, "game", "Boom: again");
        assert_eq!(*count.lock().unwrap(), 2);

        // Break the bridge -> stream -> subscriber -> bridge cycle
        stream.unsubscribe();
    }

    struct CountingLogger {
        count: Mutex<usize>,
    }

    impl Log for CountingLogger {
        fn enabled(&self, metadata: &Metadata) -> bool {
            metadata.level() <= Level::Warn
        }

        fn log(&self, _record: &Record) {
            *self.count.lock().unwrap() += 1;
        }

        fn flush(&self) {}
    }

    #[test]
    fn test_inner_logger_sees_enabled_records() {
        let (stream, _events) = recording_stream();
        let inner = Arc::new(CountingLogger {
            count: Mutex::new(0),
        });

        struct Shared(Arc<CountingLogger>);
        impl Log for Shared {
            fn enabled(&self, metadata: &Metadata) -> bool {
                self.0.enabled(metadata)
            }
            fn log(&self, record: &Record) {
                self.0.log(record)
            }
            fn flush(&self) {}
        }

        let bridge = LogBridge::new(stream).with_inner(Box::new(Shared(Arc::clone(&inner))));
        log_at(&bridge, Level::Info, "game", "quiet");
        log_at(&bridge, Level::Error, "crash_relay", "loud");

        assert_eq!(*inner.count.lock().unwrap(), 1);
        assert!(bridge.enabled(&Metadata::builder().level(Level::Info).target("game").build()));
    }
}
