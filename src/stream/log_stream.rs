use crate::events::LogEvent;
use log::debug;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// Receiver of log events from a [`LogStream`]
pub trait LogSubscriber: Send + Sync {
    /// Handle one emitted event
    fn on_log(&self, event: &LogEvent);
}

impl<F> LogSubscriber for F
where
    F: Fn(&LogEvent) + Send + Sync,
{
    fn on_log(&self, event: &LogEvent) {
        self(event)
    }
}

/// Log stream with a single subscriber slot
///
/// Subscribing replaces whatever was subscribed before (last registration
/// wins) and unsubscribing an empty slot is a no-op. Events are delivered
/// synchronously on the emitting thread; the slot lock is released before
/// the subscriber runs, so subscribers may re-enter the stream.
#[derive(Default)]
pub struct LogStream {
    subscriber: Mutex<Option<Arc<dyn LogSubscriber>>>,
}

static GLOBAL_STREAM: OnceLock<Arc<LogStream>> = OnceLock::new();

impl LogStream {
    /// Create an empty stream
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide stream fed by the log bridge and the panic hook
    pub fn global() -> Arc<LogStream> {
        Arc::clone(GLOBAL_STREAM.get_or_init(|| Arc::new(LogStream::new())))
    }

    /// Install `subscriber`, returning the one it replaced
    pub fn subscribe(&self, subscriber: Arc<dyn LogSubscriber>) -> Option<Arc<dyn LogSubscriber>> {
        let previous = self.slot().replace(subscriber);
        if previous.is_some() {
            debug!("Replaced existing log stream subscriber");
        }
        previous
    }

    /// Remove the current subscriber, if any
    pub fn unsubscribe(&self) -> Option<Arc<dyn LogSubscriber>> {
        self.slot().take()
    }

    /// Remove the current subscriber only if it is `subscriber`
    ///
    /// Returns `true` when the slot held `subscriber` and is now empty.
    pub fn unsubscribe_if(&self, subscriber: &Arc<dyn LogSubscriber>) -> bool {
        let mut slot = self.slot();
        match slot.as_ref() {
            Some(current) if same_subscriber(current, subscriber) => {
                *slot = None;
                true
            }
            _ => false,
        }
    }

    /// Whether a subscriber is installed
    pub fn has_subscriber(&self) -> bool {
        self.slot().is_some()
    }

    /// Whether `subscriber` is the one currently installed
    pub fn is_subscribed(&self, subscriber: &Arc<dyn LogSubscriber>) -> bool {
        self.slot()
            .as_ref()
            .is_some_and(|current| same_subscriber(current, subscriber))
    }

    /// Deliver `event` to the current subscriber
    ///
    /// Returns `true` if a subscriber received the event.
    pub fn emit(&self, event: &LogEvent) -> bool {
        let subscriber = self.slot().clone();
        match subscriber {
            Some(subscriber) => {
                subscriber.on_log(event);
                true
            }
            None => false,
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Arc<dyn LogSubscriber>>> {
        self.subscriber.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Compare by data pointer only; vtable pointers are not guaranteed unique
fn same_subscriber(a: &Arc<dyn LogSubscriber>, b: &Arc<dyn LogSubscriber>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::LogKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, Arc<dyn LogSubscriber>) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let subscriber: Arc<dyn LogSubscriber> = Arc::new(move |_: &LogEvent| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        (count, subscriber)
    }

    fn event() -> LogEvent {
        LogEvent::new("hello", "", LogKind::Log)
    }

    #[test]
    fn test_emit_without_subscriber() {
        let stream = LogStream::new();
        assert!(!stream.emit(&event()));
    }

    #[test]
    fn test_subscribe_replaces_previous() {
        let stream = LogStream::new();
        let (first_count, first) = counter();
        let (second_count, second) = counter();

        assert!(stream.subscribe(Arc::clone(&first)).is_none());
        let replaced = stream.subscribe(Arc::clone(&second));
        assert!(replaced.is_some_and(|r| same_subscriber(&r, &first)));

        assert!(stream.emit(&event()));
        assert_eq!(first_count.load(Ordering::SeqCst), 0);
        assert_eq!(second_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_resubscribing_same_subscriber_delivers_once() {
        let stream = LogStream::new();
        let (count, subscriber) = counter();

        stream.subscribe(Arc::clone(&subscriber));
        stream.subscribe(Arc::clone(&subscriber));
        stream.emit(&event());

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let stream = LogStream::new();
        let (_, subscriber) = counter();
        stream.subscribe(subscriber);

        assert!(stream.unsubscribe().is_some());
        assert!(stream.unsubscribe().is_none());
        assert!(!stream.has_subscriber());
    }

    #[test]
    fn test_unsubscribe_if_leaves_other_subscribers() {
        let stream = LogStream::new();
        let (_, first) = counter();
        let (_, second) = counter();
        stream.subscribe(Arc::clone(&second));

        assert!(!stream.unsubscribe_if(&first));
        assert!(stream.is_subscribed(&second));

        assert!(stream.unsubscribe_if(&second));
        assert!(!stream.has_subscriber());
    }

    #[test]
    fn test_subscriber_may_reenter_stream() {
        let stream = Arc::new(LogStream::new());
        let inner = Arc::clone(&stream);
        let subscriber: Arc<dyn LogSubscriber> = Arc::new(move |_: &LogEvent| {
            // Would deadlock if the slot lock were held during delivery
            assert!(inner.has_subscriber());
        });
        stream.subscribe(subscriber);
        assert!(stream.emit(&event()));
    }

    #[test]
    fn test_global_stream_is_shared() {
        assert!(Arc::ptr_eq(&LogStream::global(), &LogStream::global()));
    }
}
