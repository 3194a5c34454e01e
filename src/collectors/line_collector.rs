use crate::error::CollectorError;
use crate::events::{LogEvent, LogKind};
use crate::stream::LogStream;
use log::{debug, info};
use std::io::BufRead;

/// Reads a plain-text log and emits its entries on a [`LogStream`]
///
/// Accepted format, one entry per line:
///
/// ```text
/// [error] NullReferenceException: Object reference not set
///     at Player.Update()
///     at Game.Tick()
/// [log] level loaded
/// free text becomes a log entry
/// ```
///
/// A leading `[kind]` tag sets the entry kind (see [`LogKind::from_name`]);
/// untagged lines are plain log entries. Indented lines extend the stack
/// trace of the entry above them and a blank line ends the current entry.
#[derive(Debug, Default)]
pub struct LineCollector {
    pending: Option<LogEvent>,
    emitted: usize,
}

impl LineCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `reader` to the end, emitting every entry on `stream`
    ///
    /// # Returns
    ///
    /// The number of entries emitted
    ///
    /// # Errors
    ///
    /// Returns `CollectorError::IoError` if reading fails. Entries completed
    /// before the failure have already been emitted.
    pub fn collect<R: BufRead>(reader: R, stream: &LogStream) -> Result<usize, CollectorError> {
        let mut collector = Self::new();
        for line in reader.lines() {
            collector.push_line(&line?, stream);
        }
        collector.finish(stream);
        info!("Collected {} log entries", collector.emitted);
        Ok(collector.emitted)
    }

    /// Feed one line, emitting the previous entry when a new one starts
    pub fn push_line(&mut self, line: &str, stream: &LogStream) {
        let line = line.trim_end_matches('\r');

        if line.trim().is_empty() {
            self.flush(stream);
            return;
        }

        if line.starts_with(char::is_whitespace) {
            if let Some(event) = self.pending.as_mut() {
                if !event.stack_trace.is_empty() {
                    event.stack_trace.push('\n');
                }
                event.stack_trace.push_str(line.trim());
                return;
            }
        }

        self.flush(stream);
        self.pending = Some(Self::parse_entry(line.trim_start()));
    }

    /// Emit the entry still being assembled, if any
    pub fn finish(&mut self, stream: &LogStream) {
        self.flush(stream);
    }

    /// Number of entries emitted so far
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    fn flush(&mut self, stream: &LogStream) {
        if let Some(event) = self.pending.take() {
            if !stream.emit(&event) {
                debug!("No subscriber for log entry: {}", event.message);
            }
            self.emitted += 1;
        }
    }

    /// Split an optional `[kind]` tag off the start of an entry line
    fn parse_entry(line: &str) -> LogEvent {
        if let Some(rest) = line.strip_prefix('[') {
            if let Some((tag, message)) = rest.split_once(']') {
                return LogEvent::new(message.trim(), "", LogKind::from_name(tag));
            }
        }
        LogEvent::new(line, "", LogKind::Log)
    }
}
