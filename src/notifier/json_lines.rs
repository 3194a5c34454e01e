use super::Notifier;
use crate::events::{ErrorReport, Timestamp};
use chrono::Utc;
use log::{debug, error, info};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// Default cap on the stack trace length written per report
const DEFAULT_MAX_STACK_TRACE_LEN: usize = 16 * 1024;

/// Registration and metadata state accumulated from setter calls
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct NotifierState {
    pub api_key: Option<String>,
    pub secure_transport: bool,
    pub auto_notify: bool,
    pub user_id: Option<String>,
    pub context: Option<String>,
    pub release_stage: Option<String>,
    pub tabs: BTreeMap<String, BTreeMap<String, String>>,
}

/// One line of output
#[derive(Debug, Serialize)]
struct ReportRecord<'a> {
    timestamp: Timestamp,
    #[serde(flatten)]
    report: &'a ErrorReport,
    #[serde(flatten)]
    state: &'a NotifierState,
}

/// Notifier that writes every report as a JSON object on its own line
///
/// Stands in for a native SDK binding on targets where reports are collected
/// from a stream (stdout, a file, a pipe into an uploader). Setter calls are
/// folded into the state that accompanies each report. Write failures are
/// logged and dropped, matching the fire-and-forget notifier contract.
pub struct JsonLinesNotifier<W: Write + Send> {
    writer: Mutex<W>,
    state: Mutex<NotifierState>,
    max_stack_trace_len: usize,
    reports_written: AtomicUsize,
}

impl<W: Write + Send> JsonLinesNotifier<W> {
    /// Create a notifier writing to `writer` with the default stack trace cap
    pub fn new(writer: W) -> Self {
        Self::with_max_stack_trace_len(writer, DEFAULT_MAX_STACK_TRACE_LEN)
    }

    /// Create a notifier with a configurable stack trace cap
    ///
    /// # Arguments
    ///
    /// * `writer` - Destination for the JSON lines
    /// * `max_stack_trace_len` - Maximum number of bytes of stack trace per report
    pub fn with_max_stack_trace_len(writer: W, max_stack_trace_len: usize) -> Self {
        Self {
            writer: Mutex::new(writer),
            state: Mutex::new(NotifierState {
                secure_transport: true,
                auto_notify: true,
                ..NotifierState::default()
            }),
            max_stack_trace_len,
            reports_written: AtomicUsize::new(0),
        }
    }

    /// Snapshot of the accumulated registration and metadata state
    pub fn state(&self) -> NotifierState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of reports successfully written so far
    pub fn reports_written(&self) -> usize {
        self.reports_written.load(Ordering::Relaxed)
    }

    /// Consume the notifier and return its writer
    pub fn into_writer(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn update_state(&self, apply: impl FnOnce(&mut NotifierState)) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        apply(&mut state);
    }

    /// Truncate text to a maximum byte length on a UTF-8 character boundary
    fn truncate_text(text: &str, max_length: usize) -> String {
        if text.len() <= max_length {
            return text.to_string();
        }

        if max_length < 3 {
            let mut end = max_length;
            while end > 0 && !text.is_char_boundary(end) {
                end -= 1;
            }
            return text[..end].to_string();
        }

        let mut truncate_at = max_length - 3;
        while truncate_at > 0 && !text.is_char_boundary(truncate_at) {
            truncate_at -= 1;
        }

        format!("{}...", &text[..truncate_at])
    }

    fn write_line(&self, line: &str) -> std::io::Result<()> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()
    }
}

impl<W: Write + Send> Notifier for JsonLinesNotifier<W> {
    fn register(&self, api_key: &str) {
        info!("Registering notifier");
        let api_key = (!api_key.is_empty()).then(|| api_key.to_string());
        self.update_state(|state| state.api_key = api_key);
    }

    fn set_use_secure_transport(&self, secure: bool) {
        self.update_state(|state| state.secure_transport = secure);
    }

    fn set_auto_notify(&self, auto_notify: bool) {
        self.update_state(|state| state.auto_notify = auto_notify);
    }

    fn set_user_id(&self, user_id: &str) {
        self.update_state(|state| state.user_id = Some(user_id.to_string()));
    }

    fn set_context(&self, context: &str) {
        self.update_state(|state| state.context = Some(context.to_string()));
    }

    fn set_release_stage(&self, release_stage: &str) {
        self.update_state(|state| state.release_stage = Some(release_stage.to_string()));
    }

    fn notify(&self, report: &ErrorReport) {
        let state = self.state();
        let report = ErrorReport {
            stack_trace: Self::truncate_text(&report.stack_trace, self.max_stack_trace_len),
            ..report.clone()
        };
        let record = ReportRecord {
            timestamp: Utc::now(),
            report: &report,
            state: &state,
        };

        let line = match serde_json::to_string(&record) {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to serialize report {}: {}", report.error_class, e);
                return;
            }
        };

        match self.write_line(&line) {
            Ok(()) => {
                self.reports_written.fetch_add(1, Ordering::Relaxed);
                debug!("Wrote report: {}", report.error_class);
            }
            Err(e) => error!("Failed to write report {}: {}", report.error_class, e),
        }
    }

    fn add_to_tab(&self, tab_name: &str, attribute_name: &str, attribute_value: &str) {
        self.update_state(|state| {
            state
                .tabs
                .entry(tab_name.to_string())
                .or_default()
                .insert(attribute_name.to_string(), attribute_value.to_string());
        });
    }

    fn clear_tab(&self, tab_name: &str) {
        self.update_state(|state| {
            state.tabs.remove(tab_name);
        });
    }
}
