use crate::events::{LogKind, Severity};

/// Map a platform log kind to its forwarding severity
///
/// Unrecognized kinds map to `Severity::Exception` so that nothing we cannot
/// classify is silently dropped by the threshold check.
pub fn map_severity(kind: LogKind) -> Severity {
    match kind {
        LogKind::Log => Severity::Log,
        LogKind::Warning => Severity::Warning,
        LogKind::Assert => Severity::Assert,
        LogKind::Error => Severity::Error,
        LogKind::Exception => Severity::Exception,
        LogKind::Unknown => Severity::Exception,
    }
}
