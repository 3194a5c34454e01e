use super::Notifier;
use crate::events::ErrorReport;

/// Notifier for targets without a reporting backend
///
/// Accepts every call and does nothing with it.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn register(&self, _api_key: &str) {}

    fn set_use_secure_transport(&self, _secure: bool) {}

    fn set_auto_notify(&self, _auto_notify: bool) {}

    fn set_user_id(&self, _user_id: &str) {}

    fn set_context(&self, _context: &str) {}

    fn set_release_stage(&self, _release_stage: &str) {}

    fn notify(&self, _report: &ErrorReport) {}

    fn add_to_tab(&self, _tab_name: &str, _attribute_name: &str, _attribute_value: &str) {}

    fn clear_tab(&self, _tab_name: &str) {}
}
