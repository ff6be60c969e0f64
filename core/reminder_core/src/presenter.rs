use crate::settings::Settings;
use crate::state::ReminderAnswer;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReminderResponse {
    Acknowledged,
    Snoozed,
    /// Dismiss the reminder and open the settings form.
    OpenSettings,
}

impl ReminderResponse {
    pub fn answer(self) -> ReminderAnswer {
        match self {
            ReminderResponse::Snoozed => ReminderAnswer::Snoozed,
            ReminderResponse::Acknowledged | ReminderResponse::OpenSettings => {
                ReminderAnswer::Acknowledged
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SettingsFormResult {
    Saved(Settings),
    Cancelled,
}

/// The UI side of the app. Every call blocks until the user answers, so the
/// dispatcher runs them off the async workers.
pub trait Presenter: Send + Sync + 'static {
    fn show_reminder(&self) -> ReminderResponse;

    /// `first_run` is set when no settings file existed at startup.
    fn show_settings_form(&self, current: &Settings, first_run: bool) -> SettingsFormResult;

    /// Asked when the first-run form is cancelled. `true` exits the process.
    fn confirm_exit(&self) -> bool;
}
