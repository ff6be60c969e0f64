use reminder_core::{Presenter, ReminderResponse, Settings, SettingsFormResult};
use rfd::{MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};
use tracing::debug;

use crate::form;

const TITLE: &str = "Health reminder";
const MESSAGE: &str = "Time to get up and move a little. Have a glass of water.";

const ACK_LABEL: &str = "Got it";
const SNOOZE_LABEL: &str = "Remind me later";
const SETTINGS_LABEL: &str = "Settings";

/// Native message box for reminders; the settings form runs in the terminal.
#[derive(Clone, Copy, Debug, Default)]
pub struct DesktopPresenter;

impl DesktopPresenter {
    pub fn new() -> Self {
        Self
    }
}

impl Presenter for DesktopPresenter {
    fn show_reminder(&self) -> ReminderResponse {
        let result = MessageDialog::new()
            .set_level(MessageLevel::Info)
            .set_title(TITLE)
            .set_description(MESSAGE)
            .set_buttons(MessageButtons::YesNoCancelCustom(
                ACK_LABEL.to_string(),
                SNOOZE_LABEL.to_string(),
                SETTINGS_LABEL.to_string(),
            ))
            .show();
        debug!("reminder dialog returned {result:?}");
        response_for(result)
    }

    fn show_settings_form(&self, current: &Settings, first_run: bool) -> SettingsFormResult {
        form::run(current, first_run)
    }

    fn confirm_exit(&self) -> bool {
        form::confirm_exit()
    }
}

/// Only the custom labels carry a choice. Anything else, including closing
/// the window, counts as an acknowledgement.
fn response_for(result: MessageDialogResult) -> ReminderResponse {
    match result {
        MessageDialogResult::Custom(label) if label == SNOOZE_LABEL => ReminderResponse::Snoozed,
        MessageDialogResult::Custom(label) if label == SETTINGS_LABEL => {
            ReminderResponse::OpenSettings
        }
        _ => ReminderResponse::Acknowledged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialog_results_map_to_responses() {
        assert_eq!(
            response_for(MessageDialogResult::Custom(SNOOZE_LABEL.to_string())),
            ReminderResponse::Snoozed
        );
        assert_eq!(
            response_for(MessageDialogResult::Custom(SETTINGS_LABEL.to_string())),
            ReminderResponse::OpenSettings
        );
        assert_eq!(
            response_for(MessageDialogResult::Custom(ACK_LABEL.to_string())),
            ReminderResponse::Acknowledged
        );
        assert_eq!(
            response_for(MessageDialogResult::Cancel),
            ReminderResponse::Acknowledged
        );
        assert_eq!(
            response_for(MessageDialogResult::No),
            ReminderResponse::Acknowledged
        );
    }
}
