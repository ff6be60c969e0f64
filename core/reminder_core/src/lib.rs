//! Core of the health reminder: settings, their JSON store, the schedule
//! evaluator, the snooze state machine and the minute poller.
//!
//! UI toolkits stay outside this crate behind [`presenter::Presenter`].

pub mod app;
pub mod poller;
pub mod presenter;
pub mod schedule;
pub mod settings;
pub mod state;
pub mod store;

pub use app::{App, EditOutcome, RunOutcome};
pub use poller::{Cadence, Clock, LocalClock};
pub use presenter::{Presenter, ReminderResponse, SettingsFormResult};
pub use settings::Settings;
pub use store::ConfigStore;
