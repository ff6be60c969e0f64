use std::sync::Arc;

use chrono::NaiveDateTime;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use crate::poller::{run_poller, shared_state, Cadence, Clock, ReminderRequest, SharedState};
use crate::presenter::{Presenter, ReminderResponse, SettingsFormResult};
use crate::schedule::{next_due_after, LOOKAHEAD_DAYS};
use crate::settings::{Settings, SettingsError};
use crate::state::ReminderAnswer;
use crate::store::ConfigStore;

const REQUEST_QUEUE: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// Stopped by the shutdown signal.
    Shutdown,
    /// The user left the first-run settings form and chose to exit.
    ExitedDuringSetup,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditOutcome {
    Saved,
    Cancelled,
    Rejected,
    Interrupted,
}

/// Process lifecycle: first-run setup, the poller task and the foreground
/// dispatcher that owns every presenter call.
pub struct App<P: Presenter, C: Clock> {
    store: ConfigStore,
    presenter: Arc<P>,
    clock: Arc<C>,
    cadence: Cadence,
    state: SharedState,
    first_run: bool,
}

impl<P: Presenter, C: Clock> App<P, C> {
    /// First-run is decided before loading, since loading writes defaults.
    pub fn bootstrap(store: ConfigStore, presenter: P, clock: C, cadence: Cadence) -> Self {
        let first_run = !store.exists();
        let loaded = store.load();
        info!(
            "settings loaded from {} ({:?})",
            store.path().display(),
            loaded.source
        );
        Self {
            store,
            presenter: Arc::new(presenter),
            clock: Arc::new(clock),
            cadence,
            state: shared_state(loaded.settings),
            first_run,
        }
    }

    pub fn is_first_run(&self) -> bool {
        self.first_run
    }

    pub fn shared(&self) -> SharedState {
        self.state.clone()
    }

    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<RunOutcome> {
        if self.first_run && !self.first_run_setup(&mut shutdown).await? {
            info!("setup abandoned; not starting reminders");
            return Ok(RunOutcome::ExitedDuringSetup);
        }
        if *shutdown.borrow() {
            return Ok(RunOutcome::Shutdown);
        }

        {
            let guard = self.state.lock().await;
            log_next_due(&guard.settings, self.clock.now());
        }

        let (tx, rx) = mpsc::channel(REQUEST_QUEUE);
        let poller = tokio::spawn(run_poller(
            self.state.clone(),
            self.clock.clone(),
            self.cadence,
            tx,
            shutdown.clone(),
        ));

        self.dispatch(rx, &mut shutdown).await?;
        poller.await?;
        Ok(RunOutcome::Shutdown)
    }

    /// Shows the settings form once, outside the reminder loop. Raising
    /// `shutdown` abandons the form with [`EditOutcome::Interrupted`].
    pub async fn edit_settings_once(
        &self,
        mut shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<EditOutcome> {
        if *shutdown.borrow() {
            return Ok(EditOutcome::Interrupted);
        }
        self.edit_settings(false, &mut shutdown).await
    }

    /// Validates, persists (best-effort) and publishes new settings.
    pub async fn apply_settings(&self, settings: Settings) -> Result<(), SettingsError> {
        settings.validate()?;
        self.store.save_best_effort(&settings);
        let mut guard = self.state.lock().await;
        guard.settings = settings;
        info!("settings updated");
        log_next_due(&guard.settings, self.clock.now());
        Ok(())
    }

    /// Returns false when the user chose to exit instead of saving.
    async fn first_run_setup(&self, shutdown: &mut watch::Receiver<bool>) -> anyhow::Result<bool> {
        info!("first run: asking for settings before starting");
        loop {
            match self.edit_settings(true, shutdown).await? {
                EditOutcome::Saved => return Ok(true),
                EditOutcome::Interrupted => return Ok(false),
                EditOutcome::Rejected => continue,
                EditOutcome::Cancelled => {}
            }
            match self.ask(shutdown, |p| p.confirm_exit()).await? {
                Some(true) | None => return Ok(false),
                Some(false) => continue,
            }
        }
    }

    async fn dispatch(
        &self,
        mut requests: mpsc::Receiver<ReminderRequest>,
        shutdown: &mut watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        loop {
            if *shutdown.borrow() {
                break;
            }
            let request = tokio::select! {
                r = requests.recv() => match r {
                    Some(r) => r,
                    None => break,
                },
                _ = shutdown.changed() => break,
            };
            if !self.show_reminder(request.slot, shutdown).await? {
                break;
            }
        }
        info!("dispatcher stopped");
        Ok(())
    }

    /// Returns false if shutdown interrupted the reminder.
    async fn show_reminder(
        &self,
        slot: NaiveDateTime,
        shutdown: &mut watch::Receiver<bool>,
    ) -> anyhow::Result<bool> {
        let Some(response) = self.ask(shutdown, |p| p.show_reminder()).await? else {
            return Ok(false);
        };
        let now = self.clock.now();
        {
            let mut guard = self.state.lock().await;
            let snooze_minutes = guard.settings.snooze_duration;
            guard.reminder.answer(response.answer(), now, snooze_minutes);
            match response.answer() {
                ReminderAnswer::Snoozed => info!(
                    "reminder for {slot} snoozed until {}",
                    guard
                        .reminder
                        .snoozed_until()
                        .map(|t| t.to_string())
                        .unwrap_or_default()
                ),
                ReminderAnswer::Acknowledged => info!("reminder for {slot} acknowledged"),
            }
        }

        if response == ReminderResponse::OpenSettings
            && self.edit_settings(false, shutdown).await? == EditOutcome::Interrupted
        {
            return Ok(false);
        }
        Ok(true)
    }

    async fn edit_settings(
        &self,
        first_run: bool,
        shutdown: &mut watch::Receiver<bool>,
    ) -> anyhow::Result<EditOutcome> {
        let current = self.state.lock().await.settings.clone();
        let result = self
            .ask(shutdown, move |p| p.show_settings_form(&current, first_run))
            .await?;
        match result {
            None => Ok(EditOutcome::Interrupted),
            Some(SettingsFormResult::Cancelled) => {
                info!("settings form cancelled");
                Ok(EditOutcome::Cancelled)
            }
            Some(SettingsFormResult::Saved(settings)) => match self.apply_settings(settings).await {
                Ok(()) => Ok(EditOutcome::Saved),
                Err(err) => {
                    error!("settings rejected: {err}");
                    Ok(EditOutcome::Rejected)
                }
            },
        }
    }

    /// Runs a blocking presenter call on the blocking pool. `None` means
    /// shutdown was requested before the user answered.
    async fn ask<T, F>(&self, shutdown: &mut watch::Receiver<bool>, f: F) -> anyhow::Result<Option<T>>
    where
        T: Send + 'static,
        F: FnOnce(&P) -> T + Send + 'static,
    {
        let presenter = self.presenter.clone();
        let task = tokio::task::spawn_blocking(move || f(&*presenter));
        tokio::select! {
            joined = task => Ok(Some(joined?)),
            _ = shutdown.changed() => {
                warn!("shutdown while waiting on the user; leaving the dialog behind");
                Ok(None)
            }
        }
    }
}

fn log_next_due(settings: &Settings, now: NaiveDateTime) {
    match next_due_after(now, settings, LOOKAHEAD_DAYS) {
        Ok(Some(t)) => info!("next reminder at {t}"),
        Ok(None) => info!("no reminder due in the next {LOOKAHEAD_DAYS} days"),
        Err(err) => error!("cannot compute next reminder: {err}"),
    }
}
