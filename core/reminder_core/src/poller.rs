use std::sync::Arc;

use chrono::{Local, NaiveDateTime, Timelike};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info};

use crate::schedule::{is_reminder_due, minute_slot, ScheduleError};
use crate::settings::Settings;
use crate::state::ReminderState;

// Wake slightly after the boundary so the new minute is already current.
const BOUNDARY_SLACK_MS: u64 = 500;

pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> NaiveDateTime;
}

/// Wall-clock local time.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Settings and reminder state shared by the poller and the dispatcher.
#[derive(Debug)]
pub struct Shared {
    pub settings: Settings,
    pub reminder: ReminderState,
}

pub type SharedState = Arc<Mutex<Shared>>;

pub fn shared_state(settings: Settings) -> SharedState {
    Arc::new(Mutex::new(Shared {
        settings,
        reminder: ReminderState::new(),
    }))
}

/// Sent from the poller to the foreground dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReminderRequest {
    pub slot: NaiveDateTime,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Idle,
    Suppressed,
    Fire { slot: NaiveDateTime },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cadence {
    /// Wake just after every wall-clock minute boundary.
    MinuteBoundary,
    Every(Duration),
}

impl Cadence {
    pub fn delay_from(self, now: NaiveDateTime) -> Duration {
        match self {
            Cadence::Every(d) => d,
            Cadence::MinuteBoundary => {
                // Leap seconds show up as nanos >= 1e9; treat them as the last ms.
                let into_minute_ms = (u64::from(now.second()) * 1000
                    + u64::from(now.nanosecond() / 1_000_000))
                .min(59_999);
                Duration::from_millis(60_000 - into_minute_ms + BOUNDARY_SLACK_MS)
            }
        }
    }
}

/// One poll step. The caller holds the lock for its duration.
pub fn evaluate_tick(
    settings: &Settings,
    reminder: &mut ReminderState,
    now: NaiveDateTime,
) -> Result<TickOutcome, ScheduleError> {
    if reminder.advance(now) {
        info!("snooze over at {now}; reminders active again");
    }
    if !reminder.can_fire() {
        return Ok(TickOutcome::Suppressed);
    }
    if is_reminder_due(now, settings)? {
        reminder.mark_fired(now);
        return Ok(TickOutcome::Fire {
            slot: minute_slot(now),
        });
    }
    Ok(TickOutcome::Idle)
}

pub async fn run_poller<C: Clock>(
    state: SharedState,
    clock: Arc<C>,
    cadence: Cadence,
    requests: mpsc::Sender<ReminderRequest>,
    mut shutdown: watch::Receiver<bool>,
) {
    info!("poller started ({cadence:?})");
    loop {
        if *shutdown.borrow() {
            break;
        }

        let now = clock.now();
        let outcome = {
            let mut guard = state.lock().await;
            let Shared { settings, reminder } = &mut *guard;
            evaluate_tick(settings, reminder, now)
        };
        match outcome {
            Ok(TickOutcome::Fire { slot }) => {
                info!("reminder due at {slot}");
                if requests.send(ReminderRequest { slot }).await.is_err() {
                    debug!("dispatcher gone; poller exiting");
                    break;
                }
            }
            Ok(TickOutcome::Suppressed) => debug!("tick at {now}: suppressed"),
            Ok(TickOutcome::Idle) => {}
            Err(err) => error!("tick at {now} skipped: {err}"),
        }

        let delay = cadence.delay_from(clock.now());
        tokio::select! {
            _ = sleep(delay) => {}
            _ = shutdown.changed() => break,
        }
    }
    info!("poller stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Phase, ReminderAnswer};
    use chrono::NaiveDate;
    use std::sync::Mutex as StdMutex;

    fn monday(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    struct FixedClock(StdMutex<NaiveDateTime>);

    impl Clock for FixedClock {
        fn now(&self) -> NaiveDateTime {
            *self.0.lock().unwrap()
        }
    }

    #[test]
    fn minute_boundary_delay_lands_just_past_the_next_minute() {
        let c = Cadence::MinuteBoundary;
        assert_eq!(c.delay_from(monday(9, 0, 0)), Duration::from_millis(60_500));
        assert_eq!(c.delay_from(monday(9, 0, 59)), Duration::from_millis(1_500));
        let t = monday(9, 0, 30) + chrono::Duration::milliseconds(250);
        assert_eq!(c.delay_from(t), Duration::from_millis(30_250));
        assert_eq!(
            Cadence::Every(Duration::from_secs(5)).delay_from(t),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn boundary_ticks_reach_the_last_minute_of_a_window() {
        let next_tick = |from: NaiveDateTime| {
            from + chrono::Duration::from_std(Cadence::MinuteBoundary.delay_from(from)).unwrap()
        };

        let tick = next_tick(monday(17, 59, 10));
        assert_eq!(tick, monday(18, 0, 0) + chrono::Duration::milliseconds(500));
        let mut st = ReminderState::new();
        assert_eq!(
            evaluate_tick(&Settings::default(), &mut st, tick),
            Ok(TickOutcome::Fire {
                slot: monday(18, 0, 0)
            })
        );

        let half_hourly = Settings {
            reminder_interval: 30,
            ..Settings::default()
        };
        let tick = next_tick(monday(11, 29, 59));
        assert_eq!(tick, monday(11, 30, 0) + chrono::Duration::milliseconds(500));
        let mut st = ReminderState::new();
        assert_eq!(
            evaluate_tick(&half_hourly, &mut st, tick),
            Ok(TickOutcome::Fire {
                slot: monday(11, 30, 0)
            })
        );

        // One minute later the window is closed.
        let tick = next_tick(monday(18, 0, 30));
        let every_minute = Settings {
            reminder_interval: 1,
            ..Settings::default()
        };
        assert_eq!(
            evaluate_tick(&every_minute, &mut ReminderState::new(), tick),
            Ok(TickOutcome::Idle)
        );
    }

    #[test]
    fn fires_once_per_slot() {
        let settings = Settings::default();
        let mut st = ReminderState::new();

        assert_eq!(
            evaluate_tick(&settings, &mut st, monday(9, 0, 0)),
            Ok(TickOutcome::Fire {
                slot: monday(9, 0, 0)
            })
        );
        st.answer(ReminderAnswer::Acknowledged, monday(9, 0, 5), 5);
        assert_eq!(
            evaluate_tick(&settings, &mut st, monday(9, 0, 40)),
            Ok(TickOutcome::Suppressed)
        );
        assert_eq!(
            evaluate_tick(&settings, &mut st, monday(9, 1, 0)),
            Ok(TickOutcome::Idle)
        );
    }

    #[test]
    fn interval_of_one_fires_every_minute() {
        let settings = Settings {
            reminder_interval: 1,
            ..Settings::default()
        };
        let mut st = ReminderState::new();
        for m in 0..3 {
            let now = monday(10, m, 0);
            assert_eq!(
                evaluate_tick(&settings, &mut st, now),
                Ok(TickOutcome::Fire { slot: now })
            );
            st.answer(ReminderAnswer::Acknowledged, now, 5);
        }
    }

    #[test]
    fn snooze_blocks_due_reminders_until_it_expires() {
        let settings = Settings {
            reminder_interval: 1,
            ..Settings::default()
        };
        let mut st = ReminderState::new();
        assert!(matches!(
            evaluate_tick(&settings, &mut st, monday(9, 0, 0)),
            Ok(TickOutcome::Fire { .. })
        ));
        st.answer(ReminderAnswer::Snoozed, monday(9, 0, 0), 5);

        for m in 1..5 {
            assert_eq!(
                evaluate_tick(&settings, &mut st, monday(9, m, 0)),
                Ok(TickOutcome::Suppressed)
            );
        }
        assert_eq!(
            evaluate_tick(&settings, &mut st, monday(9, 5, 0)),
            Ok(TickOutcome::Fire {
                slot: monday(9, 5, 0)
            })
        );
    }

    #[test]
    fn snooze_expiry_outside_window_leaves_state_active() {
        let settings = Settings::default();
        let mut st = ReminderState::new();
        st.snooze(monday(11, 28, 0), 5);
        assert_eq!(
            evaluate_tick(&settings, &mut st, monday(11, 33, 0)),
            Ok(TickOutcome::Idle)
        );
        assert_eq!(st.phase(), Phase::Active);
    }

    #[test]
    fn malformed_settings_surface_as_errors() {
        let settings = Settings {
            morning_start: "half past eight".to_string(),
            ..Settings::default()
        };
        let mut st = ReminderState::new();
        assert!(evaluate_tick(&settings, &mut st, monday(9, 0, 0)).is_err());
        assert_eq!(st.phase(), Phase::Active);
        assert!(!st.is_showing());
    }

    #[tokio::test]
    async fn run_poller_sends_one_request_per_slot_and_stops_on_shutdown() {
        let state = shared_state(Settings::default());
        let clock = Arc::new(FixedClock(StdMutex::new(monday(9, 0, 0))));
        let (tx, mut rx) = mpsc::channel(8);
        let (stop_tx, stop_rx) = watch::channel(false);

        let handle = tokio::spawn(run_poller(
            state.clone(),
            clock.clone(),
            Cadence::Every(Duration::from_millis(5)),
            tx,
            stop_rx,
        ));

        let first = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap();
        assert_eq!(
            first,
            Some(ReminderRequest {
                slot: monday(9, 0, 0)
            })
        );

        // Still showing, and still inside the same slot: nothing else arrives.
        sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());

        stop_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
