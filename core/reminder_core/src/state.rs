use chrono::{Duration, NaiveDateTime};

use crate::schedule::minute_slot;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Active,
    /// A reminder fired in this minute slot; no second one until the slot passes.
    Fired { slot: NaiveDateTime },
    Snoozed { until: NaiveDateTime },
}

/// What the user answered on a reminder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReminderAnswer {
    Acknowledged,
    Snoozed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReminderState {
    phase: Phase,
    showing: bool,
}

impl Default for ReminderState {
    fn default() -> Self {
        Self {
            phase: Phase::Active,
            showing: false,
        }
    }
}

impl ReminderState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_showing(&self) -> bool {
        self.showing
    }

    pub fn snoozed_until(&self) -> Option<NaiveDateTime> {
        match self.phase {
            Phase::Snoozed { until } => Some(until),
            _ => None,
        }
    }

    /// Time-driven transitions, run at the start of every tick. Returns true if
    /// a snooze just expired.
    pub fn advance(&mut self, now: NaiveDateTime) -> bool {
        match self.phase {
            Phase::Snoozed { until } if now >= until => {
                self.phase = Phase::Active;
                true
            }
            Phase::Fired { slot } if minute_slot(now) != slot => {
                self.phase = Phase::Active;
                false
            }
            _ => false,
        }
    }

    /// Whether the schedule should be consulted at all on this tick.
    pub fn can_fire(&self) -> bool {
        self.phase == Phase::Active && !self.showing
    }

    pub fn mark_fired(&mut self, now: NaiveDateTime) {
        self.phase = Phase::Fired {
            slot: minute_slot(now),
        };
        self.showing = true;
    }

    pub fn snooze(&mut self, now: NaiveDateTime, minutes: u32) {
        self.phase = Phase::Snoozed {
            until: now + Duration::minutes(i64::from(minutes)),
        };
    }

    /// Applies the user's answer to the reminder currently on screen.
    /// Acknowledging keeps the fired slot's suppression in place.
    pub fn answer(&mut self, answer: ReminderAnswer, now: NaiveDateTime, snooze_minutes: u32) {
        self.showing = false;
        if answer == ReminderAnswer::Snoozed {
            self.snooze(now, snooze_minutes);
        }
    }
}
