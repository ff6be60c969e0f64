use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const INTERVAL_MINUTES_MIN: u32 = 1;
pub const INTERVAL_MINUTES_MAX: u32 = 120;
pub const SNOOZE_MINUTES_MIN: u32 = 1;
pub const SNOOZE_MINUTES_MAX: u32 = 60;

const TIME_FORMAT: &str = "%H:%M";

/// Persisted reminder settings. Field names match the on-disk JSON record.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Settings {
    /// Weekday numbers, 1 = Monday .. 7 = Sunday.
    pub days: Vec<u8>,
    pub morning_start: String,
    pub morning_end: String,
    pub afternoon_start: String,
    pub afternoon_end: String,
    /// Minutes between reminders, counted from the top of the hour.
    pub reminder_interval: u32,
    /// Minutes a snoozed reminder stays quiet.
    pub snooze_duration: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            days: vec![1, 2, 3, 4, 5],
            morning_start: "08:30".to_string(),
            morning_end: "11:30".to_string(),
            afternoon_start: "14:00".to_string(),
            afternoon_end: "18:00".to_string(),
            reminder_interval: 60,
            snooze_duration: 5,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeField {
    MorningStart,
    MorningEnd,
    AfternoonStart,
    AfternoonEnd,
}

impl TimeField {
    pub const ALL: [TimeField; 4] = [
        TimeField::MorningStart,
        TimeField::MorningEnd,
        TimeField::AfternoonStart,
        TimeField::AfternoonEnd,
    ];

    pub fn key(self) -> &'static str {
        match self {
            TimeField::MorningStart => "morning_start",
            TimeField::MorningEnd => "morning_end",
            TimeField::AfternoonStart => "afternoon_start",
            TimeField::AfternoonEnd => "afternoon_end",
        }
    }
}

impl std::fmt::Display for TimeField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("{field} is not a valid HH:MM time: '{value}'")]
    InvalidTime { field: TimeField, value: String },
    #[error("{window} window starts at {start} after it ends at {end}")]
    InvertedWindow {
        window: &'static str,
        start: String,
        end: String,
    },
    #[error("weekday {0} is out of range 1-7")]
    InvalidDay(u8),
    #[error("reminder_interval {0} is out of range 1-120")]
    InvalidInterval(u32),
    #[error("snooze_duration {0} is out of range 1-60")]
    InvalidSnooze(u32),
}

/// Parses an `HH:MM` boundary. Seconds are not accepted.
pub fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), TIME_FORMAT).ok()
}

impl Settings {
    pub fn time_str(&self, field: TimeField) -> &str {
        match field {
            TimeField::MorningStart => &self.morning_start,
            TimeField::MorningEnd => &self.morning_end,
            TimeField::AfternoonStart => &self.afternoon_start,
            TimeField::AfternoonEnd => &self.afternoon_end,
        }
    }

    pub fn time_of(&self, field: TimeField) -> Result<NaiveTime, SettingsError> {
        let raw = self.time_str(field);
        parse_time_of_day(raw).ok_or_else(|| SettingsError::InvalidTime {
            field,
            value: raw.to_string(),
        })
    }

    pub fn is_reminder_day(&self, weekday: u8) -> bool {
        self.days.contains(&weekday)
    }

    /// Full check used before accepting settings from the form.
    ///
    /// A window whose start equals its end is accepted (it matches a single
    /// minute). Windows that wrap past midnight are rejected.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if let Some(&bad) = self.days.iter().find(|d| !(1..=7).contains(*d)) {
            return Err(SettingsError::InvalidDay(bad));
        }
        if !(INTERVAL_MINUTES_MIN..=INTERVAL_MINUTES_MAX).contains(&self.reminder_interval) {
            return Err(SettingsError::InvalidInterval(self.reminder_interval));
        }
        if !(SNOOZE_MINUTES_MIN..=SNOOZE_MINUTES_MAX).contains(&self.snooze_duration) {
            return Err(SettingsError::InvalidSnooze(self.snooze_duration));
        }
        for (window, start, end) in [
            ("morning", TimeField::MorningStart, TimeField::MorningEnd),
            ("afternoon", TimeField::AfternoonStart, TimeField::AfternoonEnd),
        ] {
            let s = self.time_of(start)?;
            let e = self.time_of(end)?;
            if s > e {
                return Err(SettingsError::InvertedWindow {
                    window,
                    start: self.time_str(start).to_string(),
                    end: self.time_str(end).to_string(),
                });
            }
        }
        Ok(())
    }

    /// Clamps numeric fields and tidies the day list. Time strings are left
    /// untouched so a corrupt boundary still surfaces during evaluation.
    pub fn normalized(&self) -> Settings {
        let mut days: Vec<u8> = self
            .days
            .iter()
            .copied()
            .filter(|d| (1..=7).contains(d))
            .collect();
        days.sort_unstable();
        days.dedup();

        Settings {
            days,
            morning_start: self.morning_start.clone(),
            morning_end: self.morning_end.clone(),
            afternoon_start: self.afternoon_start.clone(),
            afternoon_end: self.afternoon_end.clone(),
            reminder_interval: self
                .reminder_interval
                .clamp(INTERVAL_MINUTES_MIN, INTERVAL_MINUTES_MAX),
            snooze_duration: self
                .snooze_duration
                .clamp(SNOOZE_MINUTES_MIN, SNOOZE_MINUTES_MAX),
        }
    }
}

pub fn weekday_label(day: u8) -> &'static str {
    match day {
        1 => "Mon",
        2 => "Tue",
        3 => "Wed",
        4 => "Thu",
        5 => "Fri",
        6 => "Sat",
        7 => "Sun",
        _ => "?",
    }
}
