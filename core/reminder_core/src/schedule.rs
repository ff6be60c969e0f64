use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, Timelike};
use thiserror::Error;

use crate::settings::{Settings, SettingsError, TimeField};

/// How far [`next_due_after`] looks ahead by default.
pub const LOOKAHEAD_DAYS: i64 = 7;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("reminder_interval must be at least 1 minute")]
    ZeroInterval,
}

/// Time windows parsed out of [`Settings`], checked once per evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Windows {
    pub morning: (NaiveTime, NaiveTime),
    pub afternoon: (NaiveTime, NaiveTime),
}

impl Windows {
    pub fn from_settings(settings: &Settings) -> Result<Self, ScheduleError> {
        Ok(Self {
            morning: (
                settings.time_of(TimeField::MorningStart)?,
                settings.time_of(TimeField::MorningEnd)?,
            ),
            afternoon: (
                settings.time_of(TimeField::AfternoonStart)?,
                settings.time_of(TimeField::AfternoonEnd)?,
            ),
        })
    }

    /// Inclusive on both ends. An inverted window never matches.
    pub fn contains(&self, t: NaiveTime) -> bool {
        let (ms, me) = self.morning;
        let (as_, ae) = self.afternoon;
        (ms <= t && t <= me) || (as_ <= t && t <= ae)
    }
}

/// 1 = Monday .. 7 = Sunday.
pub fn weekday_number(now: NaiveDateTime) -> u8 {
    now.weekday().number_from_monday() as u8
}

/// Alignment is measured within the hour, so intervals above 60 only line up
/// at minute 0.
pub fn is_aligned(now: NaiveDateTime, interval_minutes: u32) -> Result<bool, ScheduleError> {
    if interval_minutes == 0 {
        return Err(ScheduleError::ZeroInterval);
    }
    Ok(now.minute() % interval_minutes == 0)
}

/// Evaluated at minute granularity: `now` is truncated to its minute before
/// the window check, so a tick a few hundred milliseconds past `11:30` still
/// counts as `11:30`.
pub fn is_reminder_due(now: NaiveDateTime, settings: &Settings) -> Result<bool, ScheduleError> {
    // Parse first so corrupt boundaries surface even on non-reminder days.
    let windows = Windows::from_settings(settings)?;
    let aligned = is_aligned(now, settings.reminder_interval)?;

    if !settings.is_reminder_day(weekday_number(now)) {
        return Ok(false);
    }
    Ok(aligned && windows.contains(minute_slot(now).time()))
}

/// Truncates to the start of the minute; used as the identity of a firing slot.
pub fn minute_slot(now: NaiveDateTime) -> NaiveDateTime {
    now.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now)
}

/// Next minute strictly after `now` at which a reminder would be due, within
/// `horizon_days`.
pub fn next_due_after(
    now: NaiveDateTime,
    settings: &Settings,
    horizon_days: i64,
) -> Result<Option<NaiveDateTime>, ScheduleError> {
    let windows = Windows::from_settings(settings)?;
    let interval = settings.reminder_interval;
    if interval == 0 {
        return Err(ScheduleError::ZeroInterval);
    }
    if settings.days.is_empty() {
        return Ok(None);
    }

    let end = now + Duration::days(horizon_days.max(0));
    let mut t = minute_slot(now) + Duration::minutes(1);
    while t <= end {
        if !settings.is_reminder_day(weekday_number(t)) {
            // Skip the rest of the day in one step.
            match t.date().succ_opt().and_then(|d| d.and_hms_opt(0, 0, 0)) {
                Some(next) => t = next,
                None => break,
            }
            continue;
        }
        if t.minute() % interval == 0 && windows.contains(t.time()) {
            return Ok(Some(t));
        }
        t += Duration::minutes(1);
    }
    Ok(None)
}
