//! Interactive settings form on the terminal.

use dialoguer::{Confirm, Input, MultiSelect};
use reminder_core::settings::{
    parse_time_of_day, weekday_label, Settings, TimeField, INTERVAL_MINUTES_MAX,
    INTERVAL_MINUTES_MIN, SNOOZE_MINUTES_MAX, SNOOZE_MINUTES_MIN,
};
use reminder_core::SettingsFormResult;
use tracing::warn;

pub fn run(current: &Settings, first_run: bool) -> SettingsFormResult {
    println!();
    println!("Reminder settings");
    println!("=================");
    if first_run {
        println!("No settings saved yet. Reminders start once you save.");
    }
    println!();

    let mut draft = current.clone();
    loop {
        draft = match prompt(&draft) {
            Ok(d) => d,
            Err(e) => {
                warn!("settings form aborted: {e}");
                return SettingsFormResult::Cancelled;
            }
        };

        if let Err(e) = draft.validate() {
            eprintln!("Error: {e}");
            match Confirm::new()
                .with_prompt("Edit again?")
                .default(true)
                .interact()
            {
                Ok(true) => continue,
                Ok(false) => return SettingsFormResult::Cancelled,
                Err(e) => {
                    warn!("settings form aborted: {e}");
                    return SettingsFormResult::Cancelled;
                }
            }
        }

        return match Confirm::new()
            .with_prompt("Save these settings?")
            .default(true)
            .interact()
        {
            Ok(true) => {
                println!("Settings saved.");
                SettingsFormResult::Saved(draft)
            }
            Ok(false) => SettingsFormResult::Cancelled,
            Err(e) => {
                warn!("settings form aborted: {e}");
                SettingsFormResult::Cancelled
            }
        };
    }
}

pub fn confirm_exit() -> bool {
    Confirm::new()
        .with_prompt("Settings were not saved. Exit the reminder?")
        .default(false)
        .interact()
        .unwrap_or_else(|e| {
            warn!("cannot ask about exiting ({e}); exiting");
            true
        })
}

fn prompt(current: &Settings) -> dialoguer::Result<Settings> {
    let labels: Vec<&str> = (1..=7).map(weekday_label).collect();
    let picked = MultiSelect::new()
        .with_prompt("Reminder days (space to toggle, enter to confirm)")
        .items(&labels)
        .defaults(&day_defaults(current))
        .interact()?;

    let mut next = Settings {
        days: days_from_selection(&picked),
        ..current.clone()
    };

    for field in TimeField::ALL {
        let value: String = Input::new()
            .with_prompt(time_prompt(field))
            .default(current.time_str(field).to_string())
            .validate_with(|input: &String| validate_time(input))
            .interact_text()?;
        match field {
            TimeField::MorningStart => next.morning_start = value,
            TimeField::MorningEnd => next.morning_end = value,
            TimeField::AfternoonStart => next.afternoon_start = value,
            TimeField::AfternoonEnd => next.afternoon_end = value,
        }
    }

    next.reminder_interval = Input::new()
        .with_prompt(format!(
            "Reminder interval, minutes ({INTERVAL_MINUTES_MIN}-{INTERVAL_MINUTES_MAX})"
        ))
        .default(current.reminder_interval)
        .validate_with(|v: &u32| in_range(*v, INTERVAL_MINUTES_MIN, INTERVAL_MINUTES_MAX))
        .interact_text()?;

    next.snooze_duration = Input::new()
        .with_prompt(format!(
            "Snooze, minutes ({SNOOZE_MINUTES_MIN}-{SNOOZE_MINUTES_MAX})"
        ))
        .default(current.snooze_duration)
        .validate_with(|v: &u32| in_range(*v, SNOOZE_MINUTES_MIN, SNOOZE_MINUTES_MAX))
        .interact_text()?;

    Ok(next)
}

fn time_prompt(field: TimeField) -> &'static str {
    match field {
        TimeField::MorningStart => "Morning start (HH:MM)",
        TimeField::MorningEnd => "Morning end (HH:MM)",
        TimeField::AfternoonStart => "Afternoon start (HH:MM)",
        TimeField::AfternoonEnd => "Afternoon end (HH:MM)",
    }
}

fn day_defaults(current: &Settings) -> Vec<bool> {
    (1..=7u8).map(|d| current.is_reminder_day(d)).collect()
}

fn days_from_selection(picked: &[usize]) -> Vec<u8> {
    let mut days: Vec<u8> = picked.iter().map(|&i| i as u8 + 1).collect();
    days.sort_unstable();
    days
}

fn validate_time(input: &str) -> Result<(), String> {
    match parse_time_of_day(input) {
        Some(_) => Ok(()),
        None => Err(format!("'{input}' is not a time like 08:30")),
    }
}

fn in_range(v: u32, min: u32, max: u32) -> Result<(), String> {
    if (min..=max).contains(&v) {
        Ok(())
    } else {
        Err(format!("must be between {min} and {max}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_selection_maps_to_weekday_numbers() {
        let s = Settings::default();
        assert_eq!(
            day_defaults(&s),
            vec![true, true, true, true, true, false, false]
        );
        assert_eq!(days_from_selection(&[6, 0, 2]), vec![1, 3, 7]);
        assert!(days_from_selection(&[]).is_empty());
    }

    #[test]
    fn field_validators() {
        assert!(validate_time("14:00").is_ok());
        assert!(validate_time("2pm").is_err());
        assert!(in_range(60, 1, 120).is_ok());
        assert!(in_range(0, 1, 120).is_err());
        assert!(in_range(61, 1, 60).is_err());
    }
}
