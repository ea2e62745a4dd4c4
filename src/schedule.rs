use crate::date::DayIndex;
use crate::error::HabitError;
use crate::model::ActiveDays;

const WEEKDAYS: [bool; 7] = [true, true, true, true, true, false, false];
const WEEKENDS: [bool; 7] = [false, false, false, false, false, true, true];

/// Accepts `everyday`, `weekdays`, `weekends` or a list such as `mon,wed,fri`.
pub fn parse_active_days(pattern_raw: &str) -> Result<ActiveDays, HabitError> {
    let pattern = pattern_raw.trim().to_lowercase();
    if pattern.is_empty() {
        return Err(HabitError::validation("Invalid schedule pattern"));
    }

    match pattern.as_str() {
        "everyday" => return Ok(ActiveDays::EVERY_DAY),
        "weekdays" => return Ok(ActiveDays::new(WEEKDAYS)),
        "weekends" => return Ok(ActiveDays::new(WEEKENDS)),
        _ => {}
    }

    let parts: Vec<&str> = pattern
        .split(',')
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect();
    if parts.is_empty() {
        return Err(HabitError::validation(format!(
            "Invalid schedule pattern: {}",
            pattern_raw
        )));
    }

    let mut days = [false; 7];
    for p in parts {
        let idx = DayIndex::from_short_name(p).ok_or_else(|| {
            HabitError::validation(format!("Invalid schedule pattern: {}", pattern_raw))
        })?;
        days[idx.as_usize()] = true;
    }
    Ok(ActiveDays::new(days))
}

pub fn active_days_to_string(days: &ActiveDays) -> String {
    match days.as_array() {
        [true, true, true, true, true, true, true] => "everyday".to_string(),
        WEEKDAYS => "weekdays".to_string(),
        WEEKENDS => "weekends".to_string(),
        _ => days
            .active()
            .map(|d| d.short_name())
            .collect::<Vec<&str>>()
            .join(","),
    }
}

pub fn validate_active_days(days: &ActiveDays) -> Result<(), HabitError> {
    if !days.any() {
        return Err(HabitError::validation("At least one active day is required"));
    }
    Ok(())
}
