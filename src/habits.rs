use crate::error::HabitError;
use crate::model::{Habit, HabitId, NewHabit};
use crate::schedule::validate_active_days;
use chrono::NaiveDate;
use std::cmp::Ordering;

const MIN_ID_PREFIX: usize = 4;

pub fn validate_habit_name(name: &str) -> Result<String, HabitError> {
    let n = name.trim();
    if n.is_empty() {
        return Err(HabitError::validation("Habit name is required"));
    }
    Ok(n.to_string())
}

/// Builds a fresh habit with zeroed counters.
pub fn make_habit(id: HabitId, input: NewHabit, today: NaiveDate) -> Result<Habit, HabitError> {
    let name = validate_habit_name(&input.name)?;
    validate_active_days(&input.active_days)?;

    let icon_name = match input.icon_name.trim() {
        "" => "checkmark".to_string(),
        icon => icon.to_string(),
    };

    Ok(Habit {
        id,
        name,
        icon_name,
        frequency: input.frequency,
        reminder_time: input.reminder_time,
        active_days: input.active_days,
        is_done_today: false,
        progress: 0.0,
        streak_count: 0,
        longest_streak: 0,
        total_completions: 0,
        total_attempts: 0,
        completion_dates: Vec::new(),
        creation_date: today,
    })
}

pub fn stable_habit_sort(a: &Habit, b: &Habit) -> Ordering {
    let an = a.name.to_lowercase();
    let bn = b.name.to_lowercase();
    match an.cmp(&bn) {
        Ordering::Equal => a.id.cmp(&b.id),
        o => o,
    }
}

/// Resolves a selector: exact id, exact name, or a unique id/name prefix
/// (case-insensitive).
pub fn select_habit_index(habits: &[Habit], selector: &str) -> Result<usize, HabitError> {
    let s = selector.trim();
    if s.is_empty() {
        return Err(HabitError::usage("Habit selector is required"));
    }
    let needle = s.to_lowercase();

    if let Some(i) = habits.iter().position(|h| h.id.as_str() == s) {
        return Ok(i);
    }
    if let Some(i) = habits.iter().position(|h| h.name.to_lowercase() == needle) {
        return Ok(i);
    }

    let mut matches: Vec<usize> = habits
        .iter()
        .enumerate()
        .filter(|(_, h)| {
            h.name.to_lowercase().starts_with(&needle)
                || (needle.len() >= MIN_ID_PREFIX && h.id.as_str().starts_with(&needle))
        })
        .map(|(i, _)| i)
        .collect();
    matches.sort_by(|a, b| stable_habit_sort(&habits[*a], &habits[*b]));

    match matches.as_slice() {
        [] => Err(HabitError::not_found(format!("Habit not found: {}", selector))),
        [only] => Ok(*only),
        many => {
            let candidates = many
                .iter()
                .map(|i| format!("{} {}", habits[*i].id, habits[*i].name))
                .collect::<Vec<String>>()
                .join(", ");
            Err(HabitError::ambiguous(format!(
                "Ambiguous selector '{}'. Candidates: {}",
                selector, candidates
            )))
        }
    }
}
