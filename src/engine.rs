//! Day-granularity state transitions for a single habit.
//!
//! Every function here is pure over the habit it is given: no clock, no I/O.
//! Callers persist the returned `HabitDelta`.

use crate::date::{add_days, dates_between_exclusive, DayIndex};
use crate::delta::HabitDelta;
use crate::model::Habit;
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DayState {
    NotDueToday,
    DueNotDone,
    DueDone,
}

impl DayState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DayState::NotDueToday => "not_due",
            DayState::DueNotDone => "due",
            DayState::DueDone => "done",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RolloverOutcome {
    /// Active days in the open interval that passed without a completion.
    pub missed_days: u32,
    pub streak_broken: bool,
    pub delta: HabitDelta,
}

/// Marks the habit done for `today`. A no-op when it is already done.
pub fn complete_habit(habit: &mut Habit, today: NaiveDate) -> HabitDelta {
    if habit.is_done_today {
        return HabitDelta::default();
    }
    let before = habit.clone();

    habit.total_completions = habit.total_completions.saturating_add(1);
    habit.streak_count = habit.streak_count.saturating_add(1);
    habit.is_done_today = true;
    habit.progress = 1.0;
    habit.record_completion(today);
    habit.longest_streak = habit.longest_streak.max(habit.streak_count);

    HabitDelta::between(&before, habit)
}

/// Counts active days strictly between the two dates that are absent from
/// the completion history. Days before the habit existed never count.
pub fn compute_missed_active_days(
    habit: &Habit,
    from_exclusive: NaiveDate,
    to_exclusive: NaiveDate,
) -> u32 {
    dates_between_exclusive(from_exclusive, to_exclusive)
        .filter(|d| *d >= habit.creation_date)
        .filter(|d| habit.is_active_on(*d) && !habit.completed_on(*d))
        .count() as u32
}

/// Applies the passage from `previous_known_day` to `today`.
///
/// One call spanning N days leaves the habit in the same state as N
/// single-day calls. The previously known day was counted as an attempt when
/// it became due, so only the days in between are added as missed attempts;
/// it still breaks the streak if it ended without a completion.
pub fn rollover_day(
    habit: &mut Habit,
    previous_known_day: NaiveDate,
    today: NaiveDate,
) -> RolloverOutcome {
    if previous_known_day >= today {
        return RolloverOutcome::default();
    }
    let before = habit.clone();

    let missed_days = compute_missed_active_days(habit, previous_known_day, today);
    let elapsed_misses =
        compute_missed_active_days(habit, add_days(previous_known_day, -1), today);
    let streak_broken = elapsed_misses > 0;

    if streak_broken {
        habit.streak_count = 0;
    }
    habit.total_attempts = habit.total_attempts.saturating_add(missed_days);

    habit.is_done_today = false;
    habit.progress = 0.0;

    count_due_day(habit, today);
    habit.longest_streak = habit.longest_streak.max(habit.streak_count);

    RolloverOutcome {
        missed_days,
        streak_broken,
        delta: HabitDelta::between(&before, habit),
    }
}

/// Counts `day` as an attempt if the habit is due then. Each day is counted
/// once: on creation for the first day, by `rollover_day` for later ones.
pub fn count_due_day(habit: &mut Habit, day: NaiveDate) -> bool {
    if day < habit.creation_date || !habit.is_active_on(day) {
        return false;
    }
    habit.total_attempts = habit.total_attempts.saturating_add(1);
    true
}

pub fn filter_for_day(habits: &[Habit], day: DayIndex) -> Vec<&Habit> {
    habits
        .iter()
        .filter(|h| h.active_days.is_active(day))
        .collect()
}

pub fn day_state(habit: &Habit, today: NaiveDate) -> DayState {
    if !habit.is_active_on(today) {
        DayState::NotDueToday
    } else if habit.is_done_today {
        DayState::DueDone
    } else {
        DayState::DueNotDone
    }
}

/// State of `date` as seen on `today`. Days other than today are read from
/// the completion history.
pub fn day_state_on(habit: &Habit, date: NaiveDate, today: NaiveDate) -> DayState {
    if date == today {
        day_state(habit, today)
    } else if !habit.is_active_on(date) {
        DayState::NotDueToday
    } else if habit.completed_on(date) {
        DayState::DueDone
    } else {
        DayState::DueNotDone
    }
}
