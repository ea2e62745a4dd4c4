use crate::date::{month_metadata, DayIndex, MonthMetadata};
use crate::engine::{day_state, day_state_on, filter_for_day, DayState};
use crate::model::Habit;
use crate::schedule::active_days_to_string;
use chrono::{Datelike, NaiveDate};

#[derive(Debug, Clone, serde::Serialize)]
pub struct HabitSummary {
    pub habit_id: String,
    pub name: String,
    pub schedule: String,
    pub state: DayState,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_completions: u32,
    pub total_attempts: u32,
    pub completion_rate: Option<f64>,
    pub days_done_in_month: u32,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub completed: bool,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MonthCalendar {
    #[serde(flatten)]
    pub metadata: MonthMetadata,
    pub days: Vec<CalendarDay>,
    pub days_done: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct DayProgress {
    pub due: u32,
    pub done: u32,
    pub progress: f64,
}

/// Completions over attempts. Completing on a day the habit is not scheduled
/// adds a completion without an attempt, so the rate can exceed 1.
pub fn completion_rate(habit: &Habit) -> Option<f64> {
    if habit.total_attempts == 0 {
        None
    } else {
        Some(habit.total_completions as f64 / habit.total_attempts as f64)
    }
}

pub fn days_done_in_month(habit: &Habit, month: NaiveDate) -> u32 {
    habit
        .completion_dates
        .iter()
        .filter(|d| d.year() == month.year() && d.month() == month.month())
        .count() as u32
}

pub fn summarize(habit: &Habit, today: NaiveDate) -> HabitSummary {
    HabitSummary {
        habit_id: habit.id.to_string(),
        name: habit.name.clone(),
        schedule: active_days_to_string(&habit.active_days),
        state: day_state(habit, today),
        current_streak: habit.streak_count,
        longest_streak: habit.longest_streak,
        total_completions: habit.total_completions,
        total_attempts: habit.total_attempts,
        completion_rate: completion_rate(habit),
        days_done_in_month: days_done_in_month(habit, today),
    }
}

pub fn month_calendar(habit: &Habit, month: NaiveDate) -> MonthCalendar {
    let metadata = month_metadata(month);
    let days: Vec<CalendarDay> = metadata
        .first_day
        .iter_days()
        .take(metadata.number_of_days as usize)
        .map(|date| CalendarDay {
            date,
            completed: habit.completed_on(date),
        })
        .collect();
    let days_done = days.iter().filter(|d| d.completed).count() as u32;

    MonthCalendar {
        metadata,
        days,
        days_done,
    }
}

/// Share of the habits scheduled on `date` that are done, as seen on `today`.
pub fn day_progress(habits: &[Habit], date: NaiveDate, today: NaiveDate) -> DayProgress {
    let mut due = 0u32;
    let mut done = 0u32;
    for h in filter_for_day(habits, DayIndex::of(date)) {
        due += 1;
        if day_state_on(h, date, today) == DayState::DueDone {
            done += 1;
        }
    }
    let progress = if due == 0 {
        0.0
    } else {
        done as f64 / due as f64
    };
    DayProgress {
        due,
        done,
        progress,
    }
}
