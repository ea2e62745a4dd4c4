use crate::date::DayIndex;
use crate::error::HabitError;
use crate::model::{ActiveDays, ReminderTime};
use serde::{Deserialize, Serialize};

pub const REMINDER_TITLE: &str = "Habit Reminder";

/// One weekly repeating local notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderRequest {
    pub identifier: String,
    pub habit_name: String,
    /// Sunday = 1 .. Saturday = 7.
    pub weekday: u8,
    pub time: ReminderTime,
    pub title: String,
    pub body: String,
}

/// Schedules local notifications. Best-effort: callers log failures and
/// carry on.
pub trait ReminderScheduler {
    fn schedule(
        &self,
        habit_name: &str,
        time: ReminderTime,
        active_days: ActiveDays,
    ) -> Result<(), HabitError>;

    fn cancel(&self, habit_name: &str) -> Result<(), HabitError>;
}

impl<T: ReminderScheduler + ?Sized> ReminderScheduler for &T {
    fn schedule(
        &self,
        habit_name: &str,
        time: ReminderTime,
        active_days: ActiveDays,
    ) -> Result<(), HabitError> {
        (**self).schedule(habit_name, time, active_days)
    }

    fn cancel(&self, habit_name: &str) -> Result<(), HabitError> {
        (**self).cancel(habit_name)
    }
}

pub fn reminder_identifier(habit_name: &str, day: DayIndex) -> String {
    format!("{}_{}", habit_name, day.as_usize())
}

pub fn is_reminder_for(identifier: &str, habit_name: &str) -> bool {
    identifier
        .strip_prefix(habit_name)
        .and_then(|rest| rest.strip_prefix('_'))
        .map(|idx| idx.len() == 1 && idx.as_bytes()[0].is_ascii_digit())
        .unwrap_or(false)
}

pub fn plan_reminders(
    habit_name: &str,
    time: ReminderTime,
    active_days: ActiveDays,
) -> Vec<ReminderRequest> {
    active_days
        .active()
        .map(|day| ReminderRequest {
            identifier: reminder_identifier(habit_name, day),
            habit_name: habit_name.to_string(),
            weekday: day.platform_weekday(),
            time,
            title: REMINDER_TITLE.to_string(),
            body: format!("Time to perform your {} habit!", habit_name),
        })
        .collect()
}
