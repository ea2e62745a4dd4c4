use crate::model::Habit;
use chrono::NaiveDate;
use serde::Serialize;

/// Field-level patch of the habit fields the engine may change.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HabitDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streak_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_completions: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_attempts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longest_streak: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_dates: Option<Vec<NaiveDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_done_today: Option<bool>,
}

fn changed<T: PartialEq + Clone>(before: &T, after: &T) -> Option<T> {
    if before == after {
        None
    } else {
        Some(after.clone())
    }
}

impl HabitDelta {
    pub fn between(before: &Habit, after: &Habit) -> Self {
        HabitDelta {
            streak_count: changed(&before.streak_count, &after.streak_count),
            progress: changed(&before.progress, &after.progress),
            total_completions: changed(&before.total_completions, &after.total_completions),
            total_attempts: changed(&before.total_attempts, &after.total_attempts),
            longest_streak: changed(&before.longest_streak, &after.longest_streak),
            completion_dates: changed(&before.completion_dates, &after.completion_dates),
            is_done_today: changed(&before.is_done_today, &after.is_done_today),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == HabitDelta::default()
    }

    pub fn apply_to(&self, habit: &mut Habit) {
        if let Some(v) = self.streak_count {
            habit.streak_count = v;
        }
        if let Some(v) = self.progress {
            habit.progress = v;
        }
        if let Some(v) = self.total_completions {
            habit.total_completions = v;
        }
        if let Some(v) = self.total_attempts {
            habit.total_attempts = v;
        }
        if let Some(v) = self.longest_streak {
            habit.longest_streak = v;
        }
        if let Some(v) = &self.completion_dates {
            habit.completion_dates = v.clone();
        }
        if let Some(v) = self.is_done_today {
            habit.is_done_today = v;
        }
    }

    /// Names of the fields carried by this delta.
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.streak_count.is_some() {
            out.push("streak_count");
        }
        if self.progress.is_some() {
            out.push("progress");
        }
        if self.total_completions.is_some() {
            out.push("total_completions");
        }
        if self.total_attempts.is_some() {
            out.push("total_attempts");
        }
        if self.longest_streak.is_some() {
            out.push("longest_streak");
        }
        if self.completion_dates.is_some() {
            out.push("completion_dates");
        }
        if self.is_done_today.is_some() {
            out.push("is_done_today");
        }
        out
    }
}
