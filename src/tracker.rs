//! Caller-side orchestration around the engine: loads a user's habits, runs
//! the day rollover against the stored last-known-day marker, and persists
//! the resulting deltas.
//!
//! A rollover is committed together with the marker, so a failed write
//! leaves both untouched and the next sync retries it. Completion, creation
//! and deletion update memory before the gateway is called; a failed write
//! leaves the in-memory change in place and surfaces as
//! `HabitError::Persistence`. Reloading from the gateway discards it.

use crate::clock::Clock;
use crate::date::DayIndex;
use crate::delta::HabitDelta;
use crate::engine::{complete_habit, count_due_day, filter_for_day, rollover_day};
use crate::error::HabitError;
use crate::gateway::{DayMarkerStore, PersistenceGateway};
use crate::habits::{make_habit, select_habit_index, stable_habit_sort};
use crate::model::{Habit, HabitId, NewHabit};
use crate::reminder::ReminderScheduler;
use chrono::NaiveDate;
use log::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DaySync {
    pub previous: Option<NaiveDate>,
    pub today: NaiveDate,
    pub rolled_over: bool,
    /// Habits changed by the rollover.
    pub updated: Vec<HabitId>,
}

pub struct HabitTracker<G, R, C> {
    gateway: G,
    reminders: R,
    clock: C,
    user_id: Option<String>,
    habits: Vec<Habit>,
    /// Day the loaded habits were last brought up to.
    synced_day: Option<NaiveDate>,
}

impl<G, R, C> HabitTracker<G, R, C>
where
    G: PersistenceGateway + DayMarkerStore,
    R: ReminderScheduler,
    C: Clock,
{
    pub fn new(gateway: G, reminders: R, clock: C, user_id: Option<String>) -> Self {
        let user_id = user_id
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        Self {
            gateway,
            reminders,
            clock,
            user_id,
            habits: Vec::new(),
            synced_day: None,
        }
    }

    fn user(&self) -> Result<String, HabitError> {
        self.user_id.clone().ok_or(HabitError::NotAuthenticated)
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Loaded habits, sorted by name.
    pub fn habits(&self) -> &[Habit] {
        &self.habits
    }

    pub fn load(&mut self) -> Result<&[Habit], HabitError> {
        let user = self.user()?;
        let mut habits = self.gateway.load_habits(&user)?;
        for h in habits.iter_mut() {
            h.normalize_completion_dates();
        }
        habits.sort_by(stable_habit_sort);
        debug!("Loaded {} habits for {}", habits.len(), user);
        self.habits = habits;
        self.synced_day = None;
        Ok(&self.habits)
    }

    /// Loads the user's habits and brings them up to today.
    pub fn open(&mut self) -> Result<DaySync, HabitError> {
        self.load()?;
        self.sync_day()
    }

    /// Rolls every loaded habit from the stored marker day to today and
    /// advances the marker in the same write. A first run only records the
    /// marker. When the write fails the loaded habits are left as they were.
    pub fn sync_day(&mut self) -> Result<DaySync, HabitError> {
        let user = self.user()?;
        let today = self.clock.today();
        let previous = self.gateway.load_last_known_day(&user)?;

        let mut sync = DaySync {
            previous,
            today,
            rolled_over: false,
            updated: Vec::new(),
        };

        let prev = match previous {
            None => {
                self.gateway.save_last_known_day(&user, today)?;
                self.synced_day = Some(today);
                return Ok(sync);
            }
            Some(prev) if prev == today => {
                self.synced_day = Some(today);
                return Ok(sync);
            }
            Some(prev) if prev > today => {
                warn!(
                    "Clock moved backwards: last known day {} is after {}; skipping rollover",
                    prev, today
                );
                self.synced_day = Some(today);
                return Ok(sync);
            }
            Some(prev) => prev,
        };

        info!(
            "Rolling over {} habits from {} to {}",
            self.habits.len(),
            prev,
            today
        );

        let mut rolled = self.habits.clone();
        let mut updates = Vec::new();
        for habit in rolled.iter_mut() {
            let outcome = rollover_day(habit, prev, today);
            if outcome.streak_broken {
                info!(
                    "Streak broken for {} ({} missed active days)",
                    habit.name, outcome.missed_days
                );
            }
            if !outcome.delta.is_empty() {
                updates.push((habit.id.clone(), outcome.delta));
            }
        }

        self.gateway
            .commit_rollover(&user, &updates, today)
            .map_err(|e| {
                warn!("Failed to persist rollover to {}: {}", today, e);
                HabitError::persistence(format!("Failed to save day rollover: {}", e))
            })?;
        debug!("Persisted rollover for {} habits", updates.len());

        self.habits = rolled;
        self.synced_day = Some(today);
        sync.updated = updates.into_iter().map(|(id, _)| id).collect();
        sync.rolled_over = true;
        Ok(sync)
    }

    fn ensure_synced(&mut self) -> Result<(), HabitError> {
        if self.synced_day != Some(self.clock.today()) {
            self.sync_day()?;
        }
        Ok(())
    }

    pub fn todays_habits(&self) -> Vec<&Habit> {
        self.habits_for(DayIndex::of(self.clock.today()))
    }

    pub fn habits_for(&self, day: DayIndex) -> Vec<&Habit> {
        filter_for_day(&self.habits, day)
    }

    pub fn resolve(&self, selector: &str) -> Result<&Habit, HabitError> {
        let idx = select_habit_index(&self.habits, selector)?;
        Ok(&self.habits[idx])
    }

    fn position(&self, habit_id: &HabitId) -> Result<usize, HabitError> {
        self.habits
            .iter()
            .position(|h| &h.id == habit_id)
            .ok_or_else(|| HabitError::not_found(format!("Habit not found: {}", habit_id)))
    }

    /// Completes the habit for today, first rolling over if the day changed
    /// since the last sync. Returns the persisted delta, empty when the habit
    /// was already done.
    pub fn complete(&mut self, habit_id: &HabitId) -> Result<HabitDelta, HabitError> {
        let user = self.user()?;
        self.ensure_synced()?;
        let idx = self.position(habit_id)?;
        let today = self.clock.today();

        let habit = &mut self.habits[idx];
        let delta = complete_habit(habit, today);
        if delta.is_empty() {
            debug!("{} already done on {}", habit.name, today);
            return Ok(delta);
        }
        info!(
            "Completed {} on {} (streak {})",
            habit.name, today, habit.streak_count
        );

        self.gateway
            .save_fields(&user, habit_id, &delta)
            .map_err(|e| {
                warn!("Failed to persist completion for {}: {}", habit_id, e);
                HabitError::persistence(format!("Failed to save completion: {}", e))
            })?;
        Ok(delta)
    }

    /// Creates a habit; its creation day counts as an attempt when it is one
    /// of the habit's active days.
    pub fn create(&mut self, input: NewHabit) -> Result<Habit, HabitError> {
        let user = self.user()?;
        let today = self.clock.today();
        let mut habit = make_habit(HabitId::generate(), input, today)?;
        count_due_day(&mut habit, today);

        self.habits.push(habit.clone());
        self.habits.sort_by(stable_habit_sort);

        self.gateway.create(&user, &habit).map_err(|e| {
            warn!("Failed to persist new habit {}: {}", habit.id, e);
            HabitError::persistence(format!("Failed to save habit: {}", e))
        })?;
        info!("Created habit {} ({})", habit.name, habit.id);

        if let Err(e) = self
            .reminders
            .schedule(&habit.name, habit.reminder_time, habit.active_days)
        {
            warn!("Failed to schedule reminders for {}: {}", habit.name, e);
        }
        Ok(habit)
    }

    pub fn delete(&mut self, habit_id: &HabitId) -> Result<Habit, HabitError> {
        let user = self.user()?;
        let idx = self.position(habit_id)?;
        let habit = self.habits.remove(idx);

        self.gateway.delete(&user, habit_id).map_err(|e| {
            warn!("Failed to delete habit {}: {}", habit_id, e);
            HabitError::persistence(format!("Failed to delete habit: {}", e))
        })?;
        info!("Deleted habit {} ({})", habit.name, habit.id);

        if let Err(e) = self.reminders.cancel(&habit.name) {
            warn!("Failed to cancel reminders for {}: {}", habit.name, e);
        }
        Ok(habit)
    }
}
