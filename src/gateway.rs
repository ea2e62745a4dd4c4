use crate::delta::HabitDelta;
use crate::error::HabitError;
use crate::model::{Habit, HabitId};
use chrono::NaiveDate;
use std::cell::RefCell;
use std::collections::BTreeMap;

/// Durable storage of a user's habits.
pub trait PersistenceGateway {
    fn load_habits(&self, user_id: &str) -> Result<Vec<Habit>, HabitError>;

    /// Partial update; only the fields carried by `delta` are written.
    fn save_fields(&self, user_id: &str, habit_id: &HabitId, delta: &HabitDelta)
        -> Result<(), HabitError>;

    fn create(&self, user_id: &str, habit: &Habit) -> Result<(), HabitError>;

    fn delete(&self, user_id: &str, habit_id: &HabitId) -> Result<(), HabitError>;
}

/// The "last known day" marker, stored outside the habit records.
pub trait DayMarkerStore {
    fn load_last_known_day(&self, user_id: &str) -> Result<Option<NaiveDate>, HabitError>;

    fn save_last_known_day(&self, user_id: &str, day: NaiveDate) -> Result<(), HabitError>;

    /// Writes the rollover deltas and the new marker as one unit: on error
    /// neither the habits nor the marker have changed.
    fn commit_rollover(
        &self,
        user_id: &str,
        updates: &[(HabitId, HabitDelta)],
        day: NaiveDate,
    ) -> Result<(), HabitError>;
}

impl<T: PersistenceGateway + ?Sized> PersistenceGateway for &T {
    fn load_habits(&self, user_id: &str) -> Result<Vec<Habit>, HabitError> {
        (**self).load_habits(user_id)
    }

    fn save_fields(
        &self,
        user_id: &str,
        habit_id: &HabitId,
        delta: &HabitDelta,
    ) -> Result<(), HabitError> {
        (**self).save_fields(user_id, habit_id, delta)
    }

    fn create(&self, user_id: &str, habit: &Habit) -> Result<(), HabitError> {
        (**self).create(user_id, habit)
    }

    fn delete(&self, user_id: &str, habit_id: &HabitId) -> Result<(), HabitError> {
        (**self).delete(user_id, habit_id)
    }
}

impl<T: DayMarkerStore + ?Sized> DayMarkerStore for &T {
    fn load_last_known_day(&self, user_id: &str) -> Result<Option<NaiveDate>, HabitError> {
        (**self).load_last_known_day(user_id)
    }

    fn save_last_known_day(&self, user_id: &str, day: NaiveDate) -> Result<(), HabitError> {
        (**self).save_last_known_day(user_id, day)
    }

    fn commit_rollover(
        &self,
        user_id: &str,
        updates: &[(HabitId, HabitDelta)],
        day: NaiveDate,
    ) -> Result<(), HabitError> {
        (**self).commit_rollover(user_id, updates, day)
    }
}

#[derive(Debug, Default, Clone)]
struct MemoryUser {
    habits: Vec<Habit>,
    last_known_day: Option<NaiveDate>,
}

/// Process-local store, for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RefCell<BTreeMap<String, MemoryUser>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn habits(&self, user_id: &str) -> Vec<Habit> {
        self.users
            .borrow()
            .get(user_id)
            .map(|u| u.habits.clone())
            .unwrap_or_default()
    }
}

fn missing_habit(habit_id: &HabitId) -> HabitError {
    HabitError::persistence(format!("Habit not stored: {}", habit_id))
}

impl PersistenceGateway for MemoryStore {
    fn load_habits(&self, user_id: &str) -> Result<Vec<Habit>, HabitError> {
        Ok(self.habits(user_id))
    }

    fn save_fields(
        &self,
        user_id: &str,
        habit_id: &HabitId,
        delta: &HabitDelta,
    ) -> Result<(), HabitError> {
        let mut users = self.users.borrow_mut();
        let habit = users
            .get_mut(user_id)
            .and_then(|u| u.habits.iter_mut().find(|h| &h.id == habit_id))
            .ok_or_else(|| missing_habit(habit_id))?;
        delta.apply_to(habit);
        Ok(())
    }

    fn create(&self, user_id: &str, habit: &Habit) -> Result<(), HabitError> {
        let mut users = self.users.borrow_mut();
        let user = users.entry(user_id.to_string()).or_default();
        if user.habits.iter().any(|h| h.id == habit.id) {
            return Err(HabitError::persistence(format!(
                "Habit already stored: {}",
                habit.id
            )));
        }
        user.habits.push(habit.clone());
        Ok(())
    }

    fn delete(&self, user_id: &str, habit_id: &HabitId) -> Result<(), HabitError> {
        let mut users = self.users.borrow_mut();
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| missing_habit(habit_id))?;
        let before = user.habits.len();
        user.habits.retain(|h| &h.id != habit_id);
        if user.habits.len() == before {
            return Err(missing_habit(habit_id));
        }
        Ok(())
    }
}

impl DayMarkerStore for MemoryStore {
    fn load_last_known_day(&self, user_id: &str) -> Result<Option<NaiveDate>, HabitError> {
        Ok(self
            .users
            .borrow()
            .get(user_id)
            .and_then(|u| u.last_known_day))
    }

    fn save_last_known_day(&self, user_id: &str, day: NaiveDate) -> Result<(), HabitError> {
        self.users
            .borrow_mut()
            .entry(user_id.to_string())
            .or_default()
            .last_known_day = Some(day);
        Ok(())
    }

    fn commit_rollover(
        &self,
        user_id: &str,
        updates: &[(HabitId, HabitDelta)],
        day: NaiveDate,
    ) -> Result<(), HabitError> {
        let mut users = self.users.borrow_mut();
        let user = users.entry(user_id.to_string()).or_default();
        apply_rollover(&mut user.habits, updates)?;
        user.last_known_day = Some(day);
        Ok(())
    }
}

/// Applies every delta, or none of them if one names an unknown habit.
pub(crate) fn apply_rollover(
    habits: &mut [Habit],
    updates: &[(HabitId, HabitDelta)],
) -> Result<(), HabitError> {
    let mut targets = Vec::with_capacity(updates.len());
    for (habit_id, _) in updates {
        let idx = habits
            .iter()
            .position(|h| &h.id == habit_id)
            .ok_or_else(|| missing_habit(habit_id))?;
        targets.push(idx);
    }
    for (idx, (_, delta)) in targets.into_iter().zip(updates) {
        delta.apply_to(&mut habits[idx]);
    }
    Ok(())
}
