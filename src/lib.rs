//! Habit state-transition engine.
//!
//! [`engine`] holds the pure day-granularity rules (completion, rollover,
//! missed-day reconciliation). [`tracker::HabitTracker`] drives them against a
//! [`gateway::PersistenceGateway`], a [`reminder::ReminderScheduler`] and a
//! [`clock::Clock`].

pub mod clock;
pub mod config;
pub mod date;
pub mod delta;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod habits;
pub mod model;
pub mod output;
pub mod reminder;
pub mod schedule;
pub mod stats;
pub mod store;
pub mod tracker;

pub use crate::clock::{Clock, FixedClock, SystemClock};
pub use crate::date::DayIndex;
pub use crate::delta::HabitDelta;
pub use crate::engine::{
    complete_habit, compute_missed_active_days, count_due_day, day_state, day_state_on,
    filter_for_day, rollover_day, DayState, RolloverOutcome,
};
pub use crate::error::HabitError;
pub use crate::gateway::{DayMarkerStore, MemoryStore, PersistenceGateway};
pub use crate::model::{ActiveDays, Frequency, Habit, HabitId, NewHabit, ReminderTime};
pub use crate::reminder::{ReminderRequest, ReminderScheduler};
pub use crate::store::{JsonStore, UserReminders};
pub use crate::tracker::{DaySync, HabitTracker};
