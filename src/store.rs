//! Single-file JSON store. Writes take a sibling `.lock` file and replace the
//! store atomically through a temp file in the same directory.

use crate::delta::HabitDelta;
use crate::error::HabitError;
use crate::gateway::{apply_rollover, DayMarkerStore, PersistenceGateway};
use crate::model::{ActiveDays, Habit, HabitId, ReminderTime};
use crate::reminder::{is_reminder_for, plan_reminders, ReminderRequest, ReminderScheduler};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

const STORE_VERSION: u32 = 1;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct StoreFile {
    version: u32,
    #[serde(default)]
    users: BTreeMap<String, UserRecord>,
}

impl Default for StoreFile {
    fn default() -> Self {
        StoreFile {
            version: STORE_VERSION,
            users: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct UserRecord {
    #[serde(default)]
    habits: Vec<Habit>,
    #[serde(default)]
    last_known_day: Option<NaiveDate>,
    #[serde(default)]
    reminders: Vec<ReminderRequest>,
}

#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

struct WriteLock {
    path: PathBuf,
}

impl Drop for WriteLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

fn io_error(context: &str, e: std::io::Error) -> HabitError {
    HabitError::persistence(format!("Store IO error: {}: {}", context, e))
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<StoreFile, HabitError> {
        match fs::read_to_string(&self.path) {
            Ok(txt) => {
                let store: StoreFile = serde_json::from_str(&txt)
                    .map_err(|e| HabitError::load(format!("Store corrupted: {}", e)))?;
                if store.version != STORE_VERSION {
                    return Err(HabitError::load(format!(
                        "Unsupported store version: {}",
                        store.version
                    )));
                }
                Ok(store)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StoreFile::default()),
            Err(e) => Err(HabitError::load(format!("Store IO error: {}", e))),
        }
    }

    fn ensure_parent_dir(&self) -> Result<PathBuf, HabitError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| io_error("create dir", e))?;
        Ok(dir)
    }

    fn lock(&self) -> Result<WriteLock, HabitError> {
        let mut lock_path = self.path.clone().into_os_string();
        lock_path.push(".lock");
        let lock_path = PathBuf::from(lock_path);

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(file) => {
                #[cfg(unix)]
                {
                    let _ = file.set_permissions(fs::Permissions::from_mode(0o600));
                }
                drop(file);
                Ok(WriteLock { path: lock_path })
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(HabitError::persistence("Store is locked"))
            }
            Err(e) => Err(io_error("lock", e)),
        }
    }

    fn write(&self, dir: &Path, store: &StoreFile) -> Result<(), HabitError> {
        let tmp_path = dir.join(format!(".store.json.tmp.{}", std::process::id()));
        // serde_json::Value keeps object keys sorted, so output is stable.
        let value = serde_json::to_value(store)
            .map_err(|e| HabitError::persistence(format!("Store encode error: {}", e)))?;
        let data = serde_json::to_string_pretty(&value)
            .map_err(|e| HabitError::persistence(format!("Store encode error: {}", e)))?
            + "\n";

        {
            let mut f = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&tmp_path)
                .map_err(|e| io_error("open temp file", e))?;

            #[cfg(unix)]
            {
                let _ = f.set_permissions(fs::Permissions::from_mode(0o600));
            }

            f.write_all(data.as_bytes())
                .map_err(|e| io_error("write temp file", e))?;
            let _ = f.flush();
        }

        fs::rename(&tmp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            io_error("rename", e)
        })
    }

    fn update<R>(
        &self,
        mutator: impl FnOnce(&mut StoreFile) -> Result<R, HabitError>,
    ) -> Result<R, HabitError> {
        let dir = self.ensure_parent_dir()?;
        let _guard = self.lock()?;
        let mut store = self.read()?;
        let out = mutator(&mut store)?;
        self.write(&dir, &store)?;
        Ok(out)
    }

    /// Reminder scheduler writing into `user_id`'s record.
    pub fn reminders_for(&self, user_id: impl Into<String>) -> UserReminders<'_> {
        UserReminders {
            store: self,
            user_id: user_id.into(),
        }
    }

    pub fn pending_reminders(&self, user_id: &str) -> Result<Vec<ReminderRequest>, HabitError> {
        let mut reminders = self
            .read()?
            .users
            .remove(user_id)
            .map(|u| u.reminders)
            .unwrap_or_default();
        reminders.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        Ok(reminders)
    }
}

/// A user's view of the store's reminder list.
#[derive(Debug, Clone)]
pub struct UserReminders<'a> {
    store: &'a JsonStore,
    user_id: String,
}

impl UserReminders<'_> {
    fn update(
        &self,
        mutator: impl FnOnce(&mut Vec<ReminderRequest>),
    ) -> Result<(), HabitError> {
        if self.user_id.trim().is_empty() {
            return Err(HabitError::NotAuthenticated);
        }
        self.store.update(|store| {
            let user = store.users.entry(self.user_id.clone()).or_default();
            mutator(&mut user.reminders);
            Ok(())
        })
    }
}

fn find_habit<'a>(
    store: &'a mut StoreFile,
    user_id: &str,
    habit_id: &HabitId,
) -> Result<&'a mut Habit, HabitError> {
    store
        .users
        .get_mut(user_id)
        .and_then(|u| u.habits.iter_mut().find(|h| &h.id == habit_id))
        .ok_or_else(|| HabitError::persistence(format!("Habit not stored: {}", habit_id)))
}

impl PersistenceGateway for JsonStore {
    fn load_habits(&self, user_id: &str) -> Result<Vec<Habit>, HabitError> {
        if user_id.trim().is_empty() {
            return Err(HabitError::NotAuthenticated);
        }
        Ok(self
            .read()?
            .users
            .remove(user_id)
            .map(|u| u.habits)
            .unwrap_or_default())
    }

    fn save_fields(
        &self,
        user_id: &str,
        habit_id: &HabitId,
        delta: &HabitDelta,
    ) -> Result<(), HabitError> {
        if delta.is_empty() {
            return Ok(());
        }
        self.update(|store| {
            let habit = find_habit(store, user_id, habit_id)?;
            delta.apply_to(habit);
            Ok(())
        })
    }

    fn create(&self, user_id: &str, habit: &Habit) -> Result<(), HabitError> {
        self.update(|store| {
            let user = store.users.entry(user_id.to_string()).or_default();
            if user.habits.iter().any(|h| h.id == habit.id) {
                return Err(HabitError::persistence(format!(
                    "Habit already stored: {}",
                    habit.id
                )));
            }
            user.habits.push(habit.clone());
            Ok(())
        })
    }

    fn delete(&self, user_id: &str, habit_id: &HabitId) -> Result<(), HabitError> {
        self.update(|store| {
            let user = store
                .users
                .get_mut(user_id)
                .ok_or_else(|| HabitError::persistence(format!("Habit not stored: {}", habit_id)))?;
            let before = user.habits.len();
            user.habits.retain(|h| &h.id != habit_id);
            if user.habits.len() == before {
                return Err(HabitError::persistence(format!(
                    "Habit not stored: {}",
                    habit_id
                )));
            }
            Ok(())
        })
    }
}

impl DayMarkerStore for JsonStore {
    fn load_last_known_day(&self, user_id: &str) -> Result<Option<NaiveDate>, HabitError> {
        Ok(self
            .read()?
            .users
            .get(user_id)
            .and_then(|u| u.last_known_day))
    }

    fn save_last_known_day(&self, user_id: &str, day: NaiveDate) -> Result<(), HabitError> {
        self.update(|store| {
            store
                .users
                .entry(user_id.to_string())
                .or_default()
                .last_known_day = Some(day);
            Ok(())
        })
    }

    fn commit_rollover(
        &self,
        user_id: &str,
        updates: &[(HabitId, HabitDelta)],
        day: NaiveDate,
    ) -> Result<(), HabitError> {
        self.update(|store| {
            let user = store.users.entry(user_id.to_string()).or_default();
            apply_rollover(&mut user.habits, updates)?;
            user.last_known_day = Some(day);
            Ok(())
        })
    }
}

impl ReminderScheduler for UserReminders<'_> {
    fn schedule(
        &self,
        habit_name: &str,
        time: ReminderTime,
        active_days: ActiveDays,
    ) -> Result<(), HabitError> {
        let plan = plan_reminders(habit_name, time, active_days);
        self.update(|reminders| {
            reminders.retain(|r| !is_reminder_for(&r.identifier, habit_name));
            reminders.extend(plan);
        })
    }

    fn cancel(&self, habit_name: &str) -> Result<(), HabitError> {
        self.update(|reminders| {
            reminders.retain(|r| !is_reminder_for(&r.identifier, habit_name));
        })
    }
}
