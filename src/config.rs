use crate::date::parse_date;
use crate::error::HabitError;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

pub const STORE_PATH_ENV: &str = "HABIT_STORE_PATH";
pub const TODAY_ENV: &str = "HABIT_TODAY";
pub const USER_ENV: &str = "HABIT_USER";
pub const LOG_ENV: &str = "HABIT_LOG";
pub const DEFAULT_USER: &str = "local";

/// Values given on the command line; each one wins over its env var.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub store: Option<String>,
    pub today: Option<String>,
    pub user: Option<String>,
    pub no_color: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub store_path: PathBuf,
    /// Logical today; `None` means the system clock.
    pub today: Option<NaiveDate>,
    /// `None` when the session was explicitly cleared.
    pub user_id: Option<String>,
    pub color: bool,
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl Config {
    pub fn from_env(overrides: Overrides) -> Result<Config, HabitError> {
        Config::resolve(overrides, |key| std::env::var(key).ok())
    }

    pub fn resolve(
        overrides: Overrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Config, HabitError> {
        let store_path = resolve_store_path(overrides.store, &env)?;

        let today = match non_blank(overrides.today).or_else(|| non_blank(env(TODAY_ENV))) {
            Some(t) => Some(parse_date(&t, "today")?),
            None => None,
        };

        let user_id = match overrides.user.or_else(|| env(USER_ENV)) {
            Some(u) => non_blank(Some(u)),
            None => Some(DEFAULT_USER.to_string()),
        };

        let color = !overrides.no_color && env("NO_COLOR").is_none();

        Ok(Config {
            store_path,
            today,
            user_id,
            color,
        })
    }
}

fn resolve_store_path(
    cli_path: Option<String>,
    env: &impl Fn(&str) -> Option<String>,
) -> Result<PathBuf, HabitError> {
    if let Some(p) = non_blank(cli_path).or_else(|| non_blank(env(STORE_PATH_ENV))) {
        return Ok(PathBuf::from(p));
    }

    let home = non_blank(env("HOME")).or_else(|| non_blank(env("USERPROFILE")));
    let base = match (non_blank(env("XDG_DATA_HOME")), home) {
        (Some(b), _) => PathBuf::from(b),
        (None, Some(h)) => Path::new(&h).join(".local").join("share"),
        (None, None) => {
            return Err(HabitError::usage(format!(
                "Cannot locate the store; set {} or HOME",
                STORE_PATH_ENV
            )));
        }
    };

    Ok(base.join("habit-engine").join("store.json"))
}
