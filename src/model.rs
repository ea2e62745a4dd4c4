use crate::date::DayIndex;
use crate::error::HabitError;
use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct HabitId(String);

impl HabitId {
    pub fn generate() -> Self {
        HabitId(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for HabitId {
    fn from(s: &str) -> Self {
        HabitId(s.to_string())
    }
}

impl fmt::Display for HabitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Advisory only; `ActiveDays` is the authoritative schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        }
    }
}

/// Wall-clock time of day, stored as `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReminderTime {
    hour: u8,
    minute: u8,
}

impl ReminderTime {
    pub fn new(hour: u8, minute: u8) -> Result<Self, HabitError> {
        if hour > 23 || minute > 59 {
            return Err(HabitError::validation(format!(
                "Invalid reminder time: {:02}:{:02}",
                hour, minute
            )));
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }
}

impl Default for ReminderTime {
    fn default() -> Self {
        Self { hour: 9, minute: 0 }
    }
}

impl FromStr for ReminderTime {
    type Err = HabitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || HabitError::validation(format!("Invalid reminder time: {}", s));
        let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return Err(invalid());
        }
        let hour: u8 = h.parse().map_err(|_| invalid())?;
        let minute: u8 = m.parse().map_err(|_| invalid())?;
        ReminderTime::new(hour, minute).map_err(|_| invalid())
    }
}

impl TryFrom<String> for ReminderTime {
    type Error = HabitError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ReminderTime> for String {
    fn from(t: ReminderTime) -> Self {
        t.to_string()
    }
}

impl fmt::Display for ReminderTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Seven flags, index 0 = Monday .. 6 = Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ActiveDays([bool; 7]);

impl ActiveDays {
    pub const EVERY_DAY: ActiveDays = ActiveDays([true; 7]);

    pub fn new(days: [bool; 7]) -> Self {
        ActiveDays(days)
    }

    pub fn is_active(&self, day: DayIndex) -> bool {
        self.0[day.as_usize()]
    }

    pub fn any(&self) -> bool {
        self.0.iter().any(|d| *d)
    }

    pub fn active(&self) -> impl Iterator<Item = DayIndex> + '_ {
        DayIndex::all().filter(move |d| self.is_active(*d))
    }

    pub fn as_array(&self) -> [bool; 7] {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Habit {
    pub id: HabitId,
    pub name: String,
    pub icon_name: String,
    pub frequency: Frequency,
    pub reminder_time: ReminderTime,
    pub active_days: ActiveDays,
    pub is_done_today: bool,
    /// 0.0 until completed today, then 1.0.
    pub progress: f64,
    pub streak_count: u32,
    pub longest_streak: u32,
    pub total_completions: u32,
    pub total_attempts: u32,
    /// Ascending, one entry per day.
    pub completion_dates: Vec<NaiveDate>,
    pub creation_date: NaiveDate,
}

impl Habit {
    pub fn completed_on(&self, date: NaiveDate) -> bool {
        self.completion_dates.binary_search(&date).is_ok()
    }

    /// Inserts `date` in order. Returns false if it was already recorded.
    pub fn record_completion(&mut self, date: NaiveDate) -> bool {
        match self.completion_dates.binary_search(&date) {
            Ok(_) => false,
            Err(pos) => {
                self.completion_dates.insert(pos, date);
                true
            }
        }
    }

    /// Restores the ordering `completed_on` relies on for records written
    /// by other tools.
    pub fn normalize_completion_dates(&mut self) {
        self.completion_dates.sort_unstable();
        self.completion_dates.dedup();
    }

    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.active_days.is_active(DayIndex::of(date))
    }
}

/// User input for creating a habit; validated by `habits::make_habit`.
#[derive(Debug, Clone, Default)]
pub struct NewHabit {
    pub name: String,
    pub icon_name: String,
    pub frequency: Frequency,
    pub reminder_time: ReminderTime,
    pub active_days: ActiveDays,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reminder_time_parsing() {
        let t: ReminderTime = "07:05".parse().unwrap();
        assert_eq!((t.hour(), t.minute()), (7, 5));
        assert_eq!(t.to_string(), "07:05");
        assert_eq!("7:30".parse::<ReminderTime>().unwrap().to_string(), "07:30");
        assert!("24:00".parse::<ReminderTime>().is_err());
        assert!("12:60".parse::<ReminderTime>().is_err());
        assert!("noon".parse::<ReminderTime>().is_err());
    }

    #[test]
    fn serialized_shapes() {
        let days = ActiveDays::new([true, false, true, false, true, false, false]);
        assert_eq!(
            serde_json::to_string(&days).unwrap(),
            "[true,false,true,false,true,false,false]"
        );
        assert_eq!(serde_json::to_string(&ReminderTime::default()).unwrap(), "\"09:00\"");
        assert_eq!(serde_json::to_string(&Frequency::Weekly).unwrap(), "\"weekly\"");
        let back: ReminderTime = serde_json::from_str("\"18:45\"").unwrap();
        assert_eq!(back.to_string(), "18:45");
    }

    #[test]
    fn completion_dates_stay_sorted() {
        let d = |day: u32| NaiveDate::from_ymd_opt(2026, 1, day).unwrap();
        let mut h = Habit {
            id: HabitId::from("h1"),
            name: "Read".to_string(),
            icon_name: "book".to_string(),
            frequency: Frequency::Daily,
            reminder_time: ReminderTime::default(),
            active_days: ActiveDays::EVERY_DAY,
            is_done_today: false,
            progress: 0.0,
            streak_count: 0,
            longest_streak: 0,
            total_completions: 0,
            total_attempts: 0,
            completion_dates: vec![d(20), d(5), d(12), d(5)],
            creation_date: d(1),
        };
        h.normalize_completion_dates();
        assert_eq!(h.completion_dates, vec![d(5), d(12), d(20)]);

        assert!(h.record_completion(d(9)));
        assert!(!h.record_completion(d(12)));
        assert_eq!(h.completion_dates, vec![d(5), d(9), d(12), d(20)]);
        assert!(h.completed_on(d(9)));
        assert!(!h.completed_on(d(10)));
    }

    #[test]
    fn active_day_iteration() {
        let days = ActiveDays::new([true, false, true, false, true, false, false]);
        let names: Vec<&str> = days.active().map(|d| d.short_name()).collect();
        assert_eq!(names, vec!["mon", "wed", "fri"]);
        assert!(!ActiveDays::default().any());
    }
}
