use crate::error::HabitError;
use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;

const SHORT_NAMES: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

/// Weekday index with Monday = 0 .. Sunday = 6, the order of `ActiveDays`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct DayIndex(u8);

impl DayIndex {
    pub fn new(index: u8) -> Result<Self, HabitError> {
        if index > 6 {
            return Err(HabitError::usage(format!("Invalid day index: {}", index)));
        }
        Ok(DayIndex(index))
    }

    pub fn all() -> impl Iterator<Item = DayIndex> {
        (0u8..7).map(DayIndex)
    }

    /// Converts a platform weekday (Sunday = 1 .. Saturday = 7).
    pub fn from_platform_weekday(weekday: u8) -> Result<Self, HabitError> {
        if !(1..=7).contains(&weekday) {
            return Err(HabitError::usage(format!("Invalid weekday: {}", weekday)));
        }
        Ok(DayIndex((weekday + 5) % 7))
    }

    /// Inverse of `from_platform_weekday`.
    pub fn platform_weekday(self) -> u8 {
        (self.0 + 1) % 7 + 1
    }

    pub fn of(date: NaiveDate) -> Self {
        let weekday = date.weekday().number_from_sunday() as u8;
        DayIndex((weekday + 5) % 7)
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }

    pub fn short_name(self) -> &'static str {
        SHORT_NAMES[self.as_usize()]
    }

    pub fn from_short_name(name: &str) -> Option<Self> {
        SHORT_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| DayIndex(i as u8))
    }
}

/// Accepts a short weekday name (`mon`..`sun`) or an index `0`..`6`.
pub fn parse_day_index(s: &str) -> Result<DayIndex, HabitError> {
    let t = s.trim().to_ascii_lowercase();
    if let Some(day) = DayIndex::from_short_name(&t) {
        return Ok(day);
    }
    match t.parse::<u8>() {
        Ok(i) => DayIndex::new(i),
        Err(_) => Err(HabitError::usage(format!("Invalid day: {}", s))),
    }
}

pub fn parse_date(s: &str, label: &str) -> Result<NaiveDate, HabitError> {
    let ss = s.trim();
    if ss.len() != 10 {
        return Err(HabitError::usage(format!("Invalid {}: {}", label, s)));
    }
    NaiveDate::parse_from_str(ss, "%Y-%m-%d")
        .map_err(|_| HabitError::usage(format!("Invalid {}: {}", label, s)))
}

/// Parses `YYYY-MM` into the first day of that month.
pub fn parse_month(s: &str) -> Result<NaiveDate, HabitError> {
    let ss = s.trim();
    let (y, m) = ss
        .split_once('-')
        .ok_or_else(|| HabitError::usage(format!("Invalid month: {}", s)))?;
    if y.len() != 4 || m.len() != 2 {
        return Err(HabitError::usage(format!("Invalid month: {}", s)));
    }
    let year: i32 = y
        .parse()
        .map_err(|_| HabitError::usage(format!("Invalid month: {}", s)))?;
    let month: u32 = m
        .parse()
        .map_err(|_| HabitError::usage(format!("Invalid month: {}", s)))?;
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| HabitError::usage(format!("Invalid month: {}", s)))
}

pub fn add_days(date: NaiveDate, delta: i64) -> NaiveDate {
    let step = Days::new(delta.unsigned_abs());
    let moved = if delta >= 0 {
        date.checked_add_days(step)
    } else {
        date.checked_sub_days(step)
    };
    moved.unwrap_or(date)
}

/// Dates strictly between `from` and `to`. Empty when `from >= to`.
pub fn dates_between_exclusive(from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    from.iter_days().skip(1).take_while(move |d| *d < to)
}

/// The seven dates, Monday first, of the week containing `date`.
pub fn week_dates(date: NaiveDate) -> [NaiveDate; 7] {
    let start = add_days(date, -(DayIndex::of(date).as_usize() as i64));
    let mut out = [start; 7];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = add_days(start, i as i64);
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthMetadata {
    pub first_day: NaiveDate,
    pub number_of_days: u32,
    /// Grid column of the first day (Monday = 0).
    pub first_day_index: DayIndex,
}

pub fn month_metadata(month_start: NaiveDate) -> MonthMetadata {
    let first_day = month_start.with_day(1).unwrap_or(month_start);
    let (ny, nm) = if first_day.month() == 12 {
        (first_day.year() + 1, 1)
    } else {
        (first_day.year(), first_day.month() + 1)
    };
    let number_of_days = NaiveDate::from_ymd_opt(ny, nm, 1)
        .map(|next| next.signed_duration_since(first_day).num_days() as u32)
        .unwrap_or(31);

    MonthMetadata {
        first_day,
        number_of_days,
        first_day_index: DayIndex::of(first_day),
    }
}
