//! Timetable models (timetables, weekday intervals)

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;

// ---------------------------------------------------------------------------
// DayOfWeek
// ---------------------------------------------------------------------------

/// Day of week, stored as the lowercase English name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "day_of_week", rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DayOfWeek::Monday => "monday",
            DayOfWeek::Tuesday => "tuesday",
            DayOfWeek::Wednesday => "wednesday",
            DayOfWeek::Thursday => "thursday",
            DayOfWeek::Friday => "friday",
            DayOfWeek::Saturday => "saturday",
            DayOfWeek::Sunday => "sunday",
        }
    }
}

impl FromStr for DayOfWeek {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        DayOfWeek::ALL
            .into_iter()
            .find(|d| d.as_str() == lowered)
            .ok_or_else(|| AppError::Validation(format!("Invalid day of week provided: {:?}", s)))
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Timetable
// ---------------------------------------------------------------------------

/// A named schedule valid over `[valid_from, valid_until]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Timetable {
    pub id: i32,
    pub name: String,
    /// First day the timetable is in effect
    pub valid_from: NaiveDate,
    /// Last day the timetable is in effect, open-ended when `None`
    pub valid_until: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Create timetable request
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreateTimetable {
    pub name: String,
    pub valid_from: NaiveDate,
    pub valid_until: Option<NaiveDate>,
}

/// Timetable together with its intervals, when requested
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimetableDetails {
    #[serde(flatten)]
    pub timetable: Timetable,
    #[serde(flatten)]
    pub week: Option<WeekSchedule>,
}

// ---------------------------------------------------------------------------
// TimetableDay
// ---------------------------------------------------------------------------

/// One opening interval of a timetable on a given weekday
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TimetableDay {
    pub id: i32,
    pub timetable_id: i32,
    pub day_of_week: DayOfWeek,
    /// Opening time (HH:MM)
    pub opening: String,
    /// Closing time (HH:MM)
    pub closing: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Candidate interval as supplied by a caller
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OpeningInterval {
    /// Opening time (HH:MM)
    pub opening: String,
    /// Closing time (HH:MM)
    pub closing: String,
}

impl OpeningInterval {
    pub fn new(opening: impl Into<String>, closing: impl Into<String>) -> Self {
        Self {
            opening: opening.into(),
            closing: closing.into(),
        }
    }
}

/// Validated interval ready to be stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTimetableDay {
    pub timetable_id: i32,
    pub day_of_week: DayOfWeek,
    pub opening: String,
    pub closing: String,
}

// ---------------------------------------------------------------------------
// WeekSchedule
// ---------------------------------------------------------------------------

/// The intervals of all seven weekdays
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WeekSchedule {
    pub monday: Vec<TimetableDay>,
    pub tuesday: Vec<TimetableDay>,
    pub wednesday: Vec<TimetableDay>,
    pub thursday: Vec<TimetableDay>,
    pub friday: Vec<TimetableDay>,
    pub saturday: Vec<TimetableDay>,
    pub sunday: Vec<TimetableDay>,
}

impl WeekSchedule {
    pub fn day(&self, dow: DayOfWeek) -> &[TimetableDay] {
        match dow {
            DayOfWeek::Monday => &self.monday,
            DayOfWeek::Tuesday => &self.tuesday,
            DayOfWeek::Wednesday => &self.wednesday,
            DayOfWeek::Thursday => &self.thursday,
            DayOfWeek::Friday => &self.friday,
            DayOfWeek::Saturday => &self.saturday,
            DayOfWeek::Sunday => &self.sunday,
        }
    }

    pub fn set_day(&mut self, dow: DayOfWeek, intervals: Vec<TimetableDay>) {
        let slot = match dow {
            DayOfWeek::Monday => &mut self.monday,
            DayOfWeek::Tuesday => &mut self.tuesday,
            DayOfWeek::Wednesday => &mut self.wednesday,
            DayOfWeek::Thursday => &mut self.thursday,
            DayOfWeek::Friday => &mut self.friday,
            DayOfWeek::Saturday => &mut self.saturday,
            DayOfWeek::Sunday => &mut self.sunday,
        };
        *slot = intervals;
    }

    pub fn is_empty(&self) -> bool {
        DayOfWeek::ALL.iter().all(|d| self.day(*d).is_empty())
    }
}
