//! Data models for the scheduling core

pub mod service;
pub mod timetable;

// Re-export commonly used types
pub use service::{Service, ServiceInput};
pub use timetable::{
    CreateTimetable, DayOfWeek, NewTimetableDay, OpeningInterval, Timetable, TimetableDay,
    TimetableDetails, WeekSchedule,
};
