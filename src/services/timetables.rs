//! Timetables service (validity windows, weekday intervals)

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Utc};

use crate::{
    error::{AppError, AppResult},
    models::timetable::{
        CreateTimetable, DayOfWeek, NewTimetableDay, OpeningInterval, Timetable, TimetableDay,
        TimetableDetails, WeekSchedule,
    },
    repository::TimetableStore,
};

/// Interval times are minute-resolution `HH:MM`
const TIME_FORMAT: &str = "%H:%M";

#[derive(Clone)]
pub struct TimetablesService {
    store: Arc<dyn TimetableStore>,
}

impl TimetablesService {
    pub fn new(store: Arc<dyn TimetableStore>) -> Self {
        Self { store }
    }

    // ---- Timetables ----

    /// Get a timetable, optionally with the intervals of all seven weekdays.
    /// Either every weekday is loaded or the whole call fails.
    pub async fn get_by_id(&self, id: i32, include_days: bool) -> AppResult<TimetableDetails> {
        if id <= 0 {
            return Err(AppError::Validation("Invalid timetable id".to_string()));
        }

        let timetable = self
            .store
            .find_timetable(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Timetable {} not found", id)))?;

        if !include_days {
            return Ok(TimetableDetails { timetable, week: None });
        }

        let mut week = WeekSchedule::default();
        for day in DayOfWeek::ALL {
            let intervals = self
                .store
                .list_days(id, day)
                .await
                .map_err(|e| AppError::WeekDay {
                    day,
                    source: Box::new(e),
                })?;
            week.set_day(day, intervals);
        }

        Ok(TimetableDetails {
            timetable,
            week: Some(week),
        })
    }

    /// Create a timetable whose validity window starts today or later
    pub async fn create(&self, data: &CreateTimetable) -> AppResult<Timetable> {
        validate_window(data.valid_from, data.valid_until, Utc::now().date_naive())?;

        let timetable = self.store.insert_timetable(data).await?;
        tracing::info!(
            timetable_id = timetable.id,
            valid_from = %timetable.valid_from,
            "Timetables: timetable created"
        );
        Ok(timetable)
    }

    /// Delete a timetable together with all of its intervals
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        if id <= 0 {
            return Err(AppError::Validation("Invalid timetable id".to_string()));
        }
        self.store.delete_timetable_cascade(id).await?;
        tracing::info!(timetable_id = id, "Timetables: timetable deleted");
        Ok(())
    }

    // ---- Weekdays ----

    /// Intervals of one weekday, ordered by opening time
    pub async fn get_week_day(&self, timetable_id: i32, dow: DayOfWeek) -> AppResult<Vec<TimetableDay>> {
        if timetable_id <= 0 {
            return Err(AppError::Validation("Invalid timetable provided".to_string()));
        }
        self.ensure_timetable_exists(timetable_id).await?;
        self.store.list_days(timetable_id, dow).await
    }

    /// Replace the intervals of one weekday.
    ///
    /// Intervals are checked in the order supplied: each opening must come
    /// strictly after the opening and closing of every interval accepted
    /// before it. Nothing is written unless the whole batch is valid, and the
    /// old intervals are swapped for the new ones in a single transaction.
    pub async fn create_week_day(
        &self,
        timetable_id: i32,
        dow: DayOfWeek,
        intervals: &[OpeningInterval],
    ) -> AppResult<Vec<TimetableDay>> {
        if intervals.is_empty() {
            return Err(AppError::Validation(
                "No opening closing times provided".to_string(),
            ));
        }
        self.ensure_timetable_exists(timetable_id).await?;

        let batch = validate_intervals(timetable_id, dow, intervals)?;
        let created = self.store.replace_days(timetable_id, dow, &batch).await?;

        tracing::info!(
            timetable_id,
            day = %dow,
            intervals = created.len(),
            "Timetables: weekday intervals replaced"
        );
        Ok(created)
    }

    /// Remove every interval of one weekday. An empty day is not an error.
    pub async fn delete_week_day(&self, timetable_id: i32, dow: DayOfWeek) -> AppResult<()> {
        self.ensure_timetable_exists(timetable_id).await?;
        let deleted = self.store.delete_days(timetable_id, dow).await?;
        tracing::info!(timetable_id, day = %dow, deleted, "Timetables: weekday intervals deleted");
        Ok(())
    }

    pub async fn get_week_day_by_name(&self, timetable_id: i32, dow: &str) -> AppResult<Vec<TimetableDay>> {
        self.get_week_day(timetable_id, dow.parse()?).await
    }

    pub async fn create_week_day_by_name(
        &self,
        timetable_id: i32,
        dow: &str,
        intervals: &[OpeningInterval],
    ) -> AppResult<Vec<TimetableDay>> {
        self.create_week_day(timetable_id, dow.parse()?, intervals).await
    }

    pub async fn delete_week_day_by_name(&self, timetable_id: i32, dow: &str) -> AppResult<()> {
        self.delete_week_day(timetable_id, dow.parse()?).await
    }

    async fn ensure_timetable_exists(&self, timetable_id: i32) -> AppResult<()> {
        if timetable_id > 0 && self.store.timetable_exists(timetable_id).await? {
            return Ok(());
        }
        Err(AppError::NotFound(format!("Timetable {} not found", timetable_id)))
    }
}

/// Check a validity window against the current calendar day
pub fn validate_window(
    valid_from: NaiveDate,
    valid_until: Option<NaiveDate>,
    today: NaiveDate,
) -> AppResult<()> {
    if valid_from < today {
        return Err(AppError::Validation(
            "Cannot start a timetable before the current day".to_string(),
        ));
    }
    if let Some(until) = valid_until {
        if until < valid_from {
            return Err(AppError::Validation("Invalid end validity provided".to_string()));
        }
    }
    Ok(())
}

/// Validate a weekday batch and normalize its times to `HH:MM`
pub fn validate_intervals(
    timetable_id: i32,
    dow: DayOfWeek,
    intervals: &[OpeningInterval],
) -> AppResult<Vec<NewTimetableDay>> {
    let mut accepted: Vec<(NaiveTime, NaiveTime)> = Vec::with_capacity(intervals.len());
    let mut batch = Vec::with_capacity(intervals.len());

    for interval in intervals {
        let opening = parse_time(&interval.opening, "opening")?;
        let closing = parse_time(&interval.closing, "closing")?;

        if closing < opening {
            return Err(AppError::Validation(format!(
                "Invalid closing time provided: {} is before {}",
                interval.closing, interval.opening
            )));
        }

        if accepted
            .iter()
            .any(|(prev_opening, prev_closing)| opening <= *prev_opening || opening <= *prev_closing)
        {
            return Err(AppError::Validation(format!(
                "Invalid opening time provided: {}",
                interval.opening
            )));
        }

        accepted.push((opening, closing));
        batch.push(NewTimetableDay {
            timetable_id,
            day_of_week: dow,
            opening: opening.format(TIME_FORMAT).to_string(),
            closing: closing.format(TIME_FORMAT).to_string(),
        });
    }

    Ok(batch)
}

/// Accepts `H:MM` or `HH:MM`; chrono alone would also take `9:5` or ` 9:05`
fn parse_time(value: &str, field: &str) -> AppResult<NaiveTime> {
    let well_formed = value.split_once(':').is_some_and(|(hours, minutes)| {
        (1..=2).contains(&hours.len())
            && minutes.len() == 2
            && hours.bytes().chain(minutes.bytes()).all(|b| b.is_ascii_digit())
    });
    if !well_formed {
        return Err(AppError::Validation(format!(
            "Invalid {} time provided: {:?}",
            field, value
        )));
    }
    NaiveTime::parse_from_str(value, TIME_FORMAT).map_err(|e| {
        AppError::Validation(format!("Invalid {} time provided: {:?} ({})", field, value, e))
    })
}
