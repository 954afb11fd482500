//! Persistence capabilities consumed by the domain services.
//!
//! Every read only sees active rows (`deleted_at IS NULL`) and every delete is
//! a soft delete. Methods documented as atomic must either apply all of their
//! writes or none of them.

use async_trait::async_trait;

use crate::{
    error::{AppError, AppResult},
    models::{
        service::{Service, ServiceInput},
        timetable::{CreateTimetable, DayOfWeek, NewTimetableDay, Timetable, TimetableDay},
    },
};

/// Storage for the service catalog
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ServiceStore: Send + Sync {
    /// Active service with the given id
    async fn find_service(&self, id: i32) -> AppResult<Option<Service>>;

    /// Number of active services whose parent is `parent_id`
    async fn count_children(&self, parent_id: i32) -> AppResult<i64>;

    /// Active services whose parent is `parent_id`, ordered by name
    async fn list_children(&self, parent_id: i32) -> AppResult<Vec<Service>>;

    /// Insert a service. Atomic with the parent check: fails with `Validation`
    /// when `parent_id` names no active service at write time.
    async fn insert_service(&self, data: &ServiceInput) -> AppResult<Service>;

    /// Replace the mutable fields of an active service.
    /// Fails with `NotFound` when no active row has this id, and with
    /// `Validation` when the new parent is not active at write time.
    async fn save_service(&self, id: i32, data: &ServiceInput) -> AppResult<Service>;

    /// Fails with `NotFound` when no active row has this id, and with
    /// `Conflict` when active sub-services exist at write time.
    async fn soft_delete_service(&self, id: i32) -> AppResult<()>;
}

/// Storage for timetables and their weekday intervals
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TimetableStore: Send + Sync {
    /// Active timetable with the given id
    async fn find_timetable(&self, id: i32) -> AppResult<Option<Timetable>>;

    async fn timetable_exists(&self, id: i32) -> AppResult<bool>;

    async fn insert_timetable(&self, data: &CreateTimetable) -> AppResult<Timetable>;

    /// Soft-delete a timetable and all of its intervals. Atomic.
    /// Fails with `NotFound` when no active timetable has this id.
    async fn delete_timetable_cascade(&self, id: i32) -> AppResult<()>;

    /// Active intervals of one weekday, ordered by opening time
    async fn list_days(&self, timetable_id: i32, dow: DayOfWeek) -> AppResult<Vec<TimetableDay>>;

    /// Delete the weekday's intervals and insert `days` in their place. Atomic.
    /// Every row of `days` must target `timetable_id` and `dow`.
    /// Returns the inserted rows in the order of `days`.
    async fn replace_days(
        &self,
        timetable_id: i32,
        dow: DayOfWeek,
        days: &[NewTimetableDay],
    ) -> AppResult<Vec<TimetableDay>>;

    /// Delete the weekday's intervals, returning how many were removed
    async fn delete_days(&self, timetable_id: i32, dow: DayOfWeek) -> AppResult<u64>;
}

/// Reject a replacement batch with rows aimed at another timetable or weekday
pub(crate) fn check_batch_target(
    timetable_id: i32,
    dow: DayOfWeek,
    days: &[NewTimetableDay],
) -> AppResult<()> {
    match days
        .iter()
        .find(|d| d.timetable_id != timetable_id || d.day_of_week != dow)
    {
        Some(stray) => Err(AppError::Validation(format!(
            "Interval for timetable {} on {} does not belong to timetable {} on {}",
            stray.timetable_id, stray.day_of_week, timetable_id, dow
        ))),
        None => Ok(()),
    }
}
