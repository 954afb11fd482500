//! In-memory store, used by tests and local tooling.
//!
//! All tables sit behind one mutex, so every trait method is a single
//! critical section and the atomic operations are trivially atomic.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use chrono::Utc;

use super::store::{check_batch_target, ServiceStore, TimetableStore};
use crate::{
    error::{AppError, AppResult},
    models::{
        service::{Service, ServiceInput},
        timetable::{CreateTimetable, DayOfWeek, NewTimetableDay, Timetable, TimetableDay},
    },
};

#[derive(Default)]
struct Tables {
    services: BTreeMap<i32, Service>,
    timetables: BTreeMap<i32, Timetable>,
    timetable_days: BTreeMap<i32, TimetableDay>,
    last_service_id: i32,
    last_timetable_id: i32,
    last_timetable_day_id: i32,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| AppError::Internal("memory store lock poisoned".to_string()))
    }

    /// Every interval row ever written for a timetable, deleted ones included
    pub fn all_days(&self, timetable_id: i32) -> AppResult<Vec<TimetableDay>> {
        let tables = self.lock()?;
        Ok(tables
            .timetable_days
            .values()
            .filter(|d| d.timetable_id == timetable_id)
            .cloned()
            .collect())
    }
}

fn ensure_parent_active(tables: &Tables, parent_id: Option<i32>) -> AppResult<()> {
    match parent_id {
        Some(parent_id)
            if !tables
                .services
                .get(&parent_id)
                .is_some_and(|s| s.deleted_at.is_none()) =>
        {
            Err(AppError::Validation(format!("Parent service {} not found", parent_id)))
        }
        _ => Ok(()),
    }
}

fn active_days_mut(
    tables: &mut Tables,
    timetable_id: i32,
    dow: DayOfWeek,
) -> impl Iterator<Item = &mut TimetableDay> {
    tables.timetable_days.values_mut().filter(move |d| {
        d.timetable_id == timetable_id && d.day_of_week == dow && d.deleted_at.is_none()
    })
}

#[async_trait]
impl ServiceStore for MemoryStore {
    async fn find_service(&self, id: i32) -> AppResult<Option<Service>> {
        let tables = self.lock()?;
        Ok(tables
            .services
            .get(&id)
            .filter(|s| s.deleted_at.is_none())
            .cloned())
    }

    async fn count_children(&self, parent_id: i32) -> AppResult<i64> {
        let tables = self.lock()?;
        let count = tables
            .services
            .values()
            .filter(|s| s.parent_id == Some(parent_id) && s.deleted_at.is_none())
            .count();
        Ok(count as i64)
    }

    async fn list_children(&self, parent_id: i32) -> AppResult<Vec<Service>> {
        let tables = self.lock()?;
        let mut children: Vec<Service> = tables
            .services
            .values()
            .filter(|s| s.parent_id == Some(parent_id) && s.deleted_at.is_none())
            .cloned()
            .collect();
        children.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(children)
    }

    async fn insert_service(&self, data: &ServiceInput) -> AppResult<Service> {
        let mut tables = self.lock()?;
        ensure_parent_active(&tables, data.parent_id)?;
        tables.last_service_id += 1;
        let now = Utc::now();
        let service = Service {
            id: tables.last_service_id,
            parent_id: data.parent_id,
            name: data.name.clone(),
            description: data.description.clone(),
            price: data.price,
            public_price: data.public_price,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.services.insert(service.id, service.clone());
        Ok(service)
    }

    async fn save_service(&self, id: i32, data: &ServiceInput) -> AppResult<Service> {
        let mut tables = self.lock()?;
        ensure_parent_active(&tables, data.parent_id)?;
        let service = tables
            .services
            .get_mut(&id)
            .filter(|s| s.deleted_at.is_none())
            .ok_or_else(|| AppError::NotFound(format!("Service {} not found", id)))?;
        service.parent_id = data.parent_id;
        service.name = data.name.clone();
        service.description = data.description.clone();
        service.price = data.price;
        service.public_price = data.public_price;
        service.updated_at = Utc::now();
        Ok(service.clone())
    }

    async fn soft_delete_service(&self, id: i32) -> AppResult<()> {
        let mut tables = self.lock()?;
        let has_children = tables
            .services
            .values()
            .any(|s| s.parent_id == Some(id) && s.deleted_at.is_none());
        let service = tables
            .services
            .get_mut(&id)
            .filter(|s| s.deleted_at.is_none())
            .ok_or_else(|| AppError::NotFound(format!("Service {} not found", id)))?;
        if has_children {
            return Err(AppError::Conflict("Service contains sub-services".to_string()));
        }
        let now = Utc::now();
        service.deleted_at = Some(now);
        service.updated_at = now;
        Ok(())
    }
}

#[async_trait]
impl TimetableStore for MemoryStore {
    async fn find_timetable(&self, id: i32) -> AppResult<Option<Timetable>> {
        let tables = self.lock()?;
        Ok(tables
            .timetables
            .get(&id)
            .filter(|t| t.deleted_at.is_none())
            .cloned())
    }

    async fn timetable_exists(&self, id: i32) -> AppResult<bool> {
        Ok(self.find_timetable(id).await?.is_some())
    }

    async fn insert_timetable(&self, data: &CreateTimetable) -> AppResult<Timetable> {
        let mut tables = self.lock()?;
        tables.last_timetable_id += 1;
        let now = Utc::now();
        let timetable = Timetable {
            id: tables.last_timetable_id,
            name: data.name.clone(),
            valid_from: data.valid_from,
            valid_until: data.valid_until,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.timetables.insert(timetable.id, timetable.clone());
        Ok(timetable)
    }

    async fn delete_timetable_cascade(&self, id: i32) -> AppResult<()> {
        let mut tables = self.lock()?;
        let now = Utc::now();
        let timetable = tables
            .timetables
            .get_mut(&id)
            .filter(|t| t.deleted_at.is_none())
            .ok_or_else(|| AppError::NotFound(format!("Timetable {} not found", id)))?;
        timetable.deleted_at = Some(now);
        timetable.updated_at = now;

        for day in tables
            .timetable_days
            .values_mut()
            .filter(|d| d.timetable_id == id && d.deleted_at.is_none())
        {
            day.deleted_at = Some(now);
            day.updated_at = now;
        }
        Ok(())
    }

    async fn list_days(&self, timetable_id: i32, dow: DayOfWeek) -> AppResult<Vec<TimetableDay>> {
        let mut tables = self.lock()?;
        let mut days: Vec<TimetableDay> = active_days_mut(&mut tables, timetable_id, dow)
            .map(|d| d.clone())
            .collect();
        days.sort_by(|a, b| a.opening.cmp(&b.opening).then(a.id.cmp(&b.id)));
        Ok(days)
    }

    async fn replace_days(
        &self,
        timetable_id: i32,
        dow: DayOfWeek,
        days: &[NewTimetableDay],
    ) -> AppResult<Vec<TimetableDay>> {
        check_batch_target(timetable_id, dow, days)?;

        let mut tables = self.lock()?;
        let is_active = tables
            .timetables
            .get(&timetable_id)
            .is_some_and(|t| t.deleted_at.is_none());
        if !is_active {
            return Err(AppError::NotFound(format!("Timetable {} not found", timetable_id)));
        }

        let now = Utc::now();
        for day in active_days_mut(&mut tables, timetable_id, dow) {
            day.deleted_at = Some(now);
            day.updated_at = now;
        }

        let mut created = Vec::with_capacity(days.len());
        for day in days {
            tables.last_timetable_day_id += 1;
            let row = TimetableDay {
                id: tables.last_timetable_day_id,
                timetable_id,
                day_of_week: dow,
                opening: day.opening.clone(),
                closing: day.closing.clone(),
                created_at: now,
                updated_at: now,
                deleted_at: None,
            };
            tables.timetable_days.insert(row.id, row.clone());
            created.push(row);
        }
        Ok(created)
    }

    async fn delete_days(&self, timetable_id: i32, dow: DayOfWeek) -> AppResult<u64> {
        let mut tables = self.lock()?;
        let now = Utc::now();
        let mut deleted = 0;
        for day in active_days_mut(&mut tables, timetable_id, dow) {
            day.deleted_at = Some(now);
            day.updated_at = now;
            deleted += 1;
        }
        Ok(deleted)
    }
}
