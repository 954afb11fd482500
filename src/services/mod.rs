//! Business logic services

pub mod catalog;
pub mod timetables;

use std::sync::Arc;

use crate::repository::{MemoryStore, Repository, ServiceStore, TimetableStore};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub timetables: timetables::TimetablesService,
}

impl Services {
    /// Create all services backed by the PostgreSQL repository
    pub fn new(repository: Repository) -> Self {
        Self::with_stores(
            Arc::new(repository.services),
            Arc::new(repository.timetables),
        )
    }

    /// Create all services over arbitrary stores
    pub fn with_stores(
        service_store: Arc<dyn ServiceStore>,
        timetable_store: Arc<dyn TimetableStore>,
    ) -> Self {
        Self {
            catalog: catalog::CatalogService::new(service_store),
            timetables: timetables::TimetablesService::new(timetable_store),
        }
    }

    /// Create all services over a fresh in-memory store
    pub fn in_memory() -> (Self, MemoryStore) {
        let store = MemoryStore::new();
        let services = Self::with_stores(Arc::new(store.clone()), Arc::new(store.clone()));
        (services, store)
    }
}
