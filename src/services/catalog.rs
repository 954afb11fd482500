//! Service catalog management

use std::{collections::HashSet, sync::Arc};

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::service::{Service, ServiceInput},
    repository::ServiceStore,
};

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn ServiceStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn ServiceStore>) -> Self {
        Self { store }
    }

    /// Get an active service by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Service> {
        if id <= 0 {
            return Err(AppError::NotFound(format!("Service {} not found", id)));
        }
        tracing::debug!(service_id = id, "Catalog: fetching service");
        self.store
            .find_service(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Service {} not found", id)))
    }

    /// Create a service, checking that its parent exists
    pub async fn create(&self, data: &ServiceInput) -> AppResult<Service> {
        data.validate()?;
        if let Some(parent_id) = data.parent_id {
            self.ensure_parent_exists(parent_id).await?;
        }

        let service = self.store.insert_service(data).await?;
        tracing::info!(service_id = service.id, parent_id = ?service.parent_id, "Catalog: service created");
        Ok(service)
    }

    /// Replace the mutable fields of an existing service
    pub async fn update(&self, id: i32, data: &ServiceInput) -> AppResult<Service> {
        data.validate()?;
        if let Some(parent_id) = data.parent_id {
            self.ensure_parent_exists(parent_id).await?;
            self.ensure_no_cycle(id, parent_id).await?;
        }

        let service = self.store.save_service(id, data).await?;
        tracing::info!(service_id = id, "Catalog: service updated");
        Ok(service)
    }

    /// Soft-delete a service that has no active sub-services
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        if id <= 0 {
            return Err(AppError::Validation("Invalid service id".to_string()));
        }
        self.get_by_id(id).await?;

        let children = self.store.count_children(id).await?;
        if children > 0 {
            tracing::warn!(service_id = id, children, "Catalog: delete refused, service has sub-services");
            return Err(AppError::Conflict("Service contains sub-services".to_string()));
        }

        self.store.soft_delete_service(id).await?;
        tracing::info!(service_id = id, "Catalog: service deleted");
        Ok(())
    }

    /// List the active direct sub-services of a service
    pub async fn list_children(&self, parent_id: i32) -> AppResult<Vec<Service>> {
        self.get_by_id(parent_id).await?;
        self.store.list_children(parent_id).await
    }

    async fn ensure_parent_exists(&self, parent_id: i32) -> AppResult<()> {
        match self.get_by_id(parent_id).await {
            Ok(_) => Ok(()),
            Err(e @ AppError::NotFound(_)) => Err(AppError::Validation(format!(
                "Error while trying to get parent with ID {}: {}",
                parent_id, e
            ))),
            Err(e) => Err(e),
        }
    }

    /// Reject a parent assignment that would make `id` its own ancestor
    async fn ensure_no_cycle(&self, id: i32, parent_id: i32) -> AppResult<()> {
        let mut visited = HashSet::new();
        let mut current = Some(parent_id);

        while let Some(ancestor_id) = current {
            if ancestor_id == id {
                return Err(AppError::Validation(format!(
                    "Service {} cannot be placed under its own descendant {}",
                    id, parent_id
                )));
            }
            if !visited.insert(ancestor_id) {
                // pre-existing loop above us, not introduced by this update
                break;
            }
            current = self
                .store
                .find_service(ancestor_id)
                .await?
                .and_then(|ancestor| ancestor.parent_id);
        }
        Ok(())
    }
}
