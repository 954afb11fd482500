//! Services repository for database operations

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Transaction};

use super::store::ServiceStore;
use crate::{
    error::{AppError, AppResult},
    models::service::{Service, ServiceInput},
};

#[derive(Clone)]
pub struct ServicesRepository {
    pool: Pool<Postgres>,
}

impl ServicesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Share-lock the active parent row so it cannot be deleted before commit
    async fn lock_parent(tx: &mut Transaction<'_, Postgres>, parent_id: i32) -> AppResult<()> {
        let locked: Option<i32> = sqlx::query_scalar(
            "SELECT id FROM services WHERE id = $1 AND deleted_at IS NULL FOR SHARE",
        )
        .bind(parent_id)
        .fetch_optional(&mut **tx)
        .await?;
        locked.map(|_| ()).ok_or_else(|| {
            AppError::Validation(format!("Parent service {} not found", parent_id))
        })
    }
}

#[async_trait]
impl ServiceStore for ServicesRepository {
    async fn find_service(&self, id: i32) -> AppResult<Option<Service>> {
        let row = sqlx::query_as::<_, Service>(
            "SELECT * FROM services WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn count_children(&self, parent_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM services WHERE parent_id = $1 AND deleted_at IS NULL",
        )
        .bind(parent_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn list_children(&self, parent_id: i32) -> AppResult<Vec<Service>> {
        let rows = sqlx::query_as::<_, Service>(
            "SELECT * FROM services WHERE parent_id = $1 AND deleted_at IS NULL ORDER BY name, id",
        )
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert_service(&self, data: &ServiceInput) -> AppResult<Service> {
        let mut tx = self.pool.begin().await?;
        if let Some(parent_id) = data.parent_id {
            Self::lock_parent(&mut tx, parent_id).await?;
        }

        let row = sqlx::query_as::<_, Service>(
            r#"
            INSERT INTO services (parent_id, name, description, price, public_price)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(data.parent_id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.price)
        .bind(data.public_price)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row)
    }

    async fn save_service(&self, id: i32, data: &ServiceInput) -> AppResult<Service> {
        let mut tx = self.pool.begin().await?;
        if let Some(parent_id) = data.parent_id {
            Self::lock_parent(&mut tx, parent_id).await?;
        }

        let row = sqlx::query_as::<_, Service>(
            r#"
            UPDATE services
            SET parent_id = $2, name = $3, description = $4, price = $5,
                public_price = $6, updated_at = $7
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(data.parent_id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.price)
        .bind(data.public_price)
        .bind(Utc::now())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Service {} not found", id)))?;

        tx.commit().await?;
        Ok(row)
    }

    async fn soft_delete_service(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        // Blocks child inserts, which share-lock this row
        let locked: Option<i32> = sqlx::query_scalar(
            "SELECT id FROM services WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        if locked.is_none() {
            return Err(AppError::NotFound(format!("Service {} not found", id)));
        }

        let children: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM services WHERE parent_id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if children > 0 {
            return Err(AppError::Conflict("Service contains sub-services".to_string()));
        }

        let now = Utc::now();
        sqlx::query("UPDATE services SET deleted_at = $1, updated_at = $1 WHERE id = $2")
            .bind(now)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
