//! Timetables repository for database operations

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Transaction};

use super::store::{check_batch_target, TimetableStore};
use crate::{
    error::{AppError, AppResult},
    models::timetable::{CreateTimetable, DayOfWeek, NewTimetableDay, Timetable, TimetableDay},
};

#[derive(Clone)]
pub struct TimetablesRepository {
    pool: Pool<Postgres>,
}

impl TimetablesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Lock the active timetable row for the rest of the transaction.
    /// Concurrent writers on the same timetable queue up behind this lock.
    async fn lock_timetable(tx: &mut Transaction<'_, Postgres>, id: i32) -> AppResult<()> {
        let locked: Option<i32> = sqlx::query_scalar(
            "SELECT id FROM timetables WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
        locked
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Timetable {} not found", id)))
    }
}

#[async_trait]
impl TimetableStore for TimetablesRepository {
    async fn find_timetable(&self, id: i32) -> AppResult<Option<Timetable>> {
        let row = sqlx::query_as::<_, Timetable>(
            "SELECT * FROM timetables WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn timetable_exists(&self, id: i32) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM timetables WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    async fn insert_timetable(&self, data: &CreateTimetable) -> AppResult<Timetable> {
        let row = sqlx::query_as::<_, Timetable>(
            r#"
            INSERT INTO timetables (name, valid_from, valid_until)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(data.valid_from)
        .bind(data.valid_until)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_timetable_cascade(&self, id: i32) -> AppResult<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE timetables SET deleted_at = $1, updated_at = $1 WHERE id = $2 AND deleted_at IS NULL",
        )
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Timetable {} not found", id)));
        }

        sqlx::query(
            "UPDATE timetable_days SET deleted_at = $1, updated_at = $1 WHERE timetable_id = $2 AND deleted_at IS NULL",
        )
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn list_days(&self, timetable_id: i32, dow: DayOfWeek) -> AppResult<Vec<TimetableDay>> {
        let rows = sqlx::query_as::<_, TimetableDay>(
            r#"
            SELECT * FROM timetable_days
            WHERE timetable_id = $1 AND day_of_week = $2 AND deleted_at IS NULL
            ORDER BY opening ASC, id ASC
            "#,
        )
        .bind(timetable_id)
        .bind(dow)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn replace_days(
        &self,
        timetable_id: i32,
        dow: DayOfWeek,
        days: &[NewTimetableDay],
    ) -> AppResult<Vec<TimetableDay>> {
        check_batch_target(timetable_id, dow, days)?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        Self::lock_timetable(&mut tx, timetable_id).await?;

        sqlx::query(
            r#"
            UPDATE timetable_days SET deleted_at = $1, updated_at = $1
            WHERE timetable_id = $2 AND day_of_week = $3 AND deleted_at IS NULL
            "#,
        )
        .bind(now)
        .bind(timetable_id)
        .bind(dow)
        .execute(&mut *tx)
        .await?;

        let mut created = Vec::with_capacity(days.len());
        for day in days {
            let row = sqlx::query_as::<_, TimetableDay>(
                r#"
                INSERT INTO timetable_days (timetable_id, day_of_week, opening, closing)
                VALUES ($1, $2, $3, $4)
                RETURNING *
                "#,
            )
            .bind(timetable_id)
            .bind(dow)
            .bind(&day.opening)
            .bind(&day.closing)
            .fetch_one(&mut *tx)
            .await?;
            created.push(row);
        }

        tx.commit().await?;
        Ok(created)
    }

    async fn delete_days(&self, timetable_id: i32, dow: DayOfWeek) -> AppResult<u64> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE timetable_days SET deleted_at = $1, updated_at = $1
            WHERE timetable_id = $2 AND day_of_week = $3 AND deleted_at IS NULL
            "#,
        )
        .bind(now)
        .bind(timetable_id)
        .bind(dow)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
