//! Background job queue repository.
//!
//! The queue is a plain table plus one carefully shaped UPDATE. Claiming
//! selects the next eligible row and flips it to processing in a single
//! statement, so under SQLite's write lock exactly one concurrent caller
//! can win any given row. Workers poll; there is no broker.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::database::models::{MAX_ATTEMPTS, QueueJob};
use crate::{Error, Result};

/// Durable background job queue.
#[async_trait]
pub trait QueueRepository: Send + Sync {
    /// Inserts a new pending job that is immediately eligible for claiming.
    /// Returns the assigned job id.
    async fn enqueue(
        &self,
        job_type: &str,
        user_id: i64,
        payload: Option<serde_json::Value>,
    ) -> Result<i64>;

    /// Atomically claims the next eligible job: pending, past its
    /// process_after time, and under the attempt ceiling, in
    /// earliest-eligible order. The claim flips the row to processing and
    /// bumps its attempt count in the same statement. Returns `None` when
    /// there is no work.
    async fn claim_next(&self) -> Result<Option<QueueJob>>;

    /// Marks a claimed job as successfully finished.
    async fn mark_completed(&self, id: i64) -> Result<()>;

    /// Marks a claimed job as failed, recording the error text for
    /// diagnosis. Failed is terminal; the row stays for audit.
    async fn mark_failed(&self, id: i64, error: &str) -> Result<()>;

    async fn get(&self, id: i64) -> Result<QueueJob>;

    /// Number of pending jobs currently eligible for claiming.
    async fn count_eligible(&self) -> Result<i64>;
}

/// SQLx implementation of QueueRepository.
pub struct SqlxQueueRepository {
    pool: SqlitePool,
}

impl SqlxQueueRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QueueRepository for SqlxQueueRepository {
    async fn enqueue(
        &self,
        job_type: &str,
        user_id: i64,
        payload: Option<serde_json::Value>,
    ) -> Result<i64> {
        let now = chrono::Utc::now().to_rfc3339();
        let payload = payload.map(|p| p.to_string());
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO background_jobs (job_type, user_id, payload, status, attempts, created_at, updated_at, process_after)
            VALUES (?, ?, ?, 'pending', 0, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(job_type)
        .bind(user_id)
        .bind(&payload)
        .bind(&now)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn claim_next(&self) -> Result<Option<QueueJob>> {
        let now = chrono::Utc::now().to_rfc3339();
        let job = sqlx::query_as::<_, QueueJob>(
            r#"
            UPDATE background_jobs
            SET status = 'processing',
                attempts = attempts + 1,
                updated_at = ?
            WHERE id = (
                SELECT id FROM background_jobs
                WHERE status = 'pending'
                  AND process_after <= ?
                  AND attempts < ?
                ORDER BY process_after, id
                LIMIT 1
            )
            RETURNING *
            "#,
        )
        .bind(&now)
        .bind(&now)
        .bind(MAX_ATTEMPTS)
        .fetch_optional(&self.pool)
        .await?;
        Ok(job)
    }

    async fn mark_completed(&self, id: i64) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query("UPDATE background_jobs SET status = 'completed', updated_at = ? WHERE id = ?")
            .bind(&now)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn mark_failed(&self, id: i64, error: &str) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query(
            "UPDATE background_jobs SET status = 'failed', error = ?, updated_at = ? WHERE id = ?",
        )
        .bind(error)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: i64) -> Result<QueueJob> {
        sqlx::query_as::<_, QueueJob>("SELECT * FROM background_jobs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::not_found("QueueJob", id.to_string()))
    }

    async fn count_eligible(&self) -> Result<i64> {
        let now = chrono::Utc::now().to_rfc3339();
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM background_jobs
            WHERE status = 'pending' AND process_after <= ? AND attempts < ?
            "#,
        )
        .bind(&now)
        .bind(MAX_ATTEMPTS)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
