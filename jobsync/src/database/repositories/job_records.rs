//! Job application record repository.
//!
//! Only the two operations the import pipeline needs live here: idempotent
//! create keyed on the mail-source message id, and the dedup-index load.
//! The wider CRUD surface over job records belongs to the API layer above
//! this service and is not part of the sync path.

use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::Result;
use crate::database::models::{ImportOutcome, NewJobRecord};

/// Store of tracked job applications, as seen by the import pipeline.
#[async_trait]
pub trait JobRecordRepository: Send + Sync {
    /// Inserts a record. A message-id collision means the email was already
    /// imported; the insert is skipped and reported as [`ImportOutcome::Duplicate`].
    async fn create(&self, record: &NewJobRecord) -> Result<ImportOutcome>;

    /// Message ids of every record already imported for this user.
    async fn list_message_ids(&self, user_id: i64) -> Result<HashSet<String>>;
}

/// SQLx implementation of JobRecordRepository.
pub struct SqlxJobRecordRepository {
    pool: SqlitePool,
}

impl SqlxJobRecordRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobRecordRepository for SqlxJobRecordRepository {
    async fn create(&self, record: &NewJobRecord) -> Result<ImportOutcome> {
        let now = chrono::Utc::now().to_rfc3339();
        let applied_date = record.applied_date.map(|d| d.to_rfc3339());
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO jobs (user_id, message_id, company, position, status, applied_date, notes, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (message_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(record.user_id)
        .bind(&record.message_id)
        .bind(&record.company)
        .bind(&record.position)
        .bind(&record.status)
        .bind(&applied_date)
        .bind(&record.notes)
        .bind(&now)
        .bind(&now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match id {
            Some(id) => ImportOutcome::Created(id),
            None => ImportOutcome::Duplicate,
        })
    }

    async fn list_message_ids(&self, user_id: i64) -> Result<HashSet<String>> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT message_id FROM jobs WHERE user_id = ? AND message_id IS NOT NULL",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids.into_iter().collect())
    }
}
