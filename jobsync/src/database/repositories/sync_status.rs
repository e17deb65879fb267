//! Mailbox sync status repository.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::Result;
use crate::database::models::SyncStatusRow;

/// Per-user bookkeeping for the initial mailbox import.
#[async_trait]
pub trait SyncStatusRepository: Send + Sync {
    /// Returns the user's sync status row, creating an empty one on first
    /// access. The upsert form keeps concurrent first accesses race-free.
    async fn get_or_create(&self, user_id: i64) -> Result<SyncStatusRow>;

    /// Records that a sync run has started.
    async fn mark_started(&self, user_id: i64) -> Result<()>;

    /// Records a finished sync run and its imported-record count.
    async fn mark_completed(&self, user_id: i64, total_imported: i64) -> Result<()>;

    /// Records the most recent continuation token while a paged sync is in
    /// flight.
    async fn update_last_cursor(&self, user_id: i64, cursor: &str) -> Result<()>;
}

/// SQLx implementation of SyncStatusRepository.
pub struct SqlxSyncStatusRepository {
    pool: SqlitePool,
}

impl SqlxSyncStatusRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SyncStatusRepository for SqlxSyncStatusRepository {
    async fn get_or_create(&self, user_id: i64) -> Result<SyncStatusRow> {
        let now = chrono::Utc::now().to_rfc3339();
        let row = sqlx::query_as::<_, SyncStatusRow>(
            r#"
            INSERT INTO sync_status (user_id, initial_sync_completed, total_imported, created_at, updated_at)
            VALUES (?, 0, 0, ?, ?)
            ON CONFLICT (user_id) DO UPDATE SET user_id = excluded.user_id
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn mark_started(&self, user_id: i64) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query(
            "UPDATE sync_status SET initial_sync_started_at = ?, updated_at = ? WHERE user_id = ?",
        )
        .bind(&now)
        .bind(&now)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_completed(&self, user_id: i64, total_imported: i64) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            UPDATE sync_status
            SET initial_sync_completed = 1,
                initial_sync_completed_at = ?,
                total_imported = ?,
                updated_at = ?
            WHERE user_id = ?
            "#,
        )
        .bind(&now)
        .bind(total_imported)
        .bind(&now)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_last_cursor(&self, user_id: i64, cursor: &str) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query("UPDATE sync_status SET last_cursor = ?, updated_at = ? WHERE user_id = ?")
            .bind(cursor)
            .bind(&now)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
