//! Mailbox sync bookkeeping model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Per-user record of the initial mailbox import, created lazily on first
/// access.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SyncStatusRow {
    pub id: i64,
    pub user_id: i64,
    /// True once an initial sync has run to completion.
    pub initial_sync_completed: bool,
    /// RFC3339 timestamp of the most recent sync start, if any
    pub initial_sync_started_at: Option<String>,
    /// RFC3339 timestamp of the most recent sync completion, if any
    pub initial_sync_completed_at: Option<String>,
    /// Opaque continuation token from the mail source, recorded for
    /// diagnostics while a paged sync is in flight
    pub last_cursor: Option<String>,
    /// Number of records the last completed sync imported
    pub total_imported: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl SyncStatusRow {
    /// A sync is in flight once it has started and has not yet completed.
    pub fn is_syncing(&self) -> bool {
        self.initial_sync_started_at.is_some() && !self.initial_sync_completed
    }
}
