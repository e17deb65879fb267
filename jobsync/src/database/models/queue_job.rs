//! Background job queue models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// How many times a job may be claimed before the queue stops handing it out.
pub const MAX_ATTEMPTS: i64 = 3;

/// One row in the durable background job queue.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QueueJob {
    pub id: i64,
    /// Job kind, e.g. "initial_sync"
    pub job_type: String,
    /// User the job runs on behalf of
    pub user_id: i64,
    /// Optional JSON blob with job-specific parameters
    pub payload: Option<String>,
    /// Status: pending, processing, completed, failed
    pub status: String,
    /// Number of times the job has been claimed
    pub attempts: i64,
    /// Failure message from the most recent attempt
    pub error: Option<String>,
    /// RFC3339 timestamp when the job was enqueued
    pub created_at: String,
    /// RFC3339 timestamp when the job was last updated
    pub updated_at: String,
    /// RFC3339 timestamp before which the job must not be claimed
    pub process_after: String,
}

/// Job kinds the worker knows how to run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    InitialSync,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InitialSync => "initial_sync",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "initial_sync" => Some(Self::InitialSync),
            _ => None,
        }
    }
}

/// Queue job status values.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum QueueJobStatus {
    /// Waiting to be picked up by a worker.
    Pending,
    /// Claimed by a worker and running.
    Processing,
    /// Finished successfully.
    Completed,
    /// Ended with an error; stays failed until explicitly requeued.
    Failed,
}

impl QueueJobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Check if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}
