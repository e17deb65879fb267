//! Job application record models.

use chrono::{DateTime, Utc};
use jobevent::JobEvent;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Company name used when extraction found nothing usable.
pub const UNKNOWN_COMPANY: &str = "Unknown Company";

/// Position title used when extraction found nothing usable.
pub const UNKNOWN_POSITION: &str = "Unknown Position";

/// One tracked job application.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: i64,
    pub user_id: i64,
    /// Mail-source message id for imported records; unique where present
    pub message_id: Option<String>,
    pub company: String,
    pub position: String,
    /// Status: wishlist, applied, interviewing, offer, rejected, withdrawn
    pub status: String,
    /// RFC3339 timestamp of when the application was sent
    pub applied_date: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Insert payload for a new job record.
#[derive(Debug, Clone)]
pub struct NewJobRecord {
    pub user_id: i64,
    pub message_id: Option<String>,
    pub company: String,
    pub position: String,
    pub status: String,
    pub applied_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl NewJobRecord {
    /// Builds an insert payload from a scanned email event, substituting
    /// placeholder names where extraction came up empty.
    pub fn from_event(user_id: i64, event: &JobEvent) -> Self {
        let company = event
            .company
            .clone()
            .unwrap_or_else(|| UNKNOWN_COMPANY.to_string());
        let position = event
            .title
            .clone()
            .unwrap_or_else(|| UNKNOWN_POSITION.to_string());
        Self {
            user_id,
            message_id: Some(event.message_id.clone()),
            company,
            position,
            status: event.status.as_str().to_string(),
            applied_date: event.applied_date,
            notes: Some(format!("[Gmail Import] {}", event.subject)),
        }
    }
}

/// Result of attempting to persist an imported event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    /// A new record was created with this id.
    Created(i64),
    /// The message id was already present; nothing was written.
    Duplicate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobevent::EventStatus;

    #[test]
    fn from_event_fills_placeholders() {
        let event = JobEvent {
            message_id: "m-1".to_string(),
            subject: "Hello".to_string(),
            snippet: String::new(),
            company: None,
            title: None,
            status: EventStatus::Applied,
            applied_date: None,
            source: "gmail".to_string(),
            link: String::new(),
        };
        let record = NewJobRecord::from_event(7, &event);
        assert_eq!(record.company, UNKNOWN_COMPANY);
        assert_eq!(record.position, UNKNOWN_POSITION);
        assert_eq!(record.status, "applied");
        assert_eq!(record.notes.as_deref(), Some("[Gmail Import] Hello"));
        assert_eq!(record.message_id.as_deref(), Some("m-1"));
    }
}
