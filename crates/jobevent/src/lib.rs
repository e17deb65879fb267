//! Job-application email event model and the text heuristics that produce it.
//!
//! A [`JobEvent`] is the normalized result of looking at one email: which
//! message it came from, the company and position we could read out of the
//! subject line, and whether the mail reads like a confirmation or a
//! rejection. Extraction is best-effort; callers decide what to do when a
//! field could not be recognized.

mod extract;

pub use extract::{classify_status, extract_company, extract_title};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome a message was classified as.
///
/// Only the two stages that can be detected from an email are modeled here.
/// Downstream records use a wider vocabulary, so this converts into plain
/// strings at the persistence boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Applied,
    Rejected,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Applied => "applied",
            EventStatus::Rejected => "rejected",
        }
    }
}

/// One job-application event recognized in a mailbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobEvent {
    /// Provider-assigned message id, unique within the mailbox.
    pub message_id: String,
    pub subject: String,
    pub snippet: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub status: EventStatus,
    /// Best-known time the email was received.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_date: Option<DateTime<Utc>>,
    /// Mail source the event came from, e.g. "gmail".
    pub source: String,
    /// Deep link to the message in the provider's web UI.
    pub link: String,
}
