//! API data models for requests and responses.
//!
//! DTOs for the HTTP surface:
//! - Mail connection (connect / status / disconnect)
//! - On-demand scanning
//! - Initial-sync progress
//! - Health checks

use chrono::{DateTime, Utc};
use jobevent::JobEvent;
use serde::{Deserialize, Serialize};

// ============================================================================
// Mail Connection Models
// ============================================================================

/// Request to store a mail credential for the authenticated user.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectMailRequest {
    /// OAuth access token issued by the provider.
    pub access_token: String,
    /// Refresh token, when the provider granted offline access.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Access-token expiry (RFC 3339).
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

/// Whether a mail credential is currently stored for the user.
#[derive(Debug, Clone, Serialize)]
pub struct MailStatusResponse {
    pub connected: bool,
}

/// Acknowledgement body for state-changing mail endpoints, e.g.
/// `{"status": "disconnected"}`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

// ============================================================================
// Scan Models
// ============================================================================

/// Query parameters for an on-demand scan page.
///
/// # Query Parameters
/// - `since` / `until`: inclusive calendar-day bounds, `YYYY-MM-DD`.
///   Defaults: one year back / unbounded.
/// - `limit`: page size, accepted in 1..=500. Out-of-range values fall back
///   to the default of 200.
/// - `cursor`: continuation token from the previous page's response.
/// - `only`: `all` | `applied` | `rejected`. Defaults to `all`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanParams {
    pub since: Option<String>,
    pub until: Option<String>,
    pub limit: Option<i64>,
    pub cursor: Option<String>,
    pub only: Option<String>,
}

/// One page of recognized events.
///
/// `nextPageToken` is present only while more pages remain; its absence
/// tells the caller the scan is exhausted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    pub events: Vec<JobEvent>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

// ============================================================================
// Sync Status Models
// ============================================================================

/// Initial-sync progress for the authenticated user.
#[derive(Debug, Clone, Serialize)]
pub struct SyncStatusResponse {
    /// True while a background import is running.
    pub is_syncing: bool,
    /// Messages imported so far (final total once the sync completes).
    pub total_imported: i64,
}

// ============================================================================
// Health Models
// ============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Overall status: "healthy" or "unhealthy".
    pub status: &'static str,
    /// Database reachability: "connected" or "disconnected".
    pub database: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Seconds since the server started.
    pub uptime_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use jobevent::EventStatus;

    #[test]
    fn test_scan_response_wire_format() {
        let event = JobEvent {
            message_id: "msg-1".to_string(),
            subject: "Your application to Acme".to_string(),
            snippet: "Thanks for applying".to_string(),
            company: Some("Acme".to_string()),
            title: None,
            status: EventStatus::Applied,
            applied_date: Some(Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()),
            source: "gmail".to_string(),
            link: "https://mail.google.com/mail/u/0/#all/msg-1".to_string(),
        };
        let response = ScanResponse {
            events: vec![event],
            count: 1,
            next_page_token: Some("page-2".to_string()),
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["count"], 1);
        assert_eq!(json["nextPageToken"], "page-2");
        assert_eq!(json["events"][0]["messageId"], "msg-1");
        assert_eq!(json["events"][0]["status"], "applied");
        assert!(json["events"][0]["appliedDate"].is_string());
        // Absent optionals are omitted entirely, not serialized as null.
        assert!(json["events"][0].get("title").is_none());
    }

    #[test]
    fn test_scan_response_omits_exhausted_token() {
        let response = ScanResponse {
            events: vec![],
            count: 0,
            next_page_token: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("nextPageToken").is_none());
    }

    #[test]
    fn test_connect_request_optionals_default() {
        let req: ConnectMailRequest =
            serde_json::from_str(r#"{"access_token": "ya29.abc"}"#).unwrap();
        assert_eq!(req.access_token, "ya29.abc");
        assert!(req.refresh_token.is_none());
        assert!(req.expiry.is_none());
    }

    #[test]
    fn test_scan_params_all_optional() {
        let params: ScanParams = serde_json::from_str("{}").unwrap();
        assert!(params.since.is_none());
        assert!(params.limit.is_none());
        assert!(params.only.is_none());
    }
}
