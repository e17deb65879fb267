//! Mail connection and scanning routes.
//!
//! All handlers here run behind the user-identity middleware and operate on
//! the authenticated user's mailbox only.

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{error, info};

use crate::api::error::{ApiError, ApiResult};
use crate::api::middleware::AuthUser;
use crate::api::models::{
    ConnectMailRequest, MailStatusResponse, ScanParams, ScanResponse, StatusResponse,
    SyncStatusResponse,
};
use crate::api::server::AppState;
use crate::database::models::{JobKind, OAuthToken};
use crate::error::Error;
use crate::mailsource::PROVIDER_GMAIL;
use crate::scanner::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, ScanMode, ScanOptions, scan_page};

/// Create the mail router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/connect", post(connect))
        .route("/status", get(status))
        .route("/disconnect", post(disconnect))
        .route("/scan", get(scan))
        .route("/sync-status", get(sync_status))
}

/// Store a mail credential and queue the initial import.
async fn connect(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<ConnectMailRequest>,
) -> ApiResult<Json<StatusResponse>> {
    if req.access_token.trim().is_empty() {
        return Err(ApiError::bad_request("access_token is required"));
    }

    let token = OAuthToken {
        access_token: req.access_token,
        refresh_token: req.refresh_token,
        expiry: req.expiry,
    };
    state.tokens.save(user.id(), PROVIDER_GMAIL, &token).await?;
    info!("Stored mail credential for user {}", user.id());

    // The credential is already saved; a failed enqueue must not undo the
    // connect. The import can be retriggered later.
    if let Err(e) = state
        .queue
        .enqueue(JobKind::InitialSync.as_str(), user.id(), None)
        .await
    {
        error!(
            "Failed to enqueue initial sync for user {}: {}",
            user.id(),
            e
        );
    }

    Ok(Json(StatusResponse {
        status: "connected",
    }))
}

/// Report whether a mail credential is stored for the user.
///
/// Only a genuinely absent credential reads as disconnected. Vault or
/// database failures surface as errors so a corrupted credential is not
/// mistaken for "never connected".
async fn status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<MailStatusResponse>> {
    match state.tokens.get(user.id(), PROVIDER_GMAIL).await {
        Ok(_) => Ok(Json(MailStatusResponse { connected: true })),
        Err(Error::NotFound { .. }) => Ok(Json(MailStatusResponse { connected: false })),
        Err(e) => Err(e.into()),
    }
}

/// Remove the stored mail credential. Idempotent.
async fn disconnect(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<StatusResponse>> {
    state.tokens.delete(user.id(), PROVIDER_GMAIL).await?;
    info!("Removed mail credential for user {}", user.id());

    Ok(Json(StatusResponse {
        status: "disconnected",
    }))
}

/// Run one on-demand scan page against the user's mailbox.
async fn scan(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ScanParams>,
) -> ApiResult<Json<ScanResponse>> {
    // Known ids come first so the page skips already-imported mail even
    // when the credential check below fails fast.
    let known = state.records.list_message_ids(user.id()).await?;

    let token = match state.tokens.get(user.id(), PROVIDER_GMAIL).await {
        Ok(token) => token,
        Err(Error::NotFound { .. }) => {
            return Err(ApiError::unauthorized("mail source not connected"));
        }
        Err(e) => return Err(e.into()),
    };
    let source = state.source_factory.client_for(&token)?;

    let opts = scan_options(&params);
    let page = scan_page(source, &opts, &known).await?;

    let count = page.events.len();
    Ok(Json(ScanResponse {
        events: page.events,
        count,
        next_page_token: page.next_page_token,
    }))
}

/// Report initial-sync progress for the user.
async fn sync_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<SyncStatusResponse>> {
    let row = state.sync_status.get_or_create(user.id()).await?;

    Ok(Json(SyncStatusResponse {
        is_syncing: row.is_syncing(),
        total_imported: row.total_imported,
    }))
}

/// Map query parameters onto scan options. Unparseable values fall back to
/// defaults rather than erroring: one year back, unbounded upper end, page
/// size 200, all statuses.
fn scan_options(params: &ScanParams) -> ScanOptions {
    let since = params
        .since
        .as_deref()
        .and_then(parse_day)
        .unwrap_or_else(|| Utc::now() - chrono::Duration::days(365));
    let until = params.until.as_deref().and_then(parse_day);

    let mut page_size = DEFAULT_PAGE_SIZE;
    if let Some(limit) = params.limit
        && limit > 0
        && limit <= MAX_PAGE_SIZE
    {
        page_size = limit;
    }

    ScanOptions {
        mode: params
            .only
            .as_deref()
            .map(ScanMode::from_param)
            .unwrap_or_default(),
        since: Some(since),
        until,
        page_size,
        page_token: params.cursor.clone().filter(|c| !c.is_empty()),
    }
}

/// Parses a `YYYY-MM-DD` day as midnight UTC.
fn parse_day(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
