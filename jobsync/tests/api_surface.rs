//! HTTP surface tests.
//!
//! Drive the assembled router with tower's `oneshot` against real
//! repositories and a scripted mailbox, and pin down response shapes the
//! frontend depends on.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use tempfile::TempDir;
use tower::ServiceExt;

use jobsync::api::routes::create_router;
use jobsync::api::server::AppState;
use jobsync::database::models::OAuthToken;
use jobsync::database::repositories::{
    QueueRepository, SqlxJobRecordRepository, SqlxQueueRepository, SqlxSyncStatusRepository,
    SqlxTokenRepository,
};
use jobsync::database::{DbPool, init_pool, run_migrations};
use jobsync::mailsource::{MailSource, MailSourceFactory, MessageMetadata, MessagePage};
use jobsync::vault::SecretBox;
use jobsync::{Error, Result};

const RAW_KEY: &str = "s3cr3t-key-32-bytes-long-okay!!!";

/// Single-page scripted mailbox for handler-level tests.
struct OnePageMailbox {
    page: MessagePage,
    messages: HashMap<String, MessageMetadata>,
}

#[async_trait]
impl MailSource for OnePageMailbox {
    async fn list_messages(
        &self,
        _query: &str,
        _page_size: i64,
        _page_token: Option<&str>,
    ) -> Result<MessagePage> {
        Ok(self.page.clone())
    }

    async fn get_message(&self, id: &str) -> Result<MessageMetadata> {
        self.messages
            .get(id)
            .cloned()
            .ok_or_else(|| Error::MailApi(format!("unscripted message: {id}")))
    }
}

struct FixedFactory {
    mailbox: Arc<OnePageMailbox>,
}

impl MailSourceFactory for FixedFactory {
    fn client_for(&self, _token: &OAuthToken) -> Result<Arc<dyn MailSource>> {
        Ok(self.mailbox.clone())
    }
}

struct Rig {
    _dir: TempDir,
    pool: DbPool,
    user_id: i64,
    queue: Arc<SqlxQueueRepository>,
    router: Router,
}

async fn rig_with_mailbox(mailbox: OnePageMailbox) -> Rig {
    let dir = TempDir::new().expect("temp dir");
    let db_path = dir.path().join("api.db");
    let db_url = format!(
        "sqlite:{}?mode=rwc",
        db_path.to_string_lossy().replace('\\', "/")
    );
    let pool = init_pool(&db_url).await.expect("Failed to create test pool");
    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    let now = chrono::Utc::now().to_rfc3339();
    let user_id: i64 = sqlx::query_scalar(
        "INSERT INTO users (email, created_at, updated_at) VALUES (?, ?, ?) RETURNING id",
    )
    .bind("api@test.dev")
    .bind(&now)
    .bind(&now)
    .fetch_one(&pool)
    .await
    .expect("Failed to seed user");

    let vault = Arc::new(SecretBox::new(RAW_KEY).unwrap());
    let queue = Arc::new(SqlxQueueRepository::new(pool.clone()));
    let state = AppState::new(
        pool.clone(),
        queue.clone(),
        Arc::new(SqlxTokenRepository::new(pool.clone(), vault)),
        Arc::new(SqlxJobRecordRepository::new(pool.clone())),
        Arc::new(SqlxSyncStatusRepository::new(pool.clone())),
        Arc::new(FixedFactory {
            mailbox: Arc::new(mailbox),
        }),
    );

    Rig {
        router: create_router(state),
        _dir: dir,
        pool,
        user_id,
        queue,
    }
}

async fn rig() -> Rig {
    rig_with_mailbox(OnePageMailbox {
        page: MessagePage::default(),
        messages: HashMap::new(),
    })
    .await
}

fn get(path: &str, user_id: Option<i64>) -> Request<Body> {
    let mut builder = Request::builder().uri(path);
    if let Some(id) = user_id {
        builder = builder.header("x-user-id", id.to_string());
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(path: &str, user_id: i64, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header("x-user-id", user_id.to_string())
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::http::Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_is_open_and_reports_database_state() {
    let rig = rig().await;

    let response = rig.router.clone().oneshot(get("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn mail_routes_reject_anonymous_requests() {
    let rig = rig().await;

    let response = rig
        .router
        .clone()
        .oneshot(get("/api/mail/status", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = json_body(response).await;
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn connect_status_disconnect_flow() {
    let rig = rig().await;

    // Nothing stored yet.
    let response = rig
        .router
        .clone()
        .oneshot(get("/api/mail/status", Some(rig.user_id)))
        .await
        .unwrap();
    assert_eq!(json_body(response).await["connected"], false);

    // Connect stores the credential and queues the initial import.
    let response = rig
        .router
        .clone()
        .oneshot(post_json(
            "/api/mail/connect",
            rig.user_id,
            serde_json::json!({"access_token": "ya29.abc", "refresh_token": "1//r"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "connected");
    assert_eq!(rig.queue.count_eligible().await.unwrap(), 1);

    let response = rig
        .router
        .clone()
        .oneshot(get("/api/mail/status", Some(rig.user_id)))
        .await
        .unwrap();
    assert_eq!(json_body(response).await["connected"], true);

    // Disconnect wipes it again.
    let response = rig
        .router
        .clone()
        .oneshot(post_json(
            "/api/mail/disconnect",
            rig.user_id,
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(json_body(response).await["status"], "disconnected");

    let response = rig
        .router
        .clone()
        .oneshot(get("/api/mail/status", Some(rig.user_id)))
        .await
        .unwrap();
    assert_eq!(json_body(response).await["connected"], false);
}

#[tokio::test]
async fn connect_rejects_a_blank_access_token() {
    let rig = rig().await;

    let response = rig
        .router
        .clone()
        .oneshot(post_json(
            "/api/mail/connect",
            rig.user_id,
            serde_json::json!({"access_token": "   "}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn scan_without_a_credential_is_unauthorized() {
    let rig = rig().await;

    let response = rig
        .router
        .clone()
        .oneshot(get("/api/mail/scan", Some(rig.user_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = json_body(response).await;
    assert_eq!(body["message"], "mail source not connected");
}

#[tokio::test]
async fn scan_returns_events_in_the_wire_shape() {
    let meta = |id: &str, subject: &str, ms: i64| MessageMetadata {
        id: id.to_string(),
        subject: subject.to_string(),
        from: "Acme Careers <careers@acme.example>".to_string(),
        snippet: "We received your application.".to_string(),
        internal_date_ms: Some(ms),
        date_header: None,
    };

    let mailbox = OnePageMailbox {
        page: MessagePage {
            ids: vec!["m-1".to_string(), "m-2".to_string(), "known-1".to_string()],
            next_page_token: Some("p2".to_string()),
        },
        messages: HashMap::from([
            (
                "m-1".to_string(),
                meta("m-1", "Your application to Initech", 1_750_000_000_000),
            ),
            (
                "m-2".to_string(),
                meta("m-2", "Thanks for applying", 1_750_100_000_000),
            ),
        ]),
    };
    let rig = rig_with_mailbox(mailbox).await;

    // Credential in place, plus one already-imported message.
    rig.router
        .clone()
        .oneshot(post_json(
            "/api/mail/connect",
            rig.user_id,
            serde_json::json!({"access_token": "ya29.abc"}),
        ))
        .await
        .unwrap();
    let now = chrono::Utc::now().to_rfc3339();
    sqlx::query(
        "INSERT INTO jobs (user_id, message_id, company, position, status, created_at, updated_at)
         VALUES (?, 'known-1', 'Acme', 'Engineer', 'applied', ?, ?)",
    )
    .bind(rig.user_id)
    .bind(&now)
    .bind(&now)
    .execute(&rig.pool)
    .await
    .unwrap();

    let response = rig
        .router
        .clone()
        .oneshot(get("/api/mail/scan?limit=50&only=all", Some(rig.user_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["nextPageToken"], "p2");

    let events = body["events"].as_array().unwrap();
    assert_eq!(events.len(), 2);
    // Newest first.
    assert_eq!(events[0]["messageId"], "m-2");
    assert_eq!(events[1]["messageId"], "m-1");
    assert_eq!(events[1]["company"], "Initech");
    assert_eq!(events[1]["status"], "applied");
    assert!(events[0]["appliedDate"].is_string());
    assert!(
        events[0]["link"]
            .as_str()
            .unwrap()
            .starts_with("https://mail.google.com/")
    );
}

#[tokio::test]
async fn sync_status_starts_empty() {
    let rig = rig().await;

    let response = rig
        .router
        .clone()
        .oneshot(get("/api/mail/sync-status", Some(rig.user_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["is_syncing"], false);
    assert_eq!(body["total_imported"], 0);
}
