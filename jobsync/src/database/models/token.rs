//! OAuth token models.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A decrypted OAuth token as handed to mail-source clients.
#[derive(Debug, Clone)]
pub struct OAuthToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expiry: Option<DateTime<Utc>>,
}

/// Raw `email_tokens` row. Token columns hold vault-sealed blobs and never
/// leave the repository in this form.
#[derive(Debug, FromRow)]
pub struct EmailTokenRow {
    pub id: i64,
    pub user_id: i64,
    pub provider: String,
    pub access_token_enc: Vec<u8>,
    pub refresh_token_enc: Option<Vec<u8>>,
    /// RFC3339 expiry, if the provider reported one
    pub expiry: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}
