//! Encrypted OAuth token repository.
//!
//! Tokens round-trip through the vault on every save and get: only sealed
//! blobs ever hit the database. A vault failure on read surfaces as its own
//! error so callers can tell "never connected" apart from "stored credential
//! is corrupted or the key changed."

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::database::models::{EmailTokenRow, OAuthToken};
use crate::vault::SecretBox;
use crate::{Error, Result};

/// Per-(user, provider) credential storage.
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Seals the token's secrets and upserts the row for (user, provider).
    async fn save(&self, user_id: i64, provider: &str, token: &OAuthToken) -> Result<()>;

    /// Loads and opens the stored token. Absent rows are a not-found error.
    async fn get(&self, user_id: i64, provider: &str) -> Result<OAuthToken>;

    /// Removes the stored token. Deleting a missing row is not an error.
    async fn delete(&self, user_id: i64, provider: &str) -> Result<()>;
}

/// SQLx implementation of TokenRepository.
pub struct SqlxTokenRepository {
    pool: SqlitePool,
    vault: Arc<SecretBox>,
}

impl SqlxTokenRepository {
    pub fn new(pool: SqlitePool, vault: Arc<SecretBox>) -> Self {
        Self { pool, vault }
    }
}

#[async_trait]
impl TokenRepository for SqlxTokenRepository {
    async fn save(&self, user_id: i64, provider: &str, token: &OAuthToken) -> Result<()> {
        let access_enc = self.vault.seal(token.access_token.as_bytes())?;
        let refresh_enc = match &token.refresh_token {
            Some(refresh) => Some(self.vault.seal(refresh.as_bytes())?),
            None => None,
        };
        let expiry = token.expiry.map(|t| t.to_rfc3339());
        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO email_tokens (user_id, provider, access_token_enc, refresh_token_enc, expiry, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (user_id, provider) DO UPDATE SET
                access_token_enc = excluded.access_token_enc,
                refresh_token_enc = excluded.refresh_token_enc,
                expiry = excluded.expiry,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(provider)
        .bind(&access_enc)
        .bind(&refresh_enc)
        .bind(&expiry)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, user_id: i64, provider: &str) -> Result<OAuthToken> {
        let row = sqlx::query_as::<_, EmailTokenRow>(
            "SELECT * FROM email_tokens WHERE user_id = ? AND provider = ?",
        )
        .bind(user_id)
        .bind(provider)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::not_found("EmailToken", format!("{user_id}/{provider}")))?;

        let access_token = utf8_secret(self.vault.open(&row.access_token_enc)?)?;
        let refresh_token = match &row.refresh_token_enc {
            Some(sealed) => Some(utf8_secret(self.vault.open(sealed)?)?),
            None => None,
        };
        let expiry = row
            .expiry
            .as_deref()
            .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&chrono::Utc));

        Ok(OAuthToken {
            access_token,
            refresh_token,
            expiry,
        })
    }

    async fn delete(&self, user_id: i64, provider: &str) -> Result<()> {
        sqlx::query("DELETE FROM email_tokens WHERE user_id = ? AND provider = ?")
            .bind(user_id)
            .bind(provider)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn utf8_secret(plain: Vec<u8>) -> Result<String> {
    String::from_utf8(plain)
        .map_err(|_| Error::Other("stored secret did not decode to valid UTF-8".to_string()))
}
