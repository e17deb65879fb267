//! Mail source abstraction.
//!
//! A [`MailSource`] is an authorized, read-only view of one user's mailbox:
//! paged message-id listing plus per-message metadata fetch. The scanner and
//! the sync worker only ever talk to these traits; [`gmail::GmailSource`] is
//! the production implementation.

pub mod gmail;

pub use gmail::{GMAIL_LINK_PREFIX, GmailSource, GmailSourceFactory, PROVIDER_GMAIL};

use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;
use crate::database::models::OAuthToken;

/// One page of message ids plus the provider's continuation token.
#[derive(Debug, Clone, Default)]
pub struct MessagePage {
    pub ids: Vec<String>,
    /// Opaque continuation token; `None` once iteration is exhausted.
    pub next_page_token: Option<String>,
}

/// The metadata extraction needs for a single message.
#[derive(Debug, Clone, Default)]
pub struct MessageMetadata {
    pub id: String,
    pub subject: String,
    pub from: String,
    pub snippet: String,
    /// Provider-reported receive time in Unix milliseconds, when present
    pub internal_date_ms: Option<i64>,
    /// RFC2822 Date header, used when the provider gives no receive time
    pub date_header: Option<String>,
}

/// Read access to one user's mailbox.
#[async_trait]
pub trait MailSource: Send + Sync {
    /// Lists message ids matching `query`, at most `page_size` per page.
    async fn list_messages(
        &self,
        query: &str,
        page_size: i64,
        page_token: Option<&str>,
    ) -> Result<MessagePage>;

    /// Fetches the metadata headers for one message.
    async fn get_message(&self, id: &str) -> Result<MessageMetadata>;
}

/// Builds an authorized [`MailSource`] from a decrypted credential.
///
/// Clients are rebuilt per call; caching bound clients is an optimization
/// callers must not rely on.
pub trait MailSourceFactory: Send + Sync {
    fn client_for(&self, token: &OAuthToken) -> Result<Arc<dyn MailSource>>;
}
