//! Gmail REST implementation of the mail source.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{MailSource, MailSourceFactory, MessageMetadata, MessagePage};
use crate::database::models::OAuthToken;
use crate::{Error, Result};

/// Provider tag for Gmail-backed credentials and events.
pub const PROVIDER_GMAIL: &str = "gmail";

/// Prefix for deep links into the Gmail web UI.
pub const GMAIL_LINK_PREFIX: &str = "https://mail.google.com/mail/u/0/#all/";

const BASE_URL: &str = "https://gmail.googleapis.com/gmail/v1";

/// Gmail client bound to one user's access token.
pub struct GmailSource {
    client: Client,
    access_token: String,
}

impl GmailSource {
    pub fn new(client: Client, access_token: impl Into<String>) -> Self {
        Self {
            client,
            access_token: access_token.into(),
        }
    }
}

#[async_trait]
impl MailSource for GmailSource {
    async fn list_messages(
        &self,
        query: &str,
        page_size: i64,
        page_token: Option<&str>,
    ) -> Result<MessagePage> {
        let url = format!("{BASE_URL}/users/me/messages");
        let max_results = page_size.to_string();
        let mut request = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[("q", query), ("maxResults", max_results.as_str())]);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(Error::MailApi(format!(
                "message list failed with status {}",
                response.status()
            )));
        }

        let body: ListResponse = response.json().await?;
        Ok(MessagePage {
            ids: body
                .messages
                .unwrap_or_default()
                .into_iter()
                .map(|m| m.id)
                .collect(),
            next_page_token: body.next_page_token.filter(|t| !t.is_empty()),
        })
    }

    async fn get_message(&self, id: &str) -> Result<MessageMetadata> {
        let url = format!("{BASE_URL}/users/me/messages/{id}");
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[
                ("format", "metadata"),
                ("metadataHeaders", "Subject"),
                ("metadataHeaders", "From"),
                ("metadataHeaders", "Date"),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Error::MailApi(format!(
                "metadata fetch for {id} failed with status {}",
                response.status()
            )));
        }

        let body: MessageResponse = response.json().await?;
        Ok(body.into_metadata())
    }
}

/// Builds Gmail clients from decrypted credentials, sharing one underlying
/// HTTP connection pool.
#[derive(Debug, Clone, Default)]
pub struct GmailSourceFactory {
    client: Client,
}

impl GmailSourceFactory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MailSourceFactory for GmailSourceFactory {
    fn client_for(&self, token: &OAuthToken) -> Result<Arc<dyn MailSource>> {
        if token.access_token.is_empty() {
            return Err(Error::validation("access token is empty"));
        }
        Ok(Arc::new(GmailSource::new(
            self.client.clone(),
            &token.access_token,
        )))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    messages: Option<Vec<MessageRef>>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageResponse {
    id: String,
    #[serde(default)]
    snippet: String,
    /// Unix milliseconds as a decimal string
    internal_date: Option<String>,
    payload: Option<MessagePayload>,
}

#[derive(Debug, Deserialize)]
struct MessagePayload {
    #[serde(default)]
    headers: Vec<Header>,
}

#[derive(Debug, Deserialize)]
struct Header {
    name: String,
    value: String,
}

impl MessageResponse {
    fn into_metadata(self) -> MessageMetadata {
        let mut meta = MessageMetadata {
            id: self.id,
            snippet: self.snippet,
            internal_date_ms: self.internal_date.and_then(|ms| ms.parse::<i64>().ok()),
            ..Default::default()
        };
        for header in self.payload.map(|p| p.headers).unwrap_or_default() {
            match header.name.as_str() {
                "Subject" => meta.subject = header.value,
                "From" => meta.from = header.value,
                "Date" => meta.date_header = Some(header.value),
                _ => {}
            }
        }
        meta
    }
}
