//! Mailbox scanning pipeline.
//!
//! A [`scan_page`] call makes one provider round trip: it lists message ids
//! for the built search query, skips ids the caller already imported, then
//! fetches metadata for the rest under a concurrency cap and maps whatever
//! parsed into [`JobEvent`]s sorted newest first. Callers drive pagination
//! with the returned continuation token.

mod query;

pub use query::{
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, ScanMode, build_search_query, clamp_page_size,
};

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use jobevent::{JobEvent, classify_status, extract_company, extract_title};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::Result;
use crate::mailsource::{GMAIL_LINK_PREFIX, MailSource, MessageMetadata, PROVIDER_GMAIL};

/// Cap on simultaneous metadata fetches within one page.
pub const MAX_CONCURRENT_FETCHES: usize = 16;

/// Options for one scan page.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    pub mode: ScanMode,
    /// Inclusive lower bound on receive date.
    pub since: Option<DateTime<Utc>>,
    /// Inclusive upper bound on receive date.
    pub until: Option<DateTime<Utc>>,
    /// Requested ids per listing call, clamped into the accepted range.
    pub page_size: i64,
    /// Continuation token from the previous page.
    pub page_token: Option<String>,
}

/// One page of recognized events plus the continuation token.
#[derive(Debug, Clone)]
pub struct ScannedPage {
    /// Events sorted newest first. Messages whose metadata fetch failed are
    /// dropped, so this can be shorter than the listed page.
    pub events: Vec<JobEvent>,
    /// Token for the next page, `None` once the listing is exhausted.
    pub next_page_token: Option<String>,
}

/// Scans a single page of the mailbox.
///
/// Ids in `known_ids` are filtered out before any metadata fetch is issued.
/// A failed metadata fetch drops that message from the page instead of
/// failing the whole scan; only the listing call itself is fatal.
pub async fn scan_page(
    source: Arc<dyn MailSource>,
    opts: &ScanOptions,
    known_ids: &HashSet<String>,
) -> Result<ScannedPage> {
    let search = build_search_query(opts.mode, opts.since, opts.until);
    let page_size = clamp_page_size(opts.page_size);

    let page = source
        .list_messages(&search, page_size, opts.page_token.as_deref())
        .await?;

    let listed = page.ids.len();
    let fresh: Vec<String> = page
        .ids
        .into_iter()
        .filter(|id| !known_ids.contains(id))
        .collect();

    debug!(
        "Listed {} message ids, {} not imported before",
        listed,
        fresh.len()
    );

    let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_FETCHES));
    let mut fetches: JoinSet<(usize, Option<MessageMetadata>)> = JoinSet::new();

    for (idx, id) in fresh.into_iter().enumerate() {
        let source = source.clone();
        let semaphore = semaphore.clone();
        fetches.spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return (idx, None),
            };
            match source.get_message(&id).await {
                Ok(meta) => (idx, Some(meta)),
                Err(e) => {
                    warn!("Skipping message {}: metadata fetch failed: {}", id, e);
                    (idx, None)
                }
            }
        });
    }

    let mut fetched: Vec<(usize, MessageMetadata)> = Vec::with_capacity(fetches.len());
    while let Some(joined) = fetches.join_next().await {
        match joined {
            Ok((idx, Some(meta))) => fetched.push((idx, meta)),
            Ok((_, None)) => {}
            Err(e) => warn!(error = %e, "Metadata fetch task failed"),
        }
    }

    // Fetch tasks finish in arbitrary order; restore listing order first so
    // the date sort below keeps the provider's ordering for equal dates.
    fetched.sort_by_key(|(idx, _)| *idx);

    let mut events: Vec<JobEvent> = fetched
        .into_iter()
        .map(|(_, meta)| build_event(meta))
        .collect();

    // Newest first; undated events sink to the end.
    events.sort_by(|a, b| b.applied_date.cmp(&a.applied_date));

    Ok(ScannedPage {
        events,
        next_page_token: page.next_page_token,
    })
}

fn build_event(meta: MessageMetadata) -> JobEvent {
    let status = classify_status(&meta.subject, &meta.snippet);
    let company = extract_company(&meta.subject, &meta.from);
    let title = extract_title(&meta.subject);
    let applied_date = received_at(&meta);
    let link = format!("{}{}", GMAIL_LINK_PREFIX, meta.id);

    JobEvent {
        message_id: meta.id,
        subject: meta.subject,
        snippet: meta.snippet,
        company,
        title,
        status,
        applied_date,
        source: PROVIDER_GMAIL.to_string(),
        link,
    }
}

/// Receive time of a message: the provider's millisecond timestamp when it is
/// a positive value, otherwise the RFC 2822 Date header.
fn received_at(meta: &MessageMetadata) -> Option<DateTime<Utc>> {
    if let Some(ms) = meta.internal_date_ms
        && ms > 0
        && let Some(at) = DateTime::from_timestamp_millis(ms)
    {
        return Some(at);
    }
    meta.date_header
        .as_deref()
        .and_then(|raw| DateTime::parse_from_rfc2822(raw).ok())
        .map(|at| at.with_timezone(&Utc))
}
