//! Background sync worker.
//!
//! One polling loop per process: claim the next queue item, drive it to a
//! terminal state, sleep, repeat. Any number of worker processes can share
//! the same database; the claim statement in
//! [`QueueRepository`](crate::database::repositories::QueueRepository)
//! guarantees each item is handed to exactly one of them.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::database::models::{ImportOutcome, JobKind, NewJobRecord, QueueJob};
use crate::database::repositories::{
    JobRecordRepository, QueueRepository, SyncStatusRepository, TokenRepository,
};
use crate::error::{Error, Result};
use crate::mailsource::{MailSourceFactory, PROVIDER_GMAIL};
use crate::scanner::{ScanMode, ScanOptions, scan_page};

/// Tunables for the sync worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// How often the queue is polled for claimable items.
    pub poll_interval: Duration,
    /// Message ids listed per provider page during a sync run.
    pub page_size: i64,
    /// How far back an initial sync reaches.
    pub scan_window_days: i64,
    /// Pause between provider pages within one sync run.
    pub page_pause: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            page_size: 100,
            scan_window_days: 365,
            page_pause: Duration::from_millis(100),
        }
    }
}

impl WorkerConfig {
    /// Defaults, with the poll interval overridable through
    /// `WORKER_POLL_SECS`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(secs) = std::env::var("WORKER_POLL_SECS")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
        {
            config.poll_interval = Duration::from_secs(secs);
        }
        config
    }
}

/// Polls the queue and executes claimed items.
pub struct SyncWorker {
    queue: Arc<dyn QueueRepository>,
    tokens: Arc<dyn TokenRepository>,
    records: Arc<dyn JobRecordRepository>,
    sync_status: Arc<dyn SyncStatusRepository>,
    source_factory: Arc<dyn MailSourceFactory>,
    config: WorkerConfig,
    cancel: CancellationToken,
}

impl SyncWorker {
    pub fn new(
        queue: Arc<dyn QueueRepository>,
        tokens: Arc<dyn TokenRepository>,
        records: Arc<dyn JobRecordRepository>,
        sync_status: Arc<dyn SyncStatusRepository>,
        source_factory: Arc<dyn MailSourceFactory>,
        config: WorkerConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            queue,
            tokens,
            records,
            sync_status,
            source_factory,
            config,
            cancel,
        }
    }

    /// Runs the polling loop until the cancellation token fires.
    pub async fn run(self) {
        info!(
            "Sync worker started, polling every {:?}",
            self.config.poll_interval
        );

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("Sync worker stopped");
                    break;
                }
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }

            if let Err(e) = self.tick().await {
                error!("Queue poll failed: {}", e);
            }
        }
    }

    /// One poll tick: claims at most one item and drives it to a terminal
    /// state. Returns whether an item was claimed.
    pub async fn tick(&self) -> Result<bool> {
        let Some(job) = self.queue.claim_next().await? else {
            return Ok(false);
        };

        info!(
            "Processing queue item {} ({}) for user {}, attempt {}",
            job.id, job.job_type, job.user_id, job.attempts
        );

        match self.dispatch(&job).await {
            Ok(()) => self.queue.mark_completed(job.id).await?,
            Err(e) => {
                error!("Queue item {} failed: {}", job.id, e);
                self.queue.mark_failed(job.id, &e.to_string()).await?;
            }
        }

        Ok(true)
    }

    async fn dispatch(&self, job: &QueueJob) -> Result<()> {
        match JobKind::parse(&job.job_type) {
            Some(JobKind::InitialSync) => {
                let imported = self.run_initial_sync(job.user_id).await?;
                info!(
                    "Initial sync for user {} imported {} records",
                    job.user_id, imported
                );
                Ok(())
            }
            None => Err(Error::validation(format!(
                "unknown job type: {}",
                job.job_type
            ))),
        }
    }

    /// Walks every page of the scan window and imports events not seen
    /// before. Returns the number of records created.
    async fn run_initial_sync(&self, user_id: i64) -> Result<i64> {
        let token = self.tokens.get(user_id, PROVIDER_GMAIL).await?;
        let source = self.source_factory.client_for(&token)?;

        self.sync_status.get_or_create(user_id).await?;
        self.sync_status.mark_started(user_id).await?;

        // Newly imported ids fold into the dedup set so later pages skip them.
        let mut known = self.records.list_message_ids(user_id).await?;

        let until = Utc::now();
        let since = until - chrono::Duration::days(self.config.scan_window_days);
        let mut opts = ScanOptions {
            mode: ScanMode::All,
            since: Some(since),
            until: Some(until),
            page_size: self.config.page_size,
            page_token: None,
        };

        let mut imported: i64 = 0;

        loop {
            let page = scan_page(source.clone(), &opts, &known).await?;

            for event in &page.events {
                let record = NewJobRecord::from_event(user_id, event);
                match self.records.create(&record).await? {
                    ImportOutcome::Created(_) => {
                        imported += 1;
                        known.insert(event.message_id.clone());
                    }
                    ImportOutcome::Duplicate => {
                        debug!("Message {} already imported", event.message_id);
                    }
                }
            }

            match page.next_page_token {
                Some(cursor) => {
                    self.sync_status
                        .update_last_cursor(user_id, &cursor)
                        .await?;
                    opts.page_token = Some(cursor);
                    tokio::time::sleep(self.config.page_pause).await;
                }
                None => break,
            }
        }

        self.sync_status.mark_completed(user_id, imported).await?;

        Ok(imported)
    }
}
