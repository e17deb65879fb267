use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jobsync::api::server::{ApiServer, ApiServerConfig, AppState};
use jobsync::database;
use jobsync::database::repositories::{
    SqlxJobRecordRepository, SqlxQueueRepository, SqlxSyncStatusRepository, SqlxTokenRepository,
};
use jobsync::mailsource::GmailSourceFactory;
use jobsync::vault::SecretBox;
use jobsync::worker::{SyncWorker, WorkerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jobsync=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize database
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite:jobsync.db?mode=rwc".to_string());

    let pool = database::init_pool(&database_url).await?;
    database::run_migrations(&pool).await?;

    // The vault key is mandatory. Refusing to start beats sealing
    // credentials under a default key.
    let raw_key = std::env::var("ENCRYPTION_KEY")
        .map_err(|_| anyhow::anyhow!("ENCRYPTION_KEY must be set"))?;
    let vault = Arc::new(SecretBox::new(&raw_key)?);

    let queue = Arc::new(SqlxQueueRepository::new(pool.clone()));
    let tokens = Arc::new(SqlxTokenRepository::new(pool.clone(), vault));
    let records = Arc::new(SqlxJobRecordRepository::new(pool.clone()));
    let sync_status = Arc::new(SqlxSyncStatusRepository::new(pool.clone()));
    let source_factory = Arc::new(GmailSourceFactory::new());

    let state = AppState::new(
        pool,
        queue.clone(),
        tokens.clone(),
        records.clone(),
        sync_status.clone(),
        source_factory.clone(),
    );

    let server = ApiServer::new(ApiServerConfig::from_env_or_default(), state);
    let cancel = server.cancel_token();

    let worker = SyncWorker::new(
        queue,
        tokens,
        records,
        sync_status,
        source_factory,
        WorkerConfig::from_env(),
        cancel.clone(),
    );
    let worker_handle = tokio::spawn(worker.run());

    // One token drains both halves: the server stops accepting and the
    // worker finishes its current job before exiting.
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        cancel.cancel();
    });

    server.run().await?;
    worker_handle.await?;

    tracing::info!("jobsync stopped");
    Ok(())
}
