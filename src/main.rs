//! Payhook payment webhook service.
//!
//! Main entry point. Loads configuration, connects the event store and serves
//! until CTRL+C or SIGTERM.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use payhook_api::{config::StorageBackend, AppState, Config};
use payhook_core::{
    storage::{memory::InMemoryEventStore, schema, Storage},
    EventStore,
};
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    info!("Starting Payhook webhook service");

    let config = Config::load()?;
    info!(
        database_url = %config.database_url_masked(),
        storage_backend = ?config.storage_backend,
        host = %config.host,
        port = config.port,
        signature_header = %config.signature_header,
        "Configuration loaded"
    );

    let addr = config.parse_server_addr()?;

    let pool = match config.storage_backend {
        StorageBackend::Postgres => {
            let pool = create_database_pool(&config).await?;
            info!("Database connection pool established");

            schema::ensure_schema(&pool).await.context("Failed to prepare database schema")?;
            info!("Database schema ready");
            Some(pool)
        },
        StorageBackend::Memory => {
            warn!("Using in-memory event store; events are lost on restart");
            None
        },
    };

    let store: Arc<dyn EventStore> = match &pool {
        Some(pool) => Arc::new(Storage::new(pool.clone())),
        None => Arc::new(InMemoryEventStore::new()),
    };

    let state = AppState::from_config(&config, store)?;

    info!(%addr, "Payhook is ready to receive webhooks");
    payhook_api::start_server(state, addr).await.context("Server failed")?;

    if let Some(pool) = pool {
        pool.close().await;
        info!("Database connections closed");
    }

    info!("Payhook shutdown complete");
    Ok(())
}

/// Initializes tracing with environment-based configuration.
fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,payhook=debug,tower_http=debug"))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
}

/// Creates the database connection pool with retry logic.
async fn create_database_pool(config: &Config) -> Result<sqlx::PgPool> {
    const MAX_RETRIES: u32 = 5;
    const RETRY_DELAY: Duration = Duration::from_secs(2);

    let mut retries = 0;

    loop {
        match PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connection_timeout))
            .idle_timeout(Duration::from_secs(config.database_idle_timeout))
            .max_lifetime(Duration::from_secs(config.database_max_lifetime))
            .connect(&config.database_url)
            .await
        {
            Ok(pool) => {
                sqlx::query("SELECT 1")
                    .execute(&pool)
                    .await
                    .context("Failed to verify database connection")?;

                return Ok(pool);
            },
            Err(e) if retries < MAX_RETRIES => {
                retries += 1;
                warn!(
                    attempt = retries,
                    max_retries = MAX_RETRIES,
                    error = %e,
                    "Database connection failed, retrying"
                );
                tokio::time::sleep(RETRY_DELAY).await;
            },
            Err(e) => {
                return Err(e).context("Failed to create database connection pool after retries");
            },
        }
    }
}
