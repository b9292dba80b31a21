use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use common::database::{DatabaseConfig, health_check, init_pool, run_migrations};
use journal::{
    AppState,
    config::{AppConfig, StorageBackend},
    create_router,
    repositories::{
        CredentialStore, EntryStore, MemoryEntryRepository, MemoryUserRepository,
        PgEntryRepository, PgUserRepository,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting journal service");

    let config = AppConfig::load()?;

    let (users, entries): (Arc<dyn CredentialStore>, Arc<dyn EntryStore>) =
        match config.storage_backend {
            StorageBackend::Postgres => {
                let db_config = DatabaseConfig::from_env()?;
                let pool = init_pool(&db_config).await?;

                // Check database connectivity
                if health_check(&pool).await? {
                    info!("Database connection successful");
                } else {
                    anyhow::bail!("Failed to connect to database");
                }

                run_migrations(&pool).await?;

                (
                    Arc::new(PgUserRepository::new(pool.clone())),
                    Arc::new(PgEntryRepository::new(pool)),
                )
            }
            StorageBackend::Memory => {
                warn!("Using in-memory storage; data is lost on shutdown");
                (
                    Arc::new(MemoryUserRepository::new()),
                    Arc::new(MemoryEntryRepository::new()),
                )
            }
        };

    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let address = config.bind_address();
    let app = create_router(AppState::new(config, users, entries));

    let listener = TcpListener::bind(&address).await?;
    info!("Journal service listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Journal service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
}
