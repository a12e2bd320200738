use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};

use nursery_api::auth::PasswordHasher;
use nursery_api::config::AppConfig;
use nursery_api::database::{DatabaseManager, NurseryStore, PgStore};
use nursery_api::storage::{BlobStore, LocalBlobStore};
use nursery_api::{app, logging, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, NURSERY_TOKEN_SECRET, etc.
    let _ = dotenvy::dotenv();
    logging::init_tracing();

    let config = AppConfig::from_env().context("invalid configuration")?;
    info!("Starting Nursery API in {:?} mode", config.environment);

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to the database")?;
    DatabaseManager::migrate(&pool)
        .await
        .context("failed to apply migrations")?;
    let store: Arc<dyn NurseryStore> = Arc::new(PgStore::new(pool.clone()));

    let blobs: Option<Arc<dyn BlobStore>> = match &config.blob.root {
        Some(root) => {
            let local = LocalBlobStore::open(root)
                .await
                .with_context(|| format!("failed to open blob store at {}", root.display()))?;
            info!("Blob store at {}", local.root().display());
            Some(Arc::new(local))
        }
        None => {
            warn!("BLOB_STORAGE_DIR not set; documents will be stored as metadata only");
            None
        }
    };

    let port = config.api.port;
    let demo = config.demo.clone();
    let state = AppState::new(config, store, blobs, PasswordHasher::new());

    if let Some(demo) = demo {
        let user = state
            .accounts
            .ensure_account(&demo.email, &demo.password, &demo.name)
            .await
            .context("failed to seed demo account")?;
        info!("Demo account ready ({})", user.id);
    }

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("Nursery API listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    DatabaseManager::close(pool).await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal, draining connections");
}
