use std::sync::Arc;

use dotenv::dotenv;
use invoice_manager_core::app::{cors_layer, create_router, AppState};
use invoice_manager_core::config::Config;
use invoice_manager_core::db;
use invoice_manager_core::store::{MemoryStore, PgStore, Store};
use tokio::signal;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Opens the configured store, applying migrations when PostgreSQL is used.
async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    match &config.database_url {
        Some(url) => {
            let pool = db::create_pool(url, config.max_connections)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;
            db::run_migrations(&pool).await?;
            info!("Using PostgreSQL store");
            Ok(Arc::new(PgStore::new(pool)))
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory store; data will not survive a restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        .add_directive(LevelFilter::INFO.into());

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();

    info!("Starting Invoice Manager server...");

    let config = Config::from_env()?;
    let store = open_store(&config).await?;

    let cors = cors_layer(&config.cors_origin)
        .map_err(|_| anyhow::anyhow!("Invalid CORS_ORIGIN: {}", config.cors_origin))?;
    let app = create_router(AppState::new(store), cors);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", address, e))?;

    info!("Server listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if signal::ctrl_c().await.is_ok() {
                info!("Received Ctrl+C, shutting down gracefully...");
            }
        })
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Invoice Manager server stopped");
    Ok(())
}
