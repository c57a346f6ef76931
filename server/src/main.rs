use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use course_shop_server::{
    AppState,
    auth::TokenVerifier,
    config::{Config, StoreBackend},
    routes,
    store::{self, Store, memory::MemoryStore, mongo::MongoStore},
};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let config = Config::from_env()?;

    let mut client = None;
    let store: Arc<dyn Store> = match config.store_backend {
        StoreBackend::Mongo => {
            let mongo = store::create_client(&config.mongodb_uri).await?;
            let db = store::get_database(&mongo, &config.database_name);
            tracing::info!("Using MongoDB database '{}'", config.database_name);
            let mongo_store = MongoStore::new(db);
            mongo_store
                .ensure_indexes()
                .await
                .context("Failed to create per-user indexes")?;
            client = Some(mongo);
            Arc::new(mongo_store)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on exit");
            Arc::new(MemoryStore::default())
        }
    };

    let state = AppState {
        store,
        verifier: Arc::new(TokenVerifier::new(&config.jwt_secret)),
    };
    let app = routes::app(state, config.cors_allow_any);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(client) = client {
        client.shutdown().await;
        tracing::info!("MongoDB client shut down");
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
