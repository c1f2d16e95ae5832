//! # courier-server
//!
//! Relay server for courier direct messages.
//!
//! This binary provides:
//! - **WebSocket relay**: one persistent channel per identity; each inbound
//!   event is validated, durably logged, acked to the sender, and forwarded
//!   live when the receiver is connected
//! - **Message history** with backward pagination over SQLite
//! - **Friendship graph**: request/accept/unfriend plus derived pairwise
//!   status and identity search
//! - **Presence records** and recent-chat bookmarks
//! - **Media blob storage** for data-URI payloads
//! - **REST API** (axum) consumed by the auth/front-end layer

mod api;
mod blob_store;
mod config;
mod error;
mod registry;
mod relay;

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use courier_store::Database;

use crate::api::AppState;
use crate::blob_store::BlobStore;
use crate::config::ServerConfig;
use crate::registry::ConnectionRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,courier_server=debug")),
        )
        .init();

    info!("Starting courier relay server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------

    // SQLite store (runs migrations on open)
    let db = match &config.db_path {
        Some(path) => Database::open_at(path)?,
        None => Database::new()?,
    };
    let db = Arc::new(Mutex::new(db));

    // Media blob store (creates directory if missing)
    let blob_store = Arc::new(
        BlobStore::new(config.media_storage_path.clone(), config.max_media_size).await?,
    );

    // Identity -> live channel map, shared by all relay channels
    let registry = ConnectionRegistry::new();

    let state = AppState {
        db,
        registry,
        blob_store,
    };

    // -----------------------------------------------------------------------
    // 4. Run the HTTP/WebSocket server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(state, config.http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
