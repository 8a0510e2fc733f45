//! Application builder: wires stores, blob storage and services into an Axum
//! app and serves it.

use std::sync::Arc;

use axum::Router;
use tracing::{error, info};

use filehub_core::config::AppConfig;
use filehub_core::error::{AppError, ErrorKind};
use filehub_database::DatabasePool;
use filehub_storage::{BlobStore, LocalStorageProvider};

use crate::router::build_router;
use crate::state::{AppState, Stores};

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    build_router(state)
}

/// Connects to PostgreSQL, prepares the blob root and wires the services.
pub async fn build_state(config: AppConfig) -> Result<AppState, AppError> {
    let db = DatabasePool::prepare(&config.database).await?;
    let stores = Stores::from(db.repositories());

    info!(root = %config.storage.local.root_path, "Initializing local blob storage");
    let provider = LocalStorageProvider::new(&config.storage.local.root_path).await?;
    let blobs = BlobStore::new(Arc::new(provider));

    Ok(AppState::new(config, stores, blobs).with_database(db))
}

/// Runs the FileHub server until Ctrl+C.
pub async fn run_server(config: AppConfig) -> Result<(), AppError> {
    info!("Starting FileHub server...");

    let addr = config.server.bind_address();
    let state = build_state(config).await?;
    let database = state.database.clone();
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        AppError::with_source(ErrorKind::Internal, format!("Failed to bind {addr}"), e)
    })?;
    info!(%addr, "FileHub server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Internal, "Server error", e))?;

    if let Some(db) = database {
        db.close().await;
    }
    info!("FileHub server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
