//! Route definitions for the FileHub HTTP API.
//!
//! All routes are mounted under `/api` and receive `AppState` through Axum's
//! `State` extractor.

use std::time::Duration;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, post},
};
use tower_http::compression::CompressionLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Room for multipart boundaries and headers on top of the file bytes.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let max_body = usize::try_from(state.config.storage.max_request_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);
    let timeout = Duration::from_secs(state.config.server.request_timeout_seconds);
    let cors = middleware::cors::build_cors_layer(&state.config.server.cors);

    let api_routes = Router::new()
        .merge(auth_routes())
        .merge(file_routes())
        .merge(share_routes())
        .merge(storage_routes())
        .merge(activity_routes())
        .merge(health_routes());

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(max_body))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Current user
fn auth_routes() -> Router<AppState> {
    Router::new().route("/auth/user", get(handlers::auth::current_user))
}

/// File tree, trash lifecycle, upload and download
fn file_routes() -> Router<AppState> {
    Router::new()
        .route("/files", get(handlers::file::list_files))
        .route("/files/starred", get(handlers::file::starred))
        .route("/files/recent", get(handlers::file::recent))
        .route("/files/trash", get(handlers::file::trash))
        .route("/files/shared", get(handlers::file::shared))
        .route("/files/trash/empty", delete(handlers::file::empty_trash))
        .route("/files/upload", post(handlers::file::upload))
        .route("/files/folder", post(handlers::folder::create_folder))
        .route(
            "/files/{id}",
            get(handlers::file::get_file)
                .patch(handlers::file::update_file)
                .delete(handlers::file::move_to_trash),
        )
        .route("/files/{id}/breadcrumb", get(handlers::folder::breadcrumb))
        .route("/files/{id}/restore", post(handlers::file::restore))
        .route(
            "/files/{id}/permanent",
            delete(handlers::file::delete_permanently),
        )
        .route("/files/{id}/download", get(handlers::file::download))
        .route(
            "/files/{id}/shares",
            get(handlers::share::list_shares).post(handlers::share::create_share),
        )
}

/// Share revocation and link downloads
fn share_routes() -> Router<AppState> {
    Router::new()
        .route("/shares/{id}", delete(handlers::share::revoke_share))
        .route("/shares/{id}/download", get(handlers::share::download))
}

/// Quota usage
fn storage_routes() -> Router<AppState> {
    Router::new().route("/storage/usage", get(handlers::storage::usage))
}

/// Activity feed
fn activity_routes() -> Router<AppState> {
    Router::new().route("/activities", get(handlers::activity::recent))
}

/// Liveness
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
