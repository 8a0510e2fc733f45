//! Health check handler.

use axum::Json;
use axum::extract::State;

use crate::dto::response::{ApiResponse, HealthResponse};
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let storage = match state.blobs.health_check().await {
        Ok(true) => "available",
        Ok(false) | Err(_) => "unavailable",
    };

    let database = match &state.database {
        Some(db) => match db.health_check().await {
            Ok(true) => "available",
            Ok(false) | Err(_) => "unavailable",
        },
        None => "in-memory",
    };

    Json(ApiResponse::ok(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
        storage: storage.to_string(),
    }))
}
