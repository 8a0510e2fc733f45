//! Storage usage handler.

use axum::Json;
use axum::extract::State;

use filehub_core::error::AppError;
use filehub_service::StorageUsage;

use crate::dto::response::ApiResponse;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/storage/usage
pub async fn usage(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<StorageUsage>>, AppError> {
    let usage = state.quota_service.usage(&auth).await?;
    Ok(Json(ApiResponse::ok(usage)))
}
