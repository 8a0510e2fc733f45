//! Activity feed handler.

use axum::Json;
use axum::extract::{Query, State};

use filehub_core::error::AppError;
use filehub_entity::activity::Activity;

use crate::dto::request::LimitQuery;
use crate::dto::response::ApiResponse;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/activities?limit=
pub async fn recent(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<Activity>>>, AppError> {
    let feed = state.activity_service.recent(&auth, query.limit).await?;
    Ok(Json(ApiResponse::ok(feed)))
}
