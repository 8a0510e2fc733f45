//! Share management and link download handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use uuid::Uuid;

use filehub_core::error::AppError;
use filehub_entity::share::Share;
use filehub_service::NewShare;

use super::file::stream_response;
use crate::dto::request::{CreateShareRequest, PasswordQuery, validate};
use crate::dto::response::{ApiResponse, MessageResponse};
use crate::extractors::{AuthUser, MaybeAuthUser};
use crate::state::AppState;

/// POST /api/files/{id}/shares
pub async fn create_share(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(file_id): Path<Uuid>,
    Json(req): Json<CreateShareRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Share>>), AppError> {
    validate(&req)?;
    let share = state
        .share_service
        .create_share(
            &auth,
            file_id,
            NewShare {
                permission: req.permission,
                password: req.password,
                expires_at: req.expires_at,
                shared_with: req.shared_with,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(share))))
}

/// GET /api/files/{id}/shares
pub async fn list_shares(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(file_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<Share>>>, AppError> {
    let shares = state.share_service.list_shares(&auth, file_id).await?;
    Ok(Json(ApiResponse::ok(shares)))
}

/// DELETE /api/shares/{id}
pub async fn revoke_share(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, AppError> {
    state.share_service.revoke_share(&auth, id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Share revoked"))))
}

/// GET /api/shares/{id}/download?password=
///
/// Open to anonymous callers; the share itself must grant access.
pub async fn download(
    State(state): State<AppState>,
    requester: MaybeAuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<PasswordQuery>,
) -> Result<Response, AppError> {
    let download = state
        .download_service
        .download_via_share(requester.user_id(), id, query.password.as_deref())
        .await?;
    stream_response(download)
}
