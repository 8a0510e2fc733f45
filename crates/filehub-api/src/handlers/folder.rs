//! Folder creation and breadcrumb handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use uuid::Uuid;

use filehub_core::error::AppError;
use filehub_entity::node::{Crumb, FileNode};

use crate::dto::request::{CreateFolderRequest, validate};
use crate::dto::response::ApiResponse;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/files/folder
pub async fn create_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateFolderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<FileNode>>), AppError> {
    validate(&req)?;
    let folder = state
        .folder_service
        .create_folder(&auth, &req.name, req.parent_id)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(folder))))
}

/// GET /api/files/{id}/breadcrumb
pub async fn breadcrumb(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<Crumb>>>, AppError> {
    let path = state.tree_service.breadcrumb(&auth, id).await?;
    Ok(Json(ApiResponse::ok(path)))
}
