//! File tree, upload and download handlers.

use axum::Json;
use axum::body::Body;
use axum::extract::{Multipart, Path, Query, State};
use axum::extract::multipart::MultipartError;
use axum::http::{StatusCode, header};
use axum::response::Response;
use uuid::Uuid;

use filehub_core::error::AppError;
use filehub_entity::node::FileNode;
use filehub_service::{Download, EmptyTrashReport, NodePatch, UploadFile};

use crate::dto::request::{
    LimitQuery, ListFilesQuery, PasswordQuery, UpdateNodeRequest, validate,
};
use crate::dto::response::{ApiResponse, FolderListing};
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/files?folderId=
pub async fn list_files(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListFilesQuery>,
) -> Result<Json<ApiResponse<FolderListing>>, AppError> {
    let files = state
        .file_service
        .list_children(&auth, query.folder_id)
        .await?;
    let breadcrumb = match query.folder_id {
        Some(id) => state.tree_service.breadcrumb(&auth, id).await?,
        None => Vec::new(),
    };
    Ok(Json(ApiResponse::ok(FolderListing { files, breadcrumb })))
}

/// GET /api/files/starred
pub async fn starred(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<FileNode>>>, AppError> {
    Ok(Json(ApiResponse::ok(state.file_service.starred(&auth).await?)))
}

/// GET /api/files/recent?limit=
pub async fn recent(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<FileNode>>>, AppError> {
    let files = state.file_service.recent(&auth, query.limit).await?;
    Ok(Json(ApiResponse::ok(files)))
}

/// GET /api/files/trash
pub async fn trash(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<FileNode>>>, AppError> {
    Ok(Json(ApiResponse::ok(state.file_service.trashed(&auth).await?)))
}

/// GET /api/files/shared
pub async fn shared(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<FileNode>>>, AppError> {
    let files = state.file_service.shared_with_me(&auth).await?;
    Ok(Json(ApiResponse::ok(files)))
}

/// GET /api/files/{id}
pub async fn get_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<FileNode>>, AppError> {
    let node = state.file_service.get_node(&auth, id).await?;
    Ok(Json(ApiResponse::ok(node)))
}

/// PATCH /api/files/{id}
pub async fn update_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateNodeRequest>,
) -> Result<Json<ApiResponse<FileNode>>, AppError> {
    validate(&req)?;
    let patch = NodePatch {
        name: req.name,
        is_starred: req.is_starred,
        parent_id: req.parent_id,
    };
    let node = state.file_service.update(&auth, id, patch).await?;
    Ok(Json(ApiResponse::ok(node)))
}

/// DELETE /api/files/{id}
pub async fn move_to_trash(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<FileNode>>, AppError> {
    let node = state.file_service.move_to_trash(&auth, id).await?;
    Ok(Json(ApiResponse::ok(node)))
}

/// POST /api/files/{id}/restore
pub async fn restore(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<FileNode>>, AppError> {
    let node = state.file_service.restore_from_trash(&auth, id).await?;
    Ok(Json(ApiResponse::ok(node)))
}

/// DELETE /api/files/{id}/permanent
///
/// Folders with live children are refused; empty the trash to cascade.
pub async fn delete_permanently(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<FileNode>>, AppError> {
    let node = state.file_service.delete_permanently(&auth, id).await?;
    Ok(Json(ApiResponse::ok(node)))
}

/// DELETE /api/files/trash/empty
pub async fn empty_trash(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<EmptyTrashReport>>, AppError> {
    let report = state.file_service.empty_trash(&auth).await?;
    Ok(Json(ApiResponse::ok(report)))
}

/// POST /api/files/upload: multipart `files` (repeated) and optional `parentId`.
pub async fn upload(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<Vec<FileNode>>>), AppError> {
    let mut parent_id: Option<Uuid> = None;
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name().unwrap_or("") {
            "parentId" => {
                let text = field.text().await.map_err(multipart_error)?;
                let text = text.trim();
                if !text.is_empty() && text != "null" {
                    parent_id = Some(
                        Uuid::parse_str(text)
                            .map_err(|_| AppError::validation("Invalid parentId"))?,
                    );
                }
            }
            "files" => {
                let name = field
                    .file_name()
                    .map(String::from)
                    .ok_or_else(|| AppError::validation("Uploaded file has no name"))?;
                let mime_type = field.content_type().map(String::from);
                let data = field.bytes().await.map_err(multipart_error)?;
                files.push(UploadFile {
                    name,
                    mime_type,
                    data,
                });
            }
            _ => {}
        }
    }

    let created = state
        .upload_service
        .upload_batch(&auth, parent_id, files)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(created))))
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::file_too_large("Upload exceeds the request size limit")
    } else {
        AppError::validation(format!("Multipart error: {e}"))
    }
}

/// GET /api/files/{id}/download?password=
pub async fn download(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<PasswordQuery>,
) -> Result<Response, AppError> {
    let download = state
        .download_service
        .download(&auth, id, query.password.as_deref())
        .await?;
    stream_response(download)
}

/// Builds a streaming attachment response.
pub(crate) fn stream_response(download: Download) -> Result<Response, AppError> {
    let Download { file, stream, .. } = download;
    let filename: String = file
        .name
        .chars()
        .map(|c| if c == '"' || c == '\\' || c.is_control() { '_' } else { c })
        .collect();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, file.mime_type())
        .header(header::CONTENT_LENGTH, file.size_bytes())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(Body::from_stream(stream))
        .map_err(|e| AppError::internal(format!("Response build failed: {e}")))
}
