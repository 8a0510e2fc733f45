//! Batch upload: admission, quota reservation, blob writes and row inserts.

use std::sync::Arc;

use bytes::Bytes;
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use filehub_core::config::StorageConfig;
use filehub_core::error::AppError;
use filehub_database::NodeStore;
use filehub_entity::activity::ActivityAction;
use filehub_entity::node::{CreateNode, FileNode};
use filehub_storage::{BlobStore, resolve_mime_type};

use crate::activity::ActivityService;
use crate::context::RequestContext;
use crate::folder::tree::require_parent;
use crate::naming::normalize_name;
use crate::quota::QuotaService;

/// One file of an upload request.
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Client supplied file name.
    pub name: String,
    /// Client supplied content type, guessed from the name when absent.
    pub mime_type: Option<String>,
    /// File content.
    pub data: Bytes,
}

impl UploadFile {
    /// Size of the content in bytes.
    pub fn size_bytes(&self) -> i64 {
        i64::try_from(self.data.len()).unwrap_or(i64::MAX)
    }
}

/// Stores uploaded batches.
#[derive(Clone)]
pub struct UploadService {
    /// Node persistence.
    nodes: Arc<dyn NodeStore>,
    /// Blob storage.
    blobs: BlobStore,
    /// Quota accountant.
    quota: QuotaService,
    /// Activity log.
    activity: ActivityService,
    /// Request limits.
    config: StorageConfig,
}

impl std::fmt::Debug for UploadService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadService")
            .field("max_files_per_request", &self.config.max_files_per_request)
            .field("max_request_bytes", &self.config.max_request_bytes)
            .finish()
    }
}

impl UploadService {
    /// Creates a new upload service.
    pub fn new(
        nodes: Arc<dyn NodeStore>,
        blobs: BlobStore,
        quota: QuotaService,
        activity: ActivityService,
        config: StorageConfig,
    ) -> Self {
        Self {
            nodes,
            blobs,
            quota,
            activity,
            config,
        }
    }

    /// Stores a batch of files under `parent_id` (root when `None`).
    ///
    /// The whole batch is reserved against the quota before anything is
    /// written. If a later step fails, every blob already written is deleted
    /// and the reservation is released, so a rejected batch leaves neither
    /// blobs nor usage behind.
    pub async fn upload_batch(
        &self,
        ctx: &RequestContext,
        parent_id: Option<Uuid>,
        files: Vec<UploadFile>,
    ) -> Result<Vec<FileNode>, AppError> {
        if files.is_empty() {
            return Err(AppError::validation("No files uploaded"));
        }
        if files.len() > self.config.max_files_per_request {
            return Err(AppError::validation(format!(
                "At most {} files can be uploaded at once",
                self.config.max_files_per_request
            )));
        }

        let total: i64 = files.iter().map(UploadFile::size_bytes).sum();
        let max_request = i64::try_from(self.config.max_request_bytes).unwrap_or(i64::MAX);
        if total > max_request {
            return Err(AppError::file_too_large(format!(
                "Upload of {total} bytes exceeds the request limit of {max_request} bytes"
            )));
        }

        let plan = self.quota.plan(ctx.user_id).await?;
        let mut names = Vec::with_capacity(files.len());
        for file in &files {
            let name = normalize_name(&file.name)?;
            self.quota.check_file_size(plan, &name, file.size_bytes())?;
            names.push(name);
        }
        require_parent(self.nodes.as_ref(), ctx.user_id, parent_id).await?;

        self.quota.reserve(ctx.user_id, total).await?;

        let mut written: Vec<String> = Vec::with_capacity(files.len());
        let mut rows = Vec::with_capacity(files.len());
        for (file, name) in files.into_iter().zip(names) {
            let size = file.size_bytes();
            let mime_type = resolve_mime_type(&name, file.mime_type.as_deref());
            match self.blobs.put(ctx.user_id, &name, file.data).await {
                Ok(blob_ref) => {
                    rows.push(CreateNode::file(
                        ctx.user_id,
                        parent_id,
                        name,
                        mime_type,
                        size,
                        blob_ref.clone(),
                    ));
                    written.push(blob_ref);
                }
                Err(e) => {
                    self.roll_back(ctx, &written, total).await;
                    return Err(e);
                }
            }
        }

        let created = match self.nodes.create_many(&rows).await {
            Ok(created) => created,
            Err(e) => {
                self.roll_back(ctx, &written, total).await;
                return Err(e);
            }
        };

        info!(
            user_id = %ctx.user_id,
            parent_id = ?parent_id,
            files = created.len(),
            bytes = total,
            "Upload completed"
        );

        for node in &created {
            self.activity
                .record(
                    ctx.user_id,
                    Some(node.id),
                    ActivityAction::Upload,
                    json!({ "fileName": node.name }),
                )
                .await;
        }

        Ok(created)
    }

    async fn roll_back(&self, ctx: &RequestContext, written: &[String], reserved: i64) {
        warn!(
            user_id = %ctx.user_id,
            blobs = written.len(),
            bytes = reserved,
            "Upload failed, rolling back"
        );
        self.blobs
            .delete_all(written.iter().map(String::as_str))
            .await;
        if let Err(e) = self.quota.release(ctx.user_id, reserved).await {
            error!(
                user_id = %ctx.user_id,
                bytes = reserved,
                error = %e,
                "Failed to release upload reservation"
            );
        }
    }
}
