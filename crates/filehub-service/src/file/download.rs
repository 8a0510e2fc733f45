//! File downloads for owners and share recipients.

use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use filehub_core::error::AppError;
use filehub_core::traits::storage::ByteStream;
use filehub_entity::activity::ActivityAction;
use filehub_entity::node::FileNode;
use filehub_storage::BlobStore;

use crate::activity::ActivityService;
use crate::context::RequestContext;
use crate::share::{Access, AccessService};

/// A file ready to be streamed to the client.
pub struct Download {
    /// The file being downloaded.
    pub file: FileNode,
    /// How the requester reached it.
    pub access: Access,
    /// File content.
    pub stream: ByteStream,
}

impl std::fmt::Debug for Download {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Download")
            .field("file", &self.file.id)
            .field("access", &self.access)
            .finish()
    }
}

/// Streams file content after access checks.
#[derive(Clone)]
pub struct DownloadService {
    /// Access resolution.
    access: AccessService,
    /// Blob storage.
    blobs: BlobStore,
    /// Activity log.
    activity: ActivityService,
}

impl std::fmt::Debug for DownloadService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadService").finish()
    }
}

impl DownloadService {
    /// Creates a new download service.
    pub fn new(access: AccessService, blobs: BlobStore, activity: ActivityService) -> Self {
        Self {
            access,
            blobs,
            activity,
        }
    }

    /// Downloads a file the caller owns or was granted through a share.
    pub async fn download(
        &self,
        ctx: &RequestContext,
        file_id: Uuid,
        password: Option<&str>,
    ) -> Result<Download, AppError> {
        let (file, access) = self
            .access
            .resolve_access(file_id, Some(ctx.user_id), password)
            .await?;
        self.open(file, access, ctx.user_id).await
    }

    /// Downloads the file behind a share, anonymously or signed in.
    ///
    /// Anonymous downloads are logged against the file owner.
    pub async fn download_via_share(
        &self,
        requester: Option<Uuid>,
        share_id: Uuid,
        password: Option<&str>,
    ) -> Result<Download, AppError> {
        let (file, share) = self
            .access
            .resolve_share(share_id, requester, password)
            .await?;
        let access = Access::Granted {
            share_id: share.id,
            permission: share.permission,
        };
        let actor = requester.unwrap_or(file.user_id);
        self.open(file, access, actor).await
    }

    async fn open(
        &self,
        file: FileNode,
        access: Access,
        actor: Uuid,
    ) -> Result<Download, AppError> {
        let Some(blob_ref) = file.blob_ref() else {
            return Err(AppError::not_found(format!("File {} not found", file.id)));
        };
        let stream = self.blobs.get(blob_ref).await?;

        if let Some(share_id) = access.share_id() {
            if let Err(e) = self.access.record_download(share_id).await {
                warn!(share_id = %share_id, error = %e, "Failed to count share download");
            }
        }

        info!(
            user_id = %actor,
            file_id = %file.id,
            share_id = ?access.share_id(),
            "File downloaded"
        );
        self.activity
            .record(
                actor,
                Some(file.id),
                ActivityAction::Download,
                json!({ "fileName": file.name }),
            )
            .await;

        Ok(Download {
            file,
            access,
            stream,
        })
    }
}
