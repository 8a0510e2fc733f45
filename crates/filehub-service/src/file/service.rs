//! File tree operations: listing, rename, star, move and the trash lifecycle.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use filehub_core::error::AppError;
use filehub_database::{NodeStore, PurgeReport};
use filehub_entity::activity::ActivityAction;
use filehub_entity::node::{CreateNode, FileNode, NodeChanges};
use filehub_storage::BlobStore;

use crate::activity::ActivityService;
use crate::context::RequestContext;
use crate::folder::tree::{owned_node, require_parent, walk_up, WalkEnd};
use crate::naming::normalize_name;
use crate::quota::QuotaService;

/// Default size of the recent-files view.
pub const DEFAULT_RECENT_LIMIT: i64 = 50;
/// Largest recent-files page.
pub const MAX_RECENT_LIMIT: i64 = 100;

/// Partial update accepted by PATCH.
///
/// `parent_id` is `Some(None)` to move to the root.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    /// New name.
    pub name: Option<String>,
    /// New starred flag.
    pub is_starred: Option<bool>,
    /// New parent.
    pub parent_id: Option<Option<Uuid>>,
}

/// Outcome of emptying the trash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmptyTrashReport {
    /// Rows removed, descendants of trashed folders included.
    pub nodes_removed: usize,
    /// Bytes returned to the quota.
    pub bytes_reclaimed: i64,
    /// Blobs that could not be deleted and were left orphaned.
    pub blob_failures: usize,
    /// Usage after the purge.
    pub storage_used: i64,
}

/// Core operations over a user's file tree.
#[derive(Clone)]
pub struct FileService {
    /// Node persistence.
    nodes: Arc<dyn NodeStore>,
    /// Blob storage.
    blobs: BlobStore,
    /// Quota accountant.
    quota: QuotaService,
    /// Activity log.
    activity: ActivityService,
}

impl std::fmt::Debug for FileService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileService")
            .field("blobs", &self.blobs)
            .finish()
    }
}

impl FileService {
    /// Creates a new file service.
    pub fn new(
        nodes: Arc<dyn NodeStore>,
        blobs: BlobStore,
        quota: QuotaService,
        activity: ActivityService,
    ) -> Self {
        Self {
            nodes,
            blobs,
            quota,
            activity,
        }
    }

    /// Immediate, non-trashed children, folders first then by name.
    ///
    /// `NotFound` unless `parent_id` is an owned, non-trashed folder.
    pub async fn list_children(
        &self,
        ctx: &RequestContext,
        parent_id: Option<Uuid>,
    ) -> Result<Vec<FileNode>, AppError> {
        if let Some(id) = parent_id {
            let visible = self
                .nodes
                .find_by_id(id)
                .await?
                .is_some_and(|p| p.is_owned_by(ctx.user_id) && p.is_folder() && !p.is_trashed);
            if !visible {
                return Err(AppError::not_found(format!("Folder {id} not found")));
            }
        }
        self.nodes.list_children(ctx.user_id, parent_id).await
    }

    /// A node the caller owns, trashed or not.
    pub async fn get_node(&self, ctx: &RequestContext, id: Uuid) -> Result<FileNode, AppError> {
        owned_node(self.nodes.as_ref(), ctx.user_id, id).await
    }

    /// Records a file whose bytes are already stored.
    ///
    /// Does not touch the quota; the caller reserves first.
    pub async fn create_file(
        &self,
        ctx: &RequestContext,
        name: &str,
        mime_type: &str,
        size_bytes: i64,
        blob_ref: &str,
        parent_id: Option<Uuid>,
    ) -> Result<FileNode, AppError> {
        let name = normalize_name(name)?;
        require_parent(self.nodes.as_ref(), ctx.user_id, parent_id).await?;

        let node = self
            .nodes
            .create(&CreateNode::file(
                ctx.user_id,
                parent_id,
                name,
                mime_type,
                size_bytes,
                blob_ref,
            ))
            .await?;

        info!(user_id = %ctx.user_id, file_id = %node.id, size_bytes, "File created");
        Ok(node)
    }

    /// Renames a node.
    pub async fn rename(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        new_name: &str,
    ) -> Result<FileNode, AppError> {
        self.update(
            ctx,
            id,
            NodePatch {
                name: Some(new_name.to_string()),
                ..Default::default()
            },
        )
        .await
    }

    /// Stars or unstars a node.
    pub async fn set_starred(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        starred: bool,
    ) -> Result<FileNode, AppError> {
        self.update(
            ctx,
            id,
            NodePatch {
                is_starred: Some(starred),
                ..Default::default()
            },
        )
        .await
    }

    /// Moves a node under `new_parent` (root when `None`).
    pub async fn move_node(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        new_parent: Option<Uuid>,
    ) -> Result<FileNode, AppError> {
        self.update(
            ctx,
            id,
            NodePatch {
                parent_id: Some(new_parent),
                ..Default::default()
            },
        )
        .await
    }

    /// Applies rename, star and move in one update after validating each.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        patch: NodePatch,
    ) -> Result<FileNode, AppError> {
        let node = owned_node(self.nodes.as_ref(), ctx.user_id, id).await?;

        let name = patch.name.as_deref().map(normalize_name).transpose()?;
        if let Some(new_parent) = patch.parent_id {
            self.check_move(ctx, &node, new_parent).await?;
        }

        let changes = NodeChanges {
            name: name.clone(),
            is_starred: patch.is_starred,
            parent_id: patch.parent_id,
            trashed_at: None,
        };
        if changes == NodeChanges::default() {
            return Ok(node);
        }
        let updated = self.nodes.update(id, &changes).await?;

        info!(
            user_id = %ctx.user_id,
            file_id = %id,
            renamed = name.is_some(),
            starred = ?patch.is_starred,
            moved = patch.parent_id.is_some(),
            "Node updated"
        );

        if let Some(new_name) = &name {
            self.activity
                .record(
                    ctx.user_id,
                    Some(id),
                    ActivityAction::Rename,
                    json!({ "oldName": node.name, "newName": new_name }),
                )
                .await;
        }
        if let Some(starred) = patch.is_starred {
            let action = if starred {
                ActivityAction::Star
            } else {
                ActivityAction::Unstar
            };
            self.activity
                .record(ctx.user_id, Some(id), action, json!({ "fileName": updated.name }))
                .await;
        }
        if let Some(new_parent) = patch.parent_id {
            self.activity
                .record(
                    ctx.user_id,
                    Some(id),
                    ActivityAction::Move,
                    json!({ "fromParentId": node.parent_id, "toParentId": new_parent }),
                )
                .await;
        }

        Ok(updated)
    }

    /// Rejects destinations that are invalid or inside the moved node.
    async fn check_move(
        &self,
        ctx: &RequestContext,
        node: &FileNode,
        new_parent: Option<Uuid>,
    ) -> Result<(), AppError> {
        if new_parent == Some(node.id) {
            return Err(AppError::validation("Cannot move a node into itself"));
        }
        require_parent(self.nodes.as_ref(), ctx.user_id, new_parent).await?;

        let ancestry = walk_up(self.nodes.as_ref(), new_parent).await?;
        if ancestry.contains(node.id) {
            return Err(AppError::validation(
                "Cannot move a folder into one of its descendants",
            ));
        }
        match ancestry.end {
            WalkEnd::Cycle | WalkEnd::TooDeep => Err(AppError::validation(
                "Destination folder has an invalid ancestry",
            )),
            WalkEnd::Root | WalkEnd::Dangling => Ok(()),
        }
    }

    /// Moves a node to the trash. Contents of a trashed folder are untouched.
    pub async fn move_to_trash(&self, ctx: &RequestContext, id: Uuid) -> Result<FileNode, AppError> {
        let node = owned_node(self.nodes.as_ref(), ctx.user_id, id).await?;
        if node.is_trashed {
            return Ok(node);
        }

        let updated = self
            .nodes
            .update(
                id,
                &NodeChanges {
                    trashed_at: Some(Some(Utc::now())),
                    ..Default::default()
                },
            )
            .await?;

        info!(user_id = %ctx.user_id, file_id = %id, "Node moved to trash");
        self.activity
            .record(
                ctx.user_id,
                Some(id),
                ActivityAction::Trash,
                json!({ "fileName": node.name }),
            )
            .await;

        Ok(updated)
    }

    /// Takes a node out of the trash.
    ///
    /// If its parent is gone or (effectively) trashed the node is reparented
    /// to the root so it does not vanish into a hidden subtree.
    pub async fn restore_from_trash(
        &self,
        ctx: &RequestContext,
        id: Uuid,
    ) -> Result<FileNode, AppError> {
        let node = owned_node(self.nodes.as_ref(), ctx.user_id, id).await?;
        if !node.is_trashed {
            return Ok(node);
        }

        let mut changes = NodeChanges {
            trashed_at: Some(None),
            ..Default::default()
        };
        if node.parent_id.is_some() {
            let ancestry = walk_up(self.nodes.as_ref(), node.parent_id).await?;
            if !ancestry.is_intact() || ancestry.any_trashed() {
                warn!(
                    user_id = %ctx.user_id,
                    file_id = %id,
                    parent_id = ?node.parent_id,
                    walk_end = ?ancestry.end,
                    "Parent missing or in trash, restoring to root"
                );
                changes.parent_id = Some(None);
            }
        }

        let restored = self.nodes.update(id, &changes).await?;

        info!(user_id = %ctx.user_id, file_id = %id, "Node restored from trash");
        self.activity
            .record(
                ctx.user_id,
                Some(id),
                ActivityAction::Restore,
                json!({ "fileName": node.name }),
            )
            .await;

        Ok(restored)
    }

    /// Deletes a node for good and returns its bytes to the quota.
    ///
    /// Row and quota change commit together; the blob is removed afterwards
    /// on a best-effort basis. Deletion never cascades, so a folder that
    /// still holds live children is refused; trashed children stay in the
    /// trash and are restored to the root.
    pub async fn delete_permanently(
        &self,
        ctx: &RequestContext,
        id: Uuid,
    ) -> Result<FileNode, AppError> {
        let node = owned_node(self.nodes.as_ref(), ctx.user_id, id).await?;
        if node.is_folder()
            && !self
                .nodes
                .list_children(ctx.user_id, Some(id))
                .await?
                .is_empty()
        {
            return Err(AppError::validation(
                "Folder is not empty; trash it and empty the trash to delete its contents",
            ));
        }

        let report = self.nodes.delete_and_reclaim(ctx.user_id, id).await?;
        self.quota
            .observe(ctx.user_id, -report.bytes_reclaimed, &report.adjustment);
        self.cleanup_blobs(&report).await;

        info!(
            user_id = %ctx.user_id,
            file_id = %id,
            bytes = report.bytes_reclaimed,
            "Node permanently deleted"
        );
        self.activity
            .record(
                ctx.user_id,
                None,
                ActivityAction::Delete,
                json!({ "fileId": id, "fileName": node.name }),
            )
            .await;

        Ok(node)
    }

    /// Purges every trashed node plus all descendants of trashed folders.
    pub async fn empty_trash(&self, ctx: &RequestContext) -> Result<EmptyTrashReport, AppError> {
        let report = self.nodes.purge_trash(ctx.user_id).await?;
        self.quota
            .observe(ctx.user_id, -report.bytes_reclaimed, &report.adjustment);
        let blob_failures = self.cleanup_blobs(&report).await;

        info!(
            user_id = %ctx.user_id,
            nodes = report.removed.len(),
            bytes = report.bytes_reclaimed,
            blob_failures,
            "Trash emptied"
        );
        self.activity
            .record(
                ctx.user_id,
                None,
                ActivityAction::EmptyTrash,
                json!({ "count": report.removed.len(), "bytes": report.bytes_reclaimed }),
            )
            .await;

        Ok(EmptyTrashReport {
            nodes_removed: report.removed.len(),
            bytes_reclaimed: report.bytes_reclaimed,
            blob_failures,
            storage_used: report.adjustment.storage_used,
        })
    }

    async fn cleanup_blobs(&self, report: &PurgeReport) -> usize {
        self.blobs
            .delete_all(report.removed.iter().filter_map(FileNode::blob_ref))
            .await
    }

    /// Starred nodes by name.
    pub async fn starred(&self, ctx: &RequestContext) -> Result<Vec<FileNode>, AppError> {
        self.nodes.starred(ctx.user_id).await
    }

    /// Most recently updated files.
    pub async fn recent(
        &self,
        ctx: &RequestContext,
        limit: Option<i64>,
    ) -> Result<Vec<FileNode>, AppError> {
        let limit = limit.unwrap_or(DEFAULT_RECENT_LIMIT).clamp(1, MAX_RECENT_LIMIT);
        self.nodes.recent(ctx.user_id, limit).await
    }

    /// Trash contents, most recently trashed first.
    pub async fn trashed(&self, ctx: &RequestContext) -> Result<Vec<FileNode>, AppError> {
        self.nodes.trashed(ctx.user_id).await
    }

    /// Files other users shared directly with the caller.
    pub async fn shared_with_me(&self, ctx: &RequestContext) -> Result<Vec<FileNode>, AppError> {
        self.nodes.shared_with(ctx.user_id, Utc::now()).await
    }
}
