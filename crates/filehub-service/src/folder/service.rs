//! Folder creation.

use std::sync::Arc;

use serde_json::json;
use tracing::info;
use uuid::Uuid;

use filehub_core::error::AppError;
use filehub_database::NodeStore;
use filehub_entity::activity::ActivityAction;
use filehub_entity::node::{CreateNode, FileNode};

use super::tree::require_parent;
use crate::activity::ActivityService;
use crate::context::RequestContext;
use crate::naming::normalize_name;

/// Creates folders in the caller's tree.
#[derive(Clone)]
pub struct FolderService {
    /// Node persistence.
    nodes: Arc<dyn NodeStore>,
    /// Activity log.
    activity: ActivityService,
}

impl std::fmt::Debug for FolderService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FolderService").finish()
    }
}

impl FolderService {
    /// Creates a new folder service.
    pub fn new(nodes: Arc<dyn NodeStore>, activity: ActivityService) -> Self {
        Self { nodes, activity }
    }

    /// Creates a folder under `parent_id` (root when `None`).
    ///
    /// The name is trimmed; sibling names may repeat.
    pub async fn create_folder(
        &self,
        ctx: &RequestContext,
        name: &str,
        parent_id: Option<Uuid>,
    ) -> Result<FileNode, AppError> {
        let name = normalize_name(name)?;
        require_parent(self.nodes.as_ref(), ctx.user_id, parent_id).await?;

        let folder = self
            .nodes
            .create(&CreateNode::folder(ctx.user_id, parent_id, name))
            .await?;

        info!(
            user_id = %ctx.user_id,
            folder_id = %folder.id,
            parent_id = ?parent_id,
            "Folder created"
        );

        self.activity
            .record(
                ctx.user_id,
                Some(folder.id),
                ActivityAction::CreateFolder,
                json!({ "folderName": folder.name }),
            )
            .await;

        Ok(folder)
    }
}
