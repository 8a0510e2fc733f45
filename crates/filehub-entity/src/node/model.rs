//! File tree node entity model.
//!
//! Files and folders share one table. In Rust the discriminant is a tagged
//! [`NodeKind`], so folders never carry a size, MIME type or blob reference.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use filehub_core::error::AppError;

/// MIME column value stored for folders.
pub const FOLDER_MIME_TYPE: &str = "folder";

/// What a node is, with the fields that only make sense for that kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    /// A stored file backed by a blob.
    File {
        /// MIME type reported at upload.
        mime_type: String,
        /// Size in bytes.
        size_bytes: i64,
        /// Opaque reference into the blob store.
        #[serde(skip_serializing, default)]
        blob_ref: String,
    },
    /// A folder. Holds no bytes of its own.
    Folder,
}

/// A file or folder in a user's tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileNode {
    /// Unique node identifier.
    pub id: Uuid,
    /// Display name. Siblings may share a name.
    pub name: String,
    /// Containing folder, `None` at the root.
    pub parent_id: Option<Uuid>,
    /// Owner of the node.
    pub user_id: Uuid,
    /// File or folder specific fields.
    #[serde(flatten)]
    pub kind: NodeKind,
    /// Whether the owner starred the node.
    pub is_starred: bool,
    /// Whether the node sits in the trash.
    pub is_trashed: bool,
    /// When the node was moved to the trash.
    pub trashed_at: Option<DateTime<Utc>>,
    /// When the node was created.
    pub created_at: DateTime<Utc>,
    /// When the node was last updated.
    pub updated_at: DateTime<Utc>,
}

impl FileNode {
    /// Whether this node is a folder.
    pub fn is_folder(&self) -> bool {
        matches!(self.kind, NodeKind::Folder)
    }

    /// Bytes charged to the owner for this node (0 for folders).
    pub fn size_bytes(&self) -> i64 {
        match &self.kind {
            NodeKind::File { size_bytes, .. } => *size_bytes,
            NodeKind::Folder => 0,
        }
    }

    /// MIME type, or `"folder"`.
    pub fn mime_type(&self) -> &str {
        match &self.kind {
            NodeKind::File { mime_type, .. } => mime_type,
            NodeKind::Folder => FOLDER_MIME_TYPE,
        }
    }

    /// Blob reference of a file.
    pub fn blob_ref(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::File { blob_ref, .. } => Some(blob_ref),
            NodeKind::Folder => None,
        }
    }

    /// Whether `user_id` owns this node.
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

/// Flat `files` table row as stored in PostgreSQL.
#[derive(Debug, Clone, FromRow)]
pub struct NodeRow {
    /// Unique node identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// MIME type, or `"folder"`.
    pub mime_type: String,
    /// Size in bytes, 0 for folders.
    pub size_bytes: i64,
    /// Blob reference, NULL for folders.
    pub blob_ref: Option<String>,
    /// Containing folder.
    pub parent_id: Option<Uuid>,
    /// Owner.
    pub user_id: Uuid,
    /// Folder discriminant.
    pub is_folder: bool,
    /// Starred flag.
    pub is_starred: bool,
    /// Trash flag.
    pub is_trashed: bool,
    /// Trash timestamp.
    pub trashed_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<NodeRow> for FileNode {
    type Error = AppError;

    fn try_from(row: NodeRow) -> Result<Self, Self::Error> {
        let kind = if row.is_folder {
            NodeKind::Folder
        } else {
            let blob_ref = row.blob_ref.ok_or_else(|| {
                AppError::internal(format!("File {} has no blob reference", row.id))
            })?;
            NodeKind::File {
                mime_type: row.mime_type,
                size_bytes: row.size_bytes,
                blob_ref,
            }
        };

        Ok(Self {
            id: row.id,
            name: row.name,
            parent_id: row.parent_id,
            user_id: row.user_id,
            kind,
            is_starred: row.is_starred,
            is_trashed: row.is_trashed,
            trashed_at: row.trashed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Data required to create a new node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNode {
    /// Owner.
    pub user_id: Uuid,
    /// Containing folder.
    pub parent_id: Option<Uuid>,
    /// Display name.
    pub name: String,
    /// File or folder fields.
    pub kind: NodeKind,
}

impl CreateNode {
    /// Builds the insert for a folder.
    pub fn folder(user_id: Uuid, parent_id: Option<Uuid>, name: impl Into<String>) -> Self {
        Self {
            user_id,
            parent_id,
            name: name.into(),
            kind: NodeKind::Folder,
        }
    }

    /// Builds the insert for a file whose bytes already live in the blob store.
    pub fn file(
        user_id: Uuid,
        parent_id: Option<Uuid>,
        name: impl Into<String>,
        mime_type: impl Into<String>,
        size_bytes: i64,
        blob_ref: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            parent_id,
            name: name.into(),
            kind: NodeKind::File {
                mime_type: mime_type.into(),
                size_bytes,
                blob_ref: blob_ref.into(),
            },
        }
    }

    /// Bytes this node will add to the owner's usage.
    pub fn size_bytes(&self) -> i64 {
        match &self.kind {
            NodeKind::File { size_bytes, .. } => *size_bytes,
            NodeKind::Folder => 0,
        }
    }
}

/// Partial update applied by PATCH and the trash lifecycle.
///
/// `None` leaves a field untouched; the nested options of `parent_id` and
/// `trashed_at` distinguish "leave" from "set to NULL".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeChanges {
    /// New name.
    pub name: Option<String>,
    /// New starred flag.
    pub is_starred: Option<bool>,
    /// New parent (`Some(None)` moves to the root).
    pub parent_id: Option<Option<Uuid>>,
    /// `Some(Some(t))` trashes at `t`, `Some(None)` restores.
    pub trashed_at: Option<Option<DateTime<Utc>>>,
}

impl NodeChanges {
    /// Applies the changes to an in-memory node and bumps `updated_at`.
    pub fn apply_to(&self, node: &mut FileNode, now: DateTime<Utc>) {
        if let Some(name) = &self.name {
            node.name = name.clone();
        }
        if let Some(starred) = self.is_starred {
            node.is_starred = starred;
        }
        if let Some(parent_id) = self.parent_id {
            node.parent_id = parent_id;
        }
        if let Some(trashed_at) = self.trashed_at {
            node.is_trashed = trashed_at.is_some();
            node.trashed_at = trashed_at;
        }
        node.updated_at = now;
    }
}

/// One element of a breadcrumb path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crumb {
    /// Node identifier.
    pub id: Uuid,
    /// Node name.
    pub name: String,
}

impl From<&FileNode> for Crumb {
    fn from(node: &FileNode) -> Self {
        Self {
            id: node.id,
            name: node.name.clone(),
        }
    }
}
