//! Activity log entry entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// What a user did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "activity_action", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    Upload,
    Download,
    CreateFolder,
    Rename,
    Move,
    Star,
    Unstar,
    Trash,
    Restore,
    Delete,
    EmptyTrash,
    Share,
    Unshare,
}

/// An immutable activity log entry.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Activity {
    /// Unique entry identifier.
    pub id: Uuid,
    /// The acting user.
    pub user_id: Uuid,
    /// The affected node, cleared once it is purged.
    pub file_id: Option<Uuid>,
    /// The action performed.
    pub action: ActivityAction,
    /// Action specific details.
    pub details: serde_json::Value,
    /// When the action occurred.
    pub created_at: DateTime<Utc>,
}

/// Data required to append an activity entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateActivity {
    /// The acting user.
    pub user_id: Uuid,
    /// The affected node.
    pub file_id: Option<Uuid>,
    /// The action performed.
    pub action: ActivityAction,
    /// Action specific details.
    pub details: serde_json::Value,
}
