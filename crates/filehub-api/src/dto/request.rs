//! Request DTOs with validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

use filehub_core::error::AppError;
use filehub_entity::share::SharePermission;

/// Run `validator` rules and turn the first failure set into a `Validation` error.
pub fn validate<T: Validate>(req: &T) -> Result<(), AppError> {
    req.validate()
        .map_err(|e| AppError::validation(format!("Invalid request: {e}")))
}

/// Distinguishes an absent field from an explicit `null`.
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// `?folderId=` for listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilesQuery {
    /// Folder to list, root when absent.
    pub folder_id: Option<Uuid>,
}

/// `?limit=` for feeds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LimitQuery {
    /// Page size.
    pub limit: Option<i64>,
}

/// `?password=` for downloads of protected shares.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PasswordQuery {
    /// Share password.
    pub password: Option<String>,
}

/// Create folder request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderRequest {
    /// Folder name.
    #[validate(length(min = 1, max = 255, message = "Folder name is required"))]
    pub name: String,
    /// Parent folder, root when absent.
    pub parent_id: Option<Uuid>,
}

/// PATCH body for a node. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNodeRequest {
    /// New name.
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    /// New starred flag.
    pub is_starred: Option<bool>,
    /// New parent; `null` moves to the root.
    #[serde(default, deserialize_with = "double_option")]
    pub parent_id: Option<Option<Uuid>>,
}

/// Create share request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateShareRequest {
    /// Permission level, `view` when absent.
    #[serde(default)]
    pub permission: SharePermission,
    /// Optional password.
    #[validate(length(max = 128))]
    pub password: Option<String>,
    /// Optional expiry.
    pub expires_at: Option<DateTime<Utc>>,
    /// Recipient; a link share when absent.
    pub shared_with: Option<Uuid>,
}
