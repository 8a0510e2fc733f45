//! Share entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Type of share, derived from whether a recipient is named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "share_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ShareType {
    /// Anyone holding the share id (and password, if set).
    Link,
    /// A single named user.
    User,
}

/// Permission granted by a share. Ordered from weakest to strongest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "share_permission", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SharePermission {
    /// Read and download.
    View,
    /// View plus comments.
    Comment,
    /// Full edit rights.
    Edit,
}

impl Default for SharePermission {
    fn default() -> Self {
        Self::View
    }
}

/// A share granting access to a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Share {
    /// Unique share identifier.
    pub id: Uuid,
    /// The shared file.
    pub file_id: Uuid,
    /// Owner of the file who created the share.
    pub owner_id: Uuid,
    /// Recipient, `None` for link shares.
    pub shared_with_id: Option<Uuid>,
    /// Link or user share.
    pub share_type: ShareType,
    /// Permission level granted.
    pub permission: SharePermission,
    /// Argon2 hash of the share password.
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    /// When the share stops granting access.
    pub expires_at: Option<DateTime<Utc>>,
    /// Number of downloads through this share.
    pub download_count: i64,
    /// When the share was created.
    pub created_at: DateTime<Utc>,
}

impl Share {
    /// Whether the share has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }

    /// Whether a password must be supplied.
    pub fn is_password_protected(&self) -> bool {
        self.password_hash.is_some()
    }

    /// Whether the share addresses `requester`, ignoring expiry and password.
    ///
    /// Link shares address everyone, anonymous callers included.
    pub fn admits(&self, requester: Option<Uuid>) -> bool {
        match self.shared_with_id {
            None => true,
            Some(recipient) => requester == Some(recipient),
        }
    }
}

/// Data required to create a new share.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateShare {
    /// The shared file.
    pub file_id: Uuid,
    /// Owner creating the share.
    pub owner_id: Uuid,
    /// Recipient for user shares.
    pub shared_with_id: Option<Uuid>,
    /// Permission level.
    pub permission: SharePermission,
    /// Already hashed password.
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    /// Expiry.
    pub expires_at: Option<DateTime<Utc>>,
}

impl CreateShare {
    /// Share type implied by the recipient.
    pub fn share_type(&self) -> ShareType {
        if self.shared_with_id.is_some() {
            ShareType::User
        } else {
            ShareType::Link
        }
    }
}
