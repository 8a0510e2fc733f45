//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::plan::Plan;
use crate::storage::quota::StorageQuota;

/// A user of the drive. Created on first sign-in and never hard-deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier (the identity provider's subject).
    pub id: Uuid,
    /// Email address.
    pub email: Option<String>,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// Avatar URL supplied by the identity provider.
    pub profile_image_url: Option<String>,
    /// Current subscription plan.
    pub plan: Plan,
    /// Bytes currently charged to this user, trashed files included.
    pub storage_used: i64,
    /// Aggregate byte limit, `-1` for unlimited.
    pub storage_limit: i64,
    /// Billing provider customer reference.
    #[serde(skip_serializing)]
    pub billing_customer_id: Option<String>,
    /// Billing provider subscription reference.
    #[serde(skip_serializing)]
    pub billing_subscription_id: Option<String>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether the aggregate storage limit is disabled.
    pub fn is_unlimited(&self) -> bool {
        self.storage_limit < 0
    }

    /// Current usage as a quota value object.
    pub fn quota(&self) -> StorageQuota {
        let total = if self.is_unlimited() {
            None
        } else {
            Some(self.storage_limit)
        };
        StorageQuota::new(total, self.storage_used)
    }

    /// Name to show in the UI, falling back to the email address.
    pub fn display_name(&self) -> Option<String> {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => Some(format!("{first} {last}")),
            (Some(first), None) => Some(first.clone()),
            (None, Some(last)) => Some(last.clone()),
            (None, None) => self.email.clone(),
        }
    }
}

/// Identity claims used to create or refresh a user on sign-in.
///
/// Upserting never touches the plan or the storage counters of an
/// existing user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertUser {
    /// Identity provider subject.
    pub id: Uuid,
    /// Email address.
    pub email: Option<String>,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// Avatar URL.
    pub profile_image_url: Option<String>,
}
