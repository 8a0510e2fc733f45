//! Storage-agnostic persistence traits.
//!
//! Services depend on these traits rather than on concrete repositories, so
//! the same service code runs over PostgreSQL in production and over
//! [`MemoryDatabase`](crate::memory::MemoryDatabase) in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use filehub_core::result::AppResult;
use filehub_entity::activity::{Activity, CreateActivity};
use filehub_entity::node::{CreateNode, FileNode, NodeChanges};
use filehub_entity::share::{CreateShare, Share};
use filehub_entity::user::{Plan, UpsertUser, User};

/// Result of an atomic, clamped change to a user's `storage_used`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct QuotaAdjustment {
    /// Usage after the change.
    pub storage_used: i64,
    /// The unclamped result would have been negative.
    pub underflow: bool,
}

/// Rows removed by a purge, together with the quota change applied in the
/// same transaction.
#[derive(Debug, Clone)]
pub struct PurgeReport {
    /// Every deleted node, for blob cleanup after commit.
    pub removed: Vec<FileNode>,
    /// Sum of the sizes of the deleted files.
    pub bytes_reclaimed: i64,
    /// The decrement applied to the owner's usage.
    pub adjustment: QuotaAdjustment,
}

/// Persistence for users and their storage counters.
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    /// Find a user by primary key.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Insert a free-plan user, or refresh the identity fields of an existing one.
    async fn upsert(&self, data: &UpsertUser) -> AppResult<User>;

    /// Add `bytes` to `storage_used` only if the result stays within the limit.
    ///
    /// Returns `false` (and changes nothing) when the bytes do not fit.
    async fn try_reserve(&self, id: Uuid, bytes: i64) -> AppResult<bool>;

    /// Add `delta` to `storage_used`, clamping the result at zero.
    async fn adjust_storage(&self, id: Uuid, delta: i64) -> AppResult<QuotaAdjustment>;

    /// Switch the plan and apply its storage limit.
    async fn update_plan(&self, id: Uuid, plan: Plan) -> AppResult<User>;
}

/// Persistence for the file/folder tree.
#[async_trait]
pub trait NodeStore: Send + Sync + 'static {
    /// Find a node by primary key, trashed or not.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<FileNode>>;

    /// Non-trashed children of `parent_id` (root when `None`), folders first,
    /// then by name.
    async fn list_children(&self, user_id: Uuid, parent_id: Option<Uuid>)
    -> AppResult<Vec<FileNode>>;

    /// Insert one node.
    async fn create(&self, data: &CreateNode) -> AppResult<FileNode>;

    /// Insert a batch of nodes in one transaction. Either all rows exist
    /// afterwards or none do.
    async fn create_many(&self, data: &[CreateNode]) -> AppResult<Vec<FileNode>>;

    /// Apply a partial update. Fails with `NotFound` if the node is gone.
    async fn update(&self, id: Uuid, changes: &NodeChanges) -> AppResult<FileNode>;

    /// Delete one owned node and decrement the owner's usage by its size in
    /// one transaction. Children of a folder are left in place.
    async fn delete_and_reclaim(&self, user_id: Uuid, id: Uuid) -> AppResult<PurgeReport>;

    /// Delete every trashed node of the user plus all descendants of trashed
    /// folders, with one aggregate quota decrement, in one transaction.
    async fn purge_trash(&self, user_id: Uuid) -> AppResult<PurgeReport>;

    /// Non-trashed starred nodes ordered by name.
    async fn starred(&self, user_id: Uuid) -> AppResult<Vec<FileNode>>;

    /// Non-trashed files ordered by `updated_at` descending.
    async fn recent(&self, user_id: Uuid, limit: i64) -> AppResult<Vec<FileNode>>;

    /// Trashed nodes ordered by `trashed_at` descending.
    async fn trashed(&self, user_id: Uuid) -> AppResult<Vec<FileNode>>;

    /// Non-trashed files carrying a user share to `user_id` that is unexpired at `now`.
    async fn shared_with(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<Vec<FileNode>>;
}

/// Persistence for shares.
#[async_trait]
pub trait ShareStore: Send + Sync + 'static {
    /// Insert a share.
    async fn create(&self, data: &CreateShare) -> AppResult<Share>;

    /// Find a share by primary key.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Share>>;

    /// All shares of a file, oldest first.
    async fn find_by_file(&self, file_id: Uuid) -> AppResult<Vec<Share>>;

    /// Delete a share. Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    /// Atomically increment the download counter and return the new value.
    async fn increment_download_count(&self, id: Uuid) -> AppResult<i64>;
}

/// Append-only activity log persistence.
#[async_trait]
pub trait ActivityStore: Send + Sync + 'static {
    /// Append an entry.
    async fn create(&self, data: &CreateActivity) -> AppResult<Activity>;

    /// Newest entries of a user.
    async fn recent(&self, user_id: Uuid, limit: i64) -> AppResult<Vec<Activity>>;
}
