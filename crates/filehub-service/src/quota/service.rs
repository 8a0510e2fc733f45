//! Quota checks, reservations and plan changes.
//!
//! `storage_used` only changes through single conditional updates in the
//! store: [`QuotaService::reserve`] claims bytes before an upload writes
//! anything, and every later change goes through a clamped adjustment.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use filehub_core::error::AppError;
use filehub_core::result::OptionExt;
use filehub_database::{QuotaAdjustment, UserStore};
use filehub_entity::storage::StorageQuota;
use filehub_entity::user::{Plan, User};

use crate::context::RequestContext;

/// Usage summary shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageUsage {
    /// Used, total and available bytes.
    #[serde(flatten)]
    pub quota: StorageQuota,
    /// Current plan.
    pub plan: Plan,
    /// Per-file cap of the plan.
    pub max_file_size_bytes: i64,
}

/// Enforces and maintains per-user storage quotas.
#[derive(Clone)]
pub struct QuotaService {
    /// User persistence.
    users: Arc<dyn UserStore>,
}

impl std::fmt::Debug for QuotaService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuotaService").finish()
    }
}

impl QuotaService {
    /// Creates a new quota service.
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    async fn user(&self, user_id: Uuid) -> Result<User, AppError> {
        self.users
            .find_by_id(user_id)
            .await?
            .or_not_found(format!("User {user_id} not found"))
    }

    /// Current plan of a user.
    pub async fn plan(&self, user_id: Uuid) -> Result<Plan, AppError> {
        Ok(self.user(user_id).await?.plan)
    }

    /// Read-only check that `bytes` more would still fit.
    pub async fn check(&self, user_id: Uuid, bytes: i64) -> Result<(), AppError> {
        let user = self.user(user_id).await?;
        if user.quota().would_exceed(bytes) {
            return Err(AppError::quota_exceeded(format!(
                "Storage quota exceeded: {} of {} bytes used, {} more requested",
                user.storage_used, user.storage_limit, bytes
            )));
        }
        Ok(())
    }

    /// Atomically claim `bytes` of quota, or fail with `QuotaExceeded`
    /// leaving usage untouched.
    pub async fn reserve(&self, user_id: Uuid, bytes: i64) -> Result<(), AppError> {
        if bytes < 0 {
            return Err(AppError::validation("Cannot reserve a negative size"));
        }
        if self.users.try_reserve(user_id, bytes).await? {
            info!(user_id = %user_id, bytes, "Reserved storage quota");
            return Ok(());
        }

        // Nothing was claimed; tell a missing user apart from a full one.
        let user = self.user(user_id).await?;
        warn!(
            user_id = %user_id,
            bytes,
            used = user.storage_used,
            limit = user.storage_limit,
            "Storage quota exceeded"
        );
        Err(AppError::quota_exceeded(format!(
            "Storage quota exceeded: {} of {} bytes used, {} more requested",
            user.storage_used, user.storage_limit, bytes
        )))
    }

    /// Give back a reservation whose upload did not complete.
    pub async fn release(&self, user_id: Uuid, bytes: i64) -> Result<QuotaAdjustment, AppError> {
        let adjustment = self.adjust(user_id, -bytes).await?;
        info!(user_id = %user_id, bytes, "Released storage reservation");
        Ok(adjustment)
    }

    /// Add `delta` to usage, clamped at zero.
    pub async fn adjust(&self, user_id: Uuid, delta: i64) -> Result<QuotaAdjustment, AppError> {
        let adjustment = self.users.adjust_storage(user_id, delta).await?;
        self.observe(user_id, delta, &adjustment);
        Ok(adjustment)
    }

    /// Log an adjustment applied elsewhere (e.g. inside a purge transaction).
    pub fn observe(&self, user_id: Uuid, delta: i64, adjustment: &QuotaAdjustment) {
        if adjustment.underflow {
            error!(
                user_id = %user_id,
                delta,
                storage_used = adjustment.storage_used,
                "Storage usage underflow, clamped to zero"
            );
        }
    }

    /// Reject a single file larger than the plan allows.
    pub fn check_file_size(&self, plan: Plan, name: &str, size: i64) -> Result<(), AppError> {
        let max = plan.max_file_size_bytes();
        if size > max {
            return Err(AppError::file_too_large(format!(
                "File {name} exceeds the maximum size of {} MB for the {} plan",
                max / (1024 * 1024),
                plan.display_name()
            )));
        }
        Ok(())
    }

    /// Usage summary of the calling user.
    pub async fn usage(&self, ctx: &RequestContext) -> Result<StorageUsage, AppError> {
        let user = self.user(ctx.user_id).await?;
        Ok(StorageUsage {
            quota: user.quota(),
            plan: user.plan,
            max_file_size_bytes: user.plan.max_file_size_bytes(),
        })
    }

    /// Switch a user's plan and apply its storage limit.
    ///
    /// Downgrading below current usage is allowed; further uploads are then
    /// rejected until enough is purged.
    pub async fn change_plan(&self, user_id: Uuid, plan: Plan) -> Result<User, AppError> {
        let user = self.users.update_plan(user_id, plan).await?;
        info!(user_id = %user_id, plan = %plan, limit = user.storage_limit, "Plan changed");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filehub_core::error::ErrorKind;
    use filehub_database::MemoryDatabase;
    use filehub_entity::user::UpsertUser;

    async fn setup() -> (Arc<MemoryDatabase>, QuotaService, Uuid) {
        let db = Arc::new(MemoryDatabase::new());
        let id = Uuid::new_v4();
        db.upsert(&UpsertUser {
            id,
            email: None,
            first_name: None,
            last_name: None,
            profile_image_url: None,
        })
        .await
        .unwrap();
        (db.clone(), QuotaService::new(db), id)
    }

    #[tokio::test]
    async fn test_batch_over_free_limit_is_rejected_without_change() {
        let (db, quota, id) = setup().await;
        quota.adjust(id, 5_000_000_000).await.unwrap();

        let err = quota.reserve(id, 400_000_000).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::QuotaExceeded);
        assert_eq!(err.kind, quota.check(id, 400_000_000).await.unwrap_err().kind);

        let user = UserStore::find_by_id(db.as_ref(), id).await.unwrap().unwrap();
        assert_eq!(user.storage_used, 5_000_000_000);
    }

    #[tokio::test]
    async fn test_reserve_and_release() {
        let (_db, quota, id) = setup().await;

        quota.reserve(id, 1_000).await.unwrap();
        let adj = quota.release(id, 1_000).await.unwrap();
        assert_eq!(adj.storage_used, 0);
        assert!(!adj.underflow);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reservations_never_overcommit() {
        let (db, quota, id) = setup().await;
        let limit = Plan::Free.storage_limit_bytes();
        let size = 500_000_000;

        let attempts = (0..15).map(|_| {
            let quota = quota.clone();
            tokio::spawn(async move { quota.reserve(id, size).await })
        });
        let results = futures::future::join_all(attempts).await;

        let granted = results
            .into_iter()
            .map(|joined| joined.unwrap())
            .filter(Result::is_ok)
            .count() as i64;
        assert_eq!(granted, limit / size);

        let user = UserStore::find_by_id(db.as_ref(), id).await.unwrap().unwrap();
        assert_eq!(user.storage_used, granted * size);
    }

    #[tokio::test]
    async fn test_reserve_for_unknown_user_is_not_found() {
        let (_db, quota, _id) = setup().await;
        let err = quota.reserve(Uuid::new_v4(), 1).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_adjust_underflow_is_clamped() {
        let (_db, quota, id) = setup().await;
        quota.adjust(id, 10).await.unwrap();

        let adj = quota.adjust(id, -11).await.unwrap();
        assert_eq!(adj.storage_used, 0);
        assert!(adj.underflow);
    }

    #[tokio::test]
    async fn test_file_size_cap_is_per_plan() {
        let (_db, quota, _id) = setup().await;
        let hundred_mib = 100 * 1024 * 1024;

        assert!(quota.check_file_size(Plan::Free, "a", hundred_mib).is_ok());
        let err = quota
            .check_file_size(Plan::Free, "a", hundred_mib + 1)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::FileTooLarge);
        assert!(quota.check_file_size(Plan::Pro, "a", hundred_mib + 1).is_ok());
    }

    #[tokio::test]
    async fn test_change_plan_and_usage() {
        let (_db, quota, id) = setup().await;
        quota.adjust(id, 1024).await.unwrap();

        quota.change_plan(id, Plan::Enterprise).await.unwrap();
        let usage = quota.usage(&RequestContext::local(id)).await.unwrap();

        assert_eq!(usage.plan, Plan::Enterprise);
        assert_eq!(usage.quota.used_bytes, 1024);
        assert_eq!(usage.quota.total_bytes, None);
        assert!(quota.check(id, i64::MAX / 2).await.is_ok());
    }
}
