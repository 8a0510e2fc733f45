//! Share creation, listing and revocation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use filehub_auth::PasswordHasher;
use filehub_core::error::AppError;
use filehub_core::result::OptionExt;
use filehub_database::{NodeStore, ShareStore, UserStore};
use filehub_entity::activity::ActivityAction;
use filehub_entity::share::{CreateShare, Share, SharePermission};

use crate::activity::ActivityService;
use crate::context::RequestContext;
use crate::folder::tree::owned_node;

/// Parameters for a new share.
#[derive(Debug, Clone, Default)]
pub struct NewShare {
    /// Permission level.
    pub permission: SharePermission,
    /// Plaintext password; empty counts as none.
    pub password: Option<String>,
    /// Expiry, must be in the future.
    pub expires_at: Option<DateTime<Utc>>,
    /// Recipient. `None` creates a link share.
    pub shared_with: Option<Uuid>,
}

/// Manages the shares of a file owner.
#[derive(Clone)]
pub struct ShareService {
    /// Node persistence.
    nodes: Arc<dyn NodeStore>,
    /// Share persistence.
    shares: Arc<dyn ShareStore>,
    /// User persistence, for recipient lookups.
    users: Arc<dyn UserStore>,
    /// Share password hashing.
    hasher: PasswordHasher,
    /// Activity log.
    activity: ActivityService,
}

impl std::fmt::Debug for ShareService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShareService").finish()
    }
}

impl ShareService {
    /// Creates a new share service.
    pub fn new(
        nodes: Arc<dyn NodeStore>,
        shares: Arc<dyn ShareStore>,
        users: Arc<dyn UserStore>,
        hasher: PasswordHasher,
        activity: ActivityService,
    ) -> Self {
        Self {
            nodes,
            shares,
            users,
            hasher,
            activity,
        }
    }

    /// Shares a file the caller owns.
    pub async fn create_share(
        &self,
        ctx: &RequestContext,
        file_id: Uuid,
        req: NewShare,
    ) -> Result<Share, AppError> {
        let node = owned_node(self.nodes.as_ref(), ctx.user_id, file_id).await?;
        if node.is_folder() {
            return Err(AppError::validation("Only files can be shared"));
        }
        if node.is_trashed {
            return Err(AppError::validation("Cannot share a file in the trash"));
        }
        if req.expires_at.is_some_and(|at| at <= Utc::now()) {
            return Err(AppError::validation("Expiry must be in the future"));
        }
        if let Some(recipient) = req.shared_with {
            if recipient == ctx.user_id {
                return Err(AppError::validation("Cannot share a file with yourself"));
            }
            self.users
                .find_by_id(recipient)
                .await?
                .or_not_found(format!("User {recipient} not found"))?;
        }

        let password_hash = match req.password.as_deref().filter(|p| !p.is_empty()) {
            Some(password) => Some(self.hasher.hash_password(password)?),
            None => None,
        };

        let share = self
            .shares
            .create(&CreateShare {
                file_id,
                owner_id: ctx.user_id,
                shared_with_id: req.shared_with,
                permission: req.permission,
                password_hash,
                expires_at: req.expires_at,
            })
            .await?;

        info!(
            user_id = %ctx.user_id,
            file_id = %file_id,
            share_id = %share.id,
            share_type = ?share.share_type,
            "Share created"
        );
        self.activity
            .record(
                ctx.user_id,
                Some(file_id),
                ActivityAction::Share,
                json!({
                    "fileName": node.name,
                    "shareType": share.share_type,
                    "permission": share.permission,
                }),
            )
            .await;

        Ok(share)
    }

    /// Shares of a file the caller owns, oldest first.
    pub async fn list_shares(
        &self,
        ctx: &RequestContext,
        file_id: Uuid,
    ) -> Result<Vec<Share>, AppError> {
        owned_node(self.nodes.as_ref(), ctx.user_id, file_id).await?;
        self.shares.find_by_file(file_id).await
    }

    /// Deletes a share the caller created.
    pub async fn revoke_share(&self, ctx: &RequestContext, share_id: Uuid) -> Result<(), AppError> {
        let share = self
            .shares
            .find_by_id(share_id)
            .await?
            .or_not_found(format!("Share {share_id} not found"))?;
        if share.owner_id != ctx.user_id {
            return Err(AppError::forbidden("Not authorized"));
        }

        if !self.shares.delete(share_id).await? {
            return Err(AppError::not_found(format!("Share {share_id} not found")));
        }

        info!(user_id = %ctx.user_id, share_id = %share_id, "Share revoked");
        self.activity
            .record(
                ctx.user_id,
                Some(share.file_id),
                ActivityAction::Unshare,
                json!({ "shareId": share_id }),
            )
            .await;
        Ok(())
    }
}
