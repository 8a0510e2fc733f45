//! Access resolution for files reached by their owner or through shares.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use filehub_auth::PasswordHasher;
use filehub_core::error::AppError;
use filehub_core::result::OptionExt;
use filehub_database::{NodeStore, ShareStore};
use filehub_entity::node::FileNode;
use filehub_entity::share::{Share, SharePermission};

/// How a requester may reach a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "via", rename_all = "snake_case")]
pub enum Access {
    /// The requester owns the file.
    Owner,
    /// A share grants access.
    Granted {
        /// The granting share. When several grant, the strongest.
        share_id: Uuid,
        /// Permission carried by that share.
        permission: SharePermission,
    },
}

impl Access {
    /// The granting share, if access did not come from ownership.
    pub fn share_id(&self) -> Option<Uuid> {
        match self {
            Self::Owner => None,
            Self::Granted { share_id, .. } => Some(*share_id),
        }
    }

    /// Effective permission. Owners can do everything.
    pub fn permission(&self) -> SharePermission {
        match self {
            Self::Owner => SharePermission::Edit,
            Self::Granted { permission, .. } => *permission,
        }
    }
}

/// Decides whether a requester may access a file.
#[derive(Clone)]
pub struct AccessService {
    /// Node persistence.
    nodes: Arc<dyn NodeStore>,
    /// Share persistence.
    shares: Arc<dyn ShareStore>,
    /// Share password verification.
    hasher: PasswordHasher,
}

impl std::fmt::Debug for AccessService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessService").finish()
    }
}

impl AccessService {
    /// Creates a new access service.
    pub fn new(
        nodes: Arc<dyn NodeStore>,
        shares: Arc<dyn ShareStore>,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            nodes,
            shares,
            hasher,
        }
    }

    /// Resolves how `requester` (anonymous when `None`) may reach `file_id`.
    ///
    /// The owner always gets through. Anyone else needs an unexpired share
    /// that addresses them and whose password, if any, `password` unlocks.
    pub async fn resolve_access(
        &self,
        file_id: Uuid,
        requester: Option<Uuid>,
        password: Option<&str>,
    ) -> Result<(FileNode, Access), AppError> {
        let node = self
            .nodes
            .find_by_id(file_id)
            .await?
            .or_not_found(format!("File {file_id} not found"))?;

        if requester.is_some_and(|id| node.is_owned_by(id)) {
            return Ok((node, Access::Owner));
        }
        if node.is_trashed {
            return Err(AppError::forbidden("Access denied"));
        }

        let now = Utc::now();
        let grant = self
            .shares
            .find_by_file(file_id)
            .await?
            .into_iter()
            .filter(|s| s.admits(requester) && !s.is_expired_at(now))
            .filter(|s| self.hasher.unlocks(password, s.password_hash.as_deref()))
            .max_by_key(|s| s.permission);

        match grant {
            Some(share) => {
                debug!(file_id = %file_id, share_id = %share.id, "Access granted by share");
                Ok((
                    node,
                    Access::Granted {
                        share_id: share.id,
                        permission: share.permission,
                    },
                ))
            }
            None => Err(AppError::forbidden("Access denied")),
        }
    }

    /// Resolves access through one specific share, as used by share links.
    pub async fn resolve_share(
        &self,
        share_id: Uuid,
        requester: Option<Uuid>,
        password: Option<&str>,
    ) -> Result<(FileNode, Share), AppError> {
        let share = self
            .shares
            .find_by_id(share_id)
            .await?
            .or_not_found(format!("Share {share_id} not found"))?;

        if share.is_expired_at(Utc::now()) {
            return Err(AppError::forbidden("Share has expired"));
        }
        if !share.admits(requester) {
            return Err(AppError::forbidden("Access denied"));
        }
        if !self
            .hasher
            .unlocks(password, share.password_hash.as_deref())
        {
            return Err(AppError::forbidden("Invalid share password"));
        }

        let node = self
            .nodes
            .find_by_id(share.file_id)
            .await?
            .or_not_found(format!("File {} not found", share.file_id))?;
        if node.is_trashed && !requester.is_some_and(|id| node.is_owned_by(id)) {
            return Err(AppError::forbidden("Access denied"));
        }

        Ok((node, share))
    }

    /// Counts one download through a share.
    pub async fn record_download(&self, share_id: Uuid) -> Result<i64, AppError> {
        let count = self.shares.increment_download_count(share_id).await?;
        info!(share_id = %share_id, download_count = count, "Share download recorded");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use filehub_core::error::ErrorKind;
    use filehub_entity::share::CreateShare;

    use crate::share::NewShare;
    use crate::testing::Fixture;

    #[tokio::test]
    async fn test_expired_share_denies_access() {
        let fx = Fixture::new().await;
        let owner = fx.user().await;
        let friend = fx.user().await;
        let file = fx.upload(&owner, None, "report.pdf", b"pdf").await;

        ShareStore::create(
            fx.db.as_ref(),
            &CreateShare {
                file_id: file.id,
                owner_id: owner.user_id,
                shared_with_id: Some(friend.user_id),
                permission: SharePermission::Edit,
                password_hash: None,
                expires_at: Some(Utc::now() - Duration::minutes(1)),
            },
        )
        .await
        .unwrap();

        let err = fx
            .access
            .resolve_access(file.id, Some(friend.user_id), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);

        let (_, access) = fx
            .access
            .resolve_access(file.id, Some(owner.user_id), None)
            .await
            .unwrap();
        assert_eq!(access, Access::Owner);
    }

    #[tokio::test]
    async fn test_strongest_granting_share_wins() {
        let fx = Fixture::new().await;
        let owner = fx.user().await;
        let friend = fx.user().await;
        let stranger = fx.user().await;
        let file = fx.upload(&owner, None, "plan.txt", b"plan").await;

        fx.shares
            .create_share(&owner, file.id, NewShare::default())
            .await
            .unwrap();
        let edit = fx
            .shares
            .create_share(
                &owner,
                file.id,
                NewShare {
                    permission: SharePermission::Edit,
                    shared_with: Some(friend.user_id),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let (_, access) = fx
            .access
            .resolve_access(file.id, Some(friend.user_id), None)
            .await
            .unwrap();
        assert_eq!(
            access,
            Access::Granted {
                share_id: edit.id,
                permission: SharePermission::Edit
            }
        );

        let (_, access) = fx
            .access
            .resolve_access(file.id, Some(stranger.user_id), None)
            .await
            .unwrap();
        assert_eq!(access.permission(), SharePermission::View);

        let (_, anonymous) = fx.access.resolve_access(file.id, None, None).await.unwrap();
        assert_eq!(anonymous.permission(), SharePermission::View);
    }

    #[tokio::test]
    async fn test_password_protected_link() {
        let fx = Fixture::new().await;
        let owner = fx.user().await;
        let file = fx.upload(&owner, None, "vault.zip", b"zip").await;
        let share = fx
            .shares
            .create_share(
                &owner,
                file.id,
                NewShare {
                    password: Some("hunter2".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(share.is_password_protected());

        for password in [None, Some("wrong")] {
            let err = fx
                .access
                .resolve_share(share.id, None, password)
                .await
                .unwrap_err();
            assert_eq!(err.kind, ErrorKind::Forbidden);
        }
        let (node, _) = fx
            .access
            .resolve_share(share.id, None, Some("hunter2"))
            .await
            .unwrap();
        assert_eq!(node.id, file.id);
    }

    #[tokio::test]
    async fn test_trashed_file_is_hidden_from_recipients() {
        let fx = Fixture::new().await;
        let owner = fx.user().await;
        let file = fx.upload(&owner, None, "old.txt", b"old").await;
        fx.shares
            .create_share(&owner, file.id, NewShare::default())
            .await
            .unwrap();
        fx.files.move_to_trash(&owner, file.id).await.unwrap();

        let err = fx.access.resolve_access(file.id, None, None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);
        assert!(
            fx.access
                .resolve_access(file.id, Some(owner.user_id), None)
                .await
                .is_ok()
        );
    }
}
