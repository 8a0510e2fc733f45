//! Sign-in upsert and profile lookup.

use std::sync::Arc;

use tracing::info;

use filehub_core::error::AppError;
use filehub_core::result::OptionExt;
use filehub_database::UserStore;
use filehub_entity::user::{UpsertUser, User};

use crate::context::RequestContext;

/// User records as seen by the signed-in user.
#[derive(Clone)]
pub struct UserService {
    /// User persistence.
    users: Arc<dyn UserStore>,
}

impl std::fmt::Debug for UserService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserService").finish()
    }
}

impl UserService {
    /// Creates a new user service.
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Creates the user on first sign-in, otherwise refreshes identity fields.
    pub async fn sign_in(&self, identity: &UpsertUser) -> Result<User, AppError> {
        let user = self.users.upsert(identity).await?;
        if user.created_at == user.updated_at {
            info!(user_id = %user.id, plan = %user.plan, "User created on first sign-in");
        }
        Ok(user)
    }

    /// The caller's own record.
    pub async fn profile(&self, ctx: &RequestContext) -> Result<User, AppError> {
        self.users
            .find_by_id(ctx.user_id)
            .await?
            .or_not_found("User not found")
    }
}
