//! User repository implementation.

use async_trait::async_trait;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use filehub_core::error::{AppError, ErrorKind};
use filehub_core::result::{AppResult, OptionExt};
use filehub_entity::user::{Plan, UpsertUser, User};

use crate::store::{QuotaAdjustment, UserStore};

/// Repository for users and their storage counters.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Clamped `storage_used` change usable inside a caller's transaction.
///
/// The previous value is locked and read in the same statement so the
/// underflow flag reflects exactly the row that was updated.
pub(crate) async fn adjust_storage_with<'e, E>(
    executor: E,
    user_id: Uuid,
    delta: i64,
) -> AppResult<QuotaAdjustment>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, QuotaAdjustment>(
        "WITH prev AS (SELECT id, storage_used FROM users WHERE id = $1 FOR UPDATE) \
         UPDATE users u SET storage_used = GREATEST(prev.storage_used + $2, 0), updated_at = NOW() \
         FROM prev WHERE u.id = prev.id \
         RETURNING u.storage_used, (prev.storage_used + $2 < 0) AS underflow",
    )
    .bind(user_id)
    .bind(delta)
    .fetch_optional(executor)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to adjust storage usage", e))?
    .or_not_found(format!("User {user_id} not found"))
}

#[async_trait]
impl UserStore for UserRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user by id", e))
    }

    async fn upsert(&self, data: &UpsertUser) -> AppResult<User> {
        let plan = Plan::default();
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, email, first_name, last_name, profile_image_url, plan, storage_limit) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (id) DO UPDATE SET email = EXCLUDED.email, first_name = EXCLUDED.first_name, \
             last_name = EXCLUDED.last_name, profile_image_url = EXCLUDED.profile_image_url, \
             updated_at = NOW() \
             RETURNING *",
        )
        .bind(data.id)
        .bind(&data.email)
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(&data.profile_image_url)
        .bind(plan)
        .bind(plan.storage_limit_bytes())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to upsert user", e))
    }

    async fn try_reserve(&self, id: Uuid, bytes: i64) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET storage_used = storage_used + $2, updated_at = NOW() \
             WHERE id = $1 AND (storage_limit < 0 OR storage_used + $2 <= storage_limit)",
        )
        .bind(id)
        .bind(bytes)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to reserve storage", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn adjust_storage(&self, id: Uuid, delta: i64) -> AppResult<QuotaAdjustment> {
        adjust_storage_with(&self.pool, id, delta).await
    }

    async fn update_plan(&self, id: Uuid, plan: Plan) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET plan = $2, storage_limit = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(plan)
        .bind(plan.storage_limit_bytes())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update user plan", e))?
        .or_not_found(format!("User {id} not found"))
    }
}
