//! Activity recording and the recent-activity feed.

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use filehub_core::error::AppError;
use filehub_database::ActivityStore;
use filehub_entity::activity::{Activity, ActivityAction, CreateActivity};

use crate::context::RequestContext;

/// Default number of entries returned by the feed.
pub const DEFAULT_FEED_LIMIT: i64 = 20;
/// Largest page the feed will return.
pub const MAX_FEED_LIMIT: i64 = 100;

/// Appends to and reads the activity log.
#[derive(Clone)]
pub struct ActivityService {
    /// Activity persistence.
    store: Arc<dyn ActivityStore>,
}

impl std::fmt::Debug for ActivityService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityService").finish()
    }
}

impl ActivityService {
    /// Creates a new activity service.
    pub fn new(store: Arc<dyn ActivityStore>) -> Self {
        Self { store }
    }

    /// Appends an entry.
    ///
    /// Awaited so entries of one user keep their order, but a failure is only
    /// logged: the operation being recorded has already happened.
    pub async fn record(
        &self,
        user_id: Uuid,
        file_id: Option<Uuid>,
        action: ActivityAction,
        details: serde_json::Value,
    ) {
        let entry = CreateActivity {
            user_id,
            file_id,
            action,
            details,
        };
        if let Err(e) = self.store.create(&entry).await {
            warn!(
                user_id = %user_id,
                file_id = ?file_id,
                action = ?action,
                error = %e,
                "Failed to record activity"
            );
        }
    }

    /// Newest entries of the calling user.
    ///
    /// `limit` defaults to 20 and is clamped to `1..=100`.
    pub async fn recent(
        &self,
        ctx: &RequestContext,
        limit: Option<i64>,
    ) -> Result<Vec<Activity>, AppError> {
        let limit = limit
            .unwrap_or(DEFAULT_FEED_LIMIT)
            .clamp(1, MAX_FEED_LIMIT);
        self.store.recent(ctx.user_id, limit).await
    }
}
