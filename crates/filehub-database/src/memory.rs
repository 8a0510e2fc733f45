//! In-memory implementation of every store trait.
//!
//! All tables live behind one Tokio mutex, so each trait call is atomic with
//! respect to every other call, matching the transactional guarantees of the
//! PostgreSQL repositories. Suitable for tests and single-process demos only.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use filehub_core::error::AppError;
use filehub_core::result::{AppResult, OptionExt};
use filehub_entity::activity::{Activity, CreateActivity};
use filehub_entity::node::{CreateNode, FileNode, NodeChanges};
use filehub_entity::share::{CreateShare, Share};
use filehub_entity::user::{Plan, UpsertUser, User};

use crate::store::{
    ActivityStore, NodeStore, PurgeReport, QuotaAdjustment, ShareStore, UserStore,
};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<Uuid, User>,
    nodes: BTreeMap<Uuid, FileNode>,
    shares: BTreeMap<Uuid, Share>,
    activities: Vec<Activity>,
    last_tick: Option<DateTime<Utc>>,
}

impl Tables {
    /// Strictly increasing timestamps at database (microsecond) resolution.
    fn tick(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now();
        if let Some(last) = self.last_tick {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last_tick = Some(now);
        now
    }

    fn adjust(&mut self, user_id: Uuid, delta: i64) -> AppResult<QuotaAdjustment> {
        let now = self.tick();
        let user = self
            .users
            .get_mut(&user_id)
            .or_not_found(format!("User {user_id} not found"))?;

        let raw = user.storage_used.saturating_add(delta);
        user.storage_used = raw.max(0);
        user.updated_at = now;

        Ok(QuotaAdjustment {
            storage_used: user.storage_used,
            underflow: raw < 0,
        })
    }

    fn insert_node(&mut self, data: &CreateNode) -> FileNode {
        let now = self.tick();
        let node = FileNode {
            id: Uuid::new_v4(),
            name: data.name.clone(),
            parent_id: data.parent_id,
            user_id: data.user_id,
            kind: data.kind.clone(),
            is_starred: false,
            is_trashed: false,
            trashed_at: None,
            created_at: now,
            updated_at: now,
        };
        self.nodes.insert(node.id, node.clone());
        node
    }

    /// Removes nodes and applies the row-level cascades of the SQL schema.
    fn remove_nodes(&mut self, ids: &HashSet<Uuid>) -> Vec<FileNode> {
        let removed: Vec<FileNode> = ids.iter().filter_map(|id| self.nodes.remove(id)).collect();

        self.shares.retain(|_, share| !ids.contains(&share.file_id));
        for activity in &mut self.activities {
            if activity.file_id.is_some_and(|id| ids.contains(&id)) {
                activity.file_id = None;
            }
        }
        removed
    }
}

/// Mutex-guarded in-memory database.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryDatabase {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self::default()
    }
}

fn sort_by_name(nodes: &mut [FileNode]) {
    nodes.sort_by(|a, b| a.name.cmp(&b.name));
}

#[async_trait]
impl UserStore for MemoryDatabase {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn upsert(&self, data: &UpsertUser) -> AppResult<User> {
        let mut tables = self.tables.lock().await;
        let now = tables.tick();

        let user = tables.users.entry(data.id).or_insert_with(|| {
            let plan = Plan::default();
            User {
                id: data.id,
                email: None,
                first_name: None,
                last_name: None,
                profile_image_url: None,
                plan,
                storage_used: 0,
                storage_limit: plan.storage_limit_bytes(),
                billing_customer_id: None,
                billing_subscription_id: None,
                created_at: now,
                updated_at: now,
            }
        });

        user.email = data.email.clone();
        user.first_name = data.first_name.clone();
        user.last_name = data.last_name.clone();
        user.profile_image_url = data.profile_image_url.clone();
        user.updated_at = now;
        Ok(user.clone())
    }

    async fn try_reserve(&self, id: Uuid, bytes: i64) -> AppResult<bool> {
        let mut tables = self.tables.lock().await;
        let now = tables.tick();

        let Some(user) = tables.users.get_mut(&id) else {
            return Ok(false);
        };
        let fits = user.storage_limit < 0
            || user.storage_used.saturating_add(bytes) <= user.storage_limit;
        if fits {
            user.storage_used = user.storage_used.saturating_add(bytes);
            user.updated_at = now;
        }
        Ok(fits)
    }

    async fn adjust_storage(&self, id: Uuid, delta: i64) -> AppResult<QuotaAdjustment> {
        self.tables.lock().await.adjust(id, delta)
    }

    async fn update_plan(&self, id: Uuid, plan: Plan) -> AppResult<User> {
        let mut tables = self.tables.lock().await;
        let now = tables.tick();

        let user = tables
            .users
            .get_mut(&id)
            .or_not_found(format!("User {id} not found"))?;
        user.plan = plan;
        user.storage_limit = plan.storage_limit_bytes();
        user.updated_at = now;
        Ok(user.clone())
    }
}

#[async_trait]
impl NodeStore for MemoryDatabase {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<FileNode>> {
        Ok(self.tables.lock().await.nodes.get(&id).cloned())
    }

    async fn list_children(
        &self,
        user_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> AppResult<Vec<FileNode>> {
        let tables = self.tables.lock().await;
        let mut children: Vec<FileNode> = tables
            .nodes
            .values()
            .filter(|n| n.user_id == user_id && n.parent_id == parent_id && !n.is_trashed)
            .cloned()
            .collect();

        children.sort_by(|a, b| {
            b.is_folder()
                .cmp(&a.is_folder())
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(children)
    }

    async fn create(&self, data: &CreateNode) -> AppResult<FileNode> {
        Ok(self.tables.lock().await.insert_node(data))
    }

    async fn create_many(&self, data: &[CreateNode]) -> AppResult<Vec<FileNode>> {
        let mut tables = self.tables.lock().await;
        Ok(data.iter().map(|item| tables.insert_node(item)).collect())
    }

    async fn update(&self, id: Uuid, changes: &NodeChanges) -> AppResult<FileNode> {
        let mut tables = self.tables.lock().await;
        let now = tables.tick();

        let node = tables
            .nodes
            .get_mut(&id)
            .or_not_found(format!("Node {id} not found"))?;
        changes.apply_to(node, now);
        Ok(node.clone())
    }

    async fn delete_and_reclaim(&self, user_id: Uuid, id: Uuid) -> AppResult<PurgeReport> {
        let mut tables = self.tables.lock().await;

        let owned = tables.nodes.get(&id).is_some_and(|n| n.user_id == user_id);
        if !owned {
            return Err(AppError::not_found(format!("Node {id} not found")));
        }
        if !tables.users.contains_key(&user_id) {
            return Err(AppError::not_found(format!("User {user_id} not found")));
        }

        let removed = tables.remove_nodes(&HashSet::from([id]));
        let bytes: i64 = removed.iter().map(FileNode::size_bytes).sum();
        let adjustment = tables.adjust(user_id, -bytes)?;

        Ok(PurgeReport {
            removed,
            bytes_reclaimed: bytes,
            adjustment,
        })
    }

    async fn purge_trash(&self, user_id: Uuid) -> AppResult<PurgeReport> {
        let mut tables = self.tables.lock().await;
        if !tables.users.contains_key(&user_id) {
            return Err(AppError::not_found(format!("User {user_id} not found")));
        }

        let mut doomed: HashSet<Uuid> = tables
            .nodes
            .values()
            .filter(|n| n.user_id == user_id && n.is_trashed)
            .map(|n| n.id)
            .collect();

        // Grow the set until no node has a doomed parent; the set guards cycles.
        loop {
            let next: Vec<Uuid> = tables
                .nodes
                .values()
                .filter(|n| {
                    n.user_id == user_id
                        && !doomed.contains(&n.id)
                        && n.parent_id.is_some_and(|p| doomed.contains(&p))
                })
                .map(|n| n.id)
                .collect();
            if next.is_empty() {
                break;
            }
            doomed.extend(next);
        }

        let removed = tables.remove_nodes(&doomed);
        let bytes: i64 = removed.iter().map(FileNode::size_bytes).sum();
        let adjustment = tables.adjust(user_id, -bytes)?;

        Ok(PurgeReport {
            removed,
            bytes_reclaimed: bytes,
            adjustment,
        })
    }

    async fn starred(&self, user_id: Uuid) -> AppResult<Vec<FileNode>> {
        let tables = self.tables.lock().await;
        let mut nodes: Vec<FileNode> = tables
            .nodes
            .values()
            .filter(|n| n.user_id == user_id && n.is_starred && !n.is_trashed)
            .cloned()
            .collect();
        sort_by_name(&mut nodes);
        Ok(nodes)
    }

    async fn recent(&self, user_id: Uuid, limit: i64) -> AppResult<Vec<FileNode>> {
        let tables = self.tables.lock().await;
        let mut nodes: Vec<FileNode> = tables
            .nodes
            .values()
            .filter(|n| n.user_id == user_id && !n.is_folder() && !n.is_trashed)
            .cloned()
            .collect();
        nodes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        nodes.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(nodes)
    }

    async fn trashed(&self, user_id: Uuid) -> AppResult<Vec<FileNode>> {
        let tables = self.tables.lock().await;
        let mut nodes: Vec<FileNode> = tables
            .nodes
            .values()
            .filter(|n| n.user_id == user_id && n.is_trashed)
            .cloned()
            .collect();
        nodes.sort_by(|a, b| b.trashed_at.cmp(&a.trashed_at));
        Ok(nodes)
    }

    async fn shared_with(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<Vec<FileNode>> {
        let tables = self.tables.lock().await;
        let granted: HashSet<Uuid> = tables
            .shares
            .values()
            .filter(|s| s.shared_with_id == Some(user_id) && !s.is_expired_at(now))
            .map(|s| s.file_id)
            .collect();

        let mut nodes: Vec<FileNode> = granted
            .iter()
            .filter_map(|id| tables.nodes.get(id))
            .filter(|n| !n.is_trashed)
            .cloned()
            .collect();
        sort_by_name(&mut nodes);
        Ok(nodes)
    }
}

#[async_trait]
impl ShareStore for MemoryDatabase {
    async fn create(&self, data: &CreateShare) -> AppResult<Share> {
        let mut tables = self.tables.lock().await;
        if !tables.nodes.contains_key(&data.file_id) {
            return Err(AppError::not_found(format!("Node {} not found", data.file_id)));
        }
        let now = tables.tick();

        let share = Share {
            id: Uuid::new_v4(),
            file_id: data.file_id,
            owner_id: data.owner_id,
            shared_with_id: data.shared_with_id,
            share_type: data.share_type(),
            permission: data.permission,
            password_hash: data.password_hash.clone(),
            expires_at: data.expires_at,
            download_count: 0,
            created_at: now,
        };
        tables.shares.insert(share.id, share.clone());
        Ok(share)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Share>> {
        Ok(self.tables.lock().await.shares.get(&id).cloned())
    }

    async fn find_by_file(&self, file_id: Uuid) -> AppResult<Vec<Share>> {
        let tables = self.tables.lock().await;
        let mut shares: Vec<Share> = tables
            .shares
            .values()
            .filter(|s| s.file_id == file_id)
            .cloned()
            .collect();
        shares.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(shares)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.tables.lock().await.shares.remove(&id).is_some())
    }

    async fn increment_download_count(&self, id: Uuid) -> AppResult<i64> {
        let mut tables = self.tables.lock().await;
        let share = tables
            .shares
            .get_mut(&id)
            .or_not_found(format!("Share {id} not found"))?;
        share.download_count += 1;
        Ok(share.download_count)
    }
}

#[async_trait]
impl ActivityStore for MemoryDatabase {
    async fn create(&self, data: &CreateActivity) -> AppResult<Activity> {
        let mut tables = self.tables.lock().await;
        let now = tables.tick();

        let activity = Activity {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            file_id: data.file_id,
            action: data.action,
            details: data.details.clone(),
            created_at: now,
        };
        tables.activities.push(activity.clone());
        Ok(activity)
    }

    async fn recent(&self, user_id: Uuid, limit: i64) -> AppResult<Vec<Activity>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .activities
            .iter()
            .rev()
            .filter(|a| a.user_id == user_id)
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }
}
