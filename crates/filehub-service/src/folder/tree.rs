//! Ancestor walks over the parent-pointer tree: breadcrumbs, cycle checks
//! and parent validation.

use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;

use filehub_core::error::AppError;
use filehub_database::NodeStore;
use filehub_entity::node::{Crumb, FileNode};

use crate::context::RequestContext;

/// Most parent hops any walk will follow.
pub const MAX_TREE_DEPTH: usize = 1000;

/// Why an ancestor walk stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkEnd {
    /// Reached a node without a parent.
    Root,
    /// A `parent_id` pointed at a node that does not exist.
    Dangling,
    /// A node was reached twice.
    Cycle,
    /// More than [`MAX_TREE_DEPTH`] hops.
    TooDeep,
}

/// Nodes visited walking up from a start node, start first.
#[derive(Debug, Clone)]
pub struct Ancestry {
    /// Visited nodes, nearest first.
    pub chain: Vec<FileNode>,
    /// How the walk ended.
    pub end: WalkEnd,
}

impl Ancestry {
    /// Whether the walk reached the root cleanly.
    pub fn is_intact(&self) -> bool {
        self.end == WalkEnd::Root
    }

    /// Whether `id` is on the chain.
    pub fn contains(&self, id: Uuid) -> bool {
        self.chain.iter().any(|n| n.id == id)
    }

    /// Whether any node on the chain is trashed.
    pub fn any_trashed(&self) -> bool {
        self.chain.iter().any(|n| n.is_trashed)
    }
}

/// Walk parent pointers starting at `start` (inclusive).
pub(crate) async fn walk_up(
    nodes: &dyn NodeStore,
    start: Option<Uuid>,
) -> Result<Ancestry, AppError> {
    let mut chain = Vec::new();
    let mut seen = HashSet::new();
    let mut cursor = start;

    while let Some(id) = cursor {
        if chain.len() >= MAX_TREE_DEPTH {
            return Ok(Ancestry {
                chain,
                end: WalkEnd::TooDeep,
            });
        }
        if !seen.insert(id) {
            return Ok(Ancestry {
                chain,
                end: WalkEnd::Cycle,
            });
        }
        let Some(node) = nodes.find_by_id(id).await? else {
            return Ok(Ancestry {
                chain,
                end: WalkEnd::Dangling,
            });
        };
        cursor = node.parent_id;
        chain.push(node);
    }

    Ok(Ancestry {
        chain,
        end: WalkEnd::Root,
    })
}

/// Load a node the caller owns: `NotFound` if missing, `Forbidden` otherwise.
pub(crate) async fn owned_node(
    nodes: &dyn NodeStore,
    user_id: Uuid,
    id: Uuid,
) -> Result<FileNode, AppError> {
    let node = nodes
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("File {id} not found")))?;
    if !node.is_owned_by(user_id) {
        return Err(AppError::forbidden("Not authorized"));
    }
    Ok(node)
}

/// Validate a destination folder for create and move.
///
/// Missing is `NotFound`, another owner's is `Forbidden`, a file or a trashed
/// folder is `Validation`.
pub(crate) async fn require_parent(
    nodes: &dyn NodeStore,
    user_id: Uuid,
    parent_id: Option<Uuid>,
) -> Result<Option<FileNode>, AppError> {
    let Some(parent_id) = parent_id else {
        return Ok(None);
    };
    let parent = nodes
        .find_by_id(parent_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Parent folder {parent_id} not found")))?;

    if !parent.is_owned_by(user_id) {
        return Err(AppError::forbidden("Not authorized to use this folder"));
    }
    if !parent.is_folder() {
        return Err(AppError::validation("Parent is not a folder"));
    }
    if parent.is_trashed {
        return Err(AppError::validation("Parent folder is in the trash"));
    }
    Ok(Some(parent))
}

/// Breadcrumb paths for the folder views.
#[derive(Clone)]
pub struct TreeService {
    /// Node persistence.
    nodes: Arc<dyn NodeStore>,
}

impl std::fmt::Debug for TreeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeService").finish()
    }
}

impl TreeService {
    /// Creates a new tree service.
    pub fn new(nodes: Arc<dyn NodeStore>) -> Self {
        Self { nodes }
    }

    /// Root-first path ending with the node itself.
    ///
    /// A broken chain (cycle, dangling parent, too deep) yields an empty
    /// path rather than an error.
    pub async fn breadcrumb(&self, ctx: &RequestContext, id: Uuid) -> Result<Vec<Crumb>, AppError> {
        owned_node(self.nodes.as_ref(), ctx.user_id, id).await?;
        self.path_of(id).await
    }

    /// Breadcrumb without an ownership check.
    pub async fn path_of(&self, id: Uuid) -> Result<Vec<Crumb>, AppError> {
        let ancestry = walk_up(self.nodes.as_ref(), Some(id)).await?;
        if !ancestry.is_intact() {
            return Ok(Vec::new());
        }
        Ok(ancestry.chain.iter().rev().map(Crumb::from).collect())
    }
}
