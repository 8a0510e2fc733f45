//! File tree repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use filehub_core::error::{AppError, ErrorKind};
use filehub_core::result::{AppResult, OptionExt};
use filehub_entity::node::{CreateNode, FOLDER_MIME_TYPE, FileNode, NodeChanges, NodeKind, NodeRow};

use super::user::adjust_storage_with;
use crate::store::{NodeStore, PurgeReport};

/// Repository for the `files` table, which holds both files and folders.
#[derive(Debug, Clone)]
pub struct NodeRepository {
    pool: PgPool,
}

impl NodeRepository {
    /// Create a new node repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn into_nodes(rows: Vec<NodeRow>) -> AppResult<Vec<FileNode>> {
    rows.into_iter().map(FileNode::try_from).collect()
}

fn db_err(message: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::with_source(ErrorKind::Database, message, e)
}

async fn insert_node<'e, E>(executor: E, data: &CreateNode) -> AppResult<FileNode>
where
    E: PgExecutor<'e>,
{
    let (mime_type, size_bytes, blob_ref, is_folder) = match &data.kind {
        NodeKind::File {
            mime_type,
            size_bytes,
            blob_ref,
        } => (mime_type.as_str(), *size_bytes, Some(blob_ref.as_str()), false),
        NodeKind::Folder => (FOLDER_MIME_TYPE, 0, None, true),
    };

    let row = sqlx::query_as::<_, NodeRow>(
        "INSERT INTO files (name, mime_type, size_bytes, blob_ref, parent_id, user_id, is_folder) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
    )
    .bind(&data.name)
    .bind(mime_type)
    .bind(size_bytes)
    .bind(blob_ref)
    .bind(data.parent_id)
    .bind(data.user_id)
    .bind(is_folder)
    .fetch_one(executor)
    .await
    .map_err(db_err("Failed to create node"))?;

    FileNode::try_from(row)
}

#[async_trait]
impl NodeStore for NodeRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<FileNode>> {
        sqlx::query_as::<_, NodeRow>("SELECT * FROM files WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to find node"))?
            .map(FileNode::try_from)
            .transpose()
    }

    async fn list_children(
        &self,
        user_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> AppResult<Vec<FileNode>> {
        let rows = sqlx::query_as::<_, NodeRow>(
            "SELECT * FROM files \
             WHERE user_id = $1 AND parent_id IS NOT DISTINCT FROM $2 AND NOT is_trashed \
             ORDER BY is_folder DESC, name COLLATE \"C\" ASC",
        )
        .bind(user_id)
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list children"))?;

        into_nodes(rows)
    }

    async fn create(&self, data: &CreateNode) -> AppResult<FileNode> {
        insert_node(&self.pool, data).await
    }

    async fn create_many(&self, data: &[CreateNode]) -> AppResult<Vec<FileNode>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin transaction"))?;

        let mut created = Vec::with_capacity(data.len());
        for item in data {
            created.push(insert_node(&mut *tx, item).await?);
        }

        tx.commit()
            .await
            .map_err(db_err("Failed to commit node batch"))?;
        Ok(created)
    }

    async fn update(&self, id: Uuid, changes: &NodeChanges) -> AppResult<FileNode> {
        let row = sqlx::query_as::<_, NodeRow>(
            "UPDATE files SET \
             name = COALESCE($2::text, name), \
             is_starred = COALESCE($3::boolean, is_starred), \
             parent_id = CASE WHEN $4 THEN $5::uuid ELSE parent_id END, \
             is_trashed = CASE WHEN $6 THEN $7::timestamptz IS NOT NULL ELSE is_trashed END, \
             trashed_at = CASE WHEN $6 THEN $7::timestamptz ELSE trashed_at END, \
             updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(changes.name.as_deref())
        .bind(changes.is_starred)
        .bind(changes.parent_id.is_some())
        .bind(changes.parent_id.flatten())
        .bind(changes.trashed_at.is_some())
        .bind(changes.trashed_at.flatten())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to update node"))?
        .or_not_found(format!("Node {id} not found"))?;

        FileNode::try_from(row)
    }

    async fn delete_and_reclaim(&self, user_id: Uuid, id: Uuid) -> AppResult<PurgeReport> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin transaction"))?;

        let row = sqlx::query_as::<_, NodeRow>(
            "DELETE FROM files WHERE id = $1 AND user_id = $2 RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err("Failed to delete node"))?
        .or_not_found(format!("Node {id} not found"))?;

        let node = FileNode::try_from(row)?;
        let bytes = node.size_bytes();
        let adjustment = adjust_storage_with(&mut *tx, user_id, -bytes).await?;

        tx.commit()
            .await
            .map_err(db_err("Failed to commit node deletion"))?;

        Ok(PurgeReport {
            removed: vec![node],
            bytes_reclaimed: bytes,
            adjustment,
        })
    }

    async fn purge_trash(&self, user_id: Uuid) -> AppResult<PurgeReport> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin transaction"))?;

        // UNION (not UNION ALL) terminates on parent cycles.
        let rows = sqlx::query_as::<_, NodeRow>(
            "WITH RECURSIVE doomed AS ( \
                 SELECT id FROM files WHERE user_id = $1 AND is_trashed \
                 UNION \
                 SELECT f.id FROM files f JOIN doomed d ON f.parent_id = d.id WHERE f.user_id = $1 \
             ) \
             DELETE FROM files WHERE id IN (SELECT id FROM doomed) RETURNING *",
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_err("Failed to purge trash"))?;

        let removed = into_nodes(rows)?;
        let bytes: i64 = removed.iter().map(FileNode::size_bytes).sum();
        let adjustment = adjust_storage_with(&mut *tx, user_id, -bytes).await?;

        tx.commit()
            .await
            .map_err(db_err("Failed to commit trash purge"))?;

        Ok(PurgeReport {
            removed,
            bytes_reclaimed: bytes,
            adjustment,
        })
    }

    async fn starred(&self, user_id: Uuid) -> AppResult<Vec<FileNode>> {
        let rows = sqlx::query_as::<_, NodeRow>(
            "SELECT * FROM files WHERE user_id = $1 AND is_starred AND NOT is_trashed \
             ORDER BY name COLLATE \"C\" ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list starred nodes"))?;

        into_nodes(rows)
    }

    async fn recent(&self, user_id: Uuid, limit: i64) -> AppResult<Vec<FileNode>> {
        let rows = sqlx::query_as::<_, NodeRow>(
            "SELECT * FROM files WHERE user_id = $1 AND NOT is_folder AND NOT is_trashed \
             ORDER BY updated_at DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list recent files"))?;

        into_nodes(rows)
    }

    async fn trashed(&self, user_id: Uuid) -> AppResult<Vec<FileNode>> {
        let rows = sqlx::query_as::<_, NodeRow>(
            "SELECT * FROM files WHERE user_id = $1 AND is_trashed ORDER BY trashed_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list trashed nodes"))?;

        into_nodes(rows)
    }

    async fn shared_with(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<Vec<FileNode>> {
        let rows = sqlx::query_as::<_, NodeRow>(
            "SELECT f.* FROM files f \
             WHERE NOT f.is_trashed AND EXISTS ( \
                 SELECT 1 FROM shares s WHERE s.file_id = f.id AND s.shared_with_id = $1 \
                 AND (s.expires_at IS NULL OR s.expires_at > $2)) \
             ORDER BY f.name COLLATE \"C\" ASC",
        )
        .bind(user_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list shared files"))?;

        into_nodes(rows)
    }
}
