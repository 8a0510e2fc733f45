//! Service wiring over the in-memory store and a temporary blob directory.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tempfile::TempDir;
use uuid::Uuid;

use filehub_auth::PasswordHasher;
use filehub_core::config::StorageConfig;
use filehub_core::error::AppError;
use filehub_core::result::AppResult;
use filehub_core::traits::storage::{ByteStream, StorageProvider};
use filehub_database::{MemoryDatabase, UserStore};
use filehub_entity::user::UpsertUser;
use filehub_storage::{BlobStore, LocalStorageProvider};

use crate::activity::ActivityService;
use crate::context::RequestContext;
use crate::file::{DownloadService, FileService, UploadFile, UploadService};
use crate::folder::{FolderService, TreeService};
use crate::quota::QuotaService;
use crate::share::{AccessService, ShareService};

/// Local provider whose deletes always fail.
#[derive(Debug)]
pub(crate) struct StuckDeletes(pub LocalStorageProvider);

#[async_trait]
impl StorageProvider for StuckDeletes {
    fn provider_type(&self) -> &str {
        "stuck"
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.0.health_check().await
    }

    async fn read(&self, path: &str) -> AppResult<ByteStream> {
        self.0.read(path).await
    }

    async fn read_bytes(&self, path: &str) -> AppResult<Bytes> {
        self.0.read_bytes(path).await
    }

    async fn write(&self, path: &str, data: Bytes) -> AppResult<()> {
        self.0.write(path, data).await
    }

    async fn delete(&self, _path: &str) -> AppResult<()> {
        Err(AppError::storage("device busy"))
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        self.0.exists(path).await
    }
}

pub(crate) struct Fixture {
    pub db: Arc<MemoryDatabase>,
    pub files: FileService,
    pub folders: FolderService,
    pub tree: TreeService,
    pub uploads: UploadService,
    pub shares: ShareService,
    pub access: AccessService,
    pub downloads: DownloadService,
    dir: TempDir,
}

impl Fixture {
    pub async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let provider = LocalStorageProvider::new(dir.path()).await.unwrap();
        Self::build(dir, Arc::new(provider))
    }

    /// Blob deletes fail, everything else works.
    pub async fn with_stuck_deletes() -> Self {
        let dir = TempDir::new().unwrap();
        let provider = LocalStorageProvider::new(dir.path()).await.unwrap();
        Self::build(dir, Arc::new(StuckDeletes(provider)))
    }

    /// Only `writes` blob writes succeed.
    pub async fn with_write_budget(writes: usize) -> Self {
        let dir = TempDir::new().unwrap();
        let inner = LocalStorageProvider::new(dir.path()).await.unwrap();
        let provider = WriteBudget {
            inner,
            budget: std::sync::atomic::AtomicUsize::new(writes),
        };
        Self::build(dir, Arc::new(provider))
    }

    fn build(dir: TempDir, provider: Arc<dyn StorageProvider>) -> Self {
        let db = Arc::new(MemoryDatabase::new());
        let blobs = BlobStore::new(provider);
        let hasher = PasswordHasher::new();
        let activity = ActivityService::new(db.clone());
        let quota = QuotaService::new(db.clone());
        let access = AccessService::new(db.clone(), db.clone(), hasher.clone());

        Self {
            files: FileService::new(db.clone(), blobs.clone(), quota.clone(), activity.clone()),
            folders: FolderService::new(db.clone(), activity.clone()),
            tree: TreeService::new(db.clone()),
            uploads: UploadService::new(
                db.clone(),
                blobs.clone(),
                quota,
                activity.clone(),
                StorageConfig::default(),
            ),
            shares: ShareService::new(db.clone(), db.clone(), db.clone(), hasher, activity.clone()),
            downloads: DownloadService::new(access.clone(), blobs, activity),
            access,
            db,
            dir,
        }
    }

    /// Signs in a fresh free-plan user.
    pub async fn user(&self) -> RequestContext {
        let id = Uuid::new_v4();
        self.db
            .upsert(&UpsertUser {
                id,
                email: Some(format!("{id}@example.com")),
                first_name: None,
                last_name: None,
                profile_image_url: None,
            })
            .await
            .unwrap();
        RequestContext::local(id)
    }

    pub async fn storage_used(&self, ctx: &RequestContext) -> i64 {
        UserStore::find_by_id(self.db.as_ref(), ctx.user_id)
            .await
            .unwrap()
            .unwrap()
            .storage_used
    }

    /// Number of blobs on disk.
    pub fn blob_count(&self) -> usize {
        fn walk(dir: &Path) -> usize {
            std::fs::read_dir(dir)
                .unwrap()
                .map(|entry| {
                    let path = entry.unwrap().path();
                    if path.is_dir() { walk(&path) } else { 1 }
                })
                .sum()
        }
        walk(self.dir.path())
    }

    /// Uploads one file with the given content.
    pub async fn upload(
        &self,
        ctx: &RequestContext,
        parent_id: Option<Uuid>,
        name: &str,
        content: &'static [u8],
    ) -> filehub_entity::node::FileNode {
        self.uploads
            .upload_batch(ctx, parent_id, vec![file(name, content)])
            .await
            .unwrap()
            .remove(0)
    }
}

pub(crate) fn file(name: &str, content: &'static [u8]) -> UploadFile {
    UploadFile {
        name: name.to_string(),
        mime_type: None,
        data: Bytes::from_static(content),
    }
}

/// Local provider whose writes fail once `budget` writes have succeeded.
#[derive(Debug)]
pub(crate) struct WriteBudget {
    pub inner: LocalStorageProvider,
    pub budget: std::sync::atomic::AtomicUsize,
}

#[async_trait]
impl StorageProvider for WriteBudget {
    fn provider_type(&self) -> &str {
        "budget"
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }

    async fn read(&self, path: &str) -> AppResult<ByteStream> {
        self.inner.read(path).await
    }

    async fn read_bytes(&self, path: &str) -> AppResult<Bytes> {
        self.inner.read_bytes(path).await
    }

    async fn write(&self, path: &str, data: Bytes) -> AppResult<()> {
        use std::sync::atomic::Ordering;
        let left = self.budget.load(Ordering::SeqCst);
        if left == 0 {
            return Err(AppError::storage("disk full"));
        }
        self.budget.store(left - 1, Ordering::SeqCst);
        self.inner.write(path, data).await
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        self.inner.delete(path).await
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        self.inner.exists(path).await
    }
}
