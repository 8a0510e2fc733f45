//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use filehub_auth::{JwtDecoder, PasswordHasher};
use filehub_core::config::AppConfig;
use filehub_database::{
    ActivityStore, DatabasePool, MemoryDatabase, NodeStore, Repositories, ShareStore, UserStore,
};
use filehub_service::{
    AccessService, ActivityService, DownloadService, FileService, FolderService, QuotaService,
    ShareService, TreeService, UploadService, UserService,
};
use filehub_storage::BlobStore;

/// Store handles the services are built from.
#[derive(Clone)]
pub struct Stores {
    /// Users and storage counters.
    pub users: Arc<dyn UserStore>,
    /// The file tree.
    pub nodes: Arc<dyn NodeStore>,
    /// Shares.
    pub shares: Arc<dyn ShareStore>,
    /// Activity log.
    pub activities: Arc<dyn ActivityStore>,
}

impl Stores {
    /// All four stores backed by one in-memory database.
    pub fn in_memory(db: Arc<MemoryDatabase>) -> Self {
        Self {
            users: db.clone(),
            nodes: db.clone(),
            shares: db.clone(),
            activities: db,
        }
    }
}

impl From<Repositories> for Stores {
    fn from(repos: Repositories) -> Self {
        Self {
            users: Arc::new(repos.users),
            nodes: Arc::new(repos.nodes),
            shares: Arc::new(repos.shares),
            activities: Arc::new(repos.activities),
        }
    }
}

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,

    // ── Infrastructure ───────────────────────────────────────
    /// PostgreSQL pool, absent when running on in-memory stores
    pub database: Option<DatabasePool>,
    /// Blob storage
    pub blobs: BlobStore,
    /// Sign-in token validation
    pub jwt_decoder: Arc<JwtDecoder>,

    // ── Services ─────────────────────────────────────────────
    /// Sign-in upsert and profile
    pub user_service: Arc<UserService>,
    /// Quota accounting
    pub quota_service: Arc<QuotaService>,
    /// Activity log
    pub activity_service: Arc<ActivityService>,
    /// File tree operations
    pub file_service: Arc<FileService>,
    /// Folder creation
    pub folder_service: Arc<FolderService>,
    /// Breadcrumbs
    pub tree_service: Arc<TreeService>,
    /// Batch upload
    pub upload_service: Arc<UploadService>,
    /// Downloads
    pub download_service: Arc<DownloadService>,
    /// Share management
    pub share_service: Arc<ShareService>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("database", &self.database)
            .field("blobs", &self.blobs)
            .finish()
    }
}

impl AppState {
    /// Wire every service over the given stores and blob store.
    pub fn new(config: AppConfig, stores: Stores, blobs: BlobStore) -> Self {
        let hasher = PasswordHasher::new();
        let activity = ActivityService::new(stores.activities.clone());
        let quota = QuotaService::new(stores.users.clone());
        let access = AccessService::new(stores.nodes.clone(), stores.shares.clone(), hasher.clone());

        let file_service = FileService::new(
            stores.nodes.clone(),
            blobs.clone(),
            quota.clone(),
            activity.clone(),
        );
        let upload_service = UploadService::new(
            stores.nodes.clone(),
            blobs.clone(),
            quota.clone(),
            activity.clone(),
            config.storage.clone(),
        );
        let share_service = ShareService::new(
            stores.nodes.clone(),
            stores.shares.clone(),
            stores.users.clone(),
            hasher,
            activity.clone(),
        );

        Self {
            jwt_decoder: Arc::new(JwtDecoder::new(&config.auth)),
            user_service: Arc::new(UserService::new(stores.users.clone())),
            folder_service: Arc::new(FolderService::new(stores.nodes.clone(), activity.clone())),
            tree_service: Arc::new(TreeService::new(stores.nodes.clone())),
            download_service: Arc::new(DownloadService::new(
                access,
                blobs.clone(),
                activity.clone(),
            )),
            file_service: Arc::new(file_service),
            upload_service: Arc::new(upload_service),
            share_service: Arc::new(share_service),
            quota_service: Arc::new(quota),
            activity_service: Arc::new(activity),
            config: Arc::new(config),
            database: None,
            blobs,
        }
    }

    /// Attach the PostgreSQL pool backing the stores.
    pub fn with_database(mut self, database: DatabasePool) -> Self {
        self.database = Some(database);
        self
    }
}
