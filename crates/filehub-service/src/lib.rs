//! # filehub-service
//!
//! Business logic of FileHub: the file tree, quota accounting, sharing and
//! the activity log. Services receive their stores and the blob store at
//! construction time and take a [`RequestContext`] per call.

pub mod activity;
pub mod context;
pub mod file;
pub mod folder;
pub mod naming;
pub mod quota;
pub mod share;
pub mod user;

#[cfg(test)]
pub(crate) mod testing;

pub use activity::ActivityService;
pub use context::RequestContext;
pub use file::{
    Download, DownloadService, EmptyTrashReport, FileService, NodePatch, UploadFile, UploadService,
};
pub use folder::{FolderService, TreeService};
pub use quota::{QuotaService, StorageUsage};
pub use share::{Access, AccessService, NewShare, ShareService};
pub use user::UserService;
