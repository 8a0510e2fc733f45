//! File tree operations, batch upload and download.

pub mod download;
pub mod service;
pub mod upload;

pub use download::{Download, DownloadService};
pub use service::{EmptyTrashReport, FileService, NodePatch};
pub use upload::{UploadFile, UploadService};
