//! # filehub-storage
//!
//! Blob storage for FileHub: the [`BlobStore`] reference facade and the
//! local filesystem provider.

pub mod blob;
pub mod providers;

pub use blob::{BlobStore, blob_key, guess_mime_type, resolve_mime_type};
pub use providers::LocalStorageProvider;
