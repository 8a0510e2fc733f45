//! Blob reference store.
//!
//! File bytes live behind opaque references of the form
//! `{user_id}/{uuid}{.ext}`. Services never build paths themselves; they hand
//! bytes to [`BlobStore::put`] and keep the returned reference on the node.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, warn};
use uuid::Uuid;

use filehub_core::error::ErrorKind;
use filehub_core::result::AppResult;
use filehub_core::traits::storage::{ByteStream, StorageProvider};

/// Longest file extension carried over into a blob reference.
const MAX_EXTENSION_LEN: usize = 10;

/// Reference-keyed facade over a [`StorageProvider`].
#[derive(Clone)]
pub struct BlobStore {
    provider: Arc<dyn StorageProvider>,
}

impl fmt::Debug for BlobStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobStore")
            .field("provider", &self.provider.provider_type())
            .finish()
    }
}

impl BlobStore {
    /// Wrap a provider.
    pub fn new(provider: Arc<dyn StorageProvider>) -> Self {
        Self { provider }
    }

    /// Name of the underlying provider.
    pub fn provider_type(&self) -> &str {
        self.provider.provider_type()
    }

    /// Whether the underlying provider is reachable.
    pub async fn health_check(&self) -> AppResult<bool> {
        self.provider.health_check().await
    }

    /// Store bytes for a new file and return the blob reference.
    pub async fn put(&self, user_id: Uuid, file_name: &str, data: Bytes) -> AppResult<String> {
        let blob_ref = blob_key(user_id, file_name);
        self.provider.write(&blob_ref, data).await?;
        Ok(blob_ref)
    }

    /// Stream a blob.
    pub async fn get(&self, blob_ref: &str) -> AppResult<ByteStream> {
        self.provider.read(blob_ref).await
    }

    /// Read a whole blob into memory.
    pub async fn get_bytes(&self, blob_ref: &str) -> AppResult<Bytes> {
        self.provider.read_bytes(blob_ref).await
    }

    /// Delete a blob. A missing blob is reported as `NotFound`.
    pub async fn delete(&self, blob_ref: &str) -> AppResult<()> {
        self.provider.delete(blob_ref).await
    }

    /// Delete blobs one by one after their rows are gone.
    ///
    /// Failures are logged and counted, never returned. A blob that is
    /// already missing counts as deleted.
    pub async fn delete_all<'a, I>(&self, blob_refs: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut failures = 0;
        for blob_ref in blob_refs {
            match self.provider.delete(blob_ref).await {
                Ok(()) => {}
                Err(e) if e.is(ErrorKind::NotFound) => {
                    debug!(blob_ref, "Blob already absent");
                }
                Err(e) => {
                    failures += 1;
                    warn!(blob_ref, error = %e, "Failed to delete blob, leaving orphan");
                }
            }
        }
        failures
    }
}

/// Build a fresh, collision-free blob key for a user's file.
pub fn blob_key(user_id: Uuid, file_name: &str) -> String {
    match extension(file_name) {
        Some(ext) => format!("{user_id}/{}.{ext}", Uuid::new_v4()),
        None => format!("{user_id}/{}", Uuid::new_v4()),
    }
}

/// Lowercased alphanumeric extension of a display name, if it has a sane one.
fn extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty()
        || ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Guess a MIME type from a display name, for uploads that carry none.
pub fn guess_mime_type(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first_or_octet_stream()
        .to_string()
}

/// The declared content type when it is a well-formed, header-safe MIME
/// type, otherwise a guess from the name.
pub fn resolve_mime_type(file_name: &str, declared: Option<&str>) -> String {
    declared
        .map(str::trim)
        .filter(|m| m.bytes().all(|b| b.is_ascii_graphic() || b == b' '))
        .filter(|m| m.parse::<mime_guess::mime::Mime>().is_ok())
        .map(str::to_string)
        .unwrap_or_else(|| guess_mime_type(file_name))
}
