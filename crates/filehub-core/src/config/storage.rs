//! Blob storage and upload configuration.

use serde::{Deserialize, Serialize};

/// Top-level storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Upper bound on the combined size of one upload request (default 500 MiB).
    ///
    /// Applied before the per-plan file cap.
    #[serde(default = "default_max_request_bytes")]
    pub max_request_bytes: u64,
    /// Maximum number of files accepted in one upload request.
    #[serde(default = "default_max_files")]
    pub max_files_per_request: usize,
    /// Local filesystem storage configuration.
    #[serde(default)]
    pub local: LocalStorageConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            max_request_bytes: default_max_request_bytes(),
            max_files_per_request: default_max_files(),
            local: LocalStorageConfig::default(),
        }
    }
}

/// Local filesystem storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalStorageConfig {
    /// Root path for local blob storage.
    #[serde(default = "default_local_root")]
    pub root_path: String,
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        Self {
            root_path: default_local_root(),
        }
    }
}

fn default_max_request_bytes() -> u64 {
    524_288_000 // 500 MiB
}

fn default_max_files() -> usize {
    10
}

fn default_local_root() -> String {
    "./data/uploads".to_string()
}
