//! Storage plan enumeration and its limits.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MIB: i64 = 1024 * 1024;
const GIB: i64 = 1024 * MIB;
const TIB: i64 = 1024 * GIB;

/// Sentinel stored in `users.storage_limit` for plans without an aggregate cap.
pub const UNLIMITED: i64 = -1;

/// Subscription plans. Each plan fixes an aggregate storage limit and a
/// per-file size cap.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "storage_plan", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    /// 5 GB of storage, 100 MB per file.
    Free,
    /// 100 GB of storage, 500 MB per file.
    Pro,
    /// 1 TB of storage, 2 GB per file.
    Business,
    /// Unlimited storage, 10 GB per file.
    Enterprise,
}

impl Plan {
    /// Aggregate storage limit in bytes, or [`UNLIMITED`].
    pub fn storage_limit_bytes(&self) -> i64 {
        match self {
            Self::Free => 5 * GIB,
            Self::Pro => 100 * GIB,
            Self::Business => TIB,
            Self::Enterprise => UNLIMITED,
        }
    }

    /// Largest single file accepted on this plan, in bytes.
    pub fn max_file_size_bytes(&self) -> i64 {
        match self {
            Self::Free => 100 * MIB,
            Self::Pro => 500 * MIB,
            Self::Business => 2 * GIB,
            Self::Enterprise => 10 * GIB,
        }
    }

    /// Human-readable plan name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Free => "Free",
            Self::Pro => "Pro",
            Self::Business => "Business",
            Self::Enterprise => "Enterprise",
        }
    }

    /// Return the plan as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Pro => "pro",
            Self::Business => "business",
            Self::Enterprise => "enterprise",
        }
    }
}

impl Default for Plan {
    fn default() -> Self {
        Self::Free
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Plan {
    type Err = filehub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "pro" => Ok(Self::Pro),
            "business" => Ok(Self::Business),
            "enterprise" => Ok(Self::Enterprise),
            _ => Err(filehub_core::AppError::validation(format!(
                "Invalid plan: '{s}'. Expected one of: free, pro, business, enterprise"
            ))),
        }
    }
}
