//! Sharing: share management and access resolution.

pub mod access;
pub mod service;

pub use access::{Access, AccessService};
pub use service::{NewShare, ShareService};
