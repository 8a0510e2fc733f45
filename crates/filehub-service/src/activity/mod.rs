//! Per-user activity log.

pub mod service;

pub use service::ActivityService;
