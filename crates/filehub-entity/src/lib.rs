//! # filehub-entity
//!
//! Domain entity models for FileHub. Every struct in this crate represents a
//! database table row or a domain value object. Entities derive `Debug`,
//! `Clone`, `Serialize` and `Deserialize`; table rows additionally derive
//! `sqlx::FromRow`.

pub mod activity;
pub mod node;
pub mod share;
pub mod storage;
pub mod user;
