//! Route handlers organized by domain.

pub mod activity;
pub mod auth;
pub mod file;
pub mod folder;
pub mod health;
pub mod share;
pub mod storage;
