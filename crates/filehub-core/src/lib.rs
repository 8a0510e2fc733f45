//! # filehub-core
//!
//! Core crate for FileHub. Contains the unified error system, configuration
//! schemas and the blob storage trait.
//!
//! This crate has **no** internal dependencies on other FileHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;

pub use error::{AppError, ErrorKind};
pub use result::{AppResult, OptionExt};
