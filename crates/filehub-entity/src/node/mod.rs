//! File tree entities.

pub mod model;

pub use model::{CreateNode, Crumb, FOLDER_MIME_TYPE, FileNode, NodeChanges, NodeKind, NodeRow};
