//! # filehub-database
//!
//! PostgreSQL connection management, the store traits the services depend on,
//! their PostgreSQL repositories and an in-memory implementation.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::{DatabasePool, Repositories};
pub use memory::MemoryDatabase;
pub use store::{
    ActivityStore, NodeStore, PurgeReport, QuotaAdjustment, ShareStore, UserStore,
};
