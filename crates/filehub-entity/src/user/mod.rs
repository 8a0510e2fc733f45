//! User domain entities.

pub mod model;
pub mod plan;

pub use model::{UpsertUser, User};
pub use plan::{Plan, UNLIMITED};
