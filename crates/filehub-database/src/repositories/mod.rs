//! PostgreSQL implementations of the store traits.

pub mod activity;
pub mod node;
pub mod share;
pub mod user;

pub use activity::ActivityRepository;
pub use node::NodeRepository;
pub use share::ShareRepository;
pub use user::UserRepository;
