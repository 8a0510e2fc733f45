//! # filehub-auth
//!
//! Authentication primitives for FileHub.
//!
//! ## Modules
//!
//! - `jwt`: validation of the identity provider's sign-in tokens, plus a
//!   local encoder for development and tests
//! - `password`: Argon2id hashing for share passwords

pub mod jwt;
pub mod password;

pub use jwt::{Claims, JwtDecoder, JwtEncoder};
pub use password::PasswordHasher;
