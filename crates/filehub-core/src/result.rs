//! Convenience result type alias for FileHub.

use crate::error::AppError;

/// A specialized `Result` type for FileHub operations.
pub type AppResult<T> = Result<T, AppError>;

/// Turns a missing lookup into a `NotFound` error.
pub trait OptionExt<T> {
    /// Returns the value, or `NotFound` carrying `message`.
    fn or_not_found(self, message: impl Into<String>) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_not_found(self, message: impl Into<String>) -> AppResult<T> {
        self.ok_or_else(|| AppError::not_found(message))
    }
}
