//! Convenience result type alias for dxfcheck.

use crate::error::AppError;

/// A specialized `Result` type for dxfcheck operations.
pub type AppResult<T> = Result<T, AppError>;
