//! # dxfcheck-core
//!
//! Core crate for dxfcheck. Contains the configuration schemas and loader,
//! logging initialisation, and the unified error system.
//!
//! This crate has **no** internal dependencies on other dxfcheck crates.

pub mod config;
pub mod error;
pub mod logging;
pub mod result;

pub use error::AppError;
pub use result::AppResult;
