//! Centralized error handling for showtrack
//!
//! This module provides the error types shared by the scheduler, the task
//! manager, the correction service and the persistence layer.
//!
//! # Error Categories
//!
//! - **Configuration Errors**: invalid cron specs, scheduler lifecycle misuse
//! - **Repository Errors**: data access layer failures
//! - **Upstream Errors**: crawler and publisher failures
//! - **Timeouts**: the caller stopped waiting on a scheduled job
//!
//! # Usage
//!
//! ```rust
//! use showtrack::errors::{AppError, AppResult};
//!
//! async fn example_function() -> AppResult<String> {
//!     // Function can return any error type that converts to AppError
//!     Ok("success".to_string())
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for Repository Results
pub type RepositoryResult<T> = Result<T, RepositoryError>;
