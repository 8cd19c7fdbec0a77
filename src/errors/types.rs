//! Error type definitions for showtrack
//!
//! `AppError` is what every public operation returns. Repository
//! implementations return `RepositoryError`, which converts into `AppError`
//! at the service boundary.

use std::time::Duration;
use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors (SeaORM)
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Repository layer errors
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// A cron expression failed to parse
    #[error("Invalid cron expression '{spec}': {message}")]
    InvalidCronSpec { spec: String, message: String },

    /// `start()` was called on a scheduler that is already running
    #[error("Scheduler is already running")]
    SchedulerAlreadyRunning,

    /// Operation already in progress errors
    #[error("Operation already in progress: {operation_type} on {resource}")]
    OperationInProgress {
        operation_type: String,
        resource: String,
    },

    /// The caller gave up waiting; the job itself may still be running
    #[error("{job} timed out after {after:?}")]
    Timeout { job: String, after: Duration },

    /// Crawler or publisher failures
    #[error("Upstream error: {service} - {message}")]
    Upstream { service: String, message: String },

    /// Parameter serialization failures
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Repository layer specific errors
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Database errors from SeaORM
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Record not found
    #[error("Record not found: {table} with {field} = {value}")]
    RecordNotFound {
        table: String,
        field: String,
        value: String,
    },

    /// A stored value could not be mapped back onto the domain model
    #[error("Invalid stored value: {table}.{field} = {value}")]
    InvalidValue {
        table: String,
        field: String,
        value: String,
    },

    /// Constraint violations (unique, foreign key, etc.)
    #[error("Constraint violation: {constraint} - {message}")]
    ConstraintViolation { constraint: String, message: String },
}

/// Convenience methods for creating common error types
impl AppError {
    /// Create a validation error with a custom message
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an operation in progress error
    pub fn operation_in_progress<O: Into<String>, R: Into<String>>(
        operation_type: O,
        resource: R,
    ) -> Self {
        Self::OperationInProgress {
            operation_type: operation_type.into(),
            resource: resource.into(),
        }
    }

    /// Create an upstream error
    pub fn upstream<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::Upstream {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True when the error only means the caller stopped waiting
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl RepositoryError {
    /// Create a record-not-found error keyed on the `id` column
    pub fn not_found<T: Into<String>, V: ToString>(table: T, value: V) -> Self {
        Self::RecordNotFound {
            table: table.into(),
            field: "id".to_string(),
            value: value.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::RecordNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_names_job_and_limit() {
        let err = AppError::Timeout {
            job: "daily crawl".to_string(),
            after: Duration::from_secs(90),
        };
        assert_eq!(err.to_string(), "daily crawl timed out after 90s");
        assert!(err.is_timeout());
    }

    #[test]
    fn test_repository_error_converts_into_app_error() {
        let err: AppError = RepositoryError::not_found("shows", 42).into();
        assert!(matches!(err, AppError::Repository(ref e) if e.is_not_found()));
        assert_eq!(
            err.to_string(),
            "Repository error: Record not found: shows with id = 42"
        );
    }
}
