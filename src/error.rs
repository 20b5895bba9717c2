//! Lifecycle Error Types
//!
//! Error codes are stable strings for API responses; HTTP mapping is a
//! suggestion for the (out-of-scope) controller layer.

use thiserror::Error;

use crate::status::LoadStatus;

/// Lifecycle error taxonomy
///
/// `NotFound` and `InvalidTransition` are local validation failures and
/// are never retried here. `Persistence` surfaces a failed transaction;
/// retrying the whole operation is the caller's decision and is safe
/// because every attempt re-reads current state.
#[derive(Error, Debug, Clone)]
pub enum LifecycleError {
    #[error("Load not found: {0}")]
    NotFound(String),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: LoadStatus, to: LoadStatus },

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LifecycleError {
    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            LifecycleError::NotFound(_) => "LOAD_NOT_FOUND",
            LifecycleError::InvalidTransition { .. } => "INVALID_TRANSITION",
            LifecycleError::Persistence(_) => "PERSISTENCE_ERROR",
            LifecycleError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            LifecycleError::NotFound(_) => 404,
            LifecycleError::InvalidTransition { .. } => 409,
            LifecycleError::Persistence(_) | LifecycleError::Internal(_) => 500,
        }
    }
}

impl From<sqlx::Error> for LifecycleError {
    fn from(e: sqlx::Error) -> Self {
        LifecycleError::Persistence(e.to_string())
    }
}

impl From<anyhow::Error> for LifecycleError {
    fn from(e: anyhow::Error) -> Self {
        LifecycleError::Internal(e.to_string())
    }
}

/// Event emission failure after a successful commit
///
/// Best-effort side channel: logged by the service, never rolls back the
/// committed write and never alters the returned result.
#[derive(Error, Debug, Clone)]
#[error("Event publish failed: {0}")]
pub struct PublishError(pub String);
