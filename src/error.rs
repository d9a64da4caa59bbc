//! # Error Types
//!
//! Structured error handling for the background core. [`CentaureaError`] covers
//! crate-level failures (configuration, executor lifecycle); [`HandlerError`] is
//! the typed failure a background handler raises, which the executor catches,
//! logs, and records on the event's outcome slot instead of propagating.

use thiserror::Error;

use crate::services::ServiceError;

/// Crate-level error type.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CentaureaError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Queue error: {0}")]
    QueueError(String),
    #[error("Executor error: {0}")]
    ExecutorError(String),
    #[error("Timeout: {0}")]
    Timeout(String),
}

pub type Result<T> = std::result::Result<T, CentaureaError>;

/// Typed failure raised inside a background handler.
///
/// These never reach the producer as a live error: the executor converts them
/// into an [`crate::events::EventOutcome::Failed`] recorded on the event, so a
/// waiting caller can distinguish "handler ran and failed" from "handler never
/// ran".
#[derive(Debug, Clone, Error, PartialEq)]
pub enum HandlerError {
    /// The event payload failed validation (bad operand, blank pattern, ...).
    #[error("Validation failed: {0}")]
    Validation(String),
    /// The operation requires an authenticated user.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// The per-user daily quota for the operation is exhausted.
    #[error("Daily limit reached: {used} of {limit} used today")]
    QuotaExceeded { used: u32, limit: u32 },
    /// A service collaborator failed.
    #[error("Service call failed: {0}")]
    Service(String),
    /// The handler task panicked or failed in an unforeseen way.
    #[error("Internal handler failure: {0}")]
    Internal(String),
}

impl From<ServiceError> for HandlerError {
    fn from(err: ServiceError) -> Self {
        HandlerError::Service(err.to_string())
    }
}

pub type HandlerResult<T> = std::result::Result<T, HandlerError>;
