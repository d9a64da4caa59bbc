//! # Service Collaborators
//!
//! Traits for the persistence-side collaborators that background handlers call
//! outward. The real implementations (database-backed) live in the API layer;
//! this crate ships in-memory reference implementations used by tests and demos.
//!
//! ## Module Organization
//!
//! - [`strategy`] - Pure calculation logic for the closed operation set
//! - [`memory`] - In-memory `ExpressionService` / `WeatherService` implementations

pub mod memory;
pub mod strategy;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Expression, RegexpUsageSnapshot, UserIdentity, WeatherForecast};

pub use memory::{InMemoryExpressionService, InMemoryWeatherService};

/// Errors surfaced by service collaborators.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Unknown user: {0}")]
    UnknownUser(i64),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Persistence collaborator for expression calculations.
///
/// Handlers call this after a successful calculation to record history, and
/// before/after regexp calculations to enforce the per-user daily quota.
#[async_trait]
pub trait ExpressionService: Send + Sync {
    /// Persist a history record for a computed expression.
    async fn store_expression_history(
        &self,
        expression: &Expression,
        user: Option<&UserIdentity>,
    ) -> ServiceResult<()>;

    /// Current-day regexp usage counters for one user.
    async fn regexp_usage_for_today(&self, user_id: i64) -> ServiceResult<RegexpUsageSnapshot>;

    /// Record one more regexp calculation for the user today.
    async fn increment_regexp_usage(&self, user_id: i64) -> ServiceResult<()>;
}

/// Persistence collaborator for served weather forecasts.
#[async_trait]
pub trait WeatherService: Send + Sync {
    async fn store_weather_history(&self, forecast: &WeatherForecast) -> ServiceResult<()>;
}
