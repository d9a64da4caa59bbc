//! # Domain Models
//!
//! Calculator domain types shared between event payloads, handlers, and the
//! service collaborators that persist history records.
//!
//! ## Module Organization
//!
//! - [`expression`] - Operations, computed expressions, and expression history
//! - [`usage`] - Per-user daily regexp usage tracking
//! - [`weather`] - Weather forecast records (the demo app's second event family)

pub mod expression;
pub mod usage;
pub mod weather;

pub use expression::{Expression, ExpressionHistory, OperationType, UserIdentity};
pub use usage::RegexpUsageSnapshot;
pub use weather::{WeatherForecast, WeatherRequestHistory};
