//! # Background Handlers
//!
//! Polymorphic units of business logic, one or more per event kind. The
//! executor resolves the handler list for an event through [`HandlerRegistry`],
//! runs all of them concurrently (fan-out), and treats handler errors as data:
//! they are logged and recorded on the event, never propagated to producers.
//!
//! ## Dispatch
//!
//! Dispatch is keyed by [`EventKind`], a closed enum, so the kind-to-handlers
//! mapping is an exhaustive `match` checked at compile time — there is no
//! runtime type lookup and no way to add an event kind without deciding its
//! dispatch arm.
//!
//! ## Module Organization
//!
//! - [`calculate`] - Arithmetic calculation handler
//! - [`regexp`] - Regexp match counting with per-user daily quota
//! - [`store_history`] - Fire-and-forget history persistence handlers

pub mod calculate;
pub mod regexp;
pub mod store_history;

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::{CentaureaError, HandlerResult, Result};
use crate::events::{BackgroundEvent, EventKind};
use crate::services::{ExpressionService, WeatherService};

pub use calculate::CalculateExpressionHandler;
pub use regexp::RegexpHandler;
pub use store_history::{StoreExpressionHistoryHandler, StoreWeatherHistoryHandler};

/// One unit of background business logic for a single event kind.
///
/// A handler receiving an event of a kind it does not understand must treat it
/// as a no-op and return `Ok(())`.
#[async_trait]
pub trait BackgroundHandler: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn handle(
        &self,
        event: &BackgroundEvent,
        cancel: &CancellationToken,
    ) -> HandlerResult<()>;
}

/// Kind-keyed handler lists, populated once by the composition root.
///
/// Supports fan-out: every handler registered for a kind runs on every event
/// of that kind, independently and concurrently.
#[derive(Default)]
pub struct HandlerRegistry {
    calculate_expression: Vec<Arc<dyn BackgroundHandler>>,
    regexp: Vec<Arc<dyn BackgroundHandler>>,
    store_expression_history: Vec<Arc<dyn BackgroundHandler>>,
    store_weather_history: Vec<Arc<dyn BackgroundHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard registration set: every event kind wired to its stock
    /// handler, mirroring the app's startup composition.
    pub fn with_default_handlers(
        expression_service: Arc<dyn ExpressionService>,
        weather_service: Arc<dyn WeatherService>,
    ) -> Self {
        let mut registry = Self::new();
        registry.register(
            EventKind::CalculateExpression,
            Arc::new(CalculateExpressionHandler::new(expression_service.clone())),
        );
        registry.register(
            EventKind::Regexp,
            Arc::new(RegexpHandler::new(expression_service.clone())),
        );
        registry.register(
            EventKind::StoreExpressionHistory,
            Arc::new(StoreExpressionHistoryHandler::new(expression_service)),
        );
        registry.register(
            EventKind::StoreWeatherHistory,
            Arc::new(StoreWeatherHistoryHandler::new(weather_service)),
        );
        registry
    }

    /// Append a handler to the kind's ordered list.
    pub fn register(&mut self, kind: EventKind, handler: Arc<dyn BackgroundHandler>) {
        self.handlers_for_mut(kind).push(handler);
    }

    /// The ordered handler list for a kind. An empty slice means the kind is
    /// unwired — a configuration error [`validate`](Self::validate) rejects.
    pub fn handlers_for(&self, kind: EventKind) -> &[Arc<dyn BackgroundHandler>] {
        match kind {
            EventKind::CalculateExpression => &self.calculate_expression,
            EventKind::Regexp => &self.regexp,
            EventKind::StoreExpressionHistory => &self.store_expression_history,
            EventKind::StoreWeatherHistory => &self.store_weather_history,
        }
    }

    /// Reject a registry with any unwired event kind. Called by the
    /// composition root before starting the executor.
    pub fn validate(&self) -> Result<()> {
        for kind in [
            EventKind::CalculateExpression,
            EventKind::Regexp,
            EventKind::StoreExpressionHistory,
            EventKind::StoreWeatherHistory,
        ] {
            if self.handlers_for(kind).is_empty() {
                return Err(CentaureaError::ConfigurationError(format!(
                    "No handler registered for event kind '{}'",
                    kind.as_str()
                )));
            }
        }
        Ok(())
    }

    fn handlers_for_mut(&mut self, kind: EventKind) -> &mut Vec<Arc<dyn BackgroundHandler>> {
        match kind {
            EventKind::CalculateExpression => &mut self.calculate_expression,
            EventKind::Regexp => &mut self.regexp,
            EventKind::StoreExpressionHistory => &mut self.store_expression_history,
            EventKind::StoreWeatherHistory => &mut self.store_weather_history,
        }
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("calculate_expression", &self.calculate_expression.len())
            .field("regexp", &self.regexp.len())
            .field("store_expression_history", &self.store_expression_history.len())
            .field("store_weather_history", &self.store_weather_history.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{InMemoryExpressionService, InMemoryWeatherService};

    #[test]
    fn empty_registry_fails_validation() {
        let registry = HandlerRegistry::new();
        assert!(registry.validate().is_err());
    }

    #[test]
    fn default_handlers_cover_every_kind() {
        let registry = HandlerRegistry::with_default_handlers(
            Arc::new(InMemoryExpressionService::new()),
            Arc::new(InMemoryWeatherService::new()),
        );
        assert!(registry.validate().is_ok());
        for kind in [
            EventKind::CalculateExpression,
            EventKind::Regexp,
            EventKind::StoreExpressionHistory,
            EventKind::StoreWeatherHistory,
        ] {
            assert_eq!(registry.handlers_for(kind).len(), 1);
        }
    }

    #[test]
    fn registration_preserves_order_for_fan_out() {
        let service: Arc<dyn ExpressionService> = Arc::new(InMemoryExpressionService::new());
        let mut registry = HandlerRegistry::new();
        registry.register(
            EventKind::CalculateExpression,
            Arc::new(CalculateExpressionHandler::new(service.clone())),
        );
        registry.register(
            EventKind::CalculateExpression,
            Arc::new(CalculateExpressionHandler::new(service)),
        );
        assert_eq!(
            registry.handlers_for(EventKind::CalculateExpression).len(),
            2
        );
    }
}
