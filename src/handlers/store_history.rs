//! # History Persistence Handlers
//!
//! Fire-and-forget handlers that persist already-computed records: expression
//! history written after a synchronous calculation, and weather request history
//! written after a served forecast. Neither produces a result for a waiting
//! producer; their events normally ride the normal lane.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::HandlerResult;
use crate::events::{BackgroundEvent, EventPayload};
use crate::services::{ExpressionService, WeatherService};

use super::BackgroundHandler;

/// Persists an already-computed expression to history.
pub struct StoreExpressionHistoryHandler {
    expression_service: Arc<dyn ExpressionService>,
}

impl StoreExpressionHistoryHandler {
    pub fn new(expression_service: Arc<dyn ExpressionService>) -> Self {
        Self { expression_service }
    }
}

#[async_trait]
impl BackgroundHandler for StoreExpressionHistoryHandler {
    fn name(&self) -> &'static str {
        "store_expression_history"
    }

    async fn handle(
        &self,
        event: &BackgroundEvent,
        cancel: &CancellationToken,
    ) -> HandlerResult<()> {
        let EventPayload::StoreExpressionHistory { expression, user } = event.payload() else {
            return Ok(());
        };
        if cancel.is_cancelled() {
            return Ok(());
        }

        self.expression_service
            .store_expression_history(expression, user.as_ref())
            .await?;
        debug!(
            expression = %expression.expression_text,
            "Stored expression history record"
        );
        Ok(())
    }
}

/// Persists a served weather forecast to history.
pub struct StoreWeatherHistoryHandler {
    weather_service: Arc<dyn WeatherService>,
}

impl StoreWeatherHistoryHandler {
    pub fn new(weather_service: Arc<dyn WeatherService>) -> Self {
        Self { weather_service }
    }
}

#[async_trait]
impl BackgroundHandler for StoreWeatherHistoryHandler {
    fn name(&self) -> &'static str {
        "store_weather_history"
    }

    async fn handle(
        &self,
        event: &BackgroundEvent,
        cancel: &CancellationToken,
    ) -> HandlerResult<()> {
        let EventPayload::StoreWeatherHistory { forecast } = event.payload() else {
            return Ok(());
        };
        if cancel.is_cancelled() {
            return Ok(());
        }

        self.weather_service.store_weather_history(forecast).await?;
        debug!(date = %forecast.date, "Stored weather history record");
        Ok(())
    }
}
