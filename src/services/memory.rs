//! # In-Memory Service Implementations
//!
//! Reference implementations of the service collaborator traits backed by
//! process-local state. The API layer swaps these for database-backed
//! implementations; tests and demos use them directly.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::constants::defaults;
use crate::models::{
    Expression, ExpressionHistory, RegexpUsageSnapshot, UserIdentity, WeatherForecast,
    WeatherRequestHistory,
};

use super::{ExpressionService, ServiceResult, WeatherService};

/// In-memory [`ExpressionService`] with per-user daily regexp usage counters.
#[derive(Debug)]
pub struct InMemoryExpressionService {
    history: RwLock<Vec<ExpressionHistory>>,
    /// (user id, day) -> regexp calculations performed that day.
    usage: DashMap<(i64, NaiveDate), u32>,
    daily_limit: u32,
}

impl InMemoryExpressionService {
    pub fn new() -> Self {
        Self::with_daily_limit(defaults::REGEXP_DAILY_LIMIT)
    }

    pub fn with_daily_limit(daily_limit: u32) -> Self {
        Self {
            history: RwLock::new(Vec::new()),
            usage: DashMap::new(),
            daily_limit,
        }
    }

    /// Snapshot of every stored history record, newest last.
    pub fn history(&self) -> Vec<ExpressionHistory> {
        self.history.read().clone()
    }

    pub fn history_len(&self) -> usize {
        self.history.read().len()
    }

    /// Drop all stored history and usage counters.
    pub fn clear(&self) -> usize {
        let mut history = self.history.write();
        let count = history.len();
        history.clear();
        self.usage.clear();
        count
    }
}

impl Default for InMemoryExpressionService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExpressionService for InMemoryExpressionService {
    async fn store_expression_history(
        &self,
        expression: &Expression,
        user: Option<&UserIdentity>,
    ) -> ServiceResult<()> {
        let record = ExpressionHistory::from_expression(expression, user);
        debug!(
            operation = expression.operation.as_str(),
            user_email = %record.user_email,
            "Storing expression history record"
        );
        self.history.write().push(record);
        Ok(())
    }

    async fn regexp_usage_for_today(&self, user_id: i64) -> ServiceResult<RegexpUsageSnapshot> {
        let today = Utc::now().date_naive();
        let used = self
            .usage
            .get(&(user_id, today))
            .map(|entry| *entry.value())
            .unwrap_or(0);
        Ok(RegexpUsageSnapshot::new(used, self.daily_limit))
    }

    async fn increment_regexp_usage(&self, user_id: i64) -> ServiceResult<()> {
        let today = Utc::now().date_naive();
        *self.usage.entry((user_id, today)).or_insert(0) += 1;
        Ok(())
    }
}

/// In-memory [`WeatherService`].
#[derive(Debug, Default)]
pub struct InMemoryWeatherService {
    history: RwLock<Vec<WeatherRequestHistory>>,
}

impl InMemoryWeatherService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<WeatherRequestHistory> {
        self.history.read().clone()
    }

    pub fn history_len(&self) -> usize {
        self.history.read().len()
    }
}

#[async_trait]
impl WeatherService for InMemoryWeatherService {
    async fn store_weather_history(&self, forecast: &WeatherForecast) -> ServiceResult<()> {
        self.history
            .write()
            .push(WeatherRequestHistory::from_forecast(forecast));
        Ok(())
    }
}
