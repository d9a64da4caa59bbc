//! # Event Types
//!
//! A [`BackgroundEvent`] is one unit of deferred work: an immutable payload, an
//! optional scheduled start time, and a write-once outcome slot the producer can
//! read after the gate opens.
//!
//! ## Closed Event Set
//!
//! Event kinds form a closed tagged union ([`EventPayload`]) rather than an open
//! class hierarchy, so handler dispatch is an exhaustive match checked at compile
//! time and an event kind can never silently fall through registration.
//!
//! ## Outcome Slot
//!
//! The outcome slot is filled at most once, by exactly one writer (first write
//! wins), before the waiting caller is released. An empty slot after the gate
//! opens means no handler produced a result.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::HandlerError;
use crate::models::{Expression, OperationType, UserIdentity, WeatherForecast};

/// Discriminant of the closed event set, used as the handler-dispatch key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    CalculateExpression,
    Regexp,
    StoreExpressionHistory,
    StoreWeatherHistory,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::CalculateExpression => "calculate_expression",
            EventKind::Regexp => "regexp",
            EventKind::StoreExpressionHistory => "store_expression_history",
            EventKind::StoreWeatherHistory => "store_weather_history",
        }
    }
}

/// Immutable payload carried by a background event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventPayload {
    /// Numeric calculation request.
    CalculateExpression {
        operation: OperationType,
        first_operand: f64,
        second_operand: f64,
        user: Option<UserIdentity>,
    },
    /// Count matches of `pattern` in `text`; quota-limited per user per day.
    Regexp {
        pattern: String,
        text: String,
        user: Option<UserIdentity>,
    },
    /// Fire-and-forget persistence of an already-computed expression.
    StoreExpressionHistory {
        expression: Expression,
        user: Option<UserIdentity>,
    },
    /// Fire-and-forget persistence of a served weather forecast.
    StoreWeatherHistory { forecast: WeatherForecast },
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::CalculateExpression { .. } => EventKind::CalculateExpression,
            EventPayload::Regexp { .. } => EventKind::Regexp,
            EventPayload::StoreExpressionHistory { .. } => EventKind::StoreExpressionHistory,
            EventPayload::StoreWeatherHistory { .. } => EventKind::StoreWeatherHistory,
        }
    }
}

/// Terminal outcome of processing one event.
///
/// Distinguishes "handler ran and failed" ([`EventOutcome::Failed`]) from
/// "handler never ran" (empty slot), so producers can report precise failures
/// instead of a generic timeout.
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    Completed(Expression),
    Failed(HandlerError),
}

/// One unit of deferred background work.
///
/// Events are shared as `Arc<BackgroundEvent>`: the producer keeps a clone to
/// read the outcome after waiting, while the queue and executor hold their own.
#[derive(Debug)]
pub struct BackgroundEvent {
    id: Uuid,
    created_at: DateTime<Utc>,
    /// `None` means the event is eligible for dispatch immediately.
    scheduled_start: Option<DateTime<Utc>>,
    payload: EventPayload,
    outcome: OnceLock<EventOutcome>,
}

impl BackgroundEvent {
    pub fn new(payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            scheduled_start: None,
            payload,
            outcome: OnceLock::new(),
        }
    }

    /// Defer dispatch until `start_time`.
    pub fn with_scheduled_start(mut self, start_time: DateTime<Utc>) -> Self {
        self.scheduled_start = Some(start_time);
        self
    }

    /// Numeric calculation event.
    pub fn calculate(
        operation: OperationType,
        first_operand: f64,
        second_operand: f64,
        user: Option<UserIdentity>,
    ) -> Self {
        Self::new(EventPayload::CalculateExpression {
            operation,
            first_operand,
            second_operand,
            user,
        })
    }

    /// Regexp match-count event.
    pub fn regexp(
        pattern: impl Into<String>,
        text: impl Into<String>,
        user: Option<UserIdentity>,
    ) -> Self {
        Self::new(EventPayload::Regexp {
            pattern: pattern.into(),
            text: text.into(),
            user,
        })
    }

    /// Fire-and-forget expression history event.
    pub fn store_expression_history(expression: Expression, user: Option<UserIdentity>) -> Self {
        Self::new(EventPayload::StoreExpressionHistory { expression, user })
    }

    /// Fire-and-forget weather history event.
    pub fn store_weather_history(forecast: WeatherForecast) -> Self {
        Self::new(EventPayload::StoreWeatherHistory { forecast })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn scheduled_start(&self) -> Option<DateTime<Utc>> {
        self.scheduled_start
    }

    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }

    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }

    /// Whether the event is eligible for dispatch at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.scheduled_start {
            Some(start) => start <= now,
            None => true,
        }
    }

    /// Record the terminal outcome. The first write wins; returns whether this
    /// call was the writer.
    pub fn record_outcome(&self, outcome: EventOutcome) -> bool {
        self.outcome.set(outcome).is_ok()
    }

    /// The recorded outcome, if any handler produced one.
    pub fn outcome(&self) -> Option<&EventOutcome> {
        self.outcome.get()
    }

    /// The computed expression, if the event completed successfully.
    pub fn result(&self) -> Option<&Expression> {
        match self.outcome.get() {
            Some(EventOutcome::Completed(expression)) => Some(expression),
            _ => None,
        }
    }
}
