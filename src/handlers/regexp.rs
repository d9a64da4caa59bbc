//! # Regexp Handler
//!
//! Handles [`EventPayload::Regexp`] events: counts non-overlapping matches of
//! a pattern in a text. Regexp calculations require an authenticated user and
//! are limited per user per day; usage is read before and incremented after a
//! successful calculation.

use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::{HandlerError, HandlerResult};
use crate::events::{BackgroundEvent, EventOutcome, EventPayload};
use crate::models::{Expression, OperationType};
use crate::services::ExpressionService;

use super::BackgroundHandler;

/// Stock handler for regexp match-count events.
pub struct RegexpHandler {
    expression_service: Arc<dyn ExpressionService>,
}

impl RegexpHandler {
    pub fn new(expression_service: Arc<dyn ExpressionService>) -> Self {
        Self { expression_service }
    }
}

#[async_trait]
impl BackgroundHandler for RegexpHandler {
    fn name(&self) -> &'static str {
        "regexp"
    }

    async fn handle(
        &self,
        event: &BackgroundEvent,
        cancel: &CancellationToken,
    ) -> HandlerResult<()> {
        let EventPayload::Regexp {
            pattern,
            text,
            user,
        } = event.payload()
        else {
            return Ok(());
        };
        if cancel.is_cancelled() {
            return Ok(());
        }

        if pattern.trim().is_empty() {
            return Err(HandlerError::Validation(
                "Pattern is required for regexp operation".to_string(),
            ));
        }
        if text.trim().is_empty() {
            return Err(HandlerError::Validation(
                "Text is required for regexp operation".to_string(),
            ));
        }
        let Some(user) = user else {
            return Err(HandlerError::Unauthorized(
                "User authentication required for regexp operations".to_string(),
            ));
        };

        let usage = self
            .expression_service
            .regexp_usage_for_today(user.id)
            .await?;
        if usage.exhausted() {
            warn!(
                user_id = user.id,
                used = usage.used,
                "Regexp daily limit reached"
            );
            return Err(HandlerError::QuotaExceeded {
                used: usage.used,
                limit: usage.used + usage.remaining,
            });
        }

        let regex = Regex::new(pattern)
            .map_err(|e| HandlerError::Validation(format!("Invalid regex pattern: {e}")))?;
        let count = regex.find_iter(text).count();

        let expression = Expression {
            operation: OperationType::Regexp,
            first_operand: 0.0,
            second_operand: 0.0,
            result: count as f64,
            expression_text: format!("Pattern '{pattern}' matched {count} time(s) in text"),
        };

        self.expression_service
            .store_expression_history(&expression, Some(user))
            .await?;
        self.expression_service
            .increment_regexp_usage(user.id)
            .await?;

        info!(
            user_id = user.id,
            matches = count,
            used = usage.used + 1,
            "Regexp calculated"
        );

        event.record_outcome(EventOutcome::Completed(expression));
        Ok(())
    }
}
