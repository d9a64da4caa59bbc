//! # Calculation Handler
//!
//! Handles [`EventPayload::CalculateExpression`] events: validates the
//! operands, computes the result through the calculation strategies, persists
//! a history record, and writes the completed expression onto the event so the
//! waiting producer can return it.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::{HandlerError, HandlerResult};
use crate::events::{BackgroundEvent, EventOutcome, EventPayload};
use crate::models::OperationType;
use crate::services::{strategy, ExpressionService};

use super::BackgroundHandler;

/// Stock handler for numeric calculation events.
pub struct CalculateExpressionHandler {
    expression_service: Arc<dyn ExpressionService>,
}

impl CalculateExpressionHandler {
    pub fn new(expression_service: Arc<dyn ExpressionService>) -> Self {
        Self { expression_service }
    }
}

#[async_trait]
impl BackgroundHandler for CalculateExpressionHandler {
    fn name(&self) -> &'static str {
        "calculate_expression"
    }

    async fn handle(
        &self,
        event: &BackgroundEvent,
        cancel: &CancellationToken,
    ) -> HandlerResult<()> {
        let EventPayload::CalculateExpression {
            operation,
            first_operand,
            second_operand,
            user,
        } = event.payload()
        else {
            return Ok(());
        };
        if cancel.is_cancelled() {
            return Ok(());
        }

        if *operation == OperationType::Division && *second_operand == 0.0 {
            return Err(HandlerError::Validation(
                "Cannot divide by zero".to_string(),
            ));
        }
        if *operation == OperationType::Regexp {
            return Err(HandlerError::Validation(
                "Regexp operations must be submitted as regexp events".to_string(),
            ));
        }

        let expression = strategy::build_expression(*operation, *first_operand, *second_operand);

        self.expression_service
            .store_expression_history(&expression, user.as_ref())
            .await?;

        info!(
            expression = %expression.expression_text,
            user_email = user
                .as_ref()
                .map(|u| u.email_or_anonymous())
                .unwrap_or("anonymous"),
            "Expression calculated"
        );

        event.record_outcome(EventOutcome::Completed(expression));
        Ok(())
    }
}
