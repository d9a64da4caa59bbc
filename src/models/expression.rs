//! # Expression Model
//!
//! Core calculator domain types: the closed set of supported operations, a
//! computed expression, and the history record persisted after each calculation.
//!
//! ## Overview
//!
//! An [`Expression`] is produced by a background handler from the operands carried
//! on a calculation event. The [`ExpressionHistory`] record is the persistence-side
//! projection of an expression, stamped with the computing user and time, and is
//! what [`crate::services::ExpressionService::store_expression_history`] receives.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The closed set of calculator operations.
///
/// Binary operations consume both operands; unary operations consume only the
/// first. `Regexp` is special-cased throughout: its inputs are strings and its
/// result is a match count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    // Binary operations
    Addition,
    Subtraction,
    Multiplication,
    Division,
    // Unary operations
    Factorial,
    Square,
    SquareRoot,
    Negate,
    // String operation
    Regexp,
}

impl OperationType {
    /// Whether the operation consumes both operands.
    pub fn is_binary(&self) -> bool {
        matches!(
            self,
            OperationType::Addition
                | OperationType::Subtraction
                | OperationType::Multiplication
                | OperationType::Division
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Addition => "addition",
            OperationType::Subtraction => "subtraction",
            OperationType::Multiplication => "multiplication",
            OperationType::Division => "division",
            OperationType::Factorial => "factorial",
            OperationType::Square => "square",
            OperationType::SquareRoot => "square_root",
            OperationType::Negate => "negate",
            OperationType::Regexp => "regexp",
        }
    }
}

/// A computed calculator expression.
///
/// `expression_text` is the human-readable rendering, e.g. `"5 + 3 = 8"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub operation: OperationType,
    pub first_operand: f64,
    pub second_operand: f64,
    pub result: f64,
    pub expression_text: String,
}

impl Expression {
    pub fn is_binary_operation(&self) -> bool {
        self.operation.is_binary()
    }
}

/// Identity of the user a calculation is performed for.
///
/// Carried on event payloads so handlers can attribute history records and
/// enforce per-user quotas without reaching back into the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: i64,
    pub email: Option<String>,
}

impl UserIdentity {
    pub fn new(id: i64, email: Option<String>) -> Self {
        Self { id, email }
    }

    /// Display form used in history records and logs.
    pub fn email_or_anonymous(&self) -> &str {
        self.email.as_deref().unwrap_or("anonymous")
    }
}

/// History record persisted for every successful calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionHistory {
    pub id: Uuid,
    pub computed_time: DateTime<Utc>,
    pub operation: OperationType,
    pub first_operand: f64,
    pub second_operand: f64,
    pub result: f64,
    pub expression_text: String,
    pub user_id: Option<i64>,
    pub user_email: String,
}

impl ExpressionHistory {
    /// Build a history record from a computed expression and the requesting user.
    pub fn from_expression(expression: &Expression, user: Option<&UserIdentity>) -> Self {
        Self {
            id: Uuid::new_v4(),
            computed_time: Utc::now(),
            operation: expression.operation,
            first_operand: expression.first_operand,
            second_operand: expression.second_operand,
            result: expression.result,
            expression_text: expression.expression_text.clone(),
            user_id: user.map(|u| u.id),
            user_email: user
                .map(|u| u.email_or_anonymous().to_string())
                .unwrap_or_else(|| "anonymous".to_string()),
        }
    }
}
