//! # Calculation Strategies
//!
//! Pure calculation logic for every [`OperationType`], plus the human-readable
//! expression-text rendering shown in history records.
//!
//! ## Semantics
//!
//! - Division by zero yields `NaN` and renders as `"undefined (division by zero)"`.
//!   The background handler rejects such events before calculation; the `NaN`
//!   path exists for callers computing expressions directly.
//! - Factorial is defined for non-negative integral operands only; anything else
//!   yields `NaN`. Operands above 170 overflow `f64` and yield `+inf`.
//! - Square root of a negative operand yields `NaN`.
//! - `Regexp` has no numeric calculation; match counting lives in the regexp
//!   handler where the string inputs are available.

use crate::models::{Expression, OperationType};

/// Largest operand for which `n!` fits in an `f64`.
const FACTORIAL_OVERFLOW_LIMIT: f64 = 170.0;

/// Compute the numeric result for an operation.
///
/// Unary operations ignore `second_operand`.
pub fn calculate(operation: OperationType, first_operand: f64, second_operand: f64) -> f64 {
    match operation {
        OperationType::Addition => first_operand + second_operand,
        OperationType::Subtraction => first_operand - second_operand,
        OperationType::Multiplication => first_operand * second_operand,
        OperationType::Division => {
            if second_operand == 0.0 {
                f64::NAN
            } else {
                first_operand / second_operand
            }
        }
        OperationType::Factorial => factorial(first_operand),
        OperationType::Square => first_operand * first_operand,
        OperationType::SquareRoot => {
            if first_operand < 0.0 {
                f64::NAN
            } else {
                first_operand.sqrt()
            }
        }
        OperationType::Negate => -first_operand,
        // String inputs are not representable here; the regexp handler counts
        // matches itself.
        OperationType::Regexp => 0.0,
    }
}

/// Render the display text for a computed operation, e.g. `"5 + 3 = 8"`.
pub fn expression_text(
    operation: OperationType,
    first_operand: f64,
    second_operand: f64,
    result: f64,
) -> String {
    match operation {
        OperationType::Addition => format!("{first_operand} + {second_operand} = {result}"),
        OperationType::Subtraction => format!("{first_operand} - {second_operand} = {result}"),
        OperationType::Multiplication => format!("{first_operand} * {second_operand} = {result}"),
        OperationType::Division => {
            if result.is_nan() {
                format!("{first_operand} / {second_operand} = undefined (division by zero)")
            } else {
                format!("{first_operand} / {second_operand} = {result}")
            }
        }
        OperationType::Factorial => {
            if result.is_nan() {
                format!("{first_operand}! = undefined (must be non-negative integer)")
            } else if result.is_infinite() {
                format!("{first_operand}! = infinity (overflow)")
            } else {
                format!("{first_operand}! = {result}")
            }
        }
        OperationType::Square => format!("{first_operand}² = {result}"),
        OperationType::SquareRoot => {
            if result.is_nan() {
                format!("√{first_operand} = undefined (negative number)")
            } else {
                format!("√{first_operand} = {result}")
            }
        }
        OperationType::Negate => format!("-({first_operand}) = {result}"),
        OperationType::Regexp => format!("Regexp matches: {result}"),
    }
}

/// Build a complete [`Expression`] for an operation and its operands.
pub fn build_expression(
    operation: OperationType,
    first_operand: f64,
    second_operand: f64,
) -> Expression {
    let result = calculate(operation, first_operand, second_operand);
    Expression {
        operation,
        first_operand,
        second_operand,
        result,
        expression_text: expression_text(operation, first_operand, second_operand, result),
    }
}

fn factorial(operand: f64) -> f64 {
    if operand < 0.0 || operand != operand.floor() {
        return f64::NAN;
    }
    if operand > FACTORIAL_OVERFLOW_LIMIT {
        return f64::INFINITY;
    }

    let n = operand as u64;
    let mut result = 1.0_f64;
    for i in 2..=n {
        result *= i as f64;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_operations_compute_expected_results() {
        assert_eq!(calculate(OperationType::Addition, 5.0, 3.0), 8.0);
        assert_eq!(calculate(OperationType::Subtraction, 5.0, 3.0), 2.0);
        assert_eq!(calculate(OperationType::Multiplication, 5.0, 3.0), 15.0);
        assert_eq!(calculate(OperationType::Division, 6.0, 3.0), 2.0);
    }

    #[test]
    fn division_by_zero_is_undefined() {
        let result = calculate(OperationType::Division, 1.0, 0.0);
        assert!(result.is_nan());
        assert_eq!(
            expression_text(OperationType::Division, 1.0, 0.0, result),
            "1 / 0 = undefined (division by zero)"
        );
    }

    #[test]
    fn factorial_of_small_integers() {
        assert_eq!(calculate(OperationType::Factorial, 0.0, 0.0), 1.0);
        assert_eq!(calculate(OperationType::Factorial, 1.0, 0.0), 1.0);
        assert_eq!(calculate(OperationType::Factorial, 5.0, 0.0), 120.0);
    }

    #[test]
    fn factorial_rejects_negative_and_fractional_operands() {
        assert!(calculate(OperationType::Factorial, -1.0, 0.0).is_nan());
        assert!(calculate(OperationType::Factorial, 2.5, 0.0).is_nan());
    }

    #[test]
    fn factorial_overflows_to_infinity_past_170() {
        assert!(calculate(OperationType::Factorial, 171.0, 0.0).is_infinite());
        assert!(calculate(OperationType::Factorial, 170.0, 0.0).is_finite());
    }

    #[test]
    fn square_root_of_negative_is_undefined() {
        let result = calculate(OperationType::SquareRoot, -4.0, 0.0);
        assert!(result.is_nan());
        assert_eq!(
            expression_text(OperationType::SquareRoot, -4.0, 0.0, result),
            "√-4 = undefined (negative number)"
        );
    }

    #[test]
    fn unary_operations_ignore_second_operand() {
        assert_eq!(calculate(OperationType::Square, 4.0, 99.0), 16.0);
        assert_eq!(calculate(OperationType::Negate, 4.0, 99.0), -4.0);
        assert_eq!(calculate(OperationType::SquareRoot, 9.0, 99.0), 3.0);
    }

    #[test]
    fn build_expression_renders_display_text() {
        let expression = build_expression(OperationType::Addition, 5.0, 3.0);
        assert_eq!(expression.result, 8.0);
        assert_eq!(expression.expression_text, "5 + 3 = 8");
    }
}
