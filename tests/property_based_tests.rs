//! Property-based tests for the calculation strategies and queue invariants.

use std::sync::Arc;

use proptest::prelude::*;

use centaurea_core::events::BackgroundEvent;
use centaurea_core::models::OperationType;
use centaurea_core::queue::InMemoryEventQueue;
use centaurea_core::services::strategy;

fn finite_operand() -> impl Strategy<Value = f64> {
    -1.0e6..1.0e6
}

fn binary_operation() -> impl Strategy<Value = OperationType> {
    prop_oneof![
        Just(OperationType::Addition),
        Just(OperationType::Subtraction),
        Just(OperationType::Multiplication),
        Just(OperationType::Division),
    ]
}

proptest! {
    /// Property: binary arithmetic matches the primitive operators whenever
    /// the divisor is non-zero.
    #[test]
    fn binary_operations_match_primitive_arithmetic(
        operation in binary_operation(),
        first in finite_operand(),
        second in finite_operand(),
    ) {
        prop_assume!(!(operation == OperationType::Division && second == 0.0));
        let result = strategy::calculate(operation, first, second);
        let expected = match operation {
            OperationType::Addition => first + second,
            OperationType::Subtraction => first - second,
            OperationType::Multiplication => first * second,
            OperationType::Division => first / second,
            _ => unreachable!(),
        };
        prop_assert_eq!(result, expected);
    }

    /// Property: division by zero is always NaN, for any dividend.
    #[test]
    fn division_by_zero_is_always_undefined(first in finite_operand()) {
        prop_assert!(strategy::calculate(OperationType::Division, first, 0.0).is_nan());
    }

    /// Property: squaring never goes negative and matches multiplication.
    #[test]
    fn square_is_self_multiplication(first in finite_operand()) {
        let result = strategy::calculate(OperationType::Square, first, 0.0);
        prop_assert!(result >= 0.0);
        prop_assert_eq!(result, first * first);
    }

    /// Property: negation is its own inverse.
    #[test]
    fn negation_round_trips(first in finite_operand()) {
        let negated = strategy::calculate(OperationType::Negate, first, 0.0);
        prop_assert_eq!(strategy::calculate(OperationType::Negate, negated, 0.0), first);
    }

    /// Property: square root of a non-negative operand squares back, within
    /// floating point tolerance.
    #[test]
    fn square_root_inverts_square(first in 0.0..1.0e6f64) {
        let root = strategy::calculate(OperationType::SquareRoot, first, 0.0);
        prop_assert!((root * root - first).abs() <= first.max(1.0) * 1e-9);
    }

    /// Property: factorial is NaN exactly for negative or fractional operands
    /// (within the non-overflow range).
    #[test]
    fn factorial_domain_is_non_negative_integers(first in -50.0..50.0f64) {
        let result = strategy::calculate(OperationType::Factorial, first, 0.0);
        if first >= 0.0 && first == first.floor() {
            prop_assert!(result.is_finite());
            prop_assert!(result >= 1.0);
        } else {
            prop_assert!(result.is_nan());
        }
    }

    /// Property: rendered expression text always embeds the computed result
    /// for well-defined binary operations.
    #[test]
    fn expression_text_embeds_the_result(
        operation in binary_operation(),
        first in finite_operand(),
        second in 1.0..1.0e6f64,
    ) {
        let expression = strategy::build_expression(operation, first, second);
        let expected_suffix = format!("= {}", expression.result);
        prop_assert!(expression.expression_text.ends_with(&expected_suffix));
    }

    /// Property: every enqueued event comes back exactly once, with priority
    /// items first, regardless of interleaving.
    #[test]
    fn queue_delivers_every_event_exactly_once(normal in 1usize..20, sync in 0usize..5) {
        tokio_test::block_on(async move {
            let queue = InMemoryEventQueue::new();
            let mut ids = std::collections::HashSet::new();

            for _ in 0..normal {
                let event = Arc::new(BackgroundEvent::calculate(
                    OperationType::Addition,
                    1.0,
                    2.0,
                    None,
                ));
                ids.insert(event.id());
                queue.enqueue([event]);
            }
            for _ in 0..sync {
                let event = Arc::new(BackgroundEvent::calculate(
                    OperationType::Square,
                    2.0,
                    0.0,
                    None,
                ));
                ids.insert(event.id());
                let envelope = centaurea_core::events::SyncEnvelope::new(event);
                queue.enqueue_item(centaurea_core::queue::QueueItem::Sync(envelope));
            }

            let mut seen = std::collections::HashSet::new();
            for i in 0..(normal + sync) {
                let item = queue.poll_dequeue().expect("event expected");
                // All sync items surface before any normal item.
                assert_eq!(item.is_sync(), i < sync);
                assert!(seen.insert(item.event().id()), "duplicate delivery");
            }
            assert!(queue.poll_dequeue().is_none());
            assert_eq!(seen, ids);
        });
    }
}
