//! Property-based tests for the operation library
//!
//! - add/subtract/multiply match IEEE-754 arithmetic bit for bit
//! - divide matches `/` for non-zero divisors and always fails on zero
//! - repeated evaluation is bit-identical

use super::*;
use crate::error::OperationError;
use proptest::prelude::*;

fn finite() -> impl Strategy<Value = f64> {
    prop_oneof![
        -1.0e6..1.0e6f64,
        proptest::num::f64::NORMAL | proptest::num::f64::SUBNORMAL | proptest::num::f64::ZERO,
    ]
}

fn non_zero() -> impl Strategy<Value = f64> {
    finite().prop_filter("divisor must be non-zero", |b| *b != 0.0)
}

fn same_bits(a: f64, b: f64) -> bool {
    a.to_bits() == b.to_bits() || (a.is_nan() && b.is_nan())
}

proptest! {
    #[test]
    fn add_is_ieee_addition(a in finite(), b in finite()) {
        prop_assert!(same_bits(add(a, b), a + b));
    }

    #[test]
    fn subtract_is_ieee_subtraction(a in finite(), b in finite()) {
        prop_assert!(same_bits(subtract(a, b), a - b));
    }

    #[test]
    fn multiply_is_ieee_multiplication(a in finite(), b in finite()) {
        prop_assert!(same_bits(multiply(a, b), a * b));
    }

    #[test]
    fn divide_is_ieee_division(a in finite(), b in non_zero()) {
        let quotient = divide(a, b);
        prop_assert!(quotient.is_ok());
        prop_assert!(same_bits(quotient.unwrap_or(f64::NAN), a / b));
    }

    #[test]
    fn divide_by_zero_always_fails(a in finite(), negative in any::<bool>()) {
        let zero = if negative { -0.0 } else { 0.0 };
        prop_assert_eq!(divide(a, zero), Err(OperationError::DivisionByZero));
    }

    #[test]
    fn evaluation_is_idempotent(
        a in finite(),
        b in finite(),
        op in prop_oneof![
            Just(Operation::Add),
            Just(Operation::Subtract),
            Just(Operation::Multiply),
            Just(Operation::Divide),
        ],
    ) {
        let request = OperationRequest::new(op, a, b);
        let first = request.evaluate();
        let second = request.evaluate();

        match (first.outcome(), second.outcome()) {
            (Ok(x), Ok(y)) => prop_assert!(same_bits(x, y)),
            (Err(x), Err(y)) => prop_assert_eq!(x, y),
            _ => prop_assert!(false, "outcomes diverged"),
        }
    }
}
