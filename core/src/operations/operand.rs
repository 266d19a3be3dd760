//! Operands, requests and results

use super::Operation;
use crate::error::OperationError;
use serde::{Deserialize, Serialize};

/// A number with an optional free-text unit tag such as "apple"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operand {
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl Operand {
    /// A bare number
    pub fn new(value: f64) -> Self {
        Self { value, unit: None }
    }

    /// A number tagged with a unit
    pub fn with_unit<S: Into<String>>(value: f64, unit: S) -> Self {
        Self {
            value,
            unit: Some(unit.into()),
        }
    }
}

impl From<f64> for Operand {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

/// One arithmetic call: an operation and exactly two operands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRequest {
    pub operation: Operation,
    pub first: Operand,
    pub second: Operand,
}

impl OperationRequest {
    pub fn new(operation: Operation, first: impl Into<Operand>, second: impl Into<Operand>) -> Self {
        Self {
            operation,
            first: first.into(),
            second: second.into(),
        }
    }

    /// Run the request through the operation library.
    ///
    /// The unit tag survives only when both operands carry the identical tag.
    pub fn evaluate(&self) -> OperationResult {
        let unit = match (&self.first.unit, &self.second.unit) {
            (Some(a), Some(b)) if a == b => Some(a.clone()),
            _ => None,
        };

        OperationResult {
            operation: self.operation,
            outcome: self.operation.apply(self.first.value, self.second.value),
            unit,
        }
    }
}

/// Outcome of an [`OperationRequest`]; read-only once produced
#[derive(Debug, Clone, PartialEq)]
pub struct OperationResult {
    operation: Operation,
    outcome: Result<f64, OperationError>,
    unit: Option<String>,
}

impl OperationResult {
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// The numeric value, absent on failure
    pub fn value(&self) -> Option<f64> {
        self.outcome.ok()
    }

    /// The failure marker, absent on success
    pub fn error(&self) -> Option<OperationError> {
        self.outcome.err()
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Carried unit tag. Never set on failures.
    pub fn unit(&self) -> Option<&str> {
        match self.outcome {
            Ok(_) => self.unit.as_deref(),
            Err(_) => None,
        }
    }

    pub fn outcome(&self) -> Result<f64, OperationError> {
        self.outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_carried_when_identical() {
        let request = OperationRequest::new(
            Operation::Subtract,
            Operand::with_unit(15.0, "apple"),
            Operand::with_unit(3.0, "apple"),
        );
        let result = request.evaluate();

        assert_eq!(result.value(), Some(12.0));
        assert_eq!(result.unit(), Some("apple"));
    }

    #[test]
    fn test_unit_dropped_when_mixed_or_missing() {
        let mixed = OperationRequest::new(
            Operation::Add,
            Operand::with_unit(1.0, "apple"),
            Operand::with_unit(2.0, "banana"),
        )
        .evaluate();
        assert_eq!(mixed.value(), Some(3.0));
        assert_eq!(mixed.unit(), None);

        let half = OperationRequest::new(Operation::Add, Operand::with_unit(1.0, "apple"), 2.0)
            .evaluate();
        assert_eq!(half.unit(), None);
    }

    #[test]
    fn test_unit_tags_are_not_normalized() {
        let result = OperationRequest::new(
            Operation::Add,
            Operand::with_unit(1.0, "Apple"),
            Operand::with_unit(2.0, "apple"),
        )
        .evaluate();
        assert_eq!(result.unit(), None);
    }

    #[test]
    fn test_division_by_zero_has_no_value() {
        let result = OperationRequest::new(
            Operation::Divide,
            Operand::with_unit(6.0, "apple"),
            Operand::with_unit(0.0, "apple"),
        )
        .evaluate();

        assert!(!result.is_success());
        assert_eq!(result.value(), None);
        assert_eq!(result.unit(), None);
        assert_eq!(result.error(), Some(OperationError::DivisionByZero));
    }
}
