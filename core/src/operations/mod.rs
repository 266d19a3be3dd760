//! Arithmetic operation library
//!
//! Four pure operations over `f64`. Nothing here keeps state or performs I/O, and no
//! unit reasoning happens inside the functions themselves; [`OperationRequest`] layers the
//! unit-tag carry on top.

pub mod operand;

#[cfg(test)]
mod proptests;

pub use operand::{Operand, OperationRequest, OperationResult};

use crate::error::OperationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Adds two numbers.
pub fn add(a: f64, b: f64) -> f64 {
    a + b
}

/// Subtracts the second number from the first.
pub fn subtract(a: f64, b: f64) -> f64 {
    a - b
}

/// Multiplies two numbers.
pub fn multiply(a: f64, b: f64) -> f64 {
    a * b
}

/// Divides the first number by the second.
///
/// Fails with [`OperationError::DivisionByZero`] when the divisor is zero (either sign).
pub fn divide(a: f64, b: f64) -> Result<f64, OperationError> {
    if b == 0.0 {
        return Err(OperationError::DivisionByZero);
    }
    Ok(a / b)
}

/// The four supported operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operation {
    /// All operations, in registration order
    pub const ALL: [Operation; 4] = [
        Operation::Add,
        Operation::Subtract,
        Operation::Multiply,
        Operation::Divide,
    ];

    /// Tool name exposed to planners
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Subtract => "subtract",
            Operation::Multiply => "multiply",
            Operation::Divide => "divide",
        }
    }

    /// Look an operation up by its tool name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    /// Apply the operation to two numbers
    pub fn apply(&self, a: f64, b: f64) -> Result<f64, OperationError> {
        match self {
            Operation::Add => Ok(add(a, b)),
            Operation::Subtract => Ok(subtract(a, b)),
            Operation::Multiply => Ok(multiply(a, b)),
            Operation::Divide => divide(a, b),
        }
    }

    /// Multiplicative operations bind tighter than additive ones
    pub fn is_multiplicative(&self) -> bool {
        matches!(self, Operation::Multiply | Operation::Divide)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
