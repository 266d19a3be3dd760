//! Conversation policy
//!
//! The fixed replies CalcBot gives outside of calculations, plus the in-process
//! [`RulePlanner`] that applies the policy without a hosted model.

pub mod plan;
pub mod planner;
pub mod quantity;
pub mod render;

pub use plan::{interpret, CalculationPlan, Intent, Total};
pub use planner::RulePlanner;

/// Persona name used when none is configured
pub const DEFAULT_PERSONA: &str = "CalcBot";

/// Reply to "what can you do?"
pub const CAPABILITIES_RESPONSE: &str =
    "I can perform basic arithmetic operations: addition, subtraction, multiplication, and division. Just give me a calculation to solve!";

/// Reply to anything that is not a calculation
pub const SCOPE_RESPONSE: &str =
    "I'm sorry, but I can only help with calculations. Please ask me to add, subtract, multiply, or divide some numbers.";

/// Reply when a division by zero was requested
pub const DIVISION_BY_ZERO_RESPONSE: &str = "I'm sorry, but division by zero is not possible.";

/// Reply when an operation failed for any other reason
pub const OPERATION_FAILED_RESPONSE: &str = "I'm sorry, but that operation is not possible.";

/// Reply to products, quotients or differences of different kinds of items
pub const MIXED_UNITS_RESPONSE: &str =
    "I'm sorry, but I can only subtract, multiply or divide quantities of the same kind.";

/// Reply when an operator is missing an operand
pub const INCOMPLETE_RESPONSE: &str =
    "I need two numbers for every operation. Could you restate the calculation?";

/// Greeting that introduces the persona
pub fn greeting_response(persona: &str) -> String {
    format!(
        "Hello! I'm {}, your friendly calculator assistant. I can help you with addition, subtraction, multiplication, and division. How can I help you with your calculations today?",
        persona
    )
}
