//! Arithmetic tools exposed to planners
//!
//! Each operation of the operation library is published as its own tool with the two
//! named parameters `firstNumber` and `secondNumber`.

use crate::error::Result;
use crate::operations::{Operand, Operation, OperationRequest};
use crate::tools::{Tool, ToolCall, ToolExample, ToolFactory, ToolResult};
use async_trait::async_trait;
use serde_json::json;

/// Parameter name of the left operand
pub const FIRST_NUMBER: &str = "firstNumber";
/// Parameter name of the right operand
pub const SECOND_NUMBER: &str = "secondNumber";
/// Metadata key carrying `[first_unit, second_unit]` for an invocation
pub const UNITS_METADATA_KEY: &str = "units";

/// A tool wrapping one arithmetic operation
pub struct ArithmeticTool {
    operation: Operation,
}

impl ArithmeticTool {
    pub fn new(operation: Operation) -> Self {
        Self { operation }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    fn first_number_description(&self) -> &'static str {
        match self.operation {
            Operation::Divide => "The dividend (the number being divided).",
            _ => "The first number.",
        }
    }

    fn second_number_description(&self) -> &'static str {
        match self.operation {
            Operation::Subtract => "The second number to subtract.",
            Operation::Divide => "The divisor (the number to divide by). This value cannot be 0.",
            _ => "The second number.",
        }
    }

    /// Unit tags attached by the caller through invocation metadata
    fn operand_units(call: &ToolCall) -> (Option<String>, Option<String>) {
        let units = call
            .metadata_entry(UNITS_METADATA_KEY)
            .and_then(|value| value.as_array());

        let unit_at = |index: usize| {
            units
                .and_then(|units| units.get(index))
                .and_then(|unit| unit.as_str())
                .map(str::to_string)
        };

        (unit_at(0), unit_at(1))
    }
}

#[async_trait]
impl Tool for ArithmeticTool {
    fn name(&self) -> &str {
        self.operation.name()
    }

    fn description(&self) -> &str {
        tool_description(self.operation)
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                FIRST_NUMBER: {
                    "type": "number",
                    "description": self.first_number_description()
                },
                SECOND_NUMBER: {
                    "type": "number",
                    "description": self.second_number_description()
                }
            },
            "required": [FIRST_NUMBER, SECOND_NUMBER]
        })
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let first: f64 = call.get_parameter(FIRST_NUMBER)?;
        let second: f64 = call.get_parameter(SECOND_NUMBER)?;
        let (first_unit, second_unit) = Self::operand_units(&call);

        let request = OperationRequest {
            operation: self.operation,
            first: Operand {
                value: first,
                unit: first_unit,
            },
            second: Operand {
                value: second,
                unit: second_unit,
            },
        };
        let result = request.evaluate();

        match result.outcome() {
            Ok(value) => {
                let mut data = json!({ "result": value });
                if let Some(unit) = result.unit() {
                    data["unit"] = json!(unit);
                }
                Ok(ToolResult::success(call.id.clone(), value.to_string()).with_data(data))
            }
            Err(e) => {
                tracing::debug!(
                    operation = %self.operation,
                    first,
                    second,
                    "Operation failed: {}",
                    e
                );
                Ok(ToolResult::error(call.id.clone(), e.to_string()).with_data(json!({
                    "error": e.to_string(),
                    "kind": e.kind()
                })))
            }
        }
    }

    fn examples(&self) -> Vec<ToolExample> {
        let (first, second, expected) = match self.operation {
            Operation::Add => (2.0, 3.0, "{\"result\": 5.0}"),
            Operation::Subtract => (15.0, 3.0, "{\"result\": 12.0}"),
            Operation::Multiply => (2.0, 3.0, "{\"result\": 6.0}"),
            Operation::Divide => (6.0, 3.0, "{\"result\": 2.0}"),
        };

        vec![ToolExample {
            description: format!("{}({}, {})", self.operation, first, second),
            parameters: json!({ FIRST_NUMBER: first, SECOND_NUMBER: second }),
            expected_result: expected.to_string(),
        }]
    }
}

/// Human-readable description of an operation tool
pub fn tool_description(operation: Operation) -> &'static str {
    match operation {
        Operation::Add => "Adds two numbers.",
        Operation::Subtract => "Subtracts the second number from the first.",
        Operation::Multiply => "Multiplies two numbers.",
        Operation::Divide => "Divides the first number by the second.",
    }
}

/// Factory producing an [`ArithmeticTool`] for one operation
pub struct ArithmeticToolFactory {
    operation: Operation,
}

impl ArithmeticToolFactory {
    pub fn new(operation: Operation) -> Self {
        Self { operation }
    }
}

impl ToolFactory for ArithmeticToolFactory {
    fn create(&self) -> Box<dyn Tool> {
        Box::new(ArithmeticTool::new(self.operation))
    }

    fn tool_name(&self) -> &str {
        self.operation.name()
    }

    fn tool_description(&self) -> &str {
        tool_description(self.operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ToolError};

    fn call(operation: Operation, first: f64, second: f64) -> ToolCall {
        ToolCall::new(
            operation.name(),
            json!({ FIRST_NUMBER: first, SECOND_NUMBER: second }),
        )
    }

    async fn run(operation: Operation, first: f64, second: f64) -> ToolResult {
        ArithmeticTool::new(operation)
            .execute(call(operation, first, second))
            .await
            .expect("well-formed call")
    }

    #[tokio::test]
    async fn test_scenarios() {
        assert_eq!(run(Operation::Add, 2.0, 3.0).await.data, Some(json!({ "result": 5.0 })));
        assert_eq!(
            run(Operation::Subtract, 5.0, 3.0).await.data,
            Some(json!({ "result": 2.0 }))
        );
        assert_eq!(
            run(Operation::Multiply, 2.0, 3.0).await.data,
            Some(json!({ "result": 6.0 }))
        );
        assert_eq!(
            run(Operation::Divide, 6.0, 3.0).await.data,
            Some(json!({ "result": 2.0 }))
        );
    }

    #[tokio::test]
    async fn test_divide_by_zero_produces_no_result() {
        let result = run(Operation::Divide, 6.0, 0.0).await;

        assert!(!result.success);
        let data = result.data.expect("failure payload");
        assert!(data.get("result").is_none());
        assert_eq!(data["kind"], "division_by_zero");
        assert_eq!(data["error"], "Cannot divide by zero.");
    }

    #[tokio::test]
    async fn test_units_from_metadata() {
        let tool = ArithmeticTool::new(Operation::Subtract);
        let same = call(Operation::Subtract, 15.0, 3.0)
            .with_metadata_entry(UNITS_METADATA_KEY, json!(["apple", "apple"]));
        let result = tool.execute(same).await.expect("well-formed call");
        assert_eq!(result.data, Some(json!({ "result": 12.0, "unit": "apple" })));

        let mixed = call(Operation::Subtract, 15.0, 3.0)
            .with_metadata_entry(UNITS_METADATA_KEY, json!(["apple", null]));
        let result = tool.execute(mixed).await.expect("well-formed call");
        assert_eq!(result.data, Some(json!({ "result": 12.0 })));
    }

    #[tokio::test]
    async fn test_non_numeric_argument_is_contract_violation() {
        let tool = ArithmeticTool::new(Operation::Add);
        let bad = ToolCall::new("add", json!({ FIRST_NUMBER: "two", SECOND_NUMBER: 3 }));

        match tool.execute(bad).await {
            Err(Error::Tool(ToolError::InvalidParameters { tool, message })) => {
                assert_eq!(tool, "add");
                assert!(message.contains(FIRST_NUMBER));
            }
            other => panic!("expected InvalidParameters, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_argument_is_contract_violation() {
        let tool = ArithmeticTool::new(Operation::Divide);
        let bad = ToolCall::new("divide", json!({ FIRST_NUMBER: 6 }));

        assert!(matches!(
            tool.execute(bad).await,
            Err(Error::Tool(ToolError::InvalidParameters { .. }))
        ));
    }

    #[test]
    fn test_divide_schema_documents_zero_constraint() {
        let schema = ArithmeticTool::new(Operation::Divide).parameters_schema();
        let description = schema["properties"][SECOND_NUMBER]["description"]
            .as_str()
            .unwrap_or_default();
        assert!(description.contains("cannot be 0"));
        assert_eq!(schema["properties"][FIRST_NUMBER]["type"], "number");
        assert_eq!(schema["required"], json!([FIRST_NUMBER, SECOND_NUMBER]));
    }
}
