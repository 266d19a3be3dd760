//! Base tool traits and structures

use crate::error::{Result, ToolError};
use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;
use uuid::Uuid;

/// Trait for all tools
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the name of the tool
    fn name(&self) -> &str;

    /// Get the description of the tool
    fn description(&self) -> &str;

    /// Get the JSON schema for the tool's parameters
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given parameters.
    ///
    /// `Err` means the call itself was malformed. Domain failures come back as an
    /// unsuccessful [`ToolResult`].
    async fn execute(&self, call: ToolCall) -> Result<ToolResult>;

    /// Get examples of how to use this tool
    fn examples(&self) -> Vec<ToolExample> {
        Vec::new()
    }
}

/// A call to a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this tool call
    pub id: String,

    /// Name of the tool to call
    pub name: String,

    /// Parameters to pass to the tool
    pub parameters: serde_json::Value,

    /// Optional metadata, not part of the schema shown to planners
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

/// Result of a tool execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// ID of the tool call this is a result for
    pub tool_call_id: String,

    /// Whether the execution was successful
    pub success: bool,

    /// Result content
    pub content: String,

    /// Optional structured data
    pub data: Option<serde_json::Value>,

    /// Execution duration in milliseconds
    pub duration_ms: Option<u64>,
}

/// Example usage of a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolExample {
    /// Description of what this example does
    pub description: String,

    /// Example parameters
    pub parameters: serde_json::Value,

    /// Expected result description
    pub expected_result: String,
}

/// Tool executor that manages tool execution
pub struct ToolExecutor {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new<S: Into<String>>(name: S, parameters: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            parameters,
            metadata: None,
        }
    }

    /// Use a specific call id
    pub fn with_id<S: Into<String>>(mut self, id: S) -> Self {
        self.id = id.into();
        self
    }

    /// Attach a metadata entry
    pub fn with_metadata_entry<S: Into<String>>(mut self, key: S, value: serde_json::Value) -> Self {
        self.metadata
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value);
        self
    }

    /// Look up a metadata entry
    pub fn metadata_entry(&self, key: &str) -> Option<&serde_json::Value> {
        self.metadata.as_ref().and_then(|m| m.get(key))
    }

    /// Get a parameter value by key
    pub fn get_parameter<T>(&self, key: &str) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let value = self
            .parameters
            .get(key)
            .filter(|value| !value.is_null())
            .ok_or_else(|| ToolError::InvalidParameters {
                tool: self.name.clone(),
                message: format!("Missing parameter: {}", key),
            })?;

        serde_json::from_value(value.clone()).map_err(|_| {
            ToolError::InvalidParameters {
                tool: self.name.clone(),
                message: format!("Invalid parameter type for: {}", key),
            }
            .into()
        })
    }
}

impl ToolResult {
    /// Create a successful result
    pub fn success<S: Into<String>>(tool_call_id: S, content: S) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            success: true,
            content: content.into(),
            data: None,
            duration_ms: None,
        }
    }

    /// Create an error result
    pub fn error<S: Into<String>>(tool_call_id: S, error: S) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            success: false,
            content: format!("Error: {}", error.into()),
            data: None,
            duration_ms: None,
        }
    }

    /// Set structured data
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Set execution duration
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Payload handed back to the planner: structured data when present, text otherwise
    pub fn payload(&self) -> String {
        match &self.data {
            Some(data) => data.to_string(),
            None => self.content.clone(),
        }
    }
}

impl ToolExecutor {
    /// Create a new tool executor
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool
    pub fn register_tool(&mut self, tool: Box<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Get a tool by name
    pub fn get_tool(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// List all available tools, sorted by name
    pub fn list_tools(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Execute a tool call.
    ///
    /// Unknown tools and malformed arguments are returned as `Err` without touching the
    /// tool's handler.
    pub async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let tool = self.get_tool(&call.name).ok_or_else(|| ToolError::NotFound {
            name: call.name.clone(),
        })?;

        let start_time = Instant::now();
        let name = call.name.clone();
        let call_id = call.id.clone();
        let result = tool.execute(call).await;
        let duration = start_time.elapsed().as_millis() as u64;

        match result {
            Ok(result) => {
                tracing::debug!(
                    tool = %name,
                    call_id = %call_id,
                    success = result.success,
                    "Tool call finished"
                );
                Ok(result.with_duration(duration))
            }
            Err(e) => {
                tracing::error!(tool = %name, call_id = %call_id, "Rejected tool call: {}", e);
                Err(e)
            }
        }
    }

    /// Execute a batch of independent calls concurrently.
    ///
    /// The returned vector has one entry per call, in the order the calls were given.
    /// A failing call does not affect its neighbours.
    pub async fn execute_batch(&self, calls: Vec<ToolCall>) -> Vec<Result<ToolResult>> {
        tracing::debug!("Executing batch of {} tool calls", calls.len());
        join_all(calls.into_iter().map(|call| self.execute(call))).await
    }

    /// Get tool definitions for LLM function calling
    pub fn get_tool_definitions(&self) -> Vec<crate::llm::ToolDefinition> {
        self.list_tools()
            .into_iter()
            .filter_map(|name| self.get_tool(name))
            .map(|tool| crate::llm::ToolDefinition {
                tool_type: "function".to_string(),
                function: crate::llm::FunctionDefinition {
                    name: tool.name().to_string(),
                    description: tool.description().to_string(),
                    parameters: tool.parameters_schema(),
                },
            })
            .collect()
    }
}

impl Default for ToolExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde_json::json;
    use std::time::Duration;

    /// Echoes `value` after sleeping `delay_ms`
    struct SlowEchoTool;

    #[async_trait]
    impl Tool for SlowEchoTool {
        fn name(&self) -> &str {
            "slow_echo"
        }

        fn description(&self) -> &str {
            "Echoes a value after a delay."
        }

        fn parameters_schema(&self) -> serde_json::Value {
            json!({
                "type": "object",
                "properties": {
                    "value": { "type": "number" },
                    "delay_ms": { "type": "integer" }
                },
                "required": ["value", "delay_ms"]
            })
        }

        async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
            let value: f64 = call.get_parameter("value")?;
            let delay_ms: u64 = call.get_parameter("delay_ms")?;
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            Ok(ToolResult::success(call.id.as_str(), value.to_string().as_str())
                .with_data(json!({ "result": value })))
        }
    }

    fn executor() -> ToolExecutor {
        let mut executor = ToolExecutor::new();
        executor.register_tool(Box::new(SlowEchoTool));
        executor
    }

    #[test]
    fn test_get_parameter_missing_and_mistyped() {
        let call = ToolCall::new("slow_echo", json!({ "value": "three", "delay_ms": null }));

        let mistyped = call.get_parameter::<f64>("value");
        assert!(matches!(
            mistyped,
            Err(Error::Tool(ToolError::InvalidParameters { .. }))
        ));

        let null = call.get_parameter::<u64>("delay_ms");
        assert!(matches!(
            null,
            Err(Error::Tool(ToolError::InvalidParameters { .. }))
        ));

        let missing = call.get_parameter::<f64>("absent");
        assert!(matches!(
            missing,
            Err(Error::Tool(ToolError::InvalidParameters { .. }))
        ));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_rejected() {
        let result = executor()
            .execute(ToolCall::new("modulo", json!({})))
            .await;

        match result {
            Err(Error::Tool(ToolError::NotFound { name })) => assert_eq!(name, "modulo"),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_batch_preserves_request_order() {
        // Later calls finish first.
        let calls: Vec<ToolCall> = (0..5)
            .map(|i| {
                ToolCall::new("slow_echo", json!({ "value": i, "delay_ms": (5 - i) * 20 }))
                    .with_id(format!("call-{}", i))
            })
            .collect();

        let results = executor().execute_batch(calls).await;

        assert_eq!(results.len(), 5);
        for (i, result) in results.iter().enumerate() {
            let result = result.as_ref().expect("call should succeed");
            assert_eq!(result.tool_call_id, format!("call-{}", i));
            assert_eq!(result.data, Some(json!({ "result": i as f64 })));
        }
    }

    #[tokio::test]
    async fn test_batch_failure_is_isolated() {
        let calls = vec![
            ToolCall::new("slow_echo", json!({ "value": 1, "delay_ms": 0 })),
            ToolCall::new("missing_tool", json!({})),
            ToolCall::new("slow_echo", json!({ "delay_ms": 0 })),
            ToolCall::new("slow_echo", json!({ "value": 4, "delay_ms": 0 })),
        ];

        let results = executor().execute_batch(calls).await;

        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(Error::Tool(ToolError::NotFound { .. }))
        ));
        assert!(matches!(
            results[2],
            Err(Error::Tool(ToolError::InvalidParameters { .. }))
        ));
        assert!(results[3].is_ok());
    }

    #[test]
    fn test_payload_prefers_structured_data() {
        let plain = ToolResult::success("id", "done");
        assert_eq!(plain.payload(), "done");

        let structured = ToolResult::success("id", "done").with_data(json!({ "result": 2.0 }));
        assert_eq!(structured.payload(), r#"{"result":2.0}"#);
    }
}
