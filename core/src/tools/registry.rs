//! Tool registry for managing available tools

use crate::operations::Operation;
use crate::tools::builtin::ArithmeticToolFactory;
use crate::tools::{Tool, ToolExecutor};
use std::collections::HashMap;

/// Registry for managing tool creation and registration
pub struct ToolRegistry {
    factories: HashMap<String, Box<dyn ToolFactory>>,
}

/// Factory trait for creating tools
pub trait ToolFactory: Send + Sync {
    /// Create a new instance of the tool
    fn create(&self) -> Box<dyn Tool>;

    /// Get the name of the tool this factory creates
    fn tool_name(&self) -> &str;

    /// Get the description of the tool this factory creates
    fn tool_description(&self) -> &str;
}

impl ToolRegistry {
    /// Create a new tool registry
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a tool factory
    pub fn register_factory(&mut self, factory: Box<dyn ToolFactory>) {
        self.factories
            .insert(factory.tool_name().to_string(), factory);
    }

    /// Create a tool by name
    pub fn create_tool(&self, name: &str) -> Option<Box<dyn Tool>> {
        self.factories.get(name).map(|factory| factory.create())
    }

    /// List all available tool names, sorted
    pub fn list_tools(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Get tool information
    pub fn get_tool_info(&self, name: &str) -> Option<(&str, &str)> {
        self.factories
            .get(name)
            .map(|factory| (factory.tool_name(), factory.tool_description()))
    }

    /// Create a tool executor with the specified tools
    pub fn create_executor(&self, tool_names: &[String]) -> ToolExecutor {
        let mut executor = ToolExecutor::new();

        for name in tool_names {
            match self.create_tool(name) {
                Some(tool) => executor.register_tool(tool),
                None => tracing::warn!("Ignoring unknown tool in configuration: {}", name),
            }
        }

        executor
    }

    /// Create a tool executor with all available tools
    pub fn create_executor_with_all(&self) -> ToolExecutor {
        let mut executor = ToolExecutor::new();

        for factory in self.factories.values() {
            executor.register_tool(factory.create());
        }

        executor
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        let mut registry = Self::new();

        for operation in Operation::ALL {
            registry.register_factory(Box::new(ArithmeticToolFactory::new(operation)));
        }

        registry
    }
}

/// Names of the tools every calculator agent gets
pub fn default_tool_names() -> Vec<String> {
    Operation::ALL
        .iter()
        .map(|op| op.name().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolCall;
    use serde_json::json;

    const EXPECTED_TOOLS: [&str; 4] = ["add", "divide", "multiply", "subtract"];

    #[test]
    fn test_default_registry_has_all_tools() {
        let registry = ToolRegistry::default();
        assert_eq!(registry.list_tools(), EXPECTED_TOOLS.to_vec());
    }

    #[test]
    fn test_tool_creation() {
        let registry = ToolRegistry::default();

        for tool_name in EXPECTED_TOOLS {
            let tool = registry
                .create_tool(tool_name)
                .unwrap_or_else(|| panic!("Failed to create tool '{}'", tool_name));

            assert_eq!(tool.name(), tool_name, "Tool name mismatch for '{}'", tool_name);
            assert!(
                !tool.description().is_empty(),
                "Tool '{}' has empty description",
                tool_name
            );
        }
    }

    #[test]
    fn test_tool_info() {
        let registry = ToolRegistry::default();

        for tool_name in registry.list_tools() {
            let (name, description) = registry
                .get_tool_info(tool_name)
                .unwrap_or_else(|| panic!("Failed to get info for tool '{}'", tool_name));
            assert_eq!(name, tool_name);
            assert!(!description.is_empty());
        }
    }

    #[test]
    fn test_tool_parameter_schemas() {
        let registry = ToolRegistry::default();

        for tool_name in registry.list_tools() {
            let tool = registry.create_tool(tool_name).unwrap();
            let schema = tool.parameters_schema();

            assert_eq!(schema["type"], "object", "Tool '{}' schema type", tool_name);

            let props = schema["properties"]
                .as_object()
                .unwrap_or_else(|| panic!("Tool '{}' has no properties", tool_name));
            assert_eq!(props.len(), 2);

            for param in ["firstNumber", "secondNumber"] {
                assert_eq!(props[param]["type"], "number");
                assert!(
                    props[param]["description"]
                        .as_str()
                        .is_some_and(|d| !d.is_empty()),
                    "Tool '{}' parameter '{}' lacks a description",
                    tool_name,
                    param
                );
            }
        }
    }

    #[test]
    fn test_tool_examples() {
        let registry = ToolRegistry::default();

        for tool_name in registry.list_tools() {
            let tool = registry.create_tool(tool_name).unwrap();
            let examples = tool.examples();

            assert!(!examples.is_empty(), "Tool '{}' has no examples", tool_name);
            for example in examples {
                assert!(example.description.starts_with(tool_name));
                assert!(example.parameters.is_object());
                assert!(!example.expected_result.is_empty());
            }
        }
    }

    #[tokio::test]
    async fn test_executor_creation() {
        let registry = ToolRegistry::default();

        let executor = registry.create_executor(&["add".to_string(), "unknown".to_string()]);
        assert_eq!(executor.list_tools(), vec!["add"]);

        let all = registry.create_executor_with_all();
        assert_eq!(all.list_tools(), EXPECTED_TOOLS.to_vec());
        assert_eq!(all.get_tool_definitions().len(), 4);

        let result = all
            .execute(ToolCall::new(
                "multiply",
                json!({ "firstNumber": 2, "secondNumber": 3 }),
            ))
            .await
            .expect("well-formed call");
        assert_eq!(result.data, Some(json!({ "result": 6.0 })));
    }

    #[test]
    fn test_default_tool_names_match_registry() {
        let registry = ToolRegistry::default();
        for name in default_tool_names() {
            assert!(registry.create_tool(&name).is_some());
        }
    }
}
