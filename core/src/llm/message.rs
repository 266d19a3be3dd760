//! LLM message structures

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Message metadata key holding per-call tool metadata
pub const TOOL_CALL_METADATA_KEY: &str = "tool_call_metadata";

/// Represents a message in an LLM conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmMessage {
    /// Role of the message sender
    pub role: MessageRole,

    /// Content of the message
    pub content: MessageContent,

    /// Optional metadata
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

/// Role of the message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System message (instructions)
    System,

    /// User message (human input)
    User,

    /// Assistant message (AI response)
    Assistant,

    /// Tool message (tool execution result)
    Tool,
}

/// Content of a message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Simple text content
    Text(String),

    /// Multi-modal content with text and other media
    MultiModal(Vec<ContentBlock>),
}

/// A block of content within a message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Text content
    Text { text: String },

    /// Tool use request
    ToolUse {
        /// Unique identifier for this tool use
        id: String,
        /// Name of the tool to use
        name: String,
        /// Input parameters for the tool
        input: serde_json::Value,
    },

    /// Tool result
    ToolResult {
        /// ID of the tool use this is a result for
        tool_use_id: String,
        /// Whether the tool execution was successful
        is_error: Option<bool>,
        /// Result content
        content: String,
    },
}

impl LlmMessage {
    /// Create a new system message
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self {
            role: MessageRole::System,
            content: MessageContent::Text(content.into()),
            metadata: None,
        }
    }

    /// Create a new user message
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self {
            role: MessageRole::User,
            content: MessageContent::Text(content.into()),
            metadata: None,
        }
    }

    /// Create a new assistant message
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: MessageContent::Text(content.into()),
            metadata: None,
        }
    }

    /// Create an assistant message requesting tool calls.
    ///
    /// Per-call metadata is kept on the message under [`TOOL_CALL_METADATA_KEY`], keyed by
    /// call id, so it survives the trip through the conversation.
    pub fn tool_uses(calls: Vec<crate::tools::ToolCall>) -> Self {
        let mut call_metadata = serde_json::Map::new();
        let mut blocks = Vec::with_capacity(calls.len());

        for call in calls {
            if let Some(metadata) = call.metadata {
                call_metadata.insert(call.id.clone(), serde_json::json!(metadata));
            }
            blocks.push(ContentBlock::ToolUse {
                id: call.id,
                name: call.name,
                input: call.parameters,
            });
        }

        let metadata = (!call_metadata.is_empty()).then(|| {
            HashMap::from([(
                TOOL_CALL_METADATA_KEY.to_string(),
                serde_json::Value::Object(call_metadata),
            )])
        });

        Self {
            role: MessageRole::Assistant,
            content: MessageContent::MultiModal(blocks),
            metadata,
        }
    }

    /// Create a tool message carrying the result of one call
    pub fn tool_result<S: Into<String>>(tool_use_id: S, content: S, is_error: bool) -> Self {
        Self {
            role: MessageRole::Tool,
            content: MessageContent::MultiModal(vec![ContentBlock::ToolResult {
                tool_use_id: tool_use_id.into(),
                is_error: Some(is_error),
                content: content.into(),
            }]),
            metadata: None,
        }
    }

    /// Get the text content of the message
    pub fn get_text(&self) -> Option<String> {
        match &self.content {
            MessageContent::Text(text) => Some(text.clone()),
            MessageContent::MultiModal(blocks) => {
                let mut text_parts = Vec::new();
                for block in blocks {
                    if let ContentBlock::Text { text } = block {
                        text_parts.push(text.clone());
                    }
                }
                if text_parts.is_empty() {
                    None
                } else {
                    Some(text_parts.join("\n"))
                }
            }
        }
    }

    /// Check if the message contains tool use
    pub fn has_tool_use(&self) -> bool {
        match &self.content {
            MessageContent::Text(_) => false,
            MessageContent::MultiModal(blocks) => blocks
                .iter()
                .any(|block| matches!(block, ContentBlock::ToolUse { .. })),
        }
    }

    /// Extract tool use blocks from the message
    pub fn get_tool_uses(&self) -> Vec<&ContentBlock> {
        match &self.content {
            MessageContent::Text(_) => Vec::new(),
            MessageContent::MultiModal(blocks) => blocks
                .iter()
                .filter(|block| matches!(block, ContentBlock::ToolUse { .. }))
                .collect(),
        }
    }

    /// Convert the tool use blocks of the message into tool calls, in order
    pub fn tool_calls(&self) -> Vec<crate::tools::ToolCall> {
        self.get_tool_uses()
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse { id, name, input } => Some(crate::tools::ToolCall {
                    id: id.clone(),
                    name: name.clone(),
                    parameters: input.clone(),
                    metadata: self.call_metadata(id),
                }),
                _ => None,
            })
            .collect()
    }

    fn call_metadata(&self, call_id: &str) -> Option<HashMap<String, serde_json::Value>> {
        self.metadata
            .as_ref()
            .and_then(|metadata| metadata.get(TOOL_CALL_METADATA_KEY))
            .and_then(|calls| calls.get(call_id))
            .and_then(|entry| serde_json::from_value(entry.clone()).ok())
    }

    /// Tool result blocks carried by the message
    pub fn tool_results(&self) -> Vec<(&str, bool, &str)> {
        match &self.content {
            MessageContent::Text(_) => Vec::new(),
            MessageContent::MultiModal(blocks) => blocks
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::ToolResult {
                        tool_use_id,
                        is_error,
                        content,
                    } => Some((tool_use_id.as_str(), is_error.unwrap_or(false), content.as_str())),
                    _ => None,
                })
                .collect(),
        }
    }
}

impl From<String> for MessageContent {
    fn from(text: String) -> Self {
        MessageContent::Text(text)
    }
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        MessageContent::Text(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolCall;
    use serde_json::json;

    #[test]
    fn test_tool_uses_round_trip_in_order() {
        let calls = vec![
            ToolCall::new("add", json!({ "firstNumber": 2, "secondNumber": 2 })).with_id("a"),
            ToolCall::new("multiply", json!({ "firstNumber": 1, "secondNumber": 3 }))
                .with_id("b"),
        ];

        let message = LlmMessage::tool_uses(calls);
        assert!(message.has_tool_use());
        assert_eq!(message.role, MessageRole::Assistant);

        let names: Vec<(String, String)> = message
            .tool_calls()
            .into_iter()
            .map(|call| (call.id, call.name))
            .collect();
        assert_eq!(
            names,
            vec![
                ("a".to_string(), "add".to_string()),
                ("b".to_string(), "multiply".to_string())
            ]
        );
    }

    #[test]
    fn test_tool_call_metadata_survives_message() {
        let call = ToolCall::new("subtract", json!({ "firstNumber": 15, "secondNumber": 3 }))
            .with_id("c")
            .with_metadata_entry("units", json!(["apple", "apple"]));
        let bare = ToolCall::new("add", json!({ "firstNumber": 1, "secondNumber": 1 })).with_id("d");

        let message = LlmMessage::tool_uses(vec![call, bare]);
        let calls = message.tool_calls();

        assert_eq!(calls[0].metadata_entry("units"), Some(&json!(["apple", "apple"])));
        assert!(calls[1].metadata.is_none());
    }

    #[test]
    fn test_tool_result_message() {
        let message = LlmMessage::tool_result("a", r#"{"result":4.0}"#, false);
        assert_eq!(message.role, MessageRole::Tool);
        assert_eq!(message.tool_results(), vec![("a", false, r#"{"result":4.0}"#)]);
        assert!(message.get_text().is_none());
    }

    #[test]
    fn test_text_message_has_no_tool_blocks() {
        let message = LlmMessage::user("What is 15 minus 3?");
        assert!(!message.has_tool_use());
        assert!(message.tool_calls().is_empty());
        assert_eq!(message.get_text().as_deref(), Some("What is 15 minus 3?"));
    }
}
