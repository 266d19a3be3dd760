//! LLM client abstractions and implementations

pub mod client;
pub mod message;
pub mod providers;

pub use client::{
    ChatOptions, FinishReason, FunctionDefinition, LlmClient, LlmResponse, ToolDefinition, Usage,
};
pub use message::{ContentBlock, LlmMessage, MessageContent, MessageRole, TOOL_CALL_METADATA_KEY};
pub use providers::*;
