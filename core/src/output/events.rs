//! Agent events and the output trait that receives them

use crate::tools::{ToolCall, ToolResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Error type returned by output handlers
pub type OutputError = Box<dyn std::error::Error + Send + Sync>;

/// Severity of a free-form message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Debug,
    Info,
    Normal,
    Warning,
    Error,
}

/// Accumulated token usage of a turn
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

/// Context of a single conversation turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnContext {
    /// Session the turn belongs to
    pub session_id: String,
    /// Zero-based index of the turn within the session
    pub turn_index: usize,
    /// The user's utterance
    pub utterance: String,
    /// Planning steps used so far
    pub current_step: usize,
    /// Wall-clock duration of the turn
    pub execution_time: Duration,
    pub token_usage: TokenUsage,
}

/// Lifecycle of one tool invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolExecutionStatus {
    Executing,
    Success,
    Error,
}

/// Display information about a tool invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolExecutionInfo {
    /// The tool call id
    pub execution_id: String,
    pub tool_name: String,
    pub parameters: serde_json::Value,
    pub status: ToolExecutionStatus,
    /// Result payload once the call finished
    pub result_content: Option<String>,
    pub duration_ms: Option<u64>,
}

impl ToolExecutionInfo {
    /// Build the info for a call, optionally with its result
    pub fn create_tool_execution_info(
        tool_call: &ToolCall,
        status: ToolExecutionStatus,
        result: Option<&ToolResult>,
    ) -> Self {
        Self {
            execution_id: tool_call.id.clone(),
            tool_name: tool_call.name.clone(),
            parameters: tool_call.parameters.clone(),
            status,
            result_content: result.map(ToolResult::payload),
            duration_ms: result.and_then(|r| r.duration_ms),
        }
    }
}

/// Events emitted while the agent handles a turn
#[derive(Debug, Clone)]
pub enum AgentEvent {
    /// A new utterance is being handled
    TurnStarted { context: TurnContext },

    /// The turn finished, with the final answer or the failure reason
    TurnCompleted {
        context: TurnContext,
        success: bool,
        response: String,
    },

    /// The planner is being consulted
    PlanningStep { step_number: usize },

    ToolExecutionStarted { tool_info: ToolExecutionInfo },

    ToolExecutionCompleted { tool_info: ToolExecutionInfo },

    TokenUsageUpdated { token_usage: TokenUsage },

    /// Free-form message
    Message {
        level: MessageLevel,
        content: String,
        metadata: Option<HashMap<String, serde_json::Value>>,
    },
}

/// Receiver of agent events
#[async_trait]
pub trait AgentOutput: Send + Sync {
    /// Handle one event
    async fn emit_event(&self, event: AgentEvent) -> Result<(), OutputError>;

    /// Whether the handler can update earlier output in place
    fn supports_realtime_updates(&self) -> bool {
        false
    }

    /// Flush any buffered output
    async fn flush(&self) -> Result<(), OutputError> {
        Ok(())
    }

    async fn emit_token_update(&self, token_usage: TokenUsage) -> Result<(), OutputError> {
        self.emit_event(AgentEvent::TokenUsageUpdated { token_usage })
            .await
    }

    async fn message(&self, level: MessageLevel, content: &str) -> Result<(), OutputError> {
        self.emit_event(AgentEvent::Message {
            level,
            content: content.to_string(),
            metadata: None,
        })
        .await
    }

    async fn normal(&self, content: &str) -> Result<(), OutputError> {
        self.message(MessageLevel::Normal, content).await
    }

    async fn debug(&self, content: &str) -> Result<(), OutputError> {
        self.message(MessageLevel::Debug, content).await
    }

    async fn warning(&self, content: &str) -> Result<(), OutputError> {
        self.message(MessageLevel::Warning, content).await
    }

    async fn error(&self, content: &str) -> Result<(), OutputError> {
        self.message(MessageLevel::Error, content).await
    }
}

/// Output handler that discards everything
pub struct NullOutput;

#[async_trait]
impl AgentOutput for NullOutput {
    async fn emit_event(&self, _event: AgentEvent) -> Result<(), OutputError> {
        Ok(())
    }
}
