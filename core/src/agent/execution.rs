//! Agent execution result structures

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Result of a turn that produced an answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentExecution {
    /// Final answer shown to the user
    pub final_result: String,

    /// Number of planner consultations
    pub steps_executed: usize,

    /// Number of tool invocations dispatched
    pub tool_calls: usize,

    /// Total execution time in milliseconds
    pub duration_ms: u64,

    /// Optional metadata
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

impl AgentExecution {
    /// Create a successful execution result
    pub fn success(final_result: String, steps_executed: usize, duration_ms: u64) -> Self {
        Self {
            final_result,
            steps_executed,
            tool_calls: 0,
            duration_ms,
            metadata: None,
        }
    }

    /// Record how many tool invocations the turn used
    pub fn with_tool_calls(mut self, tool_calls: usize) -> Self {
        self.tool_calls = tool_calls;
        self
    }

    /// Add metadata to the result
    pub fn with_metadata(mut self, metadata: HashMap<String, serde_json::Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}
