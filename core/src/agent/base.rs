//! Base agent trait and structures

use super::config::AgentConfig;
use super::execution::AgentExecution;
use crate::error::Result;
use crate::session::Session;
use async_trait::async_trait;

/// Result type for agent operations
pub type AgentResult<T> = Result<T>;

/// Base trait for conversational agents
#[async_trait]
pub trait Agent: Send + Sync {
    /// Handle one user utterance and produce the final answer of the turn
    async fn execute_turn(&mut self, utterance: &str) -> AgentResult<AgentExecution>;

    /// Get the agent's configuration
    fn config(&self) -> &AgentConfig;

    /// Get the agent's name/type
    fn agent_type(&self) -> &str;

    /// The session the agent records its turns in
    fn session(&self) -> &Session;
}
