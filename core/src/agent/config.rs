//! Agent configuration structures

use crate::policy::DEFAULT_PERSONA;
use crate::tools::registry::default_tool_names;
use serde::{Deserialize, Serialize};

/// Output mode for the agent
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Show every tool invocation and its payload
    Debug,
    /// Show only the answers
    #[default]
    Normal,
}

/// Configuration for an agent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Maximum planner consultations per turn
    pub max_steps: usize,

    /// Name the assistant introduces itself with
    pub persona: String,

    /// List of tools available to this agent
    pub tools: Vec<String>,

    /// Output mode for the agent (debug or normal)
    pub output_mode: OutputMode,

    /// Custom system prompt template (optional).
    /// If not provided, the default calculator prompt is used.
    pub system_prompt: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: 10,
            persona: DEFAULT_PERSONA.to_string(),
            tools: default_tool_names(),
            output_mode: OutputMode::default(),
            system_prompt: None,
        }
    }
}

/// Builder for creating agents with resolved LLM configuration
pub struct AgentBuilder {
    llm_config: crate::config::ResolvedLlmConfig,
    agent_config: AgentConfig,
}

impl AgentBuilder {
    /// Create a new agent builder with LLM configuration
    pub fn new(llm_config: crate::config::ResolvedLlmConfig) -> Self {
        Self {
            llm_config,
            agent_config: AgentConfig::default(),
        }
    }

    /// Set agent configuration
    pub fn with_agent_config(mut self, agent_config: AgentConfig) -> Self {
        self.agent_config = agent_config;
        self
    }

    /// Set maximum steps
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.agent_config.max_steps = max_steps;
        self
    }

    /// Set the persona name
    pub fn with_persona<S: Into<String>>(mut self, persona: S) -> Self {
        self.agent_config.persona = persona.into();
        self
    }

    /// Set tools
    pub fn with_tools(mut self, tools: Vec<String>) -> Self {
        self.agent_config.tools = tools;
        self
    }

    /// Set output mode
    pub fn with_output_mode(mut self, output_mode: OutputMode) -> Self {
        self.agent_config.output_mode = output_mode;
        self
    }

    /// Set system prompt
    pub fn with_system_prompt(mut self, system_prompt: Option<String>) -> Self {
        self.agent_config.system_prompt = system_prompt;
        self
    }

    /// Build the agent with the given output handler
    pub async fn build_with_output(
        self,
        output: Box<dyn crate::output::AgentOutput>,
    ) -> crate::error::Result<super::AgentCore> {
        super::AgentCore::new_with_llm_config(self.agent_config, self.llm_config, output).await
    }

    /// Build the agent with null output (for testing)
    pub async fn build(self) -> crate::error::Result<super::AgentCore> {
        use crate::output::NullOutput;
        self.build_with_output(Box::new(NullOutput)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AgentConfig::default();
        assert_eq!(config.max_steps, 10);
        assert_eq!(config.persona, "CalcBot");
        assert_eq!(config.tools, vec!["add", "subtract", "multiply", "divide"]);
        assert_eq!(config.output_mode, OutputMode::Normal);
        assert!(config.system_prompt.is_none());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AgentConfig =
            serde_json::from_str(r#"{ "max_steps": 4, "output_mode": "debug" }"#).unwrap();
        assert_eq!(config.max_steps, 4);
        assert_eq!(config.output_mode, OutputMode::Debug);
        assert_eq!(config.persona, "CalcBot");
        assert_eq!(config.tools.len(), 4);
    }

    #[test]
    fn test_system_prompt_serialization() {
        let config = AgentConfig {
            system_prompt: Some("You are {{persona}}.".to_string()),
            ..Default::default()
        };

        let json = serde_json::to_string(&config).unwrap();
        let deserialized: AgentConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(
            deserialized.system_prompt,
            Some("You are {{persona}}.".to_string())
        );
    }
}
