//! CLI command implementations

pub mod interactive;
pub mod run;
pub mod tools;

pub use interactive::interactive_command;
pub use run::run_command;
pub use tools::tools_command;

use crate::config::CliConfigLoader;
use crate::output::cli_handler::{CliOutputConfig, CliOutputHandler};
use anyhow::{Context, Result};
use calcbot_core::{AgentBuilder, AgentConfig, AgentCore, OutputMode};

/// Agent settings taken from the command line
#[derive(Debug, Clone, Default)]
pub struct AgentOptions {
    /// Maximum planner consultations per turn
    pub max_steps: Option<usize>,
    /// Name the assistant introduces itself with
    pub persona: Option<String>,
    /// Show tool invocations and turn statistics
    pub debug_output: bool,
}

/// Resolve the planner configuration and build the agent
pub async fn build_agent(config_loader: CliConfigLoader, options: &AgentOptions) -> Result<AgentCore> {
    let llm_config = config_loader.load().await?;
    tracing::info!("Using protocol: {}", llm_config.protocol.as_str());
    tracing::info!("Using model: {}", llm_config.model);

    let mut agent_config = AgentConfig::default();
    if let Some(steps) = options.max_steps {
        agent_config.max_steps = steps;
    }
    if let Some(persona) = &options.persona {
        agent_config.persona = persona.clone();
    }
    if options.debug_output {
        agent_config.output_mode = OutputMode::Debug;
    }

    let cli_output = Box::new(CliOutputHandler::new(CliOutputConfig {
        show_tool_calls: options.debug_output,
    }));

    AgentBuilder::new(llm_config)
        .with_agent_config(agent_config)
        .build_with_output(cli_output)
        .await
        .context("Failed to create agent")
}
