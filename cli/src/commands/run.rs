//! Single utterance command

use super::{build_agent, AgentOptions};
use crate::config::CliConfigLoader;
use anyhow::Result;
use calcbot_core::Agent;
use tracing::debug;

/// Answer one utterance and exit
pub async fn run_command(
    utterance: String,
    config_loader: CliConfigLoader,
    options: AgentOptions,
) -> Result<()> {
    debug!("Answering single utterance: {}", utterance);

    let mut agent = build_agent(config_loader, &options).await?;
    let execution = agent.execute_turn(&utterance).await?;

    println!("{}", execution.final_result);
    debug!(
        steps = execution.steps_executed,
        tool_calls = execution.tool_calls,
        duration_ms = execution.duration_ms,
        "Utterance answered"
    );

    Ok(())
}
