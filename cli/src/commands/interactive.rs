//! Interactive shell command

use super::{build_agent, AgentOptions};
use crate::config::CliConfigLoader;
use anyhow::{Context, Result};
use calcbot_core::{Agent, AgentCore};
use colored::Colorize;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, error};

/// Shown before reading each utterance
pub const USER_PROMPT: &str = "\nCalculator User > ";

/// Shown before each answer
pub const AGENT_PROMPT: &str = "\nCalculator Agent > ";

/// Line that ends the session. Only an exact line matches, ignoring case.
pub const QUIT_COMMAND: &str = "quit";

/// Start the interactive shell on stdin/stdout
pub async fn interactive_command(
    config_loader: CliConfigLoader,
    options: AgentOptions,
) -> Result<()> {
    let mut agent = build_agent(config_loader, &options).await?;
    debug!(session_id = agent.session().id(), "Interactive session started");

    let stdin = BufReader::new(tokio::io::stdin());
    run_shell(&mut agent, stdin).await?;

    debug!(turns = agent.session().len(), "Interactive session ended");
    Ok(())
}

/// Read utterances until `quit` or end of input, answering each one.
///
/// A failed turn is reported and the shell keeps going.
pub async fn run_shell<R>(agent: &mut AgentCore, input: R) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();

    loop {
        print!("{}", USER_PROMPT);
        std::io::stdout().flush().context("Failed to write prompt")?;

        let Some(line) = lines
            .next_line()
            .await
            .context("Failed to read from stdin")?
        else {
            println!();
            break;
        };

        if line.eq_ignore_ascii_case(QUIT_COMMAND) {
            break;
        }
        let utterance = line.trim();
        if utterance.is_empty() {
            continue;
        }

        match agent.execute_turn(utterance).await {
            Ok(execution) => println!("{}{}", AGENT_PROMPT, execution.final_result),
            Err(e) => {
                error!("Turn failed: {}", e);
                println!("{}{}", AGENT_PROMPT, format!("Error: {}", e).red());
            }
        }
    }

    Ok(())
}
