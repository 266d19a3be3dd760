//! # CalcBot CLI
//!
//! Command-line interface for CalcBot - a conversational calculator agent.
//!
//! ## Usage
//!
//! - `calcbot` - Start the interactive shell
//! - `calcbot "What is 15 apples minus 3 apples?"` - Answer a single utterance
//! - `calcbot tools` - Show available tools

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;
mod output;

use commands::{interactive_command, run_command, tools_command, AgentOptions};
use config::CliConfigLoader;

/// calcbot - A conversational calculator agent
#[derive(Parser)]
#[command(name = "calcbot")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A unit-aware natural-language calculator written in Rust")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file or directory path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Planner protocol (google_ai, openai, anthropic, azure_openai, offline)
    #[arg(long, env = "CALCBOT_PROTOCOL")]
    protocol: Option<String>,

    /// API key override
    #[arg(long)]
    api_key: Option<String>,

    /// Base URL override
    #[arg(long)]
    base_url: Option<String>,

    /// Model name override
    #[arg(long)]
    model: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Show tool invocations and turn statistics
    #[arg(short = 'd', long = "debug")]
    debug_output: bool,

    /// Maximum planner consultations per utterance
    #[arg(long)]
    max_steps: Option<usize>,

    /// Name the assistant introduces itself with
    #[arg(long)]
    persona: Option<String>,

    /// The utterance to answer (if provided, answers it and exits)
    utterance: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show available tools
    Tools,
}

/// Build a configuration loader from CLI arguments
fn build_config_loader(cli: &Cli) -> CliConfigLoader {
    let mut loader = CliConfigLoader::new();

    if let Some(config_path) = &cli.config {
        loader = loader.with_config_override(config_path.clone());
    }

    if let Some(protocol) = &cli.protocol {
        loader = loader.with_protocol_override(protocol.clone());
    }

    if let Some(api_key) = &cli.api_key {
        loader = loader.with_api_key_override(api_key.clone());
    }

    if let Some(base_url) = &cli.base_url {
        loader = loader.with_base_url_override(base_url.clone());
    }

    if let Some(model) = &cli.model {
        loader = loader.with_model_override(model.clone());
    }

    loader
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over the flags; logs go to stderr
    let default_filter = if cli.verbose || cli.debug_output {
        "debug"
    } else {
        "info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config_loader = build_config_loader(&cli);
    let options = AgentOptions {
        max_steps: cli.max_steps,
        persona: cli.persona,
        debug_output: cli.debug_output,
    };

    match (cli.utterance, cli.command) {
        (Some(utterance), None) => run_command(utterance, config_loader, options).await,
        (Some(_), Some(_)) => {
            tracing::error!("Error: Cannot specify both an utterance and a subcommand");
            std::process::exit(1);
        }
        (None, Some(Commands::Tools)) => tools_command().await,
        (None, None) => interactive_command(config_loader, options).await,
    }
}
