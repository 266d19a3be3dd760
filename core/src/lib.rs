//! # CalcBot Core
//!
//! Core library for CalcBot - a conversational calculator agent.
//!
//! The agent turns natural-language arithmetic requests into calls against a small
//! operation library (`add`, `subtract`, `multiply`, `divide`) and phrases the results
//! back to the user. Planning is delegated to an [`llm::LlmClient`]: either a remote
//! model or the in-process [`policy::RulePlanner`].

// Core modules
pub mod agent;
pub mod config;
pub mod error;
pub mod llm;
pub mod operations;
pub mod output;
pub mod policy;
pub mod session;
pub mod tools;

// Re-export commonly used types
pub use agent::{Agent, AgentBuilder, AgentConfig, AgentCore, AgentExecution, OutputMode};
pub use config::{ModelParams, Protocol, ResolvedLlmConfig};
pub use error::{Error, Result};
pub use operations::Operation;
pub use policy::RulePlanner;
pub use session::Session;

/// Current version of the calcbot-core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for the library
///
/// Logs go to stderr so they never interleave with the conversation on stdout.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize tracing with a specific debug mode
pub fn init_tracing_with_debug(debug: bool) {
    let filter = if debug { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();
}
