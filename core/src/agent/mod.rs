//! Agent core logic and execution engine

pub mod base;
pub mod config;
pub mod core;
pub mod execution;
pub mod prompt;

pub use base::{Agent, AgentResult};
pub use config::{AgentBuilder, AgentConfig, OutputMode};
pub use core::{create_llm_client, AgentCore, CONTRACT_VIOLATION_KIND};
pub use execution::AgentExecution;
pub use prompt::{build_system_prompt, build_user_message, CALCBOT_SYSTEM_PROMPT};
