//! Output abstraction for agent events
//!
//! Core never prints. It emits [`AgentEvent`]s to an [`AgentOutput`] implementation chosen
//! by the front-end, which decides how (and whether) to display them.

pub mod events;

pub use events::{
    AgentEvent, AgentOutput, MessageLevel, NullOutput, OutputError, TokenUsage, ToolExecutionInfo,
    ToolExecutionStatus, TurnContext,
};
