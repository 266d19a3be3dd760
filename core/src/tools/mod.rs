//! Tool system: the dispatch contract between planners and the operation library

pub mod base;
pub mod builtin;
pub mod registry;

pub use base::{Tool, ToolCall, ToolExample, ToolExecutor, ToolResult};
pub use registry::{ToolFactory, ToolRegistry};
