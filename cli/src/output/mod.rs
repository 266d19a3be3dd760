//! CLI-specific output implementations
//!
//! Concrete implementations of the core output abstraction for the terminal.

pub mod cli_handler;
