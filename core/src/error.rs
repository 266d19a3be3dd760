//! Error types and handling for CalcBot Core

use thiserror::Error;

/// Result type alias for CalcBot operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for CalcBot Core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// LLM client errors
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Dispatch contract violations
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// Arithmetic domain errors
    #[error("Operation error: {0}")]
    Operation(#[from] OperationError),

    /// Agent execution errors
    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for field '{field}': {value}")]
    InvalidValue { field: String, value: String },
}

/// LLM client errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {message}")]
    Network { message: String },
}

/// Dispatch contract violations.
///
/// These are integration errors in the planner, raised before any arithmetic runs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    #[error("Tool not found: {name}")]
    NotFound { name: String },

    #[error("Invalid tool parameters for '{tool}': {message}")]
    InvalidParameters { tool: String, message: String },
}

/// Arithmetic domain errors raised by the operation library
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationError {
    /// The divisor of a division was zero
    #[error("Cannot divide by zero.")]
    DivisionByZero,
}

impl OperationError {
    /// Stable machine-readable identifier used in tool payloads
    pub fn kind(&self) -> &'static str {
        match self {
            OperationError::DivisionByZero => "division_by_zero",
        }
    }
}

/// Agent execution errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Maximum steps exceeded: {max_steps}")]
    MaxStepsExceeded { max_steps: usize },

    #[error("Empty utterance")]
    EmptyUtterance,

    #[error("Unsupported protocol: {protocol}")]
    UnsupportedProtocol { protocol: String },
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Generic(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Generic(msg.to_string())
    }
}
