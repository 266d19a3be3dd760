//! Remote planner providers

pub mod anthropic;
pub mod gemini;
pub mod openai;

pub use anthropic::AnthropicClient;
pub use gemini::GeminiClient;
pub use openai::OpenAiClient;
