//! Minimal configuration types for CalcBot core
//!
//! Core only accepts fully resolved, validated configuration.
//! All discovery, loading, and merging happens in CLI layer.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Supported planner protocols
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    /// OpenAI-compatible API (includes OpenAI, many proxies, local models)
    #[serde(rename = "openai")]
    OpenAICompat,
    /// Anthropic Claude API
    #[serde(rename = "anthropic")]
    Anthropic,
    /// Google AI API (Gemini)
    #[serde(rename = "google_ai")]
    GoogleAI,
    /// Azure OpenAI API
    #[serde(rename = "azure_openai")]
    AzureOpenAI,
    /// Deterministic rule-based planner running in-process
    #[serde(rename = "offline")]
    Offline,
    /// Custom protocol
    #[serde(rename = "custom")]
    Custom(String),
}

impl Protocol {
    /// Get the protocol name as a string
    pub fn as_str(&self) -> &str {
        match self {
            Protocol::OpenAICompat => "openai",
            Protocol::Anthropic => "anthropic",
            Protocol::GoogleAI => "google_ai",
            Protocol::AzureOpenAI => "azure_openai",
            Protocol::Offline => "offline",
            Protocol::Custom(name) => name,
        }
    }

    /// Get the default base URL for this protocol
    pub fn default_base_url(&self) -> Option<&'static str> {
        match self {
            Protocol::OpenAICompat => Some("https://api.openai.com/v1"),
            Protocol::Anthropic => Some("https://api.anthropic.com"),
            Protocol::GoogleAI => Some("https://generativelanguage.googleapis.com/v1beta"),
            Protocol::AzureOpenAI => None, // Requires custom endpoint
            Protocol::Offline => None,
            Protocol::Custom(_) => None,
        }
    }

    /// Get the default model for this protocol
    pub fn default_model(&self) -> &'static str {
        match self {
            Protocol::OpenAICompat => "gpt-4o",
            Protocol::Anthropic => "claude-3-5-sonnet-20241022",
            Protocol::GoogleAI => "gemini-2.5-flash",
            Protocol::AzureOpenAI => "gpt-4o",
            Protocol::Offline => "calcbot-rules",
            Protocol::Custom(_) => "default",
        }
    }

    /// Whether the protocol talks to a remote service
    pub fn is_remote(&self) -> bool {
        !matches!(self, Protocol::Offline)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "openai" | "openai_compat" => Protocol::OpenAICompat,
            "anthropic" => Protocol::Anthropic,
            "google_ai" | "google" | "gemini" => Protocol::GoogleAI,
            "azure_openai" | "azure" => Protocol::AzureOpenAI,
            "offline" | "local" => Protocol::Offline,
            _ => Protocol::Custom(s.to_string()),
        })
    }
}

/// Model parameters for LLM requests
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelParams {
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Temperature for sampling (0.0 to 2.0)
    pub temperature: Option<f32>,
    /// Top-p sampling parameter
    pub top_p: Option<f32>,
    /// Top-k sampling parameter (for compatible models)
    pub top_k: Option<u32>,
    /// Stop sequences
    pub stop_sequences: Option<Vec<String>>,
}

/// A fully resolved LLM configuration ready for use by core
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedLlmConfig {
    /// The protocol to use
    pub protocol: Protocol,
    /// Base URL for the API
    pub base_url: String,
    /// API key for authentication
    pub api_key: String,
    /// Model name/identifier
    pub model: String,
    /// Model parameters
    #[serde(default)]
    pub params: ModelParams,
    /// Additional headers for requests
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl ResolvedLlmConfig {
    /// Create a new resolved LLM config
    pub fn new(protocol: Protocol, base_url: String, api_key: String, model: String) -> Self {
        Self {
            protocol,
            base_url,
            api_key,
            model,
            params: ModelParams::default(),
            headers: HashMap::new(),
        }
    }

    /// Configuration for the in-process rule-based planner
    pub fn offline() -> Self {
        Self::new(
            Protocol::Offline,
            String::new(),
            String::new(),
            Protocol::Offline.default_model().to_string(),
        )
    }

    /// Set model parameters
    pub fn with_params(mut self, params: ModelParams) -> Self {
        self.params = params;
        self
    }

    /// Add a header
    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.headers.insert(key, value);
        self
    }

    /// Add multiple headers
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.is_empty() {
            return Err(ConfigError::MissingField {
                field: "model".to_string(),
            });
        }

        if self.protocol.is_remote() {
            if self.api_key.is_empty() {
                return Err(ConfigError::MissingField {
                    field: "api_key".to_string(),
                });
            }

            if self.base_url.is_empty() {
                return Err(ConfigError::MissingField {
                    field: "base_url".to_string(),
                });
            }

            if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
                return Err(ConfigError::InvalidValue {
                    field: "base_url".to_string(),
                    value: self.base_url.clone(),
                });
            }
        }

        if let Some(temp) = self.params.temperature {
            if !(0.0..=2.0).contains(&temp) {
                return Err(ConfigError::InvalidValue {
                    field: "params.temperature".to_string(),
                    value: temp.to_string(),
                });
            }
        }

        if let Some(top_p) = self.params.top_p {
            if !(0.0..=1.0).contains(&top_p) {
                return Err(ConfigError::InvalidValue {
                    field: "params.top_p".to_string(),
                    value: top_p.to_string(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn openai() -> ResolvedLlmConfig {
        ResolvedLlmConfig::new(
            Protocol::OpenAICompat,
            "https://api.openai.com/v1".to_string(),
            "test-key".to_string(),
            "gpt-4o".to_string(),
        )
    }

    #[test]
    fn test_valid_remote_config() {
        assert!(openai().validate().is_ok());
    }

    #[test]
    fn test_offline_needs_no_key() {
        let config = ResolvedLlmConfig::offline();
        assert!(config.validate().is_ok());
        assert!(!config.protocol.is_remote());
    }

    #[test]
    fn test_remote_requires_key_and_url() {
        let mut config = openai();
        config.api_key.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField { field }) if field == "api_key"
        ));

        let mut config = openai();
        config.base_url = "ftp://example.com".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "base_url"
        ));
    }

    #[test]
    fn test_param_ranges() {
        let config = openai().with_params(ModelParams {
            temperature: Some(2.5),
            ..Default::default()
        });
        assert!(config.validate().is_err());

        let config = openai().with_params(ModelParams {
            top_p: Some(1.5),
            ..Default::default()
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_protocol_parsing() {
        assert_eq!("gemini".parse::<Protocol>(), Ok(Protocol::GoogleAI));
        assert_eq!("OpenAI".parse::<Protocol>(), Ok(Protocol::OpenAICompat));
        assert_eq!("offline".parse::<Protocol>(), Ok(Protocol::Offline));
        assert_eq!(
            "mystery".parse::<Protocol>(),
            Ok(Protocol::Custom("mystery".to_string()))
        );
        assert_eq!(Protocol::GoogleAI.default_model(), "gemini-2.5-flash");
    }

    #[test]
    fn test_protocol_serde_names() {
        let json = serde_json::to_string(&Protocol::GoogleAI).unwrap();
        assert_eq!(json, "\"google_ai\"");
        let parsed: Protocol = serde_json::from_str("\"offline\"").unwrap();
        assert_eq!(parsed, Protocol::Offline);
    }
}
