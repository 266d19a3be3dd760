//! Anthropic Claude client implementation

use crate::config::ResolvedLlmConfig;
use crate::error::{LlmError, Result};
use crate::llm::{
    ChatOptions, ContentBlock, FinishReason, LlmClient, LlmMessage, LlmResponse, MessageContent,
    MessageRole, ToolDefinition, Usage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Claude client
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    headers: HashMap<String, String>,
}

impl AnthropicClient {
    /// Create a new Anthropic client
    pub fn new(config: &ResolvedLlmConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(LlmError::Authentication {
                message: "No API key found for Anthropic".to_string(),
            }
            .into());
        }

        Ok(Self {
            client: Client::new(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            headers: config.headers.clone(),
        })
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        tools: Option<Vec<ToolDefinition>>,
        options: Option<ChatOptions>,
    ) -> Result<LlmResponse> {
        let request = self.build_request(messages, tools, options);

        let mut builder = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json");
        for (key, value) in &self.headers {
            builder = builder.header(key, value);
        }

        let response = builder
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Network {
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            return Err(match status {
                401 | 403 => LlmError::Authentication {
                    message: error_text,
                },
                429 => LlmError::RateLimit,
                _ => LlmError::ApiError {
                    status,
                    message: error_text,
                },
            }
            .into());
        }

        let anthropic_response: AnthropicResponse =
            response
                .json()
                .await
                .map_err(|e| LlmError::InvalidResponse {
                    message: format!("Failed to parse response: {}", e),
                })?;

        Ok(Self::convert_response(anthropic_response))
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &str {
        "anthropic"
    }
}

impl AnthropicClient {
    fn build_request(
        &self,
        messages: Vec<LlmMessage>,
        tools: Option<Vec<ToolDefinition>>,
        options: Option<ChatOptions>,
    ) -> AnthropicRequest {
        let options = options.unwrap_or_default();

        let mut system_message = None;
        let mut conversation: Vec<AnthropicMessage> = Vec::new();

        for message in messages {
            let (role, blocks) = match message.role {
                MessageRole::System => {
                    system_message = message.get_text();
                    continue;
                }
                // Tool results travel as user content on this API
                MessageRole::User | MessageRole::Tool => ("user", Self::convert_content(message.content)),
                MessageRole::Assistant => ("assistant", Self::convert_content(message.content)),
            };

            // Consecutive messages of one role are merged; the API requires alternation
            match conversation.last_mut() {
                Some(last) if last.role == role => last.content.extend(blocks),
                _ => conversation.push(AnthropicMessage {
                    role,
                    content: blocks,
                }),
            }
        }

        AnthropicRequest {
            model: self.model.clone(),
            max_tokens: options.max_tokens.unwrap_or(4096),
            temperature: options.temperature,
            top_p: options.top_p,
            top_k: options.top_k,
            system: system_message,
            messages: conversation,
            tools: tools.map(|tools| {
                tools
                    .into_iter()
                    .map(|tool| AnthropicTool {
                        name: tool.function.name,
                        description: tool.function.description,
                        input_schema: tool.function.parameters,
                    })
                    .collect()
            }),
            stop_sequences: options.stop,
        }
    }

    fn convert_content(content: MessageContent) -> Vec<AnthropicBlock> {
        match content {
            MessageContent::Text(text) => vec![AnthropicBlock::Text { text }],
            MessageContent::MultiModal(blocks) => blocks
                .into_iter()
                .map(|block| match block {
                    ContentBlock::Text { text } => AnthropicBlock::Text { text },
                    ContentBlock::ToolUse { id, name, input } => {
                        AnthropicBlock::ToolUse { id, name, input }
                    }
                    ContentBlock::ToolResult {
                        tool_use_id,
                        is_error,
                        content,
                    } => AnthropicBlock::ToolResult {
                        tool_use_id,
                        content,
                        is_error: is_error.unwrap_or(false),
                    },
                })
                .collect(),
        }
    }

    fn convert_response(response: AnthropicResponse) -> LlmResponse {
        let blocks: Vec<ContentBlock> = response
            .content
            .into_iter()
            .filter_map(|block| match block {
                AnthropicResponseBlock::Text { text } => Some(ContentBlock::Text { text }),
                AnthropicResponseBlock::ToolUse { id, name, input } => {
                    Some(ContentBlock::ToolUse { id, name, input })
                }
                AnthropicResponseBlock::Other => None,
            })
            .collect();

        let has_tool_use = blocks
            .iter()
            .any(|block| matches!(block, ContentBlock::ToolUse { .. }));
        let content = match blocks.as_slice() {
            [ContentBlock::Text { text }] if !has_tool_use => MessageContent::Text(text.clone()),
            _ => MessageContent::MultiModal(blocks),
        };

        let usage = response.usage.map(|u| Usage {
            prompt_tokens: u.input_tokens,
            completion_tokens: u.output_tokens,
            total_tokens: u.input_tokens + u.output_tokens,
        });

        let finish_reason = response.stop_reason.map(|reason| match reason.as_str() {
            "end_turn" | "stop_sequence" => FinishReason::Stop,
            "max_tokens" => FinishReason::Length,
            "tool_use" => FinishReason::ToolCalls,
            _ => FinishReason::Other(reason),
        });

        LlmResponse {
            message: LlmMessage {
                role: MessageRole::Assistant,
                content,
                metadata: None,
            },
            usage,
            model: response.model,
            finish_reason,
            metadata: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<AnthropicTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: Vec<AnthropicBlock>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        is_error: bool,
    },
}

#[derive(Debug, Serialize)]
struct AnthropicTool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    model: String,
    content: Vec<AnthropicResponseBlock>,
    stop_reason: Option<String>,
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicResponseBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}
