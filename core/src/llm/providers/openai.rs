//! OpenAI-compatible chat completions through async-openai
//!
//! Serves both the `openai` and `azure_openai` protocols. The base URL picks the endpoint
//! and configured headers (an Azure `api-key`, a gateway token) go out with every request.

use crate::config::ResolvedLlmConfig;
use crate::error::{ConfigError, LlmError, Result};
use crate::llm::{
    ChatOptions, ContentBlock, FinishReason, LlmClient, LlmMessage, LlmResponse, MessageContent,
    MessageRole, ToolDefinition, Usage,
};
use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessage,
        ChatCompletionRequestAssistantMessageContent, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessage, ChatCompletionRequestToolMessage,
        ChatCompletionRequestToolMessageContent, ChatCompletionRequestUserMessage,
        ChatCompletionTool, ChatCompletionToolType, CreateChatCompletionRequestArgs,
        CreateChatCompletionResponse, FunctionCall, FunctionObject, Stop,
    },
    Client,
};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use std::collections::HashMap;

/// Client for any endpoint that speaks the chat completions wire format
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiClient {
    pub fn new(config: &ResolvedLlmConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(LlmError::Authentication {
                message: format!("No API key found for {}", config.protocol),
            }
            .into());
        }

        let mut openai_config = OpenAIConfig::new().with_api_key(&config.api_key);
        if !config.base_url.is_empty() {
            openai_config = openai_config.with_api_base(config.base_url.trim_end_matches('/'));
        }

        let http_client = reqwest::Client::builder()
            .default_headers(header_map(&config.headers)?)
            .build()
            .map_err(|e| LlmError::Network {
                message: e.to_string(),
            })?;

        Ok(Self {
            client: Client::with_config(openai_config).with_http_client(http_client),
            model: config.model.clone(),
        })
    }
}

/// Configured extra headers as a reqwest header map
fn header_map(headers: &HashMap<String, String>) -> Result<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());

    for (key, value) in headers {
        let invalid = || ConfigError::InvalidValue {
            field: format!("headers.{}", key),
            value: value.clone(),
        };
        let name = HeaderName::from_bytes(key.as_bytes()).map_err(|_| invalid())?;
        let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;
        map.insert(name, header_value);
    }

    Ok(map)
}

fn convert_messages(messages: Vec<LlmMessage>) -> Result<Vec<ChatCompletionRequestMessage>> {
    let mut converted = Vec::with_capacity(messages.len());

    for message in messages {
        match message.role {
            MessageRole::System => {
                converted.push(ChatCompletionRequestMessage::System(
                    ChatCompletionRequestSystemMessage {
                        content: message.get_text().unwrap_or_default().into(),
                        name: None,
                    },
                ));
            }
            MessageRole::User => {
                converted.push(ChatCompletionRequestMessage::User(
                    ChatCompletionRequestUserMessage {
                        content: message.get_text().unwrap_or_default().into(),
                        name: None,
                    },
                ));
            }
            MessageRole::Assistant => {
                let tool_calls: Vec<ChatCompletionMessageToolCall> = message
                    .tool_calls()
                    .into_iter()
                    .map(|call| ChatCompletionMessageToolCall {
                        id: call.id,
                        r#type: ChatCompletionToolType::Function,
                        function: FunctionCall {
                            name: call.name,
                            arguments: call.parameters.to_string(),
                        },
                    })
                    .collect();

                converted.push(ChatCompletionRequestMessage::Assistant(
                    ChatCompletionRequestAssistantMessage {
                        content: message
                            .get_text()
                            .map(ChatCompletionRequestAssistantMessageContent::Text),
                        tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
                        ..Default::default()
                    },
                ));
            }
            MessageRole::Tool => {
                let results = message.tool_results();
                if results.is_empty() {
                    return Err(LlmError::InvalidRequest {
                        message: "Tool message must contain a tool result".to_string(),
                    }
                    .into());
                }

                // The wire format has no error flag; failures are visible in the payload
                for (tool_call_id, _, content) in results {
                    converted.push(ChatCompletionRequestMessage::Tool(
                        ChatCompletionRequestToolMessage {
                            content: ChatCompletionRequestToolMessageContent::Text(
                                content.to_string(),
                            ),
                            tool_call_id: tool_call_id.to_string(),
                        },
                    ));
                }
            }
        }
    }

    Ok(converted)
}

fn convert_tools(tools: Vec<ToolDefinition>) -> Vec<ChatCompletionTool> {
    tools
        .into_iter()
        .map(|tool| ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: tool.function.name,
                description: Some(tool.function.description),
                parameters: Some(tool.function.parameters),
                strict: None,
            },
        })
        .collect()
}

/// A requested call as a tool use block. Unparseable arguments are kept as a string so
/// the dispatcher can reject them.
fn tool_use_block(call: ChatCompletionMessageToolCall) -> ContentBlock {
    let input = serde_json::from_str(&call.function.arguments)
        .unwrap_or(Value::String(call.function.arguments));

    ContentBlock::ToolUse {
        id: call.id,
        name: call.function.name,
        input,
    }
}

fn convert_response(response: CreateChatCompletionResponse) -> Result<LlmResponse> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse {
            message: "No choices in response".to_string(),
        })?;

    let text = choice.message.content;
    let tool_calls = choice.message.tool_calls.unwrap_or_default();
    let content = if tool_calls.is_empty() {
        MessageContent::Text(text.unwrap_or_default())
    } else {
        let text_block = text
            .filter(|text| !text.is_empty())
            .map(|text| ContentBlock::Text { text });
        MessageContent::MultiModal(
            text_block
                .into_iter()
                .chain(tool_calls.into_iter().map(tool_use_block))
                .collect(),
        )
    };

    let finish_reason = choice.finish_reason.map(|reason| match reason {
        async_openai::types::FinishReason::Stop => FinishReason::Stop,
        async_openai::types::FinishReason::Length => FinishReason::Length,
        async_openai::types::FinishReason::ContentFilter => FinishReason::ContentFilter,
        async_openai::types::FinishReason::ToolCalls
        | async_openai::types::FinishReason::FunctionCall => FinishReason::ToolCalls,
    });

    Ok(LlmResponse {
        message: LlmMessage {
            role: MessageRole::Assistant,
            content,
            metadata: None,
        },
        usage: response.usage.map(|usage| Usage {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }),
        model: response.model,
        finish_reason,
        metadata: None,
    })
}

fn request_error(error: OpenAIError) -> LlmError {
    match error {
        OpenAIError::Reqwest(e) => LlmError::Network {
            message: e.to_string(),
        },
        OpenAIError::ApiError(api) => LlmError::InvalidRequest {
            message: api.message,
        },
        other => LlmError::InvalidResponse {
            message: other.to_string(),
        },
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        tools: Option<Vec<ToolDefinition>>,
        options: Option<ChatOptions>,
    ) -> Result<LlmResponse> {
        let mut request = CreateChatCompletionRequestArgs::default();
        request
            .model(&self.model)
            .messages(convert_messages(messages)?);

        if let Some(tools) = tools {
            request.tools(convert_tools(tools));
        }

        if let Some(options) = options {
            if let Some(max_tokens) = options.max_tokens {
                request.max_tokens(max_tokens);
            }
            if let Some(temperature) = options.temperature {
                request.temperature(temperature);
            }
            if let Some(top_p) = options.top_p {
                request.top_p(top_p);
            }
            if let Some(stop) = options.stop {
                request.stop(Stop::StringArray(stop));
            }
        }

        let request = request.build().map_err(|e| LlmError::InvalidRequest {
            message: format!("Failed to build request: {}", e),
        })?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(request_error)?;

        let response = convert_response(response)?;
        tracing::debug!(
            model = %response.model,
            tool_calls = response.message.get_tool_uses().len(),
            "Chat completion received"
        );
        Ok(response)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &str {
        "openai"
    }
}
