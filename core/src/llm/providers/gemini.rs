//! Google Gemini client implementation

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
use uuid::Uuid;

/// Gemini client speaking the `generateContent` REST API
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    headers: HashMap<String, String>,
}

impl GeminiClient {
    pub fn new(config: &ResolvedLlmConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(LlmError::Authentication {
                message: "No API key found for Google AI".to_string(),
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

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn translate_request(
        messages: Vec<LlmMessage>,
        tools: Option<Vec<ToolDefinition>>,
        options: Option<ChatOptions>,
    ) -> GeminiRequest {
        let options = options.unwrap_or_default();
        let mut system_instruction = None;
        let mut contents: Vec<GeminiContent> = Vec::new();
        // Function responses are matched by name, not by call id
        let mut call_names: HashMap<String, String> = HashMap::new();

        for message in messages {
            let role = match message.role {
                MessageRole::System => {
                    system_instruction = message.get_text().map(|text| GeminiContent {
                        role: None,
                        parts: vec![GeminiPart::Text { text }],
                    });
                    continue;
                }
                MessageRole::Assistant => "model",
                MessageRole::User | MessageRole::Tool => "user",
            };

            let parts: Vec<GeminiPart> = match message.content {
                MessageContent::Text(text) => vec![GeminiPart::Text { text }],
                MessageContent::MultiModal(blocks) => blocks
                    .into_iter()
                    .map(|block| match block {
                        ContentBlock::Text { text } => GeminiPart::Text { text },
                        ContentBlock::ToolUse { id, name, input } => {
                            call_names.insert(id, name.clone());
                            GeminiPart::FunctionCall {
                                function_call: GeminiFunctionCall { name, args: input },
                            }
                        }
                        ContentBlock::ToolResult {
                            tool_use_id,
                            content,
                            ..
                        } => GeminiPart::FunctionResponse {
                            function_response: GeminiFunctionResponse {
                                name: call_names
                                    .get(&tool_use_id)
                                    .cloned()
                                    .unwrap_or(tool_use_id),
                                response: function_response_body(&content),
                            },
                        },
                    })
                    .collect(),
            };

            if parts.is_empty() {
                continue;
            }

            match contents.last_mut() {
                Some(last) if last.role.as_deref() == Some(role) => last.parts.extend(parts),
                _ => contents.push(GeminiContent {
                    role: Some(role.to_string()),
                    parts,
                }),
            }
        }

        let tools = tools.filter(|tools| !tools.is_empty()).map(|tools| {
            vec![GeminiTool {
                function_declarations: tools
                    .into_iter()
                    .map(|tool| GeminiFunctionDeclaration {
                        name: tool.function.name,
                        description: tool.function.description,
                        parameters: tool.function.parameters,
                    })
                    .collect(),
            }]
        });

        GeminiRequest {
            contents,
            system_instruction,
            tools,
            generation_config: Some(GeminiGenerationConfig {
                max_output_tokens: options.max_tokens,
                temperature: options.temperature,
                top_p: options.top_p,
                top_k: options.top_k,
                stop_sequences: options.stop,
            }),
        }
    }

    fn normalize_response(&self, response: GeminiResponse) -> Result<LlmResponse> {
        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse {
                message: "No candidates in response".to_string(),
            })?;

        let mut blocks = Vec::new();
        for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
            match part {
                GeminiPart::Text { text } if !text.is_empty() => {
                    blocks.push(ContentBlock::Text { text })
                }
                GeminiPart::FunctionCall { function_call } => blocks.push(ContentBlock::ToolUse {
                    // Gemini does not issue call ids
                    id: format!("call_{}", Uuid::new_v4().simple()),
                    name: function_call.name,
                    input: function_call.args,
                }),
                _ => {}
            }
        }

        let has_tool_use = blocks
            .iter()
            .any(|block| matches!(block, ContentBlock::ToolUse { .. }));
        let content = match blocks.as_slice() {
            [ContentBlock::Text { text }] => MessageContent::Text(text.clone()),
            _ => MessageContent::MultiModal(blocks),
        };

        let finish_reason = if has_tool_use {
            Some(FinishReason::ToolCalls)
        } else {
            candidate.finish_reason.map(|reason| match reason.as_str() {
                "STOP" => FinishReason::Stop,
                "MAX_TOKENS" => FinishReason::Length,
                "SAFETY" | "RECITATION" => FinishReason::ContentFilter,
                _ => FinishReason::Other(reason),
            })
        };

        let usage = response.usage_metadata.map(|u| Usage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        });

        Ok(LlmResponse {
            message: LlmMessage {
                role: MessageRole::Assistant,
                content,
                metadata: None,
            },
            usage,
            model: self.model.clone(),
            finish_reason,
            metadata: None,
        })
    }
}

/// Tool payloads are JSON objects already; anything else is wrapped
fn function_response_body(content: &str) -> serde_json::Value {
    match serde_json::from_str::<serde_json::Value>(content) {
        Ok(value @ serde_json::Value::Object(_)) => value,
        _ => serde_json::json!({ "result": content }),
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        tools: Option<Vec<ToolDefinition>>,
        options: Option<ChatOptions>,
    ) -> Result<LlmResponse> {
        let request = Self::translate_request(messages, tools, options);

        let mut builder = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .header("Content-Type", "application/json");
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

        let status = response.status();
        let body = response.text().await.map_err(|e| LlmError::Network {
            message: format!("Failed to read response: {}", e),
        })?;

        if !status.is_success() {
            let message = serde_json::from_str::<GeminiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(match status.as_u16() {
                400 => LlmError::InvalidRequest { message },
                401 | 403 => LlmError::Authentication { message },
                429 => LlmError::RateLimit,
                status => LlmError::ApiError { status, message },
            }
            .into());
        }

        let gemini_response: GeminiResponse =
            serde_json::from_str(&body).map_err(|e| LlmError::InvalidResponse {
                message: format!("Failed to parse response: {}", e),
            })?;

        self.normalize_response(gemini_response)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &str {
        "google_ai"
    }
}

// Gemini API types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GeminiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    FunctionCall {
        #[serde(rename = "functionCall")]
        function_call: GeminiFunctionCall,
    },
    FunctionResponse {
        #[serde(rename = "functionResponse")]
        function_response: GeminiFunctionResponse,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiFunctionCall {
    name: String,
    #[serde(default)]
    args: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiFunctionResponse {
    name: String,
    response: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    function_declarations: Vec<GeminiFunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct GeminiFunctionDeclaration {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Protocol;
    use crate::llm::FunctionDefinition;
    use crate::tools::ToolCall;
    use serde_json::json;

    fn client() -> GeminiClient {
        GeminiClient::new(&ResolvedLlmConfig::new(
            Protocol::GoogleAI,
            Protocol::GoogleAI
                .default_base_url()
                .unwrap_or_default()
                .to_string(),
            "test-key".to_string(),
            "gemini-2.5-flash".to_string(),
        ))
        .expect("valid config")
    }

    #[test]
    fn test_endpoint() {
        assert_eq!(
            client().endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_function_responses_are_named_after_their_calls() {
        let calls = vec![
            ToolCall::new("subtract", json!({ "firstNumber": 15, "secondNumber": 3 }))
                .with_id("x1"),
        ];
        let messages = vec![
            LlmMessage::system("You are CalcBot."),
            LlmMessage::user("What is 15 apples minus 3 apples?"),
            LlmMessage::tool_uses(calls),
            LlmMessage::tool_result("x1", r#"{"result":12.0,"unit":"apple"}"#, false),
        ];
        let tools = vec![ToolDefinition {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: "subtract".to_string(),
                description: "Subtracts the second number from the first.".to_string(),
                parameters: json!({ "type": "object" }),
            },
        }];

        let request = GeminiClient::translate_request(messages, Some(tools), None);
        let body = serde_json::to_value(&request).expect("serializable");

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "You are CalcBot.");
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["contents"][1]["parts"][0]["functionCall"]["name"], "subtract");
        assert_eq!(body["contents"][2]["parts"][0]["functionResponse"]["name"], "subtract");
        assert_eq!(
            body["contents"][2]["parts"][0]["functionResponse"]["response"]["result"],
            12.0
        );
        assert_eq!(
            body["tools"][0]["functionDeclarations"][0]["name"],
            "subtract"
        );
        assert_eq!(body["generationConfig"]["temperature"], 0.0);
    }

    #[test]
    fn test_normalize_function_calls() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        { "functionCall": { "name": "add", "args": { "firstNumber": 2, "secondNumber": 2 } } },
                        { "functionCall": { "name": "multiply", "args": { "firstNumber": 1, "secondNumber": 3 } } }
                    ]
                },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "promptTokenCount": 3, "candidatesTokenCount": 4, "totalTokenCount": 7 }
        }))
        .expect("valid response");

        let converted = client().normalize_response(response).expect("normalizable");
        let calls = converted.message.tool_calls();
        assert_eq!(calls.len(), 2);
        assert_ne!(calls[0].id, calls[1].id);
        assert_eq!(calls[1].name, "multiply");
        assert_eq!(converted.finish_reason, Some(FinishReason::ToolCalls));
    }

    #[test]
    fn test_non_json_tool_content_is_wrapped() {
        assert_eq!(function_response_body("Error: boom"), json!({ "result": "Error: boom" }));
        assert_eq!(function_response_body(r#"{"result":2.0}"#), json!({ "result": 2.0 }));
    }
}
