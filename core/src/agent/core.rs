//! AgentCore implementation

use super::config::AgentConfig;
use crate::agent::prompt::{build_system_prompt, build_user_message, CALCBOT_SYSTEM_PROMPT};
use crate::agent::{Agent, AgentExecution, AgentResult};
use crate::config::{Protocol, ResolvedLlmConfig};
use crate::error::{AgentError, Result};
use crate::llm::{ChatOptions, LlmClient, LlmMessage};
use crate::output::{
    AgentEvent, AgentOutput, NullOutput, TokenUsage, ToolExecutionInfo, ToolExecutionStatus,
    TurnContext,
};
use crate::policy::{RulePlanner, OPERATION_FAILED_RESPONSE};
use crate::session::Session;
use crate::tools::{ToolCall, ToolExecutor, ToolRegistry, ToolResult};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// `kind` reported to the planner when a tool call broke the dispatch contract
pub const CONTRACT_VIOLATION_KIND: &str = "contract_violation";

/// The calculator agent: drives a planner and dispatches its tool calls
pub struct AgentCore {
    config: AgentConfig,
    llm_client: Arc<dyn LlmClient>,
    tool_executor: ToolExecutor,
    chat_options: ChatOptions,
    conversation_history: Vec<LlmMessage>,
    session: Session,
    output: Box<dyn AgentOutput>,
}

/// Create the planner client for a resolved configuration
pub fn create_llm_client(
    llm_config: &ResolvedLlmConfig,
    agent_config: &AgentConfig,
) -> Result<Arc<dyn LlmClient>> {
    llm_config.validate()?;

    let client: Arc<dyn LlmClient> = match &llm_config.protocol {
        Protocol::OpenAICompat => Arc::new(crate::llm::OpenAiClient::new(llm_config)?),
        Protocol::Anthropic => Arc::new(crate::llm::AnthropicClient::new(llm_config)?),
        Protocol::GoogleAI => Arc::new(crate::llm::GeminiClient::new(llm_config)?),
        // Azure OpenAI deployments speak the OpenAI wire format
        Protocol::AzureOpenAI => Arc::new(crate::llm::OpenAiClient::new(llm_config)?),
        Protocol::Offline => Arc::new(RulePlanner::new(agent_config.persona.clone())),
        Protocol::Custom(name) => {
            return Err(AgentError::UnsupportedProtocol {
                protocol: name.clone(),
            }
            .into())
        }
    };

    tracing::debug!(
        provider = client.provider_name(),
        model = client.model_name(),
        "Created planner client"
    );
    Ok(client)
}

impl AgentCore {
    /// Create a new AgentCore with resolved LLM configuration
    pub async fn new_with_llm_config(
        agent_config: AgentConfig,
        llm_config: ResolvedLlmConfig,
        output: Box<dyn AgentOutput>,
    ) -> Result<Self> {
        let llm_client = create_llm_client(&llm_config, &agent_config)?;
        let chat_options = ChatOptions::from(&llm_config.params);

        Ok(Self::new_with_client(agent_config, llm_client, output).with_chat_options(chat_options))
    }

    /// Create a new AgentCore with default null output (for testing)
    pub async fn new(agent_config: AgentConfig, llm_config: ResolvedLlmConfig) -> Result<Self> {
        Self::new_with_llm_config(agent_config, llm_config, Box::new(NullOutput)).await
    }

    /// Create an AgentCore around an existing planner client
    pub fn new_with_client(
        agent_config: AgentConfig,
        llm_client: Arc<dyn LlmClient>,
        output: Box<dyn AgentOutput>,
    ) -> Self {
        let tool_executor = ToolRegistry::default().create_executor(&agent_config.tools);

        Self {
            config: agent_config,
            llm_client,
            tool_executor,
            chat_options: ChatOptions::default(),
            conversation_history: Vec::new(),
            session: Session::new(),
            output,
        }
    }

    /// Override the sampling options sent with every request
    pub fn with_chat_options(mut self, chat_options: ChatOptions) -> Self {
        self.chat_options = chat_options;
        self
    }

    /// Get agent configuration
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// The planner in use
    pub fn llm_client(&self) -> &Arc<dyn LlmClient> {
        &self.llm_client
    }

    /// Messages exchanged so far, system prompt included
    pub fn conversation_history(&self) -> &[LlmMessage] {
        &self.conversation_history
    }

    /// Get the system prompt for the agent
    fn get_system_prompt(&self) -> Result<String> {
        let template = self
            .config
            .system_prompt
            .as_deref()
            .unwrap_or(CALCBOT_SYSTEM_PROMPT);

        build_system_prompt(
            template,
            &self.config.persona,
            &self.tool_executor.get_tool_definitions(),
        )
    }

    async fn emit(&self, event: AgentEvent) {
        if let Err(e) = self.output.emit_event(event).await {
            tracing::debug!("Failed to emit agent event: {}", e);
        }
    }

    /// Dispatch one batch of tool calls and append their results to the conversation.
    ///
    /// Returns the number of calls dispatched.
    async fn execute_tool_calls(&mut self, calls: Vec<ToolCall>) -> usize {
        for call in &calls {
            let tool_info = ToolExecutionInfo::create_tool_execution_info(
                call,
                ToolExecutionStatus::Executing,
                None,
            );
            self.emit(AgentEvent::ToolExecutionStarted { tool_info }).await;
        }

        let results = self.tool_executor.execute_batch(calls.clone()).await;

        for (call, result) in calls.iter().zip(results) {
            let tool_result = match result {
                Ok(result) => result,
                // Contract violations are planner bugs; the planner still gets to see them
                Err(e) => ToolResult::error(call.id.clone(), e.to_string()).with_data(json!({
                    "error": e.to_string(),
                    "kind": CONTRACT_VIOLATION_KIND,
                })),
            };

            let status = if tool_result.success {
                ToolExecutionStatus::Success
            } else {
                ToolExecutionStatus::Error
            };
            let tool_info =
                ToolExecutionInfo::create_tool_execution_info(call, status, Some(&tool_result));
            self.emit(AgentEvent::ToolExecutionCompleted { tool_info }).await;

            self.conversation_history.push(LlmMessage::tool_result(
                call.id.clone(),
                tool_result.payload(),
                !tool_result.success,
            ));
        }

        calls.len()
    }

    /// Run the planner loop for the utterance that was just appended
    async fn run_turn(&mut self, context: &mut TurnContext) -> Result<(String, usize)> {
        let tool_definitions = self.tool_executor.get_tool_definitions();
        let mut tool_calls = 0;

        for step in 1..=self.config.max_steps {
            context.current_step = step;
            self.emit(AgentEvent::PlanningStep { step_number: step })
                .await;

            let response = match self
                .llm_client
                .chat_completion(
                    self.conversation_history.clone(),
                    Some(tool_definitions.clone()),
                    Some(self.chat_options.clone()),
                )
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!("Planner request failed at step {}: {}", step, e);
                    return Err(e);
                }
            };

            if let Some(usage) = &response.usage {
                context.token_usage.input_tokens += usage.prompt_tokens;
                context.token_usage.output_tokens += usage.completion_tokens;
                context.token_usage.total_tokens += usage.total_tokens;
                if let Err(e) = self
                    .output
                    .emit_token_update(context.token_usage.clone())
                    .await
                {
                    tracing::debug!("Failed to emit token update: {}", e);
                }
            }

            self.conversation_history.push(response.message.clone());

            if response.message.has_tool_use() {
                let calls = response.message.tool_calls();
                tracing::debug!(step, count = calls.len(), "Dispatching tool calls");
                tool_calls += self.execute_tool_calls(calls).await;
                continue;
            }

            let answer = response
                .message
                .get_text()
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty())
                .unwrap_or_else(|| {
                    tracing::warn!("Planner returned an empty answer");
                    OPERATION_FAILED_RESPONSE.to_string()
                });
            return Ok((answer, tool_calls));
        }

        Err(AgentError::MaxStepsExceeded {
            max_steps: self.config.max_steps,
        }
        .into())
    }
}

#[async_trait]
impl Agent for AgentCore {
    async fn execute_turn(&mut self, utterance: &str) -> AgentResult<AgentExecution> {
        let start_time = Instant::now();
        let request = build_user_message(utterance);
        if request.is_empty() {
            return Err(AgentError::EmptyUtterance.into());
        }

        // A failed turn leaves the conversation as it was before it
        let history_mark = self.conversation_history.len();
        if self.conversation_history.is_empty() {
            self.conversation_history
                .push(LlmMessage::system(self.get_system_prompt()?));
        }
        self.conversation_history.push(LlmMessage::user(&request));

        let mut context = TurnContext {
            session_id: self.session.id().to_string(),
            turn_index: self.session.len(),
            utterance: request.clone(),
            current_step: 0,
            execution_time: std::time::Duration::ZERO,
            token_usage: TokenUsage::default(),
        };
        self.emit(AgentEvent::TurnStarted {
            context: context.clone(),
        })
        .await;

        let outcome = self.run_turn(&mut context).await;
        context.execution_time = start_time.elapsed();

        match outcome {
            Ok((answer, tool_calls)) => {
                self.session.record_turn(request, answer.clone());
                self.emit(AgentEvent::TurnCompleted {
                    context: context.clone(),
                    success: true,
                    response: answer.clone(),
                })
                .await;

                let metadata = HashMap::from([
                    ("session_id".to_string(), json!(context.session_id)),
                    ("provider".to_string(), json!(self.llm_client.provider_name())),
                    ("model".to_string(), json!(self.llm_client.model_name())),
                ]);
                Ok(AgentExecution::success(
                    answer,
                    context.current_step,
                    context.execution_time.as_millis() as u64,
                )
                .with_tool_calls(tool_calls)
                .with_metadata(metadata))
            }
            Err(e) => {
                self.conversation_history.truncate(history_mark);
                self.emit(AgentEvent::TurnCompleted {
                    context,
                    success: false,
                    response: e.to_string(),
                })
                .await;
                Err(e)
            }
        }
    }

    fn config(&self) -> &AgentConfig {
        &self.config
    }

    fn agent_type(&self) -> &str {
        crate::session::APP_NAME
    }

    fn session(&self) -> &Session {
        &self.session
    }
}
