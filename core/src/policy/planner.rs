//! Deterministic in-process planner
//!
//! [`RulePlanner`] implements [`LlmClient`] so the agent loop drives it exactly like a
//! hosted model. It keeps no state of its own: on every call it re-reads the latest user
//! message, rebuilds the evaluation plan, replays the tool results that followed it, and
//! either requests the next batch of operations or writes the final answer.

use super::plan::{interpret, CalculationPlan, Intent};
use super::render::compose_answer;
use super::{
    greeting_response, CAPABILITIES_RESPONSE, DEFAULT_PERSONA, DIVISION_BY_ZERO_RESPONSE,
    INCOMPLETE_RESPONSE, MIXED_UNITS_RESPONSE, OPERATION_FAILED_RESPONSE, SCOPE_RESPONSE,
};
use crate::config::Protocol;
use crate::error::{LlmError, OperationError, Result};
use crate::llm::{
    ChatOptions, FinishReason, LlmClient, LlmMessage, LlmResponse, MessageRole, ToolDefinition,
};
use crate::operations::OperationRequest;
use crate::tools::builtin::arithmetic::{FIRST_NUMBER, SECOND_NUMBER, UNITS_METADATA_KEY};
use crate::tools::ToolCall;
use async_trait::async_trait;
use serde_json::json;

/// Why a tool result carried no value
#[derive(Debug, Clone, Copy, PartialEq)]
enum Failure {
    DivisionByZero,
    Other,
}

/// Rule-based planner applying the conversation policy
pub struct RulePlanner {
    persona: String,
}

impl RulePlanner {
    pub fn new<S: Into<String>>(persona: S) -> Self {
        Self {
            persona: persona.into(),
        }
    }

    fn reply(&self, text: impl Into<String>) -> LlmResponse {
        self.response(LlmMessage::assistant(text), FinishReason::Stop)
    }

    fn response(&self, message: LlmMessage, finish_reason: FinishReason) -> LlmResponse {
        LlmResponse {
            message,
            usage: None,
            model: self.model_name().to_string(),
            finish_reason: Some(finish_reason),
            metadata: None,
        }
    }

    /// Move a calculation forward given the messages that followed the utterance
    fn advance(
        &self,
        mut plan: CalculationPlan,
        later: &[LlmMessage],
        tools: &[ToolDefinition],
    ) -> LlmResponse {
        let outcomes: Vec<std::result::Result<f64, Failure>> = later
            .iter()
            .flat_map(|message| message.tool_results())
            .map(|(_, is_error, content)| parse_outcome(is_error, content))
            .collect();
        let mut consumed = 0;

        loop {
            if let Some(totals) = plan.totals() {
                return self.reply(compose_answer(&totals));
            }

            let batch = plan.ready_requests();
            if batch.is_empty() {
                return self.reply(OPERATION_FAILED_RESPONSE);
            }

            let Some(results) = outcomes.get(consumed..consumed + batch.len()) else {
                return self.request(batch, tools);
            };
            consumed += batch.len();

            let mut values = Vec::with_capacity(results.len());
            for outcome in results {
                match outcome {
                    Ok(value) => values.push(*value),
                    Err(Failure::DivisionByZero) => return self.reply(DIVISION_BY_ZERO_RESPONSE),
                    Err(Failure::Other) => return self.reply(OPERATION_FAILED_RESPONSE),
                }
            }
            plan.apply_results(&values);
        }
    }

    /// Ask the agent to dispatch a batch of operations
    fn request(&self, batch: Vec<OperationRequest>, tools: &[ToolDefinition]) -> LlmResponse {
        let offered = |name: &str| tools.iter().any(|tool| tool.function.name == name);

        if let Some(missing) = batch
            .iter()
            .find(|request| !offered(request.operation.name()))
        {
            tracing::warn!("Tool '{}' is not available to the planner", missing.operation);
            return self.reply(OPERATION_FAILED_RESPONSE);
        }

        let calls: Vec<ToolCall> = batch
            .into_iter()
            .map(|request| {
                ToolCall::new(
                    request.operation.name(),
                    json!({
                        FIRST_NUMBER: request.first.value,
                        SECOND_NUMBER: request.second.value,
                    }),
                )
                .with_metadata_entry(
                    UNITS_METADATA_KEY,
                    json!([request.first.unit, request.second.unit]),
                )
            })
            .collect();

        tracing::debug!("Planner requests {} tool calls", calls.len());
        self.response(LlmMessage::tool_uses(calls), FinishReason::ToolCalls)
    }
}

impl Default for RulePlanner {
    fn default() -> Self {
        Self::new(DEFAULT_PERSONA)
    }
}

/// Read a tool payload back into a value or a failure
fn parse_outcome(is_error: bool, content: &str) -> std::result::Result<f64, Failure> {
    let payload: serde_json::Value = serde_json::from_str(content).unwrap_or_default();

    if !is_error {
        if let Some(value) = payload.get("result").and_then(|v| v.as_f64()) {
            return Ok(value);
        }
    }

    let division_by_zero = OperationError::DivisionByZero.kind();
    match payload.get("kind").and_then(|v| v.as_str()) {
        Some(kind) if kind == division_by_zero => Err(Failure::DivisionByZero),
        _ => Err(Failure::Other),
    }
}

#[async_trait]
impl LlmClient for RulePlanner {
    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        tools: Option<Vec<ToolDefinition>>,
        _options: Option<ChatOptions>,
    ) -> Result<LlmResponse> {
        let user_index = messages
            .iter()
            .rposition(|message| message.role == MessageRole::User)
            .ok_or_else(|| LlmError::InvalidRequest {
                message: "Conversation has no user message".to_string(),
            })?;
        let utterance = messages[user_index].get_text().unwrap_or_default();
        let tools = tools.unwrap_or_default();

        let intent = interpret(&utterance);
        tracing::debug!(?intent, "Interpreted utterance");

        Ok(match intent {
            Intent::Greeting => self.reply(greeting_response(&self.persona)),
            Intent::Capabilities => self.reply(CAPABILITIES_RESPONSE),
            Intent::OutOfScope => self.reply(SCOPE_RESPONSE),
            Intent::Incomplete => self.reply(INCOMPLETE_RESPONSE),
            Intent::MixedUnits => self.reply(MIXED_UNITS_RESPONSE),
            Intent::DivisionByZero => self.reply(DIVISION_BY_ZERO_RESPONSE),
            Intent::Calculate(plan) => self.advance(plan, &messages[user_index + 1..], &tools),
        })
    }

    fn model_name(&self) -> &str {
        Protocol::Offline.default_model()
    }

    fn provider_name(&self) -> &str {
        "offline"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolRegistry;

    fn tools() -> Vec<ToolDefinition> {
        ToolRegistry::default()
            .create_executor_with_all()
            .get_tool_definitions()
    }

    async fn plan_step(planner: &RulePlanner, messages: &[LlmMessage]) -> LlmResponse {
        planner
            .chat_completion(messages.to_vec(), Some(tools()), None)
            .await
            .expect("planner never fails with a user message")
    }

    fn answer_with(calls: &[ToolCall], values: &[f64]) -> Vec<LlmMessage> {
        calls
            .iter()
            .zip(values)
            .map(|(call, value)| {
                LlmMessage::tool_result(
                    call.id.as_str(),
                    json!({ "result": value }).to_string().as_str(),
                    false,
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_subtraction_round_trip() {
        let planner = RulePlanner::default();
        let mut messages = vec![LlmMessage::user("What is 15 apples minus 3 apples?")];

        let first = plan_step(&planner, &messages).await;
        assert_eq!(first.finish_reason, Some(FinishReason::ToolCalls));
        let calls = first.message.tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "subtract");
        assert_eq!(calls[0].parameters, json!({ "firstNumber": 15.0, "secondNumber": 3.0 }));
        assert_eq!(
            calls[0].metadata_entry(UNITS_METADATA_KEY),
            Some(&json!(["apple", "apple"]))
        );

        messages.push(first.message);
        messages.extend(answer_with(&calls, &[12.0]));

        let second = plan_step(&planner, &messages).await;
        assert_eq!(second.finish_reason, Some(FinishReason::Stop));
        assert_eq!(
            second.message.get_text().as_deref(),
            Some("The result is 12 apples.")
        );
    }

    #[tokio::test]
    async fn test_precedence_takes_two_batches() {
        let planner = RulePlanner::default();
        let mut messages = vec![LlmMessage::user("What is 2 plus 3 times 4?")];

        let first = plan_step(&planner, &messages).await;
        let calls = first.message.tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "multiply");
        messages.push(first.message);
        messages.extend(answer_with(&calls, &[12.0]));

        let second = plan_step(&planner, &messages).await;
        let calls = second.message.tool_calls();
        assert_eq!(calls[0].name, "add");
        assert_eq!(calls[0].parameters, json!({ "firstNumber": 2.0, "secondNumber": 12.0 }));
        messages.push(second.message);
        messages.extend(answer_with(&calls, &[14.0]));

        let third = plan_step(&planner, &messages).await;
        assert_eq!(third.message.get_text().as_deref(), Some("The result is 14."));
    }

    #[tokio::test]
    async fn test_failure_payload_becomes_apology() {
        let planner = RulePlanner::default();
        let mut messages = vec![LlmMessage::user("What is 2 plus 2?")];

        let first = plan_step(&planner, &messages).await;
        let calls = first.message.tool_calls();
        messages.push(first.message);
        messages.push(LlmMessage::tool_result(
            calls[0].id.as_str(),
            r#"{"error":"Cannot divide by zero.","kind":"division_by_zero"}"#,
            true,
        ));

        let second = plan_step(&planner, &messages).await;
        assert_eq!(
            second.message.get_text().as_deref(),
            Some(DIVISION_BY_ZERO_RESPONSE)
        );
    }

    #[tokio::test]
    async fn test_zero_divisor_from_parentheses_fails_at_divide() {
        let planner = RulePlanner::default();
        let mut messages = vec![LlmMessage::user("What is 5 divided by (3 minus 3)?")];

        let first = plan_step(&planner, &messages).await;
        let calls = first.message.tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "subtract");
        messages.push(first.message);
        messages.extend(answer_with(&calls, &[0.0]));

        let second = plan_step(&planner, &messages).await;
        let calls = second.message.tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "divide");
        assert_eq!(calls[0].parameters, json!({ "firstNumber": 5.0, "secondNumber": 0.0 }));
        messages.push(second.message);
        messages.push(LlmMessage::tool_result(
            calls[0].id.as_str(),
            r#"{"error":"Cannot divide by zero.","kind":"division_by_zero"}"#,
            true,
        ));

        let third = plan_step(&planner, &messages).await;
        assert!(!third.message.has_tool_use());
        assert_eq!(
            third.message.get_text().as_deref(),
            Some(DIVISION_BY_ZERO_RESPONSE)
        );
    }

    #[tokio::test]
    async fn test_direct_replies_make_no_calls() {
        let planner = RulePlanner::new("Abacus");
        let cases = [
            ("Hello", greeting_response("Abacus")),
            ("What can you do?", CAPABILITIES_RESPONSE.to_string()),
            ("Tell me a joke", SCOPE_RESPONSE.to_string()),
            ("What is 10 divided by 0?", DIVISION_BY_ZERO_RESPONSE.to_string()),
            ("What is 3 apples times 2 bananas?", MIXED_UNITS_RESPONSE.to_string()),
            ("What is 5 bananas minus 3 apples?", MIXED_UNITS_RESPONSE.to_string()),
            ("What is 2 plus 3 squared?", SCOPE_RESPONSE.to_string()),
        ];

        for (utterance, expected) in cases {
            let response = plan_step(&planner, &[LlmMessage::user(utterance)]).await;
            assert!(!response.message.has_tool_use(), "{}", utterance);
            assert_eq!(response.message.get_text(), Some(expected), "{}", utterance);
        }
    }

    #[tokio::test]
    async fn test_only_latest_utterance_is_planned() {
        let planner = RulePlanner::default();
        let messages = vec![
            LlmMessage::user("What is 2 plus 2?"),
            LlmMessage::assistant("The result is 4."),
            LlmMessage::user("What is 6 times 7?"),
        ];

        let response = plan_step(&planner, &messages).await;
        let calls = response.message.tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "multiply");
    }

    #[tokio::test]
    async fn test_missing_tool_is_not_requested() {
        let planner = RulePlanner::default();
        let response = planner
            .chat_completion(vec![LlmMessage::user("What is 2 plus 2?")], None, None)
            .await
            .expect("planner answers");
        assert_eq!(
            response.message.get_text().as_deref(),
            Some(OPERATION_FAILED_RESPONSE)
        );
    }

    #[tokio::test]
    async fn test_requires_user_message() {
        let planner = RulePlanner::default();
        assert!(planner
            .chat_completion(vec![LlmMessage::system("hi")], None, None)
            .await
            .is_err());
    }

    #[test]
    fn test_parse_outcome() {
        assert_eq!(parse_outcome(false, r#"{"result":4.0}"#), Ok(4.0));
        assert_eq!(
            parse_outcome(true, r#"{"error":"Cannot divide by zero.","kind":"division_by_zero"}"#),
            Err(Failure::DivisionByZero)
        );
        assert_eq!(
            parse_outcome(true, "Error: Tool not found: power"),
            Err(Failure::Other)
        );
    }
}
