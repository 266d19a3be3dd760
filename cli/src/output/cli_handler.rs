//! CLI output handler implementation

use async_trait::async_trait;
use calcbot_core::output::{
    AgentEvent, AgentOutput, MessageLevel, OutputError, ToolExecutionInfo, ToolExecutionStatus,
};
use calcbot_core::tools::builtin::arithmetic::{FIRST_NUMBER, SECOND_NUMBER};
use colored::Colorize;
use std::io::Write;
use tracing::{debug, error, info, warn};

/// CLI output configuration
#[derive(Debug, Clone, Default)]
pub struct CliOutputConfig {
    /// Show every tool invocation and its result
    pub show_tool_calls: bool,
}

/// CLI output handler that formats events for terminal display
pub struct CliOutputHandler {
    config: CliOutputConfig,
}

impl CliOutputHandler {
    /// Create a new CLI output handler
    pub fn new(config: CliOutputConfig) -> Self {
        Self { config }
    }
}

/// One-line summary of a tool invocation, e.g. `⏺ subtract(15, 3)`
pub fn format_tool_status(tool_info: &ToolExecutionInfo) -> String {
    let dot = match tool_info.status {
        ToolExecutionStatus::Executing => "⏺".white(),
        ToolExecutionStatus::Success => "⏺".green(),
        ToolExecutionStatus::Error => "⏺".red(),
    };

    let arguments: Vec<String> = [FIRST_NUMBER, SECOND_NUMBER]
        .iter()
        .map(|key| match tool_info.parameters.get(*key) {
            Some(value) => value.to_string(),
            None => "?".to_string(),
        })
        .collect();

    format!("{} {}({})", dot, tool_info.tool_name, arguments.join(", "))
}

/// The payload a finished invocation returned, if any
pub fn format_tool_result(tool_info: &ToolExecutionInfo) -> Option<String> {
    let content = tool_info.result_content.as_ref()?;
    let line = format!("  ⎿  {}", content);
    Some(match tool_info.status {
        ToolExecutionStatus::Error => line.red().to_string(),
        _ => line.dimmed().to_string(),
    })
}

#[async_trait]
impl AgentOutput for CliOutputHandler {
    async fn emit_event(&self, event: AgentEvent) -> Result<(), OutputError> {
        match event {
            AgentEvent::TurnStarted { context } => {
                debug!(
                    session_id = %context.session_id,
                    turn = context.turn_index,
                    "Handling utterance: {}",
                    context.utterance
                );
            }

            AgentEvent::TurnCompleted {
                context,
                success,
                response,
            } => {
                if success {
                    debug!("Turn completed: {}", response);
                } else {
                    debug!("Turn failed: {}", response);
                }

                if self.config.show_tool_calls {
                    let mut stats = format!(
                        "{} steps, {:.2}s",
                        context.current_step,
                        context.execution_time.as_secs_f64()
                    );
                    let token_usage = &context.token_usage;
                    if token_usage.total_tokens > 0 {
                        stats.push_str(&format!(
                            ", {} input + {} output = {} tokens",
                            token_usage.input_tokens,
                            token_usage.output_tokens,
                            token_usage.total_tokens
                        ));
                    }
                    println!("{}", stats.dimmed());
                }
            }

            AgentEvent::PlanningStep { step_number } => {
                debug!("Planning step {}", step_number);
            }

            AgentEvent::ToolExecutionStarted { tool_info } => {
                debug!(tool = %tool_info.tool_name, "Tool call started");
            }

            AgentEvent::ToolExecutionCompleted { tool_info } => {
                if self.config.show_tool_calls {
                    println!("{}", format_tool_status(&tool_info));
                    if let Some(result_display) = format_tool_result(&tool_info) {
                        println!("{}", result_display);
                    }
                }
            }

            AgentEvent::TokenUsageUpdated { token_usage } => {
                debug!(total_tokens = token_usage.total_tokens, "Token usage updated");
            }

            AgentEvent::Message {
                level,
                content,
                metadata: _,
            } => match level {
                MessageLevel::Debug => debug!("{}", content),
                MessageLevel::Info => info!("{}", content),
                MessageLevel::Normal => println!("{}", content),
                MessageLevel::Warning => warn!("{}", content),
                MessageLevel::Error => error!("{}", content),
            },
        }

        Ok(())
    }

    async fn flush(&self) -> Result<(), OutputError> {
        std::io::stdout().flush().map_err(|e| e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn info(status: ToolExecutionStatus, result: Option<&str>) -> ToolExecutionInfo {
        ToolExecutionInfo {
            execution_id: "call-1".to_string(),
            tool_name: "subtract".to_string(),
            parameters: json!({ "firstNumber": 15, "secondNumber": 3 }),
            status,
            result_content: result.map(str::to_string),
            duration_ms: Some(0),
        }
    }

    #[test]
    fn test_tool_status_lists_arguments() {
        colored::control::set_override(false);
        let line = format_tool_status(&info(ToolExecutionStatus::Success, None));
        assert_eq!(line, "⏺ subtract(15, 3)");
    }

    #[test]
    fn test_tool_result_shows_payload() {
        colored::control::set_override(false);
        let payload = r#"{"result":12.0,"unit":"apple"}"#;
        let line = format_tool_result(&info(ToolExecutionStatus::Success, Some(payload)));
        assert_eq!(line.as_deref(), Some(r#"  ⎿  {"result":12.0,"unit":"apple"}"#));
        assert!(format_tool_result(&info(ToolExecutionStatus::Executing, None)).is_none());
    }
}
