//! Example showing a custom persona and system prompt template
//!
//! Runs entirely offline with the rule-based planner, so no API key is needed.
//! The same `AgentConfig` works unchanged with a remote planner.

use calcbot_core::{Agent, AgentBuilder, AgentConfig, ResolvedLlmConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let agent_config = AgentConfig {
        persona: "Abacus".to_string(),
        system_prompt: Some(
            "You are {{persona}}. Only ever use these tools: \
             {{#each tools}}{{this.name}} {{/each}}"
                .to_string(),
        ),
        ..Default::default()
    };

    let mut agent = AgentBuilder::new(ResolvedLlmConfig::offline())
        .with_agent_config(agent_config)
        .build()
        .await?;

    for utterance in [
        "Hello",
        "What is 15 apples minus 3 apples?",
        "What is 2 plus 3 times 4?",
        "What is 10 divided by 0?",
    ] {
        let execution = agent.execute_turn(utterance).await?;
        println!("User  > {}", utterance);
        println!(
            "Agent > {} ({} tool calls)\n",
            execution.final_result, execution.tool_calls
        );
    }

    println!("Session {} holds {} turns", agent.session().id(), agent.session().len());
    Ok(())
}
