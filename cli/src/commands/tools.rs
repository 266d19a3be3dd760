//! Tools listing command

use anyhow::Result;
use calcbot_core::tools::{Tool, ToolRegistry};
use colored::Colorize;
use tracing::info;

/// Show available tools with their parameters and examples
pub async fn tools_command() -> Result<()> {
    info!("Listing available tools");

    println!("{}\n", "Available Tools".bold());

    let registry = ToolRegistry::default();
    for name in registry.list_tools() {
        let Some(tool) = registry.create_tool(name) else {
            continue;
        };

        println!("{} {}", "▸".cyan(), tool.name().bold());
        println!("   {}", tool.description());

        let schema = tool.parameters_schema();
        if let Some(properties) = schema.get("properties").and_then(|p| p.as_object()) {
            for (parameter, definition) in properties {
                let description = definition
                    .get("description")
                    .and_then(|d| d.as_str())
                    .unwrap_or("");
                println!("   - {}: {}", parameter, description);
            }
        }

        for example in tool.examples() {
            println!(
                "   {} {} -> {}",
                "e.g.".dimmed(),
                example.description,
                example.expected_result
            );
        }
        println!();
    }

    Ok(())
}
