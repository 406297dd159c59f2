//! Prompt template: help a passenger whose flight was disrupted.

use mcp_duplex::types::{
    Content, McpError, McpResult, PromptArgument, PromptDefinition, PromptGetResult,
    PromptMessage, Role,
};
use serde_json::{Map, Value};

/// Return the prompt definition for handle_disruption.
pub fn definition() -> PromptDefinition {
    PromptDefinition {
        name: "handle_disruption".to_string(),
        description: Some("Generate a prompt for handling flight disruptions".to_string()),
        arguments: Some(vec![
            PromptArgument::required("original_flight", "The disrupted flight", "string"),
            PromptArgument::required("reason", "Why the flight was disrupted", "string"),
        ]),
    }
}

/// Expand the `handle_disruption` prompt.
pub fn expand(args: &Map<String, Value>) -> McpResult<PromptGetResult> {
    let original_flight = required_str(args, "original_flight")?;
    let reason = required_str(args, "reason")?;

    let text = format!(
        "A passenger's flight {original_flight} has been disrupted due to: {reason}\n\n\
         Please help resolve this by:\n\
         1. Understanding the passenger's situation\n\
         2. Finding alternative flight options using search_flights\n\
         3. Providing clear rebooking steps\n\
         4. Offering appropriate compensation if applicable\n\n\
         Be empathetic and solution-focused in your response."
    );

    Ok(PromptGetResult {
        description: Some("Resolve a flight disruption".to_string()),
        messages: vec![PromptMessage {
            role: Role::User,
            content: Content::text(text),
        }],
    })
}

fn required_str<'a>(args: &'a Map<String, Value>, name: &str) -> McpResult<&'a str> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| McpError::InvalidParams(format!("'{name}' argument is required")))
}
