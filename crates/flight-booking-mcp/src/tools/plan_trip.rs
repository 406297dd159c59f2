//! Tool: plan_trip, asks the client's model for an itinerary mid-call.

use mcp_duplex::registry::RequestContext;
use mcp_duplex::types::{
    Content, CreateMessageParams, McpError, McpResult, SamplingMessage, ToolCallResult,
    ToolDefinition,
};
use serde_json::{json, Value};

use super::search_flights::string_arg;

const DEFAULT_DAYS: u64 = 3;

/// Return the tool definition for plan_trip.
pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "plan_trip".to_string(),
        description: Some(
            "Draft a trip plan for a destination using the client's language model".to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {
                "destination": {"type": "string"},
                "days": {"type": "integer", "minimum": 1, "maximum": 30}
            },
            "required": ["destination"]
        }),
    }
}

/// Execute the plan_trip tool.
pub async fn execute(ctx: RequestContext, args: Value) -> McpResult<ToolCallResult> {
    let destination = string_arg(&args, "destination")?;
    let days = args.get("days").and_then(Value::as_u64).unwrap_or(DEFAULT_DAYS);

    let params = CreateMessageParams {
        messages: vec![SamplingMessage::user(format!(
            "Please recommend a {days}-day itinerary for a trip to {destination}."
        ))],
        system_prompt: Some("You are a helpful travel assistant.".to_string()),
        max_tokens: Some(300),
        ..Default::default()
    };

    let reply = match ctx.peer.create_message(params).await {
        Ok(reply) => reply,
        Err(McpError::MethodNotFound(_)) => {
            return Ok(ToolCallResult::error(
                "The connected client does not offer sampling",
            ))
        }
        Err(e) => return Err(e),
    };

    let plan = reply.content.as_text().unwrap_or_default();
    tracing::info!("Trip plan for {destination} drafted by {}", reply.model);

    Ok(ToolCallResult {
        content: vec![
            Content::text(format!("Trip plan for {destination}:\n{plan}")),
            Content::Structured {
                data: json!({"destination": destination, "days": days, "model": reply.model}),
            },
        ],
        is_error: None,
    })
}
