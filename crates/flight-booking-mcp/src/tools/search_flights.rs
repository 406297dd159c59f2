//! Tool: search_flights, fares between two airports.

use mcp_duplex::types::{McpError, McpResult, ToolCallResult, ToolDefinition};
use serde_json::{json, Value};

/// Return the tool definition for search_flights.
pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "search_flights".to_string(),
        description: Some("Search for flights between two airports".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "origin": {"type": "string", "description": "Departure airport code"},
                "destination": {"type": "string", "description": "Arrival airport code"}
            },
            "required": ["origin", "destination"]
        }),
    }
}

/// Execute the search_flights tool.
pub async fn execute(args: Value) -> McpResult<ToolCallResult> {
    let origin = string_arg(&args, "origin")?;
    let destination = string_arg(&args, "destination")?;

    tracing::debug!("Searching flights {origin} -> {destination}");

    Ok(ToolCallResult::structured(json!({
        "flights": [
            {"id": "FL123", "origin": origin, "destination": destination, "price": 299},
            {"id": "FL456", "origin": origin, "destination": destination, "price": 399}
        ]
    })))
}

pub(crate) fn string_arg<'a>(args: &'a Value, name: &str) -> McpResult<&'a str> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| McpError::InvalidParams(format!("'{name}' is required")))
}
