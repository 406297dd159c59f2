//! Tool: create_booking, books a flight for a named passenger.

use mcp_duplex::types::{McpError, McpResult, ToolCallResult, ToolDefinition};
use serde_json::{json, Value};

use super::search_flights::string_arg;
use crate::bookings::BookingLedger;

/// Return the tool definition for create_booking.
pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "create_booking".to_string(),
        description: Some("Create a flight booking".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "flight_id": {"type": "string"},
                "passenger_name": {"type": "string"}
            },
            "required": ["flight_id", "passenger_name"]
        }),
    }
}

/// Execute the create_booking tool.
pub async fn execute(args: Value, ledger: &BookingLedger) -> McpResult<ToolCallResult> {
    let flight_id = string_arg(&args, "flight_id")?;
    let passenger = string_arg(&args, "passenger_name")?;

    let booking = ledger.create(flight_id, passenger).await;
    let value = serde_json::to_value(&booking)
        .map_err(|e| McpError::HandlerError(format!("Failed to encode booking: {e}")))?;

    Ok(ToolCallResult::structured(value))
}
