//! Tool: confirm_booking, elicits passenger details before booking.

use mcp_duplex::registry::RequestContext;
use mcp_duplex::types::{
    ElicitParams, ElicitResult, McpError, McpResult, ToolCallResult, ToolDefinition,
};
use serde_json::{json, Value};

use super::search_flights::string_arg;
use crate::bookings::BookingLedger;

/// Return the tool definition for confirm_booking.
pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "confirm_booking".to_string(),
        description: Some("Ask the user for passenger details, then book the flight".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "flight_id": {"type": "string"},
                "message": {"type": "string"}
            },
            "required": ["flight_id"]
        }),
    }
}

/// Schema the passenger details must satisfy.
pub fn passenger_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": {"type": "string"},
            "title": {"type": "string"}
        },
        "required": ["name"]
    })
}

/// Execute the confirm_booking tool. Decline and cancel are reported as
/// ordinary results.
pub async fn execute(
    ctx: RequestContext,
    args: Value,
    ledger: &BookingLedger,
) -> McpResult<ToolCallResult> {
    let flight_id = string_arg(&args, "flight_id")?;
    let message = args
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Please provide the passenger name for flight {flight_id}"));

    let params = ElicitParams {
        message,
        requested_schema: passenger_schema(),
    };

    let answer = match ctx.peer.elicit(params).await {
        Ok(answer) => answer,
        Err(McpError::MethodNotFound(_)) => {
            return Ok(ToolCallResult::error(
                "The connected client does not offer elicitation",
            ))
        }
        Err(e) => return Err(e),
    };

    match answer {
        ElicitResult::Accept { content } => {
            let name = content.get("name").and_then(Value::as_str).unwrap_or_default();
            let passenger = match content.get("title").and_then(Value::as_str) {
                Some(title) => format!("{title} {name}"),
                None => name.to_string(),
            };

            let booking = ledger.create(flight_id, &passenger).await;
            let value = serde_json::to_value(&booking)
                .map_err(|e| McpError::HandlerError(format!("Failed to encode booking: {e}")))?;
            Ok(ToolCallResult::structured(value))
        }
        ElicitResult::Decline { reason } => Ok(ToolCallResult::text(format!(
            "Booking for {flight_id} declined: {}",
            reason.as_deref().unwrap_or("no reason given")
        ))),
        ElicitResult::Cancel => Ok(ToolCallResult::text(format!(
            "Booking for {flight_id} cancelled"
        ))),
    }
}
