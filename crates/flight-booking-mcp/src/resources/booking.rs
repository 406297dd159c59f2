//! Resource template `flight://booking/{booking_id}` over the booking ledger.

use mcp_duplex::registry::ResourceRequest;
use mcp_duplex::types::{
    McpError, McpResult, ReadResourceResult, ResourceContent, ResourceTemplateDefinition,
};

use crate::bookings::BookingLedger;

/// URI template for individual bookings.
pub const BOOKING_TEMPLATE: &str = "flight://booking/{booking_id}";

/// Template definition for resources/templates/list.
pub fn definition() -> ResourceTemplateDefinition {
    ResourceTemplateDefinition {
        uri_template: BOOKING_TEMPLATE.to_string(),
        name: "booking".to_string(),
        description: Some("A booking made during this session".to_string()),
        mime_type: Some("application/json".to_string()),
    }
}

/// Read one booking. Unknown ids are `ResourceNotFound`.
pub async fn read_booking(
    request: ResourceRequest,
    ledger: &BookingLedger,
) -> McpResult<ReadResourceResult> {
    let booking_id = request
        .variables
        .get("booking_id")
        .ok_or_else(|| McpError::ResourceNotFound(request.uri.clone()))?;

    let booking = ledger
        .get(booking_id)
        .await
        .ok_or_else(|| McpError::ResourceNotFound(request.uri.clone()))?;

    let value = serde_json::to_value(&booking)
        .map_err(|e| McpError::HandlerError(format!("Failed to encode booking: {e}")))?;

    Ok(ReadResourceResult {
        contents: vec![ResourceContent::json(request.uri, &value)],
    })
}
