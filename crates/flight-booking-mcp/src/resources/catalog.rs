//! Resources `file://airports` and `file://airlines`: static reference data.

use mcp_duplex::types::{McpResult, ReadResourceResult, ResourceContent, ResourceDefinition};
use serde_json::{json, Value};

/// URI of the airport catalog.
pub const AIRPORTS_URI: &str = "file://airports";

/// URI of the airline catalog.
pub const AIRLINES_URI: &str = "file://airlines";

/// Airports served, keyed by IATA code.
pub fn airports() -> Value {
    json!({
        "LAX": {"name": "Los Angeles International", "city": "Los Angeles"},
        "JFK": {"name": "John F. Kennedy International", "city": "New York"},
        "LHR": {"name": "London Heathrow", "city": "London"}
    })
}

/// Airlines and their fleet sizes, keyed by IATA code.
pub fn airlines() -> Value {
    json!({
        "AA": {"name": "American Airlines", "country": "USA", "fleet_size": 950},
        "BA": {"name": "British Airways", "country": "UK", "fleet_size": 280},
        "DL": {"name": "Delta Air Lines", "country": "USA", "fleet_size": 860},
        "UA": {"name": "United Airlines", "country": "USA", "fleet_size": 790}
    })
}

/// Definition for the airport catalog.
pub fn airports_definition() -> ResourceDefinition {
    ResourceDefinition {
        uri: AIRPORTS_URI.to_string(),
        name: "airports".to_string(),
        description: Some("Get list of available airports".to_string()),
        mime_type: Some("application/json".to_string()),
    }
}

/// Definition for the airline catalog.
pub fn airlines_definition() -> ResourceDefinition {
    ResourceDefinition {
        uri: AIRLINES_URI.to_string(),
        name: "airlines".to_string(),
        description: Some("Get list of available airlines and their information".to_string()),
        mime_type: Some("application/json".to_string()),
    }
}

/// Read the airport catalog.
pub async fn read_airports() -> McpResult<ReadResourceResult> {
    Ok(ReadResourceResult {
        contents: vec![ResourceContent::json(AIRPORTS_URI, &airports())],
    })
}

/// Read the airline catalog.
pub async fn read_airlines() -> McpResult<ReadResourceResult> {
    Ok(ReadResourceResult {
        contents: vec![ResourceContent::json(AIRLINES_URI, &airlines())],
    })
}
