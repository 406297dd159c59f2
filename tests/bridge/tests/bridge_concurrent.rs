//! End-to-end: the flight booking host and demo client over a byte stream.
//!
//! Covers the full round trips a real agent would drive, including host
//! tools that call back into the client while the client's request is still
//! in flight.

use std::time::Duration;

use flight_booking_mcp::bookings::BookingLedger;
use flight_booking_mcp::{client_config, client_registry, host_config, host_registry};
use mcp_duplex::types::{Content, ToolCallResult};
use mcp_duplex::{Session, SessionConfig, SessionState, StreamTransport};
use serde_json::json;

// ─── Helpers ───────────────────────────────────────────────────────────────

async fn connect(ledger: BookingLedger) -> (Session, Session) {
    let (host_io, client_io) = tokio::io::duplex(64 * 1024);
    let (host_read, host_write) = tokio::io::split(host_io);
    let (client_read, client_write) = tokio::io::split(client_io);

    let (host, client) = tokio::join!(
        Session::accept(
            StreamTransport::new(host_read, host_write, 32),
            host_registry(ledger),
            host_config(SessionConfig::default()),
        ),
        Session::connect(
            StreamTransport::new(client_read, client_write, 32),
            client_registry(),
            client_config(SessionConfig::default()),
        ),
    );
    (
        host.expect("host handshake failed"),
        client.expect("client handshake failed"),
    )
}

fn structured(result: &ToolCallResult) -> &serde_json::Value {
    result
        .content
        .iter()
        .find_map(Content::as_structured)
        .expect("Expected structured content")
}

// ─── Tests ─────────────────────────────────────────────────────────────────

/// Search, book, then read the booking back as a resource.
#[tokio::test]
async fn test_search_then_book() {
    let (_host, client) = connect(BookingLedger::new()).await;

    let search = client
        .call_tool("search_flights", json!({"origin": "LAX", "destination": "JFK"}))
        .await
        .unwrap();
    let flights = structured(&search)["flights"].as_array().unwrap().clone();
    assert_eq!(flights.len(), 2);

    let cheapest = flights
        .iter()
        .min_by_key(|f| f["price"].as_u64().unwrap())
        .unwrap();
    assert_eq!(cheapest["id"], "FL123");

    let booked = client
        .call_tool(
            "create_booking",
            json!({"flight_id": cheapest["id"], "passenger_name": "John Doe"}),
        )
        .await
        .unwrap();
    assert_eq!(structured(&booked)["booking_id"], "BK123");

    let read = client.read_resource("flight://booking/BK123").await.unwrap();
    assert!(read.contents[0].text.as_deref().unwrap().contains("John Doe"));
}

/// plan_trip samples the client's model before answering.
#[tokio::test]
async fn test_plan_trip_samples_client_model() {
    let (_host, client) = connect(BookingLedger::new()).await;

    let result = client
        .call_tool("plan_trip", json!({"destination": "Lisbon", "days": 4}))
        .await
        .unwrap();

    assert!(!result.is_error());
    let text = result.content[0].as_text().unwrap();
    assert!(text.starts_with("Trip plan for Lisbon:"));
    assert!(text.contains("2-3 months"), "{text}");

    let data = structured(&result);
    assert_eq!(data["days"], 4);
    assert_eq!(data["model"], "travel-assistant-llm");
}

/// confirm_booking elicits passenger details and books with them.
#[tokio::test]
async fn test_confirm_booking_accepts_elicited_details() {
    let ledger = BookingLedger::new();
    let (_host, client) = connect(ledger.clone()).await;

    let result = client
        .call_tool("confirm_booking", json!({"flight_id": "FL456"}))
        .await
        .unwrap();

    let booking = structured(&result);
    assert_eq!(booking["booking_id"], "BK456");
    assert_eq!(booking["passenger"], "Dr. Sarah Wilson");
    assert_eq!(ledger.len().await, 1);
}

/// A canned answer that does not fit the schema is declined, not booked.
#[tokio::test]
async fn test_confirm_booking_decline_books_nothing() {
    let ledger = BookingLedger::new();
    let (_host, client) = connect(ledger.clone()).await;

    let result = client
        .call_tool(
            "confirm_booking",
            json!({
                "flight_id": "FL123",
                "message": "Please share your email so we can send the ticket"
            }),
        )
        .await
        .unwrap();

    let text = result.content[0].as_text().unwrap();
    assert!(text.starts_with("Booking for FL123 declined"), "{text}");
    assert!(ledger.is_empty().await);
}

/// The host can ask the client for its roots from inside a tool.
#[tokio::test]
async fn test_list_client_roots_round_trip() {
    let (host, client) = connect(BookingLedger::new()).await;

    let result = client
        .call_tool("list_client_roots", json!({}))
        .await
        .unwrap();
    let roots = structured(&result)["roots"].as_array().unwrap().clone();
    assert_eq!(roots.len(), 3);
    assert_eq!(roots[2]["uri"], "file:///home/lab-user/mcp-client/");

    // And directly, outside any client request.
    assert_eq!(host.list_roots().await.unwrap().len(), 3);
}

/// Closing the client ends the host's session too.
#[tokio::test]
async fn test_client_close_reaches_host() {
    let (host, client) = connect(BookingLedger::new()).await;

    client.close().await;
    tokio::time::timeout(Duration::from_secs(1), host.closed())
        .await
        .expect("host should see the client leave");
    assert_eq!(host.state(), SessionState::Closed);
}
