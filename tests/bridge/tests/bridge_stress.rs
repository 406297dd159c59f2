//! Stress tests: many overlapping requests in both directions on one session.
//!
//! Tests verify that every response reaches the call that issued it and that
//! nothing stays pending once the traffic drains.

use std::sync::Arc;
use std::time::{Duration, Instant};

use flight_booking_mcp::bookings::BookingLedger;
use flight_booking_mcp::{client_config, client_registry, host_config, host_registry};
use mcp_duplex::transport::MemoryTransport;
use mcp_duplex::types::{CreateMessageParams, SamplingMessage};
use mcp_duplex::{Session, SessionConfig};
use serde_json::json;
use tokio::sync::Barrier;

// ─── Helpers ───────────────────────────────────────────────────────────────

async fn connect(ledger: BookingLedger) -> (Session, Session) {
    let (host_end, client_end) = MemoryTransport::pair();
    let (host, client) = tokio::join!(
        Session::accept(
            host_end,
            host_registry(ledger),
            host_config(SessionConfig::default())
        ),
        Session::connect(
            client_end,
            client_registry(),
            client_config(SessionConfig::default())
        ),
    );
    (host.unwrap(), client.unwrap())
}

// ─── Tests ─────────────────────────────────────────────────────────────────

/// Hundreds of bookings issued at once, each answered with its own id.
#[tokio::test]
async fn test_many_concurrent_bookings() {
    let ledger = BookingLedger::new();
    let (_host, client) = connect(ledger.clone()).await;

    let count = 200usize;
    let barrier = Arc::new(Barrier::new(count));
    let mut handles = vec![];

    let start = Instant::now();
    for i in 0..count {
        let peer = client.peer();
        let barrier = barrier.clone();
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            let flight_id = format!("FL{i:03}");
            let result = peer
                .call_tool(
                    "create_booking",
                    json!({"flight_id": flight_id, "passenger_name": format!("Passenger {i}")}),
                )
                .await
                .unwrap();
            let booking = result.content[0].as_structured().unwrap().clone();
            assert_eq!(booking["flight_id"], flight_id);
            assert_eq!(booking["passenger"], format!("Passenger {i}"));
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }
    let elapsed = start.elapsed();
    println!("{count} bookings in {elapsed:?}");

    assert_eq!(ledger.len().await, count);
    assert_eq!(client.pending_requests(), 0);
    assert!(elapsed < Duration::from_secs(10));
}

/// Host-initiated sampling interleaved with client-initiated nested calls.
#[tokio::test]
async fn test_bidirectional_traffic() {
    let (host, client) = connect(BookingLedger::new()).await;

    let mut handles = vec![];
    for i in 0..50u32 {
        let client = client.peer();
        handles.push(tokio::spawn(async move {
            let destination = format!("City {i}");
            let result = client
                .call_tool("plan_trip", json!({"destination": destination, "days": 2}))
                .await
                .unwrap();
            let text = result.content[0].as_text().unwrap();
            assert!(text.starts_with(&format!("Trip plan for {destination}:")));
        }));

        let host = host.peer();
        handles.push(tokio::spawn(async move {
            let reply = host
                .create_message(CreateMessageParams {
                    messages: vec![SamplingMessage::user(format!("Tell me a story {i}"))],
                    ..Default::default()
                })
                .await
                .unwrap();
            assert!(reply.content.as_text().unwrap().starts_with("Once upon a time"));
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }
    assert_eq!(client.pending_requests(), 0);
    assert_eq!(host.pending_requests(), 0);
}

/// Reads keep working while bookings are being written.
#[tokio::test]
async fn test_reads_during_writes() {
    let (_host, client) = connect(BookingLedger::new()).await;

    let writer = {
        let client = client.peer();
        tokio::spawn(async move {
            for i in 0..100 {
                client
                    .call_tool(
                        "create_booking",
                        json!({"flight_id": format!("UA{i:03}"), "passenger_name": "Ada"}),
                    )
                    .await
                    .unwrap();
            }
        })
    };

    for _ in 0..100 {
        let airports = client.read_resource("file://airports").await.unwrap();
        assert_eq!(airports.contents.len(), 1);
    }
    writer.await.unwrap();

    let last = client.read_resource("flight://booking/BK099").await.unwrap();
    assert!(last.contents[0].text.as_deref().unwrap().contains("UA099"));
}
