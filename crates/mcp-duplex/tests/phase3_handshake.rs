//! Phase 3 handshake: version negotiation, readiness gating, timeouts.

mod common;

use std::time::Duration;

use serde_json::json;

use mcp_duplex::transport::MemoryTransport;
use mcp_duplex::types::*;
use mcp_duplex::{CapabilityRegistry, Session, SessionConfig, SessionState};

use common::fixtures::{connect_pair, test_client_registry, test_host_registry, RawPeer};

fn config_with_version(version: &str) -> SessionConfig {
    SessionConfig {
        protocol_version: version.to_string(),
        ..SessionConfig::default()
    }
}

fn assert_send<F: std::future::Future + Send>(_: &F) {}

#[tokio::test]
async fn test_session_futures_can_be_spawned() {
    let (host_end, client_end) = MemoryTransport::pair();
    let accept = Session::accept(host_end, test_host_registry(), SessionConfig::default());
    let connect = Session::connect(client_end, test_client_registry(), SessionConfig::default());
    assert_send(&accept);
    assert_send(&connect);

    let host = tokio::spawn(accept);
    let client = tokio::spawn(connect);
    let host = host.await.unwrap().unwrap();
    let client = client.await.unwrap().unwrap();
    assert_eq!(host.state(), SessionState::Ready);
    assert_eq!(client.state(), SessionState::Ready);
}

#[tokio::test]
async fn test_handshake_reaches_ready_on_both_sides() {
    let host_config = SessionConfig {
        instructions: Some("search before booking".to_string()),
        ..SessionConfig::default()
    }
    .with_implementation("test-host", "1.2.3");

    let (host, client) = connect_pair(
        test_host_registry(),
        test_client_registry(),
        host_config,
        SessionConfig::default(),
    )
    .await;

    assert_eq!(host.state(), SessionState::Ready);
    assert_eq!(client.state(), SessionState::Ready);

    let remote = client.remote().unwrap();
    assert_eq!(remote.implementation.name, "test-host");
    assert_eq!(remote.implementation.version, "1.2.3");
    assert_eq!(remote.instructions.as_deref(), Some("search before booking"));
}

#[tokio::test]
async fn test_version_mismatch_closes_both_sides() {
    let (host_end, client_end) = MemoryTransport::pair();

    let (host, client) = tokio::join!(
        Session::accept(
            host_end,
            test_host_registry(),
            config_with_version("2025-06-18")
        ),
        Session::connect(
            client_end,
            test_client_registry(),
            config_with_version("2024-11-05")
        ),
    );

    assert!(matches!(host, Err(McpError::IncompatibleVersion(_))));
    assert!(matches!(client, Err(McpError::IncompatibleVersion(_))));
}

#[tokio::test]
async fn test_responder_rejects_mismatch_then_closes() {
    let (host_end, raw_end) = MemoryTransport::pair();
    let raw = RawPeer::new(raw_end);

    let host = tokio::spawn(Session::accept(
        host_end,
        test_host_registry(),
        SessionConfig::default(),
    ));

    let reply = raw.initialize("1999-01-01").await;
    assert_eq!(reply["id"], 0);
    assert_eq!(reply["error"]["code"], mcp_error_codes::INCOMPATIBLE_VERSION);

    assert!(raw.sees_close_within(Duration::from_secs(1)).await);
    let host = host.await.unwrap();
    assert!(matches!(host, Err(McpError::IncompatibleVersion(_))));
}

#[tokio::test]
async fn test_initiator_rejects_mismatched_result() {
    let (client_end, raw_end) = MemoryTransport::pair();
    let raw = RawPeer::new(raw_end);

    let client = tokio::spawn(Session::connect(
        client_end,
        test_client_registry(),
        SessionConfig::default(),
    ));

    let request = raw.recv_json().await;
    assert_eq!(request["method"], "initialize");
    assert_eq!(request["params"]["protocolVersion"], PROTOCOL_VERSION);

    raw.send_json(json!({
        "jsonrpc": "2.0",
        "id": request["id"],
        "result": {
            "protocolVersion": "1999-01-01",
            "capabilities": [],
            "serverInfo": {"name": "old", "version": "0.1"}
        }
    }))
    .await;

    let client = client.await.unwrap();
    assert!(matches!(client, Err(McpError::IncompatibleVersion(_))));
    assert!(raw.sees_close_within(Duration::from_secs(1)).await);
}

#[tokio::test]
async fn test_requests_before_ready_get_not_ready() {
    let (host_end, raw_end) = MemoryTransport::pair();
    let raw = RawPeer::new(raw_end);

    let host = tokio::spawn(Session::accept(
        host_end,
        test_host_registry(),
        SessionConfig::default(),
    ));

    raw.send_json(json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}))
        .await;
    let early = raw.recv_json().await;
    assert_eq!(early["error"]["code"], mcp_error_codes::NOT_READY);

    let reply = raw.initialize(PROTOCOL_VERSION).await;
    assert_eq!(reply["result"]["protocolVersion"], PROTOCOL_VERSION);

    // Initialize answered but not yet acknowledged.
    raw.send_json(json!({"jsonrpc": "2.0", "id": 2, "method": "ping"}))
        .await;
    let between = raw.recv_json().await;
    assert_eq!(between["error"]["code"], mcp_error_codes::NOT_READY);

    raw.initialized().await;
    let host = host.await.unwrap().unwrap();
    assert_eq!(host.state(), SessionState::Ready);

    raw.send_json(json!({"jsonrpc": "2.0", "id": 3, "method": "tools/list"}))
        .await;
    let listed = raw.recv_json().await;
    assert_eq!(listed["id"], 3);
    assert_eq!(listed["result"]["tools"][0]["name"], "echo");

    raw.send_json(json!({"jsonrpc": "2.0", "id": 4, "method": "initialize", "params": {}}))
        .await;
    let again = raw.recv_json().await;
    assert_eq!(again["error"]["code"], error_codes::INVALID_REQUEST);
}

#[tokio::test]
async fn test_unknown_method_gets_method_not_found() {
    let (host_end, raw_end) = MemoryTransport::pair();
    let raw = RawPeer::new(raw_end);

    let host = tokio::spawn(Session::accept(
        host_end,
        CapabilityRegistry::empty(),
        SessionConfig::default(),
    ));
    raw.initialize(PROTOCOL_VERSION).await;
    raw.initialized().await;
    let _host = host.await.unwrap().unwrap();

    raw.send_json(json!({"jsonrpc": "2.0", "id": "q", "method": "tools/delete"}))
        .await;
    let reply = raw.recv_json().await;
    assert_eq!(reply["id"], "q");
    assert_eq!(reply["error"]["code"], error_codes::METHOD_NOT_FOUND);
}

#[tokio::test]
async fn test_responder_handshake_timeout() {
    let (host_end, raw_end) = MemoryTransport::pair();
    let raw = RawPeer::new(raw_end);

    let config = SessionConfig {
        handshake_timeout_ms: 50,
        ..SessionConfig::default()
    };
    let result = Session::accept(host_end, test_host_registry(), config).await;

    assert!(matches!(
        result,
        Err(McpError::RequestTimeout { timeout_ms: 50, .. })
    ));
    assert!(raw.sees_close_within(Duration::from_secs(1)).await);
}

#[tokio::test]
async fn test_initiator_handshake_timeout() {
    let (client_end, raw_end) = MemoryTransport::pair();
    let _raw = RawPeer::new(raw_end);

    let config = SessionConfig {
        handshake_timeout_ms: 50,
        ..SessionConfig::default()
    };
    let result = Session::connect(client_end, test_client_registry(), config).await;

    match result {
        Err(McpError::RequestTimeout { method, timeout_ms }) => {
            assert_eq!(method, "initialize");
            assert_eq!(timeout_ms, 50);
        }
        Err(other) => panic!("unexpected error {other:?}"),
        Ok(_) => panic!("handshake should not complete"),
    }
}
