//! Shared fixtures: small registries, connected session pairs, and a raw
//! frame-level peer for driving a session by hand.

use std::time::Duration;

use serde_json::{json, Map, Value};

use mcp_duplex::registry::{RequestContext, ResourceRequest};
use mcp_duplex::transport::{MemoryTransport, Transport};
use mcp_duplex::types::*;
use mcp_duplex::{CapabilityRegistry, Session, SessionConfig};

/// Host registry exercising every dispatch path.
pub fn test_host_registry() -> CapabilityRegistry {
    CapabilityRegistry::builder()
        .tool(
            ToolDefinition {
                name: "echo".to_string(),
                description: Some("Echo the text back".to_string()),
                input_schema: json!({
                    "type": "object",
                    "properties": {"text": {"type": "string"}},
                    "required": ["text"],
                    "additionalProperties": false
                }),
            },
            |_ctx: RequestContext, args: Value| async move {
                let text = args["text"].as_str().unwrap_or_default();
                Ok::<_, McpError>(ToolCallResult::text(text))
            },
        )
        .tool(
            ToolDefinition {
                name: "slow".to_string(),
                description: Some("Sleep, then answer".to_string()),
                input_schema: json!({
                    "type": "object",
                    "properties": {"ms": {"type": "integer", "minimum": 0}},
                    "required": ["ms"]
                }),
            },
            |_ctx: RequestContext, args: Value| async move {
                let ms = args["ms"].as_u64().unwrap_or(0);
                tokio::time::sleep(Duration::from_millis(ms)).await;
                Ok::<_, McpError>(ToolCallResult::text(format!("slept {ms}ms")))
            },
        )
        .tool(
            ToolDefinition {
                name: "boom".to_string(),
                description: None,
                input_schema: json!({"type": "object"}),
            },
            |_ctx: RequestContext, _args: Value| async move {
                if true {
                    panic!("boom");
                }
                Ok::<_, McpError>(ToolCallResult::text("unreachable"))
            },
        )
        .tool(
            ToolDefinition {
                name: "fail".to_string(),
                description: None,
                input_schema: json!({"type": "object"}),
            },
            |_ctx: RequestContext, _args: Value| async move {
                Err::<ToolCallResult, _>(McpError::SessionClosed)
            },
        )
        .tool(
            ToolDefinition {
                name: "ask_client".to_string(),
                description: Some("Ask the client's model".to_string()),
                input_schema: json!({
                    "type": "object",
                    "properties": {"question": {"type": "string"}},
                    "required": ["question"]
                }),
            },
            |ctx: RequestContext, args: Value| async move {
                let question = args["question"].as_str().unwrap_or_default().to_string();
                let reply = ctx
                    .peer
                    .create_message(CreateMessageParams {
                        messages: vec![SamplingMessage::user(question)],
                        ..Default::default()
                    })
                    .await?;
                Ok::<_, McpError>(ToolCallResult::text(
                    reply.content.as_text().unwrap_or_default(),
                ))
            },
        )
        .resource(
            ResourceDefinition {
                uri: "mem://static".to_string(),
                name: "static".to_string(),
                description: None,
                mime_type: Some("application/json".to_string()),
            },
            |_ctx: RequestContext, req: ResourceRequest| async move {
                Ok::<_, McpError>(ReadResourceResult {
                    contents: vec![ResourceContent::json(req.uri, &json!({"ok": true}))],
                })
            },
        )
        .resource_template(
            ResourceTemplateDefinition {
                uri_template: "mem://item/{id}".to_string(),
                name: "item".to_string(),
                description: None,
                mime_type: None,
            },
            |_ctx: RequestContext, req: ResourceRequest| async move {
                let id = req.variables.get("id").cloned().unwrap_or_default();
                Ok::<_, McpError>(ReadResourceResult {
                    contents: vec![ResourceContent::json(req.uri, &json!({"id": id}))],
                })
            },
        )
        .prompt(
            PromptDefinition {
                name: "greet".to_string(),
                description: Some("Greet someone several times".to_string()),
                arguments: Some(vec![
                    PromptArgument::required("name", "Who to greet", "string"),
                    PromptArgument::optional("times", "How many times", "number"),
                ]),
            },
            |_ctx: RequestContext, args: Map<String, Value>| async move {
                let name = args["name"].as_str().unwrap_or_default().to_string();
                let times = args.get("times").and_then(Value::as_f64).unwrap_or(1.0);
                Ok::<_, McpError>(PromptGetResult {
                    description: None,
                    messages: vec![PromptMessage {
                        role: Role::User,
                        content: Content::text(format!("Hello {name} x{times}")),
                    }],
                })
            },
        )
        .build()
}

/// Client registry that answers every callback deterministically.
pub fn test_client_registry() -> CapabilityRegistry {
    CapabilityRegistry::builder()
        .roots(|_ctx: RequestContext| async move {
            Ok::<_, McpError>(vec![Root::new("file:///tmp/project/")])
        })
        .sampling(|_ctx: RequestContext, params: CreateMessageParams| async move {
            let last = params
                .messages
                .last()
                .and_then(|m| m.content.as_text())
                .unwrap_or_default()
                .to_string();
            Ok::<_, McpError>(CreateMessageResult {
                role: Role::Assistant,
                content: Content::text(format!("echo: {last}")),
                model: "test-model".to_string(),
                stop_reason: Some("endTurn".to_string()),
            })
        })
        .elicitation(|_ctx: RequestContext, params: ElicitParams| async move {
            let result = if params.message.contains("decline") {
                ElicitResult::Decline {
                    reason: Some("not today".to_string()),
                }
            } else if params.message.contains("bad") {
                ElicitResult::Accept {
                    content: json!({"name": 42}),
                }
            } else {
                ElicitResult::Accept {
                    content: json!({"name": "Ada"}),
                }
            };
            Ok::<_, McpError>(result)
        })
        .build()
}

/// Handshake a host and client over an in-memory pair.
pub async fn connect_pair(
    host_registry: CapabilityRegistry,
    client_registry: CapabilityRegistry,
    host_config: SessionConfig,
    client_config: SessionConfig,
) -> (Session, Session) {
    let (host_end, client_end) = MemoryTransport::pair();
    let (host, client) = tokio::join!(
        Session::accept(host_end, host_registry, host_config),
        Session::connect(client_end, client_registry, client_config),
    );
    (
        host.expect("host handshake failed"),
        client.expect("client handshake failed"),
    )
}

/// Host and client with the test registries and default config.
pub async fn default_pair() -> (Session, Session) {
    connect_pair(
        test_host_registry(),
        test_client_registry(),
        SessionConfig::default(),
        SessionConfig::default(),
    )
    .await
}

/// One end of a transport driven frame by frame from the test.
pub struct RawPeer {
    transport: Box<dyn Transport>,
}

impl RawPeer {
    pub fn new<T: Transport + 'static>(transport: T) -> Self {
        Self {
            transport: Box::new(transport),
        }
    }

    pub async fn send_json(&self, value: Value) {
        self.send_raw(serde_json::to_vec(&value).unwrap()).await;
    }

    pub async fn send_raw(&self, frame: Vec<u8>) {
        self.transport.send(frame).await.expect("raw send failed");
    }

    /// Next frame as JSON, failing the test after one second.
    pub async fn recv_json(&self) -> Value {
        let frame = tokio::time::timeout(Duration::from_secs(1), self.transport.receive())
            .await
            .expect("timed out waiting for a frame")
            .expect("transport closed");
        serde_json::from_slice(&frame).unwrap()
    }

    /// Next frame if one arrives within `limit`.
    pub async fn try_recv_json(&self, limit: Duration) -> Option<Value> {
        match tokio::time::timeout(limit, self.transport.receive()).await {
            Ok(Ok(frame)) => Some(serde_json::from_slice(&frame).unwrap()),
            _ => None,
        }
    }

    /// Play the responder side of the handshake: answer `initialize` and
    /// wait for the acknowledgement.
    pub async fn accept_handshake(&self) {
        let request = self.recv_json().await;
        assert_eq!(request["method"], "initialize");
        self.send_json(json!({
            "jsonrpc": "2.0",
            "id": request["id"],
            "result": {
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": [],
                "serverInfo": {"name": "raw-host", "version": "0.0.0"}
            }
        }))
        .await;
        let ack = self.recv_json().await;
        assert_eq!(ack["method"], "notifications/initialized");
    }

    /// Whether the other side closed within the given time.
    pub async fn sees_close_within(&self, limit: Duration) -> bool {
        loop {
            match tokio::time::timeout(limit, self.transport.receive()).await {
                Ok(Ok(_)) => continue,
                Ok(Err(_)) => return true,
                Err(_) => return false,
            }
        }
    }

    /// Play the initiator side of the handshake with the given version.
    pub async fn initialize(&self, protocol_version: &str) -> Value {
        self.send_json(json!({
            "jsonrpc": "2.0",
            "id": 0,
            "method": "initialize",
            "params": {
                "protocolVersion": protocol_version,
                "capabilities": [],
                "clientInfo": {"name": "raw", "version": "0.0.0"}
            }
        }))
        .await;
        self.recv_json().await
    }

    pub async fn initialized(&self) {
        self.send_json(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
            .await;
    }
}
