//! Error taxonomy shared by both sides of a session, with JSON-RPC code mapping.

use serde_json::Value;

use super::message::{JsonRpcError, JsonRpcErrorObject, RequestId};

/// Standard JSON-RPC 2.0 error codes.
pub mod error_codes {
    /// Invalid JSON was received.
    pub const PARSE_ERROR: i32 = -32700;
    /// The JSON sent is not a valid request object.
    pub const INVALID_REQUEST: i32 = -32600;
    /// The method does not exist or is not available.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid method parameters.
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal JSON-RPC error.
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// Protocol-specific codes in the implementation-defined server error range.
pub mod mcp_error_codes {
    /// A registered handler raised an error or panicked.
    pub const HANDLER_ERROR: i32 = -32000;
    /// The request did not complete within its deadline.
    pub const REQUEST_TIMEOUT: i32 = -32001;
    /// The session has not completed its handshake.
    pub const NOT_READY: i32 = -32002;
    /// The peers could not agree on a protocol version.
    pub const INCOMPATIBLE_VERSION: i32 = -32003;
    /// The session is closed.
    pub const SESSION_CLOSED: i32 = -32004;
    /// The underlying channel failed.
    pub const TRANSPORT_ERROR: i32 = -32005;
    /// No tool with the requested name.
    pub const TOOL_NOT_FOUND: i32 = -32010;
    /// No resource matches the requested URI.
    pub const RESOURCE_NOT_FOUND: i32 = -32011;
    /// No prompt with the requested name.
    pub const PROMPT_NOT_FOUND: i32 = -32012;
}

/// Errors raised anywhere in the session engine.
#[derive(Debug, thiserror::Error)]
pub enum McpError {
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Handler error: {0}")]
    HandlerError(String),

    #[error("Session not ready: {0}")]
    NotReady(String),

    #[error("Incompatible protocol version: {0}")]
    IncompatibleVersion(String),

    #[error("Request '{method}' timed out after {timeout_ms}ms")]
    RequestTimeout { method: String, timeout_ms: u64 },

    #[error("Session closed")]
    SessionClosed,

    #[error("Decode error: {0}")]
    DecodeError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Prompt not found: {0}")]
    PromptNotFound(String),

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Transport closed")]
    TransportClosed,

    #[error("Peer error {code}: {message}")]
    Remote { code: i32, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type McpResult<T> = Result<T, McpError>;

impl McpError {
    /// The JSON-RPC error code for this error.
    pub fn code(&self) -> i32 {
        use error_codes::*;
        use mcp_error_codes::*;

        match self {
            McpError::MethodNotFound(_) => METHOD_NOT_FOUND,
            McpError::InvalidParams(_) => INVALID_PARAMS,
            McpError::HandlerError(_) => HANDLER_ERROR,
            McpError::NotReady(_) => NOT_READY,
            McpError::IncompatibleVersion(_) => INCOMPATIBLE_VERSION,
            McpError::RequestTimeout { .. } => REQUEST_TIMEOUT,
            McpError::SessionClosed => SESSION_CLOSED,
            McpError::DecodeError(_) => PARSE_ERROR,
            McpError::InvalidRequest(_) => INVALID_REQUEST,
            McpError::ToolNotFound(_) => TOOL_NOT_FOUND,
            McpError::ResourceNotFound(_) => RESOURCE_NOT_FOUND,
            McpError::PromptNotFound(_) => PROMPT_NOT_FOUND,
            McpError::TransportError(_) | McpError::TransportClosed => TRANSPORT_ERROR,
            McpError::Remote { code, .. } => *code,
            McpError::Config(_) | McpError::Io(_) => INTERNAL_ERROR,
        }
    }

    /// Build the wire error object for this error.
    pub fn to_error_object(&self) -> JsonRpcErrorObject {
        let data = match self {
            McpError::RequestTimeout { method, timeout_ms } => Some(serde_json::json!({
                "method": method,
                "timeoutMs": timeout_ms,
            })),
            _ => None,
        };

        JsonRpcErrorObject {
            code: self.code(),
            message: self.wire_message(),
            data,
        }
    }

    /// Convert into a JSON-RPC error response for the given request id.
    pub fn to_json_rpc_error(&self, id: RequestId) -> JsonRpcError {
        let mut response = JsonRpcError::new(id, 0, String::new());
        response.error = self.to_error_object();
        response
    }

    /// Map an error object received from the peer back onto the taxonomy.
    pub fn from_error_object(error: &JsonRpcErrorObject) -> Self {
        use error_codes::*;
        use mcp_error_codes::*;

        let message = error.message.clone();
        match error.code {
            METHOD_NOT_FOUND => McpError::MethodNotFound(message),
            INVALID_PARAMS => McpError::InvalidParams(message),
            HANDLER_ERROR | INTERNAL_ERROR => McpError::HandlerError(message),
            NOT_READY => McpError::NotReady(message),
            INCOMPATIBLE_VERSION => McpError::IncompatibleVersion(message),
            REQUEST_TIMEOUT => {
                let data = error.data.as_ref();
                McpError::RequestTimeout {
                    method: data
                        .and_then(|d| d.get("method"))
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    timeout_ms: data
                        .and_then(|d| d.get("timeoutMs"))
                        .and_then(Value::as_u64)
                        .unwrap_or_default(),
                }
            }
            SESSION_CLOSED => McpError::SessionClosed,
            PARSE_ERROR => McpError::DecodeError(message),
            INVALID_REQUEST => McpError::InvalidRequest(message),
            TOOL_NOT_FOUND => McpError::ToolNotFound(message),
            RESOURCE_NOT_FOUND => McpError::ResourceNotFound(message),
            PROMPT_NOT_FOUND => McpError::PromptNotFound(message),
            code => McpError::Remote { code, message },
        }
    }

    /// Errors that came from the transport rather than the protocol.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            McpError::TransportError(_) | McpError::TransportClosed | McpError::Io(_)
        )
    }

    // Variants that wrap a bare detail string travel without their display
    // prefix so the peer reconstructs the same value.
    fn wire_message(&self) -> String {
        match self {
            McpError::MethodNotFound(m)
            | McpError::InvalidParams(m)
            | McpError::HandlerError(m)
            | McpError::NotReady(m)
            | McpError::IncompatibleVersion(m)
            | McpError::DecodeError(m)
            | McpError::InvalidRequest(m)
            | McpError::ToolNotFound(m)
            | McpError::ResourceNotFound(m)
            | McpError::PromptNotFound(m) => m.clone(),
            McpError::Remote { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for McpError {
    fn from(e: serde_json::Error) -> Self {
        McpError::DecodeError(e.to_string())
    }
}
