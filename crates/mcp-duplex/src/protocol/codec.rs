//! Frame codec: one JSON-RPC message per frame.

use crate::types::{JsonRpcMessage, McpError, McpResult};

/// Serialize a message into a single compact JSON frame.
///
/// Compact output never contains a raw newline, so frames are safe for
/// line-delimited transports.
pub fn encode(message: &JsonRpcMessage) -> McpResult<Vec<u8>> {
    serde_json::to_vec(message).map_err(|e| McpError::DecodeError(format!("encode failed: {e}")))
}

/// Parse one frame into a message.
///
/// Frames that are not valid JSON or match no message shape yield
/// `DecodeError`; the caller decides whether to drop the frame.
pub fn decode(frame: &[u8]) -> McpResult<JsonRpcMessage> {
    serde_json::from_slice(frame).map_err(|e| McpError::DecodeError(e.to_string()))
}
