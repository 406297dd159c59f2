//! Capability negotiation during the `initialize` handshake.

use crate::config::SessionConfig;
use crate::registry::CapabilityRegistry;
use crate::session::Peer;
use crate::types::{InitializeParams, InitializeResult, McpError, McpResult, PeerInfo};

use super::method::Method;

/// Reject any version other than our own; there is no downgrade path.
pub fn check_version(local: &str, remote: &str) -> McpResult<()> {
    if local != remote {
        return Err(McpError::IncompatibleVersion(format!(
            "local side speaks {local}, peer speaks {remote}"
        )));
    }
    Ok(())
}

/// Responder half: validate the initiator's request and build our answer.
pub(crate) fn respond(
    params: InitializeParams,
    registry: &CapabilityRegistry,
    config: &SessionConfig,
) -> McpResult<(InitializeResult, PeerInfo)> {
    check_version(&config.protocol_version, &params.protocol_version)?;

    tracing::info!(
        "Initialize from {} v{} ({} capabilities declared)",
        params.client_info.name,
        params.client_info.version,
        params.capabilities.len()
    );

    let result = InitializeResult {
        protocol_version: config.protocol_version.clone(),
        capabilities: registry.descriptors(),
        server_info: config.implementation.clone(),
        instructions: config.instructions.clone(),
    };

    Ok((result, PeerInfo::from(params)))
}

/// Initiator half: send `initialize` and accept the result.
///
/// The caller must mark the session Ready before it sends the
/// `notifications/initialized` acknowledgement.
pub(crate) async fn initiate(
    peer: &Peer,
    registry: &CapabilityRegistry,
    config: &SessionConfig,
) -> McpResult<PeerInfo> {
    let params = InitializeParams {
        protocol_version: config.protocol_version.clone(),
        capabilities: registry.descriptors(),
        client_info: config.implementation.clone(),
    };
    let params = serde_json::to_value(params)
        .map_err(|e| McpError::InvalidParams(format!("initialize params: {e}")))?;

    let value = peer
        .call(Method::Initialize, Some(params), Some(config.handshake_timeout()))
        .await?;

    let result: InitializeResult = serde_json::from_value(value)
        .map_err(|e| McpError::DecodeError(format!("invalid initialize result: {e}")))?;

    check_version(&config.protocol_version, &result.protocol_version)?;

    tracing::info!(
        "Initialized with {} v{} ({} capabilities declared)",
        result.server_info.name,
        result.server_info.version,
        result.capabilities.len()
    );

    Ok(PeerInfo::from(result))
}
