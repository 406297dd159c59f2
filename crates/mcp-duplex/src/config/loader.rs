//! Session configuration loading from TOML.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{Implementation, McpError, McpResult, PROTOCOL_VERSION};

/// Environment variable naming a TOML config file.
pub const CONFIG_ENV_VAR: &str = "MCP_DUPLEX_CONFIG";

const DEFAULT_HANDSHAKE_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_WRITER_CAPACITY: usize = 64;

/// Per-session settings shared by host and client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Protocol version this side speaks. Peers must match exactly.
    pub protocol_version: String,
    /// Name and version advertised in the handshake.
    pub implementation: Implementation,
    /// Instructions sent to the initiator when this side responds.
    pub instructions: Option<String>,
    /// Default timeout for typed peer calls; absent means wait until close.
    pub request_timeout_ms: Option<u64>,
    /// Upper bound on the whole handshake.
    pub handshake_timeout_ms: u64,
    /// Accept numeric strings for number-typed prompt arguments.
    pub coerce_prompt_arguments: bool,
    /// Send `notifications/cancelled` when a local call times out or is dropped.
    pub notify_on_cancel: bool,
    /// Frames queued for the stream writer before senders wait.
    pub writer_capacity: usize,
    /// Default tracing filter for binaries embedding the engine.
    pub log_level: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_string(),
            implementation: Implementation::default(),
            instructions: None,
            request_timeout_ms: None,
            handshake_timeout_ms: DEFAULT_HANDSHAKE_TIMEOUT_MS,
            coerce_prompt_arguments: true,
            notify_on_cancel: false,
            writer_capacity: DEFAULT_WRITER_CAPACITY,
            log_level: "info".to_string(),
        }
    }
}

impl SessionConfig {
    /// Default timeout applied by typed peer calls.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// Timeout for the handshake.
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    /// Builder-style override of the advertised implementation.
    pub fn with_implementation(mut self, name: &str, version: &str) -> Self {
        self.implementation = Implementation {
            name: name.to_string(),
            version: version.to_string(),
        };
        self
    }
}

/// Load a config file. Missing keys fall back to defaults.
pub fn load_config(path: &Path) -> McpResult<SessionConfig> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        McpError::Config(format!("Failed to read config {}: {e}", path.display()))
    })?;

    let config: SessionConfig = toml::from_str(&raw).map_err(|e| {
        McpError::Config(format!("Failed to parse config {}: {e}", path.display()))
    })?;

    if config.writer_capacity == 0 {
        return Err(McpError::Config(
            "writer_capacity must be at least 1".to_string(),
        ));
    }

    tracing::debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Resolve the effective config: explicit path, then `MCP_DUPLEX_CONFIG`,
/// then built-in defaults.
pub fn resolve_config(explicit: Option<&str>) -> McpResult<SessionConfig> {
    if let Some(path) = explicit {
        return load_config(Path::new(path));
    }

    match std::env::var(CONFIG_ENV_VAR) {
        Ok(path) if !path.is_empty() => load_config(Path::new(&path)),
        _ => Ok(SessionConfig::default()),
    }
}
