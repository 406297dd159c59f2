//! Capability descriptors and the initialization handshake payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol version this engine speaks by default.
pub const PROTOCOL_VERSION: &str = "2025-06-18";

/// Default implementation name advertised during the handshake.
pub const ENGINE_NAME: &str = "mcp-duplex";

/// Engine version constant.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// What a declared capability is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityKind {
    /// Host-side invocable operation.
    Tool,
    /// Host-side URI-addressed data source.
    Resource,
    /// Host-side parametrized message template.
    Prompt,
    /// Client-side generation callback.
    Sampling,
    /// Client-side user-input callback.
    Elicitation,
    /// Client-side filesystem roots callback.
    Roots,
}

impl CapabilityKind {
    /// Lowercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityKind::Tool => "tool",
            CapabilityKind::Resource => "resource",
            CapabilityKind::Prompt => "prompt",
            CapabilityKind::Sampling => "sampling",
            CapabilityKind::Elicitation => "elicitation",
            CapabilityKind::Roots => "roots",
        }
    }
}

impl std::fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared capability. Immutable once the handshake completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityDescriptor {
    /// Tool/prompt name, resource URI or URI template, or the callback name.
    pub name: String,
    /// Capability kind.
    pub kind: CapabilityKind,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema of the accepted input, when the capability takes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
}

impl CapabilityDescriptor {
    /// Create a descriptor without description or schema.
    pub fn new(name: impl Into<String>, kind: CapabilityKind) -> Self {
        Self {
            name: name.into(),
            kind,
            description: None,
            input_schema: None,
        }
    }
}

/// The full set of capabilities one side declares.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilitySet {
    descriptors: Vec<CapabilityDescriptor>,
}

impl CapabilitySet {
    /// Build a set from descriptors, keeping their order.
    pub fn new(descriptors: Vec<CapabilityDescriptor>) -> Self {
        Self { descriptors }
    }

    /// Whether at least one capability of this kind was declared.
    pub fn supports(&self, kind: CapabilityKind) -> bool {
        self.descriptors.iter().any(|d| d.kind == kind)
    }

    /// Find a declared capability by kind and name.
    pub fn find(&self, kind: CapabilityKind, name: &str) -> Option<&CapabilityDescriptor> {
        self.descriptors
            .iter()
            .find(|d| d.kind == kind && d.name == name)
    }

    /// All descriptors of one kind.
    pub fn of_kind(&self, kind: CapabilityKind) -> impl Iterator<Item = &CapabilityDescriptor> {
        self.descriptors.iter().filter(move |d| d.kind == kind)
    }

    /// Iterate over every descriptor.
    pub fn iter(&self) -> impl Iterator<Item = &CapabilityDescriptor> {
        self.descriptors.iter()
    }

    /// Number of declared capabilities.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether nothing was declared.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Implementation info for either side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Implementation {
    /// Name of the implementation.
    pub name: String,
    /// Version string.
    pub version: String,
}

impl Default for Implementation {
    fn default() -> Self {
        Self {
            name: ENGINE_NAME.to_string(),
            version: ENGINE_VERSION.to_string(),
        }
    }
}

/// Initialize request parameters from the initiating side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Protocol version the initiator speaks.
    pub protocol_version: String,
    /// Initiator capabilities.
    pub capabilities: CapabilitySet,
    /// Initiator implementation info.
    pub client_info: Implementation,
}

/// Initialize response result from the responding side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    /// Protocol version the responder speaks.
    pub protocol_version: String,
    /// Responder capabilities.
    pub capabilities: CapabilitySet,
    /// Responder implementation info.
    pub server_info: Implementation,
    /// Optional instructions for the initiator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// What a session learned about its peer during the handshake.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerInfo {
    /// Negotiated protocol version.
    pub protocol_version: String,
    /// Capabilities the peer declared.
    pub capabilities: CapabilitySet,
    /// Peer implementation info.
    pub implementation: Implementation,
    /// Instructions the peer sent, if any.
    pub instructions: Option<String>,
}

impl From<InitializeParams> for PeerInfo {
    fn from(params: InitializeParams) -> Self {
        Self {
            protocol_version: params.protocol_version,
            capabilities: params.capabilities,
            implementation: params.client_info,
            instructions: None,
        }
    }
}

impl From<InitializeResult> for PeerInfo {
    fn from(result: InitializeResult) -> Self {
        Self {
            protocol_version: result.protocol_version,
            capabilities: result.capabilities,
            implementation: result.server_info,
            instructions: result.instructions,
        }
    }
}
