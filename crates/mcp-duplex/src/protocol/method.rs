//! The closed set of request methods and notification names.

use std::str::FromStr;

use crate::types::{CapabilityKind, McpError};

/// Every request method the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Initialize,
    Ping,
    ToolsList,
    ToolsCall,
    ResourcesList,
    ResourceTemplatesList,
    ResourcesRead,
    PromptsList,
    PromptsGet,
    RootsList,
    SamplingCreateMessage,
    ElicitationCreate,
}

impl Method {
    /// All methods, in wire-table order.
    pub const ALL: [Method; 12] = [
        Method::Initialize,
        Method::Ping,
        Method::ToolsList,
        Method::ToolsCall,
        Method::ResourcesList,
        Method::ResourceTemplatesList,
        Method::ResourcesRead,
        Method::PromptsList,
        Method::PromptsGet,
        Method::RootsList,
        Method::SamplingCreateMessage,
        Method::ElicitationCreate,
    ];

    /// Wire name of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Initialize => "initialize",
            Method::Ping => "ping",
            Method::ToolsList => "tools/list",
            Method::ToolsCall => "tools/call",
            Method::ResourcesList => "resources/list",
            Method::ResourceTemplatesList => "resources/templates/list",
            Method::ResourcesRead => "resources/read",
            Method::PromptsList => "prompts/list",
            Method::PromptsGet => "prompts/get",
            Method::RootsList => "roots/list",
            Method::SamplingCreateMessage => "sampling/createMessage",
            Method::ElicitationCreate => "elicitation/create",
        }
    }

    /// Look up a method by wire name; unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == name)
    }

    /// The capability the receiving side must have registered to serve this.
    pub fn required_capability(&self) -> Option<CapabilityKind> {
        match self {
            Method::Initialize | Method::Ping => None,
            Method::ToolsList | Method::ToolsCall => Some(CapabilityKind::Tool),
            Method::ResourcesList | Method::ResourceTemplatesList | Method::ResourcesRead => {
                Some(CapabilityKind::Resource)
            }
            Method::PromptsList | Method::PromptsGet => Some(CapabilityKind::Prompt),
            Method::RootsList => Some(CapabilityKind::Roots),
            Method::SamplingCreateMessage => Some(CapabilityKind::Sampling),
            Method::ElicitationCreate => Some(CapabilityKind::Elicitation),
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = McpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::parse(s).ok_or_else(|| McpError::MethodNotFound(s.to_string()))
    }
}

/// Notification names.
pub mod notifications {
    /// Sent by the initiator once it accepted the handshake result.
    pub const INITIALIZED: &str = "notifications/initialized";
    /// Either side abandons a request it issued.
    pub const CANCELLED: &str = "notifications/cancelled";
    /// The client's roots changed.
    pub const ROOTS_LIST_CHANGED: &str = "notifications/roots/list_changed";
}
