//! mcp-duplex: bidirectional MCP session engine.
//!
//! One session runs over one duplex channel. After the `initialize`
//! handshake both sides may issue requests: the client calls host tools,
//! resources, and prompts, and the host calls back into client sampling,
//! elicitation, and roots, including from inside a request it is serving.

pub mod config;
pub mod protocol;
pub mod registry;
pub mod session;
pub mod transport;
pub mod types;

pub use config::SessionConfig;
pub use registry::{CapabilityRegistry, RegistryBuilder, RequestContext};
pub use session::{Peer, Session, SessionState};
pub use transport::{MemoryTransport, StreamTransport, Transport};
pub use types::{McpError, McpResult};
