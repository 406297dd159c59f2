//! Transport layer: duplex frame channels the session runs over.
//!
//! A transport moves opaque frames. Frames in one direction arrive in the
//! order they were sent; the two directions are independent.

pub mod memory;
pub mod stream;

pub use memory::MemoryTransport;
pub use stream::StreamTransport;

use async_trait::async_trait;

use crate::types::McpResult;

/// A reliable, ordered, bidirectional frame channel.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Queue one frame for the peer. Fails with `TransportError` once the
    /// connection is gone.
    async fn send(&self, frame: Vec<u8>) -> McpResult<()>;

    /// Next frame from the peer. Fails with `TransportClosed` after either
    /// side closed. Only one task may receive at a time.
    async fn receive(&self) -> McpResult<Vec<u8>>;

    /// Close the channel. Idempotent; unblocks a pending `receive`.
    async fn close(&self);
}
