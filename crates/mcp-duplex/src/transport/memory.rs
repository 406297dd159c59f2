//! In-process transport pair, used for embedding and tests.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use super::Transport;
use crate::types::{McpError, McpResult};

/// One end of an in-memory duplex channel.
pub struct MemoryTransport {
    outbound: Mutex<Option<mpsc::UnboundedSender<Vec<u8>>>>,
    inbound: tokio::sync::Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
    closed: watch::Sender<bool>,
}

impl MemoryTransport {
    /// Create two connected ends.
    pub fn pair() -> (MemoryTransport, MemoryTransport) {
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();
        (Self::new(a_tx, b_rx), Self::new(b_tx, a_rx))
    }

    fn new(tx: mpsc::UnboundedSender<Vec<u8>>, rx: mpsc::UnboundedReceiver<Vec<u8>>) -> Self {
        Self {
            outbound: Mutex::new(Some(tx)),
            inbound: tokio::sync::Mutex::new(rx),
            closed: watch::channel(false).0,
        }
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&self, frame: Vec<u8>) -> McpResult<()> {
        let sender = self
            .outbound
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| McpError::TransportError("transport closed locally".to_string()))?;

        sender
            .send(frame)
            .map_err(|_| McpError::TransportError("peer end dropped".to_string()))
    }

    async fn receive(&self) -> McpResult<Vec<u8>> {
        let mut closed = self.closed.subscribe();
        if *closed.borrow() {
            return Err(McpError::TransportClosed);
        }

        let mut inbound = self.inbound.lock().await;
        tokio::select! {
            _ = closed.wait_for(|c| *c) => Err(McpError::TransportClosed),
            frame = inbound.recv() => frame.ok_or(McpError::TransportClosed),
        }
    }

    async fn close(&self) {
        // Dropping our sender lets the peer drain what is queued, then EOF.
        self.outbound
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.closed.send_replace(true);
    }
}
