//! Newline-delimited frames over any async byte stream (stdio, pipes, sockets).

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::Transport;
use crate::types::{McpError, McpResult};

type BoxedReader = BufReader<Box<dyn AsyncRead + Send + Unpin>>;

/// How long `close` waits for queued frames to reach the peer.
const WRITER_DRAIN_LIMIT: Duration = Duration::from_secs(1);

/// Frame channel over a byte stream, one JSON document per line.
///
/// Writes go through a single writer task fed by a bounded queue, so frames
/// from concurrent senders never interleave.
pub struct StreamTransport {
    reader: tokio::sync::Mutex<BoxedReader>,
    writer_tx: Mutex<Option<mpsc::Sender<Vec<u8>>>>,
    writer_task: Mutex<Option<JoinHandle<()>>>,
    closed: watch::Sender<bool>,
}

impl StreamTransport {
    /// Wrap a reader/writer pair. Must be called inside a tokio runtime.
    pub fn new<R, W>(reader: R, writer: W, capacity: usize) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let (writer_tx, writer_rx) = mpsc::channel(capacity.max(1));
        let writer_task = tokio::spawn(writer_loop(BufWriter::new(writer), writer_rx));

        Self {
            reader: tokio::sync::Mutex::new(BufReader::new(Box::new(reader))),
            writer_tx: Mutex::new(Some(writer_tx)),
            writer_task: Mutex::new(Some(writer_task)),
            closed: watch::channel(false).0,
        }
    }

    /// Bind process stdin/stdout.
    pub fn stdio(capacity: usize) -> Self {
        Self::new(tokio::io::stdin(), tokio::io::stdout(), capacity)
    }
}

async fn writer_loop<W: AsyncWrite + Unpin>(
    mut writer: BufWriter<W>,
    mut rx: mpsc::Receiver<Vec<u8>>,
) {
    while let Some(mut frame) = rx.recv().await {
        frame.push(b'\n');
        if let Err(e) = writer.write_all(&frame).await {
            tracing::error!("Error writing frame: {e}. Stopping writer.");
            return;
        }
        if let Err(e) = writer.flush().await {
            tracing::error!("Error flushing frame: {e}. Stopping writer.");
            return;
        }
    }

    if let Err(e) = writer.shutdown().await {
        tracing::debug!("Writer shutdown: {e}");
    }
    tracing::debug!("Frame queue closed. Writer loop exiting.");
}

#[async_trait]
impl Transport for StreamTransport {
    async fn send(&self, frame: Vec<u8>) -> McpResult<()> {
        let sender = self
            .writer_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| McpError::TransportError("transport closed locally".to_string()))?;

        sender
            .send(frame)
            .await
            .map_err(|_| McpError::TransportError("writer stopped".to_string()))
    }

    async fn receive(&self) -> McpResult<Vec<u8>> {
        let mut closed = self.closed.subscribe();
        if *closed.borrow() {
            return Err(McpError::TransportClosed);
        }

        let mut reader = self.reader.lock().await;
        loop {
            let mut line = Vec::new();
            let read = tokio::select! {
                _ = closed.wait_for(|c| *c) => return Err(McpError::TransportClosed),
                read = reader.read_until(b'\n', &mut line) => read?,
            };

            if read == 0 {
                return Err(McpError::TransportClosed);
            }

            while line.last().is_some_and(|b| *b == b'\n' || *b == b'\r') {
                line.pop();
            }
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            return Ok(line);
        }
    }

    async fn close(&self) {
        // Dropping the queue sender lets the writer flush what is queued.
        self.writer_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.closed.send_replace(true);

        let writer_task = self
            .writer_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(mut task) = writer_task else {
            return;
        };
        match tokio::time::timeout(WRITER_DRAIN_LIMIT, &mut task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("Writer task ended abnormally: {e}"),
            Err(_) => {
                tracing::warn!(
                    "Peer stopped reading; dropping unsent frames after {WRITER_DRAIN_LIMIT:?}"
                );
                task.abort();
            }
        }
    }
}
