//! Outstanding outbound requests awaiting a response.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use serde_json::Value;
use tokio::sync::oneshot;

use crate::types::{McpError, McpResult, RequestId};

/// Receiving half handed back to the caller of [`PendingRequests::register`].
pub(crate) type Outcome = oneshot::Receiver<McpResult<Value>>;

struct PendingRequest {
    method: String,
    issued_at: Instant,
    responder: oneshot::Sender<McpResult<Value>>,
}

#[derive(Default)]
struct PendingTable {
    entries: HashMap<RequestId, PendingRequest>,
    closed: bool,
}

/// Correlation table for one session. Each entry resolves at most once.
#[derive(Default)]
pub(crate) struct PendingRequests {
    table: Mutex<PendingTable>,
}

impl PendingRequests {
    /// Track a new request. Fails once the table has been closed.
    pub(crate) fn register(&self, id: RequestId, method: &str) -> McpResult<Outcome> {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        if table.closed {
            return Err(McpError::SessionClosed);
        }

        let (responder, outcome) = oneshot::channel();
        table.entries.insert(
            id,
            PendingRequest {
                method: method.to_string(),
                issued_at: Instant::now(),
                responder,
            },
        );
        Ok(outcome)
    }

    /// Complete a request. Returns false when the id is unknown or already
    /// finished (late responses land here).
    pub(crate) fn resolve(&self, id: &RequestId, outcome: McpResult<Value>) -> bool {
        let entry = self
            .table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .remove(id);

        match entry {
            Some(pending) => {
                tracing::debug!(
                    "Request {id} ({}) completed in {:?}",
                    pending.method,
                    pending.issued_at.elapsed()
                );
                // The caller may have stopped waiting; nothing to do then.
                let _ = pending.responder.send(outcome);
                true
            }
            None => false,
        }
    }

    /// Forget a request the caller gave up on. Returns whether it was still pending.
    pub(crate) fn discard(&self, id: &RequestId) -> bool {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .remove(id)
            .is_some()
    }

    /// Fail everything with `SessionClosed` and refuse new entries.
    pub(crate) fn fail_all(&self) -> usize {
        let drained: Vec<PendingRequest> = {
            let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
            table.closed = true;
            table.entries.drain().map(|(_, pending)| pending).collect()
        };

        let count = drained.len();
        for pending in drained {
            let _ = pending.responder.send(Err(McpError::SessionClosed));
        }
        count
    }

    /// Number of requests still awaiting a response.
    pub(crate) fn len(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }
}
