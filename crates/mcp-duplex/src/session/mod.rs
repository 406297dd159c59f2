//! Session engine: one bidirectional conversation over one transport.
//!
//! Either side may issue requests once the handshake completes. The side
//! that calls [`Session::connect`] sends `initialize`; the side that calls
//! [`Session::accept`] answers it.

mod inner;
pub mod peer;
mod pending;
pub mod state;

pub use peer::Peer;
pub use state::{SessionState, Side};

use std::ops::Deref;
use std::sync::Arc;

use crate::config::SessionConfig;
use crate::protocol::{negotiation, notifications, Method};
use crate::registry::CapabilityRegistry;
use crate::transport::Transport;
use crate::types::{McpError, McpResult};

use inner::SessionInner;

/// An established session. Dereferences to [`Peer`] for outbound calls.
///
/// Dropping the session closes it.
pub struct Session {
    peer: Peer,
    inner: Arc<SessionInner>,
}

impl Session {
    /// Open a session as the initiator and run the handshake.
    ///
    /// On any handshake failure the session is closed and the error returned.
    pub async fn connect<T>(
        transport: T,
        registry: impl Into<Arc<CapabilityRegistry>>,
        config: SessionConfig,
    ) -> McpResult<Session>
    where
        T: Transport + 'static,
    {
        let inner = SessionInner::start(Side::Initiator, Arc::new(transport), registry.into(), config);
        let peer = Peer::new(Arc::clone(&inner));

        let remote = match negotiation::initiate(&peer, &inner.registry, &inner.config).await {
            Ok(remote) => remote,
            Err(e) => {
                tracing::warn!("[{}] Handshake failed: {e}", inner.id);
                inner.shutdown("handshake failed").await;
                return Err(e);
            }
        };

        let _ = inner.remote.set(remote);
        inner.transition(SessionState::Ready);

        if let Err(e) = peer.notify(notifications::INITIALIZED, None).await {
            inner.shutdown("could not acknowledge handshake").await;
            return Err(e);
        }

        tracing::info!("[{}] Session ready", inner.id);
        Ok(Session { peer, inner })
    }

    /// Open a session as the responder and wait for the initiator's handshake.
    pub async fn accept<T>(
        transport: T,
        registry: impl Into<Arc<CapabilityRegistry>>,
        config: SessionConfig,
    ) -> McpResult<Session>
    where
        T: Transport + 'static,
    {
        let inner = SessionInner::start(Side::Responder, Arc::new(transport), registry.into(), config);
        let limit = inner.config.handshake_timeout();
        let mut states = inner.subscribe();

        // The watch guard is released within this statement; holding it
        // across a later await makes the future `!Send`.
        let reached = tokio::time::timeout(
            limit,
            states.wait_for(|s| matches!(s, SessionState::Ready | SessionState::Closed)),
        )
        .await
        .ok()
        .and_then(Result::ok)
        .map(|state| *state);

        match reached {
            Some(SessionState::Ready) => Ok(Session {
                peer: Peer::new(Arc::clone(&inner)),
                inner,
            }),
            Some(_) => Err(inner
                .take_handshake_failure()
                .unwrap_or(McpError::SessionClosed)),
            None => {
                inner.shutdown("handshake timed out").await;
                Err(McpError::RequestTimeout {
                    method: Method::Initialize.to_string(),
                    timeout_ms: inner.config.handshake_timeout_ms,
                })
            }
        }
    }

    /// Handle for outbound calls that can outlive this borrow.
    pub fn peer(&self) -> Peer {
        self.peer.clone()
    }

    /// Which end of the handshake this session played.
    pub fn side(&self) -> Side {
        self.inner.side
    }

    /// Close the session. Pending outbound calls fail with `SessionClosed`;
    /// inbound handlers already running are allowed to finish. Idempotent.
    pub async fn close(&self) {
        self.inner.shutdown("closed locally").await;
    }

    /// Resolve once the session is closed, for whatever reason.
    pub async fn closed(&self) {
        let mut states = self.inner.subscribe();
        let _ = states.wait_for(|s| *s == SessionState::Closed).await;
    }
}

impl Deref for Session {
    type Target = Peer;

    fn deref(&self) -> &Peer {
        &self.peer
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.inner.mark_closed("session dropped") {
            self.inner.close_transport_in_background();
        }
    }
}
