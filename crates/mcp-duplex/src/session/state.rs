//! Session lifecycle states.

/// Where a session is in its lifecycle. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No transport attached yet.
    Disconnected,
    /// Transport attached, `initialize` exchange in progress.
    Handshaking,
    /// Handshake complete; requests flow in both directions.
    Ready,
    /// Closed locally, by the peer, or by a transport failure.
    Closed,
}

impl SessionState {
    /// Lowercase name for logs and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Handshaking => "handshaking",
            SessionState::Ready => "ready",
            SessionState::Closed => "closed",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which end of the handshake this session plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Sends `initialize`. Usually the client.
    Initiator,
    /// Answers `initialize`. Usually the host.
    Responder,
}
