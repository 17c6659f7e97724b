//! Transport session state machine.
//!
//! A [`Session`] wraps exactly one transport connection and tracks its
//! lifecycle as an explicit state machine:
//!
//! ```text
//! Idle -> Connecting -> Open -> Closed
//!              |          |
//!              +-> Failed <+
//! ```
//!
//! The transport itself is opaque: anything implementing [`Transport`] with
//! reliable ordered delivery works. The session never retries; a failed or
//! closed session stays that way and the user re-initiates.

use crate::error::Result;
use crate::protocol::Message;
use crate::DEFAULT_PEER_NAME;

/// Lifecycle state of a transport session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No connection attempted yet
    Idle,
    /// Underlying handshake in progress
    Connecting,
    /// Channel established, messages flow
    Open,
    /// Closed by either side
    Closed,
    /// Collaborator reported an error; no automatic retry
    Failed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Connecting => write!(f, "connecting"),
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// The opaque transport collaborator.
///
/// Implementations must deliver messages reliably and in send order; the
/// protocol performs no sequencing of its own.
pub trait Transport {
    /// Send one protocol message to the peer.
    fn send(&mut self, message: &Message) -> Result<()>;

    /// Close the connection. Idempotent.
    fn close(&mut self);

    /// The remote endpoint's identifier, as assigned by the signaling
    /// collaborator.
    fn remote_id(&self) -> &str;
}

/// Lifecycle notification from the transport collaborator.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Handshake completed; the channel is open
    Opened,
    /// A protocol message arrived
    Data(Message),
    /// The peer closed the connection
    Closed,
    /// The collaborator reported an error
    Error(String),
}

/// One peer connection and its lifecycle state.
pub struct Session {
    transport: Box<dyn Transport>,
    state: SessionState,
    remote_name: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("remote_id", &self.transport.remote_id())
            .field("state", &self.state)
            .field("remote_name", &self.remote_name)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Start an outbound session over a freshly initiated transport.
    pub fn connect(transport: Box<dyn Transport>) -> Self {
        tracing::debug!(remote = transport.remote_id(), "connecting to peer");
        Self {
            transport,
            state: SessionState::Connecting,
            remote_name: DEFAULT_PEER_NAME.to_string(),
        }
    }

    /// Adopt an inbound connection. The session still waits for the
    /// collaborator's open notification before messages flow.
    pub fn accept(transport: Box<dyn Transport>) -> Self {
        tracing::debug!(remote = transport.remote_id(), "accepting inbound peer");
        Self::connect(transport)
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the channel is open for sending.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self.state, SessionState::Open)
    }

    /// The remote endpoint's transport identifier.
    #[must_use]
    pub fn remote_id(&self) -> &str {
        self.transport.remote_id()
    }

    /// The peer's display name, [`DEFAULT_PEER_NAME`] until announced.
    #[must_use]
    pub fn remote_name(&self) -> &str {
        &self.remote_name
    }

    /// Record the peer's announced display name.
    pub fn set_remote_name(&mut self, name: &str) {
        self.remote_name = name.to_string();
    }

    /// Send a message if the session is open.
    ///
    /// Not-open sessions and transport failures are silent no-ops; returns
    /// whether the message was handed to the transport. An in-flight file
    /// send against a closed session degrades to a stream of no-ops rather
    /// than an error.
    pub fn send(&mut self, message: &Message) -> bool {
        if !self.is_open() {
            return false;
        }
        match self.transport.send(message) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(kind = message.kind(), "send dropped: {e}");
                false
            }
        }
    }

    /// Handshake completed: `Connecting -> Open`.
    pub fn mark_open(&mut self) {
        if self.state == SessionState::Connecting {
            self.state = SessionState::Open;
        } else {
            tracing::debug!(state = %self.state, "ignoring open notification");
        }
    }

    /// Remote closure or local disconnect: `-> Closed`. Resets the remote
    /// display name to its default.
    pub fn mark_closed(&mut self) {
        self.state = SessionState::Closed;
        self.remote_name = DEFAULT_PEER_NAME.to_string();
    }

    /// Collaborator-reported error: `Connecting | Open -> Failed`.
    pub fn mark_failed(&mut self) {
        if matches!(self.state, SessionState::Connecting | SessionState::Open) {
            self.state = SessionState::Failed;
        }
    }

    /// Close the transport and mark the session closed.
    pub fn disconnect(&mut self) {
        self.transport.close();
        self.mark_closed();
    }
}
