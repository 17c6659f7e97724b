//! Top-level chat orchestration.
//!
//! [`ChatController`] owns all session state explicitly: the identity
//! manager, the history store, the (at most one) active session, the
//! typing debounce/expiry state, and the (at most one) in-flight incoming
//! file buffer. UI-facing operations come in as method calls; everything a
//! front end needs to render comes back out as [`UiEvent`]s.
//!
//! The controller is single-threaded and callback-driven: the transport
//! collaborator's notifications are fed through
//! [`handle_event`](ChatController::handle_event), and timer-driven state
//! (the 2-second peer-typing expiry) is advanced by polling
//! [`poll_typing`](ChatController::poll_typing) with the current instant.

use std::io::Read;
use std::time::Instant;

use crate::error::Result;
use crate::history::{HistoryStore, MessageRecord};
use crate::identity::IdentityManager;
use crate::protocol::Message;
use crate::session::{Session, SessionEvent, SessionState, Transport};
use crate::storage::KeyValueStore;
use crate::transfer::{format_bytes, IncomingFile, OutgoingFile};
use crate::TYPING_EXPIRY;

/// Author label for locally produced history records.
pub const LOCAL_AUTHOR: &str = "You";

/// Something a front end should render.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// The session moved to a new lifecycle state
    StatusChanged(SessionState),
    /// A system notice line ("Peer disconnected.", error text, ...)
    SystemNotice(String),
    /// A chat message arrived from the peer
    MessageReceived {
        /// The peer's display name at receipt time
        author: String,
        /// Message text
        body: String,
    },
    /// The peer-typing indicator changed
    PeerTyping(bool),
    /// File transfer progress in `[0.0, 1.0]`, either direction
    TransferProgress(f64),
    /// An incoming file finished reassembly
    FileReceived {
        /// File name as announced by the sender
        name: String,
        /// Reassembled bytes; the stable handle, produced once per transfer
        data: Vec<u8>,
    },
}

/// Orchestrates one chat: identity, history, session, typing, transfer.
pub struct ChatController<I: KeyValueStore, H: KeyValueStore> {
    identity: IdentityManager<I>,
    history: HistoryStore<H>,
    display_name: String,
    session: Option<Session>,
    incoming: Option<IncomingFile>,
    typing_sent: bool,
    peer_typing_until: Option<Instant>,
}

impl<I: KeyValueStore, H: KeyValueStore> ChatController<I, H> {
    /// Build a controller over the given identity and history stores.
    ///
    /// The display name is resolved once at construction (persisted name or
    /// a fresh generated one).
    pub fn new(identity: IdentityManager<I>, history: HistoryStore<H>) -> Self {
        let display_name = identity.get_or_create();
        Self {
            identity,
            history,
            display_name,
            session: None,
            incoming: None,
            typing_sent: false,
            peer_typing_until: None,
        }
    }

    /// Our current display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// The history store.
    #[must_use]
    pub fn history(&self) -> &HistoryStore<H> {
        &self.history
    }

    /// The history store, mutably (for `clear`).
    pub fn history_mut(&mut self) -> &mut HistoryStore<H> {
        &mut self.history
    }

    /// Current session state, `Idle` when no session exists.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.session
            .as_ref()
            .map_or(SessionState::Idle, Session::state)
    }

    /// The peer's display name, default until announced.
    #[must_use]
    pub fn remote_name(&self) -> &str {
        self.session
            .as_ref()
            .map_or(crate::DEFAULT_PEER_NAME, Session::remote_name)
    }

    /// Whether the peer-typing indicator is currently lit.
    #[must_use]
    pub fn peer_typing(&self, now: Instant) -> bool {
        self.peer_typing_until.is_some_and(|until| now < until)
    }

    /// Initiate an outbound session. Any existing session is closed first;
    /// at most one survives.
    pub fn connect(&mut self, transport: Box<dyn Transport>) -> Vec<UiEvent> {
        self.replace_session(Session::connect(transport))
    }

    /// Adopt an inbound connection, closing any existing session first
    /// (last-writer-wins).
    pub fn accept_incoming(&mut self, transport: Box<dyn Transport>) -> Vec<UiEvent> {
        self.replace_session(Session::accept(transport))
    }

    fn replace_session(&mut self, session: Session) -> Vec<UiEvent> {
        if let Some(old) = self.session.as_mut() {
            tracing::debug!(remote = old.remote_id(), "replacing active session");
            old.disconnect();
        }
        self.incoming = None;
        self.typing_sent = false;
        self.peer_typing_until = None;
        self.session = Some(session);
        vec![UiEvent::StatusChanged(SessionState::Connecting)]
    }

    /// Tear down the active session, discarding any in-flight incoming
    /// file.
    pub fn disconnect(&mut self) -> Vec<UiEvent> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        session.disconnect();
        self.incoming = None;
        self.typing_sent = false;
        self.peer_typing_until = None;
        vec![UiEvent::StatusChanged(SessionState::Closed)]
    }

    /// Send a chat message.
    ///
    /// Empty input or a session that is not open is a silent no-op: no
    /// history entry, no error. Returns whether the message went out.
    pub fn send_text(&mut self, text: &str) -> bool {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return false;
        }
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if !session.send(&Message::Text(trimmed.to_string())) {
            return false;
        }
        self.history
            .append(MessageRecord::text(LOCAL_AUTHOR, trimmed));
        // Input is now empty; the next non-empty input is a fresh burst.
        self.typing_sent = false;
        true
    }

    /// Note the current content of the message input, sending at most one
    /// typing signal per burst of non-empty input.
    ///
    /// The burst flag resets when the input becomes empty (or via
    /// [`input_blurred`](Self::input_blurred)); only then will a new burst
    /// signal again.
    pub fn note_input(&mut self, input: &str) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.is_open() {
            return;
        }
        if input.trim().is_empty() {
            self.typing_sent = false;
        } else if !self.typing_sent && session.send(&Message::Typing) {
            self.typing_sent = true;
        }
    }

    /// The message input lost focus; the next non-empty input starts a new
    /// burst.
    pub fn input_blurred(&mut self) {
        self.typing_sent = false;
    }

    /// Persist a new display name and announce it to an open peer.
    pub fn set_name(&mut self, name: &str) {
        let effective = self.identity.set(name);
        self.display_name = effective;
        if let Some(session) = self.session.as_mut() {
            session.send(&Message::Username {
                name: self.display_name.clone(),
            });
        }
    }

    /// Send a file: one `file-meta` announcement, then sequential 64 KiB
    /// chunks, each read only after the previous one was handed to the
    /// transport. Progress is reported after every chunk.
    ///
    /// Without an open session this is a no-op returning `Ok(false)`; read
    /// failures propagate.
    pub fn send_file<R: Read>(
        &mut self,
        name: &str,
        size: u64,
        reader: R,
        mut on_progress: impl FnMut(f64),
    ) -> Result<bool> {
        let Some(session) = self.session.as_mut() else {
            return Ok(false);
        };
        if !session.is_open() {
            return Ok(false);
        }

        let mut outgoing = OutgoingFile::new(name, size, reader);
        session.send(&outgoing.meta());
        while let Some(chunk) = outgoing.next_chunk()? {
            // A session closed mid-transfer turns the rest into no-ops;
            // the loop still drains the reader, matching the original.
            session.send(&chunk);
            on_progress(outgoing.progress());
        }

        self.history
            .append(MessageRecord::file(LOCAL_AUTHOR, name));
        Ok(true)
    }

    /// Feed one transport notification through the controller.
    pub fn handle_event(&mut self, event: SessionEvent) -> Vec<UiEvent> {
        let Some(session) = self.session.as_mut() else {
            // Stale notification from a replaced session.
            return Vec::new();
        };
        match event {
            SessionEvent::Opened => {
                session.mark_open();
                session.send(&Message::Username {
                    name: self.display_name.clone(),
                });
                vec![
                    UiEvent::StatusChanged(SessionState::Open),
                    UiEvent::SystemNotice(format!("Connected to {}", session.remote_id())),
                ]
            }
            SessionEvent::Data(message) => self.handle_message(message),
            SessionEvent::Closed => {
                session.mark_closed();
                self.incoming = None;
                self.typing_sent = false;
                self.peer_typing_until = None;
                vec![
                    UiEvent::StatusChanged(SessionState::Closed),
                    UiEvent::SystemNotice("Peer disconnected.".to_string()),
                    UiEvent::PeerTyping(false),
                ]
            }
            SessionEvent::Error(text) => {
                // An error after close must not resurrect a Failed status.
                session.mark_failed();
                vec![
                    UiEvent::StatusChanged(session.state()),
                    UiEvent::SystemNotice(format!("Connection error: {text}")),
                ]
            }
        }
    }

    fn handle_message(&mut self, message: Message) -> Vec<UiEvent> {
        match message {
            Message::Username { name } => {
                if let Some(session) = self.session.as_mut() {
                    session.set_remote_name(&name);
                }
                vec![UiEvent::SystemNotice(format!("{name} connected"))]
            }
            Message::Typing => {
                self.peer_typing_until = Some(Instant::now() + TYPING_EXPIRY);
                vec![UiEvent::PeerTyping(true)]
            }
            Message::Text(body) => {
                self.peer_typing_until = None;
                let author = self.remote_name().to_string();
                self.history.append(MessageRecord::text(&author, &body));
                vec![
                    UiEvent::PeerTyping(false),
                    UiEvent::MessageReceived { author, body },
                ]
            }
            Message::FileMeta { name, size } => {
                let mut incoming = IncomingFile::new(name.clone(), size);
                let mut events = vec![
                    UiEvent::SystemNotice(format!(
                        "Receiving file: {name} ({})",
                        format_bytes(size)
                    )),
                    UiEvent::TransferProgress(0.0),
                ];
                // Zero-byte files never see a chunk.
                if let Some(completed) = incoming.take_empty() {
                    events.extend(self.finish_incoming(completed));
                } else {
                    self.incoming = Some(incoming);
                }
                events
            }
            Message::FileChunk { data } => {
                let Some(incoming) = self.incoming.as_mut() else {
                    // No open assembly buffer; dropped by design.
                    tracing::debug!(bytes = data.len(), "dropping chunk without file-meta");
                    return Vec::new();
                };
                let completed = incoming.push(data);
                let mut events = vec![UiEvent::TransferProgress(incoming.progress())];
                if let Some(completed) = completed {
                    self.incoming = None;
                    events.extend(self.finish_incoming(completed));
                }
                events
            }
        }
    }

    fn finish_incoming(&mut self, completed: crate::transfer::CompletedFile) -> Vec<UiEvent> {
        let author = self.remote_name().to_string();
        self.history
            .append(MessageRecord::file(&author, &completed.name));
        vec![UiEvent::FileReceived {
            name: completed.name,
            data: completed.data,
        }]
    }

    /// Advance the typing-expiry timer. Returns `PeerTyping(false)` once
    /// when a lit indicator expires.
    pub fn poll_typing(&mut self, now: Instant) -> Option<UiEvent> {
        match self.peer_typing_until {
            Some(until) if now >= until => {
                self.peer_typing_until = None;
                Some(UiEvent::PeerTyping(false))
            }
            _ => None,
        }
    }
}
