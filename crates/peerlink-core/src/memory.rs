//! In-process transport pair.
//!
//! [`pair`] wires two [`MemoryTransport`]s back to back over flume
//! channels, giving the loopback demo and the integration tests a transport
//! collaborator with the contractual semantics: ordered reliable delivery,
//! an open notification, and closure reporting. Messages cross the pair in
//! their JSON wire form so every hop exercises the codec.

use crate::error::{Error, Result};
use crate::protocol::Message;
use crate::session::{SessionEvent, Transport};

/// One end of an in-process transport pair.
pub struct MemoryTransport {
    remote_id: String,
    outbox: flume::Sender<SessionEvent>,
    inbox: flume::Receiver<SessionEvent>,
    closed: bool,
}

/// Create a connected transport pair.
///
/// `left_id`/`right_id` are the identifiers each end reports for its peer's
/// `remote_id`. Both inboxes start with an [`SessionEvent::Opened`]
/// notification, mirroring a completed handshake.
#[must_use]
pub fn pair(left_id: &str, right_id: &str) -> (MemoryTransport, MemoryTransport) {
    let (to_left, left_inbox) = flume::unbounded();
    let (to_right, right_inbox) = flume::unbounded();

    // Handshake already done from the pair's point of view.
    let _ = to_left.send(SessionEvent::Opened);
    let _ = to_right.send(SessionEvent::Opened);

    let left = MemoryTransport {
        remote_id: right_id.to_string(),
        outbox: to_right,
        inbox: left_inbox,
        closed: false,
    };
    let right = MemoryTransport {
        remote_id: left_id.to_string(),
        outbox: to_left,
        inbox: right_inbox,
        closed: false,
    };
    (left, right)
}

impl MemoryTransport {
    /// A clone of this end's event receiver, for driving the session loop.
    #[must_use]
    pub fn events(&self) -> flume::Receiver<SessionEvent> {
        self.inbox.clone()
    }
}

impl Transport for MemoryTransport {
    fn send(&mut self, message: &Message) -> Result<()> {
        if self.closed {
            return Err(Error::ChannelClosed);
        }
        // Round-trip through the wire form so the codec is on the path.
        let frame = message.encode()?;
        let decoded = Message::decode(&frame)?;
        self.outbox
            .send(SessionEvent::Data(decoded))
            .map_err(|_| Error::ChannelClosed)
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            let _ = self.outbox.send(SessionEvent::Closed);
        }
    }

    fn remote_id(&self) -> &str {
        &self.remote_id
    }
}

impl Drop for MemoryTransport {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_starts_opened() {
        let (left, right) = pair("alice", "bob");
        assert!(matches!(
            left.events().try_recv(),
            Ok(SessionEvent::Opened)
        ));
        assert!(matches!(
            right.events().try_recv(),
            Ok(SessionEvent::Opened)
        ));
        assert_eq!(left.remote_id(), "bob");
        assert_eq!(right.remote_id(), "alice");
    }

    #[test]
    fn test_messages_cross_in_order() {
        let (mut left, right) = pair("a", "b");
        let right_events = right.events();
        let _ = right_events.try_recv(); // Opened

        left.send(&Message::Text("one".to_string())).unwrap();
        left.send(&Message::Typing).unwrap();
        left.send(&Message::Text("two".to_string())).unwrap();

        let received: Vec<SessionEvent> = right_events.try_iter().collect();
        assert_eq!(received.len(), 3);
        assert!(matches!(&received[0], SessionEvent::Data(Message::Text(t)) if t == "one"));
        assert!(matches!(&received[1], SessionEvent::Data(Message::Typing)));
        assert!(matches!(&received[2], SessionEvent::Data(Message::Text(t)) if t == "two"));
    }

    #[test]
    fn test_close_notifies_peer_and_stops_sends() {
        let (mut left, right) = pair("a", "b");
        let right_events = right.events();
        let _ = right_events.try_recv(); // Opened

        left.close();
        assert!(matches!(right_events.try_recv(), Ok(SessionEvent::Closed)));

        let err = left.send(&Message::Typing).unwrap_err();
        assert!(matches!(err, Error::ChannelClosed));
    }
}
