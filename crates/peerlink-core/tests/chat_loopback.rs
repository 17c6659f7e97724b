//! End-to-end scenarios: two controllers joined by an in-process transport
//! pair, driven the way a front end would drive them.

use std::io::Cursor;

use peerlink_core::controller::{ChatController, UiEvent};
use peerlink_core::history::HistoryStore;
use peerlink_core::identity::IdentityManager;
use peerlink_core::memory;
use peerlink_core::session::{SessionEvent, SessionState};
use peerlink_core::storage::MemoryStore;
use peerlink_core::CHUNK_SIZE;

type TestController = ChatController<MemoryStore, MemoryStore>;

fn controller(name: &str) -> TestController {
    use peerlink_core::storage::KeyValueStore;

    let mut identity_store = MemoryStore::new();
    identity_store.set("username", name).unwrap();
    ChatController::new(
        IdentityManager::new(identity_store),
        HistoryStore::open(MemoryStore::new()),
    )
}

/// Drain one side's pending transport notifications through its controller.
fn pump(controller: &mut TestController, inbox: &flume::Receiver<SessionEvent>) -> Vec<UiEvent> {
    let mut out = Vec::new();
    while let Ok(event) = inbox.try_recv() {
        out.extend(controller.handle_event(event));
    }
    out
}

/// Two controllers wired together, with both sides' opens and identity
/// announcements already exchanged.
fn connected_pair() -> (
    TestController,
    flume::Receiver<SessionEvent>,
    TestController,
    flume::Receiver<SessionEvent>,
) {
    let (left, right) = memory::pair("alice-id", "bob-id");
    let left_inbox = left.events();
    let right_inbox = right.events();

    let mut alice = controller("Alice");
    let mut bob = controller("Bob");
    alice.connect(Box::new(left));
    bob.accept_incoming(Box::new(right));

    pump(&mut alice, &left_inbox); // Opened -> announces "Alice"
    pump(&mut bob, &right_inbox); // Opened + Alice's username
    pump(&mut alice, &left_inbox); // Bob's username

    (alice, left_inbox, bob, right_inbox)
}

#[test]
fn handshake_exchanges_display_names() {
    let (alice, _, bob, _) = connected_pair();
    assert_eq!(alice.state(), SessionState::Open);
    assert_eq!(bob.state(), SessionState::Open);
    assert_eq!(alice.remote_name(), "Bob");
    assert_eq!(bob.remote_name(), "Alice");
}

#[test]
fn text_crosses_and_lands_in_both_histories() {
    let (mut alice, _alice_inbox, mut bob, bob_inbox) = connected_pair();

    assert!(alice.send_text("hello bob"));
    let events = pump(&mut bob, &bob_inbox);

    assert!(events.contains(&UiEvent::MessageReceived {
        author: "Alice".to_string(),
        body: "hello bob".to_string(),
    }));
    assert_eq!(alice.history().records().last().unwrap().body, "hello bob");
    assert_eq!(bob.history().records().last().unwrap().author, "Alice");
}

#[test]
fn typing_burst_crosses_once() {
    let (mut alice, _alice_inbox, mut bob, bob_inbox) = connected_pair();

    alice.note_input("h");
    alice.note_input("he");
    alice.note_input("hello");
    let first = pump(&mut bob, &bob_inbox);
    assert_eq!(
        first.iter().filter(|e| **e == UiEvent::PeerTyping(true)).count(),
        1
    );

    alice.note_input("");
    alice.note_input("again");
    let second = pump(&mut bob, &bob_inbox);
    assert_eq!(
        second.iter().filter(|e| **e == UiEvent::PeerTyping(true)).count(),
        1
    );
}

#[test]
fn file_crosses_byte_identical() {
    let (mut alice, _alice_inbox, mut bob, bob_inbox) = connected_pair();

    let payload: Vec<u8> = (0..150_000u32).map(|i| (i % 256) as u8).collect();
    let mut send_ratios = Vec::new();
    let ok = alice
        .send_file("blob.bin", payload.len() as u64, Cursor::new(payload.clone()), |r| {
            send_ratios.push(r);
        })
        .unwrap();
    assert!(ok);
    assert_eq!(
        send_ratios.len() as u64,
        peerlink_core::transfer::chunk_count(payload.len() as u64)
    );
    assert_eq!(send_ratios.last().copied(), Some(1.0));

    let events = pump(&mut bob, &bob_inbox);
    let received = events
        .iter()
        .find_map(|e| match e {
            UiEvent::FileReceived { name, data } => Some((name.clone(), data.clone())),
            _ => None,
        })
        .expect("file received");
    assert_eq!(received.0, "blob.bin");
    assert_eq!(received.1, payload);

    // Progress hit 1.0 exactly once, at the final chunk.
    let ratios: Vec<f64> = events
        .iter()
        .filter_map(|e| match e {
            UiEvent::TransferProgress(r) => Some(*r),
            _ => None,
        })
        .collect();
    assert!((ratios.last().unwrap() - 1.0).abs() < f64::EPSILON);
    assert_eq!(ratios.iter().filter(|r| **r >= 1.0).count(), 1);

    assert_eq!(bob.history().records().last().unwrap().body, "blob.bin");
}

#[test]
fn single_chunk_file_crosses() {
    let (mut alice, _alice_inbox, mut bob, bob_inbox) = connected_pair();

    let payload = vec![42u8; CHUNK_SIZE / 2];
    alice
        .send_file("half.bin", payload.len() as u64, Cursor::new(payload.clone()), |_| {})
        .unwrap();

    let events = pump(&mut bob, &bob_inbox);
    assert!(events.contains(&UiEvent::FileReceived {
        name: "half.bin".to_string(),
        data: payload,
    }));
}

#[test]
fn disconnect_notifies_peer_and_resets_names() {
    let (mut alice, _alice_inbox, mut bob, bob_inbox) = connected_pair();

    alice.disconnect();
    let events = pump(&mut bob, &bob_inbox);

    assert!(events.contains(&UiEvent::StatusChanged(SessionState::Closed)));
    assert_eq!(bob.state(), SessionState::Closed);
    assert_eq!(bob.remote_name(), peerlink_core::DEFAULT_PEER_NAME);

    // Sends against the closed session are silent no-ops.
    assert!(!bob.send_text("anyone there?"));
}

#[test]
fn disconnect_mid_transfer_discards_buffer() {
    let (mut alice, _alice_inbox, mut bob, bob_inbox) = connected_pair();

    // Announce a large file but deliver only part of it: the declared size
    // is four chunks, the reader holds one.
    alice
        .send_file("partial.bin", CHUNK_SIZE as u64 * 4, Cursor::new(vec![1u8; CHUNK_SIZE]), |_| {})
        .unwrap();
    pump(&mut bob, &bob_inbox);

    alice.disconnect();
    let events = pump(&mut bob, &bob_inbox);
    assert!(events.contains(&UiEvent::StatusChanged(SessionState::Closed)));

    // No FileReceived ever surfaced for the truncated transfer.
    assert!(!bob
        .history()
        .records()
        .iter()
        .any(|r| r.body == "partial.bin"));
}

#[test]
fn rename_mid_session_updates_peer() {
    let (mut alice, _alice_inbox, mut bob, bob_inbox) = connected_pair();

    alice.set_name("AliceTheBold");
    let events = pump(&mut bob, &bob_inbox);

    assert!(events.contains(&UiEvent::SystemNotice("AliceTheBold connected".to_string())));
    assert_eq!(bob.remote_name(), "AliceTheBold");
}
