//! Interactive loopback chat demo.
//!
//! Joins two chat cores over an in-process transport pair: the local side
//! is driven by stdin, the other side is an echo peer that answers every
//! message and saves every received file. All five protocol message kinds
//! cross the pair in their wire form.
//!
//! Input lines starting with `/` are commands:
//!
//! - `/name <name>` - change and announce the display name
//! - `/send <path>` - send a file in 64 KiB chunks
//! - `/history` - show the persisted message log
//! - `/quit` - disconnect and exit

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use peerlink_core::controller::{ChatController, UiEvent};
use peerlink_core::history::HistoryStore;
use peerlink_core::identity::IdentityManager;
use peerlink_core::memory;
use peerlink_core::storage::{FileStore, KeyValueStore, MemoryStore};
use peerlink_core::transfer::format_bytes;

use super::ChatArgs;

/// Run the loopback demo.
pub async fn run(args: ChatArgs) -> Result<()> {
    let config = super::load_config();

    let identity_store = super::open_store(super::IDENTITY_STORE)?;
    let history_store = super::open_store(super::HISTORY_STORE)?;
    let history_cap = if config.history.enabled {
        config.history.max_entries
    } else {
        0
    };
    let mut local = ChatController::new(
        IdentityManager::new(identity_store),
        HistoryStore::with_cap(history_store, history_cap),
    );
    if let Some(name) = args.name.or(config.general.display_name) {
        local.set_name(&name);
    }

    let mut peer_identity = MemoryStore::new();
    peer_identity
        .set("username", &args.peer_name)
        .context("seeding echo peer identity")?;
    let mut peer = ChatController::new(
        IdentityManager::new(peer_identity),
        HistoryStore::open(MemoryStore::new()),
    );

    let (left, right) = memory::pair("local", "echo");
    let local_inbox = left.events();
    let peer_inbox = right.events();
    local.connect(Box::new(left));
    peer.accept_incoming(Box::new(right));

    println!("You are {}. Type a message, or /quit to leave.", local.display_name());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(Duration::from_millis(250));

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    break;
                };
                if !handle_input(&mut local, &line)? {
                    break;
                }
            }
            Ok(event) = local_inbox.recv_async() => {
                for ui in local.handle_event(event) {
                    render(&ui);
                }
            }
            Ok(event) = peer_inbox.recv_async() => {
                let reactions: Vec<UiEvent> = peer.handle_event(event);
                react_as_peer(&mut peer, &reactions)?;
            }
            _ = ticker.tick() => {
                if let Some(ui) = local.poll_typing(Instant::now()) {
                    render(&ui);
                }
            }
        }
    }

    local.disconnect();
    println!("Bye.");
    Ok(())
}

/// Dispatch one input line. Returns `false` to exit.
fn handle_input(
    local: &mut ChatController<FileStore, FileStore>,
    line: &str,
) -> Result<bool> {
    let trimmed = line.trim();
    match trimmed.split_once(' ') {
        _ if trimmed == "/quit" => return Ok(false),
        _ if trimmed == "/history" => {
            for record in local.history().records() {
                println!(
                    "  {} [{}] {}",
                    record.timestamp.format("%H:%M:%S"),
                    record.author,
                    record.body
                );
            }
        }
        Some(("/name", name)) => {
            local.set_name(name);
            println!("You are now {}.", local.display_name());
        }
        Some(("/send", path)) => send_file(local, Path::new(path.trim()))?,
        _ => {
            // One typing signal per burst, then the message itself.
            local.note_input(trimmed);
            if !local.send_text(trimmed) {
                println!("(not connected; message dropped)");
            }
        }
    }
    Ok(true)
}

fn send_file(local: &mut ChatController<FileStore, FileStore>, path: &Path) -> Result<()> {
    let size = std::fs::metadata(path)
        .with_context(|| format!("cannot stat {}", path.display()))?
        .len();
    let name = path
        .file_name()
        .map_or_else(|| "file".to_string(), |n| n.to_string_lossy().to_string());
    let reader = std::fs::File::open(path)
        .with_context(|| format!("cannot open {}", path.display()))?;

    println!("Sending {name} ({})", format_bytes(size));
    let sent = local.send_file(&name, size, reader, |ratio| {
        print!("\r  {:.0}%", ratio * 100.0);
    })?;
    println!();
    if !sent {
        println!("(not connected; file not sent)");
    }
    Ok(())
}

/// The echo peer's behavior: answer text, save files.
fn react_as_peer(
    peer: &mut ChatController<MemoryStore, MemoryStore>,
    events: &[UiEvent],
) -> Result<()> {
    for event in events {
        match event {
            UiEvent::MessageReceived { body, .. } => {
                peer.send_text(&format!("you said: {body}"));
            }
            UiEvent::FileReceived { name, data } => {
                let target = std::env::temp_dir().join(format!("peerlink-{name}"));
                std::fs::write(&target, data)
                    .with_context(|| format!("saving {}", target.display()))?;
                println!("* {} saved {} to {}", peer.remote_name(), name, target.display());
            }
            _ => {}
        }
    }
    Ok(())
}

fn render(event: &UiEvent) {
    match event {
        UiEvent::StatusChanged(state) => println!("* status: {state}"),
        UiEvent::SystemNotice(text) => println!("* {text}"),
        UiEvent::MessageReceived { author, body } => println!("[{author}] {body}"),
        UiEvent::PeerTyping(true) => println!("* peer is typing..."),
        UiEvent::PeerTyping(false) => {}
        UiEvent::TransferProgress(ratio) => {
            tracing::debug!("transfer at {:.0}%", ratio * 100.0);
        }
        UiEvent::FileReceived { name, .. } => println!("* received file {name}"),
    }
}
