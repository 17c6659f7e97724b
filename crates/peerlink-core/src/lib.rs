//! # Peerlink Core Library
//!
//! `peerlink-core` implements the peer-to-peer chat core behind Peerlink:
//! session lifecycle, a small tagged message protocol multiplexed over a
//! single reliable ordered channel, chunked file transfer with progress
//! tracking, and a bounded persistent chat history.
//!
//! The transport itself is a collaborator, not part of this crate: anything
//! implementing [`session::Transport`] (a signaling library's data channel,
//! or the in-process [`memory`] pair used for tests and demos) can carry the
//! protocol. The crate performs no connection negotiation, no NAT traversal,
//! and no cryptography of its own.
//!
//! ## Modules
//!
//! - [`config`] - Configuration management
//! - [`controller`] - Top-level chat orchestration
//! - [`history`] - Bounded persistent message history
//! - [`identity`] - Display name generation and persistence
//! - [`memory`] - In-process transport pair
//! - [`protocol`] - Wire message types and codec
//! - [`session`] - Transport session state machine
//! - [`storage`] - Key-value persistence collaborator
//! - [`transfer`] - Chunked file send and reassembly
//!
//! ## Example
//!
//! ```rust,ignore
//! use peerlink_core::controller::ChatController;
//! use peerlink_core::memory;
//!
//! let (left, right) = memory::pair("alice", "bob");
//! controller.connect(Box::new(left));
//! for event in controller.handle_event(next_event) {
//!     render(event);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]

pub mod config;
pub mod controller;
pub mod error;
pub mod history;
pub mod identity;
pub mod memory;
pub mod protocol;
pub mod session;
pub mod storage;
pub mod transfer;

pub use error::{Error, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Chunk size for file transfers (64 KiB)
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Maximum number of retained history records
pub const HISTORY_CAP: usize = 100;

/// Display name shown for the remote peer until it announces one
pub const DEFAULT_PEER_NAME: &str = "Peer";

/// How long a peer-typing indicator stays lit without a fresh signal
pub const TYPING_EXPIRY: std::time::Duration = std::time::Duration::from_secs(2);
