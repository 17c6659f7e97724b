//! Error types for Peerlink.
//!
//! This module provides a unified error type for all Peerlink operations,
//! with specific variants for the different failure modes. Persistence
//! failures are deliberately non-fatal throughout the crate: call sites
//! catch them, log, and continue (see [`Error::is_storage`]).

use std::io;

use thiserror::Error;

/// A specialized `Result` type for Peerlink operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for Peerlink.
#[derive(Error, Debug)]
pub enum Error {
    /// The transport channel is closed; the peer is gone
    #[error("transport channel closed")]
    ChannelClosed,

    /// Invalid or unrecognized protocol message
    #[error("invalid protocol message: {0}")]
    Protocol(String),

    /// Persistence quota exhausted
    #[error("storage quota exceeded: {0}")]
    StorageFull(String),

    /// Persistence backend failure
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration file error
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Returns whether this is a persistence error.
    ///
    /// Persistence errors degrade a single history entry or setting, never
    /// the session; callers log them and carry on.
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::StorageFull(_) | Self::Storage(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
