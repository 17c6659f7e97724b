//! CLI command definitions and handlers.

use clap::{Parser, Subcommand};

use peerlink_core::config::Config;
use peerlink_core::storage::FileStore;

pub mod chat;
pub mod config;
pub mod history;
pub mod identity;

/// Peerlink - peer-to-peer chat over a delegated transport
#[derive(Parser)]
#[command(name = "peerlink")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand)]
pub enum Command {
    /// Run an interactive loopback chat demo
    Chat(ChatArgs),

    /// Show or clear the persisted message history
    History(HistoryArgs),

    /// Show or set the persisted display name
    Identity(IdentityArgs),

    /// Show the configuration
    Config(ConfigArgs),
}

/// Arguments for the chat demo
#[derive(Parser)]
pub struct ChatArgs {
    /// Display name for the local side (overrides the persisted identity)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Display name for the echo peer
    #[arg(long, default_value = "EchoPeer")]
    pub peer_name: String,
}

/// Arguments for the history command
#[derive(Parser)]
pub struct HistoryArgs {
    /// Maximum number of entries to show
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// History subcommand
    #[command(subcommand)]
    pub action: Option<HistoryAction>,
}

/// History subcommands
#[derive(Subcommand)]
pub enum HistoryAction {
    /// Delete all persisted history
    Clear,
}

/// Arguments for the identity command
#[derive(Parser)]
pub struct IdentityArgs {
    /// Identity subcommand
    #[command(subcommand)]
    pub action: Option<IdentityAction>,
}

/// Identity subcommands
#[derive(Subcommand)]
pub enum IdentityAction {
    /// Show the persisted display name
    Show,
    /// Persist a new display name
    Set {
        /// The display name to persist
        name: String,
    },
}

/// Arguments for the config command
#[derive(Parser)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the config file path
    Path,
}

/// Load configuration with graceful fallback to defaults.
pub fn load_config() -> Config {
    Config::load().unwrap_or_default()
}

/// Open a named persistent store under the platform data directory.
pub fn open_store(name: &str) -> anyhow::Result<FileStore> {
    let path = FileStore::default_path(name)
        .ok_or_else(|| anyhow::anyhow!("no platform data directory available"))?;
    Ok(FileStore::open(path)?)
}

/// Store file holding the persisted display name.
pub const IDENTITY_STORE: &str = "identity.json";

/// Store file holding the message history.
pub const HISTORY_STORE: &str = "history.json";
