//! Peerlink CLI - peer-to-peer chat over a delegated transport
//!
//! The `chat` subcommand runs a loopback demo: two chat cores joined by an
//! in-process transport pair, exercising the full protocol (identity
//! announcement, typing indicators, text, chunked file transfer). The
//! remaining subcommands inspect the persisted identity, history, and
//! configuration.
//!
//! ```bash
//! # Interactive loopback chat
//! peerlink chat
//!
//! # Review past messages
//! peerlink history --limit 20
//! ```

#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]

use anyhow::Result;
use clap::Parser;

mod commands;

use commands::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        Command::Chat(args) => commands::chat::run(args).await,
        Command::History(args) => commands::history::run(&args),
        Command::Identity(args) => commands::identity::run(&args),
        Command::Config(args) => commands::config::run(&args),
    }
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,peerlink=info,peerlink_core=info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}
