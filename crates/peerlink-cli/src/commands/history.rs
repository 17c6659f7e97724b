//! Show or clear the persisted message history.

use anyhow::Result;

use peerlink_core::history::{HistoryStore, RecordKind};

use super::{HistoryAction, HistoryArgs};

/// Run the history command.
pub fn run(args: &HistoryArgs) -> Result<()> {
    let store = super::open_store(super::HISTORY_STORE)?;
    let mut history = HistoryStore::open(store);

    if let Some(HistoryAction::Clear) = args.action {
        history.clear();
        println!("History cleared.");
        return Ok(());
    }

    if history.is_empty() {
        println!("No messages recorded.");
        return Ok(());
    }

    let records = history.records();
    let shown = args.limit.map_or(records, |limit| {
        &records[records.len().saturating_sub(limit)..]
    });
    for record in shown {
        let marker = match record.kind {
            RecordKind::Text => "",
            RecordKind::File => "(file) ",
        };
        println!(
            "{} [{}] {marker}{}",
            record.timestamp.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S"),
            record.author,
            record.body
        );
    }
    Ok(())
}
