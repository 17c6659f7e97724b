//! Bounded persistent message history.
//!
//! An append-only, oldest-first log of past messages, capped at
//! [`HISTORY_CAP`](crate::HISTORY_CAP) records with the oldest evicted
//! beyond the cap. The log is persisted synchronously through a
//! [`KeyValueStore`] on every append; persistence failures are logged and
//! swallowed, so a full store can lose the newest entry but never breaks
//! the session.
//!
//! File records carry only the filename: the downloadable handle a
//! completed transfer produces is transient and does not survive reload, so
//! replay covers text records only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::KeyValueStore;
use crate::HISTORY_CAP;

/// Storage key for the persisted log.
const HISTORY_KEY: &str = "history";

/// What a history record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// A chat message; `body` is the text
    Text,
    /// A transferred file; `body` is the filename
    File,
}

/// One entry in the message log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Record kind
    pub kind: RecordKind,
    /// Display name of whoever produced it (`"You"` for local)
    pub author: String,
    /// Message text, or filename for file records
    pub body: String,
    /// When the record was created
    pub timestamp: DateTime<Utc>,
}

impl MessageRecord {
    /// A text record stamped now.
    #[must_use]
    pub fn text(author: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind: RecordKind::Text,
            author: author.into(),
            body: body.into(),
            timestamp: Utc::now(),
        }
    }

    /// A file record stamped now.
    #[must_use]
    pub fn file(author: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            kind: RecordKind::File,
            author: author.into(),
            body: filename.into(),
            timestamp: Utc::now(),
        }
    }
}

/// The bounded message log.
#[derive(Debug)]
pub struct HistoryStore<S: KeyValueStore> {
    store: S,
    records: Vec<MessageRecord>,
    cap: usize,
}

impl<S: KeyValueStore> HistoryStore<S> {
    /// Open the log, replaying whatever the store holds.
    ///
    /// A corrupt persisted log is logged and treated as empty rather than
    /// failing the caller.
    pub fn open(store: S) -> Self {
        Self::with_cap(store, HISTORY_CAP)
    }

    /// Open with a custom retention cap.
    pub fn with_cap(store: S, cap: usize) -> Self {
        let records = store
            .get(HISTORY_KEY)
            .map_or_else(Vec::new, |raw| match serde_json::from_str(&raw) {
                Ok(records) => records,
                Err(e) => {
                    tracing::warn!("discarding unreadable history: {e}");
                    Vec::new()
                }
            });
        Self {
            store,
            records,
            cap,
        }
    }

    /// Append a record, evicting the oldest beyond the cap, and persist.
    ///
    /// Persistence failures (quota and the like) are logged and swallowed.
    /// A cap of zero disables recording entirely.
    pub fn append(&mut self, record: MessageRecord) {
        if self.cap == 0 {
            return;
        }
        self.records.push(record);
        while self.records.len() > self.cap {
            self.records.remove(0);
        }
        self.persist();
    }

    /// All retained records, oldest first.
    #[must_use]
    pub fn records(&self) -> &[MessageRecord] {
        &self.records
    }

    /// Text records only, oldest first, for replay into a message view.
    pub fn replayable(&self) -> impl Iterator<Item = &MessageRecord> {
        self.records
            .iter()
            .filter(|r| r.kind == RecordKind::Text)
    }

    /// Number of retained records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Empty the log and remove the persisted copy.
    pub fn clear(&mut self) {
        self.records.clear();
        self.store.remove(HISTORY_KEY);
    }

    fn persist(&mut self) {
        let raw = match serde_json::to_string(&self.records) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("failed to serialize history: {e}");
                return;
            }
        };
        if let Err(e) = self.store.set(HISTORY_KEY, &raw) {
            tracing::warn!("failed to persist history: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_append_and_reload() {
        let mut store = MemoryStore::new();
        {
            let mut history = HistoryStore::open(&mut store);
            history.append(MessageRecord::text("You", "hello"));
            history.append(MessageRecord::file("Peer", "photo.png"));
        }

        let history = HistoryStore::open(&mut store);
        assert_eq!(history.len(), 2);
        assert_eq!(history.records()[0].body, "hello");
        assert_eq!(history.records()[1].kind, RecordKind::File);
    }

    #[test]
    fn test_cap_keeps_most_recent_oldest_first() {
        let mut history = HistoryStore::with_cap(MemoryStore::new(), 100);
        for i in 0..150 {
            history.append(MessageRecord::text("You", format!("msg {i}")));
        }

        assert_eq!(history.len(), 100);
        assert_eq!(history.records()[0].body, "msg 50");
        assert_eq!(history.records()[99].body, "msg 149");
    }

    #[test]
    fn test_replayable_filters_file_records() {
        let mut history = HistoryStore::open(MemoryStore::new());
        history.append(MessageRecord::text("You", "hi"));
        history.append(MessageRecord::file("You", "doc.pdf"));
        history.append(MessageRecord::text("Peer", "hey"));

        let replay: Vec<&str> = history.replayable().map(|r| r.body.as_str()).collect();
        assert_eq!(replay, vec!["hi", "hey"]);
    }

    #[test]
    fn test_clear_removes_persisted_log() {
        let mut store = MemoryStore::new();
        {
            let mut history = HistoryStore::open(&mut store);
            history.append(MessageRecord::text("You", "gone soon"));
            history.clear();
            assert!(history.is_empty());
        }

        let history = HistoryStore::open(&mut store);
        assert!(history.is_empty());
    }

    #[test]
    fn test_persistence_failure_is_swallowed() {
        // A store too small for any log write: appends still succeed
        // in memory and nothing panics or errors out.
        let mut history = HistoryStore::open(MemoryStore::with_capacity(4));
        history.append(MessageRecord::text("You", "not persisted"));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_corrupt_persisted_log_is_discarded() {
        let mut store = MemoryStore::new();
        store.set("history", "{not json").unwrap();

        let history = HistoryStore::open(&mut store);
        assert!(history.is_empty());
    }
}
