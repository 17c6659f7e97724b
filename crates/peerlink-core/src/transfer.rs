//! Chunked file send and reassembly.
//!
//! Files cross the channel as one `file-meta` announcement followed by
//! fixed-size chunks in order. The send side reads strictly sequentially,
//! one chunk in memory at a time (back-pressure by read-then-send, not
//! pipelining). The receive side accumulates chunks in arrival order and
//! finalizes once the declared size is reached.
//!
//! The protocol carries no sequence numbers, acknowledgments, or checksums;
//! it relies entirely on the transport's ordered reliable delivery. A chunk
//! arriving with no open assembly buffer is dropped silently.

use std::io::Read;

use crate::error::Result;
use crate::protocol::Message;
use crate::CHUNK_SIZE;

/// Number of chunks a file of `size` bytes splits into.
#[must_use]
pub fn chunk_count(size: u64) -> u64 {
    size.div_ceil(CHUNK_SIZE as u64)
}

/// Human-readable byte count (`512 B`, `1.5 KB`, `2.0 MB`).
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// Sequential chunk reader for an outbound file.
///
/// The caller sends [`meta`](Self::meta) first, then repeatedly requests
/// [`next_chunk`](Self::next_chunk) and sends each resulting message before
/// requesting the next. Only one chunk is ever buffered.
pub struct OutgoingFile<R: Read> {
    name: String,
    size: u64,
    reader: R,
    chunk_size: usize,
    sent: u64,
}

impl<R: Read> OutgoingFile<R> {
    /// Prepare a file of `size` bytes for sending.
    pub fn new(name: impl Into<String>, size: u64, reader: R) -> Self {
        Self {
            name: name.into(),
            size,
            reader,
            chunk_size: CHUNK_SIZE,
            sent: 0,
        }
    }

    /// Override the chunk size (tests and tuning).
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// The announcement message that opens the peer's assembly buffer.
    #[must_use]
    pub fn meta(&self) -> Message {
        Message::FileMeta {
            name: self.name.clone(),
            size: self.size,
        }
    }

    /// Read and return the next chunk message, or `None` once the declared
    /// size has been sent.
    pub fn next_chunk(&mut self) -> Result<Option<Message>> {
        if self.sent >= self.size {
            return Ok(None);
        }
        let remaining = usize::try_from(self.size - self.sent).unwrap_or(usize::MAX);
        let want = remaining.min(self.chunk_size);
        let mut buffer = vec![0u8; want];
        let mut filled = 0;
        while filled < want {
            let read = self.reader.read(&mut buffer[filled..])?;
            if read == 0 {
                break;
            }
            filled += read;
        }
        buffer.truncate(filled);
        if buffer.is_empty() {
            // Reader ran dry before the declared size; stop rather than spin.
            self.sent = self.size;
            return Ok(None);
        }
        self.sent += buffer.len() as u64;
        Ok(Some(Message::FileChunk { data: buffer }))
    }

    /// Fraction sent so far, `1.0` for empty files.
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.size == 0 {
            1.0
        } else {
            self.sent as f64 / self.size as f64
        }
    }

    /// Whether every declared byte has been read out.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.sent >= self.size
    }

    /// File name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared size in bytes.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }
}

/// A fully reassembled incoming file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedFile {
    /// File name as announced by the sender
    pub name: String,
    /// Reassembled bytes
    pub data: Vec<u8>,
}

/// Receive-side assembly buffer for one in-flight incoming file.
///
/// Exists only between the `file-meta` announcement and completion;
/// discarded after completion or on disconnect.
#[derive(Debug)]
pub struct IncomingFile {
    name: String,
    size: u64,
    chunks: Vec<Vec<u8>>,
    received: u64,
}

impl IncomingFile {
    /// Open an assembly buffer for an announced file.
    #[must_use]
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            chunks: Vec::new(),
            received: 0,
        }
    }

    /// Append a chunk in arrival order.
    ///
    /// Returns the completed file once the received byte count reaches the
    /// declared size. Chunks are concatenated exactly as they arrived; the
    /// protocol has no reordering, so a dropped or reordered chunk would
    /// silently corrupt the result.
    pub fn push(&mut self, data: Vec<u8>) -> Option<CompletedFile> {
        self.received += data.len() as u64;
        self.chunks.push(data);
        if self.is_complete() {
            Some(CompletedFile {
                name: std::mem::take(&mut self.name),
                data: self.chunks.concat(),
            })
        } else {
            None
        }
    }

    /// Whether the declared size has been reached.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.received >= self.size
    }

    /// Fraction received so far, `1.0` for empty files.
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.size == 0 {
            1.0
        } else {
            (self.received as f64 / self.size as f64).min(1.0)
        }
    }

    /// File name as announced.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared total size in bytes.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Bytes received so far.
    #[must_use]
    pub const fn received(&self) -> u64 {
        self.received
    }

    /// Finalize a zero-byte file that will never see a chunk.
    #[must_use]
    pub fn take_empty(&mut self) -> Option<CompletedFile> {
        if self.size == 0 {
            Some(CompletedFile {
                name: std::mem::take(&mut self.name),
                data: Vec::new(),
            })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn test_chunk_count() {
        assert_eq!(chunk_count(0), 0);
        assert_eq!(chunk_count(1), 1);
        assert_eq!(chunk_count(CHUNK_SIZE as u64), 1);
        assert_eq!(chunk_count(CHUNK_SIZE as u64 + 1), 2);
        assert_eq!(chunk_count(10 * CHUNK_SIZE as u64), 10);
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(2 * 1024 * 1024), "2.0 MB");
    }

    #[test]
    fn test_round_trip_multi_chunk() {
        let original = pattern(150_000);
        let mut outgoing = OutgoingFile::new(
            "blob.bin",
            original.len() as u64,
            Cursor::new(original.clone()),
        );
        let mut incoming = IncomingFile::new("blob.bin", original.len() as u64);

        let mut chunks = 0;
        let mut completed = None;
        while let Some(message) = outgoing.next_chunk().unwrap() {
            chunks += 1;
            let Message::FileChunk { data } = message else {
                panic!("expected file-chunk");
            };
            assert!(data.len() <= CHUNK_SIZE);
            let result = incoming.push(data);
            // Progress reaches 1.0 only at the final chunk.
            if result.is_none() {
                assert!(incoming.progress() < 1.0);
            }
            completed = result.or(completed);
        }

        assert_eq!(chunks, chunk_count(original.len() as u64));
        assert!(outgoing.is_complete());
        assert!((outgoing.progress() - 1.0).abs() < f64::EPSILON);

        let completed = completed.expect("file completed");
        assert_eq!(completed.name, "blob.bin");
        assert_eq!(completed.data, original);
    }

    #[test]
    fn test_exact_chunk_boundary() {
        let original = pattern(2 * CHUNK_SIZE);
        let mut outgoing = OutgoingFile::new(
            "even.bin",
            original.len() as u64,
            Cursor::new(original.clone()),
        );

        let mut sizes = Vec::new();
        while let Some(Message::FileChunk { data }) = outgoing.next_chunk().unwrap() {
            sizes.push(data.len());
        }
        assert_eq!(sizes, vec![CHUNK_SIZE, CHUNK_SIZE]);
    }

    #[test]
    fn test_outgoing_short_reader_stops() {
        // Declared size larger than the reader actually yields.
        let mut outgoing = OutgoingFile::new("short.bin", 1000, Cursor::new(vec![7u8; 100]));

        let Some(Message::FileChunk { data }) = outgoing.next_chunk().unwrap() else {
            panic!("expected one chunk");
        };
        assert_eq!(data.len(), 100);
        assert!(outgoing.next_chunk().unwrap().is_none());
        assert!(outgoing.is_complete());
    }

    #[test]
    fn test_incoming_progress_ratio() {
        let mut incoming = IncomingFile::new("p.bin", 200);
        assert!((incoming.progress() - 0.0).abs() < f64::EPSILON);

        assert!(incoming.push(vec![0u8; 50]).is_none());
        assert!((incoming.progress() - 0.25).abs() < f64::EPSILON);

        let completed = incoming.push(vec![0u8; 150]).expect("complete");
        assert_eq!(completed.data.len(), 200);
    }

    #[test]
    fn test_empty_file_finalizes_without_chunks() {
        let mut incoming = IncomingFile::new("empty.txt", 0);
        assert!((incoming.progress() - 1.0).abs() < f64::EPSILON);
        let completed = incoming.take_empty().expect("empty file completes");
        assert_eq!(completed.name, "empty.txt");
        assert!(completed.data.is_empty());
    }
}
