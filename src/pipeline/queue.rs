//! The bounded queue (component B) between the reader and summarizer
//! threads, and the message shape carried over it.

use crate::codec::Endian;

/// Why the reader thread stopped producing messages. Carried on the
/// terminal [`Message::Finish`] element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// Clean end of stream — not a true error.
    Eof,
    /// The caller's stop flag was observed.
    Terminate,
    /// A payload or correlation-map allocation failed.
    NoMemory,
}

/// One element on the reader-to-summarizer queue.
///
/// The reader allocates `bytes` for every `Parse` message; the consumer
/// takes exclusive ownership on receipt and is responsible for it on
/// every exit path, including error — in Rust this falls out of normal
/// ownership rather than needing an explicit free step (see `codec`'s
/// module doc).
pub enum Message {
    /// Emitted once, before any `Parse`, so the consumer can latch the
    /// byte order used by all subsequent payloads.
    SetEndian(Endian),
    /// One decoded-eligible record header plus its raw payload.
    Parse {
        record_code: u16,
        file_offset: u64,
        bytes: Box<[u8]>,
        raw_len: u16,
    },
    /// Terminal element. Exactly one is sent per run, always last.
    Finish(FinishReason),
}

/// Queue capacity used for the full ingestion path (§5).
pub const INGEST_QUEUE_CAPACITY: usize = 1 << 22;

/// Queue capacity used for the diagnostic analyzer path (§5).
pub const ANALYZE_QUEUE_CAPACITY: usize = 1024;

/// Creates the bounded channel pair shared by the reader and summarizer.
pub fn channel(capacity: usize) -> (crossbeam_channel::Sender<Message>, crossbeam_channel::Receiver<Message>) {
    crossbeam_channel::bounded(capacity)
}
