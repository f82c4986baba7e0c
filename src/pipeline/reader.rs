//! Reader thread (component E).
//!
//! Walks records sequentially from an already byte-order-detected
//! [`Source`], filtering by record code and dispatching to the bounded
//! queue. Never interprets payload contents beyond the 4-byte header —
//! field-level decoding is entirely the summarizer's (and `codec`'s) job.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;
use tracing::{debug, trace};

use crate::codec::{record_code, record_codes, Cursor, Endian};
use crate::pipeline::queue::{FinishReason, Message};
use crate::source::Source;

/// Runs the reader loop to completion on the calling thread (the caller
/// spawns this on its own `std::thread`). Sends `SetEndian` first, then
/// one `Parse` per enqueued record, then exactly one terminal `Finish`.
pub fn run(
    mut source: Source,
    endian: Endian,
    stop_flag: Arc<AtomicBool>,
    offset_counter: Arc<AtomicU64>,
    tx: Sender<Message>,
) {
    if tx.send(Message::SetEndian(endian)).is_err() {
        return;
    }

    let mut offset: u64 = 0;
    let mut last_code: Option<u16> = None;

    loop {
        if stop_flag.load(Ordering::Relaxed) {
            debug!(offset, "reader observed stop flag");
            let _ = tx.send(Message::Finish(FinishReason::Terminate));
            return;
        }

        let mut header = [0u8; 4];
        if let Err(e) = source.read_exact(&mut header) {
            debug!(offset, error = %e, "reader reached end of stream");
            let _ = tx.send(Message::Finish(FinishReason::Eof));
            return;
        }
        offset += 4;
        offset_counter.store(offset, Ordering::Relaxed);

        let mut header_cursor = Cursor::new(&header[0..2]);
        let rec_len = match header_cursor.u2(endian) {
            Ok(n) => n,
            Err(_) => {
                let _ = tx.send(Message::Finish(FinishReason::Eof));
                return;
            }
        };
        let rec_typ = header[2];
        let rec_sub = header[3];
        let code = record_code(rec_typ, rec_sub);

        if Some(code) != last_code {
            trace!(code, "reader switched record type");
            last_code = Some(code);
        }

        if record_codes::is_enqueued(code) {
            let mut buf: Vec<u8> = Vec::new();
            if buf.try_reserve_exact(rec_len as usize).is_err() {
                debug!(offset, rec_len, "payload allocation failed");
                let _ = tx.send(Message::Finish(FinishReason::NoMemory));
                return;
            }
            buf.resize(rec_len as usize, 0);
            let mut bytes = buf.into_boxed_slice();
            if let Err(e) = source.read_exact(&mut bytes) {
                debug!(offset, error = %e, "short read while fetching enqueued payload");
                let _ = tx.send(Message::Finish(FinishReason::Eof));
                return;
            }
            let file_offset = offset;
            offset += rec_len as u64;
            offset_counter.store(offset, Ordering::Relaxed);

            if tx
                .send(Message::Parse {
                    record_code: code,
                    file_offset,
                    bytes,
                    raw_len: rec_len,
                })
                .is_err()
            {
                return;
            }
        } else if rec_len > 0 {
            if let Err(e) = source.skip(rec_len as u64) {
                debug!(offset, error = %e, "short read while skipping record");
                let _ = tx.send(Message::Finish(FinishReason::Eof));
                return;
            }
            offset += rec_len as u64;
            offset_counter.store(offset, Ordering::Relaxed);
        }
    }
}
