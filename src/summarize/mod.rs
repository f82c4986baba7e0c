//! Summarizer (component F).
//!
//! Consumes the bounded queue until `FINISH`, dispatching each `PARSE`
//! message by record code to a handler in [`handlers`] that decodes the
//! payload via [`crate::codec`] and steps a prepared SQL statement
//! against the schema in [`schema`]. Correlation state (DUT/wafer
//! indices, per-test fail counts) lives in [`State`] for the lifetime of
//! one ingestion run.

#[cfg(test)]
mod tests;

mod dispatch;
mod handlers;
mod schema;

use std::collections::{HashMap, HashSet};
use std::path::Path;

use crossbeam_channel::Receiver;
use rusqlite::Connection;
use thiserror::Error;
use tracing::{info, warn};

use crate::codec::{CodecError, Endian};
use crate::pipeline::queue::{FinishReason, Message};

/// Errors raised while summarizing a single ingestion run.
#[derive(Debug, Error)]
pub enum SummarizeError {
    /// Failure from the embedded SQL engine.
    #[error("sql error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// A payload failed to decode.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// A PRR/WRR/TR-family record referenced a `(head, site)` or `head`
    /// never opened by a prior PIR/WIR — a malformed input file.
    #[error("{0} referenced a (head, site) or head never opened by PIR/WIR")]
    MapMissing(&'static str),
}

/// Correlation state maintained across the whole ingestion run (§3.3).
pub(crate) struct State {
    conn: Connection,
    dut_index: i64,
    wafer_index: i64,
    seen_test_nums: HashSet<u32>,
    test_fail_count: HashMap<u32, i64>,
    head_site_to_dut: HashMap<u16, i64>,
    head_to_wafer: HashMap<u8, i64>,
}

pub(crate) fn head_site_key(head: u8, site: u8) -> u16 {
    ((head as u16) << 8) | site as u16
}

impl State {
    fn open(db_path: &Path) -> Result<Self, SummarizeError> {
        let _ = std::fs::remove_file(db_path);
        let conn = Connection::open(db_path)?;
        conn.execute_batch("PRAGMA synchronous = OFF; PRAGMA journal_mode = WAL;")?;
        conn.execute_batch(schema::CREATE_TABLES)?;
        conn.execute_batch("BEGIN;")?;
        Ok(Self {
            conn,
            dut_index: 0,
            wafer_index: 0,
            seen_test_nums: HashSet::new(),
            test_fail_count: HashMap::new(),
            head_site_to_dut: HashMap::new(),
            head_to_wafer: HashMap::new(),
        })
    }

    /// Runs the PRR-delimited checkpoint: commits the current
    /// transaction and opens the next one, bounding WAL growth (§3.4).
    fn checkpoint(&self) -> Result<(), SummarizeError> {
        self.conn.execute_batch("COMMIT; BEGIN;")?;
        Ok(())
    }

    /// Post-processing on `FINISH` (§4.4): flush fail counts, index
    /// `Dut_Info`, and commit the final transaction.
    fn finish(&mut self) -> Result<(), SummarizeError> {
        {
            let mut stmt = self
                .conn
                .prepare_cached("UPDATE Test_Info SET FailCount = ?1 WHERE TEST_NUM = ?2")?;
            for (test_num, fail_count) in &self.test_fail_count {
                stmt.execute(rusqlite::params![fail_count, test_num])?;
            }
        }
        self.conn
            .execute_batch("CREATE INDEX dutKey ON Dut_Info (HEAD_NUM ASC, SITE_NUM ASC); COMMIT;")?;
        Ok(())
    }
}

/// Drives the summarizer loop until `FINISH`, returning the number of
/// `PARSE` messages handled and the reason ingestion stopped.
pub fn run(rx: Receiver<Message>, db_path: &Path) -> Result<(u64, FinishReason), SummarizeError> {
    let mut state = State::open(db_path)?;
    let mut endian: Option<Endian> = None;
    let mut records_processed: u64 = 0;

    let finish_reason = loop {
        let message = match rx.recv() {
            Ok(m) => m,
            Err(_) => break FinishReason::Eof,
        };
        match message {
            Message::SetEndian(e) => {
                endian = Some(e);
                handlers::byte_order(&state, e)?;
            }
            Message::Parse {
                record_code,
                file_offset,
                bytes,
                raw_len,
            } => {
                let endian = endian.expect("SetEndian precedes every Parse message");
                match dispatch::handle(&mut state, record_code, file_offset, &bytes, raw_len, endian) {
                    Ok(()) => records_processed += 1,
                    Err(e) => {
                        if let SummarizeError::MapMissing(what) = &e {
                            warn!(what, file_offset, "correlation lookup missing");
                        }
                        return Err(e);
                    }
                }
            }
            Message::Finish(reason) => break reason,
        }
    };

    state.finish()?;
    info!(records_processed, ?finish_reason, "summarizer drained queue");
    Ok((records_processed, finish_reason))
}
