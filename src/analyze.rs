//! Analyzer (component I) — diagnostic.
//!
//! Runs the same byte-order-detect → reader-thread → bounded-queue
//! pipeline as full ingestion, but instead of stepping SQL statements it
//! tallies a record-code histogram. Used to sanity-check a file without
//! touching a database.


use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64};
use std::sync::Arc;
use std::thread;

use thiserror::Error;
use tracing::info;

use crate::pipeline::queue::{self, FinishReason, Message};
use crate::pipeline::reader;
use crate::source::{endian, Source, SourceError};

/// Errors raised while analyzing a file.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("source error: {0}")]
    Source(#[from] SourceError),
}

/// Walks `path` end to end and returns a record-code → count histogram.
/// Rendering it for a human (spec's own words) is left to a `Display`
/// impl over the returned map rather than done here, keeping this
/// function free of any presentation concern.
pub fn run(path: impl AsRef<Path>) -> Result<BTreeMap<u16, u64>, AnalyzeError> {
    let (histogram, _reason) = run_with_reason(path)?;
    Ok(histogram)
}

/// Finish reason as last observed — exposed for callers that care
/// whether the walk completed cleanly or was interrupted, distinct from
/// the histogram itself.
pub fn run_with_reason(path: impl AsRef<Path>) -> Result<(BTreeMap<u16, u64>, FinishReason), AnalyzeError> {
    let mut source = Source::open(path)?;
    let detected_endian = endian::detect(&mut source)?;

    let (tx, rx) = queue::channel(queue::ANALYZE_QUEUE_CAPACITY);
    let stop_flag = Arc::new(AtomicBool::new(false));
    let offset_counter = Arc::new(AtomicU64::new(0));

    let reader_stop = Arc::clone(&stop_flag);
    let reader_offset = Arc::clone(&offset_counter);
    let handle = thread::Builder::new()
        .name("stdf-analyze-reader".into())
        .spawn(move || reader::run(source, detected_endian, reader_stop, reader_offset, tx))
        .expect("spawn analyzer reader thread");

    let mut histogram: BTreeMap<u16, u64> = BTreeMap::new();
    let reason = loop {
        match rx.recv() {
            Ok(Message::SetEndian(_)) => {}
            Ok(Message::Parse { record_code, .. }) => {
                *histogram.entry(record_code).or_insert(0) += 1;
            }
            Ok(Message::Finish(reason)) => break reason,
            Err(_) => break FinishReason::Eof,
        }
    };

    handle.join().expect("analyzer reader thread panicked");
    info!(record_types = histogram.len(), "analyze finished");
    Ok((histogram, reason))
}
