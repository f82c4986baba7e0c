//! Top-level ingestion pipeline: wires the file source, byte-order
//! detector, reader thread, bounded queue, summarizer, and progress
//! reporter together (components B, C, D, E, F, G).


pub mod progress;
pub mod queue;
pub mod reader;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use crate::codec::Endian;
use crate::source::{self, endian, Source, SourceError};
use crate::summarize::{self, SummarizeError};
use queue::FinishReason;

/// Errors surfaced by [`run_ingestion`], composing the module-local
/// error types named in the error-handling design.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    #[error("summarize error: {0}")]
    Summarize(#[from] SummarizeError),

    #[error("ingestion cancelled by caller")]
    Terminate,

    #[error("allocation failure while reading input")]
    NoMemory,
}

/// Caller-supplied configuration for one ingestion run (§8.3).
pub struct IngestConfig {
    pub input_path: PathBuf,
    pub db_path: PathBuf,
    pub queue_capacity: usize,
    pub progress_interval: Duration,
    /// Worker count handed to [`crate::paramread::read_with_threads`]
    /// for any later on-demand re-extraction against this run's output;
    /// unused by `run_ingestion` itself, which never calls `paramread`.
    pub parametric_threads: usize,
}

impl IngestConfig {
    /// Defaults matching §5 (full ingestion queue capacity), §4.5
    /// (100ms progress cadence), and rayon's own global pool size for
    /// later parametric re-extraction.
    pub fn new(input_path: impl Into<PathBuf>, db_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            db_path: db_path.into(),
            queue_capacity: queue::INGEST_QUEUE_CAPACITY,
            progress_interval: progress::PUBLISH_INTERVAL,
            parametric_threads: rayon::current_num_threads(),
        }
    }
}

/// Outcome of a completed (non-cancelled, non-errored) ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOutcome {
    pub records_processed: u64,
}

/// Runs one full ingestion: opens `config.input_path`, detects byte
/// order, spawns the reader thread, drives the summarizer on the
/// calling thread, and (if `sink` is given) runs the progress reporter
/// on a third thread until the summarizer finishes.
///
/// `STD_EOF` is not an error — a clean end of stream returns `Ok`.
/// `TERMINATE` (the caller set `stop_flag` mid-run) surfaces as
/// `Err(PipelineError::Terminate)`, with the database left committed up
/// to the last PRR boundary observed (§8, scenario 5).
pub fn run_ingestion(
    config: &IngestConfig,
    stop_flag: Arc<AtomicBool>,
    sink: Option<Box<dyn progress::ProgressSink>>,
) -> Result<IngestOutcome, PipelineError> {
    let mut source = Source::open(&config.input_path)?;
    let detected_endian = endian::detect(&mut source)?;

    run_ingestion_with(config, source, detected_endian, stop_flag, sink)
}

fn run_ingestion_with(
    config: &IngestConfig,
    source: Source,
    detected_endian: Endian,
    stop_flag: Arc<AtomicBool>,
    sink: Option<Box<dyn progress::ProgressSink>>,
) -> Result<IngestOutcome, PipelineError> {
    let (tx, rx) = queue::channel(config.queue_capacity);
    let offset_counter = Arc::new(AtomicU64::new(0));
    let file_size = source::file_size(&config.input_path);

    let reader_offset = Arc::clone(&offset_counter);
    let reader_stop = Arc::clone(&stop_flag);
    let reader_handle = thread::Builder::new()
        .name("stdf-reader".into())
        .spawn(move || reader::run(source, detected_endian, reader_stop, reader_offset, tx))
        .expect("spawn reader thread");

    let progress_done = Arc::new(AtomicBool::new(false));
    let progress_handle = sink.map(|sink| {
        let done = Arc::clone(&progress_done);
        let progress_offset = Arc::clone(&offset_counter);
        thread::Builder::new()
            .name("stdf-progress".into())
            .spawn(move || progress::run(progress_offset, file_size, done, sink))
            .expect("spawn progress thread")
    });

    let outcome = summarize::run(rx, &config.db_path);

    progress_done.store(true, Ordering::Relaxed);
    reader_handle.join().expect("reader thread panicked");
    if let Some(handle) = progress_handle {
        handle.join().expect("progress thread panicked");
    }

    let (records_processed, finish_reason) = outcome?;
    info!(records_processed, "ingestion finished");

    match finish_reason {
        FinishReason::Eof => Ok(IngestOutcome { records_processed }),
        FinishReason::Terminate => Err(PipelineError::Terminate),
        FinishReason::NoMemory => Err(PipelineError::NoMemory),
    }
}
