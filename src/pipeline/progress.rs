//! Progress reporter (component G).
//!
//! An independent worker that periodically publishes
//! `floor(10000 * bytes_consumed / file_size)` to a caller-supplied sink
//! while ingestion runs, and propagates the caller's cooperative stop
//! request back to the reader thread.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::trace;

/// Receives progress updates in the `[0, 10000]` range. Implemented by
/// tests as a recording stub; production callers typically forward this
/// to a UI progress bar.
pub trait ProgressSink: Send {
    fn publish(&mut self, scaled_percent: u32);
}

impl<F: FnMut(u32) + Send> ProgressSink for F {
    fn publish(&mut self, scaled_percent: u32) {
        (self)(scaled_percent)
    }
}

/// Cadence between publishes (§4.5).
pub const PUBLISH_INTERVAL: Duration = Duration::from_millis(100);

/// Runs the publish loop on the calling thread until `done` is set,
/// sleeping `PUBLISH_INTERVAL` between reads of `offset_counter`. Always
/// ends with one final publish of `10000`.
pub fn run(
    offset_counter: Arc<AtomicU64>,
    file_size: u64,
    done: Arc<AtomicBool>,
    mut sink: impl ProgressSink,
) {
    while !done.load(Ordering::Relaxed) {
        let pct = scaled_percent(offset_counter.load(Ordering::Relaxed), file_size);
        trace!(pct, "progress publish");
        sink.publish(pct);
        thread::sleep(PUBLISH_INTERVAL);
    }
    sink.publish(10_000);
}

fn scaled_percent(offset: u64, file_size: u64) -> u32 {
    if file_size == 0 {
        return 0;
    }
    let scaled = (10_000u128 * offset as u128) / file_size as u128;
    scaled.min(10_000) as u32
}
