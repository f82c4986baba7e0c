//! Parametric reader (component H).
//!
//! Given arrays of previously indexed `(offset, length)` pairs for one
//! test number, re-extracts the originating PTR/FTR/MPR payloads and
//! decodes them in parallel, returning one value and one flag per row.
//! This is the on-demand path invoked after the first pass completes —
//! independent of, and never run concurrently with, [`crate::pipeline`].


use std::path::Path;

use rayon::prelude::*;
use thiserror::Error;
use tracing::debug;

use crate::codec::record_codes;
use crate::codec::{Cursor, Endian};
use crate::source::{Source, SourceError};

/// Errors raised while re-extracting parametric measurements.
#[derive(Debug, Error)]
pub enum ParamReadError {
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    #[error("unsupported record code {0} (expected PTR, FTR, or MPR)")]
    UnsupportedRecordCode(u16),

    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// One re-extracted measurement. `flag` is the raw `TEST_FLG` byte;
/// `value` is `RESULT` for PTR, or `flag` widened to `f64` for FTR/MPR
/// (§4.6 — those record types have no single scalar result).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub value: f64,
    pub flag: i32,
}

impl Measurement {
    fn missing() -> Self {
        Self {
            value: f64::NAN,
            flag: 0,
        }
    }
}

/// Re-extracts and decodes `offsets[i]..offsets[i] + lengths[i]` for
/// each `i`, in parallel, using rayon's global thread pool.
/// `offsets[i] < 0` or `lengths[i] < 0` yields a missing [`Measurement`]
/// for that row without touching the file.
///
/// `record_code` must be one of PTR, FTR, or MPR — the only types the
/// ingestion path indexes into `Test_Offsets`.
pub fn read(
    path: impl AsRef<Path>,
    record_code: u16,
    endian: Endian,
    offsets: &[i64],
    lengths: &[i64],
) -> Result<Vec<Measurement>, ParamReadError> {
    read_with_threads(path, record_code, endian, offsets, lengths, rayon::current_num_threads())
}

/// Same as [`read`], but decodes on a dedicated pool of `threads` worker
/// threads rather than rayon's global pool — the knob behind
/// [`crate::pipeline::IngestConfig::parametric_threads`], so a caller
/// running many concurrent re-extractions can bound how much of the
/// machine each one claims.
pub fn read_with_threads(
    path: impl AsRef<Path>,
    record_code: u16,
    endian: Endian,
    offsets: &[i64],
    lengths: &[i64],
    threads: usize,
) -> Result<Vec<Measurement>, ParamReadError> {
    if !matches!(record_code, record_codes::PTR | record_codes::FTR | record_codes::MPR) {
        return Err(ParamReadError::UnsupportedRecordCode(record_code));
    }

    let mut source = Source::open(path)?;
    let buf = source.read_to_end()?;
    debug!(record_code, rows = offsets.len(), threads, "parametric read starting");

    let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
    let results: Vec<Measurement> = pool.install(|| {
        offsets
            .par_iter()
            .zip(lengths.par_iter())
            .map(|(&offset, &length)| decode_row(&buf, record_code, endian, offset, length))
            .collect()
    });

    debug!(rows = results.len(), "parametric read finished");
    Ok(results)
}

fn decode_row(buf: &[u8], record_code: u16, endian: Endian, offset: i64, length: i64) -> Measurement {
    if offset < 0 || length < 0 {
        return Measurement::missing();
    }
    let start = offset as usize;
    let end = start + length as usize;
    // `Test_Offsets.Offset` is the payload start (the byte just past the
    // 4-byte record header), so `buf[start..end]` is already the record
    // body — no header to skip here, unlike a raw file offset.
    let Some(body) = buf.get(start..end) else {
        return Measurement::missing();
    };

    let mut c = Cursor::new(body);
    let test_flg = match read_test_flg(&mut c, endian) {
        Some(f) => f,
        None => return Measurement::missing(),
    };

    let value = if record_code == record_codes::PTR {
        match c.u1().and_then(|_parm_flg| c.r4(endian)) {
            Ok(result) => result as f64,
            Err(_) => f64::NAN,
        }
    } else {
        test_flg as f64
    };

    Measurement {
        value,
        flag: test_flg as i32,
    }
}

/// `TEST_NUM(U4) HEAD_NUM(U1) SITE_NUM(U1) TEST_FLG(B1)` precedes
/// `PARM_FLG`/`RESULT` (PTR) identically across all three record types.
fn read_test_flg(c: &mut Cursor<'_>, endian: Endian) -> Option<u8> {
    c.u4(endian).ok()?;
    c.u1().ok()?;
    c.u1().ok()?;
    c.u1().ok()
}
