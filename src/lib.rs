//! # stdf_ingest
//!
//! A single-pass ingestion engine for STDF V4 (Standard Test Data
//! Format) binary logs. Streams a semiconductor test program's output —
//! gigabytes of part, wafer, and parametric-test records — into a
//! queryable embedded SQLite summary, without ever materializing the
//! whole file in memory.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                        run_ingestion                         │
//! │                                                               │
//! │  Source ──► detect ──► reader thread ──► bounded queue        │
//! │  (plain/gz/bz2)  byte order    (E)           (B)              │
//! │                                               │                │
//! │                                               ▼                │
//! │                                          summarizer (F)        │
//! │                                     correlation state + SQL   │
//! │                                               │                │
//! │                                               ▼                │
//! │                                        embedded SQLite DB      │
//! │                                                               │
//! │  progress thread (G) polls the reader's byte offset           │
//! │  independently, publishing a 0–10000 scaled percentage        │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`codec`] | STDF V4 record decoder — typed views over raw payload bytes |
//! | [`source`] | Plain/gzip/bzip2 file abstraction and byte-order detection |
//! | [`pipeline`] | Reader thread, bounded queue, progress reporter, and `run_ingestion` |
//! | [`summarize`] | Per-record-type SQL handlers and correlation state |
//! | [`paramread`] | On-demand re-extraction of previously indexed parametric values |
//! | [`analyze`] | Diagnostic record-code histogram over a file, no database required |
//!
//! ## Key Properties
//!
//! - **Byte-order agnostic** — auto-detected once from the first FAR
//!   record and threaded explicitly through every decode call.
//! - **Bounded memory** — the reader and summarizer run on separate
//!   threads connected by a bounded channel; the file is never fully
//!   buffered except by [`paramread`]'s on-demand re-extraction path.
//! - **PRR-delimited transactions** — the embedded database commits at
//!   every part boundary, bounding WAL growth without sacrificing
//!   per-part durability.
//! - **Cooperative cancellation** — a shared stop flag lets a caller
//!   abort mid-run; the database is left committed up to the last
//!   completed part.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::atomic::AtomicBool;
//! use std::sync::Arc;
//!
//! use stdf_ingest::pipeline::{run_ingestion, IngestConfig};
//!
//! let config = IngestConfig::new("lot42.stdf.gz", "lot42.sqlite");
//! let outcome = run_ingestion(&config, Arc::new(AtomicBool::new(false)), None).unwrap();
//! println!("ingested {} records", outcome.records_processed);
//! ```

#![allow(dead_code)]

pub mod analyze;
pub mod codec;
pub mod paramread;
pub mod pipeline;
pub mod source;
pub mod summarize;
