//! Logging infrastructure: structured progress events.
//!
//! Provides [`JsonlProgressLogger`], a JSONL file writer that implements the
//! [`BenchmarkProgressNotifier`](quorum_application::BenchmarkProgressNotifier)
//! port.

mod jsonl_progress;

pub use jsonl_progress::JsonlProgressLogger;
