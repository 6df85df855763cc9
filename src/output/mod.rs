//! Output module for emitted records and crawl statistics
//!
//! This module handles:
//! - The record sink interface and its JSON-lines / in-memory implementations
//! - Counters collected during a crawl and the printed end-of-run summary

mod jsonl;
pub mod stats;
mod traits;

pub use jsonl::JsonLinesSink;
pub use stats::{print_summary, CrawlStats, CrawlSummary};
pub use traits::{MemorySink, OutputError, OutputResult, RecordSink};
