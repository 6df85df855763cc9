//! Crawl statistics
//!
//! Counters are updated concurrently by workers and read once at the end of a
//! crawl as a [`CrawlSummary`].

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters shared by all crawl workers
#[derive(Debug, Default)]
pub struct CrawlStats {
    complete_records: AtomicU64,
    partial_records: AtomicU64,
    minimal_records: AtomicU64,
    listing_pages_failed: AtomicU64,
    details_dropped: AtomicU64,
    details_discarded: AtomicU64,
    alternate_fetches: AtomicU64,
    failed_fetches: AtomicU64,
    sink_errors: AtomicU64,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_complete(&self) {
        self.complete_records.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_partial(&self) {
        self.partial_records.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_minimal(&self) {
        self.minimal_records.fetch_add(1, Ordering::Relaxed);
    }

    pub fn listing_failed(&self) {
        self.listing_pages_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// A detail task that never fetched because the budget was already met
    pub fn detail_dropped(&self) {
        self.details_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// A detail task whose finished record lost the race for the last budget slot
    pub fn detail_discarded(&self) {
        self.details_discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn alternate_fetched(&self) {
        self.alternate_fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fetch_failed(&self) {
        self.failed_fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn sink_failed(&self) {
        self.sink_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a point-in-time copy of the counters
    pub fn snapshot(&self, records_emitted: u64, listing_pages_visited: u64) -> CrawlSummary {
        CrawlSummary {
            records_emitted,
            complete_records: self.complete_records.load(Ordering::Relaxed),
            partial_records: self.partial_records.load(Ordering::Relaxed),
            minimal_records: self.minimal_records.load(Ordering::Relaxed),
            listing_pages_visited,
            listing_pages_failed: self.listing_pages_failed.load(Ordering::Relaxed),
            details_dropped: self.details_dropped.load(Ordering::Relaxed),
            details_discarded: self.details_discarded.load(Ordering::Relaxed),
            alternate_fetches: self.alternate_fetches.load(Ordering::Relaxed),
            failed_fetches: self.failed_fetches.load(Ordering::Relaxed),
            sink_errors: self.sink_errors.load(Ordering::Relaxed),
        }
    }
}

/// Summary statistics for a finished crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub records_emitted: u64,
    /// Detail records with title, ingredients and instructions
    pub complete_records: u64,
    /// Detail records emitted best-effort after all alternates
    pub partial_records: u64,
    /// Listing-only records (detail collection disabled)
    pub minimal_records: u64,
    pub listing_pages_visited: u64,
    pub listing_pages_failed: u64,
    pub details_dropped: u64,
    pub details_discarded: u64,
    pub alternate_fetches: u64,
    pub failed_fetches: u64,
    pub sink_errors: u64,
}

impl CrawlSummary {
    /// Share of detail records that came out core-complete, as a percentage
    pub fn completeness_rate(&self) -> f64 {
        let detail_records = self.complete_records + self.partial_records;
        if detail_records == 0 {
            return 0.0;
        }
        (self.complete_records as f64 / detail_records as f64) * 100.0
    }
}

/// Prints the summary to stdout in a formatted manner
pub fn print_summary(summary: &CrawlSummary) {
    println!("=== Harvest Summary ===\n");

    println!("Records:");
    println!("  Emitted: {}", summary.records_emitted);
    println!("  Complete: {}", summary.complete_records);
    println!("  Partial: {}", summary.partial_records);
    if summary.minimal_records > 0 {
        println!("  Listing-only: {}", summary.minimal_records);
    }
    println!();

    println!("Pages:");
    println!("  Listing pages visited: {}", summary.listing_pages_visited);
    println!("  Listing pages failed: {}", summary.listing_pages_failed);
    println!("  Alternate endpoint fetches: {}", summary.alternate_fetches);
    println!("  Failed fetches: {}", summary.failed_fetches);
    println!(
        "  Detail tasks skipped by budget: {}",
        summary.details_dropped + summary.details_discarded
    );
    println!();

    if summary.sink_errors > 0 {
        println!("Sink errors: {}\n", summary.sink_errors);
    }

    println!(
        "Completeness: {:.1}% ({} / {} detail records core-complete)",
        summary.completeness_rate(),
        summary.complete_records,
        summary.complete_records + summary.partial_records
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_counters() {
        let stats = CrawlStats::new();
        stats.record_complete();
        stats.record_complete();
        stats.record_partial();
        stats.alternate_fetched();
        stats.detail_dropped();

        let summary = stats.snapshot(3, 2);
        assert_eq!(summary.records_emitted, 3);
        assert_eq!(summary.listing_pages_visited, 2);
        assert_eq!(summary.complete_records, 2);
        assert_eq!(summary.partial_records, 1);
        assert_eq!(summary.alternate_fetches, 1);
        assert_eq!(summary.details_dropped, 1);
    }

    #[test]
    fn test_completeness_rate() {
        let summary = CrawlSummary {
            complete_records: 3,
            partial_records: 1,
            ..Default::default()
        };
        assert!((summary.completeness_rate() - 75.0).abs() < 0.01);
    }

    #[test]
    fn test_completeness_rate_without_details() {
        assert_eq!(CrawlSummary::default().completeness_rate(), 0.0);
    }
}
