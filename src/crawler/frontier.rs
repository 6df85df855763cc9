//! Crawl-wide dedup and budget state
//!
//! The frontier owns the set of locators already admitted and the two crawl
//! counters. Every mutation happens under one lock so that admission and the
//! emission budget stay consistent while workers complete concurrently.

use crate::config::CrawlBudget;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};
use url::Url;

#[derive(Debug, Default)]
struct FrontierState {
    seen: HashSet<String>,
    emitted: u64,
    pages_visited: u64,
}

/// Dedup and budget tracker shared by all crawl tasks
///
/// Monotonic: the seen-set only grows and the counters only increase.
#[derive(Debug)]
pub struct Frontier {
    budget: CrawlBudget,
    state: Mutex<FrontierState>,
}

impl Frontier {
    pub fn new(budget: CrawlBudget) -> Self {
        Self {
            budget,
            state: Mutex::new(FrontierState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, FrontierState> {
        // Counters stay meaningful even if a holder panicked
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Records the locator as seen and returns true if it should be processed
    ///
    /// With dedup disabled every locator is admitted.
    pub fn admit(&self, url: &Url) -> bool {
        let mut state = self.state();
        let fresh = state.seen.insert(url.to_string());
        fresh || !self.budget.dedupe
    }

    /// Records wanted minus records emitted, never below zero
    ///
    /// Returns `u64::MAX` for an unbounded crawl.
    pub fn remaining_budget(&self) -> u64 {
        self.remaining(&self.state())
    }

    fn remaining(&self, state: &FrontierState) -> u64 {
        match self.budget.results_wanted {
            Some(wanted) => wanted.saturating_sub(state.emitted),
            None => u64::MAX,
        }
    }

    /// Claims one emission slot if the budget allows it
    ///
    /// The budget check and the counter increment happen under the same lock,
    /// so concurrent callers can never push the count past the budget.
    pub fn try_claim_emission(&self) -> bool {
        let mut state = self.state();
        if self.remaining(&state) == 0 {
            return false;
        }
        state.emitted += 1;
        true
    }

    /// Counts one emitted record unconditionally
    pub fn record_emitted(&self) {
        self.state().emitted += 1;
    }

    pub fn page_visited(&self) {
        self.state().pages_visited += 1;
    }

    pub fn emitted(&self) -> u64 {
        self.state().emitted
    }

    pub fn pages_visited(&self) -> u64 {
        self.state().pages_visited
    }

    pub fn seen_count(&self) -> usize {
        self.state().seen.len()
    }
}
