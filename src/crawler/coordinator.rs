//! Crawler coordinator - main crawl orchestration logic
//!
//! The crawl is a small state machine driven from one loop:
//! - `Listing(n)` fetches a listing page, admits its detail candidates through
//!   the [`Frontier`] in discovery order and decides whether to follow the
//!   next page
//! - `Detail(locator)` fetches one recipe page, merges what both extractors
//!   find, falls back to alternate endpoints while the record is incomplete
//!   and emits the result
//! - the crawl is done once no task is left in flight
//!
//! Listing and detail tasks share one semaphore, which bounds concurrency
//! against the origin server. Admission happens only in the coordinating
//! loop, so candidate order is deterministic even though fetches overlap.

use super::fetcher::{FetchError, FetchResponse, Fetcher, HttpFetcher};
use super::frontier::Frontier;
use crate::config::{Config, CrawlBudget};
use crate::extract::{ListingPage, PageExtractor};
use crate::output::{CrawlStats, CrawlSummary, JsonLinesSink, RecordSink};
use crate::record::{merge, CanonicalRecord, PartialRecord};
use crate::url::{alternates_for, parse_locator};
use crate::HarvestError;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinError, JoinSet};
use url::Url;

/// State shared by the coordinating loop and every spawned task
struct CrawlContext {
    fetcher: Arc<dyn Fetcher>,
    sink: Arc<dyn RecordSink>,
    frontier: Frontier,
    extractor: PageExtractor,
    recipe_type: String,
    permits: Semaphore,
    stats: CrawlStats,
}

/// What a finished task reports back to the coordinating loop
enum TaskOutcome {
    Listing {
        page: u32,
        url: Url,
        result: Result<ListingPage, FetchError>,
    },
    Detail,
}

/// What a spawned task was doing, kept so a panicked task can be accounted for
enum TaskKind {
    Listing { page: u32, url: Url },
    Detail { url: Url },
}

/// In-flight tasks and what each of them is working on
#[derive(Default)]
struct Workers {
    tasks: JoinSet<TaskOutcome>,
    kinds: HashMap<Id, TaskKind>,
}

impl Workers {
    fn spawn<F>(&mut self, kind: TaskKind, work: F)
    where
        F: Future<Output = TaskOutcome> + Send + 'static,
    {
        let handle = self.tasks.spawn(work);
        self.kinds.insert(handle.id(), kind);
    }

    /// Waits for the next task; a panicked task comes back with its kind
    async fn join_next(&mut self) -> Option<Result<TaskOutcome, (Option<TaskKind>, JoinError)>> {
        let joined = self.tasks.join_next_with_id().await?;
        Some(match joined {
            Ok((id, outcome)) => {
                self.kinds.remove(&id);
                Ok(outcome)
            }
            Err(e) => Err((self.kinds.remove(&e.id()), e)),
        })
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    ctx: Arc<CrawlContext>,
    start_url: Url,
    budget: CrawlBudget,
}

impl Coordinator {
    /// Creates a coordinator for one crawl
    ///
    /// # Arguments
    ///
    /// * `config` - The validated crawler configuration
    /// * `fetcher` - Where page content comes from
    /// * `sink` - Where finished records go
    pub fn new(
        config: &Config,
        fetcher: Arc<dyn Fetcher>,
        sink: Arc<dyn RecordSink>,
    ) -> Result<Self, HarvestError> {
        let start_url = parse_locator(&config.crawl.start_url)?;
        let budget = config.budget();
        let permits = config.crawl.max_concurrency.max(1) as usize;

        let ctx = CrawlContext {
            fetcher,
            sink,
            frontier: Frontier::new(budget),
            extractor: PageExtractor::new(&config.site.detail_path_pattern),
            recipe_type: config.crawl.recipe_type.clone(),
            permits: Semaphore::new(permits),
            stats: CrawlStats::new(),
        };

        Ok(Self {
            ctx: Arc::new(ctx),
            start_url,
            budget,
        })
    }

    /// Runs the crawl until no work is left
    ///
    /// Only a failure to fetch the first listing page is returned as an error.
    /// Every later failure is logged, counted and absorbed.
    pub async fn run(self) -> Result<CrawlSummary, HarvestError> {
        tracing::info!(
            "Starting harvest at {} (results wanted: {}, max pages: {}, details: {})",
            self.start_url,
            self.budget
                .results_wanted
                .map_or_else(|| "unbounded".to_string(), |n| n.to_string()),
            self.budget.max_pages,
            self.budget.collect_details
        );

        let start_time = std::time::Instant::now();
        let mut workers = Workers::default();
        let mut visited_listings: HashSet<String> = HashSet::new();
        let mut details_in_flight: u64 = 0;
        let mut deferred_listing: Option<(u32, Url)> = None;

        visited_listings.insert(self.start_url.to_string());
        self.spawn_listing(&mut workers, 1, self.start_url.clone());

        while let Some(joined) = workers.join_next().await {
            let outcome = match joined {
                Ok(outcome) => Some(outcome),
                Err((kind, e)) => self.recover_failed_task(kind, e),
            };

            match outcome {
                None => {}
                Some(TaskOutcome::Detail) => {
                    details_in_flight = details_in_flight.saturating_sub(1);
                }
                Some(TaskOutcome::Listing {
                    page,
                    url,
                    result: Ok(listing),
                }) => {
                    self.ctx.frontier.page_visited();
                    let admitted = self.admit_candidates(
                        &mut workers,
                        &listing.candidates,
                        &mut details_in_flight,
                    );
                    tracing::info!(
                        "Listing page {} ({}): {} candidates, {} admitted, {} emitted so far",
                        page,
                        url,
                        listing.candidates.len(),
                        admitted,
                        self.ctx.frontier.emitted()
                    );

                    deferred_listing = self.next_listing(page, listing.next, &mut visited_listings);
                }
                Some(TaskOutcome::Listing {
                    page: 1,
                    url,
                    result: Err(e),
                }) => {
                    self.ctx.stats.listing_failed();
                    return Err(HarvestError::StartupFetch {
                        url: url.to_string(),
                        reason: e.to_string(),
                    });
                }
                Some(TaskOutcome::Listing {
                    page,
                    url,
                    result: Err(e),
                }) => {
                    self.ctx.stats.listing_failed();
                    tracing::warn!(
                        "Listing page {} ({}) failed, pagination stops here: {}",
                        page,
                        url,
                        e
                    );
                }
            }

            if let Some((page, url)) = deferred_listing.take() {
                let remaining = self.ctx.frontier.remaining_budget();
                if remaining == 0 {
                    tracing::debug!("Budget met, not following listing page {}", page);
                } else if remaining > details_in_flight {
                    self.spawn_listing(&mut workers, page, url);
                } else {
                    // Wait for in-flight details to settle the budget first
                    deferred_listing = Some((page, url));
                }
            }
        }

        if let Err(e) = self.ctx.sink.finish() {
            self.ctx.stats.sink_failed();
            tracing::error!("Failed to flush record sink: {}", e);
        }

        let summary = self
            .ctx
            .stats
            .snapshot(self.ctx.frontier.emitted(), self.ctx.frontier.pages_visited());

        tracing::info!(
            "Harvest completed: {} records from {} listing pages in {:?}",
            summary.records_emitted,
            summary.listing_pages_visited,
            start_time.elapsed()
        );

        Ok(summary)
    }

    /// Admits candidates in order while the budget has room
    ///
    /// Room is the remaining budget minus the detail tasks already in flight,
    /// since each of those will claim one slot when it finishes.
    fn admit_candidates(
        &self,
        workers: &mut Workers,
        candidates: &[Url],
        details_in_flight: &mut u64,
    ) -> usize {
        let mut admitted = 0;

        for candidate in candidates {
            let room = self
                .ctx
                .frontier
                .remaining_budget()
                .saturating_sub(*details_in_flight);
            if room == 0 {
                tracing::debug!("Budget reached, skipping remaining candidates");
                break;
            }

            if !self.ctx.frontier.admit(candidate) {
                tracing::debug!("Already seen: {}", candidate);
                continue;
            }
            admitted += 1;

            if self.budget.collect_details {
                *details_in_flight += 1;
                let ctx = Arc::clone(&self.ctx);
                let url = candidate.clone();
                let kind = TaskKind::Detail {
                    url: candidate.clone(),
                };
                workers.spawn(kind, async move {
                    process_detail(ctx, url).await;
                    TaskOutcome::Detail
                });
            } else {
                self.emit_minimal(candidate);
            }
        }

        admitted
    }

    fn emit_minimal(&self, url: &Url) {
        if !self.ctx.frontier.try_claim_emission() {
            self.ctx.stats.detail_discarded();
            return;
        }

        let record = CanonicalRecord::minimal(url, &self.ctx.recipe_type, Utc::now());
        self.ctx.stats.record_minimal();
        emit(&self.ctx, &record);
    }

    /// Turns a panicked task into the outcome of an ordinary failure
    ///
    /// A listing page counts as failed. A detail locator gets the record of a
    /// page with no content, so the crawl carries on with the rest.
    fn recover_failed_task(&self, kind: Option<TaskKind>, e: JoinError) -> Option<TaskOutcome> {
        self.ctx.stats.fetch_failed();

        match kind {
            Some(TaskKind::Listing { page, url }) => {
                tracing::warn!("Listing task for {} failed: {}", url, e);
                let result = Err(FetchError::Aborted {
                    url: url.to_string(),
                    reason: e.to_string(),
                });
                Some(TaskOutcome::Listing { page, url, result })
            }
            Some(TaskKind::Detail { url }) => {
                tracing::warn!("Detail task for {} failed: {}", url, e);
                if self.ctx.frontier.try_claim_emission() {
                    let record = CanonicalRecord::finalize(
                        PartialRecord::default(),
                        &url,
                        &self.ctx.recipe_type,
                        Utc::now(),
                    );
                    self.ctx.stats.record_partial();
                    emit(&self.ctx, &record);
                } else {
                    self.ctx.stats.detail_discarded();
                }
                Some(TaskOutcome::Detail)
            }
            None => {
                tracing::error!("Untracked worker task failed: {}", e);
                None
            }
        }
    }

    /// Decides whether pagination continues after listing page `page`
    fn next_listing(
        &self,
        page: u32,
        next: Option<Url>,
        visited_listings: &mut HashSet<String>,
    ) -> Option<(u32, Url)> {
        if self.ctx.frontier.remaining_budget() == 0 {
            tracing::info!("Results budget met after listing page {}", page);
            return None;
        }
        if page >= self.budget.max_pages {
            tracing::info!("Reached max pages ({})", self.budget.max_pages);
            return None;
        }

        let next = match next {
            Some(next) => next,
            None => {
                tracing::info!("No next page after listing page {}", page);
                return None;
            }
        };

        if !visited_listings.insert(next.to_string()) {
            tracing::debug!("Next link {} points to a visited listing page", next);
            return None;
        }

        Some((page + 1, next))
    }

    fn spawn_listing(&self, workers: &mut Workers, page: u32, url: Url) {
        let ctx = Arc::clone(&self.ctx);
        let kind = TaskKind::Listing {
            page,
            url: url.clone(),
        };
        workers.spawn(kind, async move {
            let result = process_listing(&ctx, &url).await;
            TaskOutcome::Listing { page, url, result }
        });
    }
}

impl CrawlContext {
    /// Fetches a page and rejects responses that carry nothing usable
    async fn fetch_page(&self, url: &Url) -> Result<FetchResponse, FetchError> {
        self.fetcher.fetch(url).await?.ensure_success(url)
    }
}

async fn process_listing(ctx: &CrawlContext, url: &Url) -> Result<ListingPage, FetchError> {
    let _permit = ctx.permits.acquire().await.ok();

    let response = ctx.fetch_page(url).await.map_err(|e| {
        ctx.stats.fetch_failed();
        e
    })?;

    let base = response.base_url(url);
    Ok(ctx.extractor.listing(&response.body, &base))
}

/// Runs the detail workflow for one admitted locator
async fn process_detail(ctx: Arc<CrawlContext>, url: Url) {
    let _permit = ctx.permits.acquire().await.ok();

    if ctx.frontier.remaining_budget() == 0 {
        ctx.stats.detail_dropped();
        tracing::debug!("Budget met, dropping {}", url);
        return;
    }

    let (mut record, primary_ok) = match ctx.fetch_page(&url).await {
        Ok(response) => (ctx.extractor.detail(&response.body), true),
        Err(e) => {
            ctx.stats.fetch_failed();
            tracing::warn!("Detail fetch failed: {}", e);
            (PartialRecord::default(), false)
        }
    };

    if !record.is_core_complete() {
        record = recover_from_alternates(&ctx, &url, record, primary_ok).await;
    }

    let complete = record.is_core_complete();
    let finished = CanonicalRecord::finalize(record, &url, &ctx.recipe_type, Utc::now());

    if !ctx.frontier.try_claim_emission() {
        ctx.stats.detail_discarded();
        tracing::debug!("Budget met while processing {}, discarding", url);
        return;
    }

    if complete {
        ctx.stats.record_complete();
    } else {
        ctx.stats.record_partial();
        tracing::info!("Emitting partial record for {}", url);
    }
    emit(&ctx, &finished);
}

/// Tries alternate endpoints in order until the record is core-complete
///
/// The bare canonical locator is skipped when it is the page that was just
/// fetched successfully, since it would return the same content.
async fn recover_from_alternates(
    ctx: &CrawlContext,
    url: &Url,
    mut record: PartialRecord,
    primary_ok: bool,
) -> PartialRecord {
    for alternate in alternates_for(url) {
        if primary_ok && alternate == *url {
            continue;
        }

        ctx.stats.alternate_fetched();
        match ctx.fetch_page(&alternate).await {
            Ok(response) => {
                let extra = ctx.extractor.detail(&response.body);
                record = merge(record, Some(&extra));
            }
            Err(e) => {
                ctx.stats.fetch_failed();
                tracing::debug!("Alternate unavailable: {}", e);
            }
        }

        if record.is_core_complete() {
            tracing::debug!("Record for {} completed via {}", url, alternate);
            break;
        }
    }

    record
}

fn emit(ctx: &CrawlContext, record: &CanonicalRecord) {
    if let Err(e) = ctx.sink.emit(record) {
        ctx.stats.sink_failed();
        tracing::error!("Failed to emit record for {}: {}", record.url, e);
    }
}

/// Runs a complete harvest with the production fetcher and JSON-lines output
///
/// # Arguments
///
/// * `config` - The validated crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - Crawl finished; records were appended to the output file
/// * `Err(HarvestError)` - Setup failed or the first listing page was unreachable
pub async fn harvest(config: &Config) -> Result<CrawlSummary, HarvestError> {
    let fetcher = Arc::new(HttpFetcher::new(&config.user_agent)?);
    let sink = Arc::new(JsonLinesSink::create(Path::new(&config.output.records_path))?);

    Coordinator::new(config, fetcher, sink)?.run().await
}
