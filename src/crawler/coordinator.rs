//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the worker loop that coordinates all aspects of
//! the crawling process, including:
//! - Seeding the frontier
//! - Coordinating fetching, link resolution, and admission
//! - Routing per-page failures to the error collector
//! - Handling stop signals with a bounded drain
//! - Handing the final stats to the reporter

use crate::config::SeedConfig;
use crate::crawler::fetcher::{FetchedPage, PageFetcher};
use crate::crawler::frontier::{Admission, Frontier, FrontierEntry};
use crate::crawler::scheduler::Scheduler;
use crate::output::{ErrorCollector, ErrorRecord, OutputResult, RunReporter, RunStats, StatsCollector};
use crate::state::FinishReason;
use crate::PageError;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinSet;

/// How often (in visited pages) progress is logged
const PROGRESS_INTERVAL: u64 = 10;

/// Everything a finished crawl produced
#[derive(Debug)]
pub struct CrawlOutcome {
    /// Final stats, as handed to the reporter
    pub stats: RunStats,

    /// Per-page failures, in the order they occurred
    pub errors: Vec<ErrorRecord>,

    pub finish_reason: FinishReason,

    /// What the reporter returned
    pub report: OutputResult<()>,
}

/// State shared by all workers of one run
struct Crawl {
    seed: SeedConfig,
    fetcher: Arc<dyn PageFetcher>,
    frontier: Frontier,
    scheduler: Scheduler,
    errors: ErrorCollector,
    stats: StatsCollector,
}

/// Traversal engine for a single crawl
pub struct Engine {
    seed: SeedConfig,
    fetcher: Arc<dyn PageFetcher>,
    shutdown: Option<watch::Receiver<bool>>,
}

impl Engine {
    /// Creates a new engine
    ///
    /// # Arguments
    ///
    /// * `seed` - Run settings, including the start URL and budgets
    /// * `fetcher` - Fetch-and-extract backend
    pub fn new(seed: SeedConfig, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            seed,
            fetcher,
            shutdown: None,
        }
    }

    /// Stops the crawl when the receiver observes `true`
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Runs the crawl to completion and reports it
    ///
    /// This method:
    /// 1. Admits the seed at depth 0
    /// 2. Spawns the configured number of workers
    /// 3. Waits for the workers to run out of work, or for a stop signal
    /// 4. On a stop signal, gives in-flight pages the drain grace, then aborts
    ///    the rest and records them as abandoned
    /// 5. Closes the engine, finalizes stats, and calls the reporter once
    ///
    /// Page failures never end the run early. The returned outcome carries the
    /// reporter's result so the caller can decide how to surface it.
    pub async fn run(self, reporter: &dyn RunReporter) -> CrawlOutcome {
        let crawl = Arc::new(Crawl {
            frontier: Frontier::for_seed(&self.seed),
            scheduler: Scheduler::new(self.seed.max_pages, self.seed.fetch_delay),
            errors: ErrorCollector::new(),
            stats: StatsCollector::new(),
            fetcher: self.fetcher,
            seed: self.seed,
        });

        tracing::info!(
            "Starting crawl at {} (domain {}, max depth {}, max pages {}, {} worker(s))",
            crawl.seed.start_url,
            crawl.seed.allowed_domain,
            crawl.seed.max_depth,
            crawl.seed.max_pages,
            crawl.seed.workers
        );

        match crawl.frontier.admit_seed(&crawl.seed.start_url) {
            Ok(entry) => {
                crawl.scheduler.enqueue(entry);
            }
            Err(e) => crawl.errors.record(crawl.seed.raw_start_url.as_str(), &e),
        }

        let mut workers = JoinSet::new();
        for id in 0..crawl.seed.workers.max(1) {
            workers.spawn(Arc::clone(&crawl).worker(id));
        }

        let mut shutdown = self.shutdown;
        let interrupted = tokio::select! {
            _ = join_workers(&mut workers) => false,
            _ = stop_requested(&mut shutdown) => true,
        };

        if interrupted {
            crawl.drain(&mut workers).await;
        }

        crawl.finish(reporter)
    }
}

impl Crawl {
    async fn worker(self: Arc<Self>, id: usize) {
        tracing::debug!("Worker {} started", id);

        while let Some(entry) = self.scheduler.next().await {
            let visited = self.process(&entry).await;
            self.scheduler.complete(&entry.url, visited);

            if visited {
                let pages = self.scheduler.pages_visited();
                if pages % PROGRESS_INTERVAL == 0 {
                    tracing::info!(
                        "Progress: {} pages visited, {} queued, {} errors",
                        pages,
                        self.scheduler.queued(),
                        self.errors.len()
                    );
                }
            }
        }

        tracing::debug!("Worker {} finished", id);
    }

    /// Fetches one page and expands its links
    ///
    /// Returns true if the page counts as visited. A page whose fetch lands
    /// on one already fetched, before or after redirects, does not count.
    async fn process(&self, entry: &FrontierEntry) -> bool {
        if !self.frontier.claim_fetch(&entry.url) {
            tracing::debug!("Already fetched through a redirect: {}", entry.target);
            return false;
        }

        tracing::info!("Scraping: {}", entry.target);

        let deadline = self.seed.fetch_timeout;
        let page = match tokio::time::timeout(deadline, self.fetcher.fetch(&entry.target)).await {
            Ok(Ok(page)) => page,
            Ok(Err(e)) => {
                self.errors.record(entry.target.as_str(), &e);
                return false;
            }
            Err(_) => {
                self.errors
                    .record(entry.target.as_str(), &PageError::Timeout(deadline));
                return false;
            }
        };

        if !self.frontier.mark_landed(entry, &page.final_url) {
            tracing::debug!(
                "{} redirected to an already fetched page: {}",
                entry.target,
                page.final_url
            );
            return false;
        }

        self.stats.record_visit_depth(entry.depth);
        self.expand(entry, &page);
        true
    }

    /// Resolves each href against the final URL and offers it to the frontier
    ///
    /// A link that cannot be resolved is recorded against the page and ends
    /// expansion of that page; links already admitted stay admitted.
    fn expand(&self, entry: &FrontierEntry, page: &FetchedPage) {
        for href in &page.links {
            let link = match page.final_url.join(href) {
                Ok(link) => link,
                Err(source) => {
                    self.errors.record(
                        page.final_url.as_str(),
                        &PageError::Join {
                            href: href.clone(),
                            source,
                        },
                    );
                    return;
                }
            };

            match self.frontier.try_admit(&link, entry.depth) {
                Admission::Admitted(child) => {
                    let target = child.target.clone();
                    if self.scheduler.enqueue(child) {
                        tracing::info!("Following link: {}", target);
                        self.stats.record_followed();
                    } else {
                        tracing::debug!("Engine draining, dropped {}", target);
                    }
                }
                Admission::Rejected(reason) => {
                    tracing::debug!("Skipping {} ({:?})", link, reason);
                    self.stats.record_skipped(reason);
                }
            }
        }
    }

    /// Stops dispatching and waits out the drain grace
    async fn drain(&self, workers: &mut JoinSet<()>) {
        self.scheduler.begin_drain(FinishReason::Shutdown);
        tracing::warn!(
            "Stop requested, waiting up to {:?} for {} in-flight page(s)",
            self.seed.drain_grace,
            self.scheduler.in_flight()
        );

        if tokio::time::timeout(self.seed.drain_grace, join_workers(workers))
            .await
            .is_err()
        {
            tracing::warn!("Drain grace expired, aborting workers");
            workers.abort_all();
            join_workers(workers).await;
        }

        for entry in self.scheduler.abandon_in_flight() {
            self.errors.record(entry.target.as_str(), &PageError::Abandoned);
        }
    }

    fn finish(&self, reporter: &dyn RunReporter) -> CrawlOutcome {
        if let Err(e) = self.scheduler.close() {
            tracing::error!("Failed to close engine: {}", e);
        }

        let finish_reason = self
            .scheduler
            .finish_reason()
            .unwrap_or(FinishReason::Finished);
        let errors = self.errors.snapshot();
        let stats = self.stats.finalize(
            self.scheduler.pages_visited(),
            errors.len() as u64,
            finish_reason,
        );

        tracing::info!("Spider closed: {}", finish_reason);

        let report = reporter.emit(&stats, &errors);

        CrawlOutcome {
            stats,
            errors,
            finish_reason,
            report,
        }
    }
}

/// Waits for every worker task to end, logging panics
async fn join_workers(workers: &mut JoinSet<()>) {
    while let Some(result) = workers.join_next().await {
        if let Err(e) = result {
            if e.is_panic() {
                tracing::error!("Worker panicked: {}", e);
            }
        }
    }
}

/// Resolves once the stop signal reads `true`; never resolves without a receiver
async fn stop_requested(shutdown: &mut Option<watch::Receiver<bool>>) {
    let Some(rx) = shutdown else {
        return std::future::pending().await;
    };

    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            // Sender gone without a stop; let the crawl finish on its own.
            return std::future::pending().await;
        }
    }
}
