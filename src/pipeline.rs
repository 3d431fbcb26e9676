//! Two-phase scrape: concurrent searches, a single-threaded dedup, then
//! concurrent detail enrichment.
//!
//! Each phase fans tasks out over a `Semaphore`-bounded pool. Tasks share
//! nothing mutable; results are gathered by joining the handles in
//! submission order, so the dedup step sees searches in the order they
//! were given and "first occurrence wins" is deterministic.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::config::{ScraperSettings, SearchSpec};
use crate::detail::{DetailEnricher, Enrichment};
use crate::models::JobPosting;
use crate::search::{SearchPaginator, SearchQuery};
use crate::transport::Transport;

pub struct Pipeline {
    settings: Arc<ScraperSettings>,
    paginator: SearchPaginator,
    enricher: DetailEnricher,
    max_workers: usize,
}

impl Pipeline {
    pub fn new(transport: Arc<dyn Transport>, settings: ScraperSettings) -> Self {
        let settings = Arc::new(settings);
        let max_workers = settings.max_workers.max(1);
        Self {
            paginator: SearchPaginator::new(transport.clone(), settings.clone()),
            enricher: DetailEnricher::new(transport, settings.clone()),
            settings,
            max_workers,
        }
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    /// Turns input specs into runnable queries, skipping any without a title.
    pub fn queries(&self, searches: &[SearchSpec]) -> Vec<SearchQuery> {
        searches
            .iter()
            .filter_map(|spec| {
                let title = spec.title.trim();
                if title.is_empty() {
                    warn!(location = %spec.location, "Skipping search with empty title");
                    return None;
                }
                Some(SearchQuery {
                    query: title.to_string(),
                    location: spec.location.trim().to_string(),
                    max_results: spec.max_results.unwrap_or(self.settings.default_max_results),
                    filters: spec.filters.clone(),
                })
            })
            .collect()
    }

    pub async fn run(&self, searches: &[SearchSpec]) -> Vec<JobPosting> {
        let queries = self.queries(searches);
        if queries.is_empty() {
            warn!("No searches defined in inputs");
            return Vec::new();
        }

        info!(searches = queries.len(), workers = self.max_workers, "Starting discovery");
        let jobs = self.discover(queries).await;

        info!(jobs = jobs.len(), "Collected unique jobs, fetching details");
        self.enrich(jobs).await
    }

    /// Phase 1. A search task that dies contributes nothing; its siblings
    /// are unaffected.
    pub async fn discover(&self, queries: Vec<SearchQuery>) -> Vec<JobPosting> {
        let semaphore = Arc::new(Semaphore::new(self.max_workers));

        let mut handles = Vec::with_capacity(queries.len());
        for query in queries {
            let paginator = self.paginator.clone();
            let sem = semaphore.clone();
            let label = query.query.clone();
            let handle = tokio::spawn(async move {
                let _permit = sem.acquire().await;
                paginator.run(&query).await
            });
            handles.push((label, handle));
        }

        let mut batches = Vec::with_capacity(handles.len());
        for (label, handle) in handles {
            match handle.await {
                Ok(jobs) => {
                    info!(query = %label, count = jobs.len(), "Search returned jobs");
                    batches.push(jobs);
                }
                Err(e) => error!(query = %label, error = %e, "Search task failed"),
            }
        }

        dedup_by_id(batches)
    }

    /// Phase 2. Every input job comes back out, enriched or not.
    pub async fn enrich(&self, jobs: Vec<JobPosting>) -> Vec<JobPosting> {
        let semaphore = Arc::new(Semaphore::new(self.max_workers));

        let mut handles = Vec::with_capacity(jobs.len());
        for job in jobs {
            let enricher = self.enricher.clone();
            let sem = semaphore.clone();
            let fallback = job.clone();
            let handle = tokio::spawn(async move {
                let _permit = sem.acquire().await;
                enricher.enrich(job).await
            });
            handles.push((fallback, handle));
        }

        let mut enriched = 0;
        let mut results = Vec::with_capacity(handles.len());
        for (fallback, handle) in handles {
            match handle.await {
                Ok(outcome) => {
                    if outcome.is_updated() {
                        enriched += 1;
                    } else if let Enrichment::Unchanged { job, reason } = &outcome {
                        debug!(id = %job.id, reason = %reason, "Keeping listing without details");
                    }
                    results.push(outcome.into_job());
                }
                Err(e) => {
                    error!(id = %fallback.id, error = %e, "Failed to enrich job");
                    results.push(fallback);
                }
            }
        }

        info!(total = results.len(), enriched, "Fetched job details");
        results
    }
}

/// Flattens per-search results keeping the first record seen for each id.
pub fn dedup_by_id(batches: Vec<Vec<JobPosting>>) -> Vec<JobPosting> {
    let mut seen: HashSet<String> = HashSet::new();
    batches
        .into_iter()
        .flatten()
        .filter(|job| seen.insert(job.id.clone()))
        .collect()
}
