use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{ScraperSettings, SearchFilters};
use crate::extract::parse_search_page;
use crate::models::JobPosting;
use crate::snippet::normalize_snippet;
use crate::transport::{FetchRequest, Transport};
use crate::urls::SiteUrls;

/// One search to run: a query, where, and how many unique jobs to collect.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub query: String,
    pub location: String,
    pub max_results: usize,
    pub filters: SearchFilters,
}

/// Query parameters for one page of results.
pub fn search_params(search: &SearchQuery, page: usize) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = vec![
        ("keywords".to_string(), search.query.clone()),
        ("location".to_string(), search.location.clone()),
        ("refresh".to_string(), "true".to_string()),
        ("position".to_string(), "1".to_string()),
        ("pageNum".to_string(), page.to_string()),
    ];
    params.extend(filter_params(&search.filters));
    params
}

/// Each recognized filter maps to a fixed parameter; lists are comma-joined.
pub fn filter_params(filters: &SearchFilters) -> Vec<(String, String)> {
    let lists = [
        ("f_E", &filters.experience_level),
        ("f_JT", &filters.employment_type),
        ("f_WT", &filters.workplace_type),
        ("f_TPR", &filters.date_posted),
        ("f_I", &filters.industry_ids),
    ];

    let mut params: Vec<(String, String)> = lists
        .into_iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(name, values)| (name.to_string(), values.join(",")))
        .collect();

    if filters.easy_apply {
        params.push(("f_AL".to_string(), "true".to_string()));
    }
    if filters.under_ten_applicants {
        params.push(("f_UD".to_string(), "1".to_string()));
    }
    params
}

/// Pages through search results for a single query.
#[derive(Clone)]
pub struct SearchPaginator {
    transport: Arc<dyn Transport>,
    settings: Arc<ScraperSettings>,
    site: SiteUrls,
}

impl SearchPaginator {
    pub fn new(transport: Arc<dyn Transport>, settings: Arc<ScraperSettings>) -> Self {
        let site = SiteUrls::new(&settings);
        Self {
            transport,
            settings,
            site,
        }
    }

    /// Collects up to `max_results` jobs unique by id within this search.
    ///
    /// Stops at the page cap, on the first page with no parseable jobs, or
    /// on the first failed request. Failures end the search with whatever
    /// was collected so far.
    pub async fn run(&self, search: &SearchQuery) -> Vec<JobPosting> {
        info!(
            query = %search.query,
            location = %search.location,
            max_results = search.max_results,
            page_size = self.settings.results_per_page,
            "Searching jobs"
        );

        let mut collected: Vec<JobPosting> = Vec::new();
        let mut seen_ids: HashSet<String> = HashSet::new();
        let mut page = 0;

        while collected.len() < search.max_results && page < self.settings.max_pages {
            let Some(html) = self.fetch_page(search, page).await else {
                break;
            };

            let snippets = parse_search_page(&html, &self.site);
            if snippets.is_empty() {
                info!(query = %search.query, page, "No job snippets parsed, stopping");
                break;
            }

            for snippet in snippets {
                let job = normalize_snippet(snippet, &self.site);
                if !job.is_complete() || !seen_ids.insert(job.id.clone()) {
                    continue;
                }
                collected.push(job);
                if collected.len() >= search.max_results {
                    break;
                }
            }

            page += 1;
        }

        info!(query = %search.query, count = collected.len(), "Search produced unique jobs");
        collected
    }

    async fn fetch_page(&self, search: &SearchQuery, page: usize) -> Option<String> {
        let request = FetchRequest::get(&self.settings.base_url, self.settings.request_timeout())
            .with_query(search_params(search, page))
            .with_headers(self.settings.headers());
        debug!(url = %self.settings.base_url, page, "Requesting search page");

        let result = match self.transport.fetch(request).await {
            Ok(response) => response.error_for_status(&self.settings.base_url),
            Err(e) => Err(e),
        };

        match result {
            Ok(html) => Some(html),
            Err(e) => {
                warn!(
                    query = %search.query,
                    location = %search.location,
                    page,
                    error = %e,
                    "Search request failed"
                );
                None
            }
        }
    }
}

#[cfg(test)]
pub mod fixtures {
    /// Search page carrying one JSON-LD block per job id.
    pub fn structured_page(ids: &[&str]) -> String {
        let blocks: String = ids
            .iter()
            .map(|id| {
                format!(
                    r#"<script type="application/ld+json">{{"@type": "JobPosting", "title": "Job {id}",
                       "identifier": {{"value": "{id}"}},
                       "url": "https://www.linkedin.com/jobs/view/{id}/",
                       "jobLocation": {{"address": {{"addressLocality": "Denver, CO"}}}}}}</script>"#
                )
            })
            .collect();
        format!("<html><body>{}</body></html>", blocks)
    }

    pub const EMPTY_PAGE: &str = "<html><body><p>No more jobs.</p></body></html>";
}
