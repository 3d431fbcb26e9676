use std::sync::Arc;

use tracing::{debug, warn};

use crate::company::{CompanyEnricher, CompanyProfile};
use crate::config::ScraperSettings;
use crate::error::TransportError;
use crate::extract::parse_detail_page;
use crate::models::JobPosting;
use crate::transport::{FetchRequest, Transport};
use crate::urls::SiteUrls;

/// Outcome of enriching one job. Either way the caller gets a record back.
#[derive(Debug)]
pub enum Enrichment {
    Updated(JobPosting),
    Unchanged { job: JobPosting, reason: TransportError },
}

impl Enrichment {
    pub fn is_updated(&self) -> bool {
        matches!(self, Enrichment::Updated(_))
    }

    pub fn into_job(self) -> JobPosting {
        match self {
            Enrichment::Updated(job) => job,
            Enrichment::Unchanged { job, .. } => job,
        }
    }
}

#[derive(Clone)]
pub struct DetailEnricher {
    transport: Arc<dyn Transport>,
    settings: Arc<ScraperSettings>,
    site: SiteUrls,
    company: CompanyEnricher,
}

impl DetailEnricher {
    pub fn new(transport: Arc<dyn Transport>, settings: Arc<ScraperSettings>) -> Self {
        let site = SiteUrls::new(&settings);
        let company = CompanyEnricher::new(transport.clone(), settings.clone());
        Self {
            transport,
            settings,
            site,
            company,
        }
    }

    /// Fetches the job's detail page and merges what it finds into `base`.
    /// A failed fetch hands `base` back untouched.
    pub async fn enrich(&self, base: JobPosting) -> Enrichment {
        debug!(id = %base.id, url = %base.url, "Fetching job details");

        let html = match self.fetch_detail(&base.url).await {
            Ok(html) => html,
            Err(reason) => {
                warn!(id = %base.id, error = %reason, "Failed to fetch job details");
                return Enrichment::Unchanged { job: base, reason };
            }
        };

        let mut details = parse_detail_page(&html, &self.site);
        if let Some(company_url) = details.company_url.as_deref() {
            match self.company.enrich(company_url).await {
                CompanyProfile::Found(info) => details.company = Some(info),
                CompanyProfile::Unavailable { placeholder, reason } => debug!(
                    id = %base.id,
                    profile = ?placeholder.linkedin_url,
                    error = %reason,
                    "Keeping company from search results"
                ),
            }
        }

        let mut job = base;
        job.merge(details);
        Enrichment::Updated(job)
    }

    async fn fetch_detail(&self, url: &str) -> Result<String, TransportError> {
        let request = FetchRequest::get(url, self.settings.request_timeout())
            .with_headers(self.settings.headers());
        self.transport.fetch(request).await?.error_for_status(url)
    }
}
