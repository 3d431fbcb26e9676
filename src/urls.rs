use regex::Regex;
use url::Url;

use crate::config::ScraperSettings;

pub const COMPANY_PATH_MARKER: &str = "/company/";
const DEFAULT_DETAIL_PATH: &str = "/jobs/view/";

/// Pulls a job id out of a URL: the `/view/<digits>` segment when present,
/// otherwise the first run of digits anywhere.
pub fn extract_job_id(url: &str) -> Option<String> {
    let re = Regex::new(r"/view/(\d+)").ok()?;
    if let Some(cap) = re.captures(url) {
        return cap.get(1).map(|m| m.as_str().to_string());
    }

    let re = Regex::new(r"\d+").ok()?;
    re.find(url).map(|m| m.as_str().to_string())
}

/// Drops the query string and fragment; listing sites hang tracking
/// parameters off otherwise identical job links.
pub fn clean_tracking_url(url: &str) -> Option<String> {
    if url.is_empty() {
        return None;
    }
    let end = url.find(['?', '#']).unwrap_or(url.len());
    Some(url[..end].to_string())
}

/// URL rules for one listing site, derived from the scraper settings.
#[derive(Debug, Clone)]
pub struct SiteUrls {
    origin: Option<Url>,
    job_view_base: String,
    detail_path: String,
}

impl SiteUrls {
    pub fn new(settings: &ScraperSettings) -> Self {
        let origin = Url::parse(&settings.base_url).ok().and_then(|u| u.join("/").ok());
        let detail_path = Url::parse(&settings.job_view_base_url)
            .ok()
            .map(|u| u.path().to_string())
            .filter(|p| p.len() > 1)
            .unwrap_or_else(|| DEFAULT_DETAIL_PATH.to_string());

        Self {
            origin,
            job_view_base: settings.job_view_base_url.clone(),
            detail_path,
        }
    }

    /// Path fragment that marks a link as a job detail page.
    pub fn detail_path(&self) -> &str {
        &self.detail_path
    }

    /// Canonical absolute form of a job URL or bare job id, without
    /// tracking parameters.
    pub fn job_url(&self, url: &str) -> String {
        let url = url.trim();
        let absolute = if url.starts_with("http") {
            url.to_string()
        } else if url.starts_with('/') {
            self.absolute(url)
        } else if !url.is_empty() && url.chars().all(|c| c.is_ascii_digit()) {
            format!("{}{}/", self.job_view_base, url)
        } else {
            format!("{}{}", self.job_view_base, url)
        };
        clean_tracking_url(&absolute).unwrap_or(absolute)
    }

    /// Resolves a possibly relative link against the site origin.
    pub fn absolute(&self, href: &str) -> String {
        if href.starts_with("http") {
            return href.to_string();
        }
        self.origin
            .as_ref()
            .and_then(|origin| origin.join(href).ok())
            .map(|u| u.to_string())
            .unwrap_or_else(|| href.to_string())
    }
}
