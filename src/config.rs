use anyhow::{Context, Result, anyhow};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::path::Path;
use std::time::Duration;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub scraper: ScraperSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScraperSettings {
    pub base_url: String,
    pub job_view_base_url: String,
    pub user_agent: String,
    pub max_pages: usize,
    /// Informational; the listing source decides the real page size.
    pub results_per_page: usize,
    pub max_workers: usize,
    pub default_max_results: usize,
    pub request_timeout_secs: u64,
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            base_url: "https://www.linkedin.com/jobs/search/".to_string(),
            job_view_base_url: "https://www.linkedin.com/jobs/view/".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_pages: 2,
            results_per_page: 25,
            max_workers: 6,
            default_max_results: 50,
            request_timeout_secs: 20,
        }
    }
}

impl ScraperSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Headers sent with every request.
    pub fn headers(&self) -> Vec<(String, String)> {
        vec![
            ("User-Agent".to_string(), self.user_agent.clone()),
            ("Accept-Language".to_string(), "en-US,en;q=0.9".to_string()),
        ]
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Inputs {
    #[serde(default)]
    pub searches: Vec<SearchSpec>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSpec {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub location: String,
    pub max_results: Option<usize>,
    #[serde(default)]
    pub filters: SearchFilters,
}

/// Recognized search filters. Unknown keys in the input are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    #[serde(default, deserialize_with = "filter_values")]
    pub experience_level: Vec<String>,
    #[serde(default, deserialize_with = "filter_values")]
    pub employment_type: Vec<String>,
    #[serde(default, deserialize_with = "filter_values")]
    pub workplace_type: Vec<String>,
    #[serde(default, deserialize_with = "filter_values")]
    pub date_posted: Vec<String>,
    #[serde(default, deserialize_with = "filter_values")]
    pub industry_ids: Vec<String>,
    #[serde(default)]
    pub easy_apply: bool,
    #[serde(default)]
    pub under_ten_applicants: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FilterScalar {
    Text(String),
    Number(serde_json::Number),
    Flag(bool),
}

impl FilterScalar {
    fn into_string(self) -> String {
        match self {
            FilterScalar::Text(s) => s.trim().to_string(),
            FilterScalar::Number(n) => n.to_string(),
            FilterScalar::Flag(b) => b.to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(FilterScalar),
    Many(Vec<FilterScalar>),
}

// Accepts "2", 2, or ["2", 3].
fn filter_values<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(v)) => vec![v.into_string()],
        Some(OneOrMany::Many(vs)) => vs.into_iter().map(FilterScalar::into_string).collect(),
    };
    Ok(values.into_iter().filter(|v| !v.is_empty()).collect())
}

pub fn load_settings(path: &Path) -> Result<Settings> {
    load_json(path, "Settings")
}

pub fn load_inputs(path: &Path) -> Result<Inputs> {
    load_json(path, "Inputs")
}

fn load_json<T: DeserializeOwned>(path: &Path, label: &str) -> Result<T> {
    if !path.is_file() {
        return Err(anyhow!("{} file not found: {}", label, path.display()));
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} file: {}", label, path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {} file: {}", label, path.display()))
}
