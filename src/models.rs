use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobState {
    Listed,
    #[default]
    Unknown,
}

/// Structured view of a free-text location. Always derived from `text`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedLocation {
    pub text: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobLocation {
    pub raw_text: Option<String>,
    pub parsed: ParsedLocation,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalaryRange {
    pub text: Option<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInfo {
    pub name: Option<String>,
    pub employee_count: Option<u64>,
    pub linkedin_url: Option<String>,
    pub industries: Vec<String>,
    pub logo_url: Option<String>,
    pub hq: Option<String>,
}

impl CompanyInfo {
    /// Placeholder used when the profile page could not be read.
    pub fn placeholder(profile_url: &str) -> Self {
        Self {
            linkedin_url: Some(profile_url.to_string()),
            ..Default::default()
        }
    }

    /// Field-wise upgrade: only present values in `other` replace ours.
    pub fn merge(&mut self, other: CompanyInfo) {
        merge_opt(&mut self.name, other.name);
        merge_opt(&mut self.employee_count, other.employee_count);
        merge_opt(&mut self.linkedin_url, other.linkedin_url);
        merge_opt(&mut self.logo_url, other.logo_url);
        merge_opt(&mut self.hq, other.hq);
        if !other.industries.is_empty() {
            self.industries = other.industries;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyMethod {
    pub url: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
    pub id: String,
    pub title: Option<String>,
    pub url: String,
    pub state: JobState,
    pub posted_date: Option<DateTime<FixedOffset>>,
    pub expire_at: Option<DateTime<FixedOffset>>,
    pub description_text: Option<String>,
    pub description_html: Option<String>,
    pub location: JobLocation,
    pub employment_type: Option<String>,
    pub workplace_type: Option<String>,
    pub salary: SalaryRange,
    pub company: CompanyInfo,
    pub benefits: Vec<String>,
    pub job_functions: Vec<String>,
    pub applicants: Option<u64>,
    pub views: Option<u64>,
    pub apply_method: Option<ApplyMethod>,
}

impl JobPosting {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            url: url.into(),
            state: JobState::Unknown,
            posted_date: None,
            expire_at: None,
            description_text: None,
            description_html: None,
            location: JobLocation::default(),
            employment_type: None,
            workplace_type: None,
            salary: SalaryRange::default(),
            company: CompanyInfo::default(),
            benefits: Vec::new(),
            job_functions: Vec::new(),
            applicants: None,
            views: None,
            apply_method: None,
        }
    }

    /// A record may enter the output set only with both of these filled.
    pub fn is_complete(&self) -> bool {
        !self.id.is_empty() && !self.url.is_empty()
    }

    /// Folds detail-page data into this record. Absent values never clobber
    /// what the search phase already found.
    pub fn merge(&mut self, details: JobDetails) {
        merge_opt(&mut self.description_html, details.description_html);
        merge_opt(&mut self.description_text, details.description_text);
        merge_opt(&mut self.applicants, details.applicants);
        merge_opt(&mut self.views, details.views);
        merge_opt(&mut self.apply_method, details.apply_method);
        if let Some(benefits) = details.benefits {
            self.benefits = benefits;
        }
        if let Some(functions) = details.job_functions {
            self.job_functions = functions;
        }
        if let Some(company) = details.company {
            self.company.merge(company);
        }
    }
}

/// Enrichment pulled from one job detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobDetails {
    pub description_html: Option<String>,
    pub description_text: Option<String>,
    pub applicants: Option<u64>,
    pub views: Option<u64>,
    pub benefits: Option<Vec<String>>,
    pub job_functions: Option<Vec<String>>,
    pub apply_method: Option<ApplyMethod>,
    pub company_url: Option<String>,
    pub company: Option<CompanyInfo>,
}

fn merge_opt<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}
