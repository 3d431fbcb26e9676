//! HTML extraction for search result pages and job detail pages.
//!
//! Both modes run explicit, ordered lists of named attempts. Search pages
//! try embedded structured data first and only fall back to scanning job
//! links when that yields nothing. Detail pages resolve each field through
//! its own small chain. Nothing here fails: malformed blocks are skipped
//! and missing fields come back as `None`.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::debug;

use crate::models::{ApplyMethod, JobDetails};
use crate::urls::{COMPANY_PATH_MARKER, SiteUrls, clean_tracking_url, extract_job_id};

const LD_JSON_TYPE: &str = "application/ld+json";
const JOB_POSTING_TYPE: &str = "JobPosting";

/// One candidate job from a search results page, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawSnippet {
    Structured(StructuredPosting),
    Anchor(AnchorSnippet),
}

/// Minimal snippet synthesized from a job link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorSnippet {
    pub id: String,
    pub title: Option<String>,
    pub url: String,
}

/// The subset of a JSON-LD `JobPosting` object this crate reads.
///
/// Salary bounds stay as raw JSON so numeric coercion happens in one place
/// during normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuredPosting {
    pub identifier: Option<String>,
    pub alternate_id: Option<String>,
    pub url: Option<String>,
    pub title: Option<String>,
    pub date_posted: Option<String>,
    pub valid_through: Option<String>,
    pub description: Option<String>,
    pub employment_type: Option<String>,
    pub job_location_type: Option<String>,
    pub organization_name: Option<String>,
    pub organization_url: Option<String>,
    pub organization_logo: Option<String>,
    pub location_text: Option<String>,
    pub salary_currency: Option<String>,
    pub salary_min: Option<Value>,
    pub salary_max: Option<Value>,
}

impl StructuredPosting {
    pub fn from_value(value: &Value) -> Self {
        let identifier = value.get("identifier");
        let (id, alternate_id) = match identifier {
            Some(Value::Object(_)) => (
                identifier.and_then(|v| v.get("value")).and_then(scalar_string),
                identifier.and_then(|v| v.get("@id")).and_then(scalar_string),
            ),
            Some(other) => (scalar_string(other), None),
            None => (None, None),
        };

        let organization = value.get("hiringOrganization");
        let organization_logo = organization.and_then(|org| match org.get("logo") {
            Some(Value::Object(logo)) => logo.get("url").and_then(scalar_string),
            Some(other) => scalar_string(other),
            None => None,
        });

        let location_text = match value.get("jobLocation") {
            Some(Value::Array(items)) => items.first().and_then(address_locality),
            Some(item) => address_locality(item),
            None => None,
        };

        let salary = value.get("baseSalary");
        let salary_value = salary.and_then(|s| s.get("value"));

        Self {
            identifier: id,
            alternate_id,
            url: text_field(value, "url"),
            title: text_field(value, "title"),
            date_posted: text_field(value, "datePosted"),
            valid_through: text_field(value, "validThrough"),
            description: text_field(value, "description"),
            employment_type: value.get("employmentType").and_then(joined_strings),
            job_location_type: value.get("jobLocationType").and_then(joined_strings),
            organization_name: organization.and_then(|org| text_field(org, "name")),
            organization_url: organization.and_then(|org| text_field(org, "sameAs")),
            organization_logo,
            location_text,
            salary_currency: salary.and_then(|s| text_field(s, "currency")),
            salary_min: salary_value.and_then(|v| v.get("minValue")).cloned(),
            salary_max: salary_value.and_then(|v| v.get("maxValue")).cloned(),
        }
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

fn text_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(scalar_string)
}

fn joined_strings(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(scalar_string).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        other => scalar_string(other),
    }
}

fn address_locality(location: &Value) -> Option<String> {
    location
        .get("address")
        .and_then(|address| text_field(address, "addressLocality"))
}

// --- Document helpers ---

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

pub fn element_text(element: ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Plain text of an HTML fragment, one line per text node.
pub fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    fragment
        .root_element()
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn subtree_text(element: ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Every `JobPosting` object found in the document's JSON-LD blocks, in
/// document order. Blocks that fail to parse are skipped.
pub fn structured_objects(document: &Html) -> Vec<Value> {
    let Some(blocks) = selector("script, code") else {
        return Vec::new();
    };

    let mut found = Vec::new();
    for block in document.select(&blocks) {
        let is_ld_json = block
            .value()
            .attr("type")
            .map(|t| t.contains(LD_JSON_TYPE))
            .unwrap_or(false);
        if !is_ld_json {
            continue;
        }

        let raw = block.text().collect::<String>();
        let data: Value = match serde_json::from_str(raw.trim()) {
            Ok(data) => data,
            Err(e) => {
                debug!(error = %e, "Skipping malformed structured-data block");
                continue;
            }
        };

        match data {
            Value::Array(items) => found.extend(items.into_iter().filter(is_job_posting)),
            item if is_job_posting(&item) => found.push(item),
            _ => {}
        }
    }
    found
}

fn is_job_posting(value: &Value) -> bool {
    value.get("@type").and_then(Value::as_str) == Some(JOB_POSTING_TYPE)
}

// --- Search-page mode ---

type SnippetStrategy = fn(&Html, &SiteUrls) -> Vec<RawSnippet>;

/// Strict precedence: the first strategy that yields anything wins.
const SEARCH_STRATEGIES: &[(&str, SnippetStrategy)] = &[
    ("structured-data", structured_snippets),
    ("job-links", anchor_snippets),
];

pub fn parse_search_page(html: &str, site: &SiteUrls) -> Vec<RawSnippet> {
    let document = Html::parse_document(html);
    for (name, strategy) in SEARCH_STRATEGIES {
        let snippets = strategy(&document, site);
        if !snippets.is_empty() {
            debug!(strategy = name, count = snippets.len(), "Parsed search page");
            return snippets;
        }
    }
    Vec::new()
}

fn structured_snippets(document: &Html, _site: &SiteUrls) -> Vec<RawSnippet> {
    structured_objects(document)
        .iter()
        .map(|value| RawSnippet::Structured(StructuredPosting::from_value(value)))
        .collect()
}

fn anchor_snippets(document: &Html, site: &SiteUrls) -> Vec<RawSnippet> {
    let Some(links) = selector("a[href]") else {
        return Vec::new();
    };

    document
        .select(&links)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?;
            if !href.contains(site.detail_path()) {
                return None;
            }
            let id = extract_job_id(href)?;
            let title = element_text(anchor);
            Some(RawSnippet::Anchor(AnchorSnippet {
                id,
                title: (!title.is_empty()).then_some(title),
                url: site.job_url(href),
            }))
        })
        .collect()
}

// --- Detail-page mode ---

#[derive(Debug, Clone, PartialEq, Eq)]
struct Description {
    html: String,
    text: String,
}

type DescriptionAttempt = fn(&Html, Option<&StructuredPosting>) -> Option<Description>;

const DESCRIPTION_ATTEMPTS: &[(&str, DescriptionAttempt)] = &[
    ("structured-data", description_from_structured),
    ("description-container", description_from_container),
];

fn description_from_structured(
    _document: &Html,
    structured: Option<&StructuredPosting>,
) -> Option<Description> {
    let html = structured?.description.clone()?;
    let text = html_to_text(&html);
    Some(Description { html, text })
}

fn description_from_container(
    document: &Html,
    _structured: Option<&StructuredPosting>,
) -> Option<Description> {
    let containers = selector("[class*='description']")?;
    let container = document.select(&containers).next()?;
    Some(Description {
        html: container.html(),
        text: subtree_text(container),
    })
}

/// Parses one job detail page. The company profile is only located here;
/// fetching it is the caller's business.
pub fn parse_detail_page(html: &str, site: &SiteUrls) -> JobDetails {
    let document = Html::parse_document(html);

    let structured = structured_objects(&document)
        .first()
        .map(StructuredPosting::from_value);

    let description = DESCRIPTION_ATTEMPTS.iter().find_map(|(name, attempt)| {
        let found = attempt(&document, structured.as_ref());
        if found.is_some() {
            debug!(strategy = name, "Found job description");
        }
        found
    });
    let (description_html, description_text) = match description {
        Some(d) => (Some(d.html), Some(d.text)),
        None => (None, None),
    };

    let benefits = list_items_containing(&document, "benefit");
    let job_functions = list_items_containing(&document, "function");

    JobDetails {
        description_html,
        description_text,
        applicants: count_in_spans(&document, "applicant"),
        views: count_in_spans(&document, "view"),
        benefits: (!benefits.is_empty()).then_some(benefits),
        job_functions: (!job_functions.is_empty()).then_some(job_functions),
        apply_method: apply_method(&document),
        company_url: company_url(&document, site),
        company: None,
    }
}

/// First integer in a number like "1,234"; commas inside the run are dropped.
pub fn first_number(text: &str) -> Option<u64> {
    let re = Regex::new(r"\d[\d,]*").ok()?;
    let run = re.find(text)?.as_str().replace(',', "");
    run.parse().ok()
}

fn count_in_spans(document: &Html, keyword: &str) -> Option<u64> {
    let spans = selector("span")?;
    document
        .select(&spans)
        .map(element_text)
        .filter(|text| text.to_lowercase().contains(keyword))
        .find_map(|text| first_number(&text))
}

// Items are not deduplicated and may match more than one keyword.
fn list_items_containing(document: &Html, keyword: &str) -> Vec<String> {
    let Some(items) = selector("li") else {
        return Vec::new();
    };
    document
        .select(&items)
        .map(element_text)
        .filter(|text| !text.is_empty() && text.to_lowercase().contains(keyword))
        .collect()
}

fn apply_method(document: &Html) -> Option<ApplyMethod> {
    let links = selector("a[href]")?;
    document.select(&links).find_map(|link| {
        let label = element_text(link);
        if !label.to_lowercase().contains("apply") {
            return None;
        }
        Some(ApplyMethod {
            url: link.value().attr("href")?.to_string(),
            label,
        })
    })
}

fn company_url(document: &Html, site: &SiteUrls) -> Option<String> {
    let links = selector("a[href]")?;
    document
        .select(&links)
        .filter_map(|link| link.value().attr("href"))
        .find(|href| href.contains(COMPANY_PATH_MARKER))
        .and_then(|href| clean_tracking_url(&site.absolute(href)))
}
