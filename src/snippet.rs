use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::extract::{AnchorSnippet, RawSnippet, StructuredPosting, html_to_text};
use crate::location::normalize_location;
use crate::models::{CompanyInfo, JobLocation, JobPosting, JobState, SalaryRange};
use crate::urls::{SiteUrls, extract_job_id};

/// Converts one raw snippet into a listed `JobPosting`. The id may come
/// back empty; callers drop such records.
pub fn normalize_snippet(snippet: RawSnippet, site: &SiteUrls) -> JobPosting {
    match snippet {
        RawSnippet::Structured(posting) => from_structured(posting, site),
        RawSnippet::Anchor(anchor) => from_anchor(anchor),
    }
}

fn from_anchor(anchor: AnchorSnippet) -> JobPosting {
    let mut job = JobPosting::new(anchor.id, anchor.url);
    job.title = anchor.title;
    job.state = JobState::Listed;
    job.location = job_location(None);
    job
}

fn from_structured(posting: StructuredPosting, site: &SiteUrls) -> JobPosting {
    let id = posting
        .identifier
        .clone()
        .or_else(|| posting.alternate_id.clone())
        .or_else(|| posting.url.as_deref().and_then(extract_job_id))
        .unwrap_or_default();

    let url = match posting.url.as_deref() {
        Some(url) => site.job_url(url),
        None if !id.is_empty() => site.job_url(&id),
        None => String::new(),
    };

    let description_text = posting.description.as_deref().map(html_to_text);
    let salary = salary_range(
        posting.salary_min.as_ref(),
        posting.salary_max.as_ref(),
        posting.salary_currency,
    );

    let mut job = JobPosting::new(id, url);
    job.title = posting.title;
    job.state = JobState::Listed;
    job.posted_date = posting.date_posted.as_deref().and_then(parse_date);
    job.expire_at = posting.valid_through.as_deref().and_then(parse_date);
    job.description_html = posting.description;
    job.description_text = description_text;
    job.location = job_location(posting.location_text);
    job.employment_type = posting.employment_type;
    job.workplace_type = posting.job_location_type;
    job.salary = salary;
    job.company = CompanyInfo {
        name: posting.organization_name,
        linkedin_url: posting.organization_url,
        logo_url: posting.organization_logo,
        ..Default::default()
    };
    job
}

fn job_location(raw_text: Option<String>) -> JobLocation {
    let parsed = normalize_location(raw_text.as_deref().unwrap_or(""));
    JobLocation { raw_text, parsed }
}

/// Best-effort timestamp parsing. Offset-less inputs are taken as UTC;
/// anything unrecognized is `None`.
pub fn parse_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt);
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"] {
        if let Ok(dt) = DateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }

    let utc = FixedOffset::east_opt(0)?;
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return naive.and_local_timezone(utc).single();
        }
    }
    for format in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%B %d, %Y", "%b %d, %Y", "%d %B %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date.and_hms_opt(0, 0, 0)?.and_local_timezone(utc).single();
        }
    }
    None
}

// Zero and unparseable bounds count as absent.
fn coerce_amount(value: Option<&Value>) -> Option<f64> {
    let amount = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    }?;
    (amount.is_finite() && amount != 0.0).then_some(amount)
}

pub fn salary_range(min: Option<&Value>, max: Option<&Value>, currency: Option<String>) -> SalaryRange {
    let min = coerce_amount(min);
    let max = coerce_amount(max);

    let bounds: Vec<String> = [min, max].into_iter().flatten().map(group_thousands).collect();
    let text = (!bounds.is_empty()).then(|| {
        let mut text = bounds.join(" - ");
        if let Some(currency) = &currency {
            text.push(' ');
            text.push_str(currency);
        }
        text
    });

    SalaryRange {
        text,
        min,
        max,
        currency,
    }
}

fn group_thousands(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if rounded < 0.0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScraperSettings;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    fn site() -> SiteUrls {
        SiteUrls::new(&ScraperSettings::default())
    }

    #[test]
    fn test_id_resolution_order() {
        let posting = StructuredPosting {
            identifier: Some("111".to_string()),
            alternate_id: Some("222".to_string()),
            url: Some("https://www.linkedin.com/jobs/view/333/".to_string()),
            ..Default::default()
        };
        let job = normalize_snippet(RawSnippet::Structured(posting), &site());
        assert_eq!(job.id, "111");

        let posting = StructuredPosting {
            alternate_id: Some("222".to_string()),
            url: Some("https://www.linkedin.com/jobs/view/333/".to_string()),
            ..Default::default()
        };
        let job = normalize_snippet(RawSnippet::Structured(posting), &site());
        assert_eq!(job.id, "222");

        let posting = StructuredPosting {
            url: Some("/jobs/view/333/?trk=abc".to_string()),
            ..Default::default()
        };
        let job = normalize_snippet(RawSnippet::Structured(posting), &site());
        assert_eq!(job.id, "333");
        assert_eq!(job.url, "https://www.linkedin.com/jobs/view/333/");
        assert_eq!(job.state, JobState::Listed);
    }

    #[test]
    fn test_url_synthesized_from_id() {
        let posting = StructuredPosting {
            identifier: Some("4242".to_string()),
            ..Default::default()
        };
        let job = normalize_snippet(RawSnippet::Structured(posting), &site());
        assert_eq!(job.url, "https://www.linkedin.com/jobs/view/4242/");
        assert!(job.is_complete());
    }

    #[test]
    fn test_missing_id_yields_incomplete_record() {
        let job = normalize_snippet(RawSnippet::Structured(StructuredPosting::default()), &site());
        assert!(job.id.is_empty());
        assert!(!job.is_complete());
    }

    #[test]
    fn test_structured_snippet_full_mapping() {
        let posting = StructuredPosting {
            identifier: Some("3812345678".to_string()),
            title: Some("Platform Engineer".to_string()),
            date_posted: Some("2024-03-01".to_string()),
            valid_through: Some("not a date".to_string()),
            description: Some("<p>Hello</p><p>World</p>".to_string()),
            employment_type: Some("FULL_TIME".to_string()),
            organization_name: Some("Acme".to_string()),
            organization_url: Some("https://www.linkedin.com/company/acme".to_string()),
            location_text: Some("London, England, United Kingdom".to_string()),
            salary_currency: Some("GBP".to_string()),
            salary_min: Some(json!("70000")),
            salary_max: Some(json!("lots")),
            ..Default::default()
        };
        let job = normalize_snippet(RawSnippet::Structured(posting), &site());

        assert_eq!(job.title.as_deref(), Some("Platform Engineer"));
        let posted = job.posted_date.unwrap();
        assert_eq!((posted.year(), posted.month(), posted.day()), (2024, 3, 1));
        assert_eq!(job.expire_at, None);
        assert_eq!(job.description_text.as_deref(), Some("Hello\nWorld"));
        assert_eq!(job.location.raw_text.as_deref(), Some("London, England, United Kingdom"));
        assert_eq!(job.location.parsed.country.as_deref(), Some("United Kingdom"));
        assert_eq!(job.company.name.as_deref(), Some("Acme"));
        assert_eq!(job.salary.min, Some(70000.0));
        assert_eq!(job.salary.max, None);
        assert_eq!(job.salary.text.as_deref(), Some("70,000 GBP"));
    }

    #[test]
    fn test_anchor_snippet_is_minimal() {
        let anchor = AnchorSnippet {
            id: "123456".to_string(),
            title: Some("Rust Engineer".to_string()),
            url: "https://www.linkedin.com/jobs/view/123456/".to_string(),
        };
        let job = normalize_snippet(RawSnippet::Anchor(anchor), &site());
        assert_eq!(job.id, "123456");
        assert_eq!(job.title.as_deref(), Some("Rust Engineer"));
        assert_eq!(job.state, JobState::Listed);
        assert_eq!(job.location.raw_text, None);
        assert_eq!(job.location.parsed.text, "");
        assert!(job.description_text.is_none());
    }

    #[test]
    fn test_salary_text() {
        let salary = salary_range(Some(&json!(120000)), Some(&json!(150000.0)), Some("USD".to_string()));
        assert_eq!(salary.text.as_deref(), Some("120,000 - 150,000 USD"));

        let salary = salary_range(None, Some(&json!("95,500")), None);
        assert_eq!(salary.max, Some(95500.0));
        assert_eq!(salary.text.as_deref(), Some("95,500"));

        let salary = salary_range(Some(&json!(null)), Some(&json!({"x": 1})), Some("USD".to_string()));
        assert_eq!(salary.text, None);
        assert_eq!(salary.min, None);
        assert_eq!(salary.currency.as_deref(), Some("USD"));
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(999.0), "999");
        assert_eq!(group_thousands(1000.0), "1,000");
        assert_eq!(group_thousands(1234567.6), "1,234,568");
        assert_eq!(group_thousands(-25000.0), "-25,000");
    }

    #[test]
    fn test_parse_date_variants() {
        let dt = parse_date("2024-01-15T10:30:00+02:00").unwrap();
        assert_eq!(dt.hour(), 10);
        assert_eq!(dt.offset().local_minus_utc(), 7200);

        let dt = parse_date("2024-01-15T10:30:00").unwrap();
        assert_eq!(dt.offset().local_minus_utc(), 0);

        assert!(parse_date("2024-01-15").is_some());
        assert!(parse_date("January 15, 2024").is_some());
        assert!(parse_date("Tue, 1 Jul 2003 10:52:37 +0200").is_some());
        assert_eq!(parse_date("yesterday-ish"), None);
        assert_eq!(parse_date(""), None);
    }
}
