use std::sync::Arc;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::config::ScraperSettings;
use crate::error::TransportError;
use crate::extract::element_text;
use crate::models::CompanyInfo;
use crate::transport::{FetchRequest, Transport};

/// Result of one profile lookup. A failed lookup still carries a
/// placeholder naming the profile URL, but callers must not treat it as data.
#[derive(Debug)]
pub enum CompanyProfile {
    Found(CompanyInfo),
    Unavailable {
        placeholder: CompanyInfo,
        reason: TransportError,
    },
}

/// Fetches company profile pages. Never fails past this boundary.
#[derive(Clone)]
pub struct CompanyEnricher {
    transport: Arc<dyn Transport>,
    settings: Arc<ScraperSettings>,
}

impl CompanyEnricher {
    pub fn new(transport: Arc<dyn Transport>, settings: Arc<ScraperSettings>) -> Self {
        Self {
            transport,
            settings,
        }
    }

    pub async fn enrich(&self, profile_url: &str) -> CompanyProfile {
        debug!(url = %profile_url, "Enriching company");
        let request = FetchRequest::get(profile_url, self.settings.request_timeout())
            .with_headers(self.settings.headers());

        let body = match self.transport.fetch(request).await {
            Ok(response) => response.error_for_status(profile_url),
            Err(e) => Err(e),
        };

        match body {
            Ok(html) => CompanyProfile::Found(parse_company_page(&html, profile_url)),
            Err(reason) => {
                warn!(url = %profile_url, error = %reason, "Company request failed");
                CompanyProfile::Unavailable {
                    placeholder: CompanyInfo::placeholder(profile_url),
                    reason,
                }
            }
        }
    }
}

fn text_nodes(document: &Html) -> Vec<(&str, ElementRef<'_>)> {
    document
        .root_element()
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let parent = node.parent().and_then(ElementRef::wrap)?;
            if matches!(parent.value().name(), "script" | "style") {
                return None;
            }
            let text: &str = text;
            let text = text.trim();
            (!text.is_empty()).then_some((text, parent))
        })
        .collect()
}

pub fn parse_company_page(html: &str, profile_url: &str) -> CompanyInfo {
    let document = Html::parse_document(html);
    let nodes = text_nodes(&document);
    let name = company_name(&document);
    let logo_url = name.as_deref().and_then(|n| logo_url(&document, n));

    CompanyInfo {
        employee_count: employee_count(&nodes),
        linkedin_url: Some(profile_url.to_string()),
        industries: industries(&document),
        hq: headquarters(&nodes),
        logo_url,
        name,
    }
}

fn company_name(document: &Html) -> Option<String> {
    let heading = Selector::parse("h1").ok()?;
    let text = element_text(document.select(&heading).next()?);
    (!text.is_empty()).then_some(text)
}

// Largest number in the first "employees" text: "11-50 employees" is 50.
fn employee_count(nodes: &[(&str, ElementRef)]) -> Option<u64> {
    let (text, _) = nodes
        .iter()
        .find(|(text, _)| text.to_lowercase().contains("employees"))?;
    parse_employee_count(text)
}

pub fn parse_employee_count(text: &str) -> Option<u64> {
    let re = Regex::new(r"\d+").ok()?;
    let cleaned = text.replace(',', "");
    re.find_iter(&cleaned)
        .filter_map(|m| m.as_str().parse::<u64>().ok())
        .max()
}

fn headquarters(nodes: &[(&str, ElementRef)]) -> Option<String> {
    let (_, parent) = nodes.iter().find(|(text, _)| {
        let lower = text.to_lowercase();
        lower.contains("headquarters") || lower.contains("hq")
    })?;

    let re = Regex::new(r"(?i)\b(headquarters|hq)\b").ok()?;
    let strip = |element: ElementRef| {
        let stripped = re.replace_all(&element_text(element), "").to_string();
        let hq = stripped
            .trim_matches(|c: char| c.is_whitespace() || c == ':' || c == '-')
            .to_string();
        (!hq.is_empty()).then_some(hq)
    };

    // A bare label (`<dt>Headquarters</dt>`) holds its value in the next element.
    strip(*parent).or_else(|| {
        parent
            .next_siblings()
            .find_map(ElementRef::wrap)
            .and_then(|sibling| strip(sibling))
    })
}

// Link texts whose parent mentions "industry", exact-text dedup.
fn industries(document: &Html) -> Vec<String> {
    let Ok(links) = Selector::parse("a") else {
        return Vec::new();
    };

    let mut found: Vec<String> = Vec::new();
    for link in document.select(&links) {
        let text = element_text(link);
        if text.is_empty() || found.contains(&text) {
            continue;
        }
        let mentions_industry = link
            .parent()
            .and_then(ElementRef::wrap)
            .map(|parent| element_text(parent).to_lowercase().contains("industry"))
            .unwrap_or(false);
        if mentions_industry {
            found.push(text);
        }
    }
    found
}

fn logo_url(document: &Html, name: &str) -> Option<String> {
    let images = Selector::parse("img").ok()?;
    let name = name.to_lowercase();
    document
        .select(&images)
        .find(|img| {
            img.value()
                .attr("alt")
                .map(|alt| alt.to_lowercase().contains(&name))
                .unwrap_or(false)
        })
        .and_then(|img| img.value().attr("src"))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::FetchResponse;
    use crate::transport::testing::{FakeTransport, status};

    const PROFILE_URL: &str = "https://www.linkedin.com/company/acme/";

    const COMPANY_PAGE: &str = r#"
        <html><head><script>var hq = "nope employees 99999";</script></head>
        <body>
          <img src="https://cdn.example.com/banner.png" alt="Banner">
          <img src="https://cdn.example.com/acme.png" alt="ACME Robotics logo">
          <h1> Acme Robotics </h1>
          <dl>
            <dt>Company size</dt><dd>1,001-5,000 employees</dd>
            <dd>12 employees on LinkedIn</dd>
            <dt>Headquarters</dt><dd>Denver, Colorado</dd>
            <p>Industry: <a href="/i/1">Robotics</a> <a href="/i/2">Automation</a> <a href="/i/1">Robotics</a></p>
            <p>Follow us: <a href="/follow">Follow</a></p>
          </dl>
        </body></html>
    "#;

    #[test]
    fn test_parse_company_page() {
        let company = parse_company_page(COMPANY_PAGE, PROFILE_URL);
        assert_eq!(company.name.as_deref(), Some("Acme Robotics"));
        assert_eq!(company.employee_count, Some(5000));
        assert_eq!(company.hq.as_deref(), Some("Denver, Colorado"));
        assert_eq!(company.industries, vec!["Robotics", "Automation"]);
        assert_eq!(company.logo_url.as_deref(), Some("https://cdn.example.com/acme.png"));
        assert_eq!(company.linkedin_url.as_deref(), Some(PROFILE_URL));
    }

    #[test]
    fn test_parse_company_page_without_name_has_no_logo() {
        let html = r#"<img src="/x.png" alt="Acme"><p>Some text</p>"#;
        let company = parse_company_page(html, PROFILE_URL);
        assert_eq!(company.name, None);
        assert_eq!(company.logo_url, None);
        assert_eq!(company.employee_count, None);
        assert_eq!(company.hq, None);
        assert!(company.industries.is_empty());
    }

    #[test]
    fn test_hq_from_flat_definition_list() {
        let html = r#"<h1>Acme</h1><dl><dt>Website</dt><dd>acme.com</dd>
            <dt>Headquarters</dt><dd>Denver, CO</dd><dt>Founded</dt><dd>1999</dd></dl>"#;
        let company = parse_company_page(html, PROFILE_URL);
        assert_eq!(company.hq.as_deref(), Some("Denver, CO"));
    }

    #[test]
    fn test_hq_inline_value() {
        let html = r#"<p>HQ: Austin, Texas</p><p>Other text</p>"#;
        let company = parse_company_page(html, PROFILE_URL);
        assert_eq!(company.hq.as_deref(), Some("Austin, Texas"));
    }

    #[test]
    fn test_hq_label_without_value() {
        let html = r#"<section><p>About us</p><span>Headquarters</span></section>"#;
        let company = parse_company_page(html, PROFILE_URL);
        assert_eq!(company.hq, None);
    }

    #[test]
    fn test_parse_employee_count() {
        assert_eq!(parse_employee_count("11-50 employees"), Some(50));
        assert_eq!(parse_employee_count("34 employees"), Some(34));
        assert_eq!(parse_employee_count("10,001+ employees"), Some(10001));
        assert_eq!(parse_employee_count("employees"), None);
    }

    #[tokio::test]
    async fn test_enrich_non_success_yields_placeholder() {
        let transport = Arc::new(FakeTransport::new(|_| status(404)));
        let enricher = CompanyEnricher::new(transport, Arc::new(ScraperSettings::default()));
        let CompanyProfile::Unavailable { placeholder, reason } = enricher.enrich(PROFILE_URL).await
        else {
            panic!("expected unavailable profile");
        };
        assert_eq!(placeholder, CompanyInfo::placeholder(PROFILE_URL));
        assert!(matches!(reason, TransportError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_enrich_transport_error_yields_placeholder() {
        let transport = Arc::new(FakeTransport::new(|req| {
            Err(TransportError::Timeout {
                url: req.url.clone(),
            })
        }));
        let enricher = CompanyEnricher::new(transport, Arc::new(ScraperSettings::default()));
        let CompanyProfile::Unavailable { placeholder, reason } = enricher.enrich(PROFILE_URL).await
        else {
            panic!("expected unavailable profile");
        };
        assert_eq!(placeholder.linkedin_url.as_deref(), Some(PROFILE_URL));
        assert!(matches!(reason, TransportError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_enrich_sends_user_agent() {
        let transport = Arc::new(FakeTransport::new(|_| Ok(FetchResponse::ok(COMPANY_PAGE))));
        let enricher = CompanyEnricher::new(transport.clone(), Arc::new(ScraperSettings::default()));
        let CompanyProfile::Found(company) = enricher.enrich(PROFILE_URL).await else {
            panic!("expected parsed profile");
        };
        assert_eq!(company.name.as_deref(), Some("Acme Robotics"));

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].headers.iter().any(|(k, _)| k == "User-Agent"));
    }
}
