use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

use crate::error::TransportError;

/// One GET request. Query pairs are appended to `url` by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            timeout,
        }
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = headers;
        self
    }

    #[cfg(test)]
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    #[cfg(test)]
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body of a 2xx response, otherwise a `Status` error naming `url`.
    pub fn error_for_status(self, url: &str) -> Result<String, TransportError> {
        if self.is_success() {
            Ok(self.body)
        } else {
            Err(TransportError::Status {
                url: url.to_string(),
                status: self.status,
            })
        }
    }
}

/// Network seam. Shared read-only across every concurrent task.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, TransportError>;
}

pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, TransportError> {
        debug!(url = %request.url, query = ?request.query, "GET");

        let mut builder = self
            .client
            .get(&request.url)
            .query(&request.query)
            .timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(&request.url, e))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::from_reqwest(&request.url, e))?;

        Ok(FetchResponse { status, body })
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use super::*;

    type Route = dyn Fn(&FetchRequest) -> Result<FetchResponse, TransportError> + Send + Sync;

    /// In-memory transport: answers through `route` and records every request.
    pub struct FakeTransport {
        route: Box<Route>,
        requests: Mutex<Vec<FetchRequest>>,
    }

    impl FakeTransport {
        pub fn new<F>(route: F) -> Self
        where
            F: Fn(&FetchRequest) -> Result<FetchResponse, TransportError> + Send + Sync + 'static,
        {
            Self {
                route: Box::new(route),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn requests(&self) -> Vec<FetchRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, TransportError> {
            let response = (self.route)(&request);
            self.requests.lock().unwrap().push(request);
            response
        }
    }

    pub fn status(code: u16) -> Result<FetchResponse, TransportError> {
        Ok(FetchResponse {
            status: code,
            body: String::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_for_status_passes_success_body() {
        let body = FetchResponse::ok("<html></html>")
            .error_for_status("https://example.com")
            .unwrap();
        assert_eq!(body, "<html></html>");
    }

    #[test]
    fn test_error_for_status_reports_status() {
        let response = FetchResponse {
            status: 429,
            body: "slow down".to_string(),
        };
        let err = response.error_for_status("https://example.com/jobs").unwrap_err();
        assert!(matches!(err, TransportError::Status { status: 429, .. }));
        assert_eq!(err.to_string(), "HTTP 429 for https://example.com/jobs");
    }

    #[test]
    fn test_query_value_lookup() {
        let request = FetchRequest::get("https://example.com", Duration::from_secs(1))
            .with_query(vec![("pageNum".to_string(), "2".to_string())]);
        assert_eq!(request.query_value("pageNum"), Some("2"));
        assert_eq!(request.query_value("keywords"), None);
    }
}
