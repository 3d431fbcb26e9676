//! Typed failures for the fetch layer.
//!
//! Everything above the transport absorbs these locally; they exist so the
//! log line and the `Enrichment::Unchanged` reason say what went wrong.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection, TLS, or body read failed
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Per-request timeout elapsed
    #[error("request to {url} timed out")]
    Timeout { url: String },

    /// Server answered with a non-success status
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },
}

impl TransportError {
    pub fn from_reqwest(url: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            TransportError::Timeout {
                url: url.to_string(),
            }
        } else {
            TransportError::Network {
                url: url.to_string(),
                source,
            }
        }
    }
}
