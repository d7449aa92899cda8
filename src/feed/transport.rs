//! HTTP seam for feed retrieval.

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::time::timeout;

const USER_AGENT: &str = concat!("weekrooster/", env!("CARGO_PKG_VERSION"));

/// Status and body of a GET. Non-2xx statuses are not errors here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait Transport: Send + Sync {
    /// GET `url`. Errors are transport failures only (DNS, TLS, timeout).
    fn get(&self, url: &str) -> impl Future<Output = Result<HttpResponse>> + Send;
}

pub struct HttpTransport {
    http: reqwest::Client,
    request_timeout: Duration,
}

impl HttpTransport {
    pub fn new(request_timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            request_timeout,
        })
    }

    async fn send(&self, url: &str) -> Result<HttpResponse> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to connect to {url}"))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read response from {url}"))?;

        Ok(HttpResponse { status, body })
    }
}

impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        timeout(self.request_timeout, self.send(url))
            .await
            .map_err(|_| {
                anyhow::anyhow!(
                    "Request timed out after {}s",
                    self.request_timeout.as_secs()
                )
            })?
    }
}
