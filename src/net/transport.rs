//! HTTP transport seam.
//!
//! [`Transport`] is the only place bytes leave the process. The production
//! implementation wraps a `reqwest::Client`; tests substitute a scripted
//! fake. Status codes are never interpreted here: the API client owns that.

use std::time::Duration;

use reqwest::Method;
use reqwest::header::HeaderMap;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::ClientError;

/// A fully prepared request, relative to the configured API root.
#[derive(Clone, Debug)]
pub struct HttpRequest {
    pub method: Method,
    /// Path below the API root, starting with `/` (e.g. `"/rooms/3"`).
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

/// Raw response: status plus the undecoded body text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Execute one request.
    ///
    /// # Errors
    ///
    /// Returns an error only when no HTTP response was obtained.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ClientError>;
}

// =============================================================================
// REQWEST
// =============================================================================

pub struct ReqwestTransport {
    http: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Build a transport rooted at `config.api_base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()?;
        Ok(Self { http, base_url: config.api_base_url.clone() })
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        let url = format!("{}{}", self.base_url, request.path);
        let builder = self.http.request(request.method, &url).headers(request.headers);
        let builder = if request.query.is_empty() { builder } else { builder.query(&request.query) };
        let builder = if let Some(json) = request.body { builder.json(&json) } else { builder };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}
