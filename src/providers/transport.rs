//! HTTP transport seam
//!
//! Explorer calls go through `HttpTransport` so the retrieval service can be
//! exercised against scripted responses. `ReqwestTransport` is the
//! production implementation.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING, USER_AGENT};
use std::fmt;
use std::time::Duration;
use tracing::debug;

use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::utils::constants::USER_AGENT as USER_AGENT_CONST;

/// Outbound GET request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            timeout,
        }
    }

    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    pub fn header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.push((key.to_string(), value.into()));
        self
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn header_value(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// URL with query string, credentials masked (safe to log)
    pub fn masked_url(&self) -> String {
        if self.query.is_empty() {
            return self.url.clone();
        }
        let qs: Vec<String> = self
            .query
            .iter()
            .map(|(k, v)| {
                if k.eq_ignore_ascii_case("apikey") {
                    format!("{}=***", k)
                } else {
                    format!("{}={}", k, v)
                }
            })
            .collect();
        format!("{}?{}", self.url, qs.join("&"))
    }
}

/// Raw response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }
}

/// Transport-level failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    Timeout,
    Network(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => f.write_str("request timed out"),
            Self::Network(msg) => write!(f, "network failure: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// reqwest-backed transport with gzip and a fixed User-Agent
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> AppResult<Self> {
        Ok(Self {
            client: build_client()?,
        })
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

/// Shared HTTP client builder
pub fn build_client() -> AppResult<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_CONST));
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));

    reqwest::Client::builder()
        .default_headers(headers)
        .gzip(true)
        .build()
        .map_err(|e| {
            AppError::with_source(ErrorCode::ConfigInvalidValue, "Failed to build HTTP client", e)
        })
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        debug!(url = %request.masked_url(), "➡️ GET");

        let mut builder = self
            .client
            .get(&request.url)
            .query(&request.query)
            .timeout(request.timeout);
        for (k, v) in &request.headers {
            builder = builder.header(k.as_str(), v.as_str());
        }

        let response = builder.send().await.map_err(|e| classify(e, &request))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| classify(e, &request))?;

        debug!(status, bytes = body.len(), "⬅️ Response");
        Ok(HttpResponse { status, body })
    }
}

/// reqwest embeds the full URL, query string included, in its error text
fn classify(err: reqwest::Error, request: &HttpRequest) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Network(format!("{} ({})", err.without_url(), request.masked_url()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masked_url_hides_api_key() {
        let req = HttpRequest::get("https://api.etherscan.io/v2/api", Duration::from_secs(10))
            .query("module", "contract")
            .query("apikey", "SECRET");
        let masked = req.masked_url();
        assert!(masked.contains("module=contract"));
        assert!(masked.contains("apikey=***"));
        assert!(!masked.contains("SECRET"));
    }

    #[tokio::test]
    async fn test_network_error_text_never_carries_api_key() {
        let transport = ReqwestTransport::new().unwrap();
        let req = HttpRequest::get("http://127.0.0.1:9/api", Duration::from_secs(2))
            .query("module", "contract")
            .query("apikey", "SUPERSECRETKEY");

        match transport.get(req).await {
            Err(TransportError::Network(msg)) => {
                assert!(!msg.contains("SUPERSECRETKEY"), "key leaked: {}", msg);
                assert!(msg.contains("apikey=***"));
            }
            Err(TransportError::Timeout) => {}
            Ok(response) => panic!("unexpected response {:?}", response),
        }
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let req = HttpRequest::get("https://x", Duration::from_secs(1)).header("token", "abc");
        assert_eq!(req.header_value("TOKEN"), Some("abc"));
        assert_eq!(req.query_value("token"), None);
    }
}
