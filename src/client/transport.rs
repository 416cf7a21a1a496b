//! HTTP transports for the API client.
//!
//! A [`Transport`] sends one fully-buffered request and returns the
//! fully-buffered response. The client composes transports as decorators
//! around [`ReqwestTransport`]:
//!
//! ```text
//! FolgeClient -> DebugTransport -> RetryTransport -> ReqwestTransport
//! ```
//!
//! The [`Recorder`](super::recorder::Recorder) is a transport as well and can
//! stand in for the whole chain in tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use tracing::{debug, warn};

use crate::error::ApiError;

/// Timeout applied to every request sent by [`ReqwestTransport`].
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// An outbound API request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL.
    pub url: String,
    /// Header name/value pairs.
    pub headers: Vec<(String, String)>,
    /// JSON body, if any.
    pub body: Option<String>,
}

impl ApiRequest {
    /// Create a request without headers or body.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attach a JSON body and the matching content type.
    pub fn with_json_body(mut self, body: String) -> Self {
        self.body = Some(body);
        self.with_header("Content-Type", "application/json")
    }
}

/// A buffered API response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status.
    pub status: StatusCode,
    /// Header name/value pairs.
    pub headers: Vec<(String, String)>,
    /// Response body as text.
    pub body: String,
}

impl ApiResponse {
    /// Look up a header, ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Sends API requests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and buffer the response.
    ///
    /// Non-2xx statuses are returned as responses, not errors.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        (**self).send(request).await
    }
}

/// The base transport, backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with the default request timeout.
    pub fn new() -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("folge-provider/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let mut builder = self.http.request(request.method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.text().await?;

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}

/// Retries [`RetryPolicy::default`] allows.
pub const DEFAULT_MAX_RETRIES: u32 = 10;

/// Backoff and attempt limits for [`RetryTransport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Wait before the first retry.
    pub min_wait: Duration,
    /// Upper bound for any single wait.
    pub max_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            min_wait: Duration::from_secs(1),
            max_wait: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the default waits.
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Override the wait bounds.
    pub fn with_waits(mut self, min_wait: Duration, max_wait: Duration) -> Self {
        self.min_wait = min_wait;
        self.max_wait = max_wait;
        self
    }

    /// Exponential backoff for the given retry number (0-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(16));
        self.min_wait.saturating_mul(factor).min(self.max_wait)
    }
}

/// Whether a response status is worth retrying.
///
/// Rate limiting and server errors are retried; 501 means the endpoint will
/// never work and is returned as is.
pub fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || (status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED)
}

fn retry_after(response: &ApiResponse) -> Option<Duration> {
    if response.status != StatusCode::TOO_MANY_REQUESTS
        && response.status != StatusCode::SERVICE_UNAVAILABLE
    {
        return None;
    }
    response
        .header("retry-after")
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Retries requests that failed on the network or with a retryable status.
#[derive(Debug, Clone)]
pub struct RetryTransport<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T: Transport> RetryTransport<T> {
    /// Wrap `inner` with the given policy.
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<T: Transport> Transport for RetryTransport<T> {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let mut attempt = 0;
        loop {
            let result = self.inner.send(request.clone()).await;

            let wait = match &result {
                Ok(response) if is_retryable_status(response.status) => Some(
                    retry_after(response)
                        .map(|wait| wait.min(self.policy.max_wait))
                        .unwrap_or_else(|| self.policy.backoff(attempt)),
                ),
                Err(err) if err.is_retryable() => Some(self.policy.backoff(attempt)),
                _ => None,
            };
            let Some(wait) = wait else {
                return result;
            };

            if attempt >= self.policy.max_retries {
                warn!(
                    method = %request.method,
                    url = %request.url,
                    attempts = attempt + 1,
                    "Giving up on API request"
                );
                return result;
            }

            debug!(
                method = %request.method,
                url = %request.url,
                attempt = attempt + 1,
                wait = ?wait,
                "Retrying API request"
            );
            tokio::time::sleep(wait).await;
            attempt += 1;
        }
    }
}

/// Logs every request and response at debug level.
///
/// The `Authorization` header is never logged.
#[derive(Debug, Clone)]
pub struct DebugTransport<T> {
    inner: T,
}

impl<T: Transport> DebugTransport<T> {
    /// Wrap `inner`.
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<T: Transport> Transport for DebugTransport<T> {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let method = request.method.clone();
        let url = request.url.clone();
        let headers: Vec<&str> = request
            .headers
            .iter()
            .filter(|(name, _)| !name.eq_ignore_ascii_case("authorization"))
            .map(|(name, _)| name.as_str())
            .collect();
        debug!(
            method = %method,
            url = %url,
            headers = ?headers,
            body = request.body.as_deref().unwrap_or(""),
            "Sending API request"
        );

        let result = self.inner.send(request).await;
        match &result {
            Ok(response) => debug!(
                method = %method,
                url = %url,
                status = response.status.as_u16(),
                body = %response.body,
                "Received API response"
            ),
            Err(err) => debug!(method = %method, url = %url, error = %err, "API request failed"),
        }
        result
    }
}
