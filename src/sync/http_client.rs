//! Retrying HTTP fetcher for upstream calls
//!
//! A `RequestDescriptor` names a single logical call; `RetryingFetcher`
//! issues it through an injected `reqwest::Client` and retries every
//! failure with a fixed delay.

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Method};
use tracing::{debug, warn};

use super::retry::RetryManager;
use crate::error::SyncError;

/// Method, URL and headers of one upstream call
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    /// HTTP method
    pub method: Method,
    /// Absolute URL including the query string
    pub url: String,
    /// Request headers
    pub headers: HeaderMap,
}

impl RequestDescriptor {
    /// Describe a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            headers: HeaderMap::new(),
        }
    }

    /// Add a header, rejecting values that are not valid header text
    pub fn with_header(mut self, name: HeaderName, value: &str) -> Result<Self, SyncError> {
        let value = HeaderValue::from_str(value).map_err(|e| {
            SyncError::InvalidInput(format!("Invalid value for header {}: {}", name, e))
        })?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Add a bearer `Authorization` header when a credential is present
    pub fn with_bearer(self, credential: Option<&str>) -> Result<Self, SyncError> {
        match credential {
            Some(token) => {
                let mut request = self.with_header(AUTHORIZATION, &format!("Bearer {}", token))?;
                if let Some(value) = request.headers.get_mut(AUTHORIZATION) {
                    value.set_sensitive(true);
                }
                Ok(request)
            }
            None => Ok(self),
        }
    }
}

/// Issues upstream calls with bounded retry
#[derive(Debug, Clone)]
pub struct RetryingFetcher {
    client: Client,
    retry: RetryManager,
}

impl RetryingFetcher {
    /// Create a fetcher over an explicitly constructed client
    pub fn new(client: Client, retry: RetryManager) -> Self {
        Self { client, retry }
    }

    /// Fetch with retries
    ///
    /// Fails with `RemoteCallFailed` carrying the status and body of the
    /// last attempt once all retries are spent.
    pub async fn fetch(&self, request: &RequestDescriptor) -> Result<Bytes, SyncError> {
        self.retry.execute(|| self.fetch_once(request)).await
    }

    /// Fetch exactly once
    pub async fn fetch_once(&self, request: &RequestDescriptor) -> Result<Bytes, SyncError> {
        debug!(method = %request.method, url = %request.url, "Sending upstream request");

        let response = self
            .client
            .request(request.method.clone(), request.url.as_str())
            .headers(request.headers.clone())
            .send()
            .await
            .map_err(SyncError::transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                url = %request.url,
                status = status.as_u16(),
                "Upstream returned non-success status"
            );
            return Err(SyncError::RemoteCallFailed {
                status: Some(status.as_u16()),
                body,
            });
        }

        let body = response.bytes().await.map_err(SyncError::transport)?;
        debug!(url = %request.url, body_size = body.len(), "Received response");
        Ok(body)
    }
}
