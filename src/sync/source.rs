//! Upstream directory source
//!
//! `DirectorySource` is the seam between the pipeline and the upstream API:
//! one call lists a page of accounts, the other looks up a single email.

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::debug;

use super::http_client::{RequestDescriptor, RetryingFetcher};
use super::retry::RetryManager;
use crate::config::UpstreamConfig;
use crate::error::SyncError;
use crate::models::{EmailLookup, RawAccount};

/// Paginated account listing plus per-account email lookup
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DirectorySource: Send + Sync {
    /// Fetch up to `limit` raw accounts starting at `offset`
    ///
    /// An empty page signals the end of the directory.
    async fn list_page(&self, offset: usize, limit: usize) -> Result<Vec<RawAccount>, SyncError>;

    /// Look up the email of one account
    async fn lookup_email(&self, account_id: &str) -> Result<EmailLookup, SyncError>;
}

/// `DirectorySource` backed by a Jira-style REST API
#[derive(Debug, Clone)]
pub struct HttpDirectorySource {
    fetcher: RetryingFetcher,
    list_url: Url,
    email_url: Url,
    human_account_type: String,
    credential: Option<String>,
}

impl HttpDirectorySource {
    /// Create a source over an injected client
    ///
    /// Listing calls go through `retry`; email lookups are single attempts.
    pub fn new(
        client: Client,
        config: &UpstreamConfig,
        retry: RetryManager,
    ) -> Result<Self, SyncError> {
        let base = config.base_url.trim_end_matches('/');
        Ok(Self {
            fetcher: RetryingFetcher::new(client, retry),
            list_url: parse_url(base, &config.list_path)?,
            email_url: parse_url(base, &config.email_path)?,
            human_account_type: config.human_account_type.clone(),
            credential: config.credential.clone(),
        })
    }

    fn list_request(&self, offset: usize, limit: usize) -> Result<RequestDescriptor, SyncError> {
        let mut url = self.list_url.clone();
        url.query_pairs_mut()
            .append_pair("accountType", &self.human_account_type)
            .append_pair("startAt", &offset.to_string())
            .append_pair("maxResults", &limit.to_string());
        RequestDescriptor::get(url.as_str()).with_bearer(self.credential.as_deref())
    }

    fn email_request(&self, account_id: &str) -> Result<RequestDescriptor, SyncError> {
        let mut url = self.email_url.clone();
        url.query_pairs_mut().append_pair("accountId", account_id);
        RequestDescriptor::get(url.as_str()).with_bearer(self.credential.as_deref())
    }
}

fn parse_url(base: &str, path: &str) -> Result<Url, SyncError> {
    Url::parse(&format!("{}{}", base, path))
        .map_err(|e| SyncError::InvalidInput(format!("Invalid upstream URL {}{}: {}", base, path, e)))
}

#[async_trait]
impl DirectorySource for HttpDirectorySource {
    async fn list_page(&self, offset: usize, limit: usize) -> Result<Vec<RawAccount>, SyncError> {
        let request = self.list_request(offset, limit)?;
        let body = self.fetcher.fetch(&request).await?;

        let page: Vec<RawAccount> = serde_json::from_slice(&body)
            .map_err(|e| SyncError::InvalidInput(format!("Malformed listing page: {}", e)))?;
        debug!(offset = offset, limit = limit, received = page.len(), "Fetched listing page");
        Ok(page)
    }

    async fn lookup_email(&self, account_id: &str) -> Result<EmailLookup, SyncError> {
        let request = self.email_request(account_id)?;
        let body = self.fetcher.fetch_once(&request).await?;

        serde_json::from_slice(&body)
            .map_err(|e| SyncError::InvalidInput(format!("Malformed email lookup: {}", e)))
    }
}
