//! On-demand email lookup for a single account

use std::sync::Arc;

use reqwest::Client;
use tracing::{info, warn};

use super::pacing::Pacer;
use super::retry::RetryManager;
use super::source::{DirectorySource, HttpDirectorySource};
use crate::config::UpstreamConfig;
use crate::error::{AppError, SyncError};
use crate::models::EmailReport;

/// Resolves the email of one account through a [`DirectorySource`]
pub struct EmailResolver {
    source: Arc<dyn DirectorySource>,
}

impl EmailResolver {
    pub fn new(source: Arc<dyn DirectorySource>) -> Self {
        Self { source }
    }

    /// Resolver over the HTTP upstream; lookups are single attempts
    pub fn from_config(client: Client, config: &UpstreamConfig) -> Result<Self, AppError> {
        let source =
            HttpDirectorySource::new(client, config, RetryManager::new(0, Pacer::disabled()))?;
        Ok(Self::new(Arc::new(source)))
    }

    /// Look up the email of `account_id`
    pub async fn resolve(&self, account_id: &str) -> EmailReport {
        let account_id = account_id.trim();
        if account_id.is_empty() {
            return EmailReport::failed(
                account_id,
                SyncError::InvalidInput("accountId is required".to_string()),
            );
        }

        match self.source.lookup_email(account_id).await {
            Ok(lookup) => {
                info!(
                    account_id = %account_id,
                    has_email = lookup.email.is_some(),
                    "Resolved account email"
                );
                EmailReport::Found {
                    account_id: account_id.to_string(),
                    email: lookup.email,
                }
            }
            Err(e) => {
                warn!(account_id = %account_id, error = %e, "Account email lookup failed");
                EmailReport::failed(account_id, e)
            }
        }
    }
}
