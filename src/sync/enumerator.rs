//! Paginated directory enumeration
//!
//! Walks the upstream listing page by page, keeping only active human
//! accounts, until the directory is exhausted or enough records are found.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::source::DirectorySource;
use crate::error::SyncError;
use crate::models::DirectoryRecord;

/// Collects eligible records from a [`DirectorySource`]
pub struct PageEnumerator {
    source: Arc<dyn DirectorySource>,
    page_size: usize,
    human_account_type: String,
}

impl PageEnumerator {
    /// Create an enumerator requesting `page_size` records per call
    pub fn new(
        source: Arc<dyn DirectorySource>,
        page_size: usize,
        human_account_type: impl Into<String>,
    ) -> Self {
        Self {
            source,
            page_size,
            human_account_type: human_account_type.into(),
        }
    }

    /// Enumerate up to `capacity` active human accounts in discovery order
    ///
    /// After each page: an empty page stops immediately, a short page stops
    /// after it is processed, and so does reaching `capacity`. A full page
    /// made only of accounts already seen also stops enumeration. The
    /// cursor advances by the raw page length, not by the accepted count.
    /// Any listing failure aborts enumeration.
    pub async fn enumerate(&self, capacity: usize) -> Result<Vec<DirectoryRecord>, SyncError> {
        if capacity == 0 {
            return Err(SyncError::InvalidInput(
                "capacity must be at least 1".to_string(),
            ));
        }
        if self.page_size == 0 {
            return Err(SyncError::InvalidInput(
                "page size must be at least 1".to_string(),
            ));
        }

        let mut accepted: Vec<DirectoryRecord> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut offset = 0usize;
        let mut pages = 0usize;

        loop {
            let page = self.source.list_page(offset, self.page_size).await?;
            pages += 1;

            if page.is_empty() {
                debug!(offset = offset, "Empty page, directory exhausted");
                break;
            }

            let raw_len = page.len();
            let before = accepted.len();
            let mut unseen = 0usize;
            for account in page {
                if !seen.insert(account.account_id.clone()) {
                    debug!(account_id = %account.account_id, "Skipping duplicate account");
                    continue;
                }
                unseen += 1;
                if account.is_eligible(&self.human_account_type) {
                    accepted.push(DirectoryRecord::from(account));
                }
            }
            debug!(
                offset = offset,
                raw = raw_len,
                accepted = accepted.len() - before,
                "Processed listing page"
            );

            if raw_len < self.page_size {
                break;
            }
            if unseen == 0 {
                warn!(
                    offset = offset,
                    "Listing page held only accounts already seen, stopping"
                );
                break;
            }
            if accepted.len() >= capacity {
                break;
            }
            offset += raw_len;
        }

        accepted.truncate(capacity);
        info!(
            pages = pages,
            records = accepted.len(),
            capacity = capacity,
            "Directory enumeration complete"
        );
        Ok(accepted)
    }
}
