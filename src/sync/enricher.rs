//! Per-record email enrichment
//!
//! Lookups are strictly sequential in discovery order with a fixed pause
//! between consecutive calls. A failed lookup leaves its record untouched.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use super::pacing::Pacer;
use super::source::DirectorySource;
use crate::models::DirectoryRecord;

/// Counts of lookups that succeeded and failed during one pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EnrichmentReport {
    /// Records whose lookup succeeded (including an absent email)
    pub enriched: usize,
    /// Records left unmodified after a failed lookup
    pub failed: usize,
}

/// Attaches email addresses to directory records
pub struct Enricher {
    source: Arc<dyn DirectorySource>,
    pacer: Pacer,
}

impl Enricher {
    /// Create an enricher pausing `pacer` between lookups
    pub fn new(source: Arc<dyn DirectorySource>, pacer: Pacer) -> Self {
        Self { source, pacer }
    }

    /// Enrich a single record; never fails
    pub async fn enrich(&self, record: DirectoryRecord) -> DirectoryRecord {
        self.try_enrich(record).await.0
    }

    async fn try_enrich(&self, record: DirectoryRecord) -> (DirectoryRecord, bool) {
        match self.source.lookup_email(&record.account_id).await {
            Ok(lookup) => {
                debug!(
                    account_id = %record.account_id,
                    has_email = lookup.email.is_some(),
                    "Email lookup succeeded"
                );
                (record.with_email(lookup.email), true)
            }
            Err(e) => {
                warn!(account_id = %record.account_id, error = %e, "Email lookup failed");
                (record, false)
            }
        }
    }

    /// Enrich every record in order, pacing between consecutive lookups
    pub async fn enrich_all(
        &self,
        records: Vec<DirectoryRecord>,
    ) -> (Vec<DirectoryRecord>, EnrichmentReport) {
        let mut report = EnrichmentReport::default();
        let mut enriched = Vec::with_capacity(records.len());

        for (index, record) in records.into_iter().enumerate() {
            if index > 0 {
                self.pacer.pace().await;
            }
            let (record, ok) = self.try_enrich(record).await;
            if ok {
                report.enriched += 1;
            } else {
                report.failed += 1;
            }
            enriched.push(record);
        }

        debug!(
            enriched = report.enriched,
            failed = report.failed,
            "Email enrichment pass finished"
        );
        (enriched, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use crate::models::EmailLookup;
    use crate::sync::source::MockDirectorySource;
    use std::time::Duration;
    use tokio::time::Instant;

    fn record(id: &str) -> DirectoryRecord {
        DirectoryRecord {
            account_id: id.to_string(),
            display_name: id.to_uppercase(),
            account_type: "atlassian".to_string(),
            active: true,
            avatar_url: None,
            email_address: None,
        }
    }

    fn email_for(id: &str) -> Result<EmailLookup, SyncError> {
        Ok(EmailLookup {
            email: Some(format!("{}@example.com", id)),
        })
    }

    #[tokio::test]
    async fn test_enrich_attaches_email() {
        let mut mock = MockDirectorySource::new();
        mock.expect_lookup_email()
            .withf(|id| id == "a1")
            .times(1)
            .returning(|id| email_for(id));

        let enricher = Enricher::new(Arc::new(mock), Pacer::disabled());
        let result = enricher.enrich(record("a1")).await;

        assert_eq!(
            result.email_address,
            Some(Some("a1@example.com".to_string()))
        );
    }

    #[tokio::test]
    async fn test_enrich_absent_email_is_null() {
        let mut mock = MockDirectorySource::new();
        mock.expect_lookup_email()
            .returning(|_| Ok(EmailLookup::default()));

        let enricher = Enricher::new(Arc::new(mock), Pacer::disabled());
        let result = enricher.enrich(record("a1")).await;

        assert_eq!(result.email_address, Some(None));
        assert!(result.is_enriched());
    }

    #[tokio::test]
    async fn test_enrich_failure_returns_record_unchanged() {
        let mut mock = MockDirectorySource::new();
        mock.expect_lookup_email().returning(|_| {
            Err(SyncError::RemoteCallFailed {
                status: Some(403),
                body: "Forbidden".to_string(),
            })
        });

        let enricher = Enricher::new(Arc::new(mock), Pacer::disabled());
        let original = record("a1");
        let result = enricher.enrich(original.clone()).await;

        assert_eq!(result, original);
        assert!(!result.is_enriched());
    }

    #[tokio::test(start_paused = true)]
    async fn test_enrich_all_isolates_failures_and_paces() {
        let mut mock = MockDirectorySource::new();
        mock.expect_lookup_email().times(3).returning(|id| {
            if id == "b2" {
                Err(SyncError::transport("connection reset"))
            } else {
                email_for(id)
            }
        });

        let enricher = Enricher::new(Arc::new(mock), Pacer::new(Duration::from_millis(150)));
        let start = Instant::now();
        let (records, report) = enricher
            .enrich_all(vec![record("a1"), record("b2"), record("c3")])
            .await;

        let ids: Vec<_> = records.iter().map(|r| r.account_id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "b2", "c3"]);
        assert_eq!(
            records[0].email_address,
            Some(Some("a1@example.com".to_string()))
        );
        assert!(!records[1].is_enriched());
        assert_eq!(
            records[2].email_address,
            Some(Some("c3@example.com".to_string()))
        );
        assert_eq!(
            report,
            EnrichmentReport {
                enriched: 2,
                failed: 1
            }
        );
        // pauses between the three lookups only
        assert_eq!(start.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_enrich_all_empty() {
        let mut mock = MockDirectorySource::new();
        mock.expect_lookup_email().never();

        let enricher = Enricher::new(Arc::new(mock), Pacer::new(Duration::from_millis(150)));
        let (records, report) = enricher.enrich_all(vec![]).await;

        assert!(records.is_empty());
        assert_eq!(report, EnrichmentReport::default());
    }
}
