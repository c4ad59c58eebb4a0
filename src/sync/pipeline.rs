//! End-to-end directory synchronization
//!
//! `DirectorySync` drives one run through
//! `Started -> Enumerating -> Enriching -> Dispatching -> Succeeded | Failed`
//! and always returns a structured [`Outcome`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Client;
use serde_json::Value;
use tracing::{info, warn};

use super::dispatch::SyncDispatcher;
use super::enricher::Enricher;
use super::enumerator::PageEnumerator;
use super::pacing::Pacer;
use super::retry::RetryManager;
use super::source::{DirectorySource, HttpDirectorySource};
use crate::config::Config;
use crate::error::{AppError, SyncError};
use crate::models::{Outcome, RunMetadata, SyncPhase, SyncRun};

/// Connect timeout of the shared HTTP client
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the HTTP client shared by every upstream and downstream call
pub fn build_client() -> Result<Client, AppError> {
    Client::builder()
        .user_agent(concat!("directory-sync/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(|e| AppError::HttpClient(e.to_string()))
}

/// Synchronizes the upstream directory into the downstream backend
pub struct DirectorySync {
    enumerator: PageEnumerator,
    enricher: Enricher,
    dispatcher: SyncDispatcher,
    source_tag: String,
    default_max_records: usize,
    max_records_cap: usize,
    run_deadline: Duration,
}

impl DirectorySync {
    /// Assemble a pipeline from an explicit source and dispatcher
    pub fn new(source: Arc<dyn DirectorySource>, dispatcher: SyncDispatcher, config: &Config) -> Self {
        Self {
            enumerator: PageEnumerator::new(
                Arc::clone(&source),
                config.upstream.page_size,
                &config.upstream.human_account_type,
            ),
            enricher: Enricher::new(source, Pacer::new(config.pacing.enrichment_delay())),
            dispatcher,
            source_tag: config.downstream.source_tag.clone(),
            default_max_records: config.sync.default_max_records,
            max_records_cap: config.sync.max_records_cap,
            run_deadline: config.sync.run_deadline(),
        }
    }

    /// Assemble the HTTP-backed pipeline described by `config`
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let client = build_client()?;
        Self::with_client(client, config)
    }

    /// Same as [`DirectorySync::from_config`] over an injected client
    pub fn with_client(client: Client, config: &Config) -> Result<Self, AppError> {
        let source = HttpDirectorySource::new(
            client.clone(),
            &config.upstream,
            RetryManager::from_config(&config.retry),
        )?;
        let dispatcher = SyncDispatcher::from_config(client, &config.downstream);
        Ok(Self::new(Arc::new(source), dispatcher, config))
    }

    /// Record limit used when the caller does not pass one
    pub fn default_max_records(&self) -> usize {
        self.default_max_records
    }

    /// Run one synchronization of at most `max_records` accounts
    pub async fn sync_directory(&self, max_records: usize, correlation_id: Option<String>) -> Outcome {
        let started = Instant::now();

        if let Err(e) = self.check_capacity(max_records) {
            warn!(max_records = max_records, error = %e, "Rejected sync request");
            return e.into();
        }

        let mut run = SyncRun::new(max_records);
        match self.execute(&mut run, correlation_id).await {
            Ok((acknowledgment, synced)) => {
                run.advance(SyncPhase::Succeeded);
                info!(
                    records = synced,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Directory sync succeeded"
                );
                Outcome::Succeeded {
                    message: format!("Successfully synced {} users to backend", synced),
                    acknowledgment,
                    records_synced: Some(synced),
                }
            }
            Err(e) => {
                let phase = run.phase();
                run.advance(SyncPhase::Failed(e.kind()));
                warn!(
                    phase = ?phase,
                    error = %e,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Directory sync failed"
                );
                e.into()
            }
        }
    }

    fn check_capacity(&self, max_records: usize) -> Result<(), SyncError> {
        if max_records == 0 {
            return Err(SyncError::InvalidInput(
                "maxRecords must be at least 1".to_string(),
            ));
        }
        if max_records > self.max_records_cap {
            return Err(SyncError::InvalidInput(format!(
                "maxRecords {} exceeds the limit of {}",
                max_records, self.max_records_cap
            )));
        }
        Ok(())
    }

    async fn execute(
        &self,
        run: &mut SyncRun,
        correlation_id: Option<String>,
    ) -> Result<(Value, usize), SyncError> {
        tokio::time::timeout(self.run_deadline, self.collect(run))
            .await
            .map_err(|_| SyncError::RunDeadlineExceeded(self.run_deadline))??;

        run.advance(SyncPhase::Dispatching);
        let metadata = RunMetadata::now(&self.source_tag, correlation_id);
        let acknowledgment = self.dispatcher.dispatch(run.records(), &metadata).await?;
        Ok((acknowledgment, run.records().len()))
    }

    async fn collect(&self, run: &mut SyncRun) -> Result<(), SyncError> {
        run.advance(SyncPhase::Enumerating);
        let records = self.enumerator.enumerate(run.capacity()).await?;
        run.set_records(records);

        run.advance(SyncPhase::Enriching);
        let (records, report) = self.enricher.enrich_all(run.take_records()).await;
        info!(
            records = records.len(),
            enriched = report.enriched,
            failed = report.failed,
            "Enrichment complete"
        );
        run.set_records(records);
        Ok(())
    }
}
