//! Sync run state
//!
//! A `SyncRun` is created at invocation start, filled by enumeration and
//! enrichment, finalized by dispatch, then dropped.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use super::record::DirectoryRecord;
use crate::error::ErrorKind;

/// Phase of a sync run
///
/// Transitions are strictly sequential:
/// `Started -> Enumerating -> Enriching -> Dispatching -> Succeeded`,
/// and any non-terminal phase may move to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// Run created, nothing fetched yet
    Started,
    /// Listing pages are being fetched
    Enumerating,
    /// Email lookups are in progress
    Enriching,
    /// The collection is being sent downstream
    Dispatching,
    /// Downstream acknowledged the collection
    Succeeded,
    /// The run stopped with the given error kind
    Failed(ErrorKind),
}

impl SyncPhase {
    /// Whether the run has reached a final phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, SyncPhase::Succeeded | SyncPhase::Failed(_))
    }

    /// Whether moving to `next` is a legal transition
    pub fn can_advance_to(&self, next: SyncPhase) -> bool {
        match (self, next) {
            (SyncPhase::Started, SyncPhase::Enumerating)
            | (SyncPhase::Enumerating, SyncPhase::Enriching)
            | (SyncPhase::Enriching, SyncPhase::Dispatching)
            | (SyncPhase::Dispatching, SyncPhase::Succeeded) => true,
            (current, SyncPhase::Failed(_)) => !current.is_terminal(),
            _ => false,
        }
    }
}

/// Unit of work for one synchronization invocation
#[derive(Debug, Clone)]
pub struct SyncRun {
    capacity: usize,
    records: Vec<DirectoryRecord>,
    phase: SyncPhase,
}

impl SyncRun {
    /// Start a run that accepts at most `capacity` records
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            records: Vec::new(),
            phase: SyncPhase::Started,
        }
    }

    /// Requested cap on total records
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current phase
    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    /// Records accumulated so far, in discovery order
    pub fn records(&self) -> &[DirectoryRecord] {
        &self.records
    }

    /// Move to the next phase
    ///
    /// Returns `false` and leaves the phase unchanged on an illegal transition.
    pub fn advance(&mut self, next: SyncPhase) -> bool {
        if !self.phase.can_advance_to(next) {
            tracing::warn!(from = ?self.phase, to = ?next, "Rejected sync phase transition");
            return false;
        }
        tracing::debug!(from = ?self.phase, to = ?next, "Sync phase transition");
        self.phase = next;
        true
    }

    /// Replace the record list, never keeping more than `capacity` entries
    pub fn set_records(&mut self, mut records: Vec<DirectoryRecord>) {
        records.truncate(self.capacity);
        self.records = records;
    }

    /// Hand the records over to the next stage
    pub fn take_records(&mut self) -> Vec<DirectoryRecord> {
        std::mem::take(&mut self.records)
    }
}

/// Metadata attached to a dispatched collection
#[derive(Debug, Clone, PartialEq)]
pub struct RunMetadata {
    /// When the collection was assembled
    pub collected_at: DateTime<Utc>,
    /// Identifies this integration to the backend
    pub source_tag: String,
    /// Caller-supplied correlation id
    pub correlation_id: Option<String>,
}

impl RunMetadata {
    /// Metadata stamped with the current time
    pub fn now(source_tag: impl Into<String>, correlation_id: Option<String>) -> Self {
        Self {
            collected_at: Utc::now(),
            source_tag: source_tag.into(),
            correlation_id,
        }
    }
}

/// Request body of the downstream sync endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPayload<'a> {
    /// Enriched records
    pub records: &'a [DirectoryRecord],
    /// Source tag
    pub source_tag: &'a str,
    /// ISO-8601 collection timestamp
    pub collected_at: String,
    /// Correlation id, omitted when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<&'a str>,
}

impl<'a> SyncPayload<'a> {
    /// Build the payload for a collection and its metadata
    pub fn new(records: &'a [DirectoryRecord], metadata: &'a RunMetadata) -> Self {
        Self {
            records,
            source_tag: &metadata.source_tag,
            collected_at: metadata
                .collected_at
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            correlation_id: metadata.correlation_id.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(id: &str) -> DirectoryRecord {
        DirectoryRecord {
            account_id: id.to_string(),
            display_name: format!("User {}", id),
            account_type: "atlassian".to_string(),
            active: true,
            avatar_url: None,
            email_address: None,
        }
    }

    #[test]
    fn test_phase_happy_path() {
        let mut run = SyncRun::new(10);
        assert_eq!(run.phase(), SyncPhase::Started);

        assert!(run.advance(SyncPhase::Enumerating));
        assert!(run.advance(SyncPhase::Enriching));
        assert!(run.advance(SyncPhase::Dispatching));
        assert!(run.advance(SyncPhase::Succeeded));
        assert!(run.phase().is_terminal());
    }

    #[test]
    fn test_phase_rejects_skips_and_restarts() {
        let mut run = SyncRun::new(10);

        assert!(!run.advance(SyncPhase::Dispatching));
        assert_eq!(run.phase(), SyncPhase::Started);

        assert!(run.advance(SyncPhase::Enumerating));
        assert!(run.advance(SyncPhase::Failed(ErrorKind::RemoteCallFailed)));

        // Failed runs are not restartable
        assert!(!run.advance(SyncPhase::Enumerating));
        assert!(!run.advance(SyncPhase::Failed(ErrorKind::Timeout)));
        assert_eq!(run.phase(), SyncPhase::Failed(ErrorKind::RemoteCallFailed));
    }

    #[test]
    fn test_any_active_phase_can_fail() {
        for phase in [
            SyncPhase::Started,
            SyncPhase::Enumerating,
            SyncPhase::Enriching,
            SyncPhase::Dispatching,
        ] {
            assert!(phase.can_advance_to(SyncPhase::Failed(ErrorKind::Timeout)));
        }
        assert!(!SyncPhase::Succeeded.can_advance_to(SyncPhase::Failed(ErrorKind::Timeout)));
    }

    #[test]
    fn test_set_records_respects_capacity() {
        let mut run = SyncRun::new(2);
        run.set_records(vec![record("a"), record("b"), record("c")]);

        assert_eq!(run.records().len(), 2);
        assert_eq!(run.records()[1].account_id, "b");

        let taken = run.take_records();
        assert_eq!(taken.len(), 2);
        assert!(run.records().is_empty());
    }

    #[test]
    fn test_sync_payload_shape() {
        let records = vec![record("a")];
        let metadata = RunMetadata {
            collected_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
            source_tag: "forge-app".to_string(),
            correlation_id: Some("cloud-42".to_string()),
        };

        let value = serde_json::to_value(SyncPayload::new(&records, &metadata)).unwrap();

        assert_eq!(value["sourceTag"], "forge-app");
        assert_eq!(value["collectedAt"], "2024-05-01T12:30:00.000Z");
        assert_eq!(value["correlationId"], "cloud-42");
        assert_eq!(value["records"][0]["accountId"], "a");
    }

    #[test]
    fn test_sync_payload_omits_missing_correlation_id() {
        let records = Vec::new();
        let metadata = RunMetadata::now("forge-app", None);

        let value = serde_json::to_value(SyncPayload::new(&records, &metadata)).unwrap();

        assert!(value.get("correlationId").is_none());
        assert_eq!(value["records"], serde_json::json!([]));
    }
}
