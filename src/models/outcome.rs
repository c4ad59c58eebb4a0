//! Structured result returned to callers of the sync and boost operations

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use crate::error::{ErrorKind, SyncError};

/// Terminal result of a sync run or boost dispatch
///
/// Serializes as `{ "success": true, "message", "acknowledgment", "recordsSynced"? }` or
/// `{ "success": false, "errorKind", "detail" }`.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Downstream accepted the request
    Succeeded {
        /// Human-readable summary
        message: String,
        /// Acknowledgment payload reported by the downstream
        acknowledgment: Value,
        /// Number of records delivered, absent for boosts
        records_synced: Option<usize>,
    },
    /// The operation failed
    Failed {
        /// Error classification
        error_kind: ErrorKind,
        /// Human-readable detail
        detail: String,
    },
}

impl Outcome {
    /// Whether the operation succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Succeeded { .. })
    }

    /// Error classification, if the operation failed
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Outcome::Succeeded { .. } => None,
            Outcome::Failed { error_kind, .. } => Some(*error_kind),
        }
    }
}

impl From<SyncError> for Outcome {
    fn from(err: SyncError) -> Self {
        Outcome::Failed {
            error_kind: err.kind(),
            detail: err.to_string(),
        }
    }
}

impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        match self {
            Outcome::Succeeded {
                message,
                acknowledgment,
                records_synced,
            } => {
                map.serialize_entry("success", &true)?;
                map.serialize_entry("message", message)?;
                map.serialize_entry("acknowledgment", acknowledgment)?;
                if let Some(count) = records_synced {
                    map.serialize_entry("recordsSynced", count)?;
                }
            }
            Outcome::Failed { error_kind, detail } => {
                map.serialize_entry("success", &false)?;
                map.serialize_entry("errorKind", error_kind)?;
                map.serialize_entry("detail", detail)?;
            }
        }
        map.end()
    }
}
