//! Result of a single-account email lookup

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::{ErrorKind, SyncError};

/// Email of one account, or why it could not be read
///
/// Serializes as `{ "ok": true, "accountId", "email" }` where `email` may be
/// null, or `{ "ok": false, "accountId", "errorKind", "error" }`.
#[derive(Debug, Clone, PartialEq)]
pub enum EmailReport {
    /// The lookup succeeded
    Found {
        account_id: String,
        email: Option<String>,
    },
    /// The lookup failed
    Failed {
        account_id: String,
        error_kind: ErrorKind,
        error: String,
    },
}

impl EmailReport {
    /// Report a failed lookup for `account_id`
    pub fn failed(account_id: impl Into<String>, err: SyncError) -> Self {
        EmailReport::Failed {
            account_id: account_id.into(),
            error_kind: err.kind(),
            error: err.to_string(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, EmailReport::Found { .. })
    }
}

impl Serialize for EmailReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        match self {
            EmailReport::Found { account_id, email } => {
                map.serialize_entry("ok", &true)?;
                map.serialize_entry("accountId", account_id)?;
                map.serialize_entry("email", email)?;
            }
            EmailReport::Failed {
                account_id,
                error_kind,
                error,
            } => {
                map.serialize_entry("ok", &false)?;
                map.serialize_entry("accountId", account_id)?;
                map.serialize_entry("errorKind", error_kind)?;
                map.serialize_entry("error", error)?;
            }
        }
        map.end()
    }
}
