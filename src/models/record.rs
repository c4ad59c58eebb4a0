//! Directory record models
//!
//! `RawAccount` mirrors one entry of the upstream listing endpoint;
//! `DirectoryRecord` is the accepted, enrichable form sent downstream.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Avatar size preferred when the upstream offers several
const PREFERRED_AVATAR_SIZE: &str = "48x48";

/// One account as returned by the upstream listing endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAccount {
    /// Opaque account identifier
    pub account_id: String,

    /// Display name
    #[serde(default)]
    pub display_name: String,

    /// Classification tag (e.g. "atlassian", "app", "customer")
    #[serde(default)]
    pub account_type: String,

    /// Whether the account is active
    #[serde(default)]
    pub active: bool,

    /// Avatar URLs keyed by size
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_urls: Option<BTreeMap<String, String>>,
}

impl RawAccount {
    /// Check whether this is an active account of the human classification
    pub fn is_eligible(&self, human_account_type: &str) -> bool {
        self.active && self.account_type == human_account_type
    }

    /// Pick a single avatar reference, preferring the 48x48 rendition
    pub fn avatar_reference(&self) -> Option<String> {
        let urls = self.avatar_urls.as_ref()?;
        urls.get(PREFERRED_AVATAR_SIZE)
            .or_else(|| urls.values().next())
            .cloned()
    }
}

/// One accepted directory account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryRecord {
    /// Opaque account identifier, unique within a run
    pub account_id: String,

    /// Display name
    pub display_name: String,

    /// Classification tag
    pub account_type: String,

    /// Whether the account is active
    pub active: bool,

    /// Avatar reference
    #[serde(default)]
    pub avatar_url: Option<String>,

    /// Enrichment result
    ///
    /// `None` until a lookup succeeds, then `Some(email)` where the email
    /// itself may be null. Unenriched records omit the key entirely.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_field"
    )]
    pub email_address: Option<Option<String>>,
}

/// Map a present field, `null` included, to `Some`
fn present_field<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl DirectoryRecord {
    /// Attach the result of a successful lookup
    pub fn with_email(self, email: Option<String>) -> Self {
        Self {
            email_address: Some(email),
            ..self
        }
    }

    /// Whether a lookup has succeeded for this record
    pub fn is_enriched(&self) -> bool {
        self.email_address.is_some()
    }
}

impl From<RawAccount> for DirectoryRecord {
    fn from(raw: RawAccount) -> Self {
        let avatar_url = raw.avatar_reference();
        Self {
            account_id: raw.account_id,
            display_name: raw.display_name,
            account_type: raw.account_type,
            active: raw.active,
            avatar_url,
            email_address: None,
        }
    }
}

/// Response of the upstream email lookup endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EmailLookup {
    /// Email address, if the upstream disclosed one
    #[serde(default, alias = "emailAddress")]
    pub email: Option<String>,
}
