//! Domain models for directory-sync
//!
//! This module contains the core domain models used throughout the application.

pub mod boost;
pub mod email;
pub mod outcome;
pub mod record;
pub mod run;

// Re-export commonly used types
pub use boost::{BoostPayload, BoostReceiver, BoostRequest};
pub use email::EmailReport;
pub use outcome::Outcome;
pub use record::{DirectoryRecord, EmailLookup, RawAccount};
pub use run::{RunMetadata, SyncPayload, SyncPhase, SyncRun};
