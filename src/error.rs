//! Application error types for directory-sync
//!
//! This module defines the error taxonomy surfaced by a sync run and the
//! aggregate error used by the binary. All error types use `thiserror`.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::ConfigError;
use crate::telemetry::TelemetryError;

/// Errors escalated by the synchronization pipeline
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SyncError {
    /// Upstream call failed after all retry attempts
    ///
    /// `status` is `None` when no response was received at all.
    #[error("Remote call failed{}: {body}", format_status(.status))]
    RemoteCallFailed {
        /// HTTP status of the last attempt, if any
        status: Option<u16>,
        /// Response body or transport error text of the last attempt
        body: String,
    },

    /// A deadline installed by the caller elapsed
    #[error("Request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The overall run deadline elapsed before dispatch
    #[error("Run deadline exceeded after {}ms", .0.as_millis())]
    RunDeadlineExceeded(Duration),

    /// Downstream answered with a non-success status
    #[error("Remote rejected request: HTTP {status} - {body}")]
    RemoteRejected {
        /// HTTP status returned by the downstream endpoint
        status: u16,
        /// Response body returned by the downstream endpoint
        body: String,
    },

    /// Invalid caller input or malformed collaborator response
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

fn format_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" with HTTP {}", code),
        None => String::new(),
    }
}

impl SyncError {
    /// Build a `RemoteCallFailed` for a call that never produced a response
    pub fn transport(err: impl std::fmt::Display) -> Self {
        SyncError::RemoteCallFailed {
            status: None,
            body: err.to_string(),
        }
    }

    /// Classification used in structured outcomes
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::RemoteCallFailed { .. } => ErrorKind::RemoteCallFailed,
            SyncError::Timeout(_) | SyncError::RunDeadlineExceeded(_) => ErrorKind::Timeout,
            SyncError::RemoteRejected { .. } => ErrorKind::RemoteRejected,
            SyncError::InvalidInput(_) => ErrorKind::InvalidInput,
        }
    }
}

/// Serializable error classification reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Upstream listing or lookup exhausted its retries
    RemoteCallFailed,
    /// Dispatch or run deadline exceeded
    Timeout,
    /// Downstream returned a non-success status
    RemoteRejected,
    /// Bad capacity, bad request fields, or malformed response shape
    InvalidInput,
}

/// Application-level error type
///
/// Aggregates the domain-specific errors for the binary entry point.
#[derive(Debug, Error)]
pub enum AppError {
    /// Sync error
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Logging setup error
    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),

    /// HTTP client construction failed
    #[error("HTTP client error: {0}")]
    HttpClient(String),
}
