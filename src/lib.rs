//! directory-sync - Synchronizes an upstream user directory into a downstream backend
//!
//! The crate enumerates active human accounts page by page, enriches each
//! one with an email address under a fixed pacing delay, and hands the
//! collection to the backend under a hard deadline. It can also send boost
//! reward events to the same backend.

pub mod config;
pub mod error;
pub mod models;
pub mod sync;
pub mod telemetry;
