//! Directory synchronization pipeline
//!
//! # Components
//!
//! - [`source`]: upstream listing and email lookup behind the `DirectorySource` trait
//! - [`http_client`] and [`retry`]: fixed-delay retrying fetcher for upstream calls
//! - [`pacing`]: fixed pause between dependent calls
//! - [`enumerator`]: paginated walk of the directory with filtering
//! - [`enricher`]: sequential per-record email lookups
//! - [`lookup`]: on-demand email lookup for one account
//! - [`dispatch`]: deadline-bounded downstream sync and boost calls
//! - [`pipeline`]: `DirectorySync`, which ties the steps together
//!
//! # Example
//!
//! ```ignore
//! use directory_sync::config::Config;
//! use directory_sync::sync::DirectorySync;
//!
//! let config = Config::from_file("config.yaml")?;
//! let sync = DirectorySync::from_config(&config)?;
//! let outcome = sync.sync_directory(500, None).await;
//! ```

pub mod dispatch;
pub mod enricher;
pub mod enumerator;
pub mod http_client;
pub mod lookup;
pub mod pacing;
pub mod pipeline;
pub mod retry;
pub mod source;

pub use dispatch::{BoostDispatcher, DownstreamClient, SyncDispatcher, INTEGRATION_TOKEN_HEADER};
pub use enricher::{Enricher, EnrichmentReport};
pub use enumerator::PageEnumerator;
pub use http_client::{RequestDescriptor, RetryingFetcher};
pub use lookup::EmailResolver;
pub use pacing::Pacer;
pub use pipeline::{build_client, DirectorySync};
pub use retry::RetryManager;
pub use source::{DirectorySource, HttpDirectorySource};
