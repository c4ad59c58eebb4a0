//! Configuration management for directory-sync
//!
//! This module handles loading, parsing, and validating application configuration
//! from YAML files and environment variables.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Upstream directory API configuration
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Retry configuration for upstream listing calls
    #[serde(default)]
    pub retry: RetryConfig,

    /// Pacing between dependent upstream calls
    #[serde(default)]
    pub pacing: PacingConfig,

    /// Downstream backend configuration
    #[serde(default)]
    pub downstream: DownstreamConfig,

    /// Sync run limits
    #[serde(default)]
    pub sync: SyncConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileRead(format!("Failed to read config file: {}", e)))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(yaml);
        serde_yaml::from_str(&expanded)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse YAML: {}", e)))
    }

    /// Load configuration from environment variables with prefix DIRECTORY_SYNC_
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Ok(url) = std::env::var("DIRECTORY_SYNC_UPSTREAM_BASE_URL") {
            config.upstream.base_url = url;
        }
        if let Ok(credential) = std::env::var("DIRECTORY_SYNC_UPSTREAM_CREDENTIAL") {
            config.upstream.credential = Some(credential);
        }
        if let Ok(page_size) = std::env::var("DIRECTORY_SYNC_UPSTREAM_PAGE_SIZE") {
            config.upstream.page_size = page_size
                .parse()
                .map_err(|_| ConfigError::Parse("Invalid page size".to_string()))?;
        }

        if let Ok(url) = std::env::var("DIRECTORY_SYNC_DOWNSTREAM_BASE_URL") {
            config.downstream.base_url = url;
        }
        if let Ok(token) = std::env::var("DIRECTORY_SYNC_DOWNSTREAM_TOKEN") {
            config.downstream.integration_token = token;
        }
        if let Ok(secs) = std::env::var("DIRECTORY_SYNC_DOWNSTREAM_SYNC_TIMEOUT_SECS") {
            config.downstream.sync_timeout_secs = secs
                .parse()
                .map_err(|_| ConfigError::Parse("Invalid sync timeout".to_string()))?;
        }

        if let Ok(max) = std::env::var("DIRECTORY_SYNC_MAX_RECORDS") {
            config.sync.default_max_records = max
                .parse()
                .map_err(|_| ConfigError::Parse("Invalid max records".to_string()))?;
        }

        if let Ok(level) = std::env::var("DIRECTORY_SYNC_LOG_LEVEL") {
            config.logging.level = level;
        }

        Ok(config)
    }

    /// Check everything a directory sync run needs
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_upstream()?;
        self.validate_downstream()?;
        if self.sync.max_records_cap == 0 {
            return Err(ConfigError::InvalidValue(
                "sync.max_records_cap must be at least 1".to_string(),
            ));
        }
        if self.sync.default_max_records > self.sync.max_records_cap {
            return Err(ConfigError::InvalidValue(format!(
                "sync.default_max_records ({}) exceeds sync.max_records_cap ({})",
                self.sync.default_max_records, self.sync.max_records_cap
            )));
        }
        if self.sync.run_deadline_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "sync.run_deadline_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Check the settings used to reach the upstream directory
    pub fn validate_upstream(&self) -> Result<(), ConfigError> {
        if self.upstream.base_url.trim().is_empty() {
            return Err(ConfigError::MissingRequired("upstream.base_url".to_string()));
        }
        if self.upstream.page_size == 0 {
            return Err(ConfigError::InvalidValue(
                "upstream.page_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Check the settings used to reach the downstream backend
    pub fn validate_downstream(&self) -> Result<(), ConfigError> {
        if self.downstream.base_url.trim().is_empty() {
            return Err(ConfigError::MissingRequired(
                "downstream.base_url".to_string(),
            ));
        }
        if self.downstream.integration_token.trim().is_empty() {
            return Err(ConfigError::MissingRequired(
                "downstream.integration_token".to_string(),
            ));
        }
        Ok(())
    }
}

/// Upstream directory API configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpstreamConfig {
    /// Base URL of the directory API
    #[serde(default)]
    pub base_url: String,

    /// Bearer credential injected into every upstream request
    #[serde(default)]
    pub credential: Option<String>,

    /// Path of the paginated listing endpoint
    #[serde(default = "default_list_path")]
    pub list_path: String,

    /// Path of the per-account email lookup endpoint
    #[serde(default = "default_email_path")]
    pub email_path: String,

    /// Classification tag of real human accounts
    #[serde(default = "default_human_account_type")]
    pub human_account_type: String,

    /// Records requested per listing page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            credential: None,
            list_path: default_list_path(),
            email_path: default_email_path(),
            human_account_type: default_human_account_type(),
            page_size: default_page_size(),
        }
    }
}

fn default_list_path() -> String {
    "/rest/api/3/users/search".to_string()
}

fn default_email_path() -> String {
    "/rest/api/3/user/email".to_string()
}

fn default_human_account_type() -> String {
    "atlassian".to_string()
}

fn default_page_size() -> usize {
    1000
}

/// Retry configuration for upstream listing calls
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of retries after the initial attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Fixed delay between attempts in milliseconds
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
}

impl RetryConfig {
    /// Fixed delay between attempts
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay(),
        }
    }
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_delay() -> u64 {
    120
}

/// Pacing configuration for enrichment lookups
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PacingConfig {
    /// Delay between consecutive enrichment lookups in milliseconds
    #[serde(default = "default_enrichment_delay")]
    pub enrichment_delay_ms: u64,
}

impl PacingConfig {
    /// Delay between consecutive enrichment lookups
    pub fn enrichment_delay(&self) -> Duration {
        Duration::from_millis(self.enrichment_delay_ms)
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            enrichment_delay_ms: default_enrichment_delay(),
        }
    }
}

fn default_enrichment_delay() -> u64 {
    150
}

/// Downstream backend configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DownstreamConfig {
    /// Base URL of the backend
    #[serde(default)]
    pub base_url: String,

    /// Shared integration credential sent as `X-Integration-Token`
    #[serde(default)]
    pub integration_token: String,

    /// Path of the directory sync endpoint
    #[serde(default = "default_sync_path")]
    pub sync_path: String,

    /// Path of the boost endpoint
    #[serde(default = "default_boost_path")]
    pub boost_path: String,

    /// Source tag attached to every sync payload
    #[serde(default = "default_source_tag")]
    pub source_tag: String,

    /// Hard deadline for the sync dispatch in seconds
    #[serde(default = "default_sync_timeout")]
    pub sync_timeout_secs: u64,

    /// Hard deadline for a boost dispatch in seconds
    #[serde(default = "default_boost_timeout")]
    pub boost_timeout_secs: u64,
}

impl DownstreamConfig {
    /// Hard deadline for the sync dispatch
    pub fn sync_timeout(&self) -> Duration {
        Duration::from_secs(self.sync_timeout_secs)
    }

    /// Hard deadline for a boost dispatch
    pub fn boost_timeout(&self) -> Duration {
        Duration::from_secs(self.boost_timeout_secs)
    }
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            integration_token: String::new(),
            sync_path: default_sync_path(),
            boost_path: default_boost_path(),
            source_tag: default_source_tag(),
            sync_timeout_secs: default_sync_timeout(),
            boost_timeout_secs: default_boost_timeout(),
        }
    }
}

fn default_sync_path() -> String {
    "/integrations/jira/sync-users".to_string()
}

fn default_boost_path() -> String {
    "/integrations/jira/boosts".to_string()
}

fn default_source_tag() -> String {
    "forge-app".to_string()
}

fn default_sync_timeout() -> u64 {
    30
}

fn default_boost_timeout() -> u64 {
    8
}

/// Sync run limits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncConfig {
    /// Capacity used when the caller does not request one
    #[serde(default = "default_max_records")]
    pub default_max_records: usize,

    /// Largest capacity a caller may request
    #[serde(default = "default_max_records")]
    pub max_records_cap: usize,

    /// Deadline for enumeration plus enrichment in seconds
    #[serde(default = "default_run_deadline")]
    pub run_deadline_secs: u64,
}

impl SyncConfig {
    /// Deadline for enumeration plus enrichment
    pub fn run_deadline(&self) -> Duration {
        Duration::from_secs(self.run_deadline_secs)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            default_max_records: default_max_records(),
            max_records_cap: default_max_records(),
            run_deadline_secs: default_run_deadline(),
        }
    }
}

fn default_max_records() -> usize {
    5000
}

fn default_run_deadline() -> u64 {
    3600
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (`json` or `pretty`)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

/// Configuration error types
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Error reading configuration file
    #[error("Failed to read configuration file: {0}")]
    FileRead(String),

    /// Error parsing configuration
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// Invalid configuration value
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// Missing required configuration
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

/// Expand environment variables in a string
///
/// Supports `${VAR_NAME}` syntax
fn expand_env_vars(input: &str) -> String {
    let re = regex_lite::Regex::new(r"\$\{([^}]+)\}")
        .expect("Invalid regex pattern for environment variable expansion");

    re.replace_all(input, |caps: &regex_lite::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| caps[0].to_string())
    })
    .into_owned()
}
