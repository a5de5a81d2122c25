use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Listing API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Result cache and pagination configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Filter synchronisation configuration
    #[serde(default)]
    pub sync: SyncConfig,

    /// Local durable storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/default.toml".to_string());

        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(&config_path).required(false))
            // Override with environment variables (prefix: LISTING_SEARCH__)
            .add_source(
                config::Environment::with_prefix("LISTING_SEARCH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the listing API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Optional bearer token forwarded to the API
    pub auth_token: Option<String>,
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
            auth_token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Results requested per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Maximum number of cached pages
    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: u64,

    /// Lifetime of a cached page (seconds)
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// Shortest query that triggers suggestion lookups
    #[serde(default = "default_suggestion_min_chars")]
    pub suggestion_min_chars: usize,
}

impl SearchConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            cache_max_entries: default_cache_max_entries(),
            cache_ttl_secs: default_cache_ttl(),
            suggestion_min_chars: default_suggestion_min_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Quiet period before the URL is rewritten (milliseconds)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Mirror filter state into the durable store
    #[serde(default = "default_true")]
    pub persist_to_storage: bool,

    /// Prefix of durable store keys holding filter state
    #[serde(default = "default_storage_prefix")]
    pub storage_key_prefix: String,
}

impl SyncConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            persist_to_storage: true,
            storage_key_prefix: default_storage_prefix(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the sled database; in-memory when unset
    pub path: Option<PathBuf>,

    /// Number of recent searches kept
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Number of named filter presets kept
    #[serde(default = "default_preset_limit")]
    pub preset_limit: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            history_limit: default_history_limit(),
            preset_limit: default_preset_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,

    /// Enable Prometheus metrics
    #[serde(default = "default_true")]
    pub prometheus_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            prometheus_enabled: true,
        }
    }
}

// Default value functions
fn default_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_request_timeout() -> u64 {
    15
}

fn default_page_size() -> u32 {
    20
}

fn default_cache_max_entries() -> u64 {
    500
}

fn default_cache_ttl() -> u64 {
    1800
}

fn default_suggestion_min_chars() -> usize {
    2
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_storage_prefix() -> String {
    "filters".to_string()
}

fn default_history_limit() -> usize {
    10
}

fn default_preset_limit() -> usize {
    20
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}
