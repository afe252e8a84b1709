//! Configuration management.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Catalog API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Search orchestration tuning
    #[serde(default)]
    pub search: SearchConfig,
}

/// Catalog API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API origin, resolved once at startup
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Search orchestration tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Debounce delay in milliseconds between keystrokes and dispatch
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Trimmed search terms must be longer than this to trigger a request
    #[serde(default = "default_min_search_length")]
    pub min_search_length: usize,

    /// Page size used by the controller's searches
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            min_search_length: default_min_search_length(),
            per_page: default_per_page(),
        }
    }
}

fn default_base_url() -> String {
    std::env::var("ARTIFACT_SEARCH_BASE_URL")
        .unwrap_or_else(|_| "http://localhost:5000".to_string())
}

fn default_timeout_ms() -> u64 {
    8000
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_min_search_length() -> usize {
    1
}

fn default_per_page() -> u32 {
    20
}

/// Load configuration from a file, with environment overrides
pub fn load_config(path: &PathBuf) -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path.as_path()))
        .add_source(config::Environment::with_prefix("ARTIFACT_SEARCH"))
        .build()?;

    settings.try_deserialize()
}

/// Get the default configuration (from env vars or defaults)
pub fn get_config() -> Config {
    Config::default()
}
