//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Remote report API configuration.
    #[serde(default)]
    pub report_api: ReportApiConfig,
    /// Report store configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Report generator configuration.
    #[serde(default)]
    pub generator: GeneratorConfig,
    /// Share link configuration.
    #[serde(default)]
    pub share: ShareConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Remote report API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportApiConfig {
    /// Base URL of the report API (e.g. `http://localhost:4000/api`).
    #[serde(default = "default_report_api_url")]
    pub base_url: String,
    /// Bearer token sent with every request.
    #[serde(default)]
    pub token: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Serve generated sample data instead of calling the remote API.
    #[serde(default = "default_use_mock")]
    pub use_mock: bool,
}

impl Default for ReportApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_report_api_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
            use_mock: default_use_mock(),
        }
    }
}

fn default_report_api_url() -> String {
    "http://localhost:4000/api".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_use_mock() -> bool {
    true
}

/// Report store configuration.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StoreConfig {
    /// Number of generated reports kept in history.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
        }
    }
}

fn default_history_capacity() -> usize {
    10
}

/// Report generator configuration.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct GeneratorConfig {
    /// Interval between simulated progress ticks, in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Delay before progress resets after completion, in milliseconds.
    #[serde(default = "default_reset_delay_ms")]
    pub reset_delay_ms: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            reset_delay_ms: default_reset_delay_ms(),
        }
    }
}

fn default_tick_interval_ms() -> u64 {
    300
}

fn default_reset_delay_ms() -> u64 {
    1000
}

/// Share link configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ShareConfig {
    /// Public dashboard URL that shared report links point at.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            public_base_url: default_public_base_url(),
        }
    }
}

fn default_public_base_url() -> String {
    "http://localhost:3000".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("RENTDESK").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
