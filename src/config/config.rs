use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

use crate::chart::ChartSettings;

/// TLS mode for the PostgreSQL / CockroachDB connection.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SslMode {
    #[default]
    Disable,
    Require,
    VerifyFull,
}

/// PostgreSQL (or CockroachDB) connection configuration.
///
/// Either a full connection `url` is given, or the discrete fields are used.
/// Credentials are expected from the environment (`GASWATCH__POSTGRES__PASSWORD`,
/// `GASWATCH__POSTGRES__URL`), never from the repository.
#[derive(Debug, Deserialize, Clone)]
pub struct PostgresSettings {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default)]
    pub ssl_mode: SslMode,
    /// Root certificate used to verify the server, `$VAR` references are expanded.
    #[serde(default)]
    pub ssl_root_cert: Option<String>,
    /// Startup options, e.g. `--cluster=my-cluster` for CockroachDB serverless routing.
    #[serde(default)]
    pub options: Option<String>,
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    #[serde(default = "default_max_tx_retries")]
    pub max_tx_retries: u32,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    26257
}

fn default_user() -> String {
    "root".to_string()
}

fn default_database() -> String {
    "defaultdb".to_string()
}

// One long-lived connection for the whole process
fn default_pool_size() -> usize {
    1
}

fn default_max_tx_retries() -> u32 {
    5
}

impl Default for PostgresSettings {
    fn default() -> Self {
        Self {
            url: None,
            host: default_host(),
            port: default_port(),
            user: default_user(),
            password: None,
            database: default_database(),
            ssl_mode: SslMode::default(),
            ssl_root_cert: None,
            options: None,
            pool_size: default_pool_size(),
            max_tx_retries: default_max_tx_retries(),
        }
    }
}

/// Gas price API configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct SourceSettings {
    #[serde(default = "default_source_url")]
    pub url: String,
    /// Keyed endpoint, only used by `GasStationClient::fetch_with_key`.
    #[serde(default = "default_authenticated_url")]
    pub authenticated_url: String,
    /// Name of the `api_key_store` row read on every cycle
    #[serde(default = "default_api_key_name")]
    pub api_key_name: String,
    /// 0 keeps the transport default
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_source_url() -> String {
    "https://ethgasstation.info/json/ethgasAPI.json".to_string()
}

fn default_authenticated_url() -> String {
    "https://data-api.defipulse.com/api/v1/egs/api/ethgasAPI.json".to_string()
}

fn default_api_key_name() -> String {
    "data.defipulse".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            url: default_source_url(),
            authenticated_url: default_authenticated_url(),
            api_key_name: default_api_key_name(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// What the scheduler does when a cycle fails.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Stop the process on the first failed cycle.
    #[default]
    FailFast,
    /// Log the failure and wait for the next tick.
    Skip,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SchedulerSettings {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default)]
    pub on_error: ErrorPolicy,
    /// 0 disables the per-cycle timeout
    #[serde(default)]
    pub cycle_timeout_secs: u64,
}

fn default_interval_secs() -> u64 {
    1
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            on_error: ErrorPolicy::default(),
            cycle_timeout_secs: 0,
        }
    }
}

/// Root application configuration.
///
/// Loaded from an optional `config.yaml`, then overridden by `GASWATCH__*`
/// environment variables (`GASWATCH__CHART__WIDTH=80`).
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub postgres: PostgresSettings,
    #[serde(default)]
    pub source: SourceSettings,
    #[serde(default)]
    pub chart: ChartSettings,
    #[serde(default)]
    pub scheduler: SchedulerSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("GASWATCH").separator("__"))
            .build()?;

        let settings: Settings = s.try_deserialize()?;

        Ok(settings)
    }

    /// Builds settings from an inline YAML document, without environment overrides.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let settings = Settings::from_yaml("{}").unwrap();

        assert_eq!(settings.postgres.pool_size, 1);
        assert_eq!(settings.postgres.port, 26257);
        assert_eq!(settings.source.api_key_name, "data.defipulse");
        assert_eq!(settings.scheduler.interval_secs, 1);
        assert_eq!(settings.scheduler.on_error, ErrorPolicy::FailFast);
        assert_eq!(settings.chart.window_size, 100);
        assert_eq!(settings.chart.height, 15);
    }

    #[test]
    fn test_yaml_overrides() {
        let yaml = r#"
postgres:
  host: free-tier.cockroachlabs.cloud
  user: anand
  ssl_mode: verify_full
  ssl_root_cert: $HOME/.postgresql/root.crt
  options: --cluster=thorny-jaguar-1926
scheduler:
  on_error: skip
  cycle_timeout_secs: 5
chart:
  width: 60
  fps: 12.0
"#;
        let settings = Settings::from_yaml(yaml).unwrap();

        assert_eq!(settings.postgres.host, "free-tier.cockroachlabs.cloud");
        assert_eq!(settings.postgres.ssl_mode, SslMode::VerifyFull);
        assert_eq!(
            settings.postgres.options.as_deref(),
            Some("--cluster=thorny-jaguar-1926")
        );
        assert_eq!(settings.scheduler.on_error, ErrorPolicy::Skip);
        assert_eq!(settings.scheduler.cycle_timeout_secs, 5);
        assert_eq!(settings.chart.width, 60);
        assert_eq!(settings.chart.height, 15);
        assert!((settings.chart.fps - 12.0).abs() < f64::EPSILON);
    }
}
