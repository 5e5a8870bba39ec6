//! Configuration loading and typed config structures.
//!
//! The configuration lives in `pulse-config.yaml` at the project root. Every
//! section is optional; missing values fall back to the defaults below.
//!
//! Environment variables override YAML values:
//! - `PULSE_HOST` overrides `server.host`
//! - `PULSE_PORT` overrides `server.port`
//! - `ADMIN_UPDATE_KEY` overrides `admin.update_key`

use std::path::Path;
use std::time::Duration;

use pulse_types::{Country, CountryStatistics};
use serde::Deserialize;

use crate::resync::DEFAULT_RESYNC_INTERVAL_SECS;
use crate::viewers::DEFAULT_QUEUE_CAPACITY;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration, mirroring `pulse-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PulseConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Broadcast cadence settings.
    #[serde(default)]
    pub broadcast: BroadcastConfig,

    /// Administrative update settings.
    #[serde(default)]
    pub admin: AdminConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Optional replacement base statistics.
    #[serde(default)]
    pub statistics: StatisticsConfig,
}

impl PulseConfig {
    /// Load configuration from a YAML file and apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string and apply environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config = Self::parse_without_env(yaml)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string, ignoring the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse_without_env(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Override values from `PULSE_HOST`, `PULSE_PORT` and
    /// `ADMIN_UPDATE_KEY` when set. An unparseable port is ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("PULSE_HOST") {
            self.server.host = val;
        }
        if let Some(port) = std::env::var("PULSE_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
        {
            self.server.port = port;
        }
        if let Ok(val) = std::env::var("ADMIN_UPDATE_KEY") {
            self.admin.update_key = val;
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to listen on.
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
    String::from("0.0.0.0")
}

const fn default_port() -> u16 {
    8000
}

/// Broadcast cadence settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BroadcastConfig {
    /// Milliseconds between tick starts.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Wall-clock seconds between resync ticks.
    #[serde(default = "default_resync_interval_secs")]
    pub resync_interval_secs: u64,

    /// Frames a viewer may fall behind before it is evicted.
    #[serde(default = "default_viewer_queue_capacity")]
    pub viewer_queue_capacity: usize,
}

impl BroadcastConfig {
    /// Tick interval as a [`Duration`]; never zero.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }

    /// Resync interval as a [`chrono::TimeDelta`].
    pub fn resync_interval(&self) -> chrono::TimeDelta {
        let secs = i64::try_from(self.resync_interval_secs).unwrap_or(i64::MAX);
        chrono::TimeDelta::try_seconds(secs).unwrap_or(chrono::TimeDelta::MAX)
    }
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            resync_interval_secs: default_resync_interval_secs(),
            viewer_queue_capacity: default_viewer_queue_capacity(),
        }
    }
}

const fn default_interval_ms() -> u64 {
    1000
}

const fn default_resync_interval_secs() -> u64 {
    DEFAULT_RESYNC_INTERVAL_SECS
}

const fn default_viewer_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

/// Administrative update settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AdminConfig {
    /// Shared secret required by the base-data update endpoint.
    #[serde(default = "default_update_key")]
    pub update_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            update_key: default_update_key(),
        }
    }
}

fn default_update_key() -> String {
    String::from("admin-secret-key")
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    String::from("info")
}

/// Optional replacements for the built-in base statistics.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StatisticsConfig {
    /// South Korea figures.
    #[serde(default)]
    pub south_korea: Option<CountryStatistics>,

    /// North Korea figures.
    #[serde(default)]
    pub north_korea: Option<CountryStatistics>,
}

impl StatisticsConfig {
    /// Configured figures for `country`, or the built-in defaults.
    pub fn resolve(&self, country: Country) -> CountryStatistics {
        let configured = match country {
            Country::SouthKorea => self.south_korea.as_ref(),
            Country::NorthKorea => self.north_korea.as_ref(),
        };
        configured
            .cloned()
            .unwrap_or_else(|| CountryStatistics::defaults_for(country))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = PulseConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.broadcast.interval(), Duration::from_secs(1));
        assert_eq!(config.broadcast.resync_interval(), chrono::TimeDelta::seconds(30));
        assert_eq!(config.broadcast.viewer_queue_capacity, 16);
        assert_eq!(config.admin.update_key, "admin-secret-key");
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
server:
  host: "127.0.0.1"
  port: 9090

broadcast:
  interval_ms: 500
  resync_interval_secs: 10
  viewer_queue_capacity: 4

admin:
  update_key: "s3cret"

logging:
  level: "debug"
  json: true

statistics:
  north_korea:
    name: "North Korea"
    base_population: 26000000
    base_year: 2025
    base_date: "2025-01-01T00:00:00Z"
    annual_births: 340000
    annual_deaths: 240000
    annual_growth_rate: 0.38
    fertility_rate: 1.8
    life_expectancy: 72.6
    birth_rate: 13.0
    death_rate: 9.3
    data_source: "UN World Population Prospects"
"#;

        let config = PulseConfig::parse_without_env(yaml).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.broadcast.interval(), Duration::from_millis(500));
        assert_eq!(config.broadcast.viewer_queue_capacity, 4);
        assert_eq!(config.admin.update_key, "s3cret");
        assert!(config.logging.json);

        let nk = config.statistics.resolve(Country::NorthKorea);
        assert_eq!(nk.base_population, 26_000_000);
        assert_eq!(nk.source, "UN World Population Prospects");
        let sk = config.statistics.resolve(Country::SouthKorea);
        assert_eq!(sk, CountryStatistics::south_korea());
    }

    #[test]
    fn parse_minimal_yaml() {
        let config = PulseConfig::parse_without_env("server:\n  port: 7000\n").unwrap();
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.broadcast.interval_ms, 1000);
    }

    #[test]
    fn parse_empty_yaml() {
        assert!(PulseConfig::parse_without_env("").is_ok());
    }

    #[test]
    fn zero_interval_is_clamped() {
        let config = PulseConfig::parse_without_env("broadcast:\n  interval_ms: 0\n").unwrap();
        assert_eq!(config.broadcast.interval(), Duration::from_millis(1));
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("pulse-config.yaml");
        if path.exists() {
            let config = PulseConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
