use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

/// Default config file looked up in the working directory
pub const CONFIG_FILE: &str = "promwrite.toml";

/// Prefix for environment overrides, e.g. `PROMWRITE__EXPORTER__TOKEN`
pub const ENV_PREFIX: &str = "PROMWRITE__";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("remote write bearer token must not be empty")]
    MissingToken,
    #[error("invalid remote write endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("remote timeout must be greater than zero")]
    ZeroTimeout,
    #[error("histogram boundaries must be finite and strictly increasing")]
    InvalidBoundaries,
}

/// Settings consumed by the remote-write exporter.
///
/// The exporter takes these as plain values; [`ExporterConfig::validate`] is
/// run by whoever loads the configuration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExporterConfig {
    /// Remote write URL the snappy-compressed WriteRequest is POSTed to
    pub endpoint: String,
    /// Sent as `Authorization: Bearer <token>`
    pub token: String,
    /// Upper bound for a single remote write request
    #[serde(with = "humantime_serde")]
    pub remote_timeout: Duration,
    /// Interval of the periodic reader built by the exporter
    #[serde(with = "humantime_serde")]
    pub push_interval: Duration,
    /// Append `_<unit>` to metric names that declare a unit
    pub add_metric_suffixes: bool,
    /// Static labels merged into every series; they override resource attributes
    pub external_labels: BTreeMap<String, String>,
    /// Custom explicit bucket boundaries for histogram instruments
    pub histogram_boundaries: Vec<f64>,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            endpoint: String::from("http://localhost:9090/api/v1/write"),
            token: String::new(),
            remote_timeout: Duration::from_secs(30),
            push_interval: Duration::from_secs(10),
            add_metric_suffixes: false,
            external_labels: BTreeMap::new(),
            histogram_boundaries: Vec::new(),
        }
    }
}

impl ExporterConfig {
    /// Check for missing required properties and invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token.is_empty() {
            return Err(ConfigError::MissingToken);
        }

        let endpoint = url::Url::parse(&self.endpoint).map_err(|e| {
            ConfigError::InvalidEndpoint {
                endpoint: self.endpoint.clone(),
                reason: e.to_string(),
            }
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEndpoint {
                endpoint: self.endpoint.clone(),
                reason: format!("unsupported scheme {}", endpoint.scheme()),
            });
        }

        if self.remote_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }

        let finite = self.histogram_boundaries.iter().all(|b| b.is_finite());
        let increasing = self.histogram_boundaries.windows(2).all(|w| w[0] < w[1]);
        if !finite || !increasing {
            return Err(ConfigError::InvalidBoundaries);
        }

        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Configuration {
    pub exporter: ExporterConfig,
}

impl Configuration {
    pub fn load() -> Result<Self, Box<figment::Error>> {
        Self::figment(Toml::file(CONFIG_FILE))
    }

    pub fn load_from_path(path: &Path) -> Result<Self, Box<figment::Error>> {
        Self::figment(Toml::file(path))
    }

    fn figment(file: figment::providers::Data<Toml>) -> Result<Self, Box<figment::Error>> {
        let config = Figment::from(Serialized::defaults(Configuration::default()))
            .merge(file)
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(Box::new)?;

        Ok(config)
    }
}
