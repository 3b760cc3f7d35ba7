use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_REQUESTS: u32 = 1;
pub const DEFAULT_CONCURRENCY: u32 = 1;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("{field} must be at least 1")]
    InvalidRunConfig { field: &'static str },
}

/// Immutable parameters of one load run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    requests: u32,
    concurrency: u32,
}

impl RunConfig {
    pub fn new(requests: u32, concurrency: u32) -> Result<Self, ConfigError> {
        if requests == 0 {
            return Err(ConfigError::InvalidRunConfig { field: "requests" });
        }
        if concurrency == 0 {
            return Err(ConfigError::InvalidRunConfig {
                field: "concurrency",
            });
        }
        Ok(Self {
            requests,
            concurrency,
        })
    }

    pub fn requests(&self) -> u32 {
        self.requests
    }

    /// Concurrency as requested by the user.
    pub fn concurrency(&self) -> u32 {
        self.concurrency
    }

    /// Concurrency capped at the request count; more in-flight slots than
    /// requests would never be used.
    pub fn effective_concurrency(&self) -> u32 {
        self.concurrency.min(self.requests)
    }
}

/// On-disk YAML configuration. Every field is optional so command-line
/// flags can fill in or override any of them.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct FileConfig {
    pub target: Option<String>,
    pub run: Option<RunSection>,
    pub metrics: Option<MetricsSection>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RunSection {
    pub requests: Option<u32>,
    pub concurrency: Option<u32>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct MetricsSection {
    /// Print the Prometheus exposition after the report
    #[serde(default)]
    pub enabled: bool,
}

impl FileConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&data)
    }

    pub fn from_yaml(data: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(data)?)
    }

    /// Builds the run parameters, preferring the explicit overrides over
    /// file values and file values over the defaults.
    pub fn run_config(
        &self,
        requests: Option<u32>,
        concurrency: Option<u32>,
    ) -> Result<RunConfig, ConfigError> {
        let section = self.run.clone().unwrap_or_default();
        RunConfig::new(
            requests.or(section.requests).unwrap_or(DEFAULT_REQUESTS),
            concurrency
                .or(section.concurrency)
                .unwrap_or(DEFAULT_CONCURRENCY),
        )
    }

    pub fn metrics_enabled(&self) -> bool {
        self.metrics.as_ref().map_or(false, |m| m.enabled)
    }
}
