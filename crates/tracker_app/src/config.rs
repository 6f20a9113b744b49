//! `tracker.ron`: base URL, poll intervals and HTTP limits.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracker_core::{IntervalError, PollIntervals};
use tracker_engine::ClientSettings;
use tracker_logging::{tracker_debug, tracker_info};

pub const DEFAULT_CONFIG_FILE: &str = "tracker.ron";
pub const BASE_URL_ENV: &str = "TRACKER_BASE_URL";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
    #[error(transparent)]
    Intervals(#[from] IntervalError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub status_interval_ms: u64,
    pub retry_interval_ms: u64,
    pub list_interval_ms: u64,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub max_response_bytes: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        let intervals = PollIntervals::default();
        let client = ClientSettings::default();
        Self {
            base_url: client.base_url,
            status_interval_ms: millis(intervals.status),
            retry_interval_ms: millis(intervals.retry),
            list_interval_ms: millis(intervals.list),
            connect_timeout_ms: millis(client.connect_timeout),
            request_timeout_ms: millis(client.request_timeout),
            max_response_bytes: client.max_response_bytes,
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl AppConfig {
    /// Reads `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracker_debug!("No config at {:?}, using defaults", path);
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let config = ron::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracker_info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// The command-line value wins over the environment, which wins over the file.
    pub fn override_base_url(&mut self, from_env: Option<String>, from_cli: Option<&str>) {
        if let Some(url) = from_cli.map(str::to_string).or(from_env) {
            let url = url.trim().to_string();
            if !url.is_empty() {
                self.base_url = url;
            }
        }
    }

    pub fn intervals(&self) -> Result<PollIntervals, ConfigError> {
        Ok(PollIntervals::new(
            Duration::from_millis(self.status_interval_ms),
            Duration::from_millis(self.retry_interval_ms),
            Duration::from_millis(self.list_interval_ms),
        )?)
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.base_url.clone(),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            max_response_bytes: self.max_response_bytes,
        }
    }
}
