//! Split engine configuration with TOML file support.

use serde::{Deserialize, Serialize};
use splitline_utils::LogFormat;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::proof_wait::ProofWaitPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration for the instant split engine.
///
/// Can be loaded from a TOML file via [`SplitConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Loading validates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Enables V4 bundles, the synthetic proof fallback, and skipped
    /// verification and nametag policy.
    #[serde(default)]
    pub dev_mode: bool,

    /// Bound for every inclusion-proof wait.
    #[serde(default = "default_proof_timeout_ms")]
    pub proof_timeout_ms: u64,

    /// Dev mode only: how long to wait before substituting a synthetic proof.
    #[serde(default = "default_dev_proof_timeout_ms")]
    pub dev_proof_timeout_ms: u64,

    #[serde(default = "default_proof_poll_interval_ms")]
    pub proof_poll_interval_ms: u64,

    /// Dev mode only: executor ships `"4.0"` bundles with an unproven burn.
    #[serde(default)]
    pub emit_legacy_bundles: bool,

    #[serde(default)]
    pub log_format: LogFormat,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_proof_timeout_ms() -> u64 {
    60_000
}

fn default_dev_proof_timeout_ms() -> u64 {
    5_000
}

fn default_proof_poll_interval_ms() -> u64 {
    1_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            dev_mode: false,
            proof_timeout_ms: default_proof_timeout_ms(),
            dev_proof_timeout_ms: default_dev_proof_timeout_ms(),
            proof_poll_interval_ms: default_proof_poll_interval_ms(),
            emit_legacy_bundles: false,
            log_format: LogFormat::Human,
            log_level: default_log_level(),
        }
    }
}

impl SplitConfig {
    /// Default configuration with dev mode switched on.
    pub fn dev() -> Self {
        Self {
            dev_mode: true,
            ..Self::default()
        }
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.emit_legacy_bundles && !self.dev_mode {
            return Err(ConfigError::Invalid(
                "emit_legacy_bundles requires dev_mode".into(),
            ));
        }
        if self.proof_timeout_ms == 0 || self.dev_proof_timeout_ms == 0 {
            return Err(ConfigError::Invalid("proof timeouts must be non-zero".into()));
        }
        if self.proof_poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "proof_poll_interval_ms must be non-zero".into(),
            ));
        }
        if self.dev_proof_timeout_ms > self.proof_timeout_ms {
            return Err(ConfigError::Invalid(format!(
                "dev_proof_timeout_ms ({}) exceeds proof_timeout_ms ({})",
                self.dev_proof_timeout_ms, self.proof_timeout_ms
            )));
        }
        Ok(())
    }

    /// Strict unless dev mode is on; the synthetic fallback only exists in
    /// the dev policy.
    pub fn proof_wait_policy(&self) -> ProofWaitPolicy {
        let timeout = Duration::from_millis(self.proof_timeout_ms);
        if self.dev_mode {
            ProofWaitPolicy::Dev {
                timeout,
                fallback_after: Duration::from_millis(self.dev_proof_timeout_ms),
            }
        } else {
            ProofWaitPolicy::Strict { timeout }
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.proof_poll_interval_ms)
    }

    /// Install the global tracing subscriber from `log_format`/`log_level`.
    pub fn init_logging(&self) -> Result<(), splitline_utils::LoggingError> {
        splitline_utils::init_logging(self.log_format, &self.log_level)
    }
}
