//! Engine configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use proxima_types::EngineParams;

use crate::logging::LogFormat;
use crate::NodeError;

/// Which per-window value feeds the attendance sampler's bucket.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketSource {
    /// The instantaneous label of each classified window.
    #[default]
    Raw,
    /// The hysteresis-smoothed state after each window.
    Smoothed,
}

impl FromStr for BucketSource {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(Self::Raw),
            "smoothed" => Ok(Self::Smoothed),
            other => Err(NodeError::Config(format!("unknown bucket source {other:?}"))),
        }
    }
}

/// Configuration for the attendance engine.
///
/// Can be loaded from a TOML file via [`EngineConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Base URL of the service exposing `/prove` and `/verify`.
    #[serde(default = "default_proof_service_url")]
    pub proof_service_url: String,

    /// Base URL of the service exposing `/attendance`.
    #[serde(default = "default_attendance_service_url")]
    pub attendance_service_url: String,

    /// Bearer token for attendance writes. Without one, writes are skipped.
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Timeout for each HTTP request, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// JSON decision forest. Without one, only the variance gate decides.
    #[serde(default)]
    pub model_path: Option<PathBuf>,

    #[serde(default)]
    pub bucket_source: BucketSource,

    /// Port for the `/metrics` and `/snapshot` endpoints. Disabled when unset.
    #[serde(default)]
    pub status_port: Option<u16>,

    #[serde(default)]
    pub timing: EngineParams,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_proof_service_url() -> String {
    "http://127.0.0.1:5100".to_string()
}

fn default_attendance_service_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

// ── Impl ───────────────────────────────────────────────────────────────

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, NodeError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| NodeError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        let config: Self = toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Check every field the engine cannot run without.
    pub fn validate(&self) -> Result<(), NodeError> {
        self.timing.validate()?;
        self.log_format()?;
        if self.request_timeout_secs == 0 {
            return Err(NodeError::Config("request_timeout_secs must be > 0".into()));
        }
        for (name, url) in [
            ("proof_service_url", &self.proof_service_url),
            ("attendance_service_url", &self.attendance_service_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(NodeError::Config(format!("{name} must be an http(s) URL")));
            }
        }
        Ok(())
    }

    pub fn log_format(&self) -> Result<LogFormat, NodeError> {
        self.log_format.parse()
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_format: default_log_format(),
            log_level: default_log_level(),
            proof_service_url: default_proof_service_url(),
            attendance_service_url: default_attendance_service_url(),
            auth_token: None,
            request_timeout_secs: default_request_timeout_secs(),
            model_path: None,
            bucket_source: BucketSource::Raw,
            status_port: None,
            timing: EngineParams::default(),
        }
    }
}
