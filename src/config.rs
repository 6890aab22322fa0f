//! Configuration for the prediction service

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "CROP_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/crop.toml";

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub artifacts: ArtifactsConfig,
    pub validation: ValidationConfig,
    pub startup: StartupConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

/// Where the fitted artifacts live
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    /// Directory holding the artifact files
    pub dir: PathBuf,
    /// Ensemble of classifiers, relative to `dir`
    pub models_file: String,
    pub scaler_file: String,
    pub label_encoder_file: String,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("models"),
            models_file: "trained_models.json".to_string(),
            scaler_file: "scaler.json".to_string(),
            label_encoder_file: "label_encoder.json".to_string(),
        }
    }
}

/// Input validation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Reject readings outside agronomic bounds
    pub enforce_ranges: bool,
}

/// Process bootstrap behaviour
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StartupConfig {
    /// Serve (and fail every prediction) when artifacts do not load
    pub allow_degraded: bool,
    /// Run the sample record once before accepting requests
    pub warmup: bool,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            allow_degraded: false,
            warmup: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset
    pub level: String,
    /// Log summary statistics of every scaled input vector
    pub log_vectors: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_vectors: false,
        }
    }
}

impl ServiceConfig {
    /// Load from `$CROP_CONFIG` (or `config/crop.toml`) plus `CROP_*` overrides.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from_path(path)
    }

    /// Load configuration from a specific path. A missing file is not an error.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(
                Environment::with_prefix("CROP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .with_context(|| {
                format!(
                    "invalid listen address {}:{}",
                    self.server.host, self.server.port
                )
            })
    }
}
