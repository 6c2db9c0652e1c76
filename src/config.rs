//! Runtime configuration for provider-sim.
//!
//! The instance identity (listen address, expected API key, reported model) is
//! resolved once at startup from an optional JSON file overlaid with CLI flags,
//! then shared read-only with every handler.

use std::path::{Path, PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8000;

/// Default model identifier reported by the simulator.
pub const DEFAULT_MODEL: &str = "gpt-4-external";

/// Command-line arguments.
#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "provider-sim",
    about = "Key-validating LLM provider simulator"
)]
pub struct Cli {
    /// Path to an optional configuration file (JSON).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Bind address.
    #[arg(long)]
    pub host: Option<String>,

    /// Listen port.
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Required API key, checked against the X-Provider-Api-Key header.
    #[arg(long)]
    pub api_key: Option<String>,

    /// Model name to report.
    #[arg(short, long)]
    pub model: Option<String>,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long)]
    pub json_logs: bool,
}

/// Startup configuration failures. All of them are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("--api-key is required")]
    EmptyApiKey,

    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Instance configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bind address (e.g. "0.0.0.0").
    pub host: String,

    /// Listen port.
    pub port: u16,

    /// Expected credential value. Never empty once validated.
    pub api_key: String,

    /// Model identifier reported by `/v1/models` and used when a completion
    /// request names none.
    pub model: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl Config {
    /// Build a validated config for the given key and model with default
    /// listen settings.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, ConfigError> {
        let config = Config {
            api_key: api_key.into(),
            model: model.into(),
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file, falling back to defaults when the
    /// file does not exist. Fields missing from the file keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve the final configuration: file (if any), then CLI overrides,
    /// then validation.
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match &cli.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if let Some(host) = &cli.host {
            config.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.port = port;
        }
        if let Some(api_key) = &cli.api_key {
            config.api_key = api_key.clone();
        }
        if let Some(model) = &cli.model {
            config.model = model.clone();
        }

        config.validate()?;
        Ok(config)
    }

    /// Check startup invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        Ok(())
    }

    /// Socket address string to bind.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
