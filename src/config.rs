//! Configuration file support for kubemodcmp
//!
//! Reads configuration from `~/.config/kubemodcmp/config.json`:
//!
//! ```json
//! {
//!   "upstream_url": "https://raw.githubusercontent.com/kubernetes/kubernetes/{version}/go.mod",
//!   "go_binary": "/usr/local/go/bin/go",
//!   "ignore_file": "/home/me/.config/kubemodcmp/ignore.txt"
//! }
//! ```
//!
//! Every field is optional. Command-line flags take precedence.

use crate::go::upstream::DEFAULT_UPSTREAM_URL;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_GO_BINARY: &str = "go";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot determine config directory. HOME environment variable not set.")]
    NoConfigDir,

    #[error("Failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid upstream_url in {path}: must contain {{version}}")]
    InvalidUpstreamUrl { path: PathBuf },
}

/// Top-level configuration structure
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// URL template for release go.mod files; `{version}` is substituted
    #[serde(default = "default_upstream_url")]
    pub upstream_url: String,

    /// The `go` executable used for `go list -m all`
    #[serde(default = "default_go_binary")]
    pub go_binary: String,

    /// Ignore file used when `--ignore-file` is not given
    #[serde(default)]
    pub ignore_file: Option<PathBuf>,
}

fn default_upstream_url() -> String {
    DEFAULT_UPSTREAM_URL.to_string()
}

fn default_go_binary() -> String {
    DEFAULT_GO_BINARY.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upstream_url: default_upstream_url(),
            go_binary: default_go_binary(),
            ignore_file: None,
        }
    }
}

impl Config {
    /// Load configuration from the default path or return defaults if not found
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path()?;

        if !path.exists() {
            log::debug!("No config file at {}, using defaults", path.display());
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::ReadError {
            path: path.clone(),
            source,
        })?;

        let config: Config = serde_json::from_str(&content).map_err(|source| {
            ConfigError::ParseError {
                path: path.clone(),
                source,
            }
        })?;

        if !config.upstream_url.contains("{version}") {
            return Err(ConfigError::InvalidUpstreamUrl { path });
        }

        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }
}

/// Returns the config file path: `~/.config/kubemodcmp/config.json`
pub fn config_path() -> Result<PathBuf, ConfigError> {
    // Use XDG_CONFIG_HOME if set, otherwise fall back to ~/.config
    let config_base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".config"))
                .unwrap_or_default()
        });

    if config_base.as_os_str().is_empty() {
        return Err(ConfigError::NoConfigDir);
    }

    Ok(config_base.join("kubemodcmp").join("config.json"))
}
