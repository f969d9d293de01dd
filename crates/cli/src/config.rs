//! `mdc.toml` configuration.
//!
//! # Example
//!
//! ```toml
//! generators_dir = "content/generators"
//! log_filter = "mdc_eval=debug"
//! ```
//!
//! A relative `generators_dir` is resolved against the directory holding
//! the config file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "mdc.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory scanned for `<id>.json` generator definitions.
    pub generators_dir: PathBuf,
    /// `tracing` filter directive, used when `MDC_LOG` is unset.
    pub log_filter: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            generators_dir: PathBuf::from("content/generators"),
            log_filter: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl Config {
    /// Load `explicit`, or `mdc.toml` from the working directory.
    ///
    /// A missing default file yields [`Config::default`]; a missing explicit
    /// file is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
        match explicit {
            Some(path) => Self::read(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::read(path)
                } else {
                    Ok(Config::default())
                }
            }
        }
    }

    fn read(path: &Path) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if config.generators_dir.is_relative() {
            if let Some(base) = path.parent() {
                config.generators_dir = base.join(&config.generators_dir);
            }
        }
        Ok(config)
    }
}
