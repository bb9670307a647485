use std::fs;
use std::path::{Path, PathBuf};

use crate::io::project_io::suffix_problem;
use crate::model::config::Config;

/// File name of the per-directory configuration
pub const CONFIG_FILE: &str = "alsdiff.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid watch.suffix {suffix:?} in {path}: {reason}")]
    InvalidSuffix {
        path: PathBuf,
        suffix: String,
        reason: &'static str,
    },
}

/// Load `alsdiff.toml` from `dir`. A missing file means all defaults.
pub fn load_config(dir: &Path) -> Result<Config, ConfigError> {
    let path = dir.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(Config::default());
    }
    let text = fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        source: e,
    })?;
    let config: Config =
        toml::from_str(&text).map_err(|e| ConfigError::ParseError {
            path: path.clone(),
            source: e,
        })?;
    if let Some(reason) = suffix_problem(&config.watch.suffix) {
        return Err(ConfigError::InvalidSuffix {
            path,
            suffix: config.watch.suffix,
            reason,
        });
    }
    tracing::debug!(?config, "loaded config");
    Ok(config)
}
