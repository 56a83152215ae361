//! Configuration loading.
//!
//! Settings come from a TOML file named by `--config <path>` or
//! `FLORA_CONFIG`; every section is optional and falls back to defaults.
//! `FLORA_GEMINI_API_KEY` overrides `provider.api_key`.

use flora_core::{ConfigError, FloraConfig, FloraResult};
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "FLORA_CONFIG";
pub const API_KEY_ENV: &str = "FLORA_GEMINI_API_KEY";

/// Load, apply environment overrides and validate.
pub fn load() -> FloraResult<FloraConfig> {
    let mut config = match config_path_from_args().or_else(config_path_from_env) {
        Some(path) => from_path(&path)?,
        None => {
            tracing::info!("no config file given, using defaults");
            FloraConfig::default()
        }
    };
    apply_api_key_override(&mut config, std::env::var(API_KEY_ENV).ok());
    config.validate()?;
    Ok(config)
}

pub fn from_path(path: &Path) -> FloraResult<FloraConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let config = from_toml_str(&contents)?;
    tracing::info!(path = %path.display(), "configuration loaded");
    Ok(config)
}

pub fn from_toml_str(contents: &str) -> FloraResult<FloraConfig> {
    toml::from_str(contents).map_err(|e| {
        ConfigError::Parse {
            reason: e.to_string(),
        }
        .into()
    })
}

/// A non-blank key replaces whatever the file said.
pub fn apply_api_key_override(config: &mut FloraConfig, key: Option<String>) {
    if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
        config.provider.api_key = Some(key);
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var(CONFIG_ENV).ok().map(PathBuf::from)
}

fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}
