//! Configuration loading.
//!
//! An optional TOML file carries the same keys as `AnalysisConfig`. Command
//! line values are layered on top of it.

use std::path::Path;

use tracing::debug;

use crate::domain::options::{split_csv, Algorithm, AnalysisConfig, PositionMode};
use crate::error::ConfigError;

/// Values given on the command line. `None` and empty lists leave the file
/// (or default) value alone.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub algorithm: Option<String>,
    pub emit_positions: Option<String>,
    pub only_pkg: Option<String>,
    pub entry_points: Vec<String>,
}

pub fn load_config_file(path: &Path) -> Result<AnalysisConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let config: AnalysisConfig = toml::from_str(&text).map_err(|source| ConfigError::Malformed {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Loaded config from {}: {:?}", path.display(), config);
    Ok(config)
}

/// Build the effective configuration: defaults, then the file, then overrides.
pub fn resolve_config(file: Option<&Path>, overrides: &ConfigOverrides) -> Result<AnalysisConfig, ConfigError> {
    let mut config = match file {
        Some(path) => load_config_file(path)?,
        None => AnalysisConfig::default(),
    };

    if let Some(algo) = &overrides.algorithm {
        config.algorithm = algo.parse::<Algorithm>()?;
    }
    if let Some(mode) = &overrides.emit_positions {
        config.emit_positions = mode.parse::<PositionMode>()?;
    }
    if let Some(pkgs) = &overrides.only_pkg {
        config.only_pkg = split_csv(pkgs);
    }
    if !overrides.entry_points.is_empty() {
        config.entry_points = overrides.entry_points.clone();
    }
    Ok(config)
}
