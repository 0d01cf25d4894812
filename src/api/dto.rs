use serde::{Deserialize, Serialize};

use crate::domain::options::{split_csv, Algorithm, AnalysisConfig, PositionMode};
use crate::error::ConfigError;

/// One request line on the API socket.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandReq {
    pub command: String,
    #[serde(default)]
    pub params: Option<serde_json::Value>,
}

/// Parameters of `ANALYZE`. Omitted knobs take the configuration defaults.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AnalyzeParams {
    /// Program representation JSON file.
    pub path: String,
    #[serde(default)]
    pub algorithm: Option<String>,
    #[serde(default)]
    pub emit_positions: Option<String>,
    /// Comma-separated string or list of package substrings.
    #[serde(default)]
    pub only_pkg: Option<PackageFilter>,
    #[serde(default)]
    pub entry_points: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PackageFilter {
    Csv(String),
    List(Vec<String>),
}

impl AnalyzeParams {
    pub fn to_config(&self) -> Result<AnalysisConfig, ConfigError> {
        let mut config = AnalysisConfig::default();
        if let Some(algo) = &self.algorithm {
            config.algorithm = algo.parse::<Algorithm>()?;
        }
        if let Some(mode) = &self.emit_positions {
            config.emit_positions = mode.parse::<PositionMode>()?;
        }
        config.only_pkg = match &self.only_pkg {
            Some(PackageFilter::Csv(s)) => split_csv(s),
            Some(PackageFilter::List(list)) => list
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => Vec::new(),
        };
        config.entry_points = self.entry_points.clone();
        Ok(config)
    }
}
