/// Analysis Options Module
///
/// Knobs the call graph core consumes: which algorithm to run, how much
/// position information to emit, the package allow-list and extra roots.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Call graph algorithm requested by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    #[default]
    Cha,
    Rta,
}

impl Algorithm {
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Cha => "cha",
            Algorithm::Rta => "rta",
        }
    }
}

impl FromStr for Algorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cha" => Ok(Algorithm::Cha),
            "rta" => Ok(Algorithm::Rta),
            other => Err(ConfigError::UnknownAlgorithm(other.to_string())),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Position verbosity. `Minimal` drops every position field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionMode {
    #[default]
    Detailed,
    Minimal,
}

impl PositionMode {
    pub fn name(&self) -> &'static str {
        match self {
            PositionMode::Detailed => "detailed",
            PositionMode::Minimal => "minimal",
        }
    }
}

impl FromStr for PositionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "detailed" => Ok(PositionMode::Detailed),
            "minimal" => Ok(PositionMode::Minimal),
            other => Err(ConfigError::UnknownPositionMode(other.to_string())),
        }
    }
}

impl fmt::Display for PositionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Everything the call graph stage needs besides the program itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub algorithm: Algorithm,
    pub emit_positions: PositionMode,
    /// Package path substrings; empty means no filtering.
    pub only_pkg: Vec<String>,
    /// Extra RTA roots, by stable identity.
    pub entry_points: Vec<String>,
}

/// Split a comma-separated flag value, trimming and dropping empties.
pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
