//! Typed errors for goscope.
//!
//! Only stage-fatal conditions live here. Problems local to a call site are
//! counted and reported as diagnostics instead.

use std::path::PathBuf;

/// Errors that abort the call graph stage.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Program representation not found: {path}")]
    ProgramNotFound { path: PathBuf },

    #[error("Failed to read program representation {path}: {source}")]
    ProgramUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid program representation {path}: {source}")]
    ProgramMalformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Program representation contains no packages; nothing to analyze")]
    EmptyProgram,
}

/// Invalid configuration values.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown call graph algorithm '{0}' (expected cha|rta)")]
    UnknownAlgorithm(String),

    #[error("Unknown position mode '{0}' (expected detailed|minimal)")]
    UnknownPositionMode(String),

    #[error("Failed to read config file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
