// Infrastructure implementations for goscope: program loading and graph exporters.

pub mod concurrency;
pub mod config;
pub mod logging;

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::str::FromStr;

use memmap2::Mmap;
use tracing::debug;

use crate::domain::callgraph::CallGraph;
use crate::domain::program::Program;
use crate::error::AnalysisError;
use crate::ports::dot_exporter::DotExporter;
use crate::ports::{OutputExporter, ProgramSource};

/// Loads a program representation from a JSON file on disk.
pub struct JsonProgramLoader {
    path: PathBuf,
}

impl JsonProgramLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ProgramSource for JsonProgramLoader {
    fn load_program(&self) -> Result<Program, AnalysisError> {
        if !self.path.exists() {
            return Err(AnalysisError::ProgramNotFound {
                path: self.path.clone(),
            });
        }
        let unreadable = |source| AnalysisError::ProgramUnreadable {
            path: self.path.clone(),
            source,
        };

        let file = File::open(&self.path).map_err(unreadable)?;
        let len = file.metadata().map_err(unreadable)?.len();

        // Mapping a zero-length file fails on some platforms.
        let parsed = if len == 0 {
            serde_json::from_slice::<Program>(&[])
        } else {
            // SAFETY: the file is only read, and the mapping is dropped before returning.
            let mmap = unsafe { Mmap::map(&file) }.map_err(unreadable)?;
            serde_json::from_slice::<Program>(&mmap)
        };

        let program = parsed.map_err(|source| AnalysisError::ProgramMalformed {
            path: self.path.clone(),
            source,
        })?;
        debug!(
            "Loaded {} ({} bytes, {} packages)",
            self.path.display(),
            len,
            program.packages.len()
        );
        Ok(program)
    }
}

/// Pretty-printed JSON, one document per graph.
pub struct JsonExporter;

impl OutputExporter for JsonExporter {
    fn export(&self, cg: &CallGraph, out: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *out, cg)?;
        out.write_all(b"\n")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Json,
    Dot,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "dot" => Ok(OutputFormat::Dot),
            other => anyhow::bail!("Unknown output format '{}' (expected json|dot)", other),
        }
    }
}

pub fn exporter_for(format: OutputFormat) -> &'static dyn OutputExporter {
    match format {
        OutputFormat::Json => &JsonExporter,
        OutputFormat::Dot => &DotExporter,
    }
}
