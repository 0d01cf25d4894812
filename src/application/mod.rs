use std::path::Path;

use anyhow::Context;
use tracing::{debug, info};

use crate::domain::assembler::{AssemblyOptions, GraphAssembler};
use crate::domain::callgraph::{CallGraph, GraphAlgorithm};
use crate::domain::cha::ChaBuilder;
use crate::domain::diagnostics::{Diagnostic, RTA_NO_ENTRY_POINTS, UNKNOWN_ENTRY_POINTS};
use crate::domain::entry_point::EntryPointDetector;
use crate::domain::index::ProgramIndex;
use crate::domain::options::{Algorithm, AnalysisConfig};
use crate::domain::program::Program;
use crate::domain::rta::RtaBuilder;
use crate::error::AnalysisError;
use crate::ports::{CallGraphBuilder, OutputExporter, ProgramSource};

/// Run the call graph stage over an already loaded program.
///
/// Fails only when there is nothing to analyze. Everything else that goes
/// wrong at a single call site ends up in `CallGraph::diagnostics`.
pub fn build_call_graph(program: &Program, config: &AnalysisConfig) -> Result<CallGraph, AnalysisError> {
    if program.packages.is_empty() {
        return Err(AnalysisError::EmptyProgram);
    }

    let index = ProgramIndex::build(program);
    let mut diagnostics = index.stats().diagnostics();

    let (algorithm, builder): (GraphAlgorithm, Box<dyn CallGraphBuilder>) = match config.algorithm {
        Algorithm::Cha => (GraphAlgorithm::Cha, Box::new(ChaBuilder::new())),
        Algorithm::Rta => {
            let entries = EntryPointDetector::new(&config.entry_points).detect(&index);
            if !entries.unknown.is_empty() {
                diagnostics.push(Diagnostic::warning(
                    UNKNOWN_ENTRY_POINTS,
                    format!("Configured entry points not found: {}", entries.unknown.join(", ")),
                ));
            }
            match RtaBuilder::for_entry_points(&entries) {
                Some(rta) => {
                    debug!("RTA roots: {:?}", entries.ids());
                    (GraphAlgorithm::Rta, Box::new(rta))
                }
                None => {
                    info!("No entry points found; falling back to CHA");
                    diagnostics.push(Diagnostic::info(
                        RTA_NO_ENTRY_POINTS,
                        "RTA requested but the program has no entry points; the graph was built with CHA",
                    ));
                    (GraphAlgorithm::ChaFallback, Box::new(ChaBuilder::new()))
                }
            }
        }
    };

    let calls = builder.build_call_graph(&index);
    diagnostics.extend(calls.skipped.diagnostics());

    let mut assembler = GraphAssembler::new(
        &index,
        AssemblyOptions {
            positions: config.emit_positions,
            only_pkg: config.only_pkg.clone(),
            root: program.root.clone(),
        },
    );
    assembler.extend(calls.edges);
    let filtered = assembler.filtered();
    let graph = assembler.finish(algorithm, diagnostics);

    info!(
        "Call graph built ({}): {} nodes, {} edges",
        graph.algorithm,
        graph.nodes.len(),
        graph.edges.len()
    );
    debug!(
        "Skipped sites: {} unresolved, {} dangling; {} edges outside the package filter",
        calls.skipped.unresolved, calls.skipped.dangling, filtered
    );

    Ok(graph)
}

pub struct AnalyzeUsecase<'a> {
    pub source: &'a dyn ProgramSource,
    pub exporter: &'a dyn OutputExporter,
}

impl<'a> AnalyzeUsecase<'a> {
    pub fn analyze(&self, config: &AnalysisConfig) -> Result<CallGraph, AnalysisError> {
        let program = self.source.load_program()?;
        build_call_graph(&program, config)
    }

    /// Analyze and write the exported graph to `out_path` (`-` for stdout).
    pub fn run(&self, config: &AnalysisConfig, out_path: &str) -> anyhow::Result<CallGraph> {
        let graph = self.analyze(config)?;

        if out_path == "-" {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            self.exporter
                .export(&graph, &mut lock)
                .context("Failed to write call graph to stdout")?;
        } else {
            let path = Path::new(out_path);
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create output directory {}", parent.display()))?;
            }
            let mut file = std::io::BufWriter::new(
                std::fs::File::create(path).with_context(|| format!("Failed to create {}", out_path))?,
            );
            self.exporter
                .export(&graph, &mut file)
                .with_context(|| format!("Failed to write call graph to {}", out_path))?;
            info!("Call graph written to {}", out_path);
        }

        Ok(graph)
    }
}
