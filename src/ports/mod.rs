use std::io;

use crate::domain::callgraph::{CallGraph, ResolvedCalls};
use crate::domain::cha::ChaBuilder;
use crate::domain::index::ProgramIndex;
use crate::domain::program::Program;
use crate::domain::rta::RtaBuilder;
use crate::error::AnalysisError;

pub mod dot_exporter;

/// Supplies the type-resolved program produced by the front end.
pub trait ProgramSource {
    fn load_program(&self) -> Result<Program, AnalysisError>;
}

/// Resolves call sites into raw caller -> callee edges.
pub trait CallGraphBuilder {
    fn build_call_graph(&self, index: &ProgramIndex<'_>) -> ResolvedCalls;
}

pub trait OutputExporter {
    fn export(&self, cg: &CallGraph, out: &mut dyn io::Write) -> io::Result<()>;
}

impl CallGraphBuilder for ChaBuilder {
    fn build_call_graph(&self, index: &ProgramIndex<'_>) -> ResolvedCalls {
        self.build(index)
    }
}

impl CallGraphBuilder for RtaBuilder {
    fn build_call_graph(&self, index: &ProgramIndex<'_>) -> ResolvedCalls {
        self.analyze(index).calls
    }
}
