//! Graph assembly: deduplication, allow-list filtering and ordering.
//!
//! Builders hand over edges in whatever order their traversal produced, with
//! repeats. The assembler keys nodes by identity and edges by
//! (source, target), keeps the first kind and position seen for a pair, and
//! sorts everything before emitting. Sorting is what makes two runs over the
//! same program byte-identical, so it happens unconditionally.

use std::collections::HashMap;
use std::path::Path;

use crate::domain::callgraph::{CallGraph, CallGraphEdge, CallGraphNode, GraphAlgorithm, ResolvedEdge};
use crate::domain::diagnostics::Diagnostic;
use crate::domain::identity::CallableInfo;
use crate::domain::index::ProgramIndex;
use crate::domain::options::PositionMode;
use crate::domain::program::Position;

#[derive(Debug, Clone, Default)]
pub struct AssemblyOptions {
    pub positions: PositionMode,
    /// Package path substrings. Empty strings are ignored.
    pub only_pkg: Vec<String>,
    /// Positions under this directory are made relative to it.
    pub root: Option<String>,
}

pub struct GraphAssembler<'a, 'p> {
    index: &'a ProgramIndex<'p>,
    options: AssemblyOptions,
    nodes: HashMap<String, CallGraphNode>,
    edges: HashMap<(String, String), CallGraphEdge>,
    filtered: usize,
}

impl<'a, 'p> GraphAssembler<'a, 'p> {
    pub fn new(index: &'a ProgramIndex<'p>, mut options: AssemblyOptions) -> Self {
        options.only_pkg.retain(|s| !s.is_empty());
        Self {
            index,
            options,
            nodes: HashMap::new(),
            edges: HashMap::new(),
            filtered: 0,
        }
    }

    /// Edges dropped so far because both endpoints were outside the allow-list.
    pub fn filtered(&self) -> usize {
        self.filtered
    }

    pub fn extend(&mut self, edges: impl IntoIterator<Item = ResolvedEdge>) {
        for edge in edges {
            self.add(edge);
        }
    }

    pub fn add(&mut self, edge: ResolvedEdge) {
        let source = self.index.describe(&edge.caller);
        let target = self.index.describe(&edge.callee);

        if !self.options.only_pkg.is_empty() && !self.allowed(&source) && !self.allowed(&target) {
            self.filtered += 1;
            return;
        }

        self.ensure_node(source);
        self.ensure_node(target);

        let key = (edge.caller, edge.callee);
        if self.edges.contains_key(&key) {
            return;
        }
        let call_site = self.position(edge.site.as_ref());
        self.edges.insert(
            key.clone(),
            CallGraphEdge {
                source: key.0,
                target: key.1,
                kind: edge.kind,
                call_site,
            },
        );
    }

    /// Sort and emit the final artifact.
    pub fn finish(self, algorithm: GraphAlgorithm, diagnostics: Vec<Diagnostic>) -> CallGraph {
        let mut nodes: Vec<CallGraphNode> = self.nodes.into_values().collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));

        let mut edges: Vec<CallGraphEdge> = self.edges.into_values().collect();
        edges.sort_by(|a, b| (&a.source, &a.target).cmp(&(&b.source, &b.target)));

        CallGraph {
            algorithm,
            nodes,
            edges,
            diagnostics,
        }
    }

    fn allowed(&self, info: &CallableInfo) -> bool {
        // Builtins never match a non-empty allow-list.
        !info.is_builtin()
            && self
                .options
                .only_pkg
                .iter()
                .any(|s| info.package.contains(s.as_str()))
    }

    fn ensure_node(&mut self, info: CallableInfo) {
        if self.nodes.contains_key(&info.id) {
            return;
        }
        let position = self.position(info.position.as_ref());
        self.nodes.insert(
            info.id.clone(),
            CallGraphNode {
                qualified_name: info.id.clone(),
                id: info.id,
                package: info.package,
                name: info.name,
                kind: info.kind,
                position,
            },
        );
    }

    fn position(&self, pos: Option<&Position>) -> Option<Position> {
        if self.options.positions == PositionMode::Minimal {
            return None;
        }
        let pos = pos?;
        Some(Position {
            file: relative_file(&pos.file, self.options.root.as_deref()),
            start_line: pos.start_line,
            start_column: pos.start_column,
        })
    }
}

/// Make `file` relative to `root` when it lives under it; always `/`-separated.
fn relative_file(file: &str, root: Option<&str>) -> String {
    let rel = root
        .and_then(|root| Path::new(file).strip_prefix(root).ok())
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.to_string());
    rel.replace('\\', "/")
}
