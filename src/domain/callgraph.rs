// Call graph structures for goscope.
// Builders emit raw `ResolvedEdge`s; the assembler turns them into a `CallGraph`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::diagnostics::{Diagnostic, SiteCounters};
use crate::domain::identity::CallableKind;
use crate::domain::program::{CallKind, Position};

/// The algorithm that actually produced a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphAlgorithm {
    #[serde(rename = "cha")]
    Cha,
    #[serde(rename = "rta")]
    Rta,
    /// RTA was requested but there was no entry point to start from.
    #[serde(rename = "cha-fallback")]
    ChaFallback,
}

impl GraphAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            GraphAlgorithm::Cha => "cha",
            GraphAlgorithm::Rta => "rta",
            GraphAlgorithm::ChaFallback => "cha-fallback",
        }
    }
}

impl fmt::Display for GraphAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One caller -> callee fact as a builder resolved it. May repeat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEdge {
    pub caller: String,
    pub callee: String,
    pub kind: CallKind,
    pub site: Option<Position>,
}

/// Raw builder output.
#[derive(Debug, Default, Clone)]
pub struct ResolvedCalls {
    pub edges: Vec<ResolvedEdge>,
    pub skipped: SiteCounters,
}

/// A node in the call graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallGraphNode {
    pub id: String,
    pub qualified_name: String,
    pub package: String,
    pub name: String,
    pub kind: CallableKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

/// A deduplicated caller -> callee edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallGraphEdge {
    pub source: String,
    pub target: String,
    pub kind: CallKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_site: Option<Position>,
}

/// The call graph artifact: nodes sorted by id, edges by (source, target).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallGraph {
    pub algorithm: GraphAlgorithm,
    pub nodes: Vec<CallGraphNode>,
    pub edges: Vec<CallGraphEdge>,
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

impl CallGraph {
    pub fn node(&self, id: &str) -> Option<&CallGraphNode> {
        self.nodes
            .binary_search_by(|n| n.id.as_str().cmp(id))
            .ok()
            .map(|idx| &self.nodes[idx])
    }

    pub fn edge(&self, source: &str, target: &str) -> Option<&CallGraphEdge> {
        self.edges
            .binary_search_by(|e| (e.source.as_str(), e.target.as_str()).cmp(&(source, target)))
            .ok()
            .map(|idx| &self.edges[idx])
    }

    pub fn callees_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.edges
            .iter()
            .filter(move |e| e.source == id)
            .map(|e| e.target.as_str())
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.id.as_str())
    }
}
