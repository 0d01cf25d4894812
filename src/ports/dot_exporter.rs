//! Call Graph DOT Exporter
//!
//! Exports a CallGraph as Graphviz DOT, styled by node and edge kind.

use std::io::{Result, Write};

use crate::domain::callgraph::{CallGraph, CallGraphNode};
use crate::domain::identity::CallableKind;
use crate::domain::program::CallKind;
use crate::ports::OutputExporter;

pub struct DotExporter;

impl OutputExporter for DotExporter {
    fn export(&self, cg: &CallGraph, out: &mut dyn Write) -> Result<()> {
        out.write_all(Self::to_dot(cg).as_bytes())?;
        out.write_all(b"\n")
    }
}

impl DotExporter {
    /// Convert a CallGraph to a DOT string.
    pub fn to_dot(cg: &CallGraph) -> String {
        let mut lines = Vec::new();

        lines.push("digraph CallGraph {".to_string());
        lines.push("    rankdir=LR;".to_string());
        lines.push(format!("    label=\"{}\";", cg.algorithm));
        lines.push("    node [fontname=\"Helvetica\", fontsize=11];".to_string());
        lines.push("    edge [fontname=\"Helvetica\", fontsize=9];".to_string());
        lines.push("".to_string());

        for node in &cg.nodes {
            let (shape, fill, style) = Self::node_style(node);
            lines.push(format!(
                "    \"{}\" [label=\"{}\", shape={}, style=\"{}\", fillcolor=\"{}\"];",
                Self::escape(&node.id),
                Self::escape(&Self::node_label(node)),
                shape,
                style,
                fill
            ));
        }

        lines.push("".to_string());

        for edge in &cg.edges {
            let attrs = match edge.kind {
                CallKind::Call => String::new(),
                CallKind::Spawn => " [style=dashed, label=\"go\"]".to_string(),
                CallKind::Deferred => " [style=dotted, label=\"defer\"]".to_string(),
            };
            lines.push(format!(
                "    \"{}\" -> \"{}\"{};",
                Self::escape(&edge.source),
                Self::escape(&edge.target),
                attrs
            ));
        }

        lines.push("}".to_string());

        lines.join("\n")
    }

    fn node_label(node: &CallGraphNode) -> String {
        if node.package.is_empty() {
            node.name.clone()
        } else {
            // Short label: last path segment of the package plus the callable.
            let short_pkg = node.package.rsplit('/').next().unwrap_or(&node.package);
            match node.id.strip_prefix(node.package.as_str()) {
                Some(qualified) => format!("{}{}", short_pkg, qualified),
                None => node.id.clone(),
            }
        }
    }

    fn node_style(node: &CallGraphNode) -> (&'static str, &'static str, &'static str) {
        if node.package.is_empty() {
            return ("box", "#6c7086", "filled,dashed"); // builtin, gray
        }
        match node.kind {
            CallableKind::Function => ("box", "#89b4fa", "filled"), // blue
            CallableKind::Method => ("box", "#a6e3a1", "filled,rounded"), // green
        }
    }

    fn escape(label: &str) -> String {
        label
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('\n', "\\n")
    }
}
