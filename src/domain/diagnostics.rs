//! Non-fatal conditions reported alongside the call graph.

use serde::{Deserialize, Serialize};

use crate::domain::index::IndexStats;
use crate::domain::program::Position;

pub const RTA_NO_ENTRY_POINTS: &str = "rta-no-entry-points";
pub const UNKNOWN_ENTRY_POINTS: &str = "unknown-entry-points";
pub const UNRESOLVED_CALL_SITES: &str = "unresolved-call-sites";
pub const DANGLING_REFERENCES: &str = "dangling-references";
pub const DUPLICATE_DECLARATIONS: &str = "duplicate-declarations";
pub const DANGLING_EMBEDS: &str = "dangling-embeds";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl Diagnostic {
    pub fn info(code: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            code: code.to_string(),
            message: message.into(),
            position: None,
        }
    }

    pub fn warning(code: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code: code.to_string(),
            message: message.into(),
            position: None,
        }
    }
}

/// Call sites and facts a builder had to skip. Counted, never propagated.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SiteCounters {
    /// Interface calls whose static interface type is unknown.
    pub unresolved: usize,
    /// References to functions, types or interfaces missing from the program.
    pub dangling: usize,
}

impl SiteCounters {
    pub fn is_clean(&self) -> bool {
        self.unresolved == 0 && self.dangling == 0
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        if self.unresolved > 0 {
            out.push(Diagnostic::warning(
                UNRESOLVED_CALL_SITES,
                format!(
                    "{} interface call site(s) without a static interface type were skipped",
                    self.unresolved
                ),
            ));
        }
        if self.dangling > 0 {
            out.push(Diagnostic::warning(
                DANGLING_REFERENCES,
                format!(
                    "{} call site(s) or construction(s) referencing undeclared functions, types or interfaces were skipped",
                    self.dangling
                ),
            ));
        }
        out
    }
}

impl IndexStats {
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        if self.duplicate_declarations > 0 {
            out.push(Diagnostic::warning(
                DUPLICATE_DECLARATIONS,
                format!(
                    "{} duplicate declaration(s); the first in package order was kept",
                    self.duplicate_declarations
                ),
            ));
        }
        if self.dangling_embeds > 0 {
            out.push(Diagnostic::warning(
                DANGLING_EMBEDS,
                format!("{} embedded interface(s) or struct field type(s) not found in the program", self.dangling_embeds),
            ));
        }
        out
    }
}
