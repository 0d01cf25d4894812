//! Entry Point Detection Module
//!
//! Collects the roots RTA starts from: `main` and `init` of executable
//! packages, functions the front end designated as entry points, and
//! identities supplied through configuration.

use std::collections::BTreeMap;

use crate::domain::index::ProgramIndex;
use crate::domain::program::Position;

/// Represents a detected entry point in the program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    /// Stable identity of the entry function
    pub id: String,
    /// Plain function name
    pub name: String,
    /// Why this function is an entry point
    pub kind: EntryPointKind,
    pub position: Option<Position>,
}

/// Classification of entry point types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EntryPointKind {
    Main,       // func main() in package main
    Init,       // func init() in package main
    Designated, // marked by the front end
    Configured, // named in the analysis configuration
}

/// Detection result. `unknown` lists configured identities that are not
/// declared anywhere in the program.
#[derive(Debug, Clone, Default)]
pub struct EntryPointSet {
    pub entries: Vec<EntryPoint>,
    pub unknown: Vec<String>,
}

impl EntryPointSet {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.id.clone()).collect()
    }
}

/// Entry point detector
pub struct EntryPointDetector {
    configured: Vec<String>,
}

impl EntryPointDetector {
    pub fn new(configured: &[String]) -> Self {
        Self {
            configured: configured
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// Detect entry points, one per identity, ordered by identity.
    pub fn detect(&self, index: &ProgramIndex<'_>) -> EntryPointSet {
        let mut found: BTreeMap<String, EntryPoint> = BTreeMap::new();

        let main_packages: Vec<&str> = index
            .program()
            .packages
            .iter()
            .filter(|p| p.name == "main")
            .map(|p| p.path.as_str())
            .collect();

        for entry in index.functions() {
            let info = &entry.info;
            let implicit = if info.receiver.is_none() && main_packages.contains(&info.package.as_str()) {
                match info.name.as_str() {
                    "main" => Some(EntryPointKind::Main),
                    "init" => Some(EntryPointKind::Init),
                    _ => None,
                }
            } else {
                None
            };
            let kind = match (implicit, entry.decl.entry) {
                (Some(kind), _) => kind,
                (None, true) => EntryPointKind::Designated,
                (None, false) => continue,
            };
            found.insert(
                info.id.clone(),
                EntryPoint {
                    id: info.id.clone(),
                    name: info.name.clone(),
                    kind,
                    position: info.position.clone(),
                },
            );
        }

        let mut unknown = Vec::new();
        for id in &self.configured {
            if found.contains_key(id) {
                continue;
            }
            match index.function(id) {
                Some(entry) => {
                    found.insert(
                        id.clone(),
                        EntryPoint {
                            id: id.clone(),
                            name: entry.info.name.clone(),
                            kind: EntryPointKind::Configured,
                            position: entry.info.position.clone(),
                        },
                    );
                }
                None => unknown.push(id.clone()),
            }
        }
        unknown.sort();
        unknown.dedup();

        EntryPointSet {
            entries: found.into_values().collect(),
            unknown,
        }
    }
}
