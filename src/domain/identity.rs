//! Stable identities for functions and methods.
//!
//! Identities are the join key of the whole pipeline: graph nodes and edges are
//! deduplicated on them and downstream consumers correlate them with the
//! symbol table's qualified names. They are derived from declaration data only,
//! so the same callable gets the same string under CHA, RTA and across runs.
//!
//! Format:
//! - functions: `<package>.<name>`
//! - methods: `<package>.(<*?><Type>).<name>`
//! - builtins (no owning package): `<name>`

use serde::{Deserialize, Serialize};

use crate::domain::program::{FuncRef, Position, Receiver};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallableKind {
    Function,
    Method,
}

impl CallableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallableKind::Function => "function",
            CallableKind::Method => "method",
        }
    }
}

/// Classification of a callable, independent of the algorithm that found it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallableInfo {
    pub id: String,
    pub package: String,
    pub name: String,
    pub kind: CallableKind,
    pub receiver: Option<Receiver>,
    pub position: Option<Position>,
}

impl CallableInfo {
    pub fn new(package: &str, name: &str, receiver: Option<&Receiver>, position: Option<Position>) -> Self {
        let receiver = receiver.map(normalize_receiver);
        let kind = if receiver.is_some() {
            CallableKind::Method
        } else {
            CallableKind::Function
        };
        Self {
            id: stable_id(package, name, receiver.as_ref()),
            package: package.to_string(),
            name: name.to_string(),
            kind,
            receiver,
            position,
        }
    }

    /// Info for an identity that has no declaration behind it (builtins).
    pub fn builtin(id: &str) -> Self {
        Self {
            id: id.to_string(),
            package: String::new(),
            name: id.to_string(),
            kind: CallableKind::Function,
            receiver: None,
            position: None,
        }
    }

    pub fn is_builtin(&self) -> bool {
        self.package.is_empty()
    }
}

/// Build the stable identity of a callable.
pub fn stable_id(package: &str, name: &str, receiver: Option<&Receiver>) -> String {
    if package.is_empty() {
        return name.to_string();
    }
    match receiver {
        Some(recv) => {
            let recv = normalize_receiver(recv);
            let marker = if recv.pointer { "*" } else { "" };
            format!("{}.({}{}).{}", package, marker, recv.type_name, name)
        }
        None => format!("{}.{}", package, name),
    }
}

pub fn func_ref_id(func: &FuncRef) -> String {
    stable_id(&func.package, &func.name, func.receiver.as_ref())
}

/// Front ends disagree on how they spell receivers (`*T`, `pkg.T`,
/// `*example.com/pkg.T`). Reduce all of them to a bare type name plus the
/// pointer flag.
pub fn normalize_receiver(recv: &Receiver) -> Receiver {
    let raw = recv
        .type_name
        .trim()
        .trim_start_matches('(')
        .trim_end_matches(')');
    let (star, rest) = match raw.strip_prefix('*') {
        Some(inner) => (true, inner),
        None => (false, raw),
    };
    let bare = match rest.rfind('.') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    Receiver {
        type_name: bare.to_string(),
        pointer: star || recv.pointer,
    }
}
