//! Program representation handed over by the front end.
//!
//! Everything here is produced by an external type checker and is treated as
//! read-only once loaded. The shapes mirror what a fully type-resolved Go
//! front end knows: packages, declared functions and methods, concrete types,
//! interface contracts and, per function body, the call sites and type
//! constructions found in it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A whole program: every package the analysis may see.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    /// Project root; positions under it are emitted relative to it.
    #[serde(default)]
    pub root: Option<String>,
    #[serde(default)]
    pub packages: Vec<Package>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Package {
    /// Import path, e.g. `example.com/app/store`.
    pub path: String,
    /// Declared package name (`main` marks an executable package).
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub functions: Vec<FunctionDecl>,
    #[serde(default)]
    pub types: Vec<TypeDecl>,
    #[serde(default)]
    pub interfaces: Vec<InterfaceDecl>,
}

/// Source position of a declaration or call site.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub file: String,
    pub start_line: u32,
    #[serde(default)]
    pub start_column: u32,
}

/// Method receiver. `type_name` is the bare name of a type declared in the
/// same package as the method.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Receiver {
    pub type_name: String,
    #[serde(default)]
    pub pointer: bool,
}

/// Parameter and result types of a callable, receiver excluded.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Signature {
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub results: Vec<String>,
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "func({})", self.params.join(", "))?;
        match self.results.len() {
            0 => Ok(()),
            1 => write!(f, " {}", self.results[0]),
            _ => write!(f, " ({})", self.results.join(", ")),
        }
    }
}

/// Reference to a named type: `package` import path plus type name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypeRef {
    pub package: String,
    pub name: String,
}

impl TypeRef {
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.package.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}.{}", self.package, self.name)
        }
    }
}

/// Reference to a function or method. An empty `package` denotes a builtin.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FuncRef {
    #[serde(default)]
    pub package: String,
    pub name: String,
    #[serde(default)]
    pub receiver: Option<Receiver>,
}

/// A declared function or method together with the facts of its body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    #[serde(default)]
    pub receiver: Option<Receiver>,
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub results: Vec<String>,
    #[serde(default)]
    pub position: Option<Position>,
    /// Explicitly designated program entry point.
    #[serde(default)]
    pub entry: bool,
    #[serde(default)]
    pub call_sites: Vec<CallSite>,
    /// Values or pointers of concrete types created in the body.
    #[serde(default)]
    pub constructs: Vec<Construction>,
    /// Functions and method values referenced without being called.
    #[serde(default)]
    pub address_taken: Vec<FuncRef>,
}

impl FunctionDecl {
    pub fn signature(&self) -> Signature {
        Signature {
            params: self.params.clone(),
            results: self.results.clone(),
        }
    }
}

/// A concrete (non-interface) named type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    /// Embedded struct fields. Their methods are promoted into this type's
    /// method sets by the program index.
    #[serde(default)]
    pub embeds: Vec<EmbeddedField>,
    #[serde(default)]
    pub position: Option<Position>,
}

/// An embedded field `E` (`pointer == false`) or `*E` (`pointer == true`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedField {
    pub package: String,
    pub name: String,
    #[serde(default)]
    pub pointer: bool,
}

impl EmbeddedField {
    pub fn type_ref(&self) -> TypeRef {
        TypeRef::new(&self.package, &self.name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InterfaceDecl {
    pub name: String,
    #[serde(default)]
    pub methods: Vec<MethodSpec>,
    /// Embedded interfaces; flattened by the program index.
    #[serde(default)]
    pub embeds: Vec<TypeRef>,
    #[serde(default)]
    pub position: Option<Position>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MethodSpec {
    pub name: String,
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub results: Vec<String>,
}

impl MethodSpec {
    pub fn signature(&self) -> Signature {
        Signature {
            params: self.params.clone(),
            results: self.results.clone(),
        }
    }
}

/// Creation of a `T` value (`pointer == false`) or a `*T` (`pointer == true`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Construction {
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
    #[serde(default)]
    pub pointer: bool,
}

/// Syntactic kind of a call expression. Also used as the edge kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CallKind {
    #[default]
    #[serde(rename = "call")]
    Call,
    #[serde(rename = "concurrent-spawn", alias = "go")]
    Spawn,
    #[serde(rename = "deferred", alias = "defer")]
    Deferred,
}

impl CallKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallKind::Call => "call",
            CallKind::Spawn => "concurrent-spawn",
            CallKind::Deferred => "deferred",
        }
    }
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a call expression statically refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallTarget {
    /// Direct reference to a function or a concrete method.
    Static(FuncRef),
    /// Method invocation through an interface value. `interface` is `None`
    /// when the front end could not determine the static interface type.
    Interface {
        #[serde(default)]
        interface: Option<TypeRef>,
        method: String,
    },
    /// Call through a function value of the given signature.
    Dynamic(Signature),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    pub target: CallTarget,
    #[serde(default)]
    pub kind: CallKind,
    #[serde(default)]
    pub position: Option<Position>,
}
