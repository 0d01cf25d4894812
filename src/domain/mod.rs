//! Call graph core: program model, index, builders and assembly.

pub mod assembler;
pub mod callgraph;
pub mod cha;
pub mod diagnostics;
pub mod entry_point;
pub mod identity;
pub mod index;
pub mod options;
pub mod program;
pub mod rta;
