//! Class Hierarchy Analysis.
//!
//! Every declared function is treated as live. Direct calls go to their static
//! target, interface calls fan out to every type form that satisfies the
//! interface and has the method, and calls through function values fan out to
//! every declared callable with a matching signature.

use std::collections::BTreeSet;

use crate::domain::callgraph::{ResolvedCalls, ResolvedEdge};
use crate::domain::diagnostics::SiteCounters;
use crate::domain::index::{FunctionEntry, ProgramIndex, TypeForm};
use crate::domain::program::{CallSite, CallTarget, TypeRef};

/// Why a call site could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Skip {
    Unresolved,
    Dangling,
}

impl SiteCounters {
    pub(crate) fn record(&mut self, skip: Skip) {
        match skip {
            Skip::Unresolved => self.unresolved += 1,
            Skip::Dangling => self.dangling += 1,
        }
    }
}

/// Validate the static interface of an interface call.
pub(crate) fn interface_of<'t>(
    index: &ProgramIndex<'_>,
    interface: Option<&'t TypeRef>,
    method: &str,
) -> Result<&'t TypeRef, Skip> {
    let iface = interface.ok_or(Skip::Unresolved)?;
    match index.interface_methods(iface) {
        Some(contract) if contract.contains_key(method) => Ok(iface),
        _ => Err(Skip::Dangling),
    }
}

/// Conservative callees of `iface.method`: types declaring `method`,
/// restricted to the forms that satisfy `iface`.
pub fn interface_callees(index: &ProgramIndex<'_>, iface: &TypeRef, method: &str) -> BTreeSet<String> {
    let mut callees = BTreeSet::new();
    for ty in index.types_declaring(method) {
        for form in [TypeForm::value(ty.clone()), TypeForm::pointer(ty.clone())] {
            if !index.satisfies(&form, iface) {
                continue;
            }
            if let Some(m) = index.method_of(&form, method) {
                callees.insert(m.id.clone());
            }
        }
    }
    callees
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ChaBuilder;

impl ChaBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self, index: &ProgramIndex<'_>) -> ResolvedCalls {
        let mut out = ResolvedCalls::default();
        for caller in index.functions() {
            for site in &caller.decl.call_sites {
                Self::resolve_site(index, caller, site, &mut out);
            }
        }
        out
    }

    fn resolve_site(index: &ProgramIndex<'_>, caller: &FunctionEntry<'_>, site: &CallSite, out: &mut ResolvedCalls) {
        let mut emit = |callee: String| {
            out.edges.push(ResolvedEdge {
                caller: caller.info.id.clone(),
                callee,
                kind: site.kind,
                site: site.position.clone(),
            });
        };

        match &site.target {
            CallTarget::Static(func) => match index.resolve(func) {
                Some(id) => emit(id),
                None => out.skipped.record(Skip::Dangling),
            },
            CallTarget::Interface { interface, method } => {
                match interface_of(index, interface.as_ref(), method) {
                    Ok(iface) => {
                        for callee in interface_callees(index, iface, method) {
                            emit(callee);
                        }
                    }
                    Err(skip) => out.skipped.record(skip),
                }
            }
            CallTarget::Dynamic(sig) => {
                for callee in index.functions_with_signature(sig) {
                    emit(callee.clone());
                }
            }
        }
    }

    /// Functions CHA considers reachable: every declaration plus every callee.
    pub fn reachable(index: &ProgramIndex<'_>, calls: &ResolvedCalls) -> BTreeSet<String> {
        index
            .functions()
            .map(|f| f.info.id.clone())
            .chain(calls.edges.iter().map(|e| e.callee.clone()))
            .collect()
    }
}
