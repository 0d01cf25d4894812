//! Rapid Type Analysis.
//!
//! Starting from the entry points, grows two monotone sets together:
//! reachable functions and live type forms. Interface calls only resolve to
//! methods of live forms; calls through function values only resolve to
//! functions whose address was taken by reachable code.
//!
//! Facts can arrive in either order (a call site before the type that makes it
//! resolvable, or the other way round), so every interface call and dynamic
//! call is remembered in a pending index and re-examined when a relevant new
//! fact shows up. The fixpoint is reached when the worklist is empty.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::{debug, warn};

use crate::domain::callgraph::{ResolvedCalls, ResolvedEdge};
use crate::domain::cha::{interface_of, Skip};
use crate::domain::entry_point::EntryPointSet;
use crate::domain::index::{ProgramIndex, TypeForm};
use crate::domain::program::{CallKind, CallSite, CallTarget, Position, Signature, TypeRef};

/// A call site waiting for new live types or address-taken functions.
#[derive(Debug, Clone)]
struct PendingSite {
    caller: String,
    kind: CallKind,
    site: Option<Position>,
}

/// Result of the fixpoint.
#[derive(Debug, Default, Clone)]
pub struct RtaAnalysis {
    pub reachable: BTreeSet<String>,
    pub live_types: BTreeSet<TypeForm>,
    pub address_taken: BTreeSet<String>,
    pub calls: ResolvedCalls,
}

/// RTA needs at least one root. With none, nothing is reachable and the
/// analysis is empty; callers wanting the CHA fallback go through
/// [`RtaBuilder::for_entry_points`], which refuses an empty set.
#[derive(Debug, Clone)]
pub struct RtaBuilder {
    roots: Vec<String>,
}

impl RtaBuilder {
    /// `roots` are entry-point identities.
    pub fn new(roots: Vec<String>) -> Self {
        Self { roots }
    }

    /// `None` when there is no entry point to start from.
    pub fn for_entry_points(entries: &EntryPointSet) -> Option<Self> {
        if entries.is_empty() {
            return None;
        }
        Some(Self::new(entries.ids()))
    }

    pub fn analyze(&self, index: &ProgramIndex<'_>) -> RtaAnalysis {
        if self.roots.is_empty() {
            warn!("RTA started without entry points; the result is empty");
        }
        let mut state = Fixpoint::new(index);
        for root in &self.roots {
            if index.function(root).is_some() {
                state.reach(root);
            } else {
                state.out.calls.skipped.record(Skip::Dangling);
            }
        }

        while let Some(id) = state.queue.pop_front() {
            state.process(&id);
        }

        debug!(
            reachable = state.out.reachable.len(),
            live_types = state.out.live_types.len(),
            edges = state.out.calls.edges.len(),
            "rta fixpoint reached"
        );
        state.out
    }
}

struct Fixpoint<'a, 'p> {
    index: &'a ProgramIndex<'p>,
    queue: VecDeque<String>,
    // Keyed by (interface, method).
    pending_interface: BTreeMap<(TypeRef, String), Vec<PendingSite>>,
    pending_dynamic: BTreeMap<Signature, Vec<PendingSite>>,
    out: RtaAnalysis,
}

impl<'a, 'p> Fixpoint<'a, 'p> {
    fn new(index: &'a ProgramIndex<'p>) -> Self {
        Self {
            index,
            queue: VecDeque::new(),
            pending_interface: BTreeMap::new(),
            pending_dynamic: BTreeMap::new(),
            out: RtaAnalysis::default(),
        }
    }

    fn reach(&mut self, id: &str) {
        if self.out.reachable.insert(id.to_string()) {
            self.queue.push_back(id.to_string());
        }
    }

    fn edge(&mut self, caller: &str, callee: String, kind: CallKind, site: Option<Position>) {
        self.reach(&callee);
        self.out.calls.edges.push(ResolvedEdge {
            caller: caller.to_string(),
            callee,
            kind,
            site,
        });
    }

    fn process(&mut self, id: &str) {
        let index = self.index;
        // Builtins and bodiless declarations contribute nothing.
        let Some(entry) = index.function(id) else {
            return;
        };
        let decl = entry.decl;

        for construction in &decl.constructs {
            if !index.is_concrete(&construction.type_ref) {
                self.out.calls.skipped.record(Skip::Dangling);
                continue;
            }
            let form = TypeForm {
                type_ref: construction.type_ref.clone(),
                pointer: construction.pointer,
            };
            self.make_live(form);
        }

        for func in &decl.address_taken {
            match index.resolve(func) {
                Some(target) if index.function(&target).is_some() => self.take_address(target),
                _ => self.out.calls.skipped.record(Skip::Dangling),
            }
        }

        for site in &decl.call_sites {
            self.process_site(id, site);
        }
    }

    fn process_site(&mut self, caller: &str, site: &CallSite) {
        let index = self.index;
        match &site.target {
            CallTarget::Static(func) => match index.resolve(func) {
                Some(callee) => self.edge(caller, callee, site.kind, site.position.clone()),
                None => self.out.calls.skipped.record(Skip::Dangling),
            },
            CallTarget::Interface { interface, method } => {
                let iface = match interface_of(index, interface.as_ref(), method) {
                    Ok(iface) => iface,
                    Err(skip) => {
                        self.out.calls.skipped.record(skip);
                        return;
                    }
                };
                let pending = PendingSite {
                    caller: caller.to_string(),
                    kind: site.kind,
                    site: site.position.clone(),
                };
                let callees: Vec<String> = index
                    .implementors(iface)
                    .filter(|form| self.out.live_types.contains(*form))
                    .filter_map(|form| index.method_of(form, method))
                    .map(|m| m.id.clone())
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect();
                self.pending_interface
                    .entry((iface.clone(), method.clone()))
                    .or_default()
                    .push(pending.clone());
                for callee in callees {
                    self.edge(&pending.caller, callee, pending.kind, pending.site.clone());
                }
            }
            CallTarget::Dynamic(sig) => {
                let pending = PendingSite {
                    caller: caller.to_string(),
                    kind: site.kind,
                    site: site.position.clone(),
                };
                let callees: Vec<String> = index
                    .functions_with_signature(sig)
                    .filter(|id| self.out.address_taken.contains(*id))
                    .cloned()
                    .collect();
                self.pending_dynamic.entry(sig.clone()).or_default().push(pending.clone());
                for callee in callees {
                    self.edge(&pending.caller, callee, pending.kind, pending.site.clone());
                }
            }
        }
    }

    /// A type form became live: resolve the pending interface calls it can serve.
    fn make_live(&mut self, form: TypeForm) {
        if !self.out.live_types.insert(form.clone()) {
            return;
        }
        let index = self.index;
        let mut hits: Vec<(PendingSite, String)> = Vec::new();
        for iface in index.satisfied_by(&form) {
            let start = (iface.clone(), String::new());
            for ((pending_iface, method), sites) in self.pending_interface.range(start..) {
                if pending_iface != iface {
                    break;
                }
                if let Some(m) = index.method_of(&form, method) {
                    hits.extend(sites.iter().map(|s| (s.clone(), m.id.clone())));
                }
            }
        }
        for (pending, callee) in hits {
            self.edge(&pending.caller, callee, pending.kind, pending.site);
        }
    }

    /// A function value escaped: resolve pending dynamic calls of its signature.
    fn take_address(&mut self, id: String) {
        if !self.out.address_taken.insert(id.clone()) {
            return;
        }
        let Some(entry) = self.index.function(&id) else {
            return;
        };
        let sites: Vec<PendingSite> = self
            .pending_dynamic
            .get(&entry.signature)
            .cloned()
            .unwrap_or_default();
        for pending in sites {
            self.edge(&pending.caller, id.clone(), pending.kind, pending.site);
        }
    }
}
