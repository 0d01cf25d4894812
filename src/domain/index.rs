use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};

use crate::domain::identity::CallableInfo;
use crate::domain::program::{EmbeddedField, FuncRef, FunctionDecl, InterfaceDecl, Program, Signature, TypeRef};

/// A concrete named type in value (`T`) or pointer (`*T`) form. The two
/// forms have different method sets, so dispatch is decided per form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeForm {
    pub type_ref: TypeRef,
    pub pointer: bool,
}

impl TypeForm {
    pub fn value(type_ref: TypeRef) -> Self {
        Self { type_ref, pointer: false }
    }

    pub fn pointer(type_ref: TypeRef) -> Self {
        Self { type_ref, pointer: true }
    }
}

impl fmt::Display for TypeForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.pointer {
            write!(f, "*{}", self.type_ref)
        } else {
            write!(f, "{}", self.type_ref)
        }
    }
}

/// A declared function or method plus the body facts the builders consume.
#[derive(Debug, Clone)]
pub struct FunctionEntry<'p> {
    pub info: CallableInfo,
    pub decl: &'p FunctionDecl,
    pub signature: Signature,
    // (package index, declaration index): first declaration wins on duplicates.
    ordinal: (usize, usize),
}

/// One method in the method set of a type form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodEntry {
    pub id: String,
    pub signature: Signature,
}

/// Input inconsistencies found while indexing. None of them is fatal.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IndexStats {
    pub duplicate_declarations: usize,
    pub dangling_embeds: usize,
}

/// Read-only view of a program prepared for call graph construction.
///
/// Holds the function table, the per-form method sets, the flattened
/// interface contracts and the precomputed Satisfies relation. Built in
/// parallel, then frozen into ordered maps so that every consumer iterates
/// it in the same order on every run.
pub struct ProgramIndex<'p> {
    program: &'p Program,
    functions: BTreeMap<String, FunctionEntry<'p>>,
    concrete_types: BTreeSet<TypeRef>,
    method_sets: BTreeMap<TypeForm, BTreeMap<String, MethodEntry>>,
    // Method name -> types declaring a method of that name.
    method_lookup: BTreeMap<String, BTreeSet<TypeRef>>,
    interfaces: BTreeMap<TypeRef, BTreeMap<String, Signature>>,
    satisfies: BTreeMap<TypeForm, BTreeSet<TypeRef>>,
    implementors: BTreeMap<TypeRef, BTreeSet<TypeForm>>,
    by_signature: BTreeMap<Signature, BTreeSet<String>>,
    stats: IndexStats,
}

impl<'p> ProgramIndex<'p> {
    /// Build the index from a program, processing packages in parallel.
    pub fn build(program: &'p Program) -> Self {
        let functions: DashMap<String, FunctionEntry<'p>> = DashMap::new();
        let raw_interfaces: DashMap<TypeRef, ((usize, usize), &'p InterfaceDecl)> = DashMap::new();
        let types: DashSet<TypeRef> = DashSet::new();
        let raw_embeds: DashMap<TypeRef, ((usize, usize), &'p [EmbeddedField])> = DashMap::new();
        let duplicates = AtomicUsize::new(0);

        program.packages.par_iter().enumerate().for_each(|(pkg_idx, pkg)| {
            for (ty_idx, ty) in pkg.types.iter().enumerate() {
                let key = TypeRef::new(&pkg.path, &ty.name);
                types.insert(key.clone());
                if ty.embeds.is_empty() {
                    continue;
                }
                let ordinal = (pkg_idx, ty_idx);
                match raw_embeds.entry(key) {
                    Entry::Occupied(mut slot) => {
                        if ordinal < slot.get().0 {
                            slot.insert((ordinal, ty.embeds.as_slice()));
                        }
                    }
                    Entry::Vacant(slot) => {
                        slot.insert((ordinal, ty.embeds.as_slice()));
                    }
                }
            }

            for (iface_idx, iface) in pkg.interfaces.iter().enumerate() {
                let key = TypeRef::new(&pkg.path, &iface.name);
                let ordinal = (pkg_idx, iface_idx);
                match raw_interfaces.entry(key) {
                    Entry::Occupied(mut slot) => {
                        duplicates.fetch_add(1, Ordering::Relaxed);
                        if ordinal < slot.get().0 {
                            slot.insert((ordinal, iface));
                        }
                    }
                    Entry::Vacant(slot) => {
                        slot.insert((ordinal, iface));
                    }
                }
            }

            for (fn_idx, decl) in pkg.functions.iter().enumerate() {
                let info = CallableInfo::new(&pkg.path, &decl.name, decl.receiver.as_ref(), decl.position.clone());
                if let Some(recv) = &info.receiver {
                    // A receiver implies its type exists even if the front end
                    // did not list it.
                    types.insert(TypeRef::new(&pkg.path, &recv.type_name));
                }
                let entry = FunctionEntry {
                    info,
                    decl,
                    signature: decl.signature(),
                    ordinal: (pkg_idx, fn_idx),
                };
                match functions.entry(entry.info.id.clone()) {
                    Entry::Occupied(mut slot) => {
                        duplicates.fetch_add(1, Ordering::Relaxed);
                        if entry.ordinal < slot.get().ordinal {
                            slot.insert(entry);
                        }
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(entry);
                    }
                }
            }
        });

        let functions: BTreeMap<String, FunctionEntry<'p>> = functions.into_iter().collect();
        let concrete_types: BTreeSet<TypeRef> = types
            .into_iter()
            .filter(|t| !raw_interfaces.contains_key(t))
            .collect();

        let embeds: BTreeMap<TypeRef, &'p [EmbeddedField]> =
            raw_embeds.into_iter().map(|(key, (_, fields))| (key, fields)).collect();
        let (method_sets, method_lookup) = Self::collect_method_sets(&functions, &concrete_types, &embeds);

        let dangling_embeds = AtomicUsize::new(0);
        // Embedded interfaces in structs are dynamic and promote nothing here.
        let dangling_fields = embeds
            .values()
            .flat_map(|fields| fields.iter())
            .map(EmbeddedField::type_ref)
            .filter(|t| !concrete_types.contains(t) && !raw_interfaces.contains_key(t))
            .count();
        dangling_embeds.fetch_add(dangling_fields, Ordering::Relaxed);
        let interfaces = Self::flatten_interfaces(&raw_interfaces, &dangling_embeds);

        let (satisfies, implementors) = Self::compute_satisfies(&method_sets, &interfaces);

        let mut by_signature: BTreeMap<Signature, BTreeSet<String>> = BTreeMap::new();
        for (id, entry) in &functions {
            by_signature
                .entry(entry.signature.clone())
                .or_default()
                .insert(id.clone());
        }

        let stats = IndexStats {
            duplicate_declarations: duplicates.into_inner(),
            dangling_embeds: dangling_embeds.into_inner(),
        };
        if stats.duplicate_declarations > 0 {
            warn!(count = stats.duplicate_declarations, "duplicate declarations in program representation; keeping the first");
        }

        debug!(
            functions = functions.len(),
            types = concrete_types.len(),
            interfaces = interfaces.len(),
            satisfying_forms = satisfies.len(),
            "program index built"
        );

        Self {
            program,
            functions,
            concrete_types,
            method_sets,
            method_lookup,
            interfaces,
            satisfies,
            implementors,
            by_signature,
            stats,
        }
    }

    /// Method sets per type form: `T` gets value-receiver methods, `*T` gets
    /// all, and both pick up methods promoted through embedded fields.
    #[allow(clippy::type_complexity)]
    fn collect_method_sets(
        functions: &BTreeMap<String, FunctionEntry<'p>>,
        concrete_types: &BTreeSet<TypeRef>,
        embeds: &BTreeMap<TypeRef, &'p [EmbeddedField]>,
    ) -> (
        BTreeMap<TypeForm, BTreeMap<String, MethodEntry>>,
        BTreeMap<String, BTreeSet<TypeRef>>,
    ) {
        let mut declared: BTreeMap<TypeForm, BTreeMap<String, MethodEntry>> = BTreeMap::new();

        for ty in concrete_types {
            declared.entry(TypeForm::value(ty.clone())).or_default();
            declared.entry(TypeForm::pointer(ty.clone())).or_default();
        }

        for entry in functions.values() {
            let Some(recv) = &entry.info.receiver else {
                continue;
            };
            let owner = TypeRef::new(&entry.info.package, &recv.type_name);
            if !concrete_types.contains(&owner) {
                continue;
            }
            let method = MethodEntry {
                id: entry.info.id.clone(),
                signature: entry.signature.clone(),
            };
            if !recv.pointer {
                declared
                    .entry(TypeForm::value(owner.clone()))
                    .or_default()
                    .insert(entry.info.name.clone(), method.clone());
            }
            declared
                .entry(TypeForm::pointer(owner))
                .or_default()
                .insert(entry.info.name.clone(), method);
        }

        let method_sets: BTreeMap<TypeForm, BTreeMap<String, MethodEntry>> = if embeds.is_empty() {
            declared
        } else {
            declared
                .keys()
                .map(|form| (form.clone(), Self::promote(form, &declared, embeds)))
                .collect()
        };

        let mut method_lookup: BTreeMap<String, BTreeSet<TypeRef>> = BTreeMap::new();
        for (form, methods) in &method_sets {
            for name in methods.keys() {
                method_lookup
                    .entry(name.clone())
                    .or_default()
                    .insert(form.type_ref.clone());
            }
        }

        (method_sets, method_lookup)
    }

    /// Method set of `form` including promoted methods, searched breadth-first
    /// by embedding depth. `T` sees the value set of an embedded `E` and the
    /// full set of an embedded `*E`; `*T` sees the full set of both. A method
    /// found at a shallower depth shadows deeper ones, and two candidates at
    /// the same depth cancel each other out.
    fn promote(
        form: &TypeForm,
        declared: &BTreeMap<TypeForm, BTreeMap<String, MethodEntry>>,
        embeds: &BTreeMap<TypeRef, &'p [EmbeddedField]>,
    ) -> BTreeMap<String, MethodEntry> {
        let mut methods = declared.get(form).cloned().unwrap_or_default();
        let mut decided: BTreeSet<String> = methods.keys().cloned().collect();
        let mut seen: BTreeSet<TypeForm> = BTreeSet::from([form.clone()]);
        let mut level = vec![form.clone()];

        while !level.is_empty() {
            let mut next = Vec::new();
            for outer in &level {
                let fields = embeds.get(&outer.type_ref).copied().unwrap_or_default();
                for field in fields {
                    let inner = TypeForm {
                        type_ref: field.type_ref(),
                        pointer: field.pointer || outer.pointer,
                    };
                    if declared.contains_key(&inner) && !seen.contains(&inner) {
                        next.push(inner);
                    }
                }
            }

            let mut found: BTreeMap<&String, Vec<&MethodEntry>> = BTreeMap::new();
            for inner in &next {
                let Some(inner_methods) = declared.get(inner) else {
                    continue;
                };
                for (name, method) in inner_methods {
                    if !decided.contains(name) {
                        found.entry(name).or_default().push(method);
                    }
                }
            }
            for (name, candidates) in found {
                if let [only] = candidates.as_slice() {
                    methods.insert(name.clone(), (*only).clone());
                }
                decided.insert(name.clone());
            }

            seen.extend(next.iter().cloned());
            level = next;
        }

        methods
    }

    fn flatten_interfaces(
        raw: &DashMap<TypeRef, ((usize, usize), &'p InterfaceDecl)>,
        dangling: &AtomicUsize,
    ) -> BTreeMap<TypeRef, BTreeMap<String, Signature>> {
        let keys: Vec<TypeRef> = raw.iter().map(|r| r.key().clone()).collect();
        let flattened: DashMap<TypeRef, BTreeMap<String, Signature>> = DashMap::new();

        keys.par_iter().for_each(|key| {
            let mut methods = BTreeMap::new();
            let mut visiting = HashSet::new();
            Self::flatten_into(raw, key, &mut methods, &mut visiting, dangling);
            flattened.insert(key.clone(), methods);
        });

        flattened.into_iter().collect()
    }

    fn flatten_into(
        raw: &DashMap<TypeRef, ((usize, usize), &'p InterfaceDecl)>,
        key: &TypeRef,
        methods: &mut BTreeMap<String, Signature>,
        visiting: &mut HashSet<TypeRef>,
        dangling: &AtomicUsize,
    ) {
        if !visiting.insert(key.clone()) {
            return;
        }
        // Copy the decl out so the shard lock is released before recursing.
        let Some(decl) = raw.get(key).map(|r| r.value().1) else {
            return;
        };
        for spec in &decl.methods {
            methods.insert(spec.name.clone(), spec.signature());
        }
        for embedded in &decl.embeds {
            if raw.contains_key(embedded) {
                Self::flatten_into(raw, embedded, methods, visiting, dangling);
            } else {
                dangling.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// The Satisfies relation and its inverse.
    #[allow(clippy::type_complexity)]
    fn compute_satisfies(
        method_sets: &BTreeMap<TypeForm, BTreeMap<String, MethodEntry>>,
        interfaces: &BTreeMap<TypeRef, BTreeMap<String, Signature>>,
    ) -> (
        BTreeMap<TypeForm, BTreeSet<TypeRef>>,
        BTreeMap<TypeRef, BTreeSet<TypeForm>>,
    ) {
        let relation: DashMap<TypeForm, BTreeSet<TypeRef>> = DashMap::new();

        method_sets.par_iter().for_each(|(form, methods)| {
            let satisfied: BTreeSet<TypeRef> = interfaces
                .iter()
                .filter(|(_, contract)| {
                    contract
                        .iter()
                        .all(|(name, sig)| methods.get(name).is_some_and(|m| &m.signature == sig))
                })
                .map(|(iface, _)| iface.clone())
                .collect();
            if !satisfied.is_empty() {
                relation.insert(form.clone(), satisfied);
            }
        });

        let satisfies: BTreeMap<TypeForm, BTreeSet<TypeRef>> = relation.into_iter().collect();
        let mut implementors: BTreeMap<TypeRef, BTreeSet<TypeForm>> = BTreeMap::new();
        for (form, ifaces) in &satisfies {
            for iface in ifaces {
                implementors.entry(iface.clone()).or_default().insert(form.clone());
            }
        }
        (satisfies, implementors)
    }

    pub fn program(&self) -> &'p Program {
        self.program
    }

    pub fn stats(&self) -> &IndexStats {
        &self.stats
    }

    /// All declared functions and methods, ordered by identity.
    pub fn functions(&self) -> impl Iterator<Item = &FunctionEntry<'p>> {
        self.functions.values()
    }

    pub fn function(&self, id: &str) -> Option<&FunctionEntry<'p>> {
        self.functions.get(id)
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    /// Classification for any identity a builder can emit.
    pub fn describe(&self, id: &str) -> CallableInfo {
        match self.functions.get(id) {
            Some(entry) => entry.info.clone(),
            None => CallableInfo::builtin(id),
        }
    }

    /// Resolve a static reference to an identity. Builtins always resolve;
    /// package-qualified references must be declared.
    pub fn resolve(&self, func: &FuncRef) -> Option<String> {
        let id = crate::domain::identity::func_ref_id(func);
        if func.package.is_empty() || self.functions.contains_key(&id) {
            Some(id)
        } else {
            None
        }
    }

    pub fn is_concrete(&self, ty: &TypeRef) -> bool {
        self.concrete_types.contains(ty)
    }

    /// Flattened method contract of an interface.
    pub fn interface_methods(&self, iface: &TypeRef) -> Option<&BTreeMap<String, Signature>> {
        self.interfaces.get(iface)
    }

    pub fn method_of(&self, form: &TypeForm, name: &str) -> Option<&MethodEntry> {
        self.method_sets.get(form).and_then(|set| set.get(name))
    }

    /// Types whose method set, declared or promoted, has a method named `name`.
    pub fn types_declaring<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a TypeRef> + 'a {
        self.method_lookup.get(name).into_iter().flatten()
    }

    /// Interfaces satisfied by a type form.
    pub fn satisfied_by<'a>(&'a self, form: &TypeForm) -> impl Iterator<Item = &'a TypeRef> + 'a {
        self.satisfies.get(form).into_iter().flatten()
    }

    pub fn satisfies(&self, form: &TypeForm, iface: &TypeRef) -> bool {
        self.satisfies.get(form).is_some_and(|set| set.contains(iface))
    }

    /// Type forms satisfying an interface.
    pub fn implementors<'a>(&'a self, iface: &TypeRef) -> impl Iterator<Item = &'a TypeForm> + 'a {
        self.implementors.get(iface).into_iter().flatten()
    }

    /// Declared functions and methods with exactly this signature.
    pub fn functions_with_signature<'a>(&'a self, sig: &Signature) -> impl Iterator<Item = &'a String> + 'a {
        self.by_signature.get(sig).into_iter().flatten()
    }
}
