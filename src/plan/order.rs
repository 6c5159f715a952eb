//! Deterministic execution ordering.
//!
//! Modules are ordered by ascending phase, then by manifest declaration
//! order, with one refinement: a module is never emitted before a selected
//! dependency. Within a phase this is a stable topological sort, so a
//! manifest that declares a dependency after its dependent still yields a
//! runnable order, while correctly authored manifests keep declaration
//! order untouched.

use crate::model::{Manifest, Module};
use log::warn;
use std::collections::HashSet;

/// Order `selected` modules for execution.
///
/// Dependencies outside `selected` are ignored. The result depends only on
/// the manifest and the selected ids, never on hash iteration order.
pub(crate) fn execution_order<'a>(manifest: &'a Manifest, selected: &HashSet<&str>) -> Vec<&'a Module> {
    let mut pending: Vec<&'a Module> = manifest
        .modules()
        .filter(|module| selected.contains(module.id.as_str()))
        .collect();
    pending.sort_by_key(|module| module.phase);

    let mut emitted: HashSet<&str> = HashSet::with_capacity(pending.len());
    let mut ordered = Vec::with_capacity(pending.len());
    while !pending.is_empty() {
        let ready = pending.iter().position(|module| {
            module
                .dependencies
                .iter()
                .filter(|dep| selected.contains(dep.as_str()))
                .all(|dep| emitted.contains(dep.as_str()))
        });
        let Some(index) = ready else {
            // Only reachable for cyclic input, which validation rejects.
            warn!(
                "{} module(s) form a dependency cycle; appending in declaration order",
                pending.len()
            );
            ordered.append(&mut pending);
            break;
        };
        let module = pending.remove(index);
        emitted.insert(module.id.as_str());
        ordered.push(module);
    }
    ordered
}
