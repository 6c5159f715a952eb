//! Dependency graph checks.
//!
//! The graph is implicit: each module lists dependency ids, and ids resolve
//! through the manifest's ordered map. Nothing here mutates the manifest.

use super::{ErrorContext, ErrorKind, ValidationError};
use crate::model::Manifest;
use crate::module_id::ModuleId;
use log::trace;
use std::collections::HashSet;

/// Report every dependency id that does not name a declared module.
///
/// One error is produced per dangling reference, attributed to the module
/// that declares it.
#[must_use]
pub fn validate_dependency_existence(manifest: &Manifest) -> Vec<ValidationError> {
    let known: Vec<ModuleId> = manifest.ids().cloned().collect();
    let mut errors = Vec::new();

    for module in manifest.modules() {
        for dep in module.dependencies.iter().filter(|d| !manifest.contains(d.as_str())) {
            let suggestion = suggest(dep, &known);
            let mut message = format!(
                "module '{}' depends on unknown module '{dep}'",
                module.id
            );
            if let Some(candidate) = &suggestion {
                message.push_str(&format!(" (did you mean '{candidate}'?)"));
            }
            errors.push(ValidationError {
                kind: ErrorKind::MissingDependency,
                message,
                module_id: module.id.clone(),
                context: ErrorContext::MissingDependency {
                    missing_dependency: dep.to_string(),
                    known_modules: known.clone(),
                    suggestion,
                },
            });
        }
    }
    errors
}

/// Pick a known id that plausibly matches a dangling reference.
///
/// Prefers an id with the same final segment (`tools.bun` for `lang.bun`),
/// then one whose final segment contains the missing one's, then the first
/// module in the same category.
fn suggest(missing: &ModuleId, known: &[ModuleId]) -> Option<ModuleId> {
    let tail = |id: &str| id.rsplit('.').next().unwrap_or(id).to_owned();
    let wanted = tail(missing.as_str());
    known
        .iter()
        .find(|id| tail(id.as_str()) == wanted)
        .or_else(|| known.iter().find(|id| tail(id.as_str()).contains(&wanted)))
        .or_else(|| {
            missing
                .is_qualified()
                .then(|| known.iter().find(|id| id.category() == missing.category()))
                .flatten()
        })
        .cloned()
}

/// Find dependency cycles by depth-first search along the current path.
///
/// When the walk reaches a module already on the path, the slice of the path
/// from that module onwards is the cycle, reported in traversal order and
/// closed by repeating its first id. Each distinct cycle is reported once,
/// keyed by its sorted node set, however many entry points reach it.
/// Self-dependencies surface as two-element paths such as `[a, a]`.
///
/// Unknown dependency ids are skipped; run
/// [`validate_dependency_existence`] first.
#[must_use]
pub fn detect_dependency_cycles(manifest: &Manifest) -> Vec<ValidationError> {
    let mut walk = CycleWalk {
        manifest,
        finished: HashSet::new(),
        reported: HashSet::new(),
        errors: Vec::new(),
    };
    for module in manifest.modules() {
        let mut path = Vec::new();
        walk.visit(module.id.as_str(), &mut path);
    }
    walk.errors
}

struct CycleWalk<'a> {
    manifest: &'a Manifest,
    finished: HashSet<&'a str>,
    reported: HashSet<Vec<&'a str>>,
    errors: Vec<ValidationError>,
}

impl<'a> CycleWalk<'a> {
    fn visit(&mut self, id: &'a str, path: &mut Vec<&'a str>) {
        if let Some(start) = path.iter().position(|on_path| *on_path == id) {
            let members: Vec<&'a str> = path.iter().skip(start).copied().collect();
            self.report(&members);
            return;
        }
        if self.finished.contains(id) {
            return;
        }
        let Some(module) = self.manifest.get(id) else {
            return;
        };

        trace!("cycle walk enters {id} at depth {}", path.len());
        path.push(id);
        for dep in &module.dependencies {
            self.visit(dep.as_str(), path);
        }
        path.pop();
        self.finished.insert(id);
    }

    fn report(&mut self, members: &[&'a str]) {
        let mut key = members.to_vec();
        key.sort_unstable();
        key.dedup();
        if !self.reported.insert(key) {
            return;
        }

        let cycle_path: Vec<ModuleId> = members
            .iter()
            .chain(members.first())
            .filter_map(|id| self.manifest.get(id).map(|m| m.id.clone()))
            .collect();
        let Some(origin) = cycle_path.first().cloned() else {
            return;
        };
        let rendered: Vec<&str> = cycle_path.iter().map(ModuleId::as_str).collect();
        self.errors.push(ValidationError {
            kind: ErrorKind::DependencyCycle,
            message: format!("dependency cycle detected: {}", rendered.join(" -> ")),
            module_id: origin,
            context: ErrorContext::Cycle { cycle_path },
        });
    }
}

/// Flag edges whose dependency sits in a strictly later phase.
///
/// Equal phases are accepted. Edges to unknown modules are ignored.
#[must_use]
pub fn validate_phase_ordering(manifest: &Manifest) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for module in manifest.modules() {
        for dep in module.dependencies.iter().filter_map(|d| manifest.get(d.as_str())) {
            if dep.phase <= module.phase {
                continue;
            }
            errors.push(ValidationError {
                kind: ErrorKind::PhaseViolation,
                message: format!(
                    "module '{}' (phase {}) depends on '{}' (phase {}), which runs later",
                    module.id, module.phase, dep.id, dep.phase
                ),
                module_id: module.id.clone(),
                context: ErrorContext::Phase {
                    dependency: dep.id.clone(),
                    module_phase: module.phase.get(),
                    dependency_phase: dep.phase.get(),
                },
            });
        }
    }
    errors
}
