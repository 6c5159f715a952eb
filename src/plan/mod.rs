//! Selection planning.
//!
//! Turns a validated manifest plus user directives into an ordered,
//! dependency-closed execution plan. Planning either succeeds completely or
//! returns a [`PlanError`]; no partial plan is ever produced.
//!
//! The steps are:
//!
//! 1. expand legacy flags into skip entries;
//! 2. validate every directive against the manifest;
//! 3. build the base selection from `only`, `only_phase`, or the defaults;
//! 4. close the selection over dependencies unless `no_deps` is set;
//! 5. remove skipped modules and check nothing left depends on them;
//! 6. order the survivors by phase and declaration order.

pub mod error;
pub mod legacy;
mod order;

use crate::model::{Manifest, Phase};
use crate::module_id::ModuleId;
use indexmap::IndexMap;
use log::{debug, warn};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::fmt;

pub use error::{Directive, DirectiveError, PlanError, SkipViolation};
pub use legacy::LegacyFlags;

/// User-supplied selection directives. All fields are optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Ids that must be included.
    pub only: Vec<String>,
    /// Ids that must be excluded.
    pub skip: Vec<String>,
    /// Phases the base selection is restricted to.
    pub only_phase: Vec<u8>,
    /// Disable dependency closure.
    pub no_deps: bool,
    /// Deprecated boolean skip switches.
    pub legacy: LegacyFlags,
}

/// Why a module ended up in the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SelectionReason {
    /// Named in `only`.
    Requested,
    /// Its phase matched `only_phase`.
    Phase,
    /// Enabled by default and no narrower directive was given.
    Default,
    /// Required by another selected module.
    Dependency {
        /// The first selected module found to require it.
        of: ModuleId,
    },
}

impl fmt::Display for SelectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requested => f.write_str("requested"),
            Self::Phase => f.write_str("phase filter"),
            Self::Default => f.write_str("enabled by default"),
            Self::Dependency { of } => write!(f, "dependency of {of}"),
        }
    }
}

/// One planned module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanEntry {
    /// Module id.
    pub id: ModuleId,
    /// Module phase.
    pub phase: Phase,
    /// Why the module was selected.
    #[serde(flatten)]
    pub reason: SelectionReason,
}

/// An ordered execution plan with a membership index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    #[serde(rename = "modules")]
    entries: Vec<PlanEntry>,
    #[serde(skip)]
    members: HashSet<ModuleId>,
    skipped: Vec<ModuleId>,
}

impl Plan {
    /// Planned modules in execution order.
    #[must_use]
    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    /// Planned module ids in execution order.
    #[must_use]
    pub fn ids(&self) -> impl ExactSizeIterator<Item = &ModuleId> + '_ {
        self.entries.iter().map(|entry| &entry.id)
    }

    /// Whether the module with `id` is part of the plan.
    #[must_use]
    pub fn should_run(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    /// Modules excluded by skip directives, in declaration order.
    #[must_use]
    pub fn skipped(&self) -> &[ModuleId] {
        &self.skipped
    }

    /// Number of planned modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is planned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Compute the execution plan for `selection` over `manifest`.
///
/// The manifest is expected to have passed semantic validation; planning
/// assumes an acyclic, phase-consistent graph.
///
/// # Errors
///
/// Returns [`PlanError::InvalidDirectives`] when a directive names an unknown
/// module or phase, or names a module in both `only` and `skip`. Returns
/// [`PlanError::SkipSafety`] when a selected module depends on a skipped one.
///
/// # Examples
///
/// ```
/// use modplan::model::{Defaults, Manifest, ManifestHeader, Mode, Module};
/// use modplan::module_id::ModuleId;
/// use modplan::plan::{Selection, plan_selection};
///
/// let id = |s: &str| ModuleId::parse(s).expect("valid id");
/// let header = ManifestHeader {
///     version: 1,
///     name: "demo".to_owned(),
///     id: "demo".to_owned(),
///     defaults: Defaults::new("ubuntu", "/data/projects", Mode::Vibe),
/// };
/// let manifest = Manifest::new(header, [
///     Module::new(id("base.system"), "Base"),
///     Module::new(id("lang.bun"), "Bun").with_phase(6).with_dependencies([id("base.system")]),
///     Module::new(id("agents.claude"), "Claude").with_phase(7).with_dependencies([id("lang.bun")]),
/// ]).expect("unique ids");
///
/// let selection = Selection { only: vec!["agents.claude".to_owned()], ..Selection::default() };
/// let plan = plan_selection(&manifest, &selection).expect("plan");
/// let ids: Vec<&str> = plan.ids().map(ModuleId::as_str).collect();
/// assert_eq!(ids, ["base.system", "lang.bun", "agents.claude"]);
/// assert!(plan.should_run("lang.bun"));
/// ```
pub fn plan_selection(manifest: &Manifest, selection: &Selection) -> Result<Plan, PlanError> {
    let legacy_skips = selection.legacy.expand(manifest);
    let skip_names: HashSet<&str> = selection
        .skip
        .iter()
        .map(String::as_str)
        .chain(legacy_skips.iter().map(ModuleId::as_str))
        .collect();

    check_directives(manifest, selection, &skip_names)?;

    let mut selected = base_selection(manifest, selection);
    debug!("base selection holds {} module(s)", selected.len());
    if selection.no_deps {
        debug!("dependency closure disabled");
    } else {
        close_over_dependencies(manifest, &mut selected);
        debug!("dependency closure holds {} module(s)", selected.len());
    }

    selected.retain(|id, _| !skip_names.contains(*id));
    check_skip_safety(manifest, &selected, &skip_names)?;

    let members: HashSet<&str> = selected.keys().copied().collect();
    let entries: Vec<PlanEntry> = order::execution_order(manifest, &members)
        .into_iter()
        .filter_map(|module| {
            let reason = selected.get(module.id.as_str())?.clone();
            Some(PlanEntry {
                id: module.id.clone(),
                phase: module.phase,
                reason,
            })
        })
        .collect();
    let skipped: Vec<ModuleId> = manifest
        .ids()
        .filter(|id| skip_names.contains(id.as_str()))
        .cloned()
        .collect();
    debug!(
        "planned {} module(s), {} skipped",
        entries.len(),
        skipped.len()
    );

    Ok(Plan {
        members: entries.iter().map(|entry| entry.id.clone()).collect(),
        entries,
        skipped,
    })
}

fn check_directives(
    manifest: &Manifest,
    selection: &Selection,
    skip_names: &HashSet<&str>,
) -> Result<(), PlanError> {
    let mut errors = Vec::new();

    let unknown = |directive: Directive, ids: &[String]| -> Vec<DirectiveError> {
        ids.iter()
            .filter(|id| !manifest.contains(id))
            .map(|id| DirectiveError::UnknownModule {
                directive,
                id: id.clone(),
            })
            .collect()
    };
    errors.extend(unknown(Directive::Only, &selection.only));
    errors.extend(unknown(Directive::Skip, &selection.skip));

    if !selection.only_phase.is_empty() {
        let in_use: BTreeSet<u8> = manifest.modules().map(|m| m.phase.get()).collect();
        let mut reported = BTreeSet::new();
        for &phase in &selection.only_phase {
            if !in_use.contains(&phase) && reported.insert(phase) {
                errors.push(DirectiveError::UnknownPhase {
                    phase,
                    available: in_use.iter().copied().collect(),
                });
            }
        }
    }

    errors.extend(
        manifest
            .ids()
            .filter(|id| is_requested(selection, id) && skip_names.contains(id.as_str()))
            .map(|id| DirectiveError::ConflictingDirective { id: id.clone() }),
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(PlanError::InvalidDirectives(errors))
    }
}

fn is_requested(selection: &Selection, id: &ModuleId) -> bool {
    selection.only.iter().any(|only| only == id.as_str())
}

fn base_selection<'a>(manifest: &'a Manifest, selection: &Selection) -> IndexMap<&'a str, SelectionReason> {
    if !selection.only.is_empty() {
        if !selection.only_phase.is_empty() {
            warn!("only_phase is ignored because explicit modules were requested");
        }
        return manifest
            .ids()
            .filter(|id| is_requested(selection, id))
            .map(|id| (id.as_str(), SelectionReason::Requested))
            .collect();
    }
    if !selection.only_phase.is_empty() {
        return manifest
            .modules()
            .filter(|module| selection.only_phase.contains(&module.phase.get()))
            .map(|module| (module.id.as_str(), SelectionReason::Phase))
            .collect();
    }
    manifest
        .modules()
        .filter(|module| module.enabled_by_default)
        .map(|module| (module.id.as_str(), SelectionReason::Default))
        .collect()
}

fn close_over_dependencies<'a>(manifest: &'a Manifest, selected: &mut IndexMap<&'a str, SelectionReason>) {
    let mut queue: VecDeque<&'a str> = selected.keys().copied().collect();
    while let Some(id) = queue.pop_front() {
        let Some(module) = manifest.get(id) else {
            continue;
        };
        for dep in &module.dependencies {
            if selected.contains_key(dep.as_str()) {
                continue;
            }
            selected.insert(
                dep.as_str(),
                SelectionReason::Dependency {
                    of: module.id.clone(),
                },
            );
            queue.push_back(dep.as_str());
        }
    }
}

fn check_skip_safety(
    manifest: &Manifest,
    selected: &IndexMap<&str, SelectionReason>,
    skip_names: &HashSet<&str>,
) -> Result<(), PlanError> {
    let mut violations = Vec::new();
    for module in manifest
        .modules()
        .filter(|module| selected.contains_key(module.id.as_str()))
    {
        for dep in &module.dependencies {
            if selected.contains_key(dep.as_str()) {
                continue;
            }
            if skip_names.contains(dep.as_str()) {
                violations.push(SkipViolation {
                    module: module.id.clone(),
                    dependency: dep.clone(),
                });
            } else {
                warn!(
                    "'{}' depends on '{}', which is not planned because dependency expansion is disabled",
                    module.id, dep
                );
            }
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(PlanError::SkipSafety(violations))
    }
}

/// Render a plan as deterministic, human-readable text.
///
/// Identical plans always render to identical bytes.
#[must_use]
pub fn render_plan(plan: &Plan) -> String {
    let mut out = String::new();
    if plan.is_empty() {
        out.push_str("No modules selected.\n");
    } else {
        let width = plan
            .ids()
            .map(|id| id.as_str().len())
            .max()
            .unwrap_or_default();
        out.push_str(&format!("Execution plan ({} modules):\n", plan.len()));
        for (index, entry) in plan.entries().iter().enumerate() {
            out.push_str(&format!(
                "{:>3}. [phase {:>2}] {:<width$}  {}\n",
                index + 1,
                entry.phase.get(),
                entry.id.as_str(),
                entry.reason,
            ));
        }
    }
    if !plan.skipped().is_empty() {
        let skipped: Vec<&str> = plan.skipped().iter().map(ModuleId::as_str).collect();
        out.push_str(&format!("Skipped: {}\n", skipped.join(", ")));
    }
    out
}

#[cfg(test)]
mod tests;
