//! Output formatting for plans and module listings.
//!
//! Text output reuses the library's deterministic renderers; JSON output
//! wraps them with the manifest identity and fingerprint so scripted callers
//! can tell which document a plan was computed from.

use modplan::LoadedManifest;
use modplan::model::Module;
use modplan::module_id::ModuleId;
use modplan::plan::{Plan, render_plan};
use serde::Serialize;

/// Manifest identity included in JSON output.
#[derive(Debug, Serialize)]
pub struct ManifestInfo<'a> {
    /// Manifest id.
    pub id: &'a str,
    /// Manifest display name.
    pub name: &'a str,
    /// Schema version.
    pub version: u32,
    /// SHA-256 fingerprint of the document.
    pub fingerprint: &'a str,
}

impl<'a> ManifestInfo<'a> {
    /// Describe a loaded manifest.
    #[must_use]
    pub fn new(loaded: &'a LoadedManifest) -> Self {
        let header = loaded.manifest.header();
        Self {
            id: &header.id,
            name: &header.name,
            version: header.version,
            fingerprint: &loaded.fingerprint,
        }
    }
}

/// JSON document emitted by `modplan plan --json`.
#[derive(Debug, Serialize)]
pub struct PlanJson<'a> {
    /// The manifest the plan was computed from.
    pub manifest: ManifestInfo<'a>,
    /// The plan itself.
    #[serde(flatten)]
    pub plan: &'a Plan,
}

/// One row of `modplan list --json`.
#[derive(Debug, Serialize)]
pub struct ModuleSummary<'a> {
    /// Module id.
    pub id: &'a ModuleId,
    /// Category (first id segment).
    pub category: &'a str,
    /// Phase number.
    pub phase: u8,
    /// Human-readable summary.
    pub description: &'a str,
    /// Direct dependencies.
    pub dependencies: &'a [ModuleId],
    /// Whether the module is selected by default.
    pub enabled_by_default: bool,
    /// Whether failures are tolerated.
    pub optional: bool,
}

impl<'a> From<&'a Module> for ModuleSummary<'a> {
    fn from(module: &'a Module) -> Self {
        Self {
            id: &module.id,
            category: module.category(),
            phase: module.phase.get(),
            description: &module.description,
            dependencies: &module.dependencies,
            enabled_by_default: module.enabled_by_default,
            optional: module.optional,
        }
    }
}

/// JSON document emitted by `modplan list --json`.
#[derive(Debug, Serialize)]
pub struct ModuleListJson<'a> {
    /// The listed manifest.
    pub manifest: ManifestInfo<'a>,
    /// Modules in declaration order.
    pub modules: Vec<ModuleSummary<'a>>,
}

/// Format a plan for human-readable output.
#[must_use]
pub fn format_plan_human(plan: &Plan) -> String {
    render_plan(plan)
}

/// Format a plan as pretty-printed JSON.
///
/// # Errors
///
/// Returns the serialiser's error.
pub fn format_plan_json(loaded: &LoadedManifest, plan: &Plan) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&PlanJson {
        manifest: ManifestInfo::new(loaded),
        plan,
    })
}

/// Format the module list for human-readable output.
///
/// Modules are listed in declaration order with phase, id, and direct
/// dependencies; modules outside the default selection are marked.
#[must_use]
pub fn format_list_human(loaded: &LoadedManifest) -> String {
    let manifest = &loaded.manifest;
    let width = manifest
        .ids()
        .map(|id| id.as_str().len())
        .max()
        .unwrap_or_default();

    let mut output = format!(
        "{} ({}), {} modules:\n",
        manifest.header().name,
        manifest.header().id,
        manifest.len()
    );
    for module in manifest.modules() {
        let marker = if module.enabled_by_default { ' ' } else { '-' };
        let deps = if module.dependencies.is_empty() {
            String::new()
        } else {
            let names: Vec<&str> = module.dependencies.iter().map(ModuleId::as_str).collect();
            format!("  <- {}", names.join(", "))
        };
        let line = format!(
            " {marker}[phase {:>2}] {:<width$}{deps}",
            module.phase.get(),
            module.id.as_str(),
        );
        output.push_str(line.trim_end());
        output.push('\n');
    }
    output
}

/// Format the module list as pretty-printed JSON.
///
/// # Errors
///
/// Returns the serialiser's error.
pub fn format_list_json(loaded: &LoadedManifest) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&ModuleListJson {
        manifest: ManifestInfo::new(loaded),
        modules: loaded.manifest.modules().map(ModuleSummary::from).collect(),
    })
}
