//! Semantic validation of typed manifests.
//!
//! Each check inspects one concern and returns every violation it finds as
//! data. [`validate_manifest`] sequences the checks so that graph analysis is
//! skipped once an earlier graph check has failed, while naming and security
//! checks always run.
//!
//! # Modules
//!
//! - [`deps`] - dependency existence, cycle detection, and phase ordering
//! - [`naming`] - generated entrypoint collisions and reserved names
//! - [`security`] - verified installer runner allowlist

pub mod deps;
pub mod naming;
pub mod security;

use crate::model::Manifest;
use crate::module_id::ModuleId;
use serde::Serialize;
use std::fmt;

pub use deps::{detect_dependency_cycles, validate_dependency_existence, validate_phase_ordering};
pub use naming::{RESERVED_FUNCTION_NAMES, validate_function_name_uniqueness, validate_reserved_names};
pub use security::{ALLOWED_RUNNERS, validate_verified_installer_runner};

/// Machine-readable category of a semantic violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// A dependency names a module that is not in the manifest.
    MissingDependency,
    /// The dependency graph contains a cycle.
    DependencyCycle,
    /// A module depends on a module in a later phase.
    PhaseViolation,
    /// Two modules derive the same generated entrypoint name.
    FunctionNameCollision,
    /// A module's entrypoint name is reserved for the orchestrator.
    ReservedNameCollision,
    /// A verified installer uses a runner outside the allowlist.
    InvalidVerifiedInstallerRunner,
}

impl ErrorKind {
    /// The stable code used in reports and JSON output.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::MissingDependency => "MISSING_DEPENDENCY",
            Self::DependencyCycle => "DEPENDENCY_CYCLE",
            Self::PhaseViolation => "PHASE_VIOLATION",
            Self::FunctionNameCollision => "FUNCTION_NAME_COLLISION",
            Self::ReservedNameCollision => "RESERVED_NAME_COLLISION",
            Self::InvalidVerifiedInstallerRunner => "INVALID_VERIFIED_INSTALLER_RUNNER",
        }
    }

    /// A short, actionable suggestion for fixing this kind of violation.
    #[must_use]
    pub const fn hint(self) -> &'static str {
        match self {
            Self::MissingDependency => {
                "Declare the missing module or remove it from the dependencies list."
            }
            Self::DependencyCycle => {
                "Break the cycle by removing one of the dependencies on the reported path."
            }
            Self::PhaseViolation => {
                "Move the dependency to an earlier phase or the dependent to a later one."
            }
            Self::FunctionNameCollision => {
                "Rename one of the modules so that their ids differ after replacing '.' with '_'."
            }
            Self::ReservedNameCollision => {
                "Qualify the id with a category (for example `tools.<name>`)."
            }
            Self::InvalidVerifiedInstallerRunner => {
                "Use one of the allowed runners: bash, sh."
            }
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Structured details attached to a violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum ErrorContext {
    /// Details for [`ErrorKind::MissingDependency`].
    MissingDependency {
        /// The id that could not be resolved.
        missing_dependency: String,
        /// Every id the manifest declares, in declaration order.
        known_modules: Vec<ModuleId>,
        /// Closest known id, when one is plausibly meant.
        #[serde(skip_serializing_if = "Option::is_none")]
        suggestion: Option<ModuleId>,
    },
    /// Details for [`ErrorKind::DependencyCycle`].
    Cycle {
        /// Ids in traversal order, closed by repeating the first id.
        cycle_path: Vec<ModuleId>,
    },
    /// Details for [`ErrorKind::PhaseViolation`].
    Phase {
        /// The dependency in the later phase.
        dependency: ModuleId,
        /// Phase of the dependent module.
        module_phase: u8,
        /// Phase of the dependency.
        dependency_phase: u8,
    },
    /// Details for [`ErrorKind::FunctionNameCollision`].
    Collision {
        /// The shared generated name.
        function_name: String,
        /// All modules deriving that name, in declaration order.
        colliding_modules: Vec<ModuleId>,
    },
    /// Details for [`ErrorKind::ReservedNameCollision`].
    Reserved {
        /// The reserved generated name.
        function_name: String,
    },
    /// Details for [`ErrorKind::InvalidVerifiedInstallerRunner`].
    Runner {
        /// Runner found in the manifest.
        runner: String,
        /// Runners that are accepted.
        allowed_runners: Vec<&'static str>,
    },
}

/// A single semantic violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// Machine-readable category.
    pub kind: ErrorKind,
    /// Human-readable description.
    pub message: String,
    /// The module the violation is attributed to.
    pub module_id: ModuleId,
    /// Structured details.
    pub context: ErrorContext,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

/// Outcome of [`validate_manifest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// `true` exactly when `errors` is empty.
    pub valid: bool,
    /// All violations found, grouped by check in execution order.
    pub errors: Vec<ValidationError>,
}

impl ValidationReport {
    /// Build a report from collected errors.
    #[must_use]
    pub fn from_errors(errors: Vec<ValidationError>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Errors of a single kind.
    #[must_use]
    pub fn of_kind(&self, kind: ErrorKind) -> impl Iterator<Item = &ValidationError> + '_ {
        self.errors.iter().filter(move |e| e.kind == kind)
    }
}

/// Run every semantic check in dependency-aware order.
///
/// Dependency existence runs first. Cycle detection runs only if no errors
/// have been collected so far, and phase ordering only if cycle detection
/// also came back clean. Function-name, reserved-name, and runner checks
/// always run.
///
/// # Examples
///
/// ```
/// use modplan::model::{Defaults, Manifest, ManifestHeader, Mode, Module};
/// use modplan::module_id::ModuleId;
/// use modplan::validate::{ErrorKind, validate_manifest};
///
/// let id = |s: &str| ModuleId::parse(s).expect("valid id");
/// let header = ManifestHeader {
///     version: 1,
///     name: "demo".to_owned(),
///     id: "demo".to_owned(),
///     defaults: Defaults::new("ubuntu", "/data/projects", Mode::Vibe),
/// };
/// let manifest = Manifest::new(header, [
///     Module::new(id("lang.bun"), "Bun").with_dependencies([id("base.system")]),
/// ]).expect("unique ids");
///
/// let report = validate_manifest(&manifest);
/// assert!(!report.valid);
/// assert_eq!(report.errors[0].kind, ErrorKind::MissingDependency);
/// ```
#[must_use]
pub fn validate_manifest(manifest: &Manifest) -> ValidationReport {
    let mut errors = validate_dependency_existence(manifest);
    if errors.is_empty() {
        errors.extend(detect_dependency_cycles(manifest));
    }
    if errors.is_empty() {
        errors.extend(validate_phase_ordering(manifest));
    }
    errors.extend(validate_function_name_uniqueness(manifest));
    errors.extend(validate_reserved_names(manifest));
    errors.extend(validate_verified_installer_runner(manifest));

    log::debug!(
        "semantic validation of {} module(s) found {} error(s)",
        manifest.len(),
        errors.len()
    );
    ValidationReport::from_errors(errors)
}
