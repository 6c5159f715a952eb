//! Typed module and manifest model.
//!
//! Values in this module are constructed once, by the structural validator in
//! [`crate::schema`] or by tests, and never mutated afterwards. Modules are
//! held in an insertion-ordered map keyed by id so that declaration order is
//! preserved and dependency ids resolve without reference cycles.

use crate::module_id::ModuleId;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// A coarse ordering bucket in the inclusive range `1..=10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Phase(u8);

impl Phase {
    /// Lowest permitted phase.
    pub const MIN: u8 = 1;
    /// Highest permitted phase.
    pub const MAX: u8 = 10;

    /// Create a phase, returning `None` when `value` is out of range.
    ///
    /// # Examples
    ///
    /// ```
    /// use modplan::model::Phase;
    ///
    /// assert_eq!(Phase::new(6).map(Phase::get), Some(6));
    /// assert!(Phase::new(0).is_none());
    /// assert!(Phase::new(11).is_none());
    /// ```
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if value >= Self::MIN && value <= Self::MAX {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Return the raw phase number.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl Default for Phase {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The account a module's directives execute as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunAs {
    /// The configured target user (the default).
    #[default]
    TargetUser,
    /// The superuser.
    Root,
    /// Whoever invoked the installer.
    Current,
}

impl RunAs {
    /// Every accepted spelling, in documentation order.
    pub const VARIANTS: &'static [&'static str] = &["target_user", "root", "current"];

    /// Parse the manifest spelling of a run-as value.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "target_user" => Some(Self::TargetUser),
            "root" => Some(Self::Root),
            "current" => Some(Self::Current),
            _ => None,
        }
    }
}

/// Installation mode recorded in the manifest defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Passwordless, fast-path installation.
    Vibe,
    /// Conservative installation with confirmations.
    Safe,
}

impl Mode {
    /// Every accepted spelling.
    pub const VARIANTS: &'static [&'static str] = &["vibe", "safe"];

    /// Parse the manifest spelling of a mode.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "vibe" => Some(Self::Vibe),
            "safe" => Some(Self::Safe),
            _ => None,
        }
    }
}

/// Descriptor for an upstream installer fetched and run through a runner.
///
/// `runner` is kept as written so that the allowlist check in
/// [`crate::validate::security`] can report values outside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifiedInstaller {
    /// Name of the upstream tool whose installer is verified.
    pub tool: String,
    /// Interpreter the installer script is piped into.
    pub runner: String,
    /// Arguments passed to the runner after the script.
    pub args: Vec<String>,
}

/// A command that reports whether a module is already installed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledCheck {
    /// Account the check runs as.
    pub run_as: RunAs,
    /// Shell command; success means "already installed".
    pub command: String,
}

/// A unit of installable functionality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Module {
    /// Category-qualified identifier.
    pub id: ModuleId,
    /// Human-readable summary.
    pub description: String,
    /// Ids this module requires, in declaration order without repeats.
    pub dependencies: Vec<ModuleId>,
    /// Ordering bucket.
    pub phase: Phase,
    /// Directives that perform the installation.
    pub install: Vec<String>,
    /// Directives that confirm the installation worked.
    pub verify: Vec<String>,
    /// Account the directives run as.
    pub run_as: RunAs,
    /// Whether failure of this module is tolerated.
    pub optional: bool,
    /// Whether the module is selected when no directive says otherwise.
    pub enabled_by_default: bool,
    /// Whether installer code is generated for the module.
    pub generated: bool,
    /// Upstream installer descriptor, if the module uses one.
    pub verified_installer: Option<VerifiedInstaller>,
    /// Free-form labels.
    pub tags: Vec<String>,
    /// Free-form notes shown to operators.
    pub notes: Vec<String>,
    /// Alternative names accepted by front-ends.
    pub aliases: Vec<String>,
    /// Upstream documentation link.
    pub docs_url: Option<String>,
    /// Idempotency probe.
    pub installed_check: Option<InstalledCheck>,
}

impl Module {
    /// Create a module with default settings.
    ///
    /// Install and verify directives start empty. Intended for programmatic
    /// construction; documents go through
    /// [`crate::schema::parse_manifest`].
    ///
    /// # Examples
    ///
    /// ```
    /// use modplan::model::Module;
    /// use modplan::module_id::ModuleId;
    ///
    /// let id = ModuleId::parse("lang.bun").expect("valid id");
    /// let module = Module::new(id, "Bun runtime").with_phase(6);
    /// assert_eq!(module.phase.get(), 6);
    /// assert!(module.enabled_by_default);
    /// ```
    #[must_use]
    pub fn new(id: ModuleId, description: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
            dependencies: Vec::new(),
            phase: Phase::default(),
            install: Vec::new(),
            verify: Vec::new(),
            run_as: RunAs::default(),
            optional: false,
            enabled_by_default: true,
            generated: true,
            verified_installer: None,
            tags: Vec::new(),
            notes: Vec::new(),
            aliases: Vec::new(),
            docs_url: None,
            installed_check: None,
        }
    }

    /// Set the phase, clamping out-of-range values into `1..=10`.
    #[must_use]
    pub fn with_phase(mut self, phase: u8) -> Self {
        self.phase = Phase(phase.clamp(Phase::MIN, Phase::MAX));
        self
    }

    /// Append install directives in order.
    #[must_use]
    pub fn with_install<I, S>(mut self, directives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.install.extend(directives.into_iter().map(Into::into));
        self
    }

    /// Append verify directives in order.
    #[must_use]
    pub fn with_verify<I, S>(mut self, directives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.verify.extend(directives.into_iter().map(Into::into));
        self
    }

    /// Append dependencies in order.
    #[must_use]
    pub fn with_dependencies<I>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = ModuleId>,
    {
        self.dependencies.extend(deps);
        self
    }

    /// Set whether the module is part of the default selection.
    #[must_use]
    pub fn with_enabled_by_default(mut self, enabled: bool) -> Self {
        self.enabled_by_default = enabled;
        self
    }

    /// Attach a verified installer descriptor.
    #[must_use]
    pub fn with_verified_installer(mut self, installer: VerifiedInstaller) -> Self {
        self.verified_installer = Some(installer);
        self
    }

    /// The module's category (first id segment).
    #[must_use]
    pub fn category(&self) -> &str {
        self.id.category()
    }
}

/// Global defaults applied to every module at execution time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Defaults {
    /// Account that owns the installed environment.
    pub user: String,
    /// Root directory for user projects.
    pub workspace_root: String,
    /// Installation mode.
    pub mode: Mode,
}

impl Defaults {
    /// Build defaults from their three required fields.
    #[must_use]
    pub fn new(user: impl Into<String>, workspace_root: impl Into<String>, mode: Mode) -> Self {
        Self {
            user: user.into(),
            workspace_root: workspace_root.into(),
            mode,
        }
    }
}

/// Header fields describing the manifest itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestHeader {
    /// Schema version, a positive integer.
    pub version: u32,
    /// Display name.
    pub name: String,
    /// Lowercase dotted identifier.
    pub id: String,
    /// Global defaults.
    pub defaults: Defaults,
}

/// Error returned when building a manifest from a module list with repeats.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("module {0} is declared more than once")]
pub struct DuplicateModule(pub ModuleId);

/// The ordered collection of modules plus global defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Manifest {
    #[serde(flatten)]
    header: ManifestHeader,
    #[serde(serialize_with = "serialize_modules")]
    modules: IndexMap<ModuleId, Module>,
}

impl Manifest {
    /// Assemble a manifest, preserving module declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicateModule`] naming the first repeated id.
    pub fn new<I>(header: ManifestHeader, modules: I) -> Result<Self, DuplicateModule>
    where
        I: IntoIterator<Item = Module>,
    {
        let mut map = IndexMap::new();
        for module in modules {
            if map.contains_key(&module.id) {
                return Err(DuplicateModule(module.id));
            }
            map.insert(module.id.clone(), module);
        }
        Ok(Self {
            header,
            modules: map,
        })
    }

    /// Manifest header.
    #[must_use]
    pub fn header(&self) -> &ManifestHeader {
        &self.header
    }

    /// Look up a module by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Module> {
        self.modules.get(id)
    }

    /// Whether a module with `id` exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.modules.contains_key(id)
    }

    /// Declaration index of a module, used as the ordering tiebreak.
    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.modules.get_index_of(id)
    }

    /// Iterate modules in declaration order.
    #[must_use]
    pub fn modules(&self) -> impl ExactSizeIterator<Item = &Module> + '_ {
        self.modules.values()
    }

    /// Iterate module ids in declaration order.
    #[must_use]
    pub fn ids(&self) -> impl ExactSizeIterator<Item = &ModuleId> + '_ {
        self.modules.keys()
    }

    /// Number of modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether the manifest has no modules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

fn serialize_modules<S>(modules: &IndexMap<ModuleId, Module>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_seq(modules.values())
}

/// Build a test manifest from `(id, phase, deps)` triples.
///
/// Invalid ids panic.
#[cfg(test)]
pub(crate) fn manifest_of(specs: &[(&str, u8, &[&str])]) -> Manifest {
    let modules = specs.iter().map(|(id, phase, deps)| {
        Module::new(ModuleId::parse(id).expect("valid test id"), format!("{id} module"))
            .with_phase(*phase)
            .with_dependencies(deps.iter().map(|d| ModuleId::parse(d).expect("valid dep id")))
    });
    Manifest::new(test_header(), modules).expect("unique test ids")
}

#[cfg(test)]
pub(crate) fn test_header() -> ManifestHeader {
    ManifestHeader {
        version: 1,
        name: "Test".to_owned(),
        id: "test.manifest".to_owned(),
        defaults: Defaults::new("ubuntu", "/data/projects", Mode::Vibe),
    }
}
