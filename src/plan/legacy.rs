//! Deprecated boolean skip flags.
//!
//! Older front-ends exposed `--skip-postgres`, `--skip-vault`, and
//! `--skip-cloud`. They expand into ordinary skip entries before directive
//! validation and carry no other meaning, so the skip-safety check applies
//! to them like any other skip.

use crate::model::Manifest;
use crate::module_id::ModuleId;
use log::warn;

/// What a legacy flag expands to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyTarget {
    /// A single module id.
    Module(&'static str),
    /// Every module whose id starts with this category.
    Category(&'static str),
}

/// Flag name and expansion for every supported legacy flag.
pub const LEGACY_FLAG_TARGETS: &[(&str, LegacyTarget)] = &[
    ("skip_postgres", LegacyTarget::Module("db.postgres18")),
    ("skip_vault", LegacyTarget::Module("tools.vault")),
    ("skip_cloud", LegacyTarget::Category("cloud")),
];

/// Deprecated skip switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LegacyFlags {
    /// Skip the PostgreSQL module.
    pub skip_postgres: bool,
    /// Skip the secrets backend module.
    pub skip_vault: bool,
    /// Skip every cloud CLI module.
    pub skip_cloud: bool,
}

impl LegacyFlags {
    /// Whether any legacy flag is set.
    #[must_use]
    pub const fn any(&self) -> bool {
        self.skip_postgres || self.skip_vault || self.skip_cloud
    }

    fn is_set(&self, flag: &str) -> bool {
        match flag {
            "skip_postgres" => self.skip_postgres,
            "skip_vault" => self.skip_vault,
            "skip_cloud" => self.skip_cloud,
            _ => false,
        }
    }

    /// Expand the set flags into module ids present in `manifest`.
    ///
    /// Ids are returned in manifest declaration order without repeats. A set
    /// flag that matches nothing in the manifest is logged and ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use modplan::plan::LegacyFlags;
    /// # use modplan::model::{Defaults, Manifest, ManifestHeader, Mode, Module};
    /// # use modplan::module_id::ModuleId;
    /// # let id = |s: &str| ModuleId::parse(s).expect("valid id");
    /// # let header = ManifestHeader {
    /// #     version: 1, name: "demo".to_owned(), id: "demo".to_owned(),
    /// #     defaults: Defaults::new("ubuntu", "/data/projects", Mode::Vibe),
    /// # };
    /// # let manifest = Manifest::new(header, [
    /// #     Module::new(id("cloud.wrangler"), "Wrangler"),
    /// #     Module::new(id("cloud.vercel"), "Vercel"),
    /// #     Module::new(id("lang.bun"), "Bun"),
    /// # ]).expect("unique ids");
    /// let flags = LegacyFlags { skip_cloud: true, ..LegacyFlags::default() };
    /// let skipped: Vec<String> = flags
    ///     .expand(&manifest)
    ///     .into_iter()
    ///     .map(ModuleId::into_inner)
    ///     .collect();
    /// assert_eq!(skipped, ["cloud.wrangler", "cloud.vercel"]);
    /// ```
    #[must_use]
    pub fn expand(&self, manifest: &Manifest) -> Vec<ModuleId> {
        let mut expanded: Vec<ModuleId> = Vec::new();
        for (flag, target) in LEGACY_FLAG_TARGETS.iter().filter(|(flag, _)| self.is_set(flag)) {
            let matches: Vec<&ModuleId> = manifest
                .ids()
                .filter(|id| target_matches(*target, id))
                .collect();
            if matches.is_empty() {
                warn!("legacy flag {flag} matches no module in this manifest; ignoring");
                continue;
            }
            for id in matches {
                if !expanded.contains(id) {
                    expanded.push(id.clone());
                }
            }
        }
        expanded.sort_by_key(|id| manifest.position(id.as_str()));
        expanded
    }
}

fn target_matches(target: LegacyTarget, id: &ModuleId) -> bool {
    match target {
        LegacyTarget::Module(name) => id.as_str() == name,
        LegacyTarget::Category(category) => id.is_qualified() && id.category() == category,
    }
}
