//! Generated entrypoint name checks.
//!
//! Every module becomes an installer entrypoint named
//! `install_<id with dots replaced by underscores>`. These checks make sure
//! that mapping is injective and stays clear of the orchestrator's own
//! entrypoints.

use super::{ErrorContext, ErrorKind, ValidationError};
use crate::model::Manifest;
use crate::module_id::ModuleId;
use indexmap::IndexMap;

/// Entrypoint names owned by the orchestrator and its shared helpers.
///
/// Covers the top-level `install_all`, one entrypoint per category, and a
/// handful of utility functions emitted into every generated script.
pub const RESERVED_FUNCTION_NAMES: &[&str] = &[
    "install_all",
    "install_base",
    "install_users",
    "install_filesystem",
    "install_shell",
    "install_cli",
    "install_network",
    "install_lang",
    "install_tools",
    "install_db",
    "install_cloud",
    "install_agents",
    "install_stack",
    "install_acfs",
    "install_main",
    "install_helpers",
    "install_common",
    "install_utils",
    "install_log",
];

/// Report modules whose generated names collide with an earlier module's.
///
/// The first module in declaration order keeps the name; each later module
/// in the group gets one error naming every colliding id.
#[must_use]
pub fn validate_function_name_uniqueness(manifest: &Manifest) -> Vec<ValidationError> {
    let mut groups: IndexMap<String, Vec<&ModuleId>> = IndexMap::new();
    for module in manifest.modules() {
        groups.entry(module.id.function_name()).or_default().push(&module.id);
    }

    let mut errors = Vec::new();
    for (function_name, ids) in groups.iter().filter(|(_, ids)| ids.len() > 1) {
        let colliding: Vec<ModuleId> = ids.iter().map(|id| (*id).clone()).collect();
        let listed: Vec<&str> = colliding.iter().map(ModuleId::as_str).collect();
        for id in ids.iter().skip(1) {
            errors.push(ValidationError {
                kind: ErrorKind::FunctionNameCollision,
                message: format!(
                    "module '{id}' generates function '{function_name}', which collides with: {}",
                    listed.join(", ")
                ),
                module_id: (*id).clone(),
                context: ErrorContext::Collision {
                    function_name: function_name.clone(),
                    colliding_modules: colliding.clone(),
                },
            });
        }
    }
    errors
}

/// Report single-segment ids whose generated name is reserved.
///
/// Category-qualified ids (`base.system`) never collide, even when their
/// category matches a reserved entrypoint.
#[must_use]
pub fn validate_reserved_names(manifest: &Manifest) -> Vec<ValidationError> {
    manifest
        .modules()
        .filter(|module| !module.id.is_qualified())
        .filter_map(|module| {
            let function_name = module.id.function_name();
            RESERVED_FUNCTION_NAMES
                .contains(&function_name.as_str())
                .then(|| ValidationError {
                    kind: ErrorKind::ReservedNameCollision,
                    message: format!(
                        "module '{}' generates reserved function name '{function_name}'",
                        module.id
                    ),
                    module_id: module.id.clone(),
                    context: ErrorContext::Reserved {
                        function_name: function_name.clone(),
                    },
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::manifest_of;
    use rstest::rstest;

    #[test]
    fn separator_variants_collide_once_on_the_later_module() {
        let manifest = manifest_of(&[("lang.bun", 6, &[]), ("lang_bun", 6, &[])]);
        let errors = validate_function_name_uniqueness(&manifest);

        let [error] = errors.as_slice() else {
            panic!("expected one collision, got {errors:?}");
        };
        assert_eq!(error.kind, ErrorKind::FunctionNameCollision);
        assert_eq!(error.module_id.as_str(), "lang_bun");
        match &error.context {
            ErrorContext::Collision {
                function_name,
                colliding_modules,
            } => {
                assert_eq!(function_name, "install_lang_bun");
                let ids: Vec<&str> = colliding_modules.iter().map(ModuleId::as_str).collect();
                assert_eq!(ids, ["lang.bun", "lang_bun"]);
            }
            other => panic!("unexpected context {other:?}"),
        }
    }

    #[test]
    fn three_way_collision_reports_each_later_module() {
        let manifest = manifest_of(&[
            ("a.b_c", 1, &[]),
            ("a_b.c", 1, &[]),
            ("a.b.c", 1, &[]),
        ]);
        let errors = validate_function_name_uniqueness(&manifest);

        let blamed: Vec<&str> = errors.iter().map(|e| e.module_id.as_str()).collect();
        assert_eq!(blamed, ["a_b.c", "a.b.c"]);
    }

    #[test]
    fn distinct_names_do_not_collide() {
        let manifest = manifest_of(&[("lang.bun", 1, &[]), ("lang.uv", 1, &[])]);
        assert!(validate_function_name_uniqueness(&manifest).is_empty());
    }

    #[rstest]
    #[case::orchestrator("all")]
    #[case::category("base")]
    #[case::network("network")]
    #[case::utility("helpers")]
    fn bare_reserved_word_is_flagged(#[case] id: &str) {
        let manifest = manifest_of(&[(id, 1, &[])]);
        let errors = validate_reserved_names(&manifest);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::ReservedNameCollision);
    }

    #[rstest]
    #[case::qualified_base("base.system")]
    #[case::qualified_all("tools.all")]
    #[case::unreserved_bare("ripgrep")]
    fn other_ids_are_not_reserved(#[case] id: &str) {
        let manifest = manifest_of(&[(id, 1, &[])]);
        assert!(validate_reserved_names(&manifest).is_empty());
    }
}
