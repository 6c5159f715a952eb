//! Unit tests for selection planning.

use super::*;
use crate::model::{Manifest, Module, manifest_of, test_header};
use rstest::{fixture, rstest};

#[fixture]
fn stack() -> Manifest {
    manifest_of(&[
        ("base.system", 1, &[]),
        ("lang.bun", 6, &["base.system"]),
        ("agents.claude", 7, &["lang.bun"]),
    ])
}

#[fixture]
fn chain() -> Manifest {
    manifest_of(&[("z", 1, &[]), ("y", 2, &["z"]), ("x", 3, &["y"]), ("w", 3, &[])])
}

fn only(ids: &[&str]) -> Selection {
    Selection {
        only: ids.iter().map(|id| (*id).to_owned()).collect(),
        ..Selection::default()
    }
}

fn planned(plan: &Plan) -> Vec<&str> {
    plan.ids().map(ModuleId::as_str).collect()
}

#[rstest]
fn only_pulls_in_transitive_dependencies(stack: Manifest) {
    let plan = plan_selection(&stack, &only(&["agents.claude"])).expect("plan");
    assert_eq!(planned(&plan), ["base.system", "lang.bun", "agents.claude"]);
    assert_eq!(
        plan.entries()[0].reason,
        SelectionReason::Dependency {
            of: ModuleId::parse("lang.bun").expect("valid"),
        }
    );
    assert_eq!(plan.entries()[2].reason, SelectionReason::Requested);
}

#[rstest]
fn only_phase_restricts_the_base_selection(stack: Manifest) {
    let selection = Selection {
        only_phase: vec![1],
        ..Selection::default()
    };
    let plan = plan_selection(&stack, &selection).expect("plan");
    assert_eq!(planned(&plan), ["base.system"]);
    assert_eq!(plan.entries()[0].reason, SelectionReason::Phase);
}

#[rstest]
fn dependency_closure_orders_deepest_first(chain: Manifest) {
    let plan = plan_selection(&chain, &only(&["x"])).expect("plan");
    assert_eq!(planned(&plan), ["z", "y", "x"]);
    assert!(!plan.should_run("w"));
}

#[rstest]
fn no_deps_plans_only_the_request(chain: Manifest) {
    let selection = Selection {
        no_deps: true,
        ..only(&["x"])
    };
    let plan = plan_selection(&chain, &selection).expect("plan");
    assert_eq!(planned(&plan), ["x"]);
    assert!(plan.should_run("x"));
    assert!(!plan.should_run("y"));
}

#[rstest]
fn skipping_a_required_dependency_fails(chain: Manifest) {
    let selection = Selection {
        skip: vec!["y".to_owned()],
        ..only(&["x"])
    };
    let err = plan_selection(&chain, &selection).expect_err("skip-safety violation");
    let PlanError::SkipSafety(violations) = err else {
        panic!("unexpected error {err:?}");
    };
    assert_eq!(
        violations,
        [SkipViolation {
            module: ModuleId::parse("x").expect("valid"),
            dependency: ModuleId::parse("y").expect("valid"),
        }]
    );
}

#[rstest]
fn skipping_an_unneeded_module_succeeds(chain: Manifest) {
    let selection = Selection {
        skip: vec!["w".to_owned()],
        ..Selection::default()
    };
    let plan = plan_selection(&chain, &selection).expect("plan");
    assert_eq!(planned(&plan), ["z", "y", "x"]);
    assert!(!plan.should_run("w"));
    let skipped: Vec<&str> = plan.skipped().iter().map(ModuleId::as_str).collect();
    assert_eq!(skipped, ["w"]);
}

#[rstest]
fn default_selection_honours_enabled_by_default() {
    let id = |s: &str| ModuleId::parse(s).expect("valid");
    let manifest = Manifest::new(
        test_header(),
        [
            Module::new(id("base.system"), "base"),
            Module::new(id("tools.extra"), "extra").with_enabled_by_default(false),
            Module::new(id("tools.core"), "core")
                .with_phase(2)
                .with_dependencies([id("tools.hidden")]),
            Module::new(id("tools.hidden"), "hidden").with_enabled_by_default(false),
        ],
    )
    .expect("unique");

    let plan = plan_selection(&manifest, &Selection::default()).expect("plan");
    assert_eq!(planned(&plan), ["base.system", "tools.hidden", "tools.core"]);
    assert_eq!(plan.entries()[0].reason, SelectionReason::Default);
}

#[rstest]
#[case::unknown_only(only(&["ghost"]), "unknown module 'ghost' in only directive")]
#[case::unknown_skip(
    Selection { skip: vec!["ghost".to_owned()], ..Selection::default() },
    "unknown module 'ghost' in skip directive"
)]
#[case::unknown_phase(
    Selection { only_phase: vec![4], ..Selection::default() },
    "no module is in phase 4 (phases in use: 1, 2, 3)"
)]
#[case::conflict(
    Selection { skip: vec!["y".to_owned()], ..only(&["y"]) },
    "module 'y' is both requested and skipped"
)]
fn invalid_directives_are_rejected(chain: Manifest, #[case] selection: Selection, #[case] expected: &str) {
    let err = plan_selection(&chain, &selection).expect_err("invalid directive");
    assert!(matches!(err, PlanError::InvalidDirectives(_)), "got {err:?}");
    assert_eq!(err.problems(), [expected]);
}

#[rstest]
fn every_invalid_directive_is_reported(chain: Manifest) {
    let selection = Selection {
        only: vec!["ghost".to_owned(), "x".to_owned()],
        skip: vec!["x".to_owned(), "phantom".to_owned()],
        only_phase: vec![9, 9],
        ..Selection::default()
    };
    let err = plan_selection(&chain, &selection).expect_err("invalid directives");
    assert_eq!(err.problems().len(), 4);
}

#[rstest]
fn legacy_flags_are_subject_to_skip_safety() {
    let manifest = manifest_of(&[
        ("tools.vault", 5, &[]),
        ("agents.claude", 7, &["tools.vault"]),
    ]);
    let selection = Selection {
        legacy: LegacyFlags {
            skip_vault: true,
            ..LegacyFlags::default()
        },
        ..Selection::default()
    };
    let err = plan_selection(&manifest, &selection).expect_err("violation");
    assert!(matches!(err, PlanError::SkipSafety(_)));
}

#[rstest]
fn legacy_skip_conflicting_with_only_is_rejected() {
    let manifest = manifest_of(&[("db.postgres18", 4, &[])]);
    let selection = Selection {
        legacy: LegacyFlags {
            skip_postgres: true,
            ..LegacyFlags::default()
        },
        ..only(&["db.postgres18"])
    };
    let err = plan_selection(&manifest, &selection).expect_err("conflict");
    assert_eq!(err.problems(), ["module 'db.postgres18' is both requested and skipped"]);
}

#[rstest]
fn legacy_cloud_flag_skips_the_category() {
    let manifest = manifest_of(&[
        ("base.system", 1, &[]),
        ("cloud.vercel", 8, &["base.system"]),
        ("cloud.wrangler", 8, &[]),
    ]);
    let selection = Selection {
        legacy: LegacyFlags {
            skip_cloud: true,
            ..LegacyFlags::default()
        },
        ..Selection::default()
    };
    let plan = plan_selection(&manifest, &selection).expect("plan");
    assert_eq!(planned(&plan), ["base.system"]);
    assert_eq!(plan.skipped().len(), 2);
}

#[rstest]
fn planning_is_deterministic(chain: Manifest) {
    let selection = Selection {
        skip: vec!["w".to_owned()],
        ..only(&["x", "y"])
    };
    let first = plan_selection(&chain, &selection).expect("plan");
    let second = plan_selection(&chain, &selection).expect("plan");
    assert_eq!(first, second);
    assert_eq!(render_plan(&first), render_plan(&second));
}

#[rstest]
fn render_plan_lists_entries_and_skips(chain: Manifest) {
    let selection = Selection {
        skip: vec!["w".to_owned()],
        ..only(&["y"])
    };
    let plan = plan_selection(&chain, &selection).expect("plan");
    assert_eq!(
        render_plan(&plan),
        concat!(
            "Execution plan (2 modules):\n",
            "  1. [phase  1] z  dependency of y\n",
            "  2. [phase  2] y  requested\n",
            "Skipped: w\n",
        )
    );
}

#[rstest]
fn render_plan_handles_empty_plans() {
    let manifest = Manifest::new(
        test_header(),
        [Module::new(ModuleId::parse("a").expect("valid"), "a").with_enabled_by_default(false)],
    )
    .expect("unique");
    let plan = plan_selection(&manifest, &Selection::default()).expect("plan");
    assert!(plan.is_empty());
    assert_eq!(render_plan(&plan), "No modules selected.\n");
}

#[rstest]
fn plan_serialises_reasons_inline(stack: Manifest) {
    let plan = plan_selection(&stack, &only(&["lang.bun"])).expect("plan");
    let json = serde_json::to_value(&plan).expect("serialise");
    assert_eq!(
        json,
        serde_json::json!({
            "modules": [
                { "id": "base.system", "phase": 1, "reason": "dependency", "of": "lang.bun" },
                { "id": "lang.bun", "phase": 6, "reason": "requested" },
            ],
            "skipped": [],
        })
    );
}
