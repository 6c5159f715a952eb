//! In-process tests for command dispatch.

use super::*;
use clap::Parser;
use modplan::ManifestError;
use rstest::{fixture, rstest};
use std::fs;
use tempfile::TempDir;

const STACK: &str = r#"
version = 1
name = "Demo"
id = "demo.stack"

[defaults]
user = "ubuntu"
workspace_root = "/data/projects"
mode = "vibe"

[[modules]]
id = "base.system"
description = "Base packages"
install = ["apt-get install -y curl git"]
verify = ["command -v curl"]

[[modules]]
id = "lang.bun"
description = "Bun runtime"
phase = 6
dependencies = ["base.system"]
install = ["curl -fsSL https://bun.sh/install | bash"]
verify = ["bun --version"]

[[modules]]
id = "agents.claude"
description = "Claude Code"
phase = 7
dependencies = ["lang.bun"]
install = ["bun install -g @anthropic-ai/claude-code"]
verify = ["claude --version"]
"#;

const CYCLIC: &str = r#"
version = 1
name = "Cyclic"
id = "demo.cyclic"

[defaults]
user = "ubuntu"
workspace_root = "/data/projects"
mode = "vibe"

[[modules]]
id = "a"
description = "A"
dependencies = ["b"]
install = ["true"]
verify = ["true"]

[[modules]]
id = "b"
description = "B"
dependencies = ["a"]
install = ["true"]
verify = ["true"]
"#;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn path(&self, name: &str) -> String {
        self.dir.path().join(name).to_string_lossy().into_owned()
    }

    fn write(&self, name: &str, body: &str) -> String {
        let path = self.path(name);
        fs::write(&path, body).expect("write fixture");
        path
    }

    fn run(&self, args: &[&str]) -> (Result<Status>, String) {
        let config = self.path("modplan.toml");
        let mut argv = vec!["modplan", "-c", config.as_str()];
        argv.extend_from_slice(args);
        let cli = Cli::parse_from(argv);
        let mut stdout = Vec::new();
        let result = run(&cli, &mut stdout);
        (result, String::from_utf8(stdout).expect("stdout was not UTF-8"))
    }
}

#[fixture]
fn workspace() -> Workspace {
    Workspace {
        dir: TempDir::new().expect("temp dir"),
    }
}

#[rstest]
fn validate_reports_a_valid_manifest(workspace: Workspace) {
    let manifest = workspace.write("stack.toml", STACK);
    let (result, stdout) = workspace.run(&["validate", &manifest]);

    assert_eq!(result.expect("validate runs"), Status::Success);
    assert_eq!(stdout, "Manifest is valid: no errors found.\n");
}

#[rstest]
fn validate_rejects_a_cycle(workspace: Workspace) {
    let manifest = workspace.write("cyclic.toml", CYCLIC);
    let (result, stdout) = workspace.run(&["validate", &manifest]);

    assert_eq!(result.expect("validate runs"), Status::Rejected);
    assert!(stdout.contains("[DEPENDENCY_CYCLE] dependency cycle detected: a -> b -> a"));
    assert!(stdout.ends_with("Found 1 validation error.\n"));
}

#[rstest]
fn validate_reports_structural_errors(workspace: Workspace) {
    let manifest = workspace.write("broken.json", r#"{ "version": 1, "name": "x" }"#);
    let (result, stdout) = workspace.run(&["validate", &manifest]);

    assert_eq!(result.expect("validate runs"), Status::Rejected);
    assert!(stdout.contains("[SCHEMA] id: "));
    assert!(stdout.contains("[SCHEMA] modules: "));
}

#[rstest]
fn validate_json_serialises_the_report(workspace: Workspace) {
    let manifest = workspace.write("cyclic.toml", CYCLIC);
    let (_, stdout) = workspace.run(&["validate", &manifest, "--json"]);

    let json: serde_json::Value = serde_json::from_str(&stdout).expect("json output");
    assert_eq!(json["valid"], false);
    assert_eq!(json["errors"][0]["kind"], "DEPENDENCY_CYCLE");
}

#[rstest]
fn plan_prints_the_dependency_closure(workspace: Workspace) {
    let manifest = workspace.write("stack.toml", STACK);
    let (result, stdout) = workspace.run(&["plan", &manifest, "--only", "agents.claude"]);

    assert_eq!(result.expect("plan runs"), Status::Success);
    let ids: Vec<&str> = stdout
        .lines()
        .skip(1)
        .filter_map(|line| line.split_whitespace().nth(3))
        .collect();
    assert_eq!(ids, ["base.system", "lang.bun", "agents.claude"]);
}

#[rstest]
fn plan_output_is_byte_identical_across_runs(workspace: Workspace) {
    let manifest = workspace.write("stack.toml", STACK);
    let (_, first) = workspace.run(&["plan", &manifest]);
    let (_, second) = workspace.run(&["plan", &manifest]);
    assert_eq!(first, second);
}

#[rstest]
fn plan_rejects_unsafe_skips(workspace: Workspace) {
    let manifest = workspace.write("stack.toml", STACK);
    let (result, stdout) =
        workspace.run(&["plan", &manifest, "--only", "agents.claude", "--skip", "lang.bun"]);

    let err = result.expect_err("skip-safety violation");
    assert!(matches!(err, CliError::Plan(_)));
    assert_eq!(err.exit_code(), 1);
    assert!(stdout.is_empty());
}

#[rstest]
fn plan_refuses_an_invalid_manifest(workspace: Workspace) {
    let manifest = workspace.write("cyclic.toml", CYCLIC);
    let (result, _) = workspace.run(&["plan", &manifest]);

    let err = result.expect_err("invalid manifest");
    assert!(matches!(err, CliError::Manifest(ManifestError::Invalid(_))));
}

#[rstest]
fn configuration_supplies_manifest_format_and_skips(workspace: Workspace) {
    workspace.write("stack.toml", STACK);
    workspace.write(
        "modplan.toml",
        "manifest = \"stack.toml\"\nformat = \"json\"\n[selection]\nskip = [\"agents.claude\"]\n",
    );
    let (result, stdout) = workspace.run(&["plan"]);

    assert_eq!(result.expect("plan runs"), Status::Success);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("json output");
    assert_eq!(json["manifest"]["id"], "demo.stack");
    assert_eq!(json["skipped"], serde_json::json!(["agents.claude"]));
    assert_eq!(json["modules"].as_array().map(Vec::len), Some(2));
}

#[rstest]
fn missing_manifest_is_a_usage_error(workspace: Workspace) {
    let (result, _) = workspace.run(&["list"]);
    let err = result.expect_err("no manifest");
    assert!(matches!(err, CliError::NoManifest { .. }));
    assert_eq!(err.exit_code(), 2);
}

#[rstest]
fn unreadable_manifest_is_a_usage_error(workspace: Workspace) {
    let missing = workspace.path("absent.toml");
    let (result, _) = workspace.run(&["validate", &missing]);
    assert_eq!(result.expect_err("missing file").exit_code(), 2);
}

#[rstest]
fn list_prints_every_module(workspace: Workspace) {
    let manifest = workspace.write("stack.toml", STACK);
    let (result, stdout) = workspace.run(&["list", &manifest]);

    assert_eq!(result.expect("list runs"), Status::Success);
    assert!(stdout.starts_with("Demo (demo.stack), 3 modules:\n"));
    assert!(stdout.contains("agents.claude  <- lang.bun"));
}

#[rstest]
fn digest_prints_the_fingerprint_and_path(workspace: Workspace) {
    let manifest = workspace.write("stack.toml", STACK);
    let (result, stdout) = workspace.run(&["digest", &manifest]);

    assert_eq!(result.expect("digest runs"), Status::Success);
    let expected = modplan::document::fingerprint(STACK.as_bytes());
    assert_eq!(stdout, format!("{expected}  {manifest}\n"));
}
