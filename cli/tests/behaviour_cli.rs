//! End-to-end behaviour tests for the `modplan` binary.
//!
//! Each scenario prepares a temporary workspace, runs the binary inside it,
//! and inspects the exit status and output streams.

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;
use std::fs;
use std::process::{Command, Output};
use tempfile::TempDir;

const REFERENCE: &str = r#"
version = 1
name = "Reference"
id = "behaviour.cli"

[defaults]
user = "ubuntu"
workspace_root = "/data/projects"
mode = "vibe"

[[modules]]
id = "base.system"
description = "Base packages"
install = ["apt-get install -y curl"]
verify = ["command -v curl"]

[[modules]]
id = "tools.vault"
description = "Vault"
phase = 5
install = ["apt-get install -y vault"]
verify = ["vault --version"]

[[modules]]
id = "lang.bun"
description = "Bun"
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
id = "behaviour.cyclic"

[defaults]
user = "ubuntu"
workspace_root = "/data/projects"
mode = "vibe"

[[modules]]
id = "shell.zsh"
description = "zsh"
phase = 3
dependencies = ["shell.omz"]
install = ["true"]
verify = ["true"]

[[modules]]
id = "shell.omz"
description = "oh-my-zsh"
phase = 3
dependencies = ["shell.zsh"]
install = ["true"]
verify = ["true"]
"#;

#[derive(Default)]
struct CliWorld {
    workspace: RefCell<Option<TempDir>>,
    output: RefCell<Option<Output>>,
}

#[fixture]
fn cli_world() -> CliWorld {
    CliWorld::default()
}

fn write_file(cli_world: &CliWorld, name: &str, body: &str) {
    let mut workspace = cli_world.workspace.borrow_mut();
    let dir = workspace.get_or_insert_with(|| TempDir::new().expect("failed to create temp dir"));
    fs::write(dir.path().join(name), body).expect("failed to write workspace file");
}

fn get_output(cli_world: &CliWorld) -> std::cell::Ref<'_, Output> {
    let output = cli_world.output.borrow();
    std::cell::Ref::map(output, |opt| opt.as_ref().expect("output not set"))
}

#[given("a workspace holding the reference manifest")]
fn given_reference_manifest(cli_world: &CliWorld) {
    write_file(cli_world, "manifest.toml", REFERENCE);
}

#[given("a workspace holding a cyclic manifest")]
fn given_cyclic_manifest(cli_world: &CliWorld) {
    write_file(cli_world, "manifest.toml", CYCLIC);
}

#[given("the workspace configuration skips {module}")]
fn given_configured_skip(cli_world: &CliWorld, module: String) {
    write_file(
        cli_world,
        "modplan.toml",
        &format!("manifest = \"manifest.toml\"\n\n[selection]\nskip = [\"{module}\"]\n"),
    );
}

#[when("modplan is run with {args}")]
fn when_run_with(cli_world: &CliWorld, args: String) {
    let workspace = cli_world.workspace.borrow();
    let dir = workspace.as_ref().expect("workspace not prepared");
    let output = Command::new(env!("CARGO_BIN_EXE_modplan"))
        .args(args.split_whitespace())
        .current_dir(dir.path())
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run modplan");
    cli_world.output.replace(Some(output));
}

#[then("the command exits with status {code:i32}")]
fn then_exit_status(cli_world: &CliWorld, code: i32) {
    let output = get_output(cli_world);
    assert_eq!(
        output.status.code(),
        Some(code),
        "stdout: {}, stderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

#[then("stdout contains {snippet}")]
fn then_stdout_contains(cli_world: &CliWorld, snippet: String) {
    let output = get_output(cli_world);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(snippet.as_str()), "unexpected stdout: {stdout}");
}

#[then("stderr contains {snippet}")]
fn then_stderr_contains(cli_world: &CliWorld, snippet: String) {
    let output = get_output(cli_world);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains(snippet.as_str()), "unexpected stderr: {stderr}");
}

#[then("stdout lists {order}")]
fn then_stdout_order(cli_world: &CliWorld, order: String) {
    let output = get_output(cli_world);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let positions: Vec<usize> = order
        .split(" before ")
        .map(|id| {
            stdout
                .find(id)
                .unwrap_or_else(|| panic!("'{id}' missing from stdout: {stdout}"))
        })
        .collect();
    assert!(
        positions.windows(2).all(|pair| pair[0] < pair[1]),
        "unexpected order in stdout: {stdout}"
    );
}

// Do not reorder scenarios in tests/features/cli.feature; bindings are
// index-based.
#[scenario(path = "tests/features/cli.feature", index = 0)]
fn scenario_validate_sound_manifest(cli_world: CliWorld) {
    let _ = cli_world;
}

#[scenario(path = "tests/features/cli.feature", index = 1)]
fn scenario_validate_cyclic_manifest(cli_world: CliWorld) {
    let _ = cli_world;
}

#[scenario(path = "tests/features/cli.feature", index = 2)]
fn scenario_plan_order(cli_world: CliWorld) {
    let _ = cli_world;
}

#[scenario(path = "tests/features/cli.feature", index = 3)]
fn scenario_unsafe_skip(cli_world: CliWorld) {
    let _ = cli_world;
}

#[scenario(path = "tests/features/cli.feature", index = 4)]
fn scenario_phase_out_of_range(cli_world: CliWorld) {
    let _ = cli_world;
}

#[scenario(path = "tests/features/cli.feature", index = 5)]
fn scenario_configured_skip(cli_world: CliWorld) {
    let _ = cli_world;
}
