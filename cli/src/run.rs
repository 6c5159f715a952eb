//! Command dispatch.
//!
//! Every command writes its primary output to the supplied writer and returns
//! a [`Status`]. Failures that abort a command are returned as [`CliError`]
//! for the entrypoint to report on stderr.

use crate::cli::{Cli, Command, DigestArgs, ListArgs, PlanArgs, ValidateArgs};
use crate::error::{CliError, EXIT_REJECTED, Result};
use crate::output::{format_list_human, format_list_json, format_plan_human, format_plan_json};
use camino::{Utf8Path, Utf8PathBuf};
use modplan::config::{DEFAULT_CONFIG_FILE, ModplanConfig, OutputFormat};
use modplan::document::read_document;
use modplan::plan::plan_selection;
use modplan::report::{format_report, format_schema_errors, report_json};
use modplan::schema::{SchemaError, parse_manifest};
use modplan::validate::validate_manifest;
use modplan::{LoadedManifest, load_manifest};
use serde::Serialize;
use std::io::Write;

/// Outcome of a command that ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The command succeeded.
    Success,
    /// The command ran but the manifest was rejected.
    Rejected,
}

impl Status {
    /// Process exit code for this status.
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Rejected => EXIT_REJECTED,
        }
    }
}

/// Settings resolved from the configuration file.
struct Context {
    config_path: Utf8PathBuf,
    config: ModplanConfig,
}

impl Context {
    fn load(cli: &Cli) -> Result<Self> {
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_CONFIG_FILE));
        let config = ModplanConfig::load_from(&config_path)?;
        Ok(Self {
            config_path,
            config,
        })
    }

    /// Explicit path first, then the configured one relative to the
    /// configuration file.
    fn manifest_path(&self, explicit: Option<&Utf8Path>) -> Result<Utf8PathBuf> {
        if let Some(path) = explicit {
            return Ok(path.to_owned());
        }
        let configured = self
            .config
            .manifest
            .as_deref()
            .ok_or_else(|| CliError::NoManifest {
                config: self.config_path.clone(),
            })?;
        let base = self.config_path.parent().unwrap_or_else(|| Utf8Path::new(""));
        Ok(base.join(configured))
    }

    fn wants_json(&self, flag: bool) -> bool {
        flag || self.config.format == OutputFormat::Json
    }
}

/// Run the parsed command, writing its output to `stdout`.
///
/// # Errors
///
/// Returns [`CliError`] when configuration or input cannot be loaded, when a
/// plan is requested from a rejected manifest, or when planning fails.
pub fn run(cli: &Cli, stdout: &mut dyn Write) -> Result<Status> {
    let context = Context::load(cli)?;
    match &cli.command {
        Command::Validate(args) => run_validate(&context, args, stdout),
        Command::Plan(args) => run_plan(&context, args, stdout),
        Command::List(args) => run_list(&context, args, stdout),
        Command::Digest(args) => run_digest(&context, args, stdout),
    }
}

#[derive(Serialize)]
struct SchemaFailureJson<'a> {
    valid: bool,
    schema_errors: &'a [SchemaError],
}

fn run_validate(context: &Context, args: &ValidateArgs, stdout: &mut dyn Write) -> Result<Status> {
    let path = context.manifest_path(args.manifest.as_deref())?;
    let document = read_document(&path)?;
    let json = context.wants_json(args.json);

    let manifest = match parse_manifest(&document.value) {
        Ok(manifest) => manifest,
        Err(errors) => {
            let text = if json {
                serde_json::to_string_pretty(&SchemaFailureJson {
                    valid: false,
                    schema_errors: &errors,
                })?
            } else {
                format_schema_errors(&errors)
            };
            write_block(stdout, &text)?;
            return Ok(Status::Rejected);
        }
    };

    let report = validate_manifest(&manifest);
    let text = if json {
        report_json(&report)?
    } else {
        format_report(&report)
    };
    write_block(stdout, &text)?;
    Ok(if report.valid {
        Status::Success
    } else {
        Status::Rejected
    })
}

fn run_plan(context: &Context, args: &PlanArgs, stdout: &mut dyn Write) -> Result<Status> {
    let loaded = load(context, args.manifest.as_deref())?;
    let selection = args.selection(&context.config.selection.skip);
    let plan = plan_selection(&loaded.manifest, &selection)?;

    let text = if context.wants_json(args.json) {
        format_plan_json(&loaded, &plan)?
    } else {
        format_plan_human(&plan)
    };
    write_block(stdout, &text)?;
    Ok(Status::Success)
}

fn run_list(context: &Context, args: &ListArgs, stdout: &mut dyn Write) -> Result<Status> {
    let loaded = load(context, args.manifest.as_deref())?;
    let text = if context.wants_json(args.json) {
        format_list_json(&loaded)?
    } else {
        format_list_human(&loaded)
    };
    write_block(stdout, &text)?;
    Ok(Status::Success)
}

fn run_digest(context: &Context, args: &DigestArgs, stdout: &mut dyn Write) -> Result<Status> {
    let path = context.manifest_path(args.manifest.as_deref())?;
    let document = read_document(&path)?;
    writeln!(stdout, "{}  {path}", document.fingerprint())?;
    Ok(Status::Success)
}

fn load(context: &Context, explicit: Option<&Utf8Path>) -> Result<LoadedManifest> {
    let path = context.manifest_path(explicit)?;
    Ok(load_manifest(&path)?)
}

/// Write `text`, ensuring it ends with exactly one newline.
fn write_block(stdout: &mut dyn Write, text: &str) -> Result<()> {
    writeln!(stdout, "{}", text.trim_end_matches('\n'))?;
    Ok(())
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
