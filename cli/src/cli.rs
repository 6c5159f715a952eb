//! CLI argument definitions for `modplan`.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the entrypoint so that parsing can be tested without spawning the
//! binary.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use modplan::model::Phase;
use modplan::plan::{LegacyFlags, Selection};

/// Validate installer manifests and plan module execution.
#[derive(Parser, Debug)]
#[command(name = "modplan")]
#[command(version, about)]
#[command(long_about = concat!(
    "Validate installer manifests and plan module execution.\n\n",
    "A manifest declares installable modules, their dependencies, and the ",
    "phase each runs in. `modplan validate` checks the manifest for missing ",
    "dependencies, cycles, phase violations, and name collisions. ",
    "`modplan plan` computes the ordered list of modules to run for a given ",
    "selection.\n\n",
    "Settings are read from modplan.toml in the working directory unless ",
    "--config points elsewhere. Command-line flags take precedence.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Validate a manifest:\n",
    "    $ modplan validate acfs.manifest.toml\n\n",
    "  Plan one module and everything it needs:\n",
    "    $ modplan plan --only agents.claude\n\n",
    "  Plan phase 1 only, skipping a module:\n",
    "    $ modplan plan --only-phase 1 --skip base.locale\n\n",
    "  Emit the plan as JSON:\n",
    "    $ modplan plan --json\n",
))]
pub struct Cli {
    /// Configuration file [default: modplan.toml].
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbosity")]
    pub quiet: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run structural and semantic validation and print a report.
    Validate(ValidateArgs),

    /// Compute the execution plan for a selection.
    Plan(PlanArgs),

    /// List the modules a manifest declares.
    List(ListArgs),

    /// Print the SHA-256 fingerprint of a manifest document.
    Digest(DigestArgs),
}

/// Arguments for the validate command.
#[derive(Parser, Debug, Clone, Default)]
pub struct ValidateArgs {
    /// Manifest document (.toml or .json).
    #[arg(value_name = "MANIFEST")]
    pub manifest: Option<Utf8PathBuf>,

    /// Output the report as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the plan command.
#[derive(Parser, Debug, Clone, Default)]
pub struct PlanArgs {
    /// Manifest document (.toml or .json).
    #[arg(value_name = "MANIFEST")]
    pub manifest: Option<Utf8PathBuf>,

    /// Plan only these modules and their dependencies (repeatable).
    #[arg(long, value_name = "ID", value_delimiter = ',')]
    pub only: Vec<String>,

    /// Exclude these modules (repeatable).
    #[arg(long, value_name = "ID", value_delimiter = ',')]
    pub skip: Vec<String>,

    /// Restrict the base selection to these phases (repeatable).
    #[arg(
        long = "only-phase",
        value_name = "N",
        value_delimiter = ',',
        value_parser = clap::value_parser!(u8).range(i64::from(Phase::MIN)..=i64::from(Phase::MAX))
    )]
    pub only_phase: Vec<u8>,

    /// Do not pull in dependencies of selected modules.
    #[arg(long)]
    pub no_deps: bool,

    /// Skip the PostgreSQL module (deprecated; use --skip db.postgres18).
    #[arg(long)]
    pub skip_postgres: bool,

    /// Skip the Vault module (deprecated; use --skip tools.vault).
    #[arg(long)]
    pub skip_vault: bool,

    /// Skip every cloud CLI module (deprecated; use --skip).
    #[arg(long)]
    pub skip_cloud: bool,

    /// Output the plan as JSON.
    #[arg(long)]
    pub json: bool,
}

impl PlanArgs {
    /// Build the planner's selection, appending `configured_skip` to the
    /// skip list.
    ///
    /// # Examples
    ///
    /// ```
    /// use modplan_cli::cli::PlanArgs;
    ///
    /// let args = PlanArgs {
    ///     skip: vec!["lang.bun".to_owned()],
    ///     skip_vault: true,
    ///     ..PlanArgs::default()
    /// };
    /// let selection = args.selection(&["cloud.vercel".to_owned()]);
    /// assert_eq!(selection.skip, ["lang.bun", "cloud.vercel"]);
    /// assert!(selection.legacy.skip_vault);
    /// ```
    #[must_use]
    pub fn selection(&self, configured_skip: &[String]) -> Selection {
        let mut skip = self.skip.clone();
        skip.extend(
            configured_skip
                .iter()
                .filter(|id| !self.skip.contains(id))
                .cloned(),
        );
        Selection {
            only: self.only.clone(),
            skip,
            only_phase: self.only_phase.clone(),
            no_deps: self.no_deps,
            legacy: LegacyFlags {
                skip_postgres: self.skip_postgres,
                skip_vault: self.skip_vault,
                skip_cloud: self.skip_cloud,
            },
        }
    }
}

/// Arguments for the list command.
#[derive(Parser, Debug, Clone, Default)]
pub struct ListArgs {
    /// Manifest document (.toml or .json).
    #[arg(value_name = "MANIFEST")]
    pub manifest: Option<Utf8PathBuf>,

    /// Output in JSON format for scripting.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the digest command.
#[derive(Parser, Debug, Clone, Default)]
pub struct DigestArgs {
    /// Manifest document (.toml or .json).
    #[arg(value_name = "MANIFEST")]
    pub manifest: Option<Utf8PathBuf>,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
