//! Error types for the `modplan` CLI.
//!
//! Each variant maps to a process exit code: rejected manifests and failed
//! plans exit with [`EXIT_REJECTED`], while configuration, input, and output
//! problems exit with [`EXIT_USAGE`], matching clap's own usage errors.

use camino::Utf8PathBuf;
use modplan::ManifestError;
use modplan::config::ConfigError;
use modplan::document::DocumentError;
use modplan::plan::PlanError;
use modplan::report::{format_report, format_schema_errors};
use thiserror::Error;

/// Exit code for a manifest that failed validation or a plan that failed.
pub const EXIT_REJECTED: i32 = 1;

/// Exit code for configuration, input, or output problems.
pub const EXIT_USAGE: i32 = 2;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// The configuration file could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The manifest document could not be read or decoded.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// The manifest failed structural or semantic validation.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Planning rejected the selection.
    #[error(transparent)]
    Plan(#[from] PlanError),

    /// No manifest path was given and none is configured.
    #[error("no manifest given; pass a path or set `manifest` in {config}")]
    NoManifest {
        /// Configuration file that was consulted.
        config: Utf8PathBuf,
    },

    /// Writing output failed.
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),

    /// Serialising JSON output failed.
    #[error("failed to serialise JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Manifest(ManifestError::Document(_))
            | Self::Config(_)
            | Self::Document(_)
            | Self::NoManifest { .. }
            | Self::Output(_)
            | Self::Json(_) => EXIT_USAGE,
            Self::Manifest(_) | Self::Plan(_) => EXIT_REJECTED,
        }
    }

    /// Multi-line detail printed after the summary line, when there is any.
    #[must_use]
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::Manifest(ManifestError::Schema(errors)) => Some(format_schema_errors(errors)),
            Self::Manifest(ManifestError::Invalid(report)) => Some(format_report(report)),
            Self::Plan(err) => Some(
                err.problems()
                    .iter()
                    .map(|problem| format!("  - {problem}\n"))
                    .collect(),
            ),
            _ => None,
        }
    }
}

/// Convenience alias for CLI results.
pub type Result<T> = std::result::Result<T, CliError>;
