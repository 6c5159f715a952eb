//! Verified installer runner allowlist.
//!
//! Upstream installer scripts are piped into an interpreter. Only the shells
//! listed here may be used, regardless of what the structural validator
//! accepted.

use super::{ErrorContext, ErrorKind, ValidationError};
use crate::model::Manifest;

/// Interpreters a verified installer may be piped into.
pub const ALLOWED_RUNNERS: &[&str] = &["bash", "sh"];

/// Report every verified installer whose runner is outside [`ALLOWED_RUNNERS`].
#[must_use]
pub fn validate_verified_installer_runner(manifest: &Manifest) -> Vec<ValidationError> {
    manifest
        .modules()
        .filter_map(|module| {
            let installer = module.verified_installer.as_ref()?;
            if ALLOWED_RUNNERS.contains(&installer.runner.as_str()) {
                return None;
            }
            Some(ValidationError {
                kind: ErrorKind::InvalidVerifiedInstallerRunner,
                message: format!(
                    "module '{}' runs verified installer for '{}' with disallowed runner '{}'",
                    module.id, installer.tool, installer.runner
                ),
                module_id: module.id.clone(),
                context: ErrorContext::Runner {
                    runner: installer.runner.clone(),
                    allowed_runners: ALLOWED_RUNNERS.to_vec(),
                },
            })
        })
        .collect()
}
