//! One-shot manifest loading and its error type.
//!
//! [`load_manifest`] chains the three stages a caller normally needs: read
//! and decode the document, build the typed manifest, and run semantic
//! validation. Each stage's failure is kept intact so callers can render it
//! in full.

use crate::document::{DocumentError, read_document};
use crate::model::Manifest;
use crate::schema::{SchemaError, parse_manifest};
use crate::validate::{ValidationReport, validate_manifest};
use camino::{Utf8Path, Utf8PathBuf};
use serde_json::Value;

/// Errors that stop a manifest from being loaded.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// The document could not be read or decoded.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// The document does not describe a well-formed manifest.
    #[error("manifest failed structural validation with {} error(s)", .0.len())]
    Schema(Vec<SchemaError>),

    /// The manifest is well-formed but violates a semantic rule.
    #[error("manifest failed semantic validation with {} error(s)", .0.errors.len())]
    Invalid(ValidationReport),
}

/// Convenience alias for manifest loading results.
pub type Result<T> = std::result::Result<T, ManifestError>;

/// A manifest that passed every validation stage.
#[derive(Debug, Clone)]
pub struct LoadedManifest {
    /// Where the document was read from.
    pub path: Utf8PathBuf,
    /// SHA-256 fingerprint of the raw document.
    pub fingerprint: String,
    /// The validated manifest.
    pub manifest: Manifest,
}

/// Build and semantically validate a manifest from an untyped document.
///
/// # Errors
///
/// Returns [`ManifestError::Schema`] or [`ManifestError::Invalid`].
pub fn check_document(document: &Value) -> Result<Manifest> {
    let manifest = parse_manifest(document).map_err(ManifestError::Schema)?;
    let report = validate_manifest(&manifest);
    if report.valid {
        Ok(manifest)
    } else {
        Err(ManifestError::Invalid(report))
    }
}

/// Read, decode, and fully validate the manifest at `path`.
///
/// # Errors
///
/// Returns the first stage that failed, with all of that stage's problems.
pub fn load_manifest(path: &Utf8Path) -> Result<LoadedManifest> {
    let document = read_document(path)?;
    let manifest = check_document(&document.value)?;
    log::debug!("loaded {} module(s) from {path}", manifest.len());
    Ok(LoadedManifest {
        path: path.to_owned(),
        fingerprint: document.fingerprint(),
        manifest,
    })
}
