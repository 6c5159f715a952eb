//! Manifest document loading.
//!
//! Reads a manifest file from disk, decodes it according to its extension,
//! and yields an untyped [`serde_json::Value`] tree for the structural
//! validator. TOML and JSON are accepted; both decode into the same tree so
//! the validator never needs to know which syntax was used.

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;

/// Errors arising while reading or decoding a manifest document.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// The file could not be read.
    #[error("failed to read {path}")]
    Read {
        /// Path that could not be read.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file extension does not name a supported syntax.
    #[error("unsupported manifest format for {path}; expected a .toml or .json file")]
    UnsupportedFormat {
        /// Offending path.
        path: Utf8PathBuf,
    },

    /// The document is not valid TOML.
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// The document is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Syntax of a manifest document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// TOML (`.toml`).
    Toml,
    /// JSON (`.json`).
    Json,
}

impl DocumentFormat {
    /// Infer the format from a file extension.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use modplan::document::DocumentFormat;
    ///
    /// assert_eq!(
    ///     DocumentFormat::from_path(Utf8Path::new("acfs.manifest.toml")),
    ///     Some(DocumentFormat::Toml)
    /// );
    /// assert_eq!(DocumentFormat::from_path(Utf8Path::new("manifest.yaml")), None);
    /// ```
    #[must_use]
    pub fn from_path(path: &Utf8Path) -> Option<Self> {
        match path.extension()?.to_ascii_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Toml => f.write_str("toml"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// A decoded manifest document and the raw text it came from.
#[derive(Debug, Clone)]
pub struct Document {
    /// Syntax the document was written in.
    pub format: DocumentFormat,
    /// Raw document text.
    pub text: String,
    /// Decoded, untyped tree.
    pub value: Value,
}

impl Document {
    /// SHA-256 fingerprint of the raw text.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        fingerprint(self.text.as_bytes())
    }
}

/// Decode `text` in the given syntax.
///
/// # Errors
///
/// Returns [`DocumentError::Toml`] or [`DocumentError::Json`] on syntax errors.
pub fn parse_document(text: &str, format: DocumentFormat) -> Result<Value, DocumentError> {
    let value = match format {
        DocumentFormat::Toml => toml::from_str::<Value>(text)?,
        DocumentFormat::Json => serde_json::from_str::<Value>(text)?,
    };
    Ok(value)
}

/// Read and decode the manifest document at `path`.
///
/// # Errors
///
/// Returns an error if the extension is unsupported, the file cannot be read,
/// or its contents fail to decode.
pub fn read_document(path: &Utf8Path) -> Result<Document, DocumentError> {
    let format =
        DocumentFormat::from_path(path).ok_or_else(|| DocumentError::UnsupportedFormat {
            path: path.to_owned(),
        })?;
    let text = std::fs::read_to_string(path).map_err(|source| DocumentError::Read {
        path: path.to_owned(),
        source,
    })?;
    log::debug!("read {} bytes of {format} from {path}", text.len());
    let value = parse_document(&text, format)?;
    Ok(Document {
        format,
        text,
        value,
    })
}

/// Hex-encoded SHA-256 digest of a document's bytes.
///
/// # Examples
///
/// ```
/// use modplan::document::fingerprint;
///
/// let digest = fingerprint(b"");
/// assert_eq!(
///     digest,
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
#[must_use]
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
