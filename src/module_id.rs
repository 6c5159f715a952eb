//! Semantic wrapper for module identifiers.
//!
//! Module ids are category-qualified dotted names such as `lang.bun` or
//! `agents.claude`. Each segment starts with a lowercase ASCII letter and
//! continues with lowercase letters, digits, or underscores.

use serde::Serialize;
use std::borrow::Borrow;
use std::fmt;

/// Prefix applied to every generated installer entrypoint.
pub const FUNCTION_PREFIX: &str = "install_";

/// A validated module identifier.
///
/// # Examples
///
/// ```
/// use modplan::module_id::ModuleId;
///
/// let id = ModuleId::parse("lang.bun").expect("valid module id");
/// assert_eq!(id.category(), "lang");
/// assert_eq!(id.function_name(), "install_lang_bun");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ModuleId(String);

impl ModuleId {
    /// Parse and validate a module id.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidModuleId`] describing the first rule the value breaks.
    pub fn parse(value: &str) -> Result<Self, InvalidModuleId> {
        validate_dotted_id(value)?;
        Ok(Self(value.to_owned()))
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// The first dotted segment of the id.
    ///
    /// Single-segment ids are their own category.
    #[must_use]
    pub fn category(&self) -> &str {
        self.0.split('.').next().unwrap_or(&self.0)
    }

    /// Whether the id carries a category qualifier (`cat.name`).
    #[must_use]
    pub fn is_qualified(&self) -> bool {
        self.0.contains('.')
    }

    /// Derive the canonical installer entrypoint name for this id.
    #[must_use]
    pub fn function_name(&self) -> String {
        canonical_function_name(&self.0)
    }
}

/// Derive the canonical entrypoint name for a raw id string.
///
/// Dots become underscores and [`FUNCTION_PREFIX`] is prepended, so
/// `lang.bun` and `lang_bun` both map to `install_lang_bun`.
#[must_use]
pub fn canonical_function_name(id: &str) -> String {
    format!("{FUNCTION_PREFIX}{}", id.replace('.', "_"))
}

impl AsRef<str> for ModuleId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ModuleId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for ModuleId {
    type Error = InvalidModuleId;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reasons a string is not an acceptable dotted identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidModuleId {
    /// The value was empty.
    #[error("identifier must not be empty")]
    Empty,

    /// A segment between dots was empty (`lang..bun`, `.lang`, `lang.`).
    #[error("identifier `{0}` contains an empty segment")]
    EmptySegment(String),

    /// A segment began with something other than a lowercase letter.
    #[error("identifier `{0}` has a segment that does not start with a lowercase letter")]
    BadLeadingChar(String),

    /// A character outside `[a-z0-9_.]` was found.
    #[error("identifier `{value}` contains invalid character {found:?}")]
    BadChar {
        /// The rejected identifier.
        value: String,
        /// The first offending character.
        found: char,
    },
}

/// Validate `value` against `^[a-z][a-z0-9_]*(\.[a-z][a-z0-9_]*)*$`.
///
/// Shared with manifest-level ids, which follow the same shape.
///
/// # Errors
///
/// Returns the first violated rule.
pub fn validate_dotted_id(value: &str) -> Result<(), InvalidModuleId> {
    if value.is_empty() {
        return Err(InvalidModuleId::Empty);
    }
    for segment in value.split('.') {
        let mut chars = segment.chars();
        let Some(first) = chars.next() else {
            return Err(InvalidModuleId::EmptySegment(value.to_owned()));
        };
        if !first.is_ascii_lowercase() {
            return Err(InvalidModuleId::BadLeadingChar(value.to_owned()));
        }
        if let Some(found) =
            chars.find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_'))
        {
            return Err(InvalidModuleId::BadChar {
                value: value.to_owned(),
                found,
            });
        }
    }
    Ok(())
}
