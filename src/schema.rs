//! Structural validation of manifest documents.
//!
//! Turns an untyped document tree into a typed [`Manifest`], applying field
//! defaults along the way. Checks here are strictly local to a field or a
//! single module; graph-level rules (dependency existence, cycles, phases)
//! belong to [`crate::validate`]. Every problem found is collected, so a
//! single call reports all structural defects in the document.

use crate::model::{
    Defaults, InstalledCheck, Manifest, ManifestHeader, Mode, Module, Phase, RunAs,
    VerifiedInstaller,
};
use crate::module_id::{ModuleId, validate_dotted_id};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

const MANIFEST_FIELDS: &[&str] = &["version", "name", "id", "defaults", "modules"];
const DEFAULTS_FIELDS: &[&str] = &["user", "workspace_root", "mode"];
const MODULE_FIELDS: &[&str] = &[
    "id",
    "description",
    "dependencies",
    "phase",
    "install",
    "verify",
    "run_as",
    "optional",
    "enabled_by_default",
    "generated",
    "verified_installer",
    "tags",
    "notes",
    "aliases",
    "docs_url",
    "installed_check",
];
const VERIFIED_INSTALLER_FIELDS: &[&str] = &["tool", "runner", "args"];
const INSTALLED_CHECK_FIELDS: &[&str] = &["run_as", "command"];

/// What went wrong with a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaErrorKind {
    /// A required field is absent.
    MissingField,
    /// The field holds the wrong primitive type.
    WrongType {
        /// Type the schema requires.
        expected: &'static str,
    },
    /// An integer lies outside its permitted range.
    OutOfRange {
        /// Value found in the document.
        found: i64,
        /// Inclusive lower bound.
        min: i64,
        /// Inclusive upper bound.
        max: i64,
    },
    /// An identifier does not match the dotted-id pattern.
    InvalidPattern {
        /// Explanation of the violated rule.
        reason: String,
    },
    /// A value is not one of a fixed set of choices.
    InvalidChoice {
        /// Value found in the document.
        found: String,
        /// Accepted spellings.
        allowed: &'static [&'static str],
    },
    /// A URL field is not an absolute http(s) URL.
    InvalidUrl {
        /// Value found in the document.
        found: String,
    },
    /// A required string or list is empty.
    EmptyValue,
    /// An id appears more than once where ids must be unique.
    DuplicateId {
        /// The repeated id.
        id: String,
    },
    /// The field is not part of the schema.
    UnknownField,
    /// `install` is empty but neither a verified installer nor
    /// `generated = false` excuses it.
    InstallRequired,
}

impl fmt::Display for SchemaErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField => f.write_str("required field is missing"),
            Self::WrongType { expected } => write!(f, "expected {expected}"),
            Self::OutOfRange { found, min, max } => {
                write!(f, "value {found} is outside the range {min}..={max}")
            }
            Self::InvalidPattern { reason } => f.write_str(reason),
            Self::InvalidChoice { found, allowed } => {
                write!(f, "`{found}` is not one of: {}", allowed.join(", "))
            }
            Self::InvalidUrl { found } => write!(f, "`{found}` is not an absolute http(s) URL"),
            Self::EmptyValue => f.write_str("must not be empty"),
            Self::DuplicateId { id } => write!(f, "`{id}` is listed more than once"),
            Self::UnknownField => f.write_str("unknown field"),
            Self::InstallRequired => f.write_str(
                "install must not be empty unless verified_installer is set or generated = false",
            ),
        }
    }
}

/// A structural defect located by its path within the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{path}: {kind}")]
pub struct SchemaError {
    /// Location such as `modules[2].phase`.
    pub path: String,
    /// Defect category and details.
    #[serde(flatten)]
    pub kind: SchemaErrorKind,
}

/// Convert a decoded document into a typed manifest.
///
/// # Errors
///
/// Returns every structural error found. No manifest is produced unless the
/// document is structurally sound.
///
/// # Examples
///
/// ```
/// use modplan::schema::parse_manifest;
///
/// let doc = serde_json::json!({
///     "version": 1,
///     "name": "Flywheel",
///     "id": "flywheel",
///     "defaults": { "user": "ubuntu", "workspace_root": "/data/projects", "mode": "vibe" },
///     "modules": [
///         { "id": "base.system", "description": "Base packages",
///           "install": ["apt-get install -y curl"], "verify": ["curl --version"] }
///     ]
/// });
/// let manifest = parse_manifest(&doc).expect("structurally valid");
/// let module = manifest.get("base.system").expect("declared");
/// assert_eq!(module.phase.get(), 1);
/// assert!(module.enabled_by_default);
/// ```
pub fn parse_manifest(document: &Value) -> Result<Manifest, Vec<SchemaError>> {
    let mut cx = Collector::default();
    let parsed = manifest(document, &mut cx);
    match parsed {
        Some(manifest) if cx.errors.is_empty() => Ok(manifest),
        _ => {
            log::debug!("structural validation found {} error(s)", cx.errors.len());
            Err(cx.errors)
        }
    }
}

#[derive(Default)]
struct Collector {
    errors: Vec<SchemaError>,
}

impl Collector {
    fn push(&mut self, path: impl Into<String>, kind: SchemaErrorKind) {
        self.errors.push(SchemaError {
            path: path.into(),
            kind,
        });
    }

    fn count(&self) -> usize {
        self.errors.len()
    }
}

fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_owned()
    } else {
        format!("{parent}.{key}")
    }
}

fn manifest(document: &Value, cx: &mut Collector) -> Option<Manifest> {
    let obj = as_object(document, "", cx)?;
    reject_unknown(obj, MANIFEST_FIELDS, "", cx);

    let version = required(obj, "version", "", cx).and_then(|v| positive_u32(v, "version", cx));
    let name = required(obj, "name", "", cx).and_then(|v| non_empty_string(v, "name", cx));
    let id = required(obj, "id", "", cx).and_then(|v| dotted_id_string(v, "id", cx));
    let defaults = required(obj, "defaults", "", cx).and_then(|v| defaults(v, cx));
    let modules = required(obj, "modules", "", cx).and_then(|v| modules(v, cx));

    let header = ManifestHeader {
        version: version?,
        name: name?,
        id: id?,
        defaults: defaults?,
    };
    Manifest::new(header, modules?).ok()
}

fn defaults(value: &Value, cx: &mut Collector) -> Option<Defaults> {
    let obj = as_object(value, "defaults", cx)?;
    reject_unknown(obj, DEFAULTS_FIELDS, "defaults", cx);
    let user = required(obj, "user", "defaults", cx)
        .and_then(|v| non_empty_string(v, "defaults.user", cx));
    let workspace_root = required(obj, "workspace_root", "defaults", cx)
        .and_then(|v| non_empty_string(v, "defaults.workspace_root", cx));
    let mode = required(obj, "mode", "defaults", cx)
        .and_then(|v| choice(v, "defaults.mode", Mode::VARIANTS, Mode::from_name, cx));

    Some(Defaults {
        user: user?,
        workspace_root: workspace_root?,
        mode: mode?,
    })
}

fn modules(value: &Value, cx: &mut Collector) -> Option<Vec<Module>> {
    let Some(items) = value.as_array() else {
        cx.push("modules", SchemaErrorKind::WrongType { expected: "array" });
        return None;
    };
    if items.is_empty() {
        cx.push("modules", SchemaErrorKind::EmptyValue);
        return None;
    }

    let before = cx.count();
    let mut seen = HashSet::new();
    let mut parsed = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let path = format!("modules[{index}]");
        if let Some(module) = module(item, &path, cx) {
            if !seen.insert(module.id.clone()) {
                cx.push(
                    join(&path, "id"),
                    SchemaErrorKind::DuplicateId {
                        id: module.id.to_string(),
                    },
                );
                continue;
            }
            parsed.push(module);
        }
    }
    (cx.count() == before).then_some(parsed)
}

fn module(value: &Value, path: &str, cx: &mut Collector) -> Option<Module> {
    let obj = as_object(value, path, cx)?;
    reject_unknown(obj, MODULE_FIELDS, path, cx);
    let before = cx.count();

    let id = required(obj, "id", path, cx).and_then(|v| module_id(v, &join(path, "id"), cx));
    let description = required(obj, "description", path, cx)
        .and_then(|v| non_empty_string(v, &join(path, "description"), cx));
    let dependencies = dependency_list(obj, path, cx);
    let phase = match obj.get("phase") {
        Some(v) => phase(v, &join(path, "phase"), cx),
        None => Some(Phase::default()),
    };
    let install = directive_list(obj, "install", path, cx);
    let verify = directive_list(obj, "verify", path, cx);
    match obj.get("verify") {
        None => cx.push(join(path, "verify"), SchemaErrorKind::MissingField),
        Some(Value::Array(items)) if items.is_empty() => {
            cx.push(join(path, "verify"), SchemaErrorKind::EmptyValue);
        }
        Some(_) => {}
    }
    let run_as = match obj.get("run_as") {
        Some(v) => choice(v, &join(path, "run_as"), RunAs::VARIANTS, RunAs::from_name, cx),
        None => Some(RunAs::default()),
    };
    let optional = flag(obj, "optional", false, path, cx);
    let enabled_by_default = flag(obj, "enabled_by_default", true, path, cx);
    let generated = flag(obj, "generated", true, path, cx);
    let verified_installer = obj
        .get("verified_installer")
        .and_then(|v| verified_installer(v, &join(path, "verified_installer"), cx));
    let installed_check = obj
        .get("installed_check")
        .and_then(|v| installed_check(v, &join(path, "installed_check"), cx));
    let docs_url = optional_string(obj, "docs_url", path, cx);
    if let Some(url) = docs_url.as_deref().filter(|url| !is_http_url(url)) {
        cx.push(
            join(path, "docs_url"),
            SchemaErrorKind::InvalidUrl {
                found: url.to_owned(),
            },
        );
    }
    let tags = string_list(obj, "tags", path, cx);
    let notes = string_list(obj, "notes", path, cx);
    let aliases = string_list(obj, "aliases", path, cx);

    let excused = verified_installer.is_some() || !generated;
    let install_declared = obj
        .get("install")
        .and_then(Value::as_array)
        .is_some_and(|items| !items.is_empty());
    if !install_declared && !excused && obj.get("verified_installer").is_none() {
        cx.push(join(path, "install"), SchemaErrorKind::InstallRequired);
    }

    if cx.count() != before {
        return None;
    }
    Some(Module {
        id: id?,
        description: description?,
        dependencies,
        phase: phase?,
        install,
        verify,
        run_as: run_as?,
        optional,
        enabled_by_default,
        generated,
        verified_installer,
        tags,
        notes,
        aliases,
        docs_url,
        installed_check,
    })
}

fn dependency_list(obj: &Map<String, Value>, path: &str, cx: &mut Collector) -> Vec<ModuleId> {
    let list_path = join(path, "dependencies");
    let Some(value) = obj.get("dependencies") else {
        return Vec::new();
    };
    let Some(items) = value.as_array() else {
        cx.push(list_path, SchemaErrorKind::WrongType { expected: "array" });
        return Vec::new();
    };
    let mut deps: Vec<ModuleId> = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let item_path = format!("{list_path}[{index}]");
        let Some(dep) = module_id(item, &item_path, cx) else {
            continue;
        };
        if deps.contains(&dep) {
            cx.push(
                item_path,
                SchemaErrorKind::DuplicateId {
                    id: dep.into_inner(),
                },
            );
            continue;
        }
        deps.push(dep);
    }
    deps
}

fn verified_installer(value: &Value, path: &str, cx: &mut Collector) -> Option<VerifiedInstaller> {
    let obj = as_object(value, path, cx)?;
    reject_unknown(obj, VERIFIED_INSTALLER_FIELDS, path, cx);
    let before = cx.count();
    let tool = required(obj, "tool", path, cx).and_then(|v| non_empty_string(v, &join(path, "tool"), cx));
    let runner =
        required(obj, "runner", path, cx).and_then(|v| non_empty_string(v, &join(path, "runner"), cx));
    let args = string_list(obj, "args", path, cx);
    (cx.count() == before).then_some(VerifiedInstaller {
        tool: tool?,
        runner: runner?,
        args,
    })
}

fn installed_check(value: &Value, path: &str, cx: &mut Collector) -> Option<InstalledCheck> {
    let obj = as_object(value, path, cx)?;
    reject_unknown(obj, INSTALLED_CHECK_FIELDS, path, cx);
    let run_as = match obj.get("run_as") {
        Some(v) => choice(v, &join(path, "run_as"), RunAs::VARIANTS, RunAs::from_name, cx),
        None => Some(RunAs::default()),
    };
    let command = required(obj, "command", path, cx)
        .and_then(|v| non_empty_string(v, &join(path, "command"), cx));
    Some(InstalledCheck {
        run_as: run_as?,
        command: command?,
    })
}

fn as_object<'a>(value: &'a Value, path: &str, cx: &mut Collector) -> Option<&'a Map<String, Value>> {
    let obj = value.as_object();
    if obj.is_none() {
        let at = if path.is_empty() { "$" } else { path };
        cx.push(at, SchemaErrorKind::WrongType { expected: "table" });
    }
    obj
}

fn reject_unknown(obj: &Map<String, Value>, allowed: &[&str], path: &str, cx: &mut Collector) {
    for key in obj.keys().filter(|key| !allowed.contains(&key.as_str())) {
        cx.push(join(path, key), SchemaErrorKind::UnknownField);
    }
}

fn required<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    path: &str,
    cx: &mut Collector,
) -> Option<&'a Value> {
    let value = obj.get(key);
    if value.is_none() {
        cx.push(join(path, key), SchemaErrorKind::MissingField);
    }
    value
}

fn non_empty_string(value: &Value, path: &str, cx: &mut Collector) -> Option<String> {
    let Some(text) = value.as_str() else {
        cx.push(path, SchemaErrorKind::WrongType { expected: "string" });
        return None;
    };
    if text.trim().is_empty() {
        cx.push(path, SchemaErrorKind::EmptyValue);
        return None;
    }
    Some(text.to_owned())
}

fn optional_string(
    obj: &Map<String, Value>,
    key: &str,
    path: &str,
    cx: &mut Collector,
) -> Option<String> {
    obj.get(key)
        .and_then(|v| non_empty_string(v, &join(path, key), cx))
}

fn string_list(obj: &Map<String, Value>, key: &str, path: &str, cx: &mut Collector) -> Vec<String> {
    strings(obj, key, path, true, cx)
}

/// Install and verify entries are commands; a blank one is an error.
fn directive_list(obj: &Map<String, Value>, key: &str, path: &str, cx: &mut Collector) -> Vec<String> {
    strings(obj, key, path, false, cx)
}

fn strings(
    obj: &Map<String, Value>,
    key: &str,
    path: &str,
    allow_blank: bool,
    cx: &mut Collector,
) -> Vec<String> {
    let list_path = join(path, key);
    let Some(value) = obj.get(key) else {
        return Vec::new();
    };
    let Some(items) = value.as_array() else {
        cx.push(list_path, SchemaErrorKind::WrongType { expected: "array" });
        return Vec::new();
    };
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let item_path = format!("{list_path}[{index}]");
            match item.as_str() {
                Some(text) if !allow_blank && text.trim().is_empty() => {
                    cx.push(item_path, SchemaErrorKind::EmptyValue);
                    None
                }
                Some(text) => Some(text.to_owned()),
                None => {
                    cx.push(item_path, SchemaErrorKind::WrongType { expected: "string" });
                    None
                }
            }
        })
        .collect()
}

fn flag(obj: &Map<String, Value>, key: &str, default: bool, path: &str, cx: &mut Collector) -> bool {
    match obj.get(key) {
        None => default,
        Some(Value::Bool(value)) => *value,
        Some(_) => {
            cx.push(join(path, key), SchemaErrorKind::WrongType { expected: "boolean" });
            default
        }
    }
}

fn choice<T>(
    value: &Value,
    path: &str,
    allowed: &'static [&'static str],
    parse: fn(&str) -> Option<T>,
    cx: &mut Collector,
) -> Option<T> {
    let Some(text) = value.as_str() else {
        cx.push(path, SchemaErrorKind::WrongType { expected: "string" });
        return None;
    };
    let parsed = parse(text);
    if parsed.is_none() {
        cx.push(
            path,
            SchemaErrorKind::InvalidChoice {
                found: text.to_owned(),
                allowed,
            },
        );
    }
    parsed
}

fn integer(value: &Value, path: &str, cx: &mut Collector) -> Option<i64> {
    let number = value.as_i64();
    if number.is_none() {
        cx.push(path, SchemaErrorKind::WrongType { expected: "integer" });
    }
    number
}

fn positive_u32(value: &Value, path: &str, cx: &mut Collector) -> Option<u32> {
    let number = integer(value, path, cx)?;
    let converted = u32::try_from(number).ok().filter(|n| *n >= 1);
    if converted.is_none() {
        cx.push(
            path,
            SchemaErrorKind::OutOfRange {
                found: number,
                min: 1,
                max: i64::from(u32::MAX),
            },
        );
    }
    converted
}

fn phase(value: &Value, path: &str, cx: &mut Collector) -> Option<Phase> {
    let number = integer(value, path, cx)?;
    let phase = u8::try_from(number).ok().and_then(Phase::new);
    if phase.is_none() {
        cx.push(
            path,
            SchemaErrorKind::OutOfRange {
                found: number,
                min: i64::from(Phase::MIN),
                max: i64::from(Phase::MAX),
            },
        );
    }
    phase
}

fn dotted_id_string(value: &Value, path: &str, cx: &mut Collector) -> Option<String> {
    let Some(text) = value.as_str() else {
        cx.push(path, SchemaErrorKind::WrongType { expected: "string" });
        return None;
    };
    match validate_dotted_id(text) {
        Ok(()) => Some(text.to_owned()),
        Err(err) => {
            cx.push(
                path,
                SchemaErrorKind::InvalidPattern {
                    reason: err.to_string(),
                },
            );
            None
        }
    }
}

fn module_id(value: &Value, path: &str, cx: &mut Collector) -> Option<ModuleId> {
    let Some(text) = value.as_str() else {
        cx.push(path, SchemaErrorKind::WrongType { expected: "string" });
        return None;
    };
    match ModuleId::parse(text) {
        Ok(id) => Some(id),
        Err(err) => {
            cx.push(
                path,
                SchemaErrorKind::InvalidPattern {
                    reason: err.to_string(),
                },
            );
            None
        }
    }
}

/// Accept absolute `http`/`https` URLs with a host and no whitespace.
fn is_http_url(candidate: &str) -> bool {
    let Some(rest) = candidate
        .strip_prefix("https://")
        .or_else(|| candidate.strip_prefix("http://"))
    else {
        return false;
    };
    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    !host.is_empty() && !candidate.chars().any(char::is_whitespace)
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
