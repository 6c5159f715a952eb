//! Project configuration loaded from `modplan.toml`.
//!
//! The file is optional. When present it may pin the manifest path, the
//! default output format, and a persistent skip list that is merged into
//! every plan request. Command-line flags always take precedence over the
//! values here.

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;

/// File name looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "modplan.toml";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read configuration at {path}")]
    Read {
        /// Configuration path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid configuration TOML.
    #[error("invalid configuration in {path}: {source}")]
    Parse {
        /// Configuration path.
        path: Utf8PathBuf,
        /// Parser error.
        #[source]
        source: toml::de::Error,
    },
}

/// Default rendering for command output.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Top-level configuration.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ModplanConfig {
    /// Manifest used when a command is not given one explicitly.
    pub manifest: Option<Utf8PathBuf>,
    /// Output format used when `--json` is absent.
    pub format: OutputFormat,
    /// Persistent selection directives.
    pub selection: SelectionConfig,
}

/// Selection directives applied to every plan request.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SelectionConfig {
    /// Module ids always skipped, in addition to any `--skip` flags.
    pub skip: Vec<String>,
}

impl ModplanConfig {
    /// Load configuration from `path`.
    ///
    /// A missing file yields the defaults, so projects without a
    /// configuration file behave exactly as if an empty one existed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file exists but cannot be read or
    /// does not parse.
    pub fn load_from(path: &Utf8Path) -> Result<Self, ConfigError> {
        Self::load_with(path, read_config_file)
    }

    /// Load configuration using the supplied loader.
    ///
    /// Exists so tests can inject configuration without touching the file
    /// system.
    ///
    /// # Errors
    ///
    /// Propagates the loader's error.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use modplan::config::ModplanConfig;
    ///
    /// let config = ModplanConfig::load_with(Utf8Path::new("modplan.toml"), |_| {
    ///     Ok(ModplanConfig::default())
    /// })
    /// .expect("stub loader succeeds");
    /// assert!(config.selection.skip.is_empty());
    /// ```
    pub fn load_with<F>(path: &Utf8Path, loader: F) -> Result<Self, ConfigError>
    where
        F: FnOnce(&Utf8Path) -> Result<Self, ConfigError>,
    {
        loader(path)
    }

    /// Parse configuration from TOML text read from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed or unknown settings.
    pub fn from_toml(path: &Utf8Path, source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }
}

fn read_config_file(path: &Utf8Path) -> Result<ModplanConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(source) => {
            log::debug!("loaded configuration from {path}");
            ModplanConfig::from_toml(path, &source)
        }
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("no configuration at {path}; using defaults");
            Ok(ModplanConfig::default())
        }
        Err(source) => Err(ConfigError::Read {
            path: path.to_owned(),
            source,
        }),
    }
}
