//! Logger initialisation for the CLI.
//!
//! The library logs through the `log` facade; the binary installs
//! `env_logger` writing to stderr so that stdout carries only command output.

use env_logger::{Builder, Target};
use log::LevelFilter;

/// Map `-v`/`-q` flags to a level filter.
///
/// Warnings are shown by default. Each `-v` raises the level by one step,
/// and `-q` limits output to errors.
///
/// # Examples
///
/// ```
/// use log::LevelFilter;
/// use modplan_cli::logging::level_filter;
///
/// assert_eq!(level_filter(0, false), LevelFilter::Warn);
/// assert_eq!(level_filter(2, false), LevelFilter::Debug);
/// assert_eq!(level_filter(0, true), LevelFilter::Error);
/// ```
#[must_use]
pub const fn level_filter(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Install the global logger.
///
/// `RUST_LOG`, when set, overrides the level chosen from the flags.
pub fn init(verbosity: u8, quiet: bool) {
    let mut builder = Builder::new();
    builder
        .filter_level(level_filter(verbosity, quiet))
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .target(Target::Stderr);
    if builder.try_init().is_err() {
        log::debug!("logger already initialised; keeping the existing one");
    }
}
