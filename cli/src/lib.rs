//! Command-line front end for the `modplan` manifest engine.
//!
//! The `modplan` binary is a thin wrapper over this library so that argument
//! parsing, dispatch, and output formatting can be tested in-process.
//!
//! # Modules
//!
//! - [`cli`] - Command-line argument definitions
//! - [`error`] - CLI error taxonomy and exit codes
//! - [`logging`] - Logger initialisation
//! - [`output`] - Plan and module-list formatting
//! - [`run`] - Command dispatch

pub mod cli;
pub mod error;
pub mod logging;
pub mod output;
pub mod run;
