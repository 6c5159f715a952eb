//! `modplan` CLI entrypoint.
//!
//! Validates installer manifests and prints execution plans. Command output
//! goes to stdout; errors and log records go to stderr.

use clap::Parser;
use modplan_cli::cli::Cli;
use modplan_cli::error::Result;
use modplan_cli::logging;
use modplan_cli::run::{Status, run};
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbosity, cli.quiet);

    let mut stdout = std::io::stdout().lock();
    let mut stderr = std::io::stderr();
    let exit_code = exit_code_for_run_result(run(&cli, &mut stdout), &mut stderr);
    if exit_code != 0 {
        if stdout.flush().is_err() {
            // Nothing more can be reported once stdout is gone.
        }
        std::process::exit(exit_code);
    }
}

fn exit_code_for_run_result(result: Result<Status>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(status) => status.exit_code(),
        Err(err) => {
            write_stderr_line(stderr, format!("error: {err}"));
            if let Some(detail) = err.detail() {
                write_stderr_line(stderr, detail.trim_end());
            }
            err.exit_code()
        }
    }
}

fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort reporting; ignore write failures.
    }
}
