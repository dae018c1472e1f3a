//! Binary entry point: parse arguments, analyse, print, exit.
//!
//! Logging comes up before anything else so every later failure is
//! reported through `tracing`. The summary goes to stdout; errors and
//! diagnostics go to stderr.

use std::io::{self, BufWriter, Write};
use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use sulcus_cli::cli::{Cli, CliError, render_summary, run_cli};
use sulcus_cli::logging;

fn main() -> ExitCode {
    if let Err(err) = logging::init() {
        print_preinit_failure(&err);
        return ExitCode::FAILURE;
    }
    run(Cli::parse())
}

fn run(cli: Cli) -> ExitCode {
    let summary = match run_cli(cli) {
        Ok(summary) => summary,
        Err(err) => {
            report_failure(&err);
            return ExitCode::FAILURE;
        }
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    match render_summary(&summary, &mut out).and_then(|()| out.flush()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "could not write the summary");
            ExitCode::FAILURE
        }
    }
}

/// Core errors carry a stable code worth surfacing to log scrapers; the
/// remaining kinds only have their message.
fn report_failure(err: &CliError) {
    match err {
        CliError::Core(core) => {
            error!(error = %core, code = %core.code(), "analysis failed");
        }
        other => error!(error = %other, "analysis failed"),
    }
}

#[expect(
    clippy::print_stderr,
    reason = "no subscriber exists yet to carry this report"
)]
fn print_preinit_failure(err: &logging::LoggingError) {
    eprintln!("sulcus: {err}");
}
