mod app;
mod cli;
mod domain;
mod infra;
mod ui;

use crate::cli::CliInvocation;
use std::io::{self, Write};
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const LOG_FILTER_ENV: &str = "OPENCODE_RESUME_LOG";

#[derive(Debug, Error)]
enum MainError {
    #[error(transparent)]
    Cli(#[from] crate::cli::CliRunError),
}

fn main() {
    init_logging();
    match run_main() {
        Ok(code) => std::process::exit(code),
        Err(error) => {
            let mut err = io::stderr().lock();
            let _ = writeln!(err, "Error: {error}");
            std::process::exit(1);
        }
    }
}

fn run_main() -> Result<i32, MainError> {
    let args = std::env::args().collect::<Vec<_>>();
    let invocation = match crate::cli::parse_invocation(&args) {
        Ok(invocation) => invocation,
        Err(error) => {
            let mut err = io::stderr().lock();
            let _ = writeln!(err, "{error}");
            let _ = writeln!(err);
            print_help();
            std::process::exit(2);
        }
    };

    match invocation {
        CliInvocation::PrintHelp => {
            print_help();
            Ok(0)
        }
        CliInvocation::PrintVersion => {
            let mut out = io::stdout().lock();
            let _ = writeln!(out, "{}", env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
        CliInvocation::Resume(request) => Ok(crate::cli::run(request)?),
    }
}

/// Diagnostics stay off unless `OPENCODE_RESUME_LOG` holds a filter
/// directive. They go to stderr so the inline picker on stdout is untouched.
fn init_logging() {
    let Some(directive) = std::env::var(LOG_FILTER_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
    else {
        return;
    };

    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("debug"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .try_init();
}

fn print_help() {
    let text = format!(
        "{name} - pick an OpenCode session for the current directory and resume it\n\nUSAGE:\n  {name} [--server URL] [TITLE]\n  {name} --help | --version\n\nWithout TITLE an inline picker lists this directory's sessions, newest first.\nType to fuzzy-filter, arrows to move, enter to resume, ctrl-n to create a new\nsession, esc to quit. With TITLE the most recent session whose title matches\n(ignoring case; spaces, '-' and '_' are interchangeable) is resumed, or a new one is created.\n\nFLAGS:\n  -s, --server URL  OpenCode server address (default: http://localhost:4096)\n\nENV:\n  OPENCODE_RESUME_SERVER_URL  Server address, overridden by --server\n  OPENCODE_RESUME_BIN         OpenCode executable (default: opencode)\n  OPENCODE_RESUME_LOG         Diagnostics filter for stderr, e.g. debug\n  NO_COLOR                    Disable colored output\n",
        name = env!("CARGO_PKG_NAME")
    );
    let mut out = io::stdout().lock();
    let _ = write!(out, "{text}");
}
