//! CLI entrypoint for the gfbuild grammar build tool.
//!
//! The binary delegates to [`gfbuild_cli::run`], which parses arguments,
//! resolves settings, initialises logging, and drives the build engine.

use std::io::{self, IsTerminal, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let stdout_is_terminal = io::stdout().is_terminal();
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    gfbuild_cli::run(
        std::env::args_os(),
        &mut stdout,
        &mut stderr,
        stdout_is_terminal,
    )
}
