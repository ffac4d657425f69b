//! Launching GF batch sessions over compiled grammars.
//!
//! Besides building, the tool can hand a set of grammar files straight to
//! the compiler's `--batch` mode, for running a grammar after a successful
//! build. The session reuses the [`CompilerExecutor`] seam, so it honours
//! the same cancellation and capture rules as a build.

use camino::{Utf8Path, Utf8PathBuf};
use gfbuild_config::Settings;
use tracing::debug;

use crate::command::CommandSpec;
use crate::error::LaunchError;
use crate::process::{CancelToken, CompilerExecutor, ProcessResult};

/// Tracing target for batch sessions.
const LAUNCH_TARGET: &str = "gfbuild_core::launch";

/// What to hand to the compiler's batch mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    working_dir: Utf8PathBuf,
    options: Vec<String>,
    files: Vec<Utf8PathBuf>,
}

impl LaunchSpec {
    /// Creates a spec with no options and no files.
    #[must_use]
    pub fn new(working_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            options: Vec::new(),
            files: Vec::new(),
        }
    }

    /// Appends a raw compiler option.
    #[must_use]
    pub fn with_option(mut self, option: impl Into<String>) -> Self {
        self.options.push(option.into());
        self
    }

    /// Appends grammar files, in order.
    #[must_use]
    pub fn with_files<I, P>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Utf8PathBuf>,
    {
        self.files.extend(files.into_iter().map(Into::into));
        self
    }

    /// Directory the session runs in.
    #[must_use]
    pub fn working_dir(&self) -> &Utf8Path {
        &self.working_dir
    }

    /// Raw options passed after `--batch`.
    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Grammar files handed to the session.
    #[must_use]
    pub fn files(&self) -> &[Utf8PathBuf] {
        &self.files
    }
}

/// Runs a `gf --batch` session over the spec's files.
///
/// # Errors
///
/// Returns [`LaunchError::CompilerPathUnset`] when no compiler is
/// configured, [`LaunchError::NoFiles`] when the spec names no grammar
/// files, and wraps any [`crate::error::InvokeError`] from the executor.
pub fn launch<E: CompilerExecutor>(
    settings: &Settings,
    executor: &E,
    spec: &LaunchSpec,
    cancel: &CancelToken,
) -> Result<ProcessResult, LaunchError> {
    let Some(compiler) = settings.compiler_path() else {
        return Err(LaunchError::CompilerPathUnset);
    };
    if spec.files().is_empty() {
        return Err(LaunchError::NoFiles);
    }

    let command = CommandSpec::new(compiler, spec.working_dir())
        .with_arg("--batch")
        .with_args(spec.options().iter().cloned())
        .with_args(spec.files().iter().map(ToString::to_string));

    debug!(
        target: LAUNCH_TARGET,
        program = %compiler,
        args = ?command.args(),
        working_dir = %spec.working_dir(),
        "starting batch session"
    );
    let result = executor.run(&command, cancel)?;
    debug!(
        target: LAUNCH_TARGET,
        status = result.status(),
        "batch session finished"
    );
    Ok(result)
}
