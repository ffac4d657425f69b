//! Command-line runtime for the gfbuild grammar build tool.
//!
//! The module owns argument parsing, settings resolution, logging bootstrap,
//! and dispatch into the build engine. The interface is designed to be
//! exercised both from the binary entrypoint and from tests where IO streams
//! and terminal status can be substituted.

use std::ffi::OsString;
use std::io::{self, Write};
use std::process::ExitCode;

use camino::{Utf8Path, Utf8PathBuf};
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use signal_hook::consts::signal::{SIGINT, SIGTERM};
use thiserror::Error;
use tracing::{info, warn};

use gfbuild_config::{LogFormat, OutputLayout, Settings};
use gfbuild_core::{
    BuildError, Builder, CancelToken, InvokeError, LaunchError, LaunchSpec, ProcessExecutor,
    ProcessResult, launch,
};

pub mod output;
mod telemetry;

pub use output::{OutputFormat, ResolvedOutputFormat};

/// Tracing target for the CLI runtime.
const CLI_TARGET: &str = "gfbuild_cli";

/// Exit code reported when a pass is interrupted, mirroring shell convention
/// for SIGINT.
const INTERRUPTED_EXIT: u8 = 130;

/// Builds Grammatical Framework grammars with the external gf compiler.
#[derive(Parser, Debug)]
#[command(name = "gfbuild", version, disable_help_subcommand = true)]
struct Cli {
    /// Path to the gf compiler binary.
    #[arg(long, env = "GFBUILD_COMPILER_PATH", global = true, value_name = "PATH")]
    compiler_path: Option<Utf8PathBuf>,
    /// Path to the grammar library passed to the compiler.
    #[arg(long, env = "GFBUILD_LIBRARY_PATH", global = true, value_name = "PATH")]
    library_path: Option<Utf8PathBuf>,
    /// Directory names excluded from source traversal.
    #[arg(
        long = "exclude",
        env = "GFBUILD_EXCLUDED_DIRS",
        global = true,
        value_name = "DIR",
        value_delimiter = ','
    )]
    exclude: Vec<String>,
    /// On-disk layout of generated build output.
    #[arg(long, env = "GFBUILD_OUTPUT_LAYOUT", global = true, value_name = "LAYOUT")]
    output_layout: Option<OutputLayout>,
    /// Upper bound, in seconds, on a single compiler invocation.
    #[arg(long, env = "GFBUILD_TIMEOUT_SECS", global = true, value_name = "SECS")]
    timeout_secs: Option<u64>,
    /// Whether change-driven builds are upgraded to full passes.
    #[arg(
        long,
        env = "GFBUILD_PREFER_FULL_BUILD",
        global = true,
        value_name = "BOOL"
    )]
    prefer_full_build: Option<bool>,
    /// Log filter expression, as understood by tracing.
    #[arg(long, env = "GFBUILD_LOG_FILTER", global = true, value_name = "FILTER")]
    log_filter: Option<String>,
    /// Log output format.
    #[arg(long, env = "GFBUILD_LOG_FORMAT", global = true, value_name = "FORMAT")]
    log_format: Option<LogFormat>,
    /// Controls how reports are rendered.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,
    /// Build, clean, or launch operations.
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug, Clone)]
enum CliCommand {
    /// Compiles grammar sources under a project root.
    Build {
        /// Project root scanned for grammar sources.
        #[arg(long, default_value = ".", value_name = "DIR")]
        root: Utf8PathBuf,
        /// Changed files to rebuild instead of scanning the whole tree.
        #[arg(long = "changed", value_name = "FILE")]
        changed: Vec<Utf8PathBuf>,
        /// Rebuilds only the changed files even when full builds are
        /// preferred.
        #[arg(long)]
        incremental: bool,
    },
    /// Removes generated build output without invoking the compiler.
    Clean {
        /// Project root scanned for build directories.
        #[arg(long, default_value = ".", value_name = "DIR")]
        root: Utf8PathBuf,
    },
    /// Launches the compiler in batch mode over explicit grammar files.
    Run {
        /// Working directory for the compiler.
        #[arg(long, default_value = ".", value_name = "DIR")]
        cwd: Utf8PathBuf,
        /// Extra options passed through to the compiler, hyphens included.
        #[arg(
            short = 'o',
            long = "option",
            value_name = "OPT",
            allow_hyphen_values = true
        )]
        options: Vec<String>,
        /// Grammar files given to the compiler.
        #[arg(required = true, value_name = "FILE")]
        files: Vec<Utf8PathBuf>,
    },
}

#[derive(Debug, Error)]
enum AppError {
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        #[source]
        source: telemetry::TelemetryError,
    },
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Launch(#[from] LaunchError),
    #[error("failed to render report: {0}")]
    Render(#[from] serde_json::Error),
    #[error("failed to write output: {0}")]
    WriteOutput(#[from] io::Error),
}

impl AppError {
    /// Process exit code for this failure.
    fn exit_code(&self) -> ExitCode {
        match self {
            Self::Build(BuildError::Cancelled)
            | Self::Launch(LaunchError::Invoke(InvokeError::Cancelled)) => {
                ExitCode::from(INTERRUPTED_EXIT)
            }
            _ => ExitCode::FAILURE,
        }
    }
}

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E, stdout_is_terminal: bool) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => return render_parse_error(&error, stdout, stderr),
    };

    let settings = settings_from_cli(&cli);
    if let Err(source) = telemetry::initialise(&settings) {
        let _ = writeln!(stderr, "{}", AppError::Telemetry { source });
        return ExitCode::FAILURE;
    }

    let format = cli.output.resolve(stdout_is_terminal);
    match execute(cli.command, &settings, format, stdout) {
        Ok(exit_code) => exit_code,
        Err(error) => {
            let _ = writeln!(stderr, "{error}");
            error.exit_code()
        }
    }
}

/// Renders a clap parse outcome: help and version requests go to stdout and
/// succeed, everything else goes to stderr and fails.
fn render_parse_error<W, E>(error: &clap::Error, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    W: Write,
    E: Write,
{
    let rendered = error.render();
    if matches!(
        error.kind(),
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
    ) {
        let _ = write!(stdout, "{rendered}");
        ExitCode::SUCCESS
    } else {
        let _ = write!(stderr, "{rendered}");
        ExitCode::FAILURE
    }
}

/// Layers CLI overrides on top of the built-in defaults.
fn settings_from_cli(cli: &Cli) -> Settings {
    let mut settings = Settings::default();
    if let Some(path) = &cli.compiler_path {
        settings = settings.with_compiler_path(path.clone());
    }
    if let Some(path) = &cli.library_path {
        settings = settings.with_library_path(path.clone());
    }
    if !cli.exclude.is_empty() {
        settings = settings.with_excluded_dirs(cli.exclude.clone());
    }
    if let Some(layout) = cli.output_layout {
        settings = settings.with_output_layout(layout);
    }
    if let Some(secs) = cli.timeout_secs {
        settings = settings.with_timeout_secs(secs);
    }
    if let Some(prefer) = cli.prefer_full_build {
        settings = settings.with_prefer_full_build(prefer);
    }
    if let Some(filter) = &cli.log_filter {
        settings = settings.with_log_filter(filter.clone());
    }
    if let Some(format) = cli.log_format {
        settings = settings.with_log_format(format);
    }
    settings
}

/// Flips the token when the user interrupts or terminates the process.
fn register_cancel_signals(cancel: &CancelToken) {
    for signal in [SIGINT, SIGTERM] {
        if let Err(error) = signal_hook::flag::register(signal, cancel.flag()) {
            warn!(
                target: CLI_TARGET,
                signal,
                %error,
                "could not register signal handler"
            );
        }
    }
}

/// Bundles the resolved format with the stream reports are written to.
struct OutputSink<'a, W: Write> {
    format: ResolvedOutputFormat,
    stdout: &'a mut W,
}

impl<W: Write> OutputSink<'_, W> {
    fn emit(&mut self, rendered: &str) -> Result<(), AppError> {
        self.stdout.write_all(rendered.as_bytes())?;
        self.stdout.flush()?;
        Ok(())
    }

    fn emit_build(&mut self, report: &gfbuild_core::BuildReport) -> Result<(), AppError> {
        let rendered = match self.format {
            ResolvedOutputFormat::Human => output::render_build_report(report),
            ResolvedOutputFormat::Json => output::render_build_report_json(report)?,
        };
        self.emit(&rendered)
    }

    fn emit_clean(&mut self, report: &gfbuild_core::CleanReport) -> Result<(), AppError> {
        let rendered = match self.format {
            ResolvedOutputFormat::Human => output::render_clean_report(report),
            ResolvedOutputFormat::Json => output::render_clean_report_json(report)?,
        };
        self.emit(&rendered)
    }

    fn emit_launch(&mut self, result: &ProcessResult) -> Result<(), AppError> {
        let rendered = match self.format {
            ResolvedOutputFormat::Human => output::render_launch_result(result),
            ResolvedOutputFormat::Json => output::render_launch_result_json(result)?,
        };
        self.emit(&rendered)
    }
}

fn execute<W: Write>(
    command: CliCommand,
    settings: &Settings,
    format: ResolvedOutputFormat,
    stdout: &mut W,
) -> Result<ExitCode, AppError> {
    let cancel = CancelToken::new();
    register_cancel_signals(&cancel);
    let mut sink = OutputSink { format, stdout };

    match command {
        CliCommand::Build {
            root,
            changed,
            incremental,
        } => run_build(settings, &root, &changed, incremental, &cancel, &mut sink),
        CliCommand::Clean { root } => run_clean(settings, &root, &mut sink),
        CliCommand::Run {
            cwd,
            options,
            files,
        } => run_batch(settings, cwd, options, files, &cancel, &mut sink),
    }
}

fn executor_from_settings(settings: &Settings) -> ProcessExecutor {
    settings.timeout_secs().map_or_else(ProcessExecutor::new, |secs| {
        ProcessExecutor::new().with_timeout_secs(secs)
    })
}

/// Drives a build pass and reports per-file outcomes.
///
/// A change set is honoured as-is when incremental builds are requested or
/// preferred; otherwise the whole tree is rebuilt, which keeps cross-file
/// scoping sound at the cost of recompiling unchanged grammars.
fn run_build<W: Write>(
    settings: &Settings,
    root: &Utf8Path,
    changed: &[Utf8PathBuf],
    incremental: bool,
    cancel: &CancelToken,
    sink: &mut OutputSink<'_, W>,
) -> Result<ExitCode, AppError> {
    let executor = executor_from_settings(settings);
    let mut builder = Builder::new(settings.clone(), executor);

    let report = if changed.is_empty() {
        builder.full_build(root, cancel)?
    } else if incremental || !settings.prefer_full_build() {
        builder.incremental_build(changed, cancel)?
    } else {
        info!(
            target: CLI_TARGET,
            changed = changed.len(),
            "full builds preferred, building the whole tree"
        );
        builder.full_build(root, cancel)?
    };

    sink.emit_build(&report)?;
    Ok(if report.succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn run_clean<W: Write>(
    settings: &Settings,
    root: &Utf8Path,
    sink: &mut OutputSink<'_, W>,
) -> Result<ExitCode, AppError> {
    let executor = executor_from_settings(settings);
    let mut builder = Builder::new(settings.clone(), executor);
    let report = builder.clean(root)?;
    sink.emit_clean(&report)?;
    Ok(ExitCode::SUCCESS)
}

fn run_batch<W: Write>(
    settings: &Settings,
    cwd: Utf8PathBuf,
    options: Vec<String>,
    files: Vec<Utf8PathBuf>,
    cancel: &CancelToken,
    sink: &mut OutputSink<'_, W>,
) -> Result<ExitCode, AppError> {
    let executor = executor_from_settings(settings);
    let mut spec = LaunchSpec::new(cwd).with_files(files);
    for option in options {
        spec = spec.with_option(option);
    }

    let result = launch(settings, &executor, &spec, cancel)?;
    sink.emit_launch(&result)?;
    Ok(exit_code_from_status(result.status()))
}

/// Maps a child exit status onto this process's exit code.
fn exit_code_from_status(status: i32) -> ExitCode {
    u8::try_from(status).map_or(ExitCode::FAILURE, ExitCode::from)
}

#[cfg(test)]
mod tests;
