//! Report rendering for terminal and machine consumers.
//!
//! Human output compresses a build report down to its failures plus a one
//! line summary; JSON output serialises the full report for tooling. Batch
//! launches forward the compiler's own streams unchanged.

use std::fmt::Write as _;

use clap::ValueEnum;
use serde_json::json;

use gfbuild_core::{BuildReport, CleanReport, Diagnostic, FailureReason, ProcessResult};

/// Output format selection for command results.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Selects `human` for terminal output and `json` for redirected output.
    Auto,
    /// Always render human-readable reports.
    Human,
    /// Always emit JSON reports.
    Json,
}

/// Output format after resolving `auto` based on TTY detection.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResolvedOutputFormat {
    /// Human-readable report lines.
    Human,
    /// Machine-readable JSON.
    Json,
}

impl OutputFormat {
    /// Resolves the output format based on whether stdout is a terminal.
    #[must_use]
    pub const fn resolve(self, stdout_is_terminal: bool) -> ResolvedOutputFormat {
        match self {
            Self::Auto => {
                if stdout_is_terminal {
                    ResolvedOutputFormat::Human
                } else {
                    ResolvedOutputFormat::Json
                }
            }
            Self::Human => ResolvedOutputFormat::Human,
            Self::Json => ResolvedOutputFormat::Json,
        }
    }
}

/// Renders a build report for human eyes: diagnostics and failure notes for
/// every failed file, then a one line summary.
#[must_use]
pub fn render_build_report(report: &BuildReport) -> String {
    let mut out = String::new();
    for outcome in report.outcomes() {
        if outcome.succeeded() {
            continue;
        }
        if outcome.diagnostics().is_empty() {
            if let Some(reason) = outcome.reason() {
                let _ = writeln!(out, "{}: {}", outcome.file(), reason_text(reason));
            }
            continue;
        }
        for diagnostic in outcome.diagnostics() {
            push_diagnostic(&mut out, diagnostic);
        }
    }

    let total = report.outcomes().len();
    let failed = report.failure_count();
    let noun = if total == 1 { "file" } else { "files" };
    let _ = write!(out, "built {} of {total} {noun}", total - failed);
    if failed > 0 {
        let _ = write!(out, ", {failed} failed");
    }
    out.push('\n');
    out
}

/// Renders a build report as pretty JSON.
///
/// # Errors
///
/// Returns an error when the report cannot be serialised.
pub fn render_build_report_json(report: &BuildReport) -> Result<String, serde_json::Error> {
    let mut rendered = serde_json::to_string_pretty(report)?;
    rendered.push('\n');
    Ok(rendered)
}

/// Renders a clean report for human eyes: removed paths, then a summary.
#[must_use]
pub fn render_clean_report(report: &CleanReport) -> String {
    let mut out = String::new();
    for path in report.removed() {
        let _ = writeln!(out, "removed {path}");
    }
    let count = report.removed().len();
    let noun = if count == 1 {
        "build product"
    } else {
        "build products"
    };
    let _ = writeln!(out, "removed {count} {noun}");
    out
}

/// Renders a clean report as pretty JSON.
///
/// # Errors
///
/// Returns an error when the report cannot be serialised.
pub fn render_clean_report_json(report: &CleanReport) -> Result<String, serde_json::Error> {
    let mut rendered = serde_json::to_string_pretty(report)?;
    rendered.push('\n');
    Ok(rendered)
}

/// Renders a batch launch for human eyes: the compiler's own output, then a
/// status note when it failed.
#[must_use]
pub fn render_launch_result(result: &ProcessResult) -> String {
    let mut out = String::new();
    for line in result.stdout() {
        let _ = writeln!(out, "{line}");
    }
    for line in result.stderr() {
        let _ = writeln!(out, "{line}");
    }
    if !result.success() {
        let _ = writeln!(out, "compiler exited with status {}", result.status());
    }
    out
}

/// Renders a batch launch as pretty JSON.
///
/// # Errors
///
/// Returns an error when the captured streams cannot be serialised.
pub fn render_launch_result_json(result: &ProcessResult) -> Result<String, serde_json::Error> {
    let payload = json!({
        "status": result.status(),
        "stdout": result.stdout(),
        "stderr": result.stderr(),
    });
    let mut rendered = serde_json::to_string_pretty(&payload)?;
    rendered.push('\n');
    Ok(rendered)
}

/// One diagnostic: a `file:line:` headline plus indented continuation lines.
fn push_diagnostic(out: &mut String, diagnostic: &Diagnostic) {
    let mut lines = diagnostic.message().lines();
    let first = lines.next().unwrap_or_default();
    let location = diagnostic.line().map_or_else(
        || diagnostic.file().to_string(),
        |line| format!("{}:{line}", diagnostic.file()),
    );
    let _ = writeln!(out, "{location}: {first}");
    for continuation in lines {
        let _ = writeln!(out, "  {continuation}");
    }
}

/// Failure note for files without extractable diagnostics.
fn reason_text(reason: &FailureReason) -> String {
    match reason {
        FailureReason::ToolReported { status } => {
            format!("compiler exited with status {status}")
        }
        FailureReason::UnrecognisedOutput { status } => {
            format!("compiler exited with status {status} with unrecognised output")
        }
        FailureReason::Invocation { message } => message.clone(),
    }
}
