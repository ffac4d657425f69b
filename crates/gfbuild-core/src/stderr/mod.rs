//! Classification of GF compiler stderr into diagnostics.
//!
//! The compiler reports failures on stderr in a handful of layouts. The
//! parser inspects the first non-empty line, applies an ordered set of
//! patterns, and either produces a single [`Diagnostic`] or deliberately
//! produces none. Anything unrecognised is logged and suppressed rather
//! than surfaced as a malformed diagnostic; a build must never fall over
//! because the compiler changed its wording.
//!
//! Positioned syntax errors (`<file>.gf:<line>:<column>`) are suppressed
//! outright: the editor-side checker that runs on every save already owns
//! those, and duplicating them here would double-report every typo.

use camino::Utf8Path;
use gfbuild_config::DEFAULT_SOURCE_EXTENSION;
use tracing::debug;

use crate::diagnostic::{Diagnostic, Severity};

/// Tracing target for stderr classification.
const STDERR_TARGET: &str = "gfbuild_core::stderr";

/// Prefix the GF binary puts on its own runtime failure reports.
pub const DEFAULT_TOOL_NAME: &str = "gf";

/// Opening words of the compiler's missing-dependency report.
const MISSING_FILE_PREFIX: &str = "File ";

/// Closing words of the compiler's missing-dependency report.
const MISSING_FILE_SUFFIX: &str = " does not exist.";

/// The recognised layout of a captured stderr stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StderrShape {
    /// A positioned syntax error that another reporting channel owns.
    SyntaxOwnedElsewhere,
    /// The tool itself failed before or outside compilation proper.
    ToolFailure {
        /// Text after the tool-name prefix on the first line.
        message: String,
    },
    /// A dependency module could not be found on the search path.
    MissingDependency {
        /// The first line with any search-path lines appended.
        message: String,
    },
    /// A compile failure reported against a source line.
    LocatedFailure {
        /// One-based source line the compiler blamed.
        line: u32,
        /// The explanation lines joined with newlines.
        message: String,
    },
    /// Nothing matched; callers log and move on.
    Unrecognised,
}

/// Parses compiler stderr into diagnostics.
///
/// # Example
///
/// ```
/// use camino::Utf8Path;
/// use gfbuild_core::stderr::StderrParser;
///
/// let parser = StderrParser::default();
/// let lines = vec![
///     "HelloEng.gf:9:".to_owned(),
///     "   constant not found: Gender".to_owned(),
/// ];
/// let diagnostics = parser.parse(Utf8Path::new("HelloEng.gf"), &lines);
/// assert_eq!(diagnostics.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StderrParser {
    position_marker: String,
    tool_prefix: String,
}

impl StderrParser {
    /// Creates a parser for the given tool name and source extension.
    ///
    /// `tool_name` is the prefix the tool uses when reporting its own
    /// failures (`gf: ...`); `source_extension` is the extension, without
    /// the dot, that position patterns are keyed on.
    #[must_use]
    pub fn new(tool_name: &str, source_extension: &str) -> Self {
        Self {
            position_marker: format!(".{source_extension}:"),
            tool_prefix: format!("{tool_name}: "),
        }
    }

    /// Classifies captured stderr without producing diagnostics.
    #[must_use]
    pub fn classify(&self, lines: &[String]) -> StderrShape {
        self.classify_significant(&significant_lines(lines))
    }

    /// Parses captured stderr into diagnostics attached to `source`.
    ///
    /// An empty stream yields an empty vector. Suppressed and unrecognised
    /// shapes also yield an empty vector; unrecognised input is logged at
    /// debug level with the raw lines.
    #[must_use]
    pub fn parse(&self, source: &Utf8Path, lines: &[String]) -> Vec<Diagnostic> {
        let significant = significant_lines(lines);
        if significant.is_empty() {
            return Vec::new();
        }

        match self.classify_significant(&significant) {
            StderrShape::SyntaxOwnedElsewhere => {
                debug!(
                    target: STDERR_TARGET,
                    source = %source,
                    "suppressing positioned syntax error owned by the editor checker"
                );
                Vec::new()
            }
            StderrShape::ToolFailure { message } | StderrShape::MissingDependency { message } => {
                vec![Diagnostic::new(Severity::Error, source.to_owned(), message)]
            }
            StderrShape::LocatedFailure { line, message } => {
                vec![Diagnostic::new(Severity::Error, source.to_owned(), message).with_line(line)]
            }
            StderrShape::Unrecognised => {
                debug!(
                    target: STDERR_TARGET,
                    source = %source,
                    lines = ?lines,
                    "unrecognised compiler stderr"
                );
                Vec::new()
            }
        }
    }

    /// Ordered first-match dispatch over the first significant line.
    fn classify_significant(&self, significant: &[&str]) -> StderrShape {
        let Some((&first, rest)) = significant.split_first() else {
            return StderrShape::Unrecognised;
        };

        let marker_suffix = first
            .find(&self.position_marker)
            .and_then(|index| first.get(index + self.position_marker.len()..));

        if marker_suffix.is_some_and(is_position_suffix) {
            return StderrShape::SyntaxOwnedElsewhere;
        }

        if let Some(message) = first.strip_prefix(&self.tool_prefix) {
            return StderrShape::ToolFailure {
                message: message.to_owned(),
            };
        }

        if first.starts_with(MISSING_FILE_PREFIX) && first.ends_with(MISSING_FILE_SUFFIX) {
            return StderrShape::MissingDependency {
                message: join_first_and_rest(first, rest),
            };
        }

        if let Some(line) = marker_suffix.and_then(parse_trailing_line) {
            return StderrShape::LocatedFailure {
                line,
                message: rest.join("\n"),
            };
        }

        StderrShape::Unrecognised
    }
}

impl Default for StderrParser {
    /// A parser for the stock `gf` binary over `.gf` sources.
    fn default() -> Self {
        Self::new(DEFAULT_TOOL_NAME, DEFAULT_SOURCE_EXTENSION)
    }
}

/// Strips line terminators and discards blank lines.
fn significant_lines(lines: &[String]) -> Vec<&str> {
    lines
        .iter()
        .map(|line| line.trim_end_matches(['\n', '\r']))
        .filter(|line| !line.trim().is_empty())
        .collect()
}

/// Whether a post-marker suffix is `<digits>:<digits>` with optional
/// trailing content after a further colon.
fn is_position_suffix(suffix: &str) -> bool {
    let Some((line, after)) = suffix.split_once(':') else {
        return false;
    };
    if !is_digits(line) {
        return false;
    }
    match after.split_once(':') {
        Some((column, _trailing)) => is_digits(column),
        None => is_digits(after),
    }
}

/// Parses `<digits>:` or `<digits>-<digits>:` with nothing after the final
/// colon, yielding the first number.
fn parse_trailing_line(suffix: &str) -> Option<u32> {
    let body = suffix.strip_suffix(':')?;
    if body.contains(':') {
        return None;
    }
    let first = match body.split_once('-') {
        Some((start, end)) if is_digits(start) && is_digits(end) => start,
        None if is_digits(body) => body,
        _ => return None,
    };
    first.parse().ok()
}

fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|byte| byte.is_ascii_digit())
}

fn join_first_and_rest(first: &str, rest: &[&str]) -> String {
    if rest.is_empty() {
        first.to_owned()
    } else {
        format!("{first}\n{}", rest.join("\n"))
    }
}
