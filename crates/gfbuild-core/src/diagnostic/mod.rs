//! Structured diagnostics extracted from compiler output.
//!
//! The compiler reports failures as free text on stderr. The stderr parser
//! turns that text into [`Diagnostic`] records anchored to the grammar source
//! that was being compiled, with an optional 1-based line number when the
//! output carried one. Downstream consumers (problem markers, CLI rendering)
//! work from these records and never see the raw stream.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// A single problem reported against a grammar source.
///
/// # Example
///
/// ```
/// use camino::Utf8PathBuf;
/// use gfbuild_core::diagnostic::{Diagnostic, Severity};
///
/// let diagnostic = Diagnostic::new(
///     Severity::Error,
///     Utf8PathBuf::from("/project/HelloEng.gf"),
///     "constant not found: Gender",
/// )
/// .with_line(9);
/// assert_eq!(diagnostic.line(), Some(9));
/// assert_eq!(diagnostic.file(), "/project/HelloEng.gf");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Diagnostic {
    severity: Severity,
    file: Utf8PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    line: Option<u32>,
    message: String,
}

impl Diagnostic {
    /// Creates a diagnostic against the given source file.
    #[must_use]
    pub fn new(severity: Severity, file: impl Into<Utf8PathBuf>, message: impl Into<String>) -> Self {
        Self {
            severity,
            file: file.into(),
            line: None,
            message: message.into(),
        }
    }

    /// Attaches a 1-based line number.
    #[must_use]
    pub const fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    /// Returns the severity level.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    /// Returns the source file the diagnostic is anchored to.
    #[must_use]
    pub fn file(&self) -> &Utf8Path {
        self.file.as_path()
    }

    /// Returns the 1-based line number, when the output carried one.
    #[must_use]
    pub const fn line(&self) -> Option<u32> {
        self.line
    }

    /// Returns the message text. May span multiple lines.
    #[must_use]
    pub const fn message(&self) -> &str {
        self.message.as_str()
    }
}

/// Severity level for extracted diagnostics.
///
/// Compiler failures always surface as [`Severity::Error`]; the warning level
/// exists for embedders that publish their own advisory records alongside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// A failure that stopped the compiler.
    Error,
    /// A non-fatal advisory.
    Warning,
}

#[cfg(test)]
mod tests;
