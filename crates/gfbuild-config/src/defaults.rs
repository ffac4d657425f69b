//! Built-in defaults shared by the engine and the binaries.

use crate::logging::LogFormat;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// File extension of compilable grammar sources, without the leading dot.
pub const DEFAULT_SOURCE_EXTENSION: &str = "gf";

/// Name of the per-project directory holding generated build output.
pub const DEFAULT_BUILD_DIR_NAME: &str = ".gfbuild";

/// Default log filter expression used by the binaries.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
#[must_use]
pub fn default_log_format() -> LogFormat {
    LogFormat::default()
}

/// Default grammar source extension.
#[must_use]
pub fn default_source_extension() -> String {
    DEFAULT_SOURCE_EXTENSION.to_owned()
}

/// Default build output directory name.
#[must_use]
pub fn default_build_dir_name() -> String {
    DEFAULT_BUILD_DIR_NAME.to_owned()
}

/// Directories skipped during traversal in addition to the build directory.
#[must_use]
pub fn default_excluded_dirs() -> Vec<String> {
    Vec::new()
}

/// Whether change-driven builds are upgraded to full passes.
///
/// Grammar scoping is cross-file, so rebuilding only the changed files can
/// leave stale tags for their dependents. Callers that understand their
/// dependency graph may opt out.
#[must_use]
pub fn default_prefer_full_build() -> bool {
    true
}
