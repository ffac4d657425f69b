//! Settings consumed by the build engine and the `gfbuild` binary.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::defaults::{
    default_build_dir_name, default_excluded_dirs, default_log_filter_string, default_log_format,
    default_prefer_full_build, default_source_extension,
};
use crate::layout::OutputLayout;
use crate::logging::LogFormat;

/// Resolved configuration for build and launch operations.
///
/// Fields are private; construction starts from [`Settings::default`] and the
/// `with_*` builder methods layer overrides on top. The compiler path is the
/// only setting without a usable default: build and launch operations refuse
/// to run until one is supplied.
///
/// # Example
///
/// ```
/// use gfbuild_config::Settings;
///
/// let settings = Settings::default()
///     .with_compiler_path("/opt/gf/bin/gf")
///     .with_library_path("/opt/gf/lib");
/// assert_eq!(settings.build_dir_name(), ".gfbuild");
/// assert!(settings.prefer_full_build());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    compiler_path: Option<Utf8PathBuf>,
    library_path: Option<Utf8PathBuf>,
    source_extension: String,
    build_dir_name: String,
    excluded_dirs: Vec<String>,
    output_layout: OutputLayout,
    timeout_secs: Option<u64>,
    prefer_full_build: bool,
    log_filter: String,
    log_format: LogFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            compiler_path: None,
            library_path: None,
            source_extension: default_source_extension(),
            build_dir_name: default_build_dir_name(),
            excluded_dirs: default_excluded_dirs(),
            output_layout: OutputLayout::default(),
            timeout_secs: None,
            prefer_full_build: default_prefer_full_build(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Settings {
    /// Sets the path to the GF compiler binary.
    #[must_use]
    pub fn with_compiler_path(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.compiler_path = Some(path.into());
        self
    }

    /// Sets the path to the GF standard library.
    #[must_use]
    pub fn with_library_path(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.library_path = Some(path.into());
        self
    }

    /// Sets the grammar source extension (without the leading dot).
    #[must_use]
    pub fn with_source_extension(mut self, extension: impl Into<String>) -> Self {
        self.source_extension = extension.into();
        self
    }

    /// Sets the name of the build output directory.
    #[must_use]
    pub fn with_build_dir_name(mut self, name: impl Into<String>) -> Self {
        self.build_dir_name = name.into();
        self
    }

    /// Sets directory names excluded from traversal in addition to the build
    /// directory.
    #[must_use]
    pub fn with_excluded_dirs(mut self, dirs: Vec<String>) -> Self {
        self.excluded_dirs = dirs;
        self
    }

    /// Sets the build output layout.
    #[must_use]
    pub const fn with_output_layout(mut self, layout: OutputLayout) -> Self {
        self.output_layout = layout;
        self
    }

    /// Sets an upper bound, in seconds, on a single compiler invocation.
    #[must_use]
    pub const fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Sets whether change-driven builds are upgraded to full passes.
    #[must_use]
    pub const fn with_prefer_full_build(mut self, prefer: bool) -> Self {
        self.prefer_full_build = prefer;
        self
    }

    /// Sets the log filter expression.
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// Sets the log output format.
    #[must_use]
    pub const fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    /// Path to the GF compiler binary, when configured.
    #[must_use]
    pub fn compiler_path(&self) -> Option<&Utf8Path> {
        self.compiler_path.as_deref()
    }

    /// Path to the GF standard library, when configured.
    #[must_use]
    pub fn library_path(&self) -> Option<&Utf8Path> {
        self.library_path.as_deref()
    }

    /// Grammar source extension without the leading dot.
    #[must_use]
    pub const fn source_extension(&self) -> &str {
        self.source_extension.as_str()
    }

    /// Name of the build output directory.
    #[must_use]
    pub const fn build_dir_name(&self) -> &str {
        self.build_dir_name.as_str()
    }

    /// Directory names excluded from traversal in addition to the build
    /// directory.
    #[must_use]
    pub fn excluded_dirs(&self) -> &[String] {
        &self.excluded_dirs
    }

    /// Build output layout.
    #[must_use]
    pub const fn output_layout(&self) -> OutputLayout {
        self.output_layout
    }

    /// Upper bound, in seconds, on a single compiler invocation.
    #[must_use]
    pub const fn timeout_secs(&self) -> Option<u64> {
        self.timeout_secs
    }

    /// Whether change-driven builds are upgraded to full passes.
    #[must_use]
    pub const fn prefer_full_build(&self) -> bool {
        self.prefer_full_build
    }

    /// Log filter expression.
    #[must_use]
    pub const fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}
