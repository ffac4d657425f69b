//! Shared configuration surface for the GF build tooling.
//!
//! The `gfbuild-config` crate owns the settings consumed by both the build
//! engine and the `gfbuild` binary: where the GF compiler lives, where the
//! standard library lives, how build output is laid out on disk, and how the
//! binaries log. The CLI layers environment variables and command-line flags
//! on top of the built-in defaults; library embedders construct [`Settings`]
//! directly through the builder methods.
//!
//! # Example
//!
//! ```
//! use gfbuild_config::{OutputLayout, Settings};
//!
//! let settings = Settings::default()
//!     .with_compiler_path("/usr/bin/gf")
//!     .with_output_layout(OutputLayout::FlatTags);
//! assert_eq!(settings.source_extension(), "gf");
//! assert!(settings.compiler_path().is_some());
//! ```

pub mod defaults;
pub mod layout;
pub mod logging;
pub mod settings;

pub use self::defaults::{
    DEFAULT_BUILD_DIR_NAME, DEFAULT_LOG_FILTER, DEFAULT_SOURCE_EXTENSION, default_build_dir_name,
    default_log_filter, default_log_filter_string, default_log_format, default_source_extension,
};
pub use self::layout::{OutputLayout, OutputLayoutParseError};
pub use self::logging::{LogFormat, LogFormatParseError};
pub use self::settings::Settings;
