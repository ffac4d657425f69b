//! Build output layout selection.
//!
//! The compiler writes one tags file per grammar source. Two on-disk
//! arrangements are supported: a single flat build directory per project, and
//! the older arrangement with one folder per grammar module. The layout
//! decides where compile output lands and what a clean pass removes.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// On-disk arrangement of generated build output.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum OutputLayout {
    /// One build directory per project; tags files are named after their
    /// source (`HelloEng.gf-tags`).
    #[default]
    FlatTags,
    /// One folder per grammar module inside the build directory. Kept for
    /// trees produced by older tooling.
    PerModuleFolder,
}

/// Errors encountered while parsing an [`OutputLayout`] from text.
pub type OutputLayoutParseError = strum::ParseError;
