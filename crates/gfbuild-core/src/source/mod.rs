//! Grammar source classification and project traversal.
//!
//! [`ClassifierRules`] decide whether a filesystem entry is a compilable
//! grammar source: it must be a regular file, carry the configured source
//! extension, and sit outside every excluded directory (the build output
//! directory plus any configured vendor directories). [`eligible_files`]
//! walks a project tree lazily and yields only the entries that pass those
//! rules, so traversal stays decoupled from building.

use camino::{Utf8Path, Utf8PathBuf};
use tracing::warn;
use walkdir::WalkDir;

use gfbuild_config::Settings;

/// Tracing target for classification and traversal.
const SOURCE_TARGET: &str = "gfbuild_core::source";

/// Rules deciding which filesystem entries are compilable grammar sources.
///
/// # Example
///
/// ```
/// use camino::Utf8Path;
/// use gfbuild_core::source::ClassifierRules;
///
/// let rules = ClassifierRules::new("gf");
/// assert!(rules.matches_extension(Utf8Path::new("/p/HelloEng.gf")));
/// assert!(!rules.matches_extension(Utf8Path::new("/p/notes.txt")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierRules {
    source_extension: String,
    excluded_dirs: Vec<String>,
}

impl ClassifierRules {
    /// Creates rules for the given source extension with no excluded
    /// directories.
    #[must_use]
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            source_extension: extension.into(),
            excluded_dirs: Vec::new(),
        }
    }

    /// Sets the directory names whose subtrees are never built.
    #[must_use]
    pub fn with_excluded_dirs(mut self, dirs: Vec<String>) -> Self {
        self.excluded_dirs = dirs;
        self
    }

    /// Derives rules from settings: the configured extension, with the build
    /// directory and the configured vendor directories excluded.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        let mut excluded_dirs = Vec::with_capacity(settings.excluded_dirs().len() + 1);
        excluded_dirs.push(settings.build_dir_name().to_owned());
        excluded_dirs.extend(settings.excluded_dirs().iter().cloned());
        Self {
            source_extension: settings.source_extension().to_owned(),
            excluded_dirs,
        }
    }

    /// The source extension these rules accept, without the leading dot.
    #[must_use]
    pub const fn source_extension(&self) -> &str {
        self.source_extension.as_str()
    }

    /// Directory names whose subtrees are never built.
    #[must_use]
    pub fn excluded_dirs(&self) -> &[String] {
        &self.excluded_dirs
    }

    /// Whether the path carries the configured source extension.
    ///
    /// Paths without an extension never match.
    #[must_use]
    pub fn matches_extension(&self, path: &Utf8Path) -> bool {
        path.extension() == Some(self.source_extension.as_str())
    }

    /// Whether the directory name is excluded from traversal.
    #[must_use]
    pub fn is_excluded_dir_name(&self, name: &str) -> bool {
        self.excluded_dirs.iter().any(|dir| dir == name)
    }

    /// Whether any component of the path names an excluded directory.
    #[must_use]
    pub fn crosses_excluded_dir(&self, path: &Utf8Path) -> bool {
        path.components()
            .any(|component| self.is_excluded_dir_name(component.as_str()))
    }
}

/// Immutable snapshot of a filesystem entry considered for building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    path: Utf8PathBuf,
}

impl SourceEntry {
    /// Creates a snapshot for the given path.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the entry's path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        self.path.as_path()
    }

    /// Consumes the entry and returns the owned path.
    #[must_use]
    pub fn into_path(self) -> Utf8PathBuf {
        self.path
    }

    /// Returns the final path component, when there is one.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name()
    }

    /// Whether the entry is a compilable grammar source under the given
    /// rules: a regular file with the configured extension outside every
    /// excluded directory. Unreadable metadata yields `false`, never an
    /// error.
    #[must_use]
    pub fn is_buildable(&self, rules: &ClassifierRules) -> bool {
        if !rules.matches_extension(&self.path) {
            return false;
        }
        if rules.crosses_excluded_dir(&self.path) {
            return false;
        }
        self.path.is_file()
    }
}

/// Walks `root` depth-first and yields the grammar sources eligible for
/// building.
///
/// Excluded directories are pruned without descending into them. Unreadable
/// entries and non-UTF-8 paths are logged and skipped; they never abort the
/// traversal. No ordering is guaranteed beyond directory-entry order.
pub fn eligible_files<'rules>(
    root: &Utf8Path,
    rules: &'rules ClassifierRules,
) -> impl Iterator<Item = SourceEntry> + 'rules {
    WalkDir::new(root.as_std_path())
        .into_iter()
        .filter_entry(move |entry| {
            !(entry.file_type().is_dir()
                && entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| rules.is_excluded_dir_name(name)))
        })
        .filter_map(|result| match result {
            Ok(entry) => Some(entry),
            Err(error) => {
                warn!(target: SOURCE_TARGET, %error, "skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| match Utf8PathBuf::from_path_buf(entry.into_path()) {
            Ok(path) => Some(path),
            Err(path) => {
                warn!(
                    target: SOURCE_TARGET,
                    path = %path.display(),
                    "skipping non-UTF-8 path"
                );
                None
            }
        })
        .filter(move |path| rules.matches_extension(path))
        .map(SourceEntry::new)
}

#[cfg(test)]
mod tests;
