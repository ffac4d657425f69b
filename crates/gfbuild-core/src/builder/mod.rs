//! Build orchestration over grammar sources.
//!
//! [`Builder`] drives the compiler over a project: full passes walk the
//! tree for eligible sources, incremental passes take a caller-supplied
//! change set, and both funnel through the same per-file path. One bad
//! file never aborts a pass; its failure is captured in the report and
//! the pass moves on. Only a missing compiler path or cancellation stops
//! a pass outright.

use std::collections::HashMap;
use std::fs;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use gfbuild_config::{OutputLayout, Settings};
use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::command::{self, BuildTarget};
use crate::diagnostic::Diagnostic;
use crate::error::{BuildError, InvokeError};
use crate::ledger::DirtyLedger;
use crate::process::{CancelToken, CompilerExecutor};
use crate::source::{ClassifierRules, SourceEntry, eligible_files};
use crate::stderr::{DEFAULT_TOOL_NAME, StderrParser, StderrShape};

/// Tracing target for build orchestration.
const BUILDER_TARGET: &str = "gfbuild_core::builder";

/// Suffix of the side-files the compiler leaves in the output directory.
const TAGS_SUFFIX: &str = "-tags";

/// Why a file failed to build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// The compiler exited nonzero and its stderr was understood.
    ToolReported {
        /// Exit status of the compiler.
        status: i32,
    },
    /// The compiler exited nonzero and said nothing recognisable.
    UnrecognisedOutput {
        /// Exit status of the compiler.
        status: i32,
    },
    /// The compiler could not be invoked for this file at all.
    Invocation {
        /// Human-readable explanation.
        message: String,
    },
}

/// Per-file outcome of a build pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    file: Utf8PathBuf,
    succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<FailureReason>,
    diagnostics: Vec<Diagnostic>,
}

impl FileOutcome {
    fn success(file: Utf8PathBuf) -> Self {
        Self {
            file,
            succeeded: true,
            reason: None,
            diagnostics: Vec::new(),
        }
    }

    fn failure(file: Utf8PathBuf, reason: FailureReason, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            file,
            succeeded: false,
            reason: Some(reason),
            diagnostics,
        }
    }

    /// Source file this outcome describes.
    #[must_use]
    pub fn file(&self) -> &Utf8Path {
        &self.file
    }

    /// Whether the compiler exited zero.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.succeeded
    }

    /// Failure classification, absent on success.
    #[must_use]
    pub const fn reason(&self) -> Option<&FailureReason> {
        self.reason.as_ref()
    }

    /// Diagnostics extracted from the compiler's stderr.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

/// Everything a build pass did, in visit order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    outcomes: Vec<FileOutcome>,
}

impl BuildReport {
    fn push(&mut self, outcome: FileOutcome) {
        self.outcomes.push(outcome);
    }

    /// Per-file outcomes in the order the files were visited.
    #[must_use]
    pub fn outcomes(&self) -> &[FileOutcome] {
        &self.outcomes
    }

    /// Whether every visited file built cleanly.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.outcomes.iter().all(FileOutcome::succeeded)
    }

    /// Number of files that failed to build.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| !outcome.succeeded())
            .count()
    }
}

/// Side-files and folders removed by a clean pass, sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanReport {
    removed: Vec<Utf8PathBuf>,
}

impl CleanReport {
    /// Paths removed from the build directories.
    #[must_use]
    pub fn removed(&self) -> &[Utf8PathBuf] {
        &self.removed
    }
}

/// Orchestrates compiler runs over a project's sources.
///
/// The executor is a type parameter so tests can script outcomes; the
/// ledger is shared so several builders in one process agree on which
/// files have been through a build.
#[derive(Debug)]
pub struct Builder<E> {
    settings: Settings,
    executor: E,
    ledger: Arc<DirtyLedger>,
    parser: StderrParser,
    diagnostics: HashMap<Utf8PathBuf, Vec<Diagnostic>>,
}

impl<E> Builder<E> {
    /// Creates a builder with its own private ledger.
    #[must_use]
    pub fn new(settings: Settings, executor: E) -> Self {
        let parser = StderrParser::new(DEFAULT_TOOL_NAME, settings.source_extension());
        Self {
            settings,
            executor,
            ledger: Arc::new(DirtyLedger::default()),
            parser,
            diagnostics: HashMap::new(),
        }
    }

    /// Shares an existing ledger instead of the private one.
    #[must_use]
    pub fn with_ledger(mut self, ledger: Arc<DirtyLedger>) -> Self {
        self.ledger = ledger;
        self
    }

    /// The settings this builder was created with.
    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The shared dirty ledger.
    #[must_use]
    pub fn ledger(&self) -> &DirtyLedger {
        &self.ledger
    }

    /// Diagnostics recorded for a file by its most recent build.
    #[must_use]
    pub fn diagnostics_for(&self, file: &Utf8Path) -> &[Diagnostic] {
        self.diagnostics.get(file).map_or(&[], Vec::as_slice)
    }

    fn require_compiler(&self) -> Result<Utf8PathBuf, BuildError> {
        self.settings
            .compiler_path()
            .map(Utf8Path::to_owned)
            .ok_or(BuildError::CompilerPathUnset)
    }
}

impl<E: CompilerExecutor> Builder<E> {
    /// Builds every eligible source under `root`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::CompilerPathUnset`] before any traversal when
    /// no compiler is configured, and [`BuildError::Cancelled`] when the
    /// token flips between files; ledger entries and diagnostics recorded
    /// up to that point are kept.
    pub fn full_build(
        &mut self,
        root: &Utf8Path,
        cancel: &CancelToken,
    ) -> Result<BuildReport, BuildError> {
        let compiler = self.require_compiler()?;
        let rules = ClassifierRules::from_settings(&self.settings);
        let sources: Vec<SourceEntry> = eligible_files(root, &rules).collect();
        info!(
            target: BUILDER_TARGET,
            root = %root,
            files = sources.len(),
            "starting full build"
        );

        let mut report = BuildReport::default();
        for entry in &sources {
            if cancel.is_cancelled() {
                info!(target: BUILDER_TARGET, "build cancelled");
                return Err(BuildError::Cancelled);
            }
            report.push(self.build_file(&compiler, entry.path(), cancel)?);
        }

        info!(
            target: BUILDER_TARGET,
            files = report.outcomes().len(),
            failures = report.failure_count(),
            "full build finished"
        );
        Ok(report)
    }

    /// Builds the buildable subset of a caller-supplied change set.
    ///
    /// Changed paths that are not buildable sources (wrong extension,
    /// excluded directory, deleted since the change was noticed) are
    /// skipped with a debug log.
    ///
    /// # Errors
    ///
    /// Same contract as [`Builder::full_build`].
    pub fn incremental_build(
        &mut self,
        changed: &[Utf8PathBuf],
        cancel: &CancelToken,
    ) -> Result<BuildReport, BuildError> {
        let compiler = self.require_compiler()?;
        let rules = ClassifierRules::from_settings(&self.settings);
        info!(
            target: BUILDER_TARGET,
            changed = changed.len(),
            "starting incremental build"
        );

        let mut report = BuildReport::default();
        for path in changed {
            if cancel.is_cancelled() {
                info!(target: BUILDER_TARGET, "build cancelled");
                return Err(BuildError::Cancelled);
            }
            if !SourceEntry::new(path.clone()).is_buildable(&rules) {
                debug!(
                    target: BUILDER_TARGET,
                    file = %path,
                    "skipping change that is not a buildable source"
                );
                continue;
            }
            report.push(self.build_file(&compiler, path, cancel)?);
        }

        info!(
            target: BUILDER_TARGET,
            files = report.outcomes().len(),
            failures = report.failure_count(),
            "incremental build finished"
        );
        Ok(report)
    }

    /// Builds a single source file.
    ///
    /// # Errors
    ///
    /// Same contract as [`Builder::full_build`].
    pub fn build_one(
        &mut self,
        source: &Utf8Path,
        cancel: &CancelToken,
    ) -> Result<FileOutcome, BuildError> {
        let compiler = self.require_compiler()?;
        if cancel.is_cancelled() {
            return Err(BuildError::Cancelled);
        }
        self.build_file(&compiler, source, cancel)
    }

    /// Per-file build path shared by every entry point.
    ///
    /// Clears previously recorded diagnostics, ensures the output
    /// directory, invokes the compiler, and records the outcome. The
    /// ledger entry is set dirty on success and failure alike; only
    /// cancellation leaves it untouched.
    fn build_file(
        &mut self,
        compiler: &Utf8Path,
        source: &Utf8Path,
        cancel: &CancelToken,
    ) -> Result<FileOutcome, BuildError> {
        self.diagnostics.remove(source);

        let Some(target) = BuildTarget::for_source(source, &self.settings) else {
            warn!(
                target: BUILDER_TARGET,
                source = %source,
                "source path has no file name, cannot build"
            );
            return Ok(self.record_failure(
                source,
                FailureReason::Invocation {
                    message: "source path has no file name".to_owned(),
                },
                Vec::new(),
            ));
        };

        self.clear_stale_module_folder(&target);
        if let Err(err) = fs::create_dir_all(target.output_dir().as_std_path()) {
            warn!(
                target: BUILDER_TARGET,
                source = %source,
                output_dir = %target.output_dir(),
                error = %err,
                "could not create output directory"
            );
            return Ok(self.record_failure(
                source,
                FailureReason::Invocation {
                    message: format!("could not create {}: {err}", target.output_dir()),
                },
                Vec::new(),
            ));
        }

        let spec = command::compile_command(compiler, self.settings.library_path(), &target);
        debug!(
            target: BUILDER_TARGET,
            source = %source,
            args = ?spec.args(),
            "invoking compiler"
        );

        match self.executor.run(&spec, cancel) {
            Ok(result) if result.success() => {
                debug!(target: BUILDER_TARGET, source = %source, "build succeeded");
                Ok(self.record_success(source))
            }
            Ok(result) => {
                let diagnostics = self.parser.parse(source, result.stderr());
                let reason = if diagnostics.is_empty() {
                    match self.parser.classify(result.stderr()) {
                        StderrShape::SyntaxOwnedElsewhere => FailureReason::ToolReported {
                            status: result.status(),
                        },
                        _ => FailureReason::UnrecognisedOutput {
                            status: result.status(),
                        },
                    }
                } else {
                    FailureReason::ToolReported {
                        status: result.status(),
                    }
                };
                debug!(
                    target: BUILDER_TARGET,
                    source = %source,
                    status = result.status(),
                    diagnostics = diagnostics.len(),
                    "build failed"
                );
                Ok(self.record_failure(source, reason, diagnostics))
            }
            Err(InvokeError::Cancelled) => Err(BuildError::Cancelled),
            Err(err) => {
                warn!(
                    target: BUILDER_TARGET,
                    source = %source,
                    error = %err,
                    "compiler invocation failed"
                );
                Ok(self.record_failure(
                    source,
                    FailureReason::Invocation {
                        message: err.to_string(),
                    },
                    Vec::new(),
                ))
            }
        }
    }

    /// Empties the per-module output folder before a legacy-layout build,
    /// so tags from renamed or deleted grammars do not survive a rebuild.
    fn clear_stale_module_folder(&self, target: &BuildTarget) {
        if self.settings.output_layout() != OutputLayout::PerModuleFolder {
            return;
        }
        if let Err(err) = fs::remove_dir_all(target.output_dir().as_std_path()) {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    target: BUILDER_TARGET,
                    output_dir = %target.output_dir(),
                    error = %err,
                    "could not clear stale module folder"
                );
            }
        }
    }

    fn record_success(&self, source: &Utf8Path) -> FileOutcome {
        self.ledger.mark_dirty(source);
        FileOutcome::success(source.to_owned())
    }

    fn record_failure(
        &mut self,
        source: &Utf8Path,
        reason: FailureReason,
        diagnostics: Vec<Diagnostic>,
    ) -> FileOutcome {
        self.ledger.mark_dirty(source);
        if !diagnostics.is_empty() {
            self.diagnostics
                .insert(source.to_owned(), diagnostics.clone());
        }
        FileOutcome::failure(source.to_owned(), reason, diagnostics)
    }
}

impl<E> Builder<E> {
    /// Deletes generated side-files under `root` per the active layout and
    /// clears all recorded diagnostics.
    ///
    /// Never invokes the compiler. Deletion and traversal failures are
    /// logged at warn and skipped, so a locked file cannot wedge the pass.
    ///
    /// # Errors
    ///
    /// None today; the signature matches the build entry points.
    pub fn clean(&mut self, root: &Utf8Path) -> Result<CleanReport, BuildError> {
        let build_dirs = self.find_build_dirs(root);
        info!(
            target: BUILDER_TARGET,
            root = %root,
            build_dirs = build_dirs.len(),
            "starting clean"
        );

        let mut removed = Vec::new();
        for dir in &build_dirs {
            self.clean_build_dir(dir, &mut removed);
        }
        removed.sort();

        self.diagnostics.clear();
        info!(
            target: BUILDER_TARGET,
            removed = removed.len(),
            "clean finished"
        );
        Ok(CleanReport { removed })
    }

    /// Collects every directory under `root` named like the build folder.
    fn find_build_dirs(&self, root: &Utf8Path) -> Vec<Utf8PathBuf> {
        let name = self.settings.build_dir_name();
        WalkDir::new(root.as_std_path())
            .into_iter()
            .filter_map(|result| match result {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!(
                        target: BUILDER_TARGET,
                        error = %err,
                        "skipping unreadable entry during clean"
                    );
                    None
                }
            })
            .filter(|entry| entry.file_type().is_dir())
            .filter(|entry| entry.file_name().to_str() == Some(name))
            .filter_map(|entry| match Utf8PathBuf::from_path_buf(entry.into_path()) {
                Ok(path) => Some(path),
                Err(path) => {
                    warn!(
                        target: BUILDER_TARGET,
                        path = %path.display(),
                        "skipping non-UTF-8 build directory"
                    );
                    None
                }
            })
            .collect()
    }

    /// Removes one build directory's generated content per the layout.
    fn clean_build_dir(&self, dir: &Utf8Path, removed: &mut Vec<Utf8PathBuf>) {
        let entries = match dir.read_dir_utf8() {
            Ok(entries) => entries,
            Err(err) => {
                warn!(
                    target: BUILDER_TARGET,
                    dir = %dir,
                    error = %err,
                    "could not list build directory"
                );
                return;
            }
        };

        for result in entries {
            let Ok(entry) = result else {
                warn!(target: BUILDER_TARGET, dir = %dir, "skipping unreadable build entry");
                continue;
            };
            let path = entry.path();
            let deleted = match self.settings.output_layout() {
                OutputLayout::FlatTags => {
                    if path.is_file()
                        && path
                            .file_name()
                            .is_some_and(|file_name| file_name.ends_with(TAGS_SUFFIX))
                    {
                        fs::remove_file(path.as_std_path()).map(|()| true)
                    } else {
                        Ok(false)
                    }
                }
                OutputLayout::PerModuleFolder => {
                    if path.is_dir() {
                        fs::remove_dir_all(path.as_std_path()).map(|()| true)
                    } else {
                        Ok(false)
                    }
                }
            };
            match deleted {
                Ok(true) => {
                    debug!(target: BUILDER_TARGET, path = %path, "removed generated output");
                    removed.push(path.to_owned());
                }
                Ok(false) => {}
                Err(err) => {
                    warn!(
                        target: BUILDER_TARGET,
                        path = %path,
                        error = %err,
                        "could not remove generated output"
                    );
                }
            }
        }
    }
}
