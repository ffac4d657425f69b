//! Compiler command construction.
//!
//! A [`BuildTarget`] fixes where a single grammar source is compiled from and
//! where its output lands; [`compile_command`] turns a target into the
//! concrete [`CommandSpec`] handed to the process executor. Specs are built
//! fresh per target and never mutated afterwards.

use camino::{Utf8Path, Utf8PathBuf};

use gfbuild_config::{OutputLayout, Settings};

/// An external command ready to be spawned: program, ordered arguments, and
/// the directory to run in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: Utf8PathBuf,
    args: Vec<String>,
    working_dir: Utf8PathBuf,
}

impl CommandSpec {
    /// Creates a spec with no arguments.
    #[must_use]
    pub fn new(program: impl Into<Utf8PathBuf>, working_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: working_dir.into(),
        }
    }

    /// Appends a single argument.
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends a sequence of arguments.
    #[must_use]
    pub fn with_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Returns the program to spawn.
    #[must_use]
    pub fn program(&self) -> &Utf8Path {
        self.program.as_path()
    }

    /// Returns the ordered argument list.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Returns the directory the command runs in.
    #[must_use]
    pub fn working_dir(&self) -> &Utf8Path {
        self.working_dir.as_path()
    }
}

/// Where a single grammar source is compiled from and where its output lands.
///
/// Created on classification, consumed by command construction, not
/// persisted. The working directory is the source's parent so the compiler
/// resolves sibling modules; the output directory follows the configured
/// [`OutputLayout`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTarget {
    source: Utf8PathBuf,
    file_name: String,
    working_dir: Utf8PathBuf,
    output_dir: Utf8PathBuf,
    tags_file: Utf8PathBuf,
}

impl BuildTarget {
    /// Derives the target for a grammar source under the given settings.
    ///
    /// Returns `None` when the path has no final component to compile.
    #[must_use]
    pub fn for_source(source: &Utf8Path, settings: &Settings) -> Option<Self> {
        let file_name = source.file_name()?.to_owned();
        let working_dir = match source.parent() {
            Some(parent) if !parent.as_str().is_empty() => parent.to_path_buf(),
            _ => Utf8PathBuf::from("."),
        };
        let build_dir = working_dir.join(settings.build_dir_name());
        let output_dir = match settings.output_layout() {
            OutputLayout::FlatTags => build_dir,
            OutputLayout::PerModuleFolder => {
                let module = source.file_stem().unwrap_or(file_name.as_str());
                build_dir.join(module)
            }
        };
        let tags_file = output_dir.join(format!("{file_name}-tags"));
        Some(Self {
            source: source.to_path_buf(),
            file_name,
            working_dir,
            output_dir,
            tags_file,
        })
    }

    /// Returns the grammar source path.
    #[must_use]
    pub fn source(&self) -> &Utf8Path {
        self.source.as_path()
    }

    /// Returns the source file name passed to the compiler.
    #[must_use]
    pub const fn file_name(&self) -> &str {
        self.file_name.as_str()
    }

    /// Returns the directory the compiler runs in.
    #[must_use]
    pub fn working_dir(&self) -> &Utf8Path {
        self.working_dir.as_path()
    }

    /// Returns the directory generated output is written to.
    #[must_use]
    pub fn output_dir(&self) -> &Utf8Path {
        self.output_dir.as_path()
    }

    /// Returns the path of the tags file the compiler produces.
    #[must_use]
    pub fn tags_file(&self) -> &Utf8Path {
        self.tags_file.as_path()
    }
}

/// Builds the tags-extraction command for a target.
///
/// The shape is `gf --quiet --tags --output-dir=<dir> [--gf-lib-path=<lib>]
/// <file>`, run in the source's parent directory.
#[must_use]
pub fn compile_command(
    compiler: &Utf8Path,
    library_path: Option<&Utf8Path>,
    target: &BuildTarget,
) -> CommandSpec {
    let mut spec = CommandSpec::new(compiler, target.working_dir())
        .with_arg("--quiet")
        .with_arg("--tags")
        .with_arg(format!("--output-dir={}", target.output_dir()));
    if let Some(library) = library_path {
        spec = spec.with_arg(format!("--gf-lib-path={library}"));
    }
    spec.with_arg(target.file_name())
}
