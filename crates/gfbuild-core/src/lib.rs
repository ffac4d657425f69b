//! Incremental build orchestration for Grammatical Framework grammars.
//!
//! The crate walks a project tree for `.gf` sources, drives the external
//! `gf` compiler over them one at a time, and turns the compiler's stderr
//! into structured [`Diagnostic`] values. Passes are cooperative: a shared
//! [`CancelToken`] stops a pass between files and kills a running compiler.
//! Every build attempt, successful or not, is recorded in a process-wide
//! [`DirtyLedger`] so downstream tooling knows which build products may be
//! stale.
//!
//! The compiler is reached through the [`CompilerExecutor`] trait;
//! production code uses [`ProcessExecutor`], tests script outcomes.
//!
//! ```no_run
//! use camino::Utf8Path;
//! use gfbuild_config::Settings;
//! use gfbuild_core::{Builder, CancelToken, ProcessExecutor};
//!
//! # fn main() -> Result<(), gfbuild_core::BuildError> {
//! let settings = Settings::default().with_compiler_path("/usr/bin/gf");
//! let mut builder = Builder::new(settings, ProcessExecutor::new());
//! let report = builder.full_build(Utf8Path::new("."), &CancelToken::new())?;
//! println!("built {} files", report.outcomes().len());
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod command;
pub mod diagnostic;
pub mod error;
pub mod launch;
pub mod ledger;
pub mod process;
pub mod source;
pub mod stderr;

pub use builder::{BuildReport, Builder, CleanReport, FailureReason, FileOutcome};
pub use command::{BuildTarget, CommandSpec, compile_command};
pub use diagnostic::{Diagnostic, Severity};
pub use error::{BuildError, InvokeError, LaunchError};
pub use launch::{LaunchSpec, launch};
pub use ledger::DirtyLedger;
pub use process::{CancelToken, CompilerExecutor, ProcessExecutor, ProcessResult};
pub use source::{ClassifierRules, SourceEntry, eligible_files};
pub use stderr::{StderrParser, StderrShape};

#[cfg(test)]
mod tests;
