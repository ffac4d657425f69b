//! Shared test doubles and an end-to-end pass over a real source tree.

#![expect(clippy::expect_used, reason = "poisoned executor locks must surface as panics")]

use std::collections::VecDeque;
use std::fs;
use std::sync::{Arc, Mutex};

use camino::{Utf8Path, Utf8PathBuf};
use gfbuild_config::Settings;
use tempfile::TempDir;

use crate::builder::Builder;
use crate::command::CommandSpec;
use crate::error::InvokeError;
use crate::process::{CancelToken, CompilerExecutor, ProcessResult};

/// One scripted executor outcome.
pub(crate) type ScriptedOutcome = Result<ProcessResult, InvokeError>;

/// A successful, silent invocation.
pub(crate) fn exit_ok() -> ScriptedOutcome {
    Ok(ProcessResult::new(0, Vec::new(), Vec::new()))
}

/// A failing invocation with the given stderr lines.
pub(crate) fn exit_with_stderr(status: i32, stderr: &[&str]) -> ScriptedOutcome {
    Ok(ProcessResult::new(
        status,
        Vec::new(),
        stderr.iter().map(|line| (*line).to_owned()).collect(),
    ))
}

/// Executor that replays scripted outcomes and records every command.
///
/// Clones share the script and the recording, so a test can keep a probe
/// while the builder owns the executor. Once the script runs out the
/// executor keeps succeeding, so tests only script the interesting prefix.
#[derive(Clone, Default)]
pub(crate) struct ScriptedExecutor {
    script: Arc<Mutex<VecDeque<ScriptedOutcome>>>,
    commands: Arc<Mutex<Vec<CommandSpec>>>,
}

impl ScriptedExecutor {
    pub(crate) fn new(outcomes: impl IntoIterator<Item = ScriptedOutcome>) -> Self {
        Self {
            script: Arc::new(Mutex::new(outcomes.into_iter().collect())),
            commands: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// An executor whose every invocation succeeds silently.
    pub(crate) fn succeeding() -> Self {
        Self::default()
    }

    /// The commands run so far, in order.
    pub(crate) fn commands(&self) -> Vec<CommandSpec> {
        self.commands.lock().expect("commands lock").clone()
    }
}

impl CompilerExecutor for ScriptedExecutor {
    fn run(&self, spec: &CommandSpec, cancel: &CancelToken) -> Result<ProcessResult, InvokeError> {
        if cancel.is_cancelled() {
            return Err(InvokeError::Cancelled);
        }
        self.commands
            .lock()
            .expect("commands lock")
            .push(spec.clone());
        self.script
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or_else(exit_ok)
    }
}

/// Executor that flips the cancel token once its run allowance is spent.
#[derive(Clone)]
pub(crate) struct CancellingExecutor {
    allowance: Arc<Mutex<usize>>,
    runs: Arc<Mutex<usize>>,
}

impl CancellingExecutor {
    /// Succeeds for `allowed_runs` invocations, cancelling on the last one.
    pub(crate) fn after(allowed_runs: usize) -> Self {
        Self {
            allowance: Arc::new(Mutex::new(allowed_runs)),
            runs: Arc::new(Mutex::new(0)),
        }
    }

    /// Number of invocations that actually ran.
    pub(crate) fn runs(&self) -> usize {
        *self.runs.lock().expect("runs lock")
    }
}

impl CompilerExecutor for CancellingExecutor {
    fn run(&self, _spec: &CommandSpec, cancel: &CancelToken) -> Result<ProcessResult, InvokeError> {
        if cancel.is_cancelled() {
            return Err(InvokeError::Cancelled);
        }
        let mut allowance = self.allowance.lock().expect("allowance lock");
        if *allowance == 0 {
            cancel.cancel();
            return Err(InvokeError::Cancelled);
        }
        *allowance = allowance.saturating_sub(1);
        *self.runs.lock().expect("runs lock") += 1;
        if *allowance == 0 {
            cancel.cancel();
        }
        Ok(ProcessResult::new(0, Vec::new(), Vec::new()))
    }
}

/// Writes a minimal grammar module under `root`, creating parents.
pub(crate) fn write_source(root: &Utf8Path, relative: &str) -> Utf8PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent.as_std_path()).expect("create source parent");
    }
    fs::write(path.as_std_path(), "abstract Hello = { cat S ; } ;\n").expect("write source");
    path
}

/// UTF-8 view of a temp directory's root.
pub(crate) fn utf8_root(dir: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 temp path")
}

// --- end to end -----------------------------------------------------------

#[test]
fn full_build_pass_over_a_real_tree() {
    let dir = TempDir::new().expect("temp dir");
    let root = utf8_root(&dir);
    let hello = write_source(&root, "HelloEng.gf");
    let nested = write_source(&root, "nested/HelloSwe.gf");
    write_source(&root, "notes.txt");

    let settings = Settings::default().with_compiler_path("/usr/bin/gf");
    let executor = ScriptedExecutor::succeeding();
    let probe = executor.clone();
    let mut builder = Builder::new(settings, executor);

    let report = builder
        .full_build(&root, &CancelToken::new())
        .expect("full build");

    assert!(report.succeeded());
    assert_eq!(report.outcomes().len(), 2);
    assert!(builder.ledger().is_dirty(&hello));
    assert!(builder.ledger().is_dirty(&nested));
    assert!(root.join(".gfbuild").is_dir());
    assert!(root.join("nested/.gfbuild").is_dir());

    // Each invocation carries the canonical flags and runs in its own
    // source's directory.
    let commands = probe.commands();
    assert_eq!(commands.len(), 2);
    for command in &commands {
        assert_eq!(command.program(), "/usr/bin/gf");
        assert_eq!(command.args().first().map(String::as_str), Some("--quiet"));
        assert_eq!(command.args().get(1).map(String::as_str), Some("--tags"));
    }
    let mut working_dirs: Vec<_> = commands
        .iter()
        .map(|command| command.working_dir().to_owned())
        .collect();
    working_dirs.sort();
    let mut expected = vec![root.clone(), root.join("nested")];
    expected.sort();
    assert_eq!(working_dirs, expected);
}
