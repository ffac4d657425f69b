//! Behaviour tests for the command line surface.
//!
//! Each test drives [`run`] with substituted IO streams, so parsing, policy,
//! and rendering are exercised without spawning the binary. Compiler
//! invocations point at a path that cannot exist; the per-file outcomes still
//! record every attempt, which is enough to observe build policy.

#![expect(
    clippy::expect_used,
    reason = "harness output must parse before assertions can run"
)]

use std::fs;

use rstest::rstest;
use serde_json::Value;
use tempfile::TempDir;

use super::*;

fn run_cli(args: &[&str]) -> (ExitCode, String, String) {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let code = run(
        args.iter().map(OsString::from),
        &mut stdout,
        &mut stderr,
        false,
    );
    (
        code,
        String::from_utf8(stdout).expect("stdout utf8"),
        String::from_utf8(stderr).expect("stderr utf8"),
    )
}

fn parse_cli(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).expect("parse args")
}

fn utf8_root(dir: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 temp path")
}

fn write_grammar(root: &Utf8Path, name: &str) -> Utf8PathBuf {
    let path = root.join(name);
    fs::write(path.as_std_path(), "abstract Hello = { cat S ; } ;\n").expect("write grammar");
    path
}

// --- argument parsing ---

#[test]
fn help_prints_usage_on_stdout() {
    let (code, stdout, stderr) = run_cli(&["gfbuild", "--help"]);
    assert_eq!(code, ExitCode::SUCCESS);
    assert!(stdout.contains("Usage"), "expected usage text: {stdout}");
    assert!(stderr.is_empty());
}

#[test]
fn version_prints_on_stdout() {
    let (code, stdout, _stderr) = run_cli(&["gfbuild", "--version"]);
    assert_eq!(code, ExitCode::SUCCESS);
    assert!(stdout.contains("gfbuild"));
}

#[test]
fn unknown_flags_fail_with_a_parse_error() {
    let (code, stdout, stderr) = run_cli(&["gfbuild", "--frobnicate", "build"]);
    assert_eq!(code, ExitCode::FAILURE);
    assert!(stdout.is_empty());
    assert!(stderr.contains("unexpected argument"));
}

#[test]
fn run_requires_at_least_one_file() {
    let (code, _stdout, stderr) = run_cli(&["gfbuild", "run"]);
    assert_eq!(code, ExitCode::FAILURE);
    assert!(stderr.contains("required"));
}

#[test]
fn flags_layer_onto_default_settings() {
    let cli = parse_cli(&[
        "gfbuild",
        "--compiler-path",
        "/opt/gf/bin/gf",
        "--exclude",
        "vendor,dist",
        "--timeout-secs",
        "30",
        "--log-format",
        "json",
        "build",
    ]);
    let settings = settings_from_cli(&cli);

    assert_eq!(settings.compiler_path(), Some(Utf8Path::new("/opt/gf/bin/gf")));
    assert_eq!(settings.excluded_dirs(), ["vendor", "dist"]);
    assert_eq!(settings.timeout_secs(), Some(30));
    assert_eq!(settings.log_format(), LogFormat::Json);
}

// --- build command ---

#[test]
fn an_empty_tree_builds_cleanly() {
    let dir = TempDir::new().expect("temp dir");
    let root = utf8_root(&dir);

    let (code, stdout, _stderr) = run_cli(&[
        "gfbuild",
        "--compiler-path",
        "/nonexistent/gf",
        "--output",
        "human",
        "build",
        "--root",
        root.as_str(),
    ]);

    assert_eq!(code, ExitCode::SUCCESS);
    assert_eq!(stdout, "built 0 of 0 files\n");
}

#[test]
fn build_reports_a_missing_compiler_binary_per_file() {
    let dir = TempDir::new().expect("temp dir");
    let root = utf8_root(&dir);
    write_grammar(&root, "HelloEng.gf");

    let (code, stdout, _stderr) = run_cli(&[
        "gfbuild",
        "--compiler-path",
        "/nonexistent/gf",
        "--output",
        "json",
        "build",
        "--root",
        root.as_str(),
    ]);

    assert_eq!(code, ExitCode::FAILURE);
    let value: Value = serde_json::from_str(&stdout).expect("parse report");
    let outcomes = value["outcomes"].as_array().expect("outcomes array");
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0]["succeeded"], false);
    assert_eq!(outcomes[0]["reason"]["kind"], "invocation");
}

// --- build policy ---

fn outcome_count(stdout: &str) -> usize {
    let value: Value = serde_json::from_str(stdout).expect("parse report");
    value["outcomes"].as_array().expect("outcomes array").len()
}

#[test]
fn change_sets_upgrade_to_full_builds_by_default() {
    let dir = TempDir::new().expect("temp dir");
    let root = utf8_root(&dir);
    let changed = write_grammar(&root, "HelloEng.gf");
    write_grammar(&root, "HelloSwe.gf");

    let (_code, stdout, _stderr) = run_cli(&[
        "gfbuild",
        "--compiler-path",
        "/nonexistent/gf",
        "--output",
        "json",
        "build",
        "--root",
        root.as_str(),
        "--changed",
        changed.as_str(),
    ]);

    assert_eq!(outcome_count(&stdout), 2);
}

#[test]
fn incremental_flag_limits_the_pass_to_changes() {
    let dir = TempDir::new().expect("temp dir");
    let root = utf8_root(&dir);
    let changed = write_grammar(&root, "HelloEng.gf");
    write_grammar(&root, "HelloSwe.gf");

    let (_code, stdout, _stderr) = run_cli(&[
        "gfbuild",
        "--compiler-path",
        "/nonexistent/gf",
        "--output",
        "json",
        "build",
        "--root",
        root.as_str(),
        "--changed",
        changed.as_str(),
        "--incremental",
    ]);

    assert_eq!(outcome_count(&stdout), 1);
}

#[test]
fn disabling_full_build_preference_honours_change_sets() {
    let dir = TempDir::new().expect("temp dir");
    let root = utf8_root(&dir);
    let changed = write_grammar(&root, "HelloEng.gf");
    write_grammar(&root, "HelloSwe.gf");

    let (_code, stdout, _stderr) = run_cli(&[
        "gfbuild",
        "--compiler-path",
        "/nonexistent/gf",
        "--prefer-full-build",
        "false",
        "--output",
        "json",
        "build",
        "--root",
        root.as_str(),
        "--changed",
        changed.as_str(),
    ]);

    assert_eq!(outcome_count(&stdout), 1);
}

// --- clean command ---

#[test]
fn clean_removes_tags_and_reports_them() {
    let dir = TempDir::new().expect("temp dir");
    let root = utf8_root(&dir);
    let build_dir = root.join(".gfbuild");
    fs::create_dir_all(build_dir.as_std_path()).expect("create build dir");
    let tags = build_dir.join("HelloEng.gf-tags");
    fs::write(tags.as_std_path(), "tags").expect("write tags");

    let (code, stdout, _stderr) = run_cli(&[
        "gfbuild",
        "--output",
        "json",
        "clean",
        "--root",
        root.as_str(),
    ]);

    assert_eq!(code, ExitCode::SUCCESS);
    assert!(!tags.as_std_path().exists());
    let value: Value = serde_json::from_str(&stdout).expect("parse report");
    assert_eq!(value["removed"][0], tags.as_str());
}

// --- exit codes ---

#[rstest]
#[case(0, ExitCode::SUCCESS)]
#[case(17, ExitCode::from(17))]
#[case(-1, ExitCode::FAILURE)]
#[case(300, ExitCode::FAILURE)]
fn maps_child_statuses_onto_exit_codes(#[case] status: i32, #[case] expected: ExitCode) {
    assert_eq!(exit_code_from_status(status), expected);
}

#[test]
fn cancelled_failures_exit_with_the_interrupt_code() {
    let build = AppError::from(BuildError::Cancelled);
    let launch = AppError::from(LaunchError::Invoke(InvokeError::Cancelled));
    assert_eq!(build.exit_code(), ExitCode::from(INTERRUPTED_EXIT));
    assert_eq!(launch.exit_code(), ExitCode::from(INTERRUPTED_EXIT));
    assert_eq!(
        AppError::from(LaunchError::NoFiles).exit_code(),
        ExitCode::FAILURE
    );
}
