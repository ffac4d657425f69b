//! Unit tests for source classification and traversal.

#![expect(clippy::expect_used, reason = "test helper uses expect for infallible filesystem setup")]

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use rstest::{fixture, rstest};
use tempfile::TempDir;

use super::*;
use gfbuild_config::Settings;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

#[fixture]
fn rules() -> ClassifierRules {
    ClassifierRules::new("gf").with_excluded_dirs(vec![String::from(".gfbuild")])
}

/// Builds a small project tree:
///
/// ```text
/// root/
///   HelloEng.gf
///   notes.txt
///   nested/HelloSwe.gf
///   .gfbuild/Stale.gf
///   vendor/Third.gf
/// ```
#[fixture]
fn project_tree() -> TempDir {
    let dir = TempDir::new().expect("create temp dir");
    let root = dir.path();
    fs::write(root.join("HelloEng.gf"), "abstract Hello = {}\n").expect("write source");
    fs::write(root.join("notes.txt"), "not a grammar\n").expect("write notes");
    fs::create_dir(root.join("nested")).expect("create nested");
    fs::write(root.join("nested").join("HelloSwe.gf"), "--\n").expect("write nested source");
    fs::create_dir(root.join(".gfbuild")).expect("create build dir");
    fs::write(root.join(".gfbuild").join("Stale.gf"), "--\n").expect("write stale source");
    fs::create_dir(root.join("vendor")).expect("create vendor");
    fs::write(root.join("vendor").join("Third.gf"), "--\n").expect("write vendored source");
    dir
}

fn utf8_root(dir: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 temp path")
}

fn collected_names(root: &Utf8Path, rules: &ClassifierRules) -> Vec<String> {
    let mut names: Vec<String> = eligible_files(root, rules)
        .filter_map(|entry| entry.file_name().map(str::to_owned))
        .collect();
    names.sort();
    names
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

#[rstest]
#[case("/p/HelloEng.gf", true)]
#[case("/p/HelloEng.gfh", false)]
#[case("/p/Makefile", false)]
#[case("/p/archive.gf.bak", false)]
fn extension_matching(rules: ClassifierRules, #[case] path: &str, #[case] expected: bool) {
    assert_eq!(rules.matches_extension(Utf8Path::new(path)), expected);
}

#[rstest]
fn excluded_component_is_detected(rules: ClassifierRules) {
    assert!(rules.crosses_excluded_dir(Utf8Path::new("/p/.gfbuild/HelloEng.gf")));
    assert!(!rules.crosses_excluded_dir(Utf8Path::new("/p/src/HelloEng.gf")));
}

#[rstest]
fn settings_rules_exclude_the_build_dir() {
    let settings = Settings::default().with_excluded_dirs(vec![String::from("vendor")]);
    let derived = ClassifierRules::from_settings(&settings);
    assert_eq!(derived.source_extension(), "gf");
    assert!(derived.is_excluded_dir_name(".gfbuild"));
    assert!(derived.is_excluded_dir_name("vendor"));
    assert!(!derived.is_excluded_dir_name("src"));
}

#[rstest]
fn directory_with_source_extension_is_not_buildable(rules: ClassifierRules, project_tree: TempDir) {
    let root = utf8_root(&project_tree);
    fs::create_dir(root.join("Odd.gf").as_std_path()).expect("create dir named like a source");
    assert!(!SourceEntry::new(root.join("Odd.gf")).is_buildable(&rules));
}

#[rstest]
fn missing_file_is_not_buildable(rules: ClassifierRules, project_tree: TempDir) {
    let root = utf8_root(&project_tree);
    assert!(!SourceEntry::new(root.join("Absent.gf")).is_buildable(&rules));
}

#[rstest]
fn regular_source_is_buildable(rules: ClassifierRules, project_tree: TempDir) {
    let root = utf8_root(&project_tree);
    assert!(SourceEntry::new(root.join("HelloEng.gf")).is_buildable(&rules));
    assert!(!SourceEntry::new(root.join("notes.txt")).is_buildable(&rules));
    assert!(!SourceEntry::new(root.join(".gfbuild").join("Stale.gf")).is_buildable(&rules));
}

// ---------------------------------------------------------------------------
// Traversal
// ---------------------------------------------------------------------------

#[rstest]
fn traversal_yields_sources_outside_excluded_dirs(rules: ClassifierRules, project_tree: TempDir) {
    let root = utf8_root(&project_tree);
    assert_eq!(
        collected_names(&root, &rules),
        ["HelloEng.gf", "HelloSwe.gf", "Third.gf"]
    );
}

#[rstest]
fn traversal_honours_extra_exclusions(project_tree: TempDir) {
    let rules = ClassifierRules::new("gf")
        .with_excluded_dirs(vec![String::from(".gfbuild"), String::from("vendor")]);
    let root = utf8_root(&project_tree);
    assert_eq!(collected_names(&root, &rules), ["HelloEng.gf", "HelloSwe.gf"]);
}

#[rstest]
fn traversal_of_missing_root_yields_nothing(rules: ClassifierRules) {
    let names = collected_names(Utf8Path::new("/nonexistent/gfbuild-test-root"), &rules);
    assert!(names.is_empty());
}
