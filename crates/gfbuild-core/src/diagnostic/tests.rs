//! Unit tests for diagnostic records.

#![expect(clippy::expect_used, reason = "serialising fixture diagnostics never fails")]

use camino::Utf8PathBuf;

use super::*;

#[test]
fn new_diagnostic_has_no_line() {
    let diagnostic = Diagnostic::new(
        Severity::Error,
        Utf8PathBuf::from("/p/HelloEng.gf"),
        "something went wrong",
    );
    assert_eq!(diagnostic.severity(), Severity::Error);
    assert_eq!(diagnostic.line(), None);
    assert_eq!(diagnostic.message(), "something went wrong");
}

#[test]
fn with_line_attaches_line_number() {
    let diagnostic =
        Diagnostic::new(Severity::Error, Utf8PathBuf::from("/p/HelloEng.gf"), "m").with_line(9);
    assert_eq!(diagnostic.line(), Some(9));
}

#[test]
fn serialisation_omits_absent_line() {
    let diagnostic = Diagnostic::new(
        Severity::Error,
        Utf8PathBuf::from("/p/HelloEng.gf"),
        "missing module",
    );
    let json = serde_json::to_value(&diagnostic).expect("serialise diagnostic");
    assert!(json.get("line").is_none());
    assert_eq!(
        json.get("severity").and_then(|v| v.as_str()),
        Some("error")
    );
}

#[test]
fn serialisation_round_trips_with_line() {
    let diagnostic = Diagnostic::new(
        Severity::Warning,
        Utf8PathBuf::from("/p/Hello.gf"),
        "advisory",
    )
    .with_line(3);
    let json = serde_json::to_string(&diagnostic).expect("serialise diagnostic");
    let restored: Diagnostic = serde_json::from_str(&json).expect("deserialise diagnostic");
    assert_eq!(restored, diagnostic);
}
