//! Integration tests for the Starlight compiler: fixtures, the driver and the binary

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use starlight::backend::Target;
use starlight::compiler::{self, UnitReport};
use starlight::diagnostics::{DiagnosticKind, LineIndex};
use starlight::{CompilerConfig, compile_source};

fn fixture(kind: &str, name: &str) -> PathBuf {
    Path::new("tests/fixtures").join(kind).join(format!("{name}.sl"))
}

fn front_end(path: &Path) -> (String, Vec<starlight::diagnostics::Diagnostic>) {
    let source = fs::read_to_string(path).unwrap();
    let compilation = compile_source("t", &source, &CompilerConfig::default()).unwrap();
    (source, compilation.diagnostics)
}

fn count(diags: &[starlight::diagnostics::Diagnostic], kind: DiagnosticKind) -> usize {
    diags.iter().filter(|d| d.kind == kind).count()
}

/// Test that all valid fixtures pass the front end without errors
#[test]
fn test_valid_fixtures() {
    for entry in fs::read_dir("tests/fixtures/valid").unwrap() {
        let path = entry.unwrap().path();
        let (_, diags) = front_end(&path);
        assert!(
            !diags.iter().any(|d| d.is_error()),
            "Expected {} to compile successfully, got: {diags:#?}",
            path.display()
        );
    }
}

/// Test that invalid fixtures produce errors
#[test]
fn test_invalid_fixtures() {
    for entry in fs::read_dir("tests/fixtures/invalid").unwrap() {
        let path = entry.unwrap().path();
        let (_, diags) = front_end(&path);
        assert!(
            diags.iter().any(|d| d.is_error()),
            "Expected {} to fail compilation, but it succeeded",
            path.display()
        );
    }
}

#[test]
fn test_unresolved_identifier_location() {
    let (source, diags) = front_end(&fixture("invalid", "unresolved"));
    assert_eq!(count(&diags, DiagnosticKind::UnresolvedIdentifier), 1, "{diags:#?}");
    let unresolved = diags
        .iter()
        .find(|d| d.kind == DiagnosticKind::UnresolvedIdentifier)
        .unwrap();
    assert_eq!(LineIndex::new(&source).line_col(unresolved.span.start), (3, 17));
}

#[test]
fn test_duplicate_declaration_reported_once() {
    let (_, diags) = front_end(&fixture("invalid", "duplicate"));
    assert_eq!(count(&diags, DiagnosticKind::DuplicateDeclaration), 1, "{diags:#?}");
}

#[test]
fn test_arity_mismatch_does_not_hide_siblings() {
    let (_, diags) = front_end(&fixture("invalid", "arity"));
    assert_eq!(count(&diags, DiagnosticKind::ArityMismatch), 1, "{diags:#?}");
    assert_eq!(count(&diags, DiagnosticKind::TypeMismatch), 1, "{diags:#?}");
}

#[test]
fn test_syntax_errors_stop_before_resolution() {
    let (_, diags) = front_end(&fixture("invalid", "syntax"));
    assert!(count(&diags, DiagnosticKind::ParseError) >= 1, "{diags:#?}");
    assert_eq!(count(&diags, DiagnosticKind::UnresolvedIdentifier), 0);
}

#[test]
fn test_diagnostics_are_ordered_within_a_stage() {
    let source = "fun main() {\n    println(b)\n    println(a)\n}\n";
    let diags = compile_source("t", source, &CompilerConfig::default()).unwrap().diagnostics;
    let starts: Vec<usize> = diags.iter().map(|d| d.span.start).collect();
    let mut sorted = starts.clone();
    sorted.sort_unstable();
    assert_eq!(starts.len(), 2);
    assert_eq!(starts, sorted);
}

#[test]
fn test_lex_errors_are_ordered_by_position() {
    // The open interpolation on line 1 is only detected at end of input.
    let mut diags = starlight::diagnostics::Diagnostics::new();
    starlight::lexer::tokenize("val s = \"a${x\nval t = #\n", &mut diags);
    let starts: Vec<usize> = diags.iter().map(|d| d.span.start).collect();
    assert_eq!(starts.len(), 2, "{diags:#?}");
    assert!(starts.windows(2).all(|w| w[0] <= w[1]), "{starts:?}");
    assert_eq!(diags.as_slice()[0].message, "unterminated string interpolation");
}

// ============================================================================
// Driver
// ============================================================================

fn compile_into(dir: &Path, files: &[PathBuf], targets: &[Target]) -> Vec<UnitReport> {
    let config = CompilerConfig::new()
        .with_targets(targets.iter().copied())
        .with_output_dir(dir);
    compiler::compile_files(files, &config)
        .unwrap()
        .into_iter()
        .map(|r| r.unwrap())
        .collect()
}

#[test]
fn test_greet_end_to_end() {
    let out = tempfile::tempdir().unwrap();
    let reports = compile_into(out.path(), &[fixture("valid", "greet")], &[Target::Jvm, Target::Js]);
    assert!(!reports[0].has_errors());
    assert_eq!(reports[0].written.len(), 2);

    let java = fs::read_to_string(out.path().join("greet.java")).unwrap();
    assert!(java.contains("public static String greet(String name) {"), "{java}");
    assert!(java.contains("return (\"Hello, \" + name);"), "{java}");

    let js = fs::read_to_string(out.path().join("greet.js")).unwrap();
    assert!(js.contains("function greet(name) {"), "{js}");
}

#[test]
fn test_failed_unit_writes_nothing() {
    let out = tempfile::tempdir().unwrap();
    let reports = compile_into(
        out.path(),
        &[fixture("invalid", "unresolved"), fixture("valid", "point")],
        &[Target::Jvm],
    );
    assert!(reports[0].has_errors());
    assert!(reports[0].written.is_empty());
    assert!(!out.path().join("unresolved.java").exists());
    // The sibling unit is unaffected.
    assert!(!reports[1].has_errors());
    assert!(out.path().join("point.java").exists());
}

// ============================================================================
// Binary
// ============================================================================

fn starlight(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_starlight"))
        .args(args)
        .output()
        .expect("failed to run starlight")
}

#[test]
fn test_cli_build_success() {
    let out = tempfile::tempdir().unwrap();
    let dir = out.path().to_str().unwrap();
    let output = starlight(&["build", "tests/fixtures/valid/greet.sl", "--target", "js", "-o", dir]);
    assert_eq!(output.status.code(), Some(0), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(out.path().join("greet.js").exists());
}

#[test]
fn test_cli_build_failure_exit_code() {
    let out = tempfile::tempdir().unwrap();
    let dir = out.path().to_str().unwrap();
    let output = starlight(&["build", "tests/fixtures/invalid/unresolved.sl", "-t", "jvm", "-o", dir]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("tests/fixtures/invalid/unresolved.sl:3:17: error[E0004]"),
        "{stderr}"
    );
    assert!(!out.path().join("unresolved.java").exists());
}

#[test]
fn test_cli_missing_file_is_usage_error() {
    let output = starlight(&["check", "tests/fixtures/does_not_exist.sl"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_cli_check_json_diagnostics() {
    let output = starlight(&["check", "tests/fixtures/invalid/duplicate.sl", "--format", "json"]);
    assert_eq!(output.status.code(), Some(1));
    let json: serde_json::Value = serde_json::from_slice(&output.stderr[..json_end(&output.stderr)]).unwrap();
    assert_eq!(json[0]["code"], "E0003");
    assert_eq!(json[0]["kind"], "duplicate declaration");
}

/// Length of the leading JSON array in `stderr` (the summary line follows it).
fn json_end(stderr: &[u8]) -> usize {
    let text = String::from_utf8_lossy(stderr);
    text.find("\n]").map(|i| i + 2).unwrap_or(text.len())
}

#[test]
fn test_cli_tokens_dump() {
    let output = starlight(&["--tokens", "tests/fixtures/valid/greet.sl"]);
    assert_eq!(output.status.code(), Some(0));
    let tokens: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(tokens[0]["lexeme"], "fun");
    assert_eq!(tokens[0]["line"], 1);
    assert_eq!(tokens.last().unwrap()["kind"], "eof");
}

#[test]
fn test_cli_ast_dump_is_json() {
    let output = starlight(&["ast", "tests/fixtures/valid/point.sl"]);
    assert_eq!(output.status.code(), Some(0));
    let ast: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(ast["declarations"].as_array().is_some_and(|d| d.len() == 2), "{ast}");
}
