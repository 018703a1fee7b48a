//! Golden snapshot tests for code generation
//!
//! These tests compile `.sl` fixtures for each target and compare the output against stored
//! snapshots. This ensures codegen changes are reviewed and intentional.
//!
//! Run with: `cargo test --test codegen_snapshot_tests`
//! Review changes: `cargo insta review`

use std::fs;

use starlight::backend::Target;
use starlight::{CompilerConfig, compile_source};

/// Load a fixture from `tests/fixtures/valid`.
fn load_fixture(name: &str) -> String {
    let path = format!("tests/fixtures/valid/{name}.sl");
    fs::read_to_string(&path).unwrap_or_else(|_| panic!("Failed to read fixture: {path}"))
}

/// Generate `target` source for a fixture, failing on any diagnostic error.
fn generate(name: &str, target: Target) -> String {
    let config = CompilerConfig::new().with_target(target);
    let compilation = compile_source(name, &load_fixture(name), &config).expect("source within limits");
    assert!(
        !compilation.has_errors(),
        "{name} failed to compile: {:#?}",
        compilation.diagnostics
    );
    compilation.output(target).expect("output generated").text.clone()
}

#[test]
fn test_greet_jvm() {
    insta::assert_snapshot!("greet_jvm", generate("greet", Target::Jvm));
}

#[test]
fn test_greet_js() {
    insta::assert_snapshot!("greet_js", generate("greet", Target::Js));
}

#[test]
fn test_data_class_jvm() {
    insta::assert_snapshot!("point_jvm", generate("point", Target::Jvm));
}

#[test]
fn test_data_class_js() {
    insta::assert_snapshot!("point_js", generate("point", Target::Js));
}

#[test]
fn test_match_lowering_jvm() {
    insta::assert_snapshot!("matching_jvm", generate("matching", Target::Jvm));
}

#[test]
fn test_match_lowering_js() {
    insta::assert_snapshot!("matching_js", generate("matching", Target::Js));
}

#[test]
fn test_comprehension_and_template_jvm() {
    insta::assert_snapshot!("comprehension_jvm", generate("comprehension", Target::Jvm));
}

#[test]
fn test_comprehension_and_template_js() {
    insta::assert_snapshot!("comprehension_js", generate("comprehension", Target::Js));
}

// ============================================================================
// Fixtures without stored snapshots: generation must succeed on both targets
// ============================================================================

#[test]
fn test_every_valid_fixture_generates() {
    for entry in fs::read_dir("tests/fixtures/valid").unwrap() {
        let path = entry.unwrap().path();
        if path.extension().is_none_or(|e| e != "sl") {
            continue;
        }
        let name = path.file_stem().unwrap().to_str().unwrap().to_string();
        for target in [Target::Jvm, Target::Js] {
            let text = generate(&name, target);
            assert!(!text.is_empty(), "{name} produced no {target} output");
        }
    }
}

#[test]
fn test_shapes_match_lowering() {
    let java = generate("shapes", Target::Jvm);
    assert!(java.contains("instanceof Circle"), "{java}");
    assert!(java.contains("\"big circle\""), "{java}");

    let js = generate("shapes", Target::Js);
    assert!(js.contains("instanceof Circle"), "{js}");
    assert!(js.contains("(() => {"), "{js}");
}
