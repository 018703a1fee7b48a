//! Layering guardrails for the workspace crates.
//!
//! The syntax frontend (`starlight_syntax`) and the vocabulary crate (`starlight_core`) must stay
//! usable without the compiler driver: they may not depend on the root `starlight` crate, on the
//! async runtime or on the CLI stack. These tests scan the member manifests and sources and fail
//! if such an edge appears.

use std::fs;
use std::path::Path;

/// Crate names listed in the `[dependencies]` table of a manifest.
fn dependencies(manifest: &str) -> Vec<String> {
    table_entries(manifest, "[dependencies]")
}

/// Keys listed in the `table` section of a manifest.
fn table_entries(manifest: &str, table: &str) -> Vec<String> {
    let mut in_dependencies = false;
    let mut names = Vec::new();

    for raw_line in manifest.lines() {
        let line = raw_line.trim();
        if line.starts_with('[') {
            in_dependencies = line == table;
            continue;
        }
        if !in_dependencies || line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line_no_comment = line.split('#').next().unwrap_or("").trim();
        if let Some((name, _)) = line_no_comment.split_once('=') {
            names.push(name.trim().to_string());
        }
    }
    names
}

fn assert_no_forbidden(manifest: &str, crate_name: &str, forbidden: &[&str]) {
    for dep in dependencies(manifest) {
        assert!(
            !forbidden.contains(&dep.as_str()),
            "`{dep}` must not appear in [dependencies] of {crate_name}"
        );
    }
}

fn scan_sources(dir: &Path, needle: &str, offenders: &mut Vec<String>) {
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            scan_sources(&path, needle, offenders);
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            let text = fs::read_to_string(&path).unwrap();
            for (i, line) in text.lines().enumerate() {
                if line.contains(needle) {
                    offenders.push(format!("{}:{}: {}", path.display(), i + 1, line.trim()));
                }
            }
        }
    }
}

#[test]
fn syntax_crate_does_not_depend_on_driver_stack() {
    let manifest = include_str!("../crates/starlight_syntax/Cargo.toml");
    assert_no_forbidden(manifest, "starlight_syntax", &["starlight", "tokio", "clap", "tracing-subscriber"]);
    assert!(dependencies(manifest).contains(&"starlight_core".to_string()));
}

#[test]
fn core_crate_stays_leaf() {
    let manifest = include_str!("../crates/starlight_core/Cargo.toml");
    assert_no_forbidden(
        manifest,
        "starlight_core",
        &["starlight", "starlight_syntax", "tokio", "clap", "miette"],
    );
}

#[test]
fn frontend_sources_do_not_reach_into_backends() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let mut offenders = Vec::new();
    scan_sources(&root.join("crates/starlight_syntax/src"), "backend::", &mut offenders);
    scan_sources(&root.join("src/frontend"), "crate::backend", &mut offenders);
    assert!(offenders.is_empty(), "frontend code refers to a backend:\n{}", offenders.join("\n"));
}

#[test]
fn diagnostic_rendering_stack_lives_in_the_syntax_crate() {
    let root = include_str!("../Cargo.toml");
    assert!(!dependencies(root).contains(&"miette".to_string()), "the root crate renders through starlight_syntax");
    let syntax = include_str!("../crates/starlight_syntax/Cargo.toml");
    assert!(dependencies(syntax).contains(&"miette".to_string()));
    assert!(table_entries(syntax, "[dev-dependencies]").is_empty());
}

#[test]
fn dependency_scan_reads_only_the_dependencies_table() {
    let manifest = "[package]\nname = \"x\"\n\n[dependencies]\nserde = \"1\" # json\n# tokio = \"1\"\n\n[dev-dependencies]\nproptest = \"1\"\n";
    assert_eq!(dependencies(manifest), vec!["serde".to_string()]);
    assert_eq!(table_entries(manifest, "[dev-dependencies]"), vec!["proptest".to_string()]);
}
