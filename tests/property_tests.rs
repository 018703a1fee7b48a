//! Property-based tests for the Starlight compiler
//!
//! These tests use proptest to verify invariants across many randomly
//! generated programs, catching edge cases that hand-written tests might miss.

use std::fs;

use proptest::prelude::*;
use starlight::diagnostics::Diagnostics;
use starlight::lexer::{self, Token};
use starlight::parser;
use starlight_core::lang::keywords;

// =============================================================================
// Helpers
// =============================================================================

/// Rebuild source from tokens, collapsing every run of whitespace to one space (or one line
/// break when the run contained one).
fn reconstruct(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut prev_end = None;
    for token in tokens {
        if let Some(end) = prev_end {
            if token.newline_before {
                out.push('\n');
            } else if token.span.start > end {
                out.push(' ');
            }
        }
        out.push_str(&token.lexeme);
        prev_end = Some(token.span.end);
    }
    out
}

fn assert_round_trip(source: &str) -> Result<(), TestCaseError> {
    let first = lexer::lex(source).map_err(|e| TestCaseError::fail(format!("lex failed: {e:?}")))?;
    let rebuilt = reconstruct(&first);
    let second = lexer::lex(&rebuilt).map_err(|e| TestCaseError::fail(format!("re-lex failed: {e:?}")))?;
    let kinds = |tokens: &[Token]| tokens.iter().map(|t| t.kind.clone()).collect::<Vec<_>>();
    prop_assert_eq!(kinds(&first), kinds(&second), "rebuilt source:\n{}", rebuilt);
    Ok(())
}

// =============================================================================
// Strategies
// =============================================================================

fn ident_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,6}".prop_filter("Not a keyword", |s| keywords::from_str(s).is_none())
}

fn expr_strategy() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        (0i64..10_000).prop_map(|n| n.to_string()),
        (0u32..1000, 0u32..100).prop_map(|(a, b)| format!("{a}.{b}")),
        ident_strategy(),
        "[a-zA-Z ,.!]{0,12}".prop_map(|s| format!("\"{s}\"")),
        Just("true".to_string()),
        Just("null".to_string()),
    ];
    leaf.prop_recursive(4, 24, 3, |inner| {
        prop_oneof![
            (inner.clone(), prop::sample::select(vec!["+", "-", "*", "/", "%", "==", "<", "&&", "||"]), inner.clone())
                .prop_map(|(l, op, r)| format!("({l} {op} {r})")),
            (ident_strategy(), prop::collection::vec(inner.clone(), 0..3))
                .prop_map(|(f, args)| format!("{f}({})", args.join(", "))),
            prop::collection::vec(inner.clone(), 0..4).prop_map(|items| format!("[{}]", items.join(", "))),
            (ident_strategy(), inner).prop_map(|(text, e)| format!("\"{text} ${{{e}}}!\"")),
        ]
    })
}

fn statement_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        (ident_strategy(), expr_strategy()).prop_map(|(name, e)| format!("val {name} = {e}")),
        (ident_strategy(), expr_strategy()).prop_map(|(name, e)| format!("var {name}: int = {e}")),
        expr_strategy().prop_map(|e| format!("println({e})")),
        (expr_strategy(), expr_strategy()).prop_map(|(c, e)| format!("if {c} {{\n    println({e})\n}}")),
    ]
}

fn program_strategy() -> impl Strategy<Value = String> {
    (
        ident_strategy(),
        prop::collection::vec(ident_strategy(), 0..3),
        prop::collection::vec(statement_strategy(), 0..6),
        expr_strategy(),
    )
        .prop_map(|(name, params, body, ret)| {
            let params: Vec<String> = params.iter().map(|p| format!("{p}: int")).collect();
            let body: Vec<String> = body.iter().map(|s| format!("    {}", s.replace('\n', "\n    "))).collect();
            format!(
                "fun {name}({}) {{\n{}\n    return {ret}\n}}\n",
                params.join(", "),
                body.join("\n")
            )
        })
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Property: re-lexing the whitespace-collapsed token text yields the same token kinds
    #[test]
    fn tokenization_round_trips(source in program_strategy()) {
        assert_round_trip(&source)?;
    }

    /// Property: parsing the same tokens twice yields the same tree
    #[test]
    fn parsing_is_deterministic(source in program_strategy()) {
        let tokens = lexer::lex(&source).map_err(|e| TestCaseError::fail(format!("lex failed: {e:?}")))?;
        let mut first_diags = Diagnostics::new();
        let first = parser::parse(&tokens, &mut first_diags);
        let mut second_diags = Diagnostics::new();
        let second = parser::parse(&tokens, &mut second_diags);
        prop_assert_eq!(first, second);
        prop_assert_eq!(first_diags.as_slice(), second_diags.as_slice());
    }

    /// Property: generated programs are syntactically valid
    #[test]
    fn generated_programs_parse(source in program_strategy()) {
        prop_assert!(parser::parse_source(&source).is_ok(), "failed to parse:\n{}", source);
    }

    /// Property: the front end never panics, whatever the input
    #[test]
    fn front_end_is_total(source in "\\PC{0,80}") {
        let config = starlight::CompilerConfig::default();
        let _ = starlight::compiler::check_source("fuzz", &source, &config);
    }
}

/// The fixed corpus round-trips too.
#[test]
fn fixtures_round_trip() {
    for dir in ["tests/fixtures/valid", "tests/fixtures/invalid"] {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            let source = fs::read_to_string(&path).unwrap();
            if lexer::lex(&source).is_err() {
                continue;
            }
            assert_round_trip(&source).unwrap_or_else(|e| panic!("{}: {e}", path.display()));
        }
    }
}
