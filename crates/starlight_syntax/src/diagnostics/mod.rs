//! Diagnostics and error reporting for Starlight
//!
//! Every stage reports problems into a [`Diagnostics`] collector that is created per compilation
//! unit and passed by `&mut` through the pipeline. Nothing here is global, so units compiled on
//! different threads never share diagnostic state.
//!
//! ## Ordering
//!
//! Diagnostics keep insertion order. A stage that may detect problems out of source order calls
//! [`Diagnostics::sort_stage`] before it returns, so within a stage diagnostics are ordered by
//! position while stage order (lexer, parser, resolver, checker, backend) is preserved.

mod render;

pub use render::{LineIndex, OutputFormat, render, render_json, render_plain, render_pretty};

use serde::Serialize;

use crate::ast::Span;

/// How serious a diagnostic is. Only errors fail a compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Diagnostic taxonomy. Each kind has a stable code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticKind {
    LexError,
    ParseError,
    DuplicateDeclaration,
    UnresolvedIdentifier,
    TypeMismatch,
    ArityMismatch,
    ImmutableAssignment,
    InvalidContext,
    InferenceFailure,
    UnsupportedConstruct,
    UnusedVariable,
}

impl DiagnosticKind {
    /// Stable diagnostic code (`E0001`, `W0001`, ...).
    pub fn code(self) -> &'static str {
        match self {
            DiagnosticKind::LexError => "E0001",
            DiagnosticKind::ParseError => "E0002",
            DiagnosticKind::DuplicateDeclaration => "E0003",
            DiagnosticKind::UnresolvedIdentifier => "E0004",
            DiagnosticKind::TypeMismatch => "E0005",
            DiagnosticKind::ArityMismatch => "E0006",
            DiagnosticKind::ImmutableAssignment => "E0007",
            DiagnosticKind::InvalidContext => "E0008",
            DiagnosticKind::InferenceFailure => "E0009",
            DiagnosticKind::UnsupportedConstruct => "E0010",
            DiagnosticKind::UnusedVariable => "W0001",
        }
    }

    pub fn default_severity(self) -> Severity {
        match self {
            DiagnosticKind::UnusedVariable => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DiagnosticKind::LexError => "lex error",
            DiagnosticKind::ParseError => "parse error",
            DiagnosticKind::DuplicateDeclaration => "duplicate declaration",
            DiagnosticKind::UnresolvedIdentifier => "unresolved identifier",
            DiagnosticKind::TypeMismatch => "type mismatch",
            DiagnosticKind::ArityMismatch => "arity mismatch",
            DiagnosticKind::ImmutableAssignment => "immutable assignment",
            DiagnosticKind::InvalidContext => "invalid context",
            DiagnosticKind::InferenceFailure => "inference failure",
            DiagnosticKind::UnsupportedConstruct => "unsupported construct",
            DiagnosticKind::UnusedVariable => "unused variable",
        };
        write!(f, "{name}")
    }
}

/// A problem found in a compilation unit, with location information.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
    pub span: Span,
    pub notes: Vec<String>,
    pub hints: Vec<String>,
    /// Secondary locations, e.g. the earlier declaration of a duplicate name.
    pub related: Vec<Related>,
}

/// A secondary location attached to a diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct Related {
    pub span: Span,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: kind.default_severity(),
            kind,
            message: message.into(),
            span,
            notes: Vec::new(),
            hints: Vec::new(),
            related: Vec::new(),
        }
    }

    pub fn lex(message: impl Into<String>, span: Span) -> Self {
        Self::new(DiagnosticKind::LexError, message, span)
    }

    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        Self::new(DiagnosticKind::ParseError, message, span)
    }

    pub fn type_mismatch(message: impl Into<String>, span: Span) -> Self {
        Self::new(DiagnosticKind::TypeMismatch, message, span)
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hints.push(hint.into());
        self
    }

    pub fn with_related(mut self, span: Span, message: impl Into<String>) -> Self {
        self.related.push(Related {
            span,
            message: message.into(),
        });
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Ordered, per-compilation collector of diagnostics.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.items.extend(diagnostics);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.items.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.items.len() - self.error_count()
    }

    /// Number of diagnostics of the given kind.
    pub fn count_of(&self, kind: DiagnosticKind) -> usize {
        self.items.iter().filter(|d| d.kind == kind).count()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }

    /// Stable-sort the diagnostics recorded since `mark` (a previous [`Diagnostics::len`]) by
    /// source position.
    pub fn sort_stage(&mut self, mark: usize) {
        let mark = mark.min(self.items.len());
        self.items[mark..].sort_by_key(|d| (d.span.start, d.span.end));
    }

    /// Turn every warning into an error.
    pub fn promote_warnings(&mut self) {
        for d in &mut self.items {
            d.severity = Severity::Error;
        }
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

// ============================================================================
// Error catalog: common diagnostics with consistent wording
// ============================================================================

/// Constructors for the diagnostics the semantic stages report, so wording stays consistent.
pub mod errors {
    use super::*;

    pub fn duplicate_declaration(name: &str, span: Span, previous: Span) -> Diagnostic {
        Diagnostic::new(
            DiagnosticKind::DuplicateDeclaration,
            format!("`{name}` is already declared in this scope"),
            span,
        )
        .with_related(previous, format!("`{name}` first declared here"))
        .with_hint("rename one of the declarations, or move one into a nested block to shadow it")
    }

    pub fn unresolved_identifier(name: &str, span: Span) -> Diagnostic {
        Diagnostic::new(
            DiagnosticKind::UnresolvedIdentifier,
            format!("cannot find `{name}` in this scope"),
            span,
        )
        .with_hint("did you forget to declare it with `val` or `var`?")
    }

    pub fn unresolved_type(name: &str, span: Span) -> Diagnostic {
        Diagnostic::new(DiagnosticKind::UnresolvedIdentifier, format!("unknown type `{name}`"), span)
    }

    pub fn unknown_member(type_name: &str, member: &str, span: Span) -> Diagnostic {
        Diagnostic::new(
            DiagnosticKind::UnresolvedIdentifier,
            format!("type `{type_name}` has no member `{member}`"),
            span,
        )
    }

    pub fn type_mismatch(expected: &str, found: &str, span: Span) -> Diagnostic {
        let d = Diagnostic::type_mismatch(format!("expected `{expected}`, found `{found}`"), span);
        if found.ends_with('?') && !expected.ends_with('?') {
            d.with_hint("the value may be null; check it first or assert with `!!`")
        } else {
            d
        }
    }

    pub fn arity_mismatch(callee: &str, expected: usize, found: usize, span: Span) -> Diagnostic {
        let plural = if expected == 1 { "" } else { "s" };
        let verb = if found == 1 { "was" } else { "were" };
        Diagnostic::new(
            DiagnosticKind::ArityMismatch,
            format!("`{callee}` takes {expected} argument{plural} but {found} {verb} supplied"),
            span,
        )
    }

    pub fn immutable_assignment(name: &str, span: Span) -> Diagnostic {
        Diagnostic::new(
            DiagnosticKind::ImmutableAssignment,
            format!("cannot assign twice to immutable binding `{name}`"),
            span,
        )
        .with_hint(format!("declare `{name}` with `var` to make it mutable"))
    }

    pub fn invalid_context(message: impl Into<String>, span: Span) -> Diagnostic {
        Diagnostic::new(DiagnosticKind::InvalidContext, message, span)
    }

    pub fn cannot_infer(what: &str, span: Span) -> Diagnostic {
        Diagnostic::new(
            DiagnosticKind::InferenceFailure,
            format!("cannot infer the type of {what}"),
            span,
        )
        .with_hint("add a type annotation to the enclosing declaration")
    }

    pub fn unused_variable(name: &str, span: Span) -> Diagnostic {
        Diagnostic::new(
            DiagnosticKind::UnusedVariable,
            format!("variable `{name}` is never used"),
            span,
        )
        .with_hint(format!("prefix it with an underscore: `_{name}`"))
    }

    pub fn unsupported(construct: &str, target: &str, span: Span) -> Diagnostic {
        Diagnostic::new(
            DiagnosticKind::UnsupportedConstruct,
            format!("{construct} is not supported by the {target} backend"),
            span,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_stage_only_sorts_tail() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::lex("late lex", Span::new(50, 51)));
        let mark = diags.len();
        diags.push(Diagnostic::syntax("b", Span::new(30, 31)));
        diags.push(Diagnostic::syntax("a", Span::new(10, 11)));
        diags.sort_stage(mark);
        let messages: Vec<_> = diags.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["late lex", "a", "b"]);
    }

    #[test]
    fn test_warnings_do_not_count_as_errors() {
        let mut diags = Diagnostics::new();
        diags.push(errors::unused_variable("x", Span::new(0, 1)));
        assert!(!diags.has_errors());
        assert_eq!(diags.warning_count(), 1);
        diags.promote_warnings();
        assert!(diags.has_errors());
    }

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(DiagnosticKind::UnresolvedIdentifier.code(), "E0004");
        assert_eq!(DiagnosticKind::UnusedVariable.code(), "W0001");
    }

    #[test]
    fn test_arity_message_agrees_in_number() {
        let span = Span::new(0, 1);
        assert_eq!(
            errors::arity_mismatch("g", 0, 1, span).message,
            "`g` takes 0 arguments but 1 was supplied"
        );
        assert_eq!(
            errors::arity_mismatch("f", 1, 2, span).message,
            "`f` takes 1 argument but 2 were supplied"
        );
    }
}
