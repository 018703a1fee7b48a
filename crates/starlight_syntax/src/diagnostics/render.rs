//! Rendering diagnostics for humans and tools.
//!
//! - [`render_plain`]: one `file:line:col: severity[CODE]: message` line per diagnostic, plus
//!   indented notes and hints. Stable, used by tests and CI logs.
//! - [`render_pretty`]: source snippets with labels, via `miette`'s graphical handler.
//! - [`render_json`]: machine-readable array for editor and tool integration.

use std::fmt;

use miette::{GraphicalReportHandler, GraphicalTheme, LabeledSpan, NamedSource, SourceCode};
use serde::Serialize;

use super::{Diagnostic, Severity};

/// Output format for a batch of diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Plain,
    Pretty,
    Json,
}

/// Maps byte offsets to 1-based line/column pairs. Columns count characters, not bytes.
pub struct LineIndex<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(source.match_indices('\n').map(|(i, _)| i + 1));
        Self { source, line_starts }
    }

    /// 1-based `(line, column)` of `offset` (clamped to the end of the source).
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.source.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let start = self.line_starts[line];
        let column = self
            .source
            .get(start..offset)
            .map(|s| s.chars().count())
            .unwrap_or(offset - start);
        (line + 1, column + 1)
    }

    /// Text of a 1-based line, without its line break.
    pub fn line_text(&self, line: usize) -> &'a str {
        let Some(&start) = self.line_starts.get(line.saturating_sub(1)) else {
            return "";
        };
        let end = self.line_starts.get(line).map(|e| e - 1).unwrap_or(self.source.len());
        self.source.get(start..end).unwrap_or("").trim_end_matches('\r')
    }
}

/// Render in the requested format.
///
/// ## Errors
/// Only JSON rendering can fail (serialization error).
pub fn render(
    format: OutputFormat,
    file: &str,
    source: &str,
    diagnostics: &[Diagnostic],
    color: bool,
) -> serde_json::Result<String> {
    match format {
        OutputFormat::Plain => Ok(render_plain(file, source, diagnostics)),
        OutputFormat::Pretty => Ok(render_pretty(file, source, diagnostics, color)),
        OutputFormat::Json => render_json(file, source, diagnostics),
    }
}

/// `file:line:col: severity[CODE]: message` with `= note:` / `= hint:` continuation lines.
pub fn render_plain(file: &str, source: &str, diagnostics: &[Diagnostic]) -> String {
    let index = LineIndex::new(source);
    let mut out = String::new();
    for d in diagnostics {
        let (line, col) = index.line_col(d.span.start);
        out.push_str(&format!(
            "{file}:{line}:{col}: {}[{}]: {}\n",
            d.severity,
            d.kind.code(),
            d.message
        ));
        for related in &d.related {
            let (rl, rc) = index.line_col(related.span.start);
            out.push_str(&format!("  = note: {} ({file}:{rl}:{rc})\n", related.message));
        }
        for note in &d.notes {
            out.push_str(&format!("  = note: {note}\n"));
        }
        for hint in &d.hints {
            out.push_str(&format!("  = hint: {hint}\n"));
        }
    }
    out
}

/// Graphical rendering with source context.
pub fn render_pretty(file: &str, source: &str, diagnostics: &[Diagnostic], color: bool) -> String {
    let theme = if color {
        GraphicalTheme::unicode()
    } else {
        GraphicalTheme::unicode_nocolor()
    };
    let handler = GraphicalReportHandler::new_themed(theme);
    let named = NamedSource::new(file, source.to_string());
    let mut out = String::new();
    for d in diagnostics {
        let report = Report {
            diagnostic: d,
            source: &named,
        };
        if handler.render_report(&mut out, &report).is_err() {
            // Fall back to the plain form for this entry rather than dropping it.
            out.push_str(&render_plain(file, source, std::slice::from_ref(d)));
        }
    }
    out
}

#[derive(Serialize)]
struct JsonDiagnostic<'a> {
    file: &'a str,
    severity: Severity,
    code: &'static str,
    kind: String,
    message: &'a str,
    line: usize,
    column: usize,
    end_line: usize,
    end_column: usize,
    notes: &'a [String],
    hints: &'a [String],
}

/// JSON array of diagnostics.
pub fn render_json(file: &str, source: &str, diagnostics: &[Diagnostic]) -> serde_json::Result<String> {
    let index = LineIndex::new(source);
    let items: Vec<JsonDiagnostic<'_>> = diagnostics
        .iter()
        .map(|d| {
            let (line, column) = index.line_col(d.span.start);
            let (end_line, end_column) = index.line_col(d.span.end);
            JsonDiagnostic {
                file,
                severity: d.severity,
                code: d.kind.code(),
                kind: d.kind.to_string(),
                message: &d.message,
                line,
                column,
                end_line,
                end_column,
                notes: &d.notes,
                hints: &d.hints,
            }
        })
        .collect();
    serde_json::to_string_pretty(&items)
}

// ============================================================================
// miette adapter
// ============================================================================

/// Borrowed view of a [`Diagnostic`] plus its source, in the shape `miette` renders.
struct Report<'a> {
    diagnostic: &'a Diagnostic,
    source: &'a NamedSource<String>,
}

impl fmt::Debug for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.diagnostic, f)
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.diagnostic.message)
    }
}

impl std::error::Error for Report<'_> {}

impl miette::Diagnostic for Report<'_> {
    fn code<'b>(&'b self) -> Option<Box<dyn fmt::Display + 'b>> {
        Some(Box::new(self.diagnostic.kind.code()))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(match self.diagnostic.severity {
            Severity::Error => miette::Severity::Error,
            Severity::Warning => miette::Severity::Warning,
        })
    }

    fn help<'b>(&'b self) -> Option<Box<dyn fmt::Display + 'b>> {
        let d = self.diagnostic;
        if d.notes.is_empty() && d.hints.is_empty() {
            return None;
        }
        let lines: Vec<String> = d
            .notes
            .iter()
            .map(|n| format!("note: {n}"))
            .chain(d.hints.iter().cloned())
            .collect();
        Some(Box::new(lines.join("\n")))
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        Some(self.source)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let d = self.diagnostic;
        let primary = LabeledSpan::new_primary_with_span(
            Some(d.kind.to_string()),
            (d.span.start, d.span.end.saturating_sub(d.span.start)),
        );
        let related = d.related.iter().map(|r| {
            LabeledSpan::new_with_span(
                Some(r.message.clone()),
                (r.span.start, r.span.end.saturating_sub(r.span.start)),
            )
        });
        Some(Box::new(std::iter::once(primary).chain(related)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Span;
    use crate::diagnostics::{DiagnosticKind, errors};

    #[test]
    fn test_line_col() {
        let src = "val a = 1\nval b = é + c\n";
        let index = LineIndex::new(src);
        assert_eq!(index.line_col(0), (1, 1));
        assert_eq!(index.line_col(10), (2, 1));
        let c = src.find('c').unwrap();
        assert_eq!(index.line_col(c), (2, 13));
        assert_eq!(index.line_text(2), "val b = é + c");
    }

    #[test]
    fn test_plain_format() {
        let src = "fun f() {\n  return y\n}\n";
        let y = src.find('y').unwrap();
        let d = errors::unresolved_identifier("y", Span::new(y, y + 1));
        let out = render_plain("main.sl", src, &[d]);
        assert!(out.starts_with("main.sl:2:10: error[E0004]: cannot find `y` in this scope\n"));
        assert!(out.contains("  = hint:"));
    }

    #[test]
    fn test_json_format() {
        let src = "x";
        let d = Diagnostic::new(DiagnosticKind::LexError, "bad", Span::new(0, 1));
        let json = render_json("a.sl", src, &[d]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["code"], "E0001");
        assert_eq!(value[0]["line"], 1);
        assert_eq!(value[0]["end_column"], 2);
    }

    #[test]
    fn test_pretty_mentions_code_and_message() {
        let src = "val x = 1\nval x = 2\n";
        let d = errors::duplicate_declaration("x", Span::new(14, 15), Span::new(4, 5));
        let out = render_pretty("dup.sl", src, &[d], false);
        assert!(out.contains("E0003"));
        assert!(out.contains("already declared"));
    }
}
