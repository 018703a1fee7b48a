//! Code emitter - builds generated source text
//!
//! [`CodeWriter`] is an indentation-aware line buffer used by every backend; the free functions
//! render literals and identifiers the way both C-family targets spell them.

use std::collections::HashSet;

/// A buffer for building brace-delimited source code with proper indentation.
#[derive(Debug, Clone)]
pub struct CodeWriter {
    buffer: String,
    indent_level: usize,
    indent_str: &'static str,
}

impl Default for CodeWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeWriter {
    pub fn new() -> Self {
        Self::with_level(0)
    }

    /// A writer whose lines start `level` indentation steps deep.
    pub fn with_level(level: usize) -> Self {
        Self {
            buffer: String::new(),
            indent_level: level,
            indent_str: "    ",
        }
    }

    pub fn level(&self) -> usize {
        self.indent_level
    }

    /// Get the generated code
    pub fn finish(self) -> String {
        self.buffer
    }

    /// Write a line with current indentation
    pub fn line(&mut self, s: &str) {
        self.write_indent();
        self.buffer.push_str(s);
        self.buffer.push('\n');
    }

    /// Append already indented lines verbatim.
    pub fn raw(&mut self, lines: &str) {
        self.buffer.push_str(lines);
    }

    /// Write a blank line, never doubling one that is already there.
    pub fn blank_line(&mut self) {
        if !self.buffer.is_empty() && !self.buffer.ends_with("\n\n") && !self.buffer.ends_with("{\n") {
            self.buffer.push('\n');
        }
    }

    /// The indentation prefix of the current level.
    pub fn indentation(&self) -> String {
        self.indent_str.repeat(self.indent_level)
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent_level {
            self.buffer.push_str(self.indent_str);
        }
    }

    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    pub fn dedent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }

    /// Write `header {` and indent.
    pub fn open(&mut self, header: &str) {
        self.line(&format!("{header} {{"));
        self.indent();
    }

    /// Dedent and write `}`.
    pub fn close(&mut self) {
        self.dedent();
        self.line("}");
    }

    /// Dedent, write `} header {` and indent again (`} else {`).
    pub fn reopen(&mut self, header: &str) {
        self.dedent();
        self.line(&format!("}} {header} {{"));
        self.indent();
    }

    pub fn comment(&mut self, text: &str) {
        self.line(&format!("// {text}"));
    }
}

/// Quote `value` as a double-quoted string literal valid in Java and JavaScript.
pub fn quote_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Render a floating literal so it always reads as floating (`2.0`, `1.5e300`).
pub fn format_floating(value: f64) -> String {
    let text = format!("{value:?}");
    if text.contains(['.', 'e', 'E']) || !value.is_finite() {
        text
    } else {
        format!("{text}.0")
    }
}

/// `name` with its first character upper-cased (`x` -> `X`).
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Turn an arbitrary file stem into an identifier (`my-app` -> `my_app`, `1st` -> `_1st`).
pub fn identifier_from(stem: &str) -> String {
    let mut out: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// Strip one pair of parentheses that wraps all of `text`.
pub fn unwrap_parens(text: &str) -> &str {
    let Some(inner) = text.strip_prefix('(').and_then(|t| t.strip_suffix(')')) else {
        return text;
    };
    let mut depth = 0i32;
    for c in inner.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return text;
                }
            }
            _ => {}
        }
    }
    if depth == 0 { inner } else { text }
}

/// Allocates target-safe local names: reserved words get a trailing `_`, clashes get a counter.
#[derive(Debug, Default)]
pub struct NameAllocator {
    taken: HashSet<String>,
}

impl NameAllocator {
    /// Forget every allocated name (a new function body starts).
    pub fn reset(&mut self) {
        self.taken.clear();
    }

    /// Reserve `name` as-is (parameters, generated temporaries).
    pub fn reserve(&mut self, name: &str) {
        self.taken.insert(name.to_string());
    }

    /// A fresh name based on `name`, avoiding `reserved` words and names already taken.
    pub fn fresh(&mut self, name: &str, reserved: &[&str]) -> String {
        let base = if reserved.contains(&name) {
            format!("{name}_")
        } else {
            name.to_string()
        };
        let mut candidate = base.clone();
        let mut n = 1;
        while self.taken.contains(&candidate) {
            candidate = format!("{base}_{n}");
            n += 1;
        }
        self.taken.insert(candidate.clone());
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_indent() {
        let mut w = CodeWriter::new();
        w.open("class A");
        w.line("int x;");
        w.open("void f()");
        w.line("return;");
        w.close();
        w.close();
        assert_eq!(w.finish(), "class A {\n    int x;\n    void f() {\n        return;\n    }\n}\n");
    }

    #[test]
    fn test_reopen_for_else() {
        let mut w = CodeWriter::new();
        w.open("if (a)");
        w.line("f();");
        w.reopen("else");
        w.line("g();");
        w.close();
        assert_eq!(w.finish(), "if (a) {\n    f();\n} else {\n    g();\n}\n");
    }

    #[test]
    fn test_blank_lines_do_not_stack() {
        let mut w = CodeWriter::new();
        w.blank_line();
        w.line("a");
        w.blank_line();
        w.blank_line();
        w.line("b");
        assert_eq!(w.finish(), "a\n\nb\n");
    }

    #[test]
    fn test_quote_string_escapes() {
        assert_eq!(quote_string("a\"b\\c\n"), "\"a\\\"b\\\\c\\n\"");
        assert_eq!(quote_string("\u{1}"), "\"\\u0001\"");
    }

    #[test]
    fn test_format_floating() {
        assert_eq!(format_floating(2.0), "2.0");
        assert_eq!(format_floating(0.5), "0.5");
        assert_eq!(format_floating(1e300), "1e300");
    }

    #[test]
    fn test_identifier_from_stem() {
        assert_eq!(identifier_from("hello"), "hello");
        assert_eq!(identifier_from("my-app"), "my_app");
        assert_eq!(identifier_from("1st"), "_1st");
    }

    #[test]
    fn test_name_allocator() {
        let mut names = NameAllocator::default();
        assert_eq!(names.fresh("x", &[]), "x");
        assert_eq!(names.fresh("x", &[]), "x_1");
        assert_eq!(names.fresh("new", &["new"]), "new_");
        names.reset();
        assert_eq!(names.fresh("x", &[]), "x");
    }
}
