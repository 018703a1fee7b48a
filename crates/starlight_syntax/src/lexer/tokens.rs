//! Token types for the Starlight lexer.
//!
//! The lexer uses **registry-backed IDs** for language vocabulary:
//! - `Keyword(KeywordId)` for reserved words
//! - `Operator(OperatorId)` for operators
//! - `Punctuation(PunctuationId)` for punctuation tokens
//!
//! ## Notes
//! - ID-bearing tokens avoid stringly-typed checks in the parser.
//! - Use `crate::token_helpers` for ergonomic token matching at call sites.
//! - Interpolated strings are split into `StringStart`, `StringText`, `InterpolationOpen`,
//!   `InterpolationClose` and `StringEnd` so the parser parses embedded expressions from real
//!   tokens instead of re-lexing a raw substring.

use serde::Serialize;
use starlight_core::lang::keywords::{self, KeywordId};
use starlight_core::lang::operators::{self, OperatorId};
use starlight_core::lang::punctuation::{self, PunctuationId};

use crate::ast::Span;

/// Kind of token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ========== Keyword / operator / punctuation (ID-based) ==========
    Keyword(KeywordId),
    Operator(OperatorId),
    Punctuation(PunctuationId),

    // ========== Identifiers and Literals ==========
    Ident(String),
    Int(i64),
    /// `10L`
    Long(i64),
    /// `1.5f`
    Float(f64),
    /// `1.5`, `2e3`
    Double(f64),
    /// String literal without interpolation, escapes already decoded.
    Str(String),

    // ========== String templates ==========
    /// Opening quote of an interpolated string.
    StringStart,
    /// Literal piece of an interpolated string, escapes decoded.
    StringText(String),
    /// `${`
    InterpolationOpen,
    /// `}` closing an interpolation.
    InterpolationClose,
    /// Closing quote of an interpolated string.
    StringEnd,

    // ========== Special ==========
    Eof,
}

impl TokenKind {
    /// Short category name used in token dumps.
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Keyword(_) => "keyword",
            TokenKind::Operator(_) => "operator",
            TokenKind::Punctuation(_) => "punctuation",
            TokenKind::Ident(_) => "identifier",
            TokenKind::Int(_) => "int",
            TokenKind::Long(_) => "long",
            TokenKind::Float(_) => "float",
            TokenKind::Double(_) => "double",
            TokenKind::Str(_) => "string",
            TokenKind::StringStart => "string_start",
            TokenKind::StringText(_) => "string_text",
            TokenKind::InterpolationOpen => "interpolation_open",
            TokenKind::InterpolationClose => "interpolation_close",
            TokenKind::StringEnd => "string_end",
            TokenKind::Eof => "eof",
        }
    }

    /// Human-readable description for "expected X, found Y" messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Keyword(id) => format!("keyword `{}`", keywords::as_str(*id)),
            TokenKind::Operator(id) => format!("`{}`", operators::as_str(*id)),
            TokenKind::Punctuation(id) => format!("`{}`", punctuation::as_str(*id)),
            TokenKind::Ident(name) => format!("identifier `{name}`"),
            TokenKind::Int(_) | TokenKind::Long(_) => "integer literal".to_string(),
            TokenKind::Float(_) | TokenKind::Double(_) => "floating-point literal".to_string(),
            TokenKind::Str(_) | TokenKind::StringStart => "string literal".to_string(),
            TokenKind::StringText(_) => "string text".to_string(),
            TokenKind::InterpolationOpen => "`${`".to_string(),
            TokenKind::InterpolationClose => "end of interpolation".to_string(),
            TokenKind::StringEnd => "end of string".to_string(),
            TokenKind::Eof => "end of file".to_string(),
        }
    }
}

/// A token with its kind, source text and position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Exact source text the token was scanned from.
    pub lexeme: String,
    pub span: Span,
    /// 1-based line of the first character.
    pub line: u32,
    /// 1-based column of the first character, counted in Unicode scalar values.
    pub column: u32,
    /// Whether a line break separates this token from the previous one.
    pub newline_before: bool,
}

impl Token {
    /// Serializable view for `starlight tokens`.
    pub fn dump(&self) -> TokenDump<'_> {
        TokenDump {
            kind: self.kind.name(),
            lexeme: &self.lexeme,
            line: self.line,
            column: self.column,
        }
    }
}

/// JSON shape of a token in dumps.
#[derive(Debug, Serialize)]
pub struct TokenDump<'a> {
    pub kind: &'static str,
    pub lexeme: &'a str,
    pub line: u32,
    pub column: u32,
}

/// Resolve an identifier spelling to a keyword id, if reserved.
pub fn keyword_id(name: &str) -> Option<KeywordId> {
    keywords::from_str(name)
}
