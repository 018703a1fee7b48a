//! Lexer for the Starlight programming language
//!
//! Handles tokenization including:
//! - Keywords (fun, val, var, class, data, match, etc.) and identifiers
//! - Numeric literals (int, long `L`, double, float `f`, exponents)
//! - Strings with escapes and `${...}` interpolation
//! - Operators and punctuation, longest match first
//! - Line and nested block comments
//!
//! ## Module Structure
//!
//! - `tokens` - Token types (TokenKind, Token)
//! - `strings` - String body scanning and escapes
//! - `numbers` - Numeric literal scanning

mod numbers;
mod strings;
pub mod tokens;

pub use tokens::{Token, TokenDump, TokenKind, keyword_id};

use std::collections::VecDeque;

use starlight_core::lang::operators::OperatorId;
use starlight_core::lang::punctuation::PunctuationId;

use crate::ast::Span;
use crate::diagnostics::{Diagnostic, Diagnostics};

// ============================================================================
// LEXER STATE
// ----------------------------------------------------------------------------
// Mode stack for string templates:
//
//   "a ${ x + "b${y}" } c"
//   ^ Str scan sees `${` -> push Template, push Interpolation{depth: 0}
//        { / } inside the interpolation adjust depth
//        } at depth 0  -> pop Interpolation, resume the Template body
//                                     "  -> pop Template (StringEnd)
//
// Strings inside an interpolation start their own Template, so nesting is unbounded.
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Mode {
    /// Inside `${ ... }`; `depth` counts braces opened within the interpolation.
    Interpolation { depth: u32 },
    /// Inside an interpolated string whose body resumes after the current interpolation.
    Template { quote: char, open: Span },
}

/// Position snapshot used as the start of a token.
#[derive(Debug, Clone, Copy)]
struct Mark {
    pos: usize,
    line: u32,
    column: u32,
}

/// Lazy lexer over Starlight source text.
///
/// Implements `Iterator<Item = Token>`; the sequence always ends with exactly one `Eof` token.
/// Problems are collected as diagnostics and retrieved with [`Lexer::take_errors`]; scanning
/// continues past them, except for an unterminated block comment, which consumes the rest of
/// the input.
pub struct Lexer<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    pos: usize,
    line: u32,
    column: u32,
    modes: Vec<Mode>,
    pending: VecDeque<Token>,
    newline_before: bool,
    errors: Vec<Diagnostic>,
    finished: bool,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source code.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            pos: 0,
            line: 1,
            column: 1,
            modes: Vec::new(),
            pending: VecDeque::new(),
            newline_before: false,
            errors: Vec::new(),
            finished: false,
        }
    }

    /// Diagnostics recorded so far.
    pub fn take_errors(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.errors)
    }

    // ========================================================================
    // Core character handling
    // ========================================================================

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_next(&self) -> Option<char> {
        self.source.get(self.pos..)?.chars().nth(1)
    }

    fn advance(&mut self) -> Option<char> {
        let (pos, c) = self.chars.next()?;
        self.pos = pos + c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn mark(&self) -> Mark {
        Mark {
            pos: self.pos,
            line: self.line,
            column: self.column,
        }
    }

    fn error(&mut self, message: impl Into<String>, span: Span) {
        self.errors.push(Diagnostic::lex(message, span));
    }

    // ========================================================================
    // Token emission
    // ========================================================================

    /// Queue a token spanning `start..end`.
    fn push_to(&mut self, kind: TokenKind, start: Mark, end: usize) {
        let lexeme = self.source.get(start.pos..end).unwrap_or_default().to_string();
        self.pending.push_back(Token {
            kind,
            lexeme,
            span: Span::new(start.pos, end),
            line: start.line,
            column: start.column,
            newline_before: std::mem::take(&mut self.newline_before),
        });
    }

    /// Queue a token spanning `start` up to the current position.
    fn push(&mut self, kind: TokenKind, start: Mark) {
        self.push_to(kind, start, self.pos);
    }

    fn add_op(&mut self, id: OperatorId, start: Mark) {
        self.push(TokenKind::Operator(id), start);
    }

    fn add_punct(&mut self, id: PunctuationId, start: Mark) {
        self.push(TokenKind::Punctuation(id), start);
    }

    /// Try to match compound operator, fallback to simple.
    fn operator(&mut self, start: Mark, simple: OperatorId, compounds: &[(char, OperatorId)]) {
        for (c, id) in compounds {
            if self.match_char(*c) {
                self.add_op(*id, start);
                return;
            }
        }
        self.add_op(simple, start);
    }

    // ========================================================================
    // Trivia
    // ========================================================================

    /// Skip whitespace and comments. Returns `false` if an unterminated block comment consumed
    /// the rest of the input.
    fn skip_trivia(&mut self) -> bool {
        loop {
            match self.peek() {
                Some('\n') => {
                    self.newline_before = true;
                    self.advance();
                }
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek_next() == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some('/') if self.peek_next() == Some('*') => {
                    if !self.skip_block_comment() {
                        return false;
                    }
                }
                _ => return true,
            }
        }
    }

    /// Skip a (possibly nested) block comment starting at the current `/*`.
    fn skip_block_comment(&mut self) -> bool {
        let start = self.pos;
        self.advance();
        self.advance();
        let mut depth = 1usize;
        while depth > 0 {
            match self.advance() {
                Some('/') if self.peek() == Some('*') => {
                    self.advance();
                    depth += 1;
                }
                Some('*') if self.peek() == Some('/') => {
                    self.advance();
                    depth -= 1;
                }
                Some('\n') => self.newline_before = true,
                Some(_) => {}
                None => {
                    self.error("unterminated block comment", Span::new(start, start + 2));
                    return false;
                }
            }
        }
        true
    }

    // ========================================================================
    // Main scanning dispatch
    // ========================================================================

    /// Scan trivia plus one token (or one run of string-template tokens) into `pending`.
    fn scan_token(&mut self) {
        if !self.skip_trivia() || self.peek().is_none() {
            self.finish();
            return;
        }

        let start = self.mark();
        let Some(c) = self.advance() else {
            self.finish();
            return;
        };

        match c {
            '+' => self.operator(
                start,
                OperatorId::Plus,
                &[('+', OperatorId::PlusPlus), ('=', OperatorId::PlusEq)],
            ),
            '-' => {
                if self.match_char('>') {
                    self.add_punct(PunctuationId::Arrow, start);
                } else {
                    self.operator(
                        start,
                        OperatorId::Minus,
                        &[('-', OperatorId::MinusMinus), ('=', OperatorId::MinusEq)],
                    );
                }
            }
            '*' => self.operator(start, OperatorId::Star, &[('=', OperatorId::StarEq)]),
            '/' => self.operator(start, OperatorId::Slash, &[('=', OperatorId::SlashEq)]),
            '%' => self.operator(start, OperatorId::Percent, &[('=', OperatorId::PercentEq)]),
            '=' => {
                if self.match_char('>') {
                    self.add_punct(PunctuationId::FatArrow, start);
                } else {
                    self.operator(start, OperatorId::Eq, &[('=', OperatorId::EqEq)]);
                }
            }
            '!' => self.operator(
                start,
                OperatorId::Bang,
                &[('=', OperatorId::NotEq), ('!', OperatorId::BangBang)],
            ),
            '<' => self.operator(start, OperatorId::Lt, &[('=', OperatorId::LtEq)]),
            '>' => self.operator(start, OperatorId::Gt, &[('=', OperatorId::GtEq)]),
            '&' => self.operator(start, OperatorId::Amp, &[('&', OperatorId::AndAnd)]),
            '|' => self.operator(start, OperatorId::Pipe, &[('|', OperatorId::OrOr)]),
            '?' => self.operator(start, OperatorId::Question, &[('.', OperatorId::QuestionDot)]),
            '.' => {
                if self.match_char('.') {
                    self.add_op(OperatorId::DotDot, start);
                } else {
                    self.add_punct(PunctuationId::Dot, start);
                }
            }
            ',' => self.add_punct(PunctuationId::Comma, start),
            ';' => self.add_punct(PunctuationId::Semicolon, start),
            ':' => self.add_punct(PunctuationId::Colon, start),
            '(' => self.add_punct(PunctuationId::LParen, start),
            ')' => self.add_punct(PunctuationId::RParen, start),
            '[' => self.add_punct(PunctuationId::LBracket, start),
            ']' => self.add_punct(PunctuationId::RBracket, start),
            '{' => {
                if let Some(Mode::Interpolation { depth }) = self.modes.last_mut() {
                    *depth += 1;
                }
                self.add_punct(PunctuationId::LBrace, start);
            }
            '}' => self.close_brace(start),

            // Strings
            '"' | '\'' => self.scan_string(start, c),

            // Numbers
            '0'..='9' => self.scan_number(start),

            // Identifiers and keywords
            _ if is_ident_start(c) => self.scan_identifier(start),

            _ => {
                self.error(format!("unexpected character `{c}`"), Span::new(start.pos, self.pos));
            }
        }
    }

    /// `}` either closes an interpolation (resuming its string) or is ordinary punctuation.
    fn close_brace(&mut self, start: Mark) {
        match self.modes.last_mut() {
            Some(Mode::Interpolation { depth }) if *depth > 0 => {
                *depth -= 1;
                self.add_punct(PunctuationId::RBrace, start);
            }
            Some(Mode::Interpolation { .. }) => {
                self.modes.pop();
                self.push(TokenKind::InterpolationClose, start);
                self.resume_template();
            }
            _ => self.add_punct(PunctuationId::RBrace, start),
        }
    }

    /// End of input: report open string templates and queue `Eof`.
    fn finish(&mut self) {
        // Consume anything left after an aborting error.
        while self.advance().is_some() {}
        if let Some(open) = self.modes.iter().find_map(|m| match m {
            Mode::Template { open, .. } => Some(*open),
            Mode::Interpolation { .. } => None,
        }) {
            self.error("unterminated string interpolation", open);
        }
        self.modes.clear();
        let end = self.mark();
        self.push(TokenKind::Eof, end);
        self.finished = true;
    }

    // ========================================================================
    // Identifier scanning
    // ========================================================================

    fn scan_identifier(&mut self, start: Mark) {
        while let Some(c) = self.peek() {
            if is_ident_continue(c) {
                self.advance();
            } else {
                break;
            }
        }

        let spelling = self.source.get(start.pos..self.pos).unwrap_or_default();

        // Look up identifier spelling in the reserved-word registry (no allocation for keywords).
        if let Some(id) = keyword_id(spelling) {
            self.push(TokenKind::Keyword(id), start);
        } else {
            let name = spelling.to_string();
            self.push(TokenKind::Ident(name), start);
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Some(token);
            }
            if self.finished {
                return None;
            }
            self.scan_token();
        }
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// Check if a character can start an identifier (ASCII-only).
fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Check if a character can continue an identifier (ASCII-only).
fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Tokenize `source`, recording problems into `diagnostics`.
///
/// The returned stream always ends with `Eof`, even when errors were reported.
#[tracing::instrument(skip_all, fields(source_len = source.len()))]
pub fn tokenize(source: &str, diagnostics: &mut Diagnostics) -> Vec<Token> {
    let mut lexer = Lexer::new(source);
    let tokens: Vec<Token> = lexer.by_ref().collect();
    let errors = lexer.take_errors();
    tracing::debug!(tokens = tokens.len(), errors = errors.len(), "lexed");
    // Open templates are only reported at end of input.
    let mark = diagnostics.len();
    diagnostics.extend(errors);
    diagnostics.sort_stage(mark);
    tokens
}

/// Convenience function to lex a source string.
///
/// Returns the tokens when no lexical errors occurred.
pub fn lex(source: &str) -> Result<Vec<Token>, Vec<Diagnostic>> {
    let mut diagnostics = Diagnostics::new();
    let tokens = tokenize(source, &mut diagnostics);
    if diagnostics.has_errors() {
        Err(diagnostics.into_vec())
    } else {
        Ok(tokens)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use starlight_core::lang::keywords::KeywordId;
    use crate::diagnostics::DiagnosticKind;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_punctuation_registry_parity() {
        use starlight_core::lang::punctuation;

        for p in punctuation::PUNCTUATION {
            let tokens = lex(p.spelling).unwrap_or_else(|errs| panic!("lex({:?}) failed: {:?}", p.spelling, errs));
            assert_eq!(tokens.len(), 2, "expected token + EOF for {:?}", p.spelling);
            assert!(tokens[0].kind.is_punctuation(p.id), "{:?} lexed as {:?}", p.spelling, tokens[0].kind);
        }
    }

    #[test]
    fn test_keyword_registry_parity() {
        use starlight_core::lang::keywords;

        for k in keywords::KEYWORDS {
            for spelling in std::iter::once(&k.canonical).chain(k.aliases) {
                let tokens = lex(spelling).unwrap();
                assert_eq!(tokens.len(), 2, "expected token + EOF for keyword {:?}", spelling);
                assert!(tokens[0].kind.is_keyword(k.id));
            }
        }
    }

    #[test]
    fn test_operator_registry_parity() {
        use starlight_core::lang::operators;

        for o in operators::OPERATORS {
            let tokens = lex(o.spelling).unwrap_or_else(|errs| panic!("lex({:?}) failed: {:?}", o.spelling, errs));
            assert_eq!(tokens.len(), 2, "expected token + EOF for operator {:?}, got {:?}", o.spelling, tokens);
            assert!(tokens[0].kind.is_operator(o.id));
        }
    }

    #[test]
    fn test_keywords_and_identifiers() {
        let k = kinds("fun val var foo _bar data");
        assert!(k[0].is_keyword(KeywordId::Fun));
        assert!(k[1].is_keyword(KeywordId::Val));
        assert!(k[2].is_keyword(KeywordId::Var));
        assert_eq!(k[3], TokenKind::Ident("foo".to_string()));
        assert_eq!(k[4], TokenKind::Ident("_bar".to_string()));
        assert!(k[5].is_keyword(KeywordId::Data));
    }

    #[test]
    fn test_longest_match_operators() {
        let k = kinds("a?.b!! x++ -> => .. += == !=");
        assert!(k[1].is_operator(OperatorId::QuestionDot));
        assert!(k[3].is_operator(OperatorId::BangBang));
        assert!(k[5].is_operator(OperatorId::PlusPlus));
        assert!(k[6].is_punctuation(PunctuationId::Arrow));
        assert!(k[7].is_punctuation(PunctuationId::FatArrow));
        assert!(k[8].is_operator(OperatorId::DotDot));
        assert!(k[9].is_operator(OperatorId::PlusEq));
        assert!(k[10].is_operator(OperatorId::EqEq));
        assert!(k[11].is_operator(OperatorId::NotEq));
    }

    #[test]
    #[allow(clippy::approx_constant)]
    fn test_numbers() {
        let k = kinds("42 10L 3.14 2.5f 1.5e3 2E-2");
        assert_eq!(k[0], TokenKind::Int(42));
        assert_eq!(k[1], TokenKind::Long(10));
        assert!(matches!(k[2], TokenKind::Double(f) if (f - 3.14).abs() < 1e-9));
        assert!(matches!(k[3], TokenKind::Float(f) if (f - 2.5).abs() < 1e-9));
        assert!(matches!(k[4], TokenKind::Double(f) if (f - 1500.0).abs() < 1e-9));
        assert!(matches!(k[5], TokenKind::Double(f) if (f - 0.02).abs() < 1e-9));
    }

    #[test]
    fn test_range_not_float() {
        let k = kinds("1..2");
        assert_eq!(k[0], TokenKind::Int(1));
        assert!(k[1].is_operator(OperatorId::DotDot));
        assert_eq!(k[2], TokenKind::Int(2));
    }

    #[test]
    fn test_integer_overflow_is_error() {
        let errs = lex("99999999999999999999").unwrap_err();
        assert_eq!(errs.len(), 1);
        assert!(errs[0].message.contains("out of range"));
    }

    #[test]
    fn test_int_literal_must_fit_in_32_bits() {
        assert_eq!(kinds("2147483647")[0], TokenKind::Int(2147483647));
        assert_eq!(kinds("3000000000L")[0], TokenKind::Long(3000000000));

        let errs = lex("val x = 3000000000").unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].kind, DiagnosticKind::LexError);
        assert_eq!(errs[0].span, Span::new(8, 18));
        assert!(errs[0].message.contains("too large for `int`"));
        assert!(errs[0].hints.iter().any(|h| h.contains("3000000000L")));
    }

    #[test]
    fn test_plain_strings() {
        let k = kinds(r#""hello\n" 'it\'s' "cost: \$5""#);
        assert_eq!(k[0], TokenKind::Str("hello\n".to_string()));
        assert_eq!(k[1], TokenKind::Str("it's".to_string()));
        assert_eq!(k[2], TokenKind::Str("cost: $5".to_string()));
    }

    #[test]
    fn test_interpolation_tokens() {
        let k = kinds(r#""Hello, ${name}!""#);
        assert_eq!(
            k,
            vec![
                TokenKind::StringStart,
                TokenKind::StringText("Hello, ".to_string()),
                TokenKind::InterpolationOpen,
                TokenKind::Ident("name".to_string()),
                TokenKind::InterpolationClose,
                TokenKind::StringText("!".to_string()),
                TokenKind::StringEnd,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_nested_interpolation_and_braces() {
        let k = kinds(r#""a${ f({x: "b${y}"}) }c""#);
        let opens = k.iter().filter(|t| **t == TokenKind::InterpolationOpen).count();
        let closes = k.iter().filter(|t| **t == TokenKind::InterpolationClose).count();
        let starts = k.iter().filter(|t| **t == TokenKind::StringStart).count();
        assert_eq!((opens, closes, starts), (2, 2, 2));
        assert!(k.contains(&TokenKind::Punctuation(PunctuationId::LBrace)));
        assert!(k.contains(&TokenKind::Punctuation(PunctuationId::RBrace)));
        assert_eq!(k[k.len() - 2], TokenKind::StringEnd);
    }

    #[test]
    fn test_unterminated_string_resyncs_on_next_line() {
        let mut diags = Diagnostics::new();
        let tokens = tokenize("val s = \"oops\nval t = 1", &mut diags);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags.as_slice()[0].span, Span::new(8, 9));
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Ident("t".to_string()) && t.line == 2));
    }

    #[test]
    fn test_unterminated_block_comment_aborts() {
        let mut diags = Diagnostics::new();
        let tokens = tokenize("val a = 1 /* never closed\nval b = 2", &mut diags);
        assert_eq!(diags.len(), 1);
        assert!(diags.as_slice()[0].message.contains("block comment"));
        assert!(tokens.last().unwrap().is_eof());
        assert!(!tokens.iter().any(|t| t.kind == TokenKind::Ident("b".to_string())));
    }

    #[test]
    fn test_nested_block_comments() {
        let k = kinds("a /* outer /* inner */ still comment */ b // tail");
        assert_eq!(k, vec![TokenKind::Ident("a".into()), TokenKind::Ident("b".into()), TokenKind::Eof]);
    }

    #[test]
    fn test_unknown_character_is_skipped() {
        let mut diags = Diagnostics::new();
        let tokens = tokenize("a # b", &mut diags);
        assert_eq!(diags.len(), 1);
        assert!(diags.as_slice()[0].message.contains('#'));
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn test_positions_and_newline_flag() {
        let tokens = lex("val x = 1\n  x++").unwrap();
        let x2 = &tokens[4];
        assert_eq!((x2.line, x2.column), (2, 3));
        assert!(x2.newline_before);
        assert!(!tokens[1].newline_before);
        assert_eq!(x2.lexeme, "x");
    }

    #[test]
    fn test_columns_count_chars() {
        let tokens = lex("\"é\" x").unwrap();
        assert_eq!(tokens[1].column, 5);
    }
}
