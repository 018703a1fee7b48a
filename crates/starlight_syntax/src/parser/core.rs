/// Parser core types and entrypoint.
///
/// This chunk defines the [`Parser`] type and its top-level `parse()` loop.
///
/// ## Notes
/// - This file is `include!`'d into `crate::parser` to keep all parser methods in a
///   single module while avoiding a single "god file".
type PResult<T> = Result<T, Diagnostic>;

/// Parser state.
///
/// ## Notes
/// - The parser is single-pass and recovers from errors by synchronizing at statement
///   boundaries, so one run reports every syntax error it can.
/// - Most parsing helpers are implemented on `Parser` but split across multiple files.
pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    errors: Vec<Diagnostic>,
    /// Stand-in returned by `peek` when the stream is exhausted or lacks a trailing `Eof`.
    eof: Token,
    /// Open `(`/`[` groups around the current position; line breaks are insignificant inside.
    group_depth: u32,
    /// Enclosing loops in the current function or lambda body.
    loop_depth: u32,
    /// Enclosing function and lambda bodies.
    fn_depth: u32,
}

impl<'a> Parser<'a> {
    /// Create a new parser for a token stream.
    ///
    /// ## Parameters
    /// - `tokens`: Token stream produced by `starlight_syntax::lexer`.
    pub fn new(tokens: &'a [Token]) -> Self {
        let end = tokens.last().map(|t| t.span.end).unwrap_or(0);
        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
            eof: Token {
                kind: TokenKind::Eof,
                lexeme: String::new(),
                span: Span::new(end, end),
                line: tokens.last().map(|t| t.line).unwrap_or(1),
                column: tokens.last().map(|t| t.column).unwrap_or(1),
                newline_before: true,
            },
            group_depth: 0,
            loop_depth: 0,
            fn_depth: 0,
        }
    }

    /// Parse the entire token stream into a [`Program`].
    ///
    /// Always produces a (possibly partial) program; syntax errors are returned alongside it.
    pub fn parse(mut self) -> (Program, Vec<Diagnostic>) {
        let mut declarations = Vec::new();

        while !self.is_at_end() {
            if self.match_punct(PunctuationId::Semicolon) {
                continue;
            }
            if self.check_punct(PunctuationId::RBrace) {
                let span = self.current_span();
                self.errors.push(Diagnostic::syntax("unexpected `}` at top level", span));
                self.advance();
                continue;
            }

            let before = self.pos;
            match self.declaration() {
                Ok(decl) => declarations.push(decl),
                Err(e) => {
                    self.errors.push(e);
                    self.synchronize();
                    if self.pos == before {
                        self.advance();
                    }
                }
            }
        }

        (Program { declarations }, self.errors)
    }
}
