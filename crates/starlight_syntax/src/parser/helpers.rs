/// Token-stream helpers and error recovery.
///
/// This chunk contains the low-level primitives used throughout parsing:
/// - Peeking/consuming tokens (`peek`, `advance`)
/// - Matching / expecting keywords, operators, and punctuation
/// - Line-break sensitivity (`at_line_break`, `end_statement`, `grouped`)
/// - Error recovery (`synchronize`)
impl<'a> Parser<'a> {
    // ========================================================================
    // Helpers
    // ========================================================================

    /// Return `true` if the current token is [`TokenKind::Eof`].
    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    /// Return the current token without consuming it.
    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.eof)
    }

    /// Return the token `n` positions ahead without consuming anything.
    fn peek_at(&self, n: usize) -> &Token {
        self.tokens.get(self.pos + n).unwrap_or(&self.eof)
    }

    /// Advance to the next token and return the token we just consumed.
    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.pos += 1;
        }
        self.tokens.get(self.pos.wrapping_sub(1)).unwrap_or(&self.eof)
    }

    /// End offset of the most recently consumed token.
    fn prev_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| t.span.end)
            .unwrap_or(0)
    }

    fn check_keyword(&self, id: KeywordId) -> bool {
        self.peek().kind.is_keyword(id)
    }

    fn check_punct(&self, id: PunctuationId) -> bool {
        self.peek().kind.is_punctuation(id)
    }

    fn check_op(&self, id: OperatorId) -> bool {
        self.peek().kind.is_operator(id)
    }

    fn match_keyword(&mut self, id: KeywordId) -> bool {
        if self.check_keyword(id) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_punct(&mut self, id: PunctuationId) -> bool {
        if self.check_punct(id) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_op(&mut self, id: OperatorId) -> bool {
        if self.check_op(id) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Build an "expected X, found Y" error at the current token.
    fn unexpected(&self, msg: &str) -> Diagnostic {
        Diagnostic::syntax(
            format!("{}, found {}", msg, self.peek().kind.describe()),
            self.peek().span,
        )
    }

    fn expect_keyword(&mut self, id: KeywordId, msg: &str) -> PResult<&Token> {
        if self.check_keyword(id) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(msg))
        }
    }

    fn expect_punct(&mut self, id: PunctuationId, msg: &str) -> PResult<&Token> {
        if self.check_punct(id) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(msg))
        }
    }

    fn expect_op(&mut self, id: OperatorId, msg: &str) -> PResult<&Token> {
        if self.check_op(id) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(msg))
        }
    }

    /// Consume an identifier and return its name and span.
    fn expect_ident(&mut self, msg: &str) -> PResult<(Ident, Span)> {
        match self.peek().kind.ident() {
            Some(name) => {
                let name = name.to_string();
                let span = self.advance().span;
                Ok((name, span))
            }
            None => Err(self.unexpected(msg)),
        }
    }

    fn current_span(&self) -> Span {
        self.peek().span
    }

    // ========================================================================
    // Line breaks
    // ========================================================================

    /// `true` when the current token starts a new line and line breaks are significant here.
    fn at_line_break(&self) -> bool {
        self.group_depth == 0 && self.peek().newline_before
    }

    /// Whether the current position ends a simple statement without consuming anything.
    fn at_statement_end(&self) -> bool {
        self.is_at_end()
            || self.check_punct(PunctuationId::Semicolon)
            || self.check_punct(PunctuationId::RBrace)
            || self.at_line_break()
    }

    /// Terminate a simple statement: `;`, a following `}` / end of file, or a line break.
    fn end_statement(&mut self) -> PResult<()> {
        if self.match_punct(PunctuationId::Semicolon) {
            return Ok(());
        }
        if self.is_at_end() || self.check_punct(PunctuationId::RBrace) || self.peek().newline_before {
            return Ok(());
        }
        Err(self.unexpected("expected `;` or a line break after statement"))
    }

    /// Run `f` with line breaks made insignificant (inside `(...)` / `[...]`).
    fn grouped<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        self.group_depth += 1;
        let result = f(self);
        self.group_depth -= 1;
        result
    }

    /// Run `f` with line breaks significant again (block bodies nested inside a group).
    fn ungrouped<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        let saved = std::mem::replace(&mut self.group_depth, 0);
        let result = f(self);
        self.group_depth = saved;
        result
    }

    /// Run `f` as the body of a function or lambda: `return` becomes legal and loop nesting
    /// starts over.
    fn function_body<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        let saved_loops = std::mem::replace(&mut self.loop_depth, 0);
        self.fn_depth += 1;
        let result = self.ungrouped(f);
        self.fn_depth -= 1;
        self.loop_depth = saved_loops;
        result
    }

    // ========================================================================
    // Error recovery
    // ========================================================================

    /// Skip to a likely statement boundary: after `;`, before `}`, before a statement keyword,
    /// or at the start of a new line.
    fn synchronize(&mut self) {
        let start = self.pos;
        while !self.is_at_end() {
            if self.match_punct(PunctuationId::Semicolon) {
                return;
            }
            if self.check_punct(PunctuationId::RBrace) {
                return;
            }
            if self.starts_statement() || (self.pos > start && self.peek().newline_before) {
                return;
            }
            self.advance();
        }
    }

    fn starts_statement(&self) -> bool {
        self.peek()
            .keyword_id()
            .is_some_and(|id| keywords::info_for(id).starts_statement)
    }

    /// Check if the current token can start an expression
    fn is_at_expr_start(&self) -> bool {
        let kind = &self.peek().kind;
        kind.is_ident()
            || kind.is_literal_start()
            || self.check_keyword(KeywordId::True)
            || self.check_keyword(KeywordId::False)
            || self.check_keyword(KeywordId::Null)
            || self.check_keyword(KeywordId::This)
            || self.check_keyword(KeywordId::Await)
            || self.check_keyword(KeywordId::Match)
            || self.check_punct(PunctuationId::LParen)
            || self.check_punct(PunctuationId::LBracket)
            || self.check_punct(PunctuationId::LBrace)
            || self.check_op(OperatorId::Minus)
            || self.check_op(OperatorId::Plus)
            || self.check_op(OperatorId::Bang)
            || self.check_op(OperatorId::BangBang)
    }
}
