/// Statement parsing methods.
///
/// This chunk parses statement forms (`val`/`var`, `if`, `while`, both `for` forms, `return`,
/// `break`, `continue`, expression statements) and brace-delimited blocks.
///
/// ## Notes
/// - Simple statements end with `end_statement` (`;` or a line break); compound statements end
///   with their closing `}`.
/// - `return` outside a function and `break`/`continue` outside a loop are reported without
///   aborting the statement, so parsing continues normally.
impl<'a> Parser<'a> {
    // ========================================================================
    // Statements
    // ========================================================================

    /// Parse `{ statement* }` with per-statement error recovery.
    fn block(&mut self) -> PResult<Block> {
        let open = self.expect_punct(PunctuationId::LBrace, "expected `{`")?.span;
        let statements = self.ungrouped(|p| {
            let mut statements = Vec::new();
            loop {
                if p.match_punct(PunctuationId::Semicolon) {
                    continue;
                }
                if p.check_punct(PunctuationId::RBrace) || p.is_at_end() {
                    break;
                }
                let before = p.pos;
                match p.statement() {
                    Ok(stmt) => statements.push(stmt),
                    Err(e) => {
                        p.errors.push(e);
                        p.synchronize();
                        if p.pos == before && !p.check_punct(PunctuationId::RBrace) {
                            p.advance();
                        }
                    }
                }
            }
            Ok(statements)
        })?;

        if !self.match_punct(PunctuationId::RBrace) {
            return Err(Diagnostic::syntax("unclosed `{`", open).with_note("the block was never closed with `}`"));
        }
        Ok(Block {
            statements,
            span: Span::new(open.start, self.prev_end()),
        })
    }

    fn statement(&mut self) -> PResult<Spanned<Statement>> {
        let start = self.current_span().start;

        let stmt = if self.check_keyword(KeywordId::Val) || self.check_keyword(KeywordId::Var) {
            let var = self.var_decl()?;
            self.end_statement()?;
            Statement::Var(var)
        } else if self.check_punct(PunctuationId::LBrace) {
            Statement::Block(self.block()?)
        } else if self.check_keyword(KeywordId::If) {
            self.if_stmt()?
        } else if self.check_keyword(KeywordId::While) {
            self.while_stmt()?
        } else if self.check_keyword(KeywordId::For) {
            self.for_stmt()?
        } else if self.check_keyword(KeywordId::Return) {
            self.return_stmt()?
        } else if self.check_keyword(KeywordId::Break) || self.check_keyword(KeywordId::Continue) {
            self.loop_control()?
        } else {
            let expr = self.expression()?;
            self.end_statement()?;
            Statement::Expr(ExprStmt { expr })
        };

        Ok(Spanned::new(stmt, Span::new(start, self.prev_end())))
    }

    /// Parse `('val' | 'var') IDENT (':' type)? ('=' expr)?` without the terminator.
    fn var_decl(&mut self) -> PResult<VarDecl> {
        let mutable = if self.match_keyword(KeywordId::Var) {
            true
        } else {
            self.expect_keyword(KeywordId::Val, "expected `val` or `var`")?;
            false
        };
        let (name, name_span) = self.expect_ident("expected variable name")?;
        let ty = if self.match_punct(PunctuationId::Colon) {
            Some(self.type_expr()?)
        } else {
            None
        };
        let init = if self.match_op(OperatorId::Eq) {
            Some(self.expression()?)
        } else {
            None
        };
        Ok(VarDecl {
            mutable,
            name,
            name_span,
            ty,
            init,
            symbol: None,
            resolved: None,
        })
    }

    fn if_stmt(&mut self) -> PResult<Statement> {
        self.expect_keyword(KeywordId::If, "expected `if`")?;
        let condition = self.expression()?;
        let then_block = self.block()?;

        let else_branch = if self.match_keyword(KeywordId::Else) {
            let start = self.current_span().start;
            let stmt = if self.check_keyword(KeywordId::If) {
                self.if_stmt()?
            } else {
                Statement::Block(self.block()?)
            };
            Some(Box::new(Spanned::new(stmt, Span::new(start, self.prev_end()))))
        } else {
            None
        };

        Ok(Statement::If(IfStmt {
            condition,
            then_block,
            else_branch,
        }))
    }

    fn while_stmt(&mut self) -> PResult<Statement> {
        self.expect_keyword(KeywordId::While, "expected `while`")?;
        let condition = self.expression()?;
        let body = self.loop_body()?;
        Ok(Statement::While(WhileStmt { condition, body }))
    }

    fn loop_body(&mut self) -> PResult<Block> {
        self.loop_depth += 1;
        let body = self.block();
        self.loop_depth -= 1;
        body
    }

    /// `for x in e {}`, `for (x in e) {}` or `for (init; cond; update) {}`.
    fn for_stmt(&mut self) -> PResult<Statement> {
        self.expect_keyword(KeywordId::For, "expected `for`")?;

        let parenthesized_in = self.check_punct(PunctuationId::LParen)
            && self.peek_at(1).kind.is_ident()
            && self.peek_at(2).kind.is_keyword(KeywordId::In);

        if parenthesized_in {
            self.advance();
            let (var, var_span, iterable) = self.grouped(|p| {
                let header = p.for_in_header()?;
                p.expect_punct(PunctuationId::RParen, "expected `)` after for-in header")?;
                Ok(header)
            })?;
            return self.finish_for_in(var, var_span, iterable);
        }

        if self.match_punct(PunctuationId::LParen) {
            return self.for_c();
        }

        let (var, var_span, iterable) = self.for_in_header()?;
        self.finish_for_in(var, var_span, iterable)
    }

    fn for_in_header(&mut self) -> PResult<(Ident, Span, Expression)> {
        let (var, var_span) = self.expect_ident("expected loop variable")?;
        self.expect_keyword(KeywordId::In, "expected `in` after loop variable")?;
        let iterable = self.expression()?;
        Ok((var, var_span, iterable))
    }

    fn finish_for_in(&mut self, var: Ident, var_span: Span, iterable: Expression) -> PResult<Statement> {
        let body = self.loop_body()?;
        Ok(Statement::ForIn(ForInStmt {
            var,
            var_span,
            iterable,
            body,
            symbol: None,
            element: None,
        }))
    }

    /// C-style header after the consumed `(`.
    fn for_c(&mut self) -> PResult<Statement> {
        let (init, condition, update) = self.grouped(|p| {
            let init = if p.check_punct(PunctuationId::Semicolon) {
                None
            } else {
                let start = p.current_span().start;
                let stmt = if p.check_keyword(KeywordId::Val) || p.check_keyword(KeywordId::Var) {
                    Statement::Var(p.var_decl()?)
                } else {
                    Statement::Expr(ExprStmt { expr: p.expression()? })
                };
                Some(Box::new(Spanned::new(stmt, Span::new(start, p.prev_end()))))
            };
            p.expect_punct(PunctuationId::Semicolon, "expected `;` after for-loop initializer")?;

            let condition = if p.check_punct(PunctuationId::Semicolon) {
                None
            } else {
                Some(p.expression()?)
            };
            p.expect_punct(PunctuationId::Semicolon, "expected `;` after for-loop condition")?;

            let update = if p.check_punct(PunctuationId::RParen) {
                None
            } else {
                Some(p.expression()?)
            };
            p.expect_punct(PunctuationId::RParen, "expected `)` after for-loop header")?;
            Ok((init, condition, update))
        })?;

        let body = self.loop_body()?;
        Ok(Statement::ForC(ForCStmt {
            init,
            condition,
            update,
            body,
        }))
    }

    fn return_stmt(&mut self) -> PResult<Statement> {
        let span = self.expect_keyword(KeywordId::Return, "expected `return`")?.span;
        if self.fn_depth == 0 {
            self.errors.push(Diagnostic::syntax("`return` outside of a function", span));
        }
        let value = if !self.at_statement_end() && self.is_at_expr_start() {
            Some(self.expression()?)
        } else {
            None
        };
        self.end_statement()?;
        Ok(Statement::Return(ReturnStmt { value }))
    }

    fn loop_control(&mut self) -> PResult<Statement> {
        let is_break = self.check_keyword(KeywordId::Break);
        let span = self.advance().span;
        if self.loop_depth == 0 {
            let word = if is_break { "break" } else { "continue" };
            self.errors.push(Diagnostic::syntax(format!("`{word}` outside of a loop"), span));
        }
        self.end_statement()?;
        Ok(if is_break { Statement::Break } else { Statement::Continue })
    }
}
