/// Expression parsing methods.
///
/// Precedence ladder, low to high:
///
/// 1. assignment `= += -= *= /= %=` (right-assoc), `assignment`
/// 2. conditional `? :` (right-assoc), `conditional`
/// 3. binary operators `|| && == != < <= > >= .. + - * / %`, `binary` (precedence climbing)
/// 4. prefix `+ - ! await`, `unary`
/// 5. postfix call, `.`, `[]`, `?.`, `!!`, `++`, `--`, `postfix`
/// 6. primary
impl<'a> Parser<'a> {
    // ========================================================================
    // Expressions
    // ========================================================================

    fn expression(&mut self) -> PResult<Expression> {
        self.assignment()
    }

    fn assignment(&mut self) -> PResult<Expression> {
        let target = self.conditional()?;

        let op = match self.peek().operator_id() {
            Some(op) if operators::is_assignment(op) && !self.at_line_break() => op,
            _ => return Ok(target),
        };
        let op_span = self.advance().span;

        if !matches!(
            target.kind,
            ExprKind::Ident(_) | ExprKind::Index(_) | ExprKind::Member(MemberExpr { safe: false, .. })
        ) {
            return Err(Diagnostic::syntax("invalid assignment target", target.span)
                .with_note(format!("`{}` can only assign to a variable, a field or an index", operators::as_str(op)))
                .with_related(op_span, "assignment here"));
        }

        let value = self.assignment()?;
        let span = target.span.merge(value.span);
        Ok(Expression::new(
            ExprKind::Assign(AssignExpr {
                target: Box::new(target),
                op: assign_op(op),
                value: Box::new(value),
            }),
            span,
        ))
    }

    fn conditional(&mut self) -> PResult<Expression> {
        let condition = self.binary(operators::CONDITIONAL_PRECEDENCE + 1)?;
        if !self.check_op(OperatorId::Question) || self.at_line_break() {
            return Ok(condition);
        }
        self.advance();
        let then_expr = self.conditional()?;
        self.expect_punct(PunctuationId::Colon, "expected `:` in conditional expression")?;
        let else_expr = self.conditional()?;
        let span = condition.span.merge(else_expr.span);
        Ok(Expression::new(
            ExprKind::Conditional(ConditionalExpr {
                condition: Box::new(condition),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            }),
            span,
        ))
    }

    /// Precedence climbing over the binary operators.
    ///
    /// ## Parameters
    /// - `min_prec`: lowest binding power this call may consume.
    fn binary(&mut self, min_prec: u8) -> PResult<Expression> {
        let mut left = self.unary()?;
        loop {
            if self.at_line_break() {
                break;
            }
            let Some(op) = self.peek().operator_id() else {
                break;
            };
            let Some(prec) = operators::binary_precedence(op) else {
                break;
            };
            if prec < min_prec {
                break;
            }
            self.advance();
            // All binary operators are left-associative.
            let right = self.binary(prec + 1)?;
            let span = left.span.merge(right.span);
            let kind = match binary_op(op) {
                Some(op) => ExprKind::Binary(BinaryExpr {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                }),
                None => ExprKind::Range(RangeExpr {
                    start: Box::new(left),
                    end: Box::new(right),
                }),
            };
            left = Expression::new(kind, span);
        }
        Ok(left)
    }

    fn unary(&mut self) -> PResult<Expression> {
        let start = self.current_span().start;

        if self.match_keyword(KeywordId::Await) {
            let operand = self.unary()?;
            let span = Span::new(start, operand.span.end);
            return Ok(Expression::new(
                ExprKind::Await(AwaitExpr {
                    operand: Box::new(operand),
                }),
                span,
            ));
        }

        let op = match self.peek().operator_id() {
            Some(OperatorId::Minus) => UnaryOp::Neg,
            Some(OperatorId::Plus) => UnaryOp::Plus,
            Some(OperatorId::Bang) => UnaryOp::Not,
            Some(OperatorId::BangBang) => {
                // `!!flag` in prefix position is double negation.
                self.advance();
                let operand = self.unary()?;
                let end = operand.span.end;
                let inner = Expression::new(
                    ExprKind::Unary(UnaryExpr {
                        op: UnaryOp::Not,
                        operand: Box::new(operand),
                    }),
                    Span::new(start + 1, end),
                );
                return Ok(Expression::new(
                    ExprKind::Unary(UnaryExpr {
                        op: UnaryOp::Not,
                        operand: Box::new(inner),
                    }),
                    Span::new(start, end),
                ));
            }
            _ => return self.postfix(),
        };
        self.advance();
        let operand = self.unary()?;
        let span = Span::new(start, operand.span.end);
        Ok(Expression::new(
            ExprKind::Unary(UnaryExpr {
                op,
                operand: Box::new(operand),
            }),
            span,
        ))
    }

    fn postfix(&mut self) -> PResult<Expression> {
        let mut expr = self.primary()?;

        loop {
            let start = expr.span.start;
            let safe = self.check_op(OperatorId::QuestionDot);

            if safe || self.check_punct(PunctuationId::Dot) {
                // Leading-dot chaining continues across line breaks.
                self.advance();
                let (name, name_span) = self.expect_ident("expected member name")?;
                if self.check_punct(PunctuationId::LParen) && !self.at_line_break() {
                    let args = self.arguments()?;
                    expr = Expression::new(
                        ExprKind::MethodCall(MethodCallExpr {
                            receiver: Box::new(expr),
                            method: name,
                            method_span: name_span,
                            args,
                            safe,
                            dispatch: None,
                        }),
                        Span::new(start, self.prev_end()),
                    );
                } else {
                    expr = Expression::new(
                        ExprKind::Member(MemberExpr {
                            object: Box::new(expr),
                            field: name,
                            field_span: name_span,
                            safe,
                        }),
                        Span::new(start, self.prev_end()),
                    );
                }
                continue;
            }

            if self.at_line_break() {
                break;
            }

            if self.check_punct(PunctuationId::LParen) {
                let args = self.arguments()?;
                expr = Expression::new(
                    ExprKind::Call(CallExpr {
                        callee: Box::new(expr),
                        args,
                        call_kind: None,
                    }),
                    Span::new(start, self.prev_end()),
                );
            } else if self.match_punct(PunctuationId::LBracket) {
                let index = self.grouped(|p| {
                    let index = p.expression()?;
                    p.expect_punct(PunctuationId::RBracket, "expected `]` after index")?;
                    Ok(index)
                })?;
                expr = Expression::new(
                    ExprKind::Index(IndexExpr {
                        object: Box::new(expr),
                        index: Box::new(index),
                    }),
                    Span::new(start, self.prev_end()),
                );
            } else if self.match_op(OperatorId::BangBang) {
                expr = Expression::new(
                    ExprKind::NonNull(NonNullExpr { operand: Box::new(expr) }),
                    Span::new(start, self.prev_end()),
                );
            } else if self.check_op(OperatorId::PlusPlus) || self.check_op(OperatorId::MinusMinus) {
                let op = if self.check_op(OperatorId::PlusPlus) {
                    PostfixOp::Increment
                } else {
                    PostfixOp::Decrement
                };
                self.advance();
                expr = Expression::new(
                    ExprKind::Postfix(PostfixExpr {
                        operand: Box::new(expr),
                        op,
                    }),
                    Span::new(start, self.prev_end()),
                );
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// Parse `(arg, ...)`.
    fn arguments(&mut self) -> PResult<Vec<Expression>> {
        self.expect_punct(PunctuationId::LParen, "expected `(`")?;
        self.grouped(|p| {
            let mut args = Vec::new();
            while !p.check_punct(PunctuationId::RParen) {
                args.push(p.expression()?);
                if !p.match_punct(PunctuationId::Comma) {
                    break;
                }
            }
            p.expect_punct(PunctuationId::RParen, "expected `)` after arguments")?;
            Ok(args)
        })
    }

    fn primary(&mut self) -> PResult<Expression> {
        let span = self.current_span();

        let literal = match &self.peek().kind {
            TokenKind::Int(v) => Some(Literal::Int(*v)),
            TokenKind::Long(v) => Some(Literal::Long(*v)),
            TokenKind::Float(v) => Some(Literal::Float(*v)),
            TokenKind::Double(v) => Some(Literal::Double(*v)),
            TokenKind::Str(s) => Some(Literal::String(s.clone())),
            TokenKind::Keyword(KeywordId::True) => Some(Literal::Bool(true)),
            TokenKind::Keyword(KeywordId::False) => Some(Literal::Bool(false)),
            TokenKind::Keyword(KeywordId::Null) => Some(Literal::Null),
            _ => None,
        };
        if let Some(literal) = literal {
            self.advance();
            return Ok(Expression::new(ExprKind::Literal(literal), span));
        }

        match &self.peek().kind {
            TokenKind::StringStart => self.template(),
            TokenKind::Ident(name) => {
                let name = name.clone();
                if self.peek_at(1).kind.is_punctuation(PunctuationId::FatArrow) {
                    return self.single_param_lambda();
                }
                self.advance();
                Ok(Expression::new(ExprKind::Ident(IdentRef { name, symbol: None }), span))
            }
            TokenKind::Keyword(KeywordId::This) => {
                self.advance();
                Ok(Expression::new(ExprKind::This, span))
            }
            TokenKind::Keyword(KeywordId::Match) => self.match_expr(),
            TokenKind::Punctuation(PunctuationId::LParen) => {
                if self.is_lambda_start() {
                    return self.lambda();
                }
                self.advance();
                let inner = self.grouped(|p| {
                    let inner = p.expression()?;
                    p.expect_punct(PunctuationId::RParen, "expected `)` after expression")?;
                    Ok(inner)
                })?;
                // Keep the parenthesized span so diagnostics point at the whole group.
                Ok(Expression {
                    span: Span::new(span.start, self.prev_end()),
                    ..inner
                })
            }
            TokenKind::Punctuation(PunctuationId::LBracket) => self.list_or_comprehension(),
            TokenKind::Punctuation(PunctuationId::LBrace) => self.map_literal(),
            _ => Err(self.unexpected("expected expression")),
        }
    }

    /// Parse `StringStart (StringText | '${' expr '}')* StringEnd`.
    fn template(&mut self) -> PResult<Expression> {
        let start = self.current_span().start;
        self.advance();
        let mut parts = Vec::new();
        loop {
            match &self.peek().kind {
                TokenKind::StringText(text) => {
                    parts.push(TemplatePart::Text(text.clone()));
                    self.advance();
                }
                TokenKind::InterpolationOpen => {
                    self.advance();
                    let expr = self.grouped(|p| p.expression())?;
                    if !matches!(self.peek().kind, TokenKind::InterpolationClose) {
                        return Err(self.unexpected("expected `}` to close the interpolation"));
                    }
                    self.advance();
                    parts.push(TemplatePart::Expr(expr));
                }
                TokenKind::StringEnd => {
                    self.advance();
                    break;
                }
                _ => return Err(self.unexpected("expected the rest of the string")),
            }
        }
        Ok(Expression::new(
            ExprKind::Template(TemplateExpr { parts }),
            Span::new(start, self.prev_end()),
        ))
    }

    /// `[]`, `[a, b]` or `[elem | for x in xs if cond]`.
    fn list_or_comprehension(&mut self) -> PResult<Expression> {
        let start = self.current_span().start;
        self.advance();
        let kind = self.grouped(|p| {
            if p.match_punct(PunctuationId::RBracket) {
                return Ok(ExprKind::List(ListExpr { elements: Vec::new() }));
            }
            let first = p.expression()?;

            if p.match_op(OperatorId::Pipe) {
                p.expect_keyword(KeywordId::For, "expected `for` in list comprehension")?;
                let (var, var_span) = p.expect_ident("expected comprehension variable")?;
                p.expect_keyword(KeywordId::In, "expected `in` after comprehension variable")?;
                let iterable = p.expression()?;
                let condition = if p.match_keyword(KeywordId::If) {
                    Some(p.expression()?)
                } else {
                    None
                };
                p.expect_punct(PunctuationId::RBracket, "expected `]` to close list comprehension")?;
                return Ok(ExprKind::Comprehension(Box::new(Comprehension {
                    element: first,
                    var,
                    var_span,
                    iterable,
                    condition,
                    symbol: None,
                })));
            }

            let mut elements = vec![first];
            while p.match_punct(PunctuationId::Comma) {
                if p.check_punct(PunctuationId::RBracket) {
                    break;
                }
                elements.push(p.expression()?);
            }
            p.expect_punct(PunctuationId::RBracket, "expected `,` or `]` in list literal")?;
            Ok(ExprKind::List(ListExpr { elements }))
        })?;
        Ok(Expression::new(kind, Span::new(start, self.prev_end())))
    }

    /// `{}` or `{key: value, ...}`.
    fn map_literal(&mut self) -> PResult<Expression> {
        let start = self.current_span().start;
        self.advance();
        let entries = self.grouped(|p| {
            let mut entries = Vec::new();
            while !p.check_punct(PunctuationId::RBrace) {
                let key = p.expression()?;
                p.expect_punct(PunctuationId::Colon, "expected `:` after map key")?;
                let value = p.expression()?;
                entries.push((key, value));
                if !p.match_punct(PunctuationId::Comma) {
                    break;
                }
            }
            p.expect_punct(PunctuationId::RBrace, "expected `,` or `}` in map literal")?;
            Ok(entries)
        })?;
        Ok(Expression::new(
            ExprKind::Map(MapExpr { entries }),
            Span::new(start, self.prev_end()),
        ))
    }

    // ========================================================================
    // Lambdas
    // ========================================================================

    /// `(` starts a lambda when its matching `)` is followed by `=>` or `->`.
    fn is_lambda_start(&self) -> bool {
        let mut depth = 0usize;
        let mut i = 0;
        loop {
            let token = self.peek_at(i);
            match &token.kind {
                TokenKind::Eof => return false,
                TokenKind::Punctuation(PunctuationId::LParen | PunctuationId::LBracket | PunctuationId::LBrace) => {
                    depth += 1
                }
                TokenKind::Punctuation(PunctuationId::RParen | PunctuationId::RBracket | PunctuationId::RBrace) => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        let next = &self.peek_at(i + 1).kind;
                        return next.is_punctuation(PunctuationId::FatArrow)
                            || next.is_punctuation(PunctuationId::Arrow);
                    }
                }
                _ => {}
            }
            i += 1;
        }
    }

    /// `(params) (-> Type)? => body`
    fn lambda(&mut self) -> PResult<Expression> {
        let start = self.current_span().start;
        let params = self.params()?;
        let return_type = self.return_type()?;
        self.expect_punct(PunctuationId::FatArrow, "expected `=>` after lambda parameters")?;
        let body = self.lambda_body()?;
        Ok(Expression::new(
            ExprKind::Lambda(LambdaExpr {
                params,
                return_type,
                body,
            }),
            Span::new(start, self.prev_end()),
        ))
    }

    /// `x => body`
    fn single_param_lambda(&mut self) -> PResult<Expression> {
        let start = self.current_span().start;
        let (name, span) = self.expect_ident("expected lambda parameter")?;
        self.expect_punct(PunctuationId::FatArrow, "expected `=>`")?;
        let body = self.lambda_body()?;
        Ok(Expression::new(
            ExprKind::Lambda(LambdaExpr {
                params: vec![Param {
                    name,
                    span,
                    ty: None,
                    default: None,
                    symbol: None,
                    resolved: None,
                }],
                return_type: None,
                body,
            }),
            Span::new(start, self.prev_end()),
        ))
    }

    fn lambda_body(&mut self) -> PResult<LambdaBody> {
        if self.check_punct(PunctuationId::LBrace) {
            Ok(LambdaBody::Block(self.function_body(|p| p.block())?))
        } else {
            let saved_fn = self.fn_depth;
            self.fn_depth += 1;
            let body = self.expression();
            self.fn_depth = saved_fn;
            Ok(LambdaBody::Expr(Box::new(body?)))
        }
    }

    // ========================================================================
    // Match
    // ========================================================================

    /// `match scrutinee { pattern (if guard)? => body, ... }`
    fn match_expr(&mut self) -> PResult<Expression> {
        let start = self.current_span().start;
        self.expect_keyword(KeywordId::Match, "expected `match`")?;
        let scrutinee = self.expression()?;
        let open = self.expect_punct(PunctuationId::LBrace, "expected `{` after match scrutinee")?.span;

        let arms = self.ungrouped(|p| {
            let mut arms = Vec::new();
            loop {
                while p.match_punct(PunctuationId::Comma) || p.match_punct(PunctuationId::Semicolon) {}
                if p.check_punct(PunctuationId::RBrace) || p.is_at_end() {
                    break;
                }
                let before = p.pos;
                match p.match_arm() {
                    Ok(arm) => arms.push(arm),
                    Err(e) => {
                        p.errors.push(e);
                        p.synchronize();
                        if p.pos == before && !p.check_punct(PunctuationId::RBrace) {
                            p.advance();
                        }
                        continue;
                    }
                }
                let separated = p.check_punct(PunctuationId::Comma)
                    || p.check_punct(PunctuationId::Semicolon)
                    || p.check_punct(PunctuationId::RBrace)
                    || p.peek().newline_before;
                if !separated {
                    return Err(p.unexpected("expected `,` or a line break between match arms"));
                }
            }
            Ok(arms)
        })?;

        if !self.match_punct(PunctuationId::RBrace) {
            return Err(Diagnostic::syntax("unclosed `{`", open).with_note("the match body was never closed with `}`"));
        }
        Ok(Expression::new(
            ExprKind::Match(Box::new(MatchExpr { scrutinee, arms })),
            Span::new(start, self.prev_end()),
        ))
    }

    fn match_arm(&mut self) -> PResult<MatchArm> {
        let start = self.current_span().start;
        let pattern = self.pattern()?;
        let guard = if self.match_keyword(KeywordId::If) {
            Some(self.expression()?)
        } else {
            None
        };
        self.expect_punct(PunctuationId::FatArrow, "expected `=>` after match pattern")?;

        let body = if self.check_punct(PunctuationId::LBrace) {
            let block = self.block()?;
            block_value(block)
        } else {
            self.expression()?
        };

        Ok(MatchArm {
            pattern,
            guard,
            body,
            span: Span::new(start, self.prev_end()),
        })
    }
}

/// Turn a block-bodied match arm into a block expression; a trailing expression statement
/// becomes the value.
fn block_value(block: Block) -> Expression {
    let span = block.span;
    let mut statements = block.statements;
    let value = match statements.last() {
        Some(Spanned {
            node: Statement::Expr(_), ..
        }) => match statements.pop() {
            Some(Spanned {
                node: Statement::Expr(ExprStmt { expr }),
                ..
            }) => Some(expr),
            _ => None,
        },
        _ => None,
    };
    Expression::new(ExprKind::Block(Box::new(BlockExpr { statements, value })), span)
}

fn binary_op(op: OperatorId) -> Option<BinaryOp> {
    Some(match op {
        OperatorId::Plus => BinaryOp::Add,
        OperatorId::Minus => BinaryOp::Sub,
        OperatorId::Star => BinaryOp::Mul,
        OperatorId::Slash => BinaryOp::Div,
        OperatorId::Percent => BinaryOp::Mod,
        OperatorId::EqEq => BinaryOp::Eq,
        OperatorId::NotEq => BinaryOp::NotEq,
        OperatorId::Lt => BinaryOp::Lt,
        OperatorId::LtEq => BinaryOp::LtEq,
        OperatorId::Gt => BinaryOp::Gt,
        OperatorId::GtEq => BinaryOp::GtEq,
        OperatorId::AndAnd => BinaryOp::And,
        OperatorId::OrOr => BinaryOp::Or,
        _ => return None,
    })
}

fn assign_op(op: OperatorId) -> AssignOp {
    match op {
        OperatorId::PlusEq => AssignOp::AddAssign,
        OperatorId::MinusEq => AssignOp::SubAssign,
        OperatorId::StarEq => AssignOp::MulAssign,
        OperatorId::SlashEq => AssignOp::DivAssign,
        OperatorId::PercentEq => AssignOp::ModAssign,
        _ => AssignOp::Assign,
    }
}
