/// Type expression parsing.
///
/// ```text
/// type        := interType ('|' interType)*
/// interType   := postfixType ('&' postfixType)*
/// postfixType := primaryType '?'*
/// primaryType := IDENT ('<' type (',' type)* '>')? | '(' types? ')' '->' type | '(' type ')'
/// ```
impl<'a> Parser<'a> {
    // ========================================================================
    // Types
    // ========================================================================

    fn type_expr(&mut self) -> PResult<Spanned<TypeExpr>> {
        let first = self.intersection_type()?;
        if !self.check_op(OperatorId::Pipe) {
            return Ok(first);
        }
        let start = first.span.start;
        let mut members = vec![first];
        while self.match_op(OperatorId::Pipe) {
            members.push(self.intersection_type()?);
        }
        Ok(Spanned::new(TypeExpr::Union { members }, Span::new(start, self.prev_end())))
    }

    fn intersection_type(&mut self) -> PResult<Spanned<TypeExpr>> {
        let first = self.postfix_type()?;
        if !self.check_op(OperatorId::Amp) {
            return Ok(first);
        }
        let start = first.span.start;
        let mut members = vec![first];
        while self.match_op(OperatorId::Amp) {
            members.push(self.postfix_type()?);
        }
        Ok(Spanned::new(
            TypeExpr::Intersection { members },
            Span::new(start, self.prev_end()),
        ))
    }

    fn postfix_type(&mut self) -> PResult<Spanned<TypeExpr>> {
        let mut ty = self.primary_type()?;
        while self.check_op(OperatorId::Question) && !self.peek().newline_before {
            self.advance();
            let span = Span::new(ty.span.start, self.prev_end());
            ty = Spanned::new(TypeExpr::Nullable { inner: Box::new(ty) }, span);
        }
        Ok(ty)
    }

    fn primary_type(&mut self) -> PResult<Spanned<TypeExpr>> {
        let start = self.current_span().start;

        if self.check_punct(PunctuationId::LParen) {
            self.advance();
            let params = self.grouped(|p| {
                let mut params = Vec::new();
                while !p.check_punct(PunctuationId::RParen) {
                    params.push(p.type_expr()?);
                    if !p.match_punct(PunctuationId::Comma) {
                        break;
                    }
                }
                p.expect_punct(PunctuationId::RParen, "expected `)` in type")?;
                Ok(params)
            })?;

            if self.match_punct(PunctuationId::Arrow) {
                let ret = self.type_expr()?;
                return Ok(Spanned::new(
                    TypeExpr::Function {
                        params,
                        ret: Box::new(ret),
                    },
                    Span::new(start, self.prev_end()),
                ));
            }
            let mut params = params;
            return match (params.pop(), params.is_empty()) {
                (Some(inner), true) => Ok(inner),
                _ => Err(Diagnostic::syntax(
                    "expected `->` after a function type's parameter list",
                    Span::new(start, self.prev_end()),
                )),
            };
        }

        let (name, _) = self.expect_ident("expected a type")?;
        let mut args = Vec::new();
        if self.check_op(OperatorId::Lt) {
            self.advance();
            self.grouped(|p| {
                loop {
                    args.push(p.type_expr()?);
                    if !p.match_punct(PunctuationId::Comma) {
                        break;
                    }
                }
                p.expect_op(OperatorId::Gt, "expected `>` to close type arguments")?;
                Ok(())
            })?;
        }

        Ok(Spanned::new(TypeExpr::Named { name, args }, Span::new(start, self.prev_end())))
    }
}
