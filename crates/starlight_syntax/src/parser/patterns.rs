/// Match pattern parsing.
///
/// Alternatives are tried in this order: literal (including negative numbers), constructor
/// `Name(p, ...)`, destructuring `{p, ...}`, typed `name: Type`, wildcard `_`, binding `name`.
impl<'a> Parser<'a> {
    // ========================================================================
    // Patterns
    // ========================================================================

    fn pattern(&mut self) -> PResult<Spanned<Pattern>> {
        let start = self.current_span().start;

        if let Some(value) = self.literal_pattern()? {
            return Ok(Spanned::new(
                Pattern::Literal(LiteralPattern { value }),
                Span::new(start, self.prev_end()),
            ));
        }

        if self.match_punct(PunctuationId::LBrace) {
            let elements = self.grouped(|p| p.pattern_list(PunctuationId::RBrace))?;
            return Ok(Spanned::new(
                Pattern::Destructure(DestructurePattern {
                    elements,
                    data_class: None,
                }),
                Span::new(start, self.prev_end()),
            ));
        }

        let (name, _) = self.expect_ident("expected a pattern")?;

        let pattern = if self.match_punct(PunctuationId::LParen) {
            let args = self.grouped(|p| p.pattern_list(PunctuationId::RParen))?;
            Pattern::Constructor(ConstructorPattern {
                name,
                args,
                symbol: None,
            })
        } else if self.match_punct(PunctuationId::Colon) {
            let ty = self.type_expr()?;
            Pattern::Typed(TypedPattern {
                name,
                ty,
                symbol: None,
                resolved: None,
            })
        } else if name == "_" {
            Pattern::Wildcard
        } else {
            Pattern::Binding(BindingPattern { name, symbol: None })
        };

        Ok(Spanned::new(pattern, Span::new(start, self.prev_end())))
    }

    /// Comma-separated patterns up to and including `close`.
    fn pattern_list(&mut self, close: PunctuationId) -> PResult<Vec<Spanned<Pattern>>> {
        let mut patterns = Vec::new();
        while !self.check_punct(close) {
            patterns.push(self.pattern()?);
            if !self.match_punct(PunctuationId::Comma) {
                break;
            }
        }
        self.expect_punct(close, "expected `,` or a closing delimiter in pattern")?;
        Ok(patterns)
    }

    /// Consume a literal pattern if one starts here.
    fn literal_pattern(&mut self) -> PResult<Option<Literal>> {
        let negative = self.check_op(OperatorId::Minus);
        let at = if negative { 1 } else { 0 };

        let literal = match &self.peek_at(at).kind {
            TokenKind::Int(v) => Literal::Int(if negative { v.wrapping_neg() } else { *v }),
            TokenKind::Long(v) => Literal::Long(if negative { v.wrapping_neg() } else { *v }),
            TokenKind::Float(v) => Literal::Float(if negative { -v } else { *v }),
            TokenKind::Double(v) => Literal::Double(if negative { -v } else { *v }),
            _ if negative => return Err(self.unexpected("expected a number after `-` in pattern")),
            TokenKind::Str(s) => Literal::String(s.clone()),
            TokenKind::Keyword(KeywordId::True) => Literal::Bool(true),
            TokenKind::Keyword(KeywordId::False) => Literal::Bool(false),
            TokenKind::Keyword(KeywordId::Null) => Literal::Null,
            _ => return Ok(None),
        };
        self.advance();
        if negative {
            self.advance();
        }
        Ok(Some(literal))
    }
}
