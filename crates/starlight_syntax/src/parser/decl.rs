/// Declaration parsing methods.
///
/// This chunk parses top-level items: functions, classes, data classes, interfaces, and
/// extension blocks. Anything else at the top level is parsed as a statement.
impl<'a> Parser<'a> {
    // ========================================================================
    // Declarations
    // ========================================================================

    fn declaration(&mut self) -> PResult<Spanned<Declaration>> {
        let start = self.current_span().start;

        let decl = if self.check_keyword(KeywordId::Fun) || self.check_keyword(KeywordId::Async) {
            let func = self.function()?;
            Declaration::Function(func.node)
        } else if self.check_keyword(KeywordId::Class) {
            Declaration::Class(self.class_decl()?)
        } else if self.check_keyword(KeywordId::Data) {
            Declaration::Data(self.data_decl()?)
        } else if self.check_keyword(KeywordId::Interface) {
            Declaration::Interface(self.interface_decl()?)
        } else if self.check_keyword(KeywordId::Extend) {
            Declaration::Extension(self.extension_decl()?)
        } else {
            let stmt = self.statement()?;
            Declaration::Statement(stmt.node)
        };

        Ok(Spanned::new(decl, Span::new(start, self.prev_end())))
    }

    /// Parse `async? fun name(params) (-> Type)? (block | = expr)`.
    fn function(&mut self) -> PResult<Spanned<FunctionDecl>> {
        let start = self.current_span().start;
        let is_async = self.match_keyword(KeywordId::Async);
        self.expect_keyword(KeywordId::Fun, "expected `fun`")?;
        let (name, name_span) = self.expect_ident("expected function name")?;
        let params = self.params()?;
        let return_type = self.return_type()?;

        let body = if self.check_punct(PunctuationId::LBrace) {
            FunctionBody::Block(self.function_body(|p| p.block())?)
        } else if self.match_op(OperatorId::Eq) {
            let expr = self.function_body(|p| p.expression())?;
            self.end_statement()?;
            FunctionBody::Expr(expr)
        } else {
            return Err(self.unexpected("expected `{` or `=` to start the function body"));
        };

        Ok(Spanned::new(
            FunctionDecl {
                name,
                name_span,
                is_async,
                params,
                return_type,
                body,
                symbol: None,
                resolved_return: None,
            },
            Span::new(start, self.prev_end()),
        ))
    }

    /// Parse `(param, ...)` where `param := IDENT (':' type)? ('=' expr)?`.
    fn params(&mut self) -> PResult<Vec<Param>> {
        self.expect_punct(PunctuationId::LParen, "expected `(` before parameters")?;
        self.grouped(|p| {
            let mut params = Vec::new();
            while !p.check_punct(PunctuationId::RParen) {
                let (name, span) = p.expect_ident("expected parameter name")?;
                let ty = if p.match_punct(PunctuationId::Colon) {
                    Some(p.type_expr()?)
                } else {
                    None
                };
                let default = if p.match_op(OperatorId::Eq) {
                    Some(p.expression()?)
                } else {
                    None
                };
                params.push(Param {
                    name,
                    span,
                    ty,
                    default,
                    symbol: None,
                    resolved: None,
                });
                if !p.match_punct(PunctuationId::Comma) {
                    break;
                }
            }
            p.expect_punct(PunctuationId::RParen, "expected `)` after parameters")?;
            Ok(params)
        })
    }

    fn return_type(&mut self) -> PResult<Option<Spanned<TypeExpr>>> {
        if self.match_punct(PunctuationId::Arrow) {
            Ok(Some(self.type_expr()?))
        } else {
            Ok(None)
        }
    }

    /// Parse `(name: Type, ...)` field parameters of a class or data-class header.
    fn field_params(&mut self) -> PResult<Vec<FieldParam>> {
        self.expect_punct(PunctuationId::LParen, "expected `(` before fields")?;
        self.grouped(|p| {
            let mut fields = Vec::new();
            while !p.check_punct(PunctuationId::RParen) {
                let (name, span) = p.expect_ident("expected field name")?;
                p.expect_punct(PunctuationId::Colon, "expected `:` and a type after field name")?;
                let ty = p.type_expr()?;
                fields.push(FieldParam {
                    name,
                    span,
                    ty,
                    symbol: None,
                    resolved: None,
                });
                if !p.match_punct(PunctuationId::Comma) {
                    break;
                }
            }
            p.expect_punct(PunctuationId::RParen, "expected `)` after fields")?;
            Ok(fields)
        })
    }

    /// Parse `: Iface, Other` after a class header.
    fn supertypes(&mut self) -> PResult<Vec<Spanned<Ident>>> {
        let mut supertypes = Vec::new();
        if self.match_punct(PunctuationId::Colon) {
            loop {
                let (name, span) = self.expect_ident("expected interface name")?;
                supertypes.push(Spanned::new(name, span));
                if !self.match_punct(PunctuationId::Comma) {
                    break;
                }
            }
        }
        Ok(supertypes)
    }

    fn class_decl(&mut self) -> PResult<ClassDecl> {
        self.expect_keyword(KeywordId::Class, "expected `class`")?;
        let (name, name_span) = self.expect_ident("expected class name")?;
        let fields = if self.check_punct(PunctuationId::LParen) {
            self.field_params()?
        } else {
            Vec::new()
        };
        let supertypes = self.supertypes()?;

        let mut members = Vec::new();
        if self.check_punct(PunctuationId::LBrace) {
            self.member_block(|p| {
                if p.check_keyword(KeywordId::Val) || p.check_keyword(KeywordId::Var) {
                    let start = p.current_span().start;
                    let var = p.var_decl()?;
                    p.end_statement()?;
                    members.push(ClassMember::Field(Spanned::new(var, Span::new(start, p.prev_end()))));
                } else if p.check_keyword(KeywordId::Fun) || p.check_keyword(KeywordId::Async) {
                    members.push(ClassMember::Method(p.function()?));
                } else {
                    return Err(p.unexpected("expected `val`, `var` or `fun` in class body"));
                }
                Ok(())
            })?;
        }

        Ok(ClassDecl {
            name,
            name_span,
            fields,
            supertypes,
            members,
            symbol: None,
        })
    }

    fn data_decl(&mut self) -> PResult<DataClassDecl> {
        self.expect_keyword(KeywordId::Data, "expected `data`")?;
        // `data class Point(...)` is accepted as a spelling of `data Point(...)`.
        self.match_keyword(KeywordId::Class);
        let (name, name_span) = self.expect_ident("expected data class name")?;
        let fields = self.field_params()?;
        let supertypes = self.supertypes()?;

        let mut methods = Vec::new();
        if self.check_punct(PunctuationId::LBrace) {
            self.member_block(|p| {
                if p.check_keyword(KeywordId::Fun) || p.check_keyword(KeywordId::Async) {
                    methods.push(p.function()?);
                    Ok(())
                } else {
                    Err(p.unexpected("expected `fun` in data class body (fields belong in the header)"))
                }
            })?;
        }

        Ok(DataClassDecl {
            name,
            name_span,
            fields,
            supertypes,
            methods,
            symbol: None,
        })
    }

    fn interface_decl(&mut self) -> PResult<InterfaceDecl> {
        self.expect_keyword(KeywordId::Interface, "expected `interface`")?;
        let (name, name_span) = self.expect_ident("expected interface name")?;

        let mut methods = Vec::new();
        self.member_block(|p| {
            let start = p.current_span().start;
            p.expect_keyword(KeywordId::Fun, "expected `fun` in interface body")?;
            let (name, _) = p.expect_ident("expected method name")?;
            let params = p.params()?;
            let return_type = p.return_type()?;
            p.end_statement()?;
            methods.push(Spanned::new(
                MethodSig {
                    name,
                    params,
                    return_type,
                    symbol: None,
                },
                Span::new(start, p.prev_end()),
            ));
            Ok(())
        })?;

        Ok(InterfaceDecl {
            name,
            name_span,
            methods,
            symbol: None,
        })
    }

    fn extension_decl(&mut self) -> PResult<ExtensionDecl> {
        self.expect_keyword(KeywordId::Extend, "expected `extend`")?;
        let receiver = self.type_expr()?;

        let mut functions = Vec::new();
        self.member_block(|p| {
            if p.check_keyword(KeywordId::Fun) || p.check_keyword(KeywordId::Async) {
                functions.push(p.function()?);
                Ok(())
            } else {
                Err(p.unexpected("expected `fun` in extension body"))
            }
        })?;

        Ok(ExtensionDecl {
            receiver,
            functions,
            receiver_key: None,
            resolved_receiver: None,
        })
    }

    /// Parse `{ member* }`, calling `member` for each member and recovering from member errors.
    fn member_block(&mut self, mut member: impl FnMut(&mut Self) -> PResult<()>) -> PResult<()> {
        let open = self.expect_punct(PunctuationId::LBrace, "expected `{`")?.span;
        self.ungrouped(|p| {
            loop {
                if p.match_punct(PunctuationId::Semicolon) {
                    continue;
                }
                if p.check_punct(PunctuationId::RBrace) || p.is_at_end() {
                    break;
                }
                let before = p.pos;
                if let Err(e) = member(p) {
                    p.errors.push(e);
                    p.synchronize();
                    if p.pos == before {
                        p.advance();
                    }
                }
            }
            if p.match_punct(PunctuationId::RBrace) {
                Ok(())
            } else {
                Err(Diagnostic::syntax("unclosed `{`", open).with_note("the body was never closed with `}`"))
            }
        })
    }
}
