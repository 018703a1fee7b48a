//! Check expressions and resolve their types.
//!
//! This module owns the expression-checking entrypoint (`check_expr`) and delegates to themed
//! submodules. Expression checking is error-accumulating: on invalid input it returns
//! [`Type::Unresolved`] so later checks can continue.
//!
//! `expected` carries the contextual type (declared variable type, parameter type, return type)
//! and is only used to type otherwise ambiguous forms: empty collection literals and lambda
//! parameters. Assignability is always checked by the caller.

use starlight_core::types::{LIST, MAP, Type};

use crate::frontend::ast::*;
use crate::frontend::diagnostics::{Diagnostic, errors};
use crate::frontend::symbols::SymbolKind;

use super::{Frame, TypeChecker, unify};

mod access;
mod calls;
mod match_;
mod ops;

impl TypeChecker<'_> {
    // ========================================================================
    // Expressions
    // ========================================================================

    /// Check an expression, record its type on the node and return it.
    pub(crate) fn check_expr(&mut self, expr: &mut Expression, expected: Option<&Type>) -> Type {
        let span = expr.span;
        let ty = match &mut expr.kind {
            ExprKind::Literal(lit) => literal_type(lit),
            ExprKind::Ident(ident) => self.check_ident(ident),
            ExprKind::This => self.this_type().unwrap_or(Type::Unresolved),
            ExprKind::Template(template) => {
                for part in &mut template.parts {
                    if let TemplatePart::Expr(e) = part {
                        self.check_expr(e, None);
                    }
                }
                Type::string()
            }
            ExprKind::List(list) => self.check_list(list, expected, span),
            ExprKind::Map(map) => self.check_map(map, expected, span),
            ExprKind::Binary(binary) => self.check_binary(binary, span),
            ExprKind::Unary(unary) => self.check_unary(unary, span),
            ExprKind::Postfix(postfix) => self.check_postfix(postfix),
            ExprKind::Assign(assign) => self.check_assign(assign),
            ExprKind::Conditional(cond) => {
                let condition = self.check_expr(&mut cond.condition, Some(&Type::boolean()));
                self.expect_boolean(&condition, cond.condition.span);
                let then_ty = self.check_expr(&mut cond.then_expr, expected);
                let else_ty = self.check_expr(&mut cond.else_expr, expected);
                unify(&then_ty, &else_ty)
            }
            ExprKind::Call(call) => self.check_call(call, span),
            ExprKind::MethodCall(call) => self.check_method_call(call, span),
            ExprKind::Member(member) => self.check_member(member, span),
            ExprKind::NonNull(nn) => self.check_expr(&mut nn.operand, None).non_null(),
            ExprKind::Index(index) => self.check_index(index, span, false),
            ExprKind::Range(range) => self.check_range(range, span),
            ExprKind::Await(await_expr) => {
                if !self.frames.last().is_some_and(|f| f.is_async) {
                    self.error(
                        errors::invalid_context("`await` is only allowed inside an `async fun`", span)
                            .with_hint("mark the enclosing function `async`"),
                    );
                }
                self.check_expr(&mut await_expr.operand, None)
            }
            ExprKind::Lambda(lambda) => self.check_lambda(lambda, expected),
            ExprKind::Comprehension(comp) => {
                let iterable = self.check_expr(&mut comp.iterable, None);
                let element = self.element_of(&iterable, comp.iterable.span);
                if let Some(id) = comp.symbol {
                    self.symbols.set_type(id, element);
                }
                if let Some(condition) = &mut comp.condition {
                    let ty = self.check_expr(condition, Some(&Type::boolean()));
                    self.expect_boolean(&ty, condition.span);
                }
                let expected_element = expected.and_then(|e| e.non_null().element_type().cloned());
                let element = self.check_expr(&mut comp.element, expected_element.as_ref());
                if element.is_void() {
                    self.error(errors::type_mismatch("a value", "void", comp.element.span));
                }
                Type::list(element)
            }
            ExprKind::Match(m) => self.check_match(m, expected),
            ExprKind::Block(block) => {
                self.check_statements(&mut block.statements);
                match &mut block.value {
                    Some(value) => self.check_expr(value, expected),
                    None => Type::void(),
                }
            }
        };
        expr.ty = Some(ty.clone());
        ty
    }

    fn check_ident(&mut self, ident: &IdentRef) -> Type {
        let Some(id) = ident.symbol else {
            return Type::Unresolved;
        };
        match self.symbols.symbol(id).kind {
            SymbolKind::Function | SymbolKind::Method | SymbolKind::Class | SymbolKind::DataClass => {
                self.function_type_of(id)
            }
            SymbolKind::Interface => Type::named(&ident.name),
            _ => self.symbols.symbol(id).ty.clone(),
        }
    }

    // ========================================================================
    // Collections
    // ========================================================================

    fn check_list(&mut self, list: &mut ListExpr, expected: Option<&Type>, span: Span) -> Type {
        let contextual = expected.map(Type::non_null).filter(|t| t.as_generic().is_some_and(|(n, _)| n == LIST));
        if let Some(list_ty) = contextual {
            let element = list_ty.element_type().cloned().unwrap_or(Type::Unresolved);
            for e in &mut list.elements {
                let found = self.check_expr(e, Some(&element));
                self.expect_assignable(&found, &element, e.span);
            }
            return list_ty;
        }
        if list.elements.is_empty() {
            self.error(errors::cannot_infer("an empty list literal", span));
            return Type::Unresolved;
        }
        let mut element: Option<Type> = None;
        for e in &mut list.elements {
            let found = self.check_expr(e, None);
            element = Some(match element {
                None => found,
                Some(acc) => unify(&acc, &found),
            });
        }
        Type::list(element.unwrap_or(Type::Unresolved))
    }

    fn check_map(&mut self, map: &mut MapExpr, expected: Option<&Type>, span: Span) -> Type {
        let contextual = expected.map(Type::non_null).filter(|t| t.as_generic().is_some_and(|(n, _)| n == MAP));
        if let Some(map_ty) = contextual {
            let (key, value) = match map_ty.as_generic() {
                Some((_, [k, v])) => (k.clone(), v.clone()),
                _ => (Type::Unresolved, Type::Unresolved),
            };
            for (k, v) in &mut map.entries {
                let found = self.check_expr(k, Some(&key));
                self.expect_assignable(&found, &key, k.span);
                let found = self.check_expr(v, Some(&value));
                self.expect_assignable(&found, &value, v.span);
            }
            return map_ty;
        }
        if map.entries.is_empty() {
            self.error(errors::cannot_infer("an empty map literal", span));
            return Type::Unresolved;
        }
        let mut key: Option<Type> = None;
        let mut value: Option<Type> = None;
        for (k, v) in &mut map.entries {
            let kt = self.check_expr(k, None);
            let vt = self.check_expr(v, None);
            key = Some(key.map_or(kt.clone(), |acc| unify(&acc, &kt)));
            value = Some(value.map_or(vt.clone(), |acc| unify(&acc, &vt)));
        }
        Type::map(key.unwrap_or(Type::Unresolved), value.unwrap_or(Type::Unresolved))
    }

    fn check_range(&mut self, range: &mut RangeExpr, span: Span) -> Type {
        let start = self.check_expr(&mut range.start, None);
        let end = self.check_expr(&mut range.end, None);
        if start.is_unresolved() || end.is_unresolved() {
            return Type::range(if start.is_unresolved() { end } else { start });
        }
        if !start.is_integral() || !end.is_integral() {
            self.error(Diagnostic::type_mismatch(
                format!("range bounds must be `int` or `long`, found `{start}` and `{end}`"),
                span,
            ));
            return Type::Unresolved;
        }
        Type::range(start.widen_numeric(&end).unwrap_or(start))
    }

    // ========================================================================
    // Lambdas
    // ========================================================================

    fn check_lambda(&mut self, lambda: &mut LambdaExpr, expected: Option<&Type>) -> Type {
        let contextual = match expected.map(Type::non_null) {
            Some(Type::Function { params, ret }) if params.len() == lambda.params.len() => Some((params, *ret)),
            _ => None,
        };
        let mut params = Vec::with_capacity(lambda.params.len());
        for (i, param) in lambda.params.iter_mut().enumerate() {
            let ty = match &param.ty {
                Some(ty) => self.lower_type(ty),
                None => contextual
                    .as_ref()
                    .and_then(|(p, _)| p.get(i).cloned())
                    .unwrap_or(Type::Unresolved),
            };
            param.resolved = Some(ty.clone());
            if let Some(id) = param.symbol {
                self.symbols.set_type(id, ty.clone());
            }
            params.push(ty);
        }

        let declared = lambda.return_type.as_ref().map(|ty| self.lower_type(ty));
        let this_ty = self.this_type();
        self.frames.push(Frame {
            declared_ret: declared.clone(),
            returns: Vec::new(),
            is_async: false,
            this_ty,
        });
        let body_ty = match &mut lambda.body {
            LambdaBody::Expr(body) => {
                let hint = declared.clone().or_else(|| contextual.as_ref().map(|(_, r)| r.clone()));
                let found = self.check_expr(body, hint.as_ref().filter(|t| !t.is_void()));
                if let Some(declared) = &declared {
                    if !declared.is_void() {
                        self.expect_assignable(&found, declared, body.span);
                    }
                }
                Some(found)
            }
            LambdaBody::Block(block) => {
                self.check_statements(&mut block.statements);
                None
            }
        };
        let frame = self.frames.pop();

        let ret = match (declared, body_ty) {
            (Some(declared), _) => declared,
            (None, Some(found)) => found,
            (None, None) => frame
                .map(|f| f.returns)
                .unwrap_or_default()
                .into_iter()
                .reduce(|a, b| unify(&a, &b))
                .unwrap_or_else(Type::void),
        };
        Type::function(params, ret)
    }
}

/// Intrinsic type of a literal.
pub(crate) fn literal_type(lit: &Literal) -> Type {
    match lit {
        Literal::Int(_) => Type::int(),
        Literal::Long(_) => Type::long(),
        Literal::Float(_) => Type::float(),
        Literal::Double(_) => Type::double(),
        Literal::String(_) => Type::string(),
        Literal::Bool(_) => Type::boolean(),
        Literal::Null => Type::null(),
    }
}
