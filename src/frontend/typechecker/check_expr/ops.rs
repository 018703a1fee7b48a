//! Check unary, binary, postfix and assignment operators.
//!
//! Numeric semantics:
//!
//! - Arithmetic widens along `int < long < float < double`
//! - `+` with a `string` on either side is concatenation and yields `string`
//! - Comparisons accept two numerics, two strings or two chars; equality accepts anything
//! - `&&`, `||` and `!` take booleans only

use starlight_core::types::Type;

use crate::frontend::ast::*;
use crate::frontend::diagnostics::{Diagnostic, errors};
use crate::frontend::symbols::SymbolKind;

use super::TypeChecker;

impl TypeChecker<'_> {
    pub(in crate::frontend::typechecker) fn check_binary(&mut self, binary: &mut BinaryExpr, span: Span) -> Type {
        if binary.op.is_logical() {
            let left = self.check_expr(&mut binary.left, Some(&Type::boolean()));
            self.expect_boolean(&left, binary.left.span);
            let right = self.check_expr(&mut binary.right, Some(&Type::boolean()));
            self.expect_boolean(&right, binary.right.span);
            return Type::boolean();
        }
        let left = self.check_expr(&mut binary.left, None);
        let right = self.check_expr(&mut binary.right, None);
        self.binary_result(binary.op, &left, &right, span)
    }

    /// Result type of `left op right` for already checked operands.
    pub(in crate::frontend::typechecker) fn binary_result(
        &mut self,
        op: BinaryOp,
        left: &Type,
        right: &Type,
        span: Span,
    ) -> Type {
        if op.is_equality() || op.is_logical() {
            return Type::boolean();
        }
        if op.is_comparison() {
            let comparable = left.is_unresolved()
                || right.is_unresolved()
                || (left.is_numeric() && right.is_numeric())
                || (left.is_string() && right.is_string())
                || (*left == Type::char() && *right == Type::char());
            if !comparable {
                self.error(Diagnostic::type_mismatch(
                    format!("cannot compare `{left}` with `{right}` using `{}`", op.as_str()),
                    span,
                ));
            }
            return Type::boolean();
        }

        // Arithmetic.
        if op == BinaryOp::Add && (left.is_string() || right.is_string()) {
            return Type::string();
        }
        if left.is_unresolved() || right.is_unresolved() {
            return Type::Unresolved;
        }
        if let Some(widened) = left.widen_numeric(right) {
            return widened;
        }
        let mut diagnostic = Diagnostic::type_mismatch(
            format!("operator `{}` cannot be applied to `{left}` and `{right}`", op.as_str()),
            span,
        );
        if left.is_nullable() || right.is_nullable() {
            diagnostic = diagnostic.with_hint("a nullable operand must be checked for null or asserted with `!!`");
        }
        self.error(diagnostic);
        Type::Unresolved
    }

    pub(in crate::frontend::typechecker) fn check_unary(&mut self, unary: &mut UnaryExpr, span: Span) -> Type {
        match unary.op {
            UnaryOp::Not => {
                let ty = self.check_expr(&mut unary.operand, Some(&Type::boolean()));
                self.expect_boolean(&ty, unary.operand.span);
                Type::boolean()
            }
            UnaryOp::Neg | UnaryOp::Plus => {
                let ty = self.check_expr(&mut unary.operand, None);
                if ty.is_unresolved() || ty.is_numeric() {
                    return ty;
                }
                self.error(Diagnostic::type_mismatch(
                    format!("operator `{}` cannot be applied to `{ty}`", unary.op.as_str()),
                    span,
                ));
                Type::Unresolved
            }
        }
    }

    pub(in crate::frontend::typechecker) fn check_postfix(&mut self, postfix: &mut PostfixExpr) -> Type {
        let ty = self.check_target(&mut postfix.operand);
        if !ty.is_unresolved() && !ty.is_numeric() {
            self.error(Diagnostic::type_mismatch(
                format!("operator `{}` requires a numeric variable, found `{ty}`", postfix.op.as_str()),
                postfix.operand.span,
            ));
            return Type::Unresolved;
        }
        ty
    }

    pub(in crate::frontend::typechecker) fn check_assign(&mut self, assign: &mut AssignExpr) -> Type {
        let target = self.check_target(&mut assign.target);
        let value = self.check_expr(&mut assign.value, Some(&target));
        match assign.op.binary_op() {
            None => {
                self.expect_assignable(&value, &target, assign.value.span);
            }
            Some(op) => {
                let span = assign.target.span.merge(assign.value.span);
                let result = self.binary_result(op, &target, &value, span);
                if !result.is_unresolved() {
                    self.expect_assignable(&result, &target, span);
                }
            }
        }
        target
    }

    /// Check an assignment or increment target and return the type it stores.
    ///
    /// Targets are variables, fields and index expressions; `val` bindings, parameters and
    /// header fields are immutable.
    fn check_target(&mut self, target: &mut Expression) -> Type {
        let span = target.span;
        let ty = match &mut target.kind {
            ExprKind::Ident(ident) => {
                let ty = self.check_ident(ident);
                if let Some(id) = ident.symbol {
                    let symbol = self.symbols.symbol(id);
                    let assignable_kind = matches!(
                        symbol.kind,
                        SymbolKind::Variable | SymbolKind::Parameter | SymbolKind::Field | SymbolKind::Unresolved
                    );
                    if !assignable_kind || (!symbol.mutable && symbol.kind != SymbolKind::Unresolved) {
                        let name = symbol.name.clone();
                        self.error(errors::immutable_assignment(&name, span));
                    }
                }
                ty
            }
            ExprKind::Member(member) => {
                let ty = self.check_member(member, span);
                if let Some(field) = self.field_symbol(&member.object, &member.field) {
                    if !self.symbols.symbol(field).mutable {
                        self.error(errors::immutable_assignment(&member.field, span));
                    }
                }
                ty
            }
            ExprKind::Index(index) => self.check_index(index, span, true),
            _ => {
                self.error(errors::invalid_context("invalid assignment target", span));
                Type::Unresolved
            }
        };
        target.ty = Some(ty.clone());
        ty
    }
}
