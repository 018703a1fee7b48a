//! Check statements.

use starlight_core::types::Type;

use crate::frontend::ast::*;
use crate::frontend::diagnostics::{Diagnostic, errors};

use super::{TypeChecker, iteration_element};

impl TypeChecker<'_> {
    pub(super) fn check_statements(&mut self, statements: &mut [Spanned<Statement>]) {
        for stmt in statements {
            self.check_stmt(&mut stmt.node, stmt.span);
        }
    }

    pub(super) fn check_stmt(&mut self, stmt: &mut Statement, span: Span) {
        match stmt {
            Statement::Var(var) => self.check_var(var),
            Statement::Block(block) => self.check_statements(&mut block.statements),
            Statement::If(stmt) => {
                self.check_condition(&mut stmt.condition);
                self.check_statements(&mut stmt.then_block.statements);
                if let Some(else_branch) = &mut stmt.else_branch {
                    self.check_stmt(&mut else_branch.node, else_branch.span);
                }
            }
            Statement::While(stmt) => {
                self.check_condition(&mut stmt.condition);
                self.check_statements(&mut stmt.body.statements);
            }
            Statement::ForIn(stmt) => {
                let iterable = self.check_expr(&mut stmt.iterable, None);
                let element = self.element_of(&iterable, stmt.iterable.span);
                if let Some(id) = stmt.symbol {
                    self.symbols.set_type(id, element.clone());
                }
                stmt.element = Some(element);
                self.check_statements(&mut stmt.body.statements);
            }
            Statement::ForC(stmt) => {
                if let Some(init) = &mut stmt.init {
                    self.check_stmt(&mut init.node, init.span);
                }
                if let Some(condition) = &mut stmt.condition {
                    self.check_condition(condition);
                }
                if let Some(update) = &mut stmt.update {
                    self.check_expr(update, None);
                }
                self.check_statements(&mut stmt.body.statements);
            }
            Statement::Return(ret) => self.check_return(ret, span),
            Statement::Break | Statement::Continue => {}
            Statement::Expr(stmt) => {
                self.check_expr(&mut stmt.expr, None);
            }
        }
    }

    fn check_condition(&mut self, condition: &mut Expression) {
        let ty = self.check_expr(condition, Some(&Type::boolean()));
        self.expect_boolean(&ty, condition.span);
    }

    /// Element type of a `for` iterable; reports non-iterables.
    pub(super) fn element_of(&mut self, iterable: &Type, span: Span) -> Type {
        if iterable.is_unresolved() {
            return Type::Unresolved;
        }
        match iteration_element(iterable) {
            Some(element) => element,
            None => {
                let hint = if iterable.is_nullable() {
                    "check the value for null first, or assert it with `!!`"
                } else {
                    "only `List`, `Range` (`a..b`) and `string` values can be iterated"
                };
                self.error(errors::type_mismatch("an iterable value", &iterable.to_string(), span).with_hint(hint));
                Type::Unresolved
            }
        }
    }

    fn check_var(&mut self, var: &mut VarDecl) {
        let declared = var.ty.as_ref().map(|ty| self.lower_type(ty));
        let ty = match (&mut var.init, declared) {
            (Some(init), Some(declared)) => {
                let found = self.check_expr(init, Some(&declared));
                self.expect_assignable(&found, &declared, init.span);
                declared
            }
            (Some(init), None) => {
                let found = self.check_expr(init, None);
                if found.is_void() {
                    self.error(Diagnostic::type_mismatch(
                        format!("`{}` cannot hold the result of a `void` expression", var.name),
                        init.span,
                    ));
                    Type::Unresolved
                } else if found.is_null() {
                    self.error(errors::cannot_infer(&format!("`{}` from `null` alone", var.name), var.name_span));
                    Type::Unresolved
                } else {
                    found
                }
            }
            (None, Some(declared)) => declared,
            (None, None) => {
                self.error(errors::cannot_infer(&format!("`{}`", var.name), var.name_span));
                Type::Unresolved
            }
        };
        if let Some(id) = var.symbol {
            self.symbols.set_type(id, ty.clone());
        }
        var.resolved = Some(ty);
    }

    fn check_return(&mut self, ret: &mut ReturnStmt, span: Span) {
        let declared = self.frames.last().and_then(|f| f.declared_ret.clone());
        let found = match &mut ret.value {
            Some(value) => {
                let expected = declared.as_ref().filter(|d| !d.is_void());
                let found = self.check_expr(value, expected);
                if let Some(declared) = &declared {
                    if declared.is_void() && !found.is_void() && !found.is_unresolved() {
                        self.error(errors::type_mismatch("void", &found.to_string(), value.span));
                    } else if !declared.is_void() {
                        self.expect_assignable(&found, declared, value.span);
                    }
                }
                found
            }
            None => {
                if let Some(declared) = &declared {
                    if !declared.is_void() && !declared.is_unresolved() {
                        self.error(errors::type_mismatch(&declared.to_string(), "void", span));
                    }
                }
                Type::void()
            }
        };
        if let Some(frame) = self.frames.last_mut() {
            frame.returns.push(found);
        }
    }
}
