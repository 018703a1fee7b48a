//! Check declarations: function bodies, class members, interface conformance.

use starlight_core::types::Type;

use crate::frontend::ast::*;
use crate::frontend::diagnostics::Diagnostic;
use crate::frontend::symbols::{SymbolKind, TypeDefKind};

use super::{Frame, TypeChecker, unify};

impl TypeChecker<'_> {
    pub(super) fn check_program(&mut self, program: &mut Program) {
        for decl in &mut program.declarations {
            self.check_declaration(&mut decl.node, decl.span);
        }
    }

    fn check_declaration(&mut self, decl: &mut Declaration, span: Span) {
        match decl {
            Declaration::Function(f) => self.check_function(f, None),
            Declaration::Class(c) => {
                let this_ty = Type::named(&c.name);
                self.check_supertypes(&c.name, c.name_span, &c.supertypes);
                for member in &mut c.members {
                    match member {
                        ClassMember::Field(field) => self.check_class_field(&mut field.node, &this_ty),
                        ClassMember::Method(method) => self.check_function(&mut method.node, Some(this_ty.clone())),
                    }
                }
            }
            Declaration::Data(d) => {
                let this_ty = Type::named(&d.name);
                self.check_supertypes(&d.name, d.name_span, &d.supertypes);
                for method in &mut d.methods {
                    self.check_function(&mut method.node, Some(this_ty.clone()));
                }
            }
            Declaration::Interface(_) => {}
            Declaration::Extension(e) => {
                let receiver = self.lower_type(&e.receiver);
                for func in &mut e.functions {
                    self.check_function(&mut func.node, Some(receiver.clone()));
                }
            }
            Declaration::Statement(stmt) => self.check_stmt(stmt, span),
        }
    }

    fn check_class_field(&mut self, var: &mut VarDecl, this_ty: &Type) {
        let declared = var.resolved.clone();
        let Some(init) = &mut var.init else {
            if declared.is_none() {
                self.error(crate::frontend::diagnostics::errors::cannot_infer(
                    &format!("field `{}`", var.name),
                    var.name_span,
                ));
            }
            return;
        };
        self.frames.push(Frame {
            declared_ret: None,
            returns: Vec::new(),
            is_async: false,
            this_ty: Some(this_ty.clone()),
        });
        let found = self.check_expr(init, declared.as_ref());
        self.frames.pop();
        match declared {
            Some(declared) => {
                self.expect_assignable(&found, &declared, init.span);
            }
            None => {
                var.resolved = Some(found.clone());
                if let Some(id) = var.symbol {
                    self.symbols.set_type(id, found);
                }
            }
        }
    }

    /// Supertypes must be interfaces, and every interface method must be implemented.
    fn check_supertypes(&mut self, name: &str, name_span: Span, supertypes: &[Spanned<Ident>]) {
        for supertype in supertypes {
            let Some(def) = self.symbols.type_def(&supertype.node) else { continue };
            if def.kind != TypeDefKind::Interface {
                self.error(Diagnostic::type_mismatch(
                    format!("`{}` is not an interface and cannot be implemented", supertype.node),
                    supertype.span,
                ));
                continue;
            }
            let required: Vec<SymbolId> = self.symbols.scope(def.members).symbols().to_vec();
            let own_members = self.symbols.type_def(name).map(|d| d.members);
            for sig_id in required {
                let method = self.symbols.symbol(sig_id).name.clone();
                let implementation = own_members.and_then(|scope| self.symbols.scope(scope).get(&method));
                let Some(implementation) = implementation else {
                    self.error(
                        Diagnostic::type_mismatch(
                            format!("`{name}` does not implement `{}.{method}`", supertype.node),
                            name_span,
                        )
                        .with_hint(format!("add a method `{method}` to `{name}`")),
                    );
                    continue;
                };
                self.check_implementation(implementation, sig_id, &supertype.node);
            }
        }
    }

    fn check_implementation(&mut self, implementation: SymbolId, required: SymbolId, interface: &str) {
        let symbol = self.symbols.symbol(implementation);
        let (name, span, kind) = (symbol.name.clone(), symbol.span, symbol.kind);
        if kind != SymbolKind::Method {
            self.error(Diagnostic::type_mismatch(
                format!("`{name}` must be a method to implement `{interface}.{name}`"),
                span,
            ));
            return;
        }
        let expected = self.function_type_of(required);
        let found = self.function_type_of(implementation);
        if !self.assignable(&found, &expected) {
            self.error(Diagnostic::type_mismatch(
                format!("`{name}` has type `{found}` but `{interface}.{name}` requires `{expected}`"),
                span,
            ));
        }
    }

    // ========================================================================
    // Functions
    // ========================================================================

    /// Check a function body for real, reporting diagnostics and recording its return type.
    pub(super) fn check_function(&mut self, f: &mut FunctionDecl, this_ty: Option<Type>) {
        self.check_defaults(f);
        let Some(id) = f.symbol else {
            self.infer_function(f, this_ty);
            return;
        };

        if f.return_type.is_none() {
            // Callers may already depend on the inferred type; it stays authoritative.
            let inferred = self.return_type_of(id);
            self.infer_function(f, this_ty);
            f.resolved_return = Some(inferred);
            return;
        }

        let declared = f.resolved_return.clone().unwrap_or(Type::Unresolved);
        self.frames.push(Frame {
            declared_ret: Some(declared.clone()),
            returns: Vec::new(),
            is_async: f.is_async,
            this_ty,
        });
        match &mut f.body {
            FunctionBody::Expr(expr) => {
                let found = self.check_expr(expr, Some(&declared));
                if !declared.is_void() {
                    self.expect_assignable(&found, &declared, expr.span);
                }
            }
            FunctionBody::Block(block) => {
                self.check_statements(&mut block.statements);
                if !declared.is_void() && !declared.is_unresolved() && !always_returns(&block.statements) {
                    self.error(Diagnostic::type_mismatch(
                        format!("`{}` must return a `{declared}` on every path", f.name),
                        f.name_span,
                    ));
                }
            }
        }
        self.frames.pop();
    }

    fn check_defaults(&mut self, f: &mut FunctionDecl) {
        for param in &mut f.params {
            let Some(default) = &mut param.default else { continue };
            let expected = param.resolved.clone().unwrap_or(Type::Unresolved);
            let found = self.check_expr(default, Some(&expected));
            self.expect_assignable(&found, &expected, default.span);
        }
    }

    /// Check the body of a function without a declared return type and return the inferred type.
    ///
    /// Returns are unified: agreeing numerics widen, anything else becomes a union. No return at
    /// all is `void`.
    pub(super) fn infer_function(&mut self, f: &mut FunctionDecl, this_ty: Option<Type>) -> Type {
        self.frames.push(Frame {
            declared_ret: None,
            returns: Vec::new(),
            is_async: f.is_async,
            this_ty,
        });
        let ty = match &mut f.body {
            FunctionBody::Expr(expr) => self.check_expr(expr, None),
            FunctionBody::Block(block) => {
                self.check_statements(&mut block.statements);
                Type::Unresolved
            }
        };
        let frame = self.frames.pop();
        if matches!(f.body, FunctionBody::Expr(_)) {
            return ty;
        }
        let returns = frame.map(|f| f.returns).unwrap_or_default();
        let mut inferred: Option<Type> = None;
        for ty in returns {
            inferred = Some(match inferred {
                None => ty,
                Some(acc) => unify(&acc, &ty),
            });
        }
        inferred.unwrap_or_else(Type::void)
    }
}

/// `true` if control cannot fall off the end of `statements`.
fn always_returns(statements: &[Spanned<Statement>]) -> bool {
    statements.iter().any(|s| statement_returns(&s.node))
}

fn statement_returns(stmt: &Statement) -> bool {
    match stmt {
        Statement::Return(_) => true,
        Statement::Block(block) => always_returns(&block.statements),
        Statement::If(stmt) => match &stmt.else_branch {
            Some(else_branch) => always_returns(&stmt.then_block.statements) && statement_returns(&else_branch.node),
            None => false,
        },
        Statement::While(stmt) => {
            matches!(stmt.condition.kind, ExprKind::Literal(Literal::Bool(true))) && !contains_break(&stmt.body.statements)
        }
        Statement::Expr(stmt) => match &stmt.expr.kind {
            ExprKind::Match(m) => m.arms.iter().all(|arm| match &arm.body.kind {
                ExprKind::Block(block) => always_returns(&block.statements),
                _ => false,
            }) && !m.arms.is_empty(),
            _ => false,
        },
        _ => false,
    }
}

fn contains_break(statements: &[Spanned<Statement>]) -> bool {
    statements.iter().any(|s| match &s.node {
        Statement::Break => true,
        Statement::Block(block) => contains_break(&block.statements),
        Statement::If(stmt) => {
            contains_break(&stmt.then_block.statements)
                || stmt
                    .else_branch
                    .as_ref()
                    .is_some_and(|e| contains_break(std::slice::from_ref(&**e)))
        }
        _ => false,
    })
}
