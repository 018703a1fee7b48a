//! Statements.

use starlight_core::types::Type;

use crate::frontend::ast::*;

use super::super::EmitResult;
use super::super::emitter::unwrap_parens;
use super::exprs::is_simple;
use super::{JsEmitter, default_value};

impl JsEmitter<'_> {
    pub(super) fn emit_statements(&mut self, statements: &[Spanned<Statement>]) -> EmitResult<()> {
        for stmt in statements {
            self.emit_stmt(&stmt.node, stmt.span)?;
        }
        Ok(())
    }

    pub(super) fn emit_stmt(&mut self, stmt: &Statement, span: Span) -> EmitResult<()> {
        match stmt {
            Statement::Var(var) => self.emit_var(var)?,
            Statement::Block(block) => {
                self.out.line("{");
                self.out.indent();
                self.emit_statements(&block.statements)?;
                self.out.close();
            }
            Statement::If(if_stmt) => self.emit_if(if_stmt)?,
            Statement::While(while_stmt) => {
                let condition = self.expr(&while_stmt.condition)?;
                self.out.open(&format!("while ({})", unwrap_parens(&condition)));
                self.in_loop(|s| s.emit_statements(&while_stmt.body.statements))?;
                self.out.close();
            }
            Statement::ForIn(for_in) => self.emit_for_in(for_in)?,
            Statement::ForC(for_c) => self.emit_for_c(for_c, span)?,
            Statement::Return(ret) => {
                if self.frame().in_iife {
                    return Err(self.unsupported("`return` inside a `match` or block expression", span));
                }
                match &ret.value {
                    Some(value) => {
                        let value = self.expr(value)?;
                        self.out.line(&format!("return {value};"));
                    }
                    None => self.out.line("return;"),
                }
            }
            Statement::Break | Statement::Continue => {
                let keyword = if matches!(stmt, Statement::Break) { "break" } else { "continue" };
                let frame = self.frame();
                if frame.in_iife && frame.loops == 0 {
                    return Err(self.unsupported(
                        format!("`{keyword}` inside a `match` or block expression"),
                        span,
                    ));
                }
                self.out.line(&format!("{keyword};"));
            }
            Statement::Expr(stmt) => self.emit_expr_stmt(&stmt.expr)?,
        }
        Ok(())
    }

    /// Declared or inferred type of a `val`/`var`.
    pub(super) fn var_type(&self, var: &VarDecl) -> Type {
        var.resolved
            .clone()
            .or_else(|| var.symbol.map(|id| self.symbol(id).ty.clone()))
            .unwrap_or_else(Type::any)
    }

    fn emit_var(&mut self, var: &VarDecl) -> EmitResult<()> {
        let value = match &var.init {
            Some(init) => self.expr(init)?,
            None => default_value(&self.var_type(var)).to_string(),
        };
        // Top-level bindings were named up front.
        let name = match var.symbol.and_then(|id| self.names.get(&id).cloned()) {
            Some(name) => name,
            None => self.declare_local(var.symbol, &var.name),
        };
        let keyword = if var.mutable { "let" } else { "const" };
        self.out.line(&format!("{keyword} {name} = {value};"));
        Ok(())
    }

    fn emit_if(&mut self, stmt: &IfStmt) -> EmitResult<()> {
        let condition = self.expr(&stmt.condition)?;
        self.out.open(&format!("if ({})", unwrap_parens(&condition)));
        self.emit_statements(&stmt.then_block.statements)?;
        let mut branch = stmt.else_branch.as_deref();
        while let Some(next) = branch {
            branch = None;
            match &next.node {
                Statement::If(inner) => {
                    let condition = self.expr(&inner.condition)?;
                    self.out
                        .reopen(&format!("else if ({})", unwrap_parens(&condition)));
                    self.emit_statements(&inner.then_block.statements)?;
                    branch = inner.else_branch.as_deref();
                }
                Statement::Block(block) => {
                    self.out.reopen("else");
                    self.emit_statements(&block.statements)?;
                }
                other => {
                    self.out.reopen("else");
                    self.emit_stmt(other, next.span)?;
                }
            }
        }
        self.out.close();
        Ok(())
    }

    fn emit_for_in(&mut self, stmt: &ForInStmt) -> EmitResult<()> {
        if let ExprKind::Range(range) = &stmt.iterable.kind {
            // Counted loop; the end is evaluated once.
            let start = self.expr(&range.start)?;
            let end = self.expr(&range.end)?;
            let name = self.declare_local(stmt.symbol, &stmt.var);
            if is_simple(&range.end) {
                self.out
                    .open(&format!("for (let {name} = {start}; {name} < {end}; {name}++)"));
            } else {
                let bound = self.temp("end");
                self.out.open(&format!(
                    "for (let {name} = {start}, {bound} = {end}; {name} < {bound}; {name}++)"
                ));
            }
        } else {
            let iterable = self.expr(&stmt.iterable)?;
            let name = self.declare_local(stmt.symbol, &stmt.var);
            self.out.open(&format!("for (const {name} of {iterable})"));
        }
        self.in_loop(|s| s.emit_statements(&stmt.body.statements))?;
        self.out.close();
        Ok(())
    }

    fn emit_for_c(&mut self, stmt: &ForCStmt, span: Span) -> EmitResult<()> {
        let init = match stmt.init.as_deref() {
            None => String::new(),
            Some(Spanned { node: Statement::Var(var), .. }) => {
                let value = match &var.init {
                    Some(init) => self.expr(init)?,
                    None => default_value(&self.var_type(var)).to_string(),
                };
                let name = self.declare_local(var.symbol, &var.name);
                let keyword = if var.mutable { "let" } else { "const" };
                format!("{keyword} {name} = {value}")
            }
            Some(Spanned { node: Statement::Expr(e), .. }) => unwrap_parens(&self.expr(&e.expr)?).to_string(),
            Some(_) => return Err(self.unsupported("this statement as a `for` initializer", span)),
        };
        let condition = match &stmt.condition {
            Some(condition) => unwrap_parens(&self.expr(condition)?).to_string(),
            None => String::new(),
        };
        let update = match &stmt.update {
            Some(update) => unwrap_parens(&self.expr(update)?).to_string(),
            None => String::new(),
        };
        self.out.open(&format!("for ({init}; {condition}; {update})"));
        self.in_loop(|s| s.emit_statements(&stmt.body.statements))?;
        self.out.close();
        Ok(())
    }

    /// An expression evaluated for its effects.
    pub(super) fn emit_expr_stmt(&mut self, expr: &Expression) -> EmitResult<()> {
        match &expr.kind {
            ExprKind::Match(m) => return self.emit_match_stmt(m),
            ExprKind::Block(block) => {
                self.out.line("{");
                self.out.indent();
                self.emit_statements(&block.statements)?;
                if let Some(value) = &block.value {
                    self.emit_expr_stmt(value)?;
                }
                self.out.close();
                return Ok(());
            }
            ExprKind::Literal(_) | ExprKind::Ident(_) | ExprKind::This | ExprKind::Lambda(_) => return Ok(()),
            _ => {}
        }
        let text = self.expr(expr)?;
        self.out.line(&format!("{};", unwrap_parens(&text)));
        Ok(())
    }
}
