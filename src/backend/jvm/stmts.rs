//! Statements.

use starlight_core::types::Type;

use crate::frontend::ast::*;

use super::super::EmitResult;
use super::exprs::is_simple;
use super::types::default_value;
use super::{JvmEmitter, member_name, unwrap_parens};

impl JvmEmitter<'_> {
    pub(super) fn emit_statements(&mut self, statements: &[Spanned<Statement>]) -> EmitResult<()> {
        for stmt in statements {
            self.emit_stmt(&stmt.node)?;
        }
        Ok(())
    }

    pub(super) fn emit_stmt(&mut self, stmt: &Statement) -> EmitResult<()> {
        match stmt {
            Statement::Var(var) => self.emit_var(var)?,
            Statement::Block(block) => {
                self.out.line("{");
                self.out.indent();
                self.emit_statements(&block.statements)?;
                self.out.close();
            }
            Statement::If(if_stmt) => self.emit_if(if_stmt)?,
            Statement::While(while_stmt) => self.emit_while(while_stmt)?,
            Statement::ForIn(for_in) => self.emit_for_in(for_in)?,
            Statement::ForC(for_c) => self.emit_for_c(for_c)?,
            Statement::Return(ret) => self.emit_return(ret)?,
            Statement::Break => self.out.line("break;"),
            Statement::Continue => self.out.line("continue;"),
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
        let ty = self.var_type(var);
        if var.symbol.is_some_and(|id| self.globals.contains(&id)) {
            if let Some(init) = &var.init {
                let value = self.expr_as(init, &ty)?;
                self.out
                    .line(&format!("{}.{} = {value};", self.class_name, member_name(&var.name)));
            }
            return Ok(());
        }
        let java = self.java_type(&ty, var.name_span)?;
        let value = match &var.init {
            Some(init) => self.expr_as(init, &ty)?,
            None => default_value(&ty).to_string(),
        };
        // Declared after the initializer: `val x = x + 1` reads the outer `x`.
        let name = self.declare_local(var.symbol, &var.name);
        let modifier = if var.mutable { "" } else { "final " };
        self.out.line(&format!("{modifier}{java} {name} = {value};"));
        Ok(())
    }

    fn emit_return(&mut self, ret: &ReturnStmt) -> EmitResult<()> {
        let Some(value) = &ret.value else {
            self.out.line("return;");
            return Ok(());
        };
        let target = self.return_ty.clone().unwrap_or(Type::Unresolved);
        if target.is_void() {
            self.emit_expr_stmt(value)?;
            self.out.line("return;");
        } else {
            let text = self.expr_as(value, &target)?;
            self.out.line(&format!("return {text};"));
        }
        Ok(())
    }

    fn emit_if(&mut self, stmt: &IfStmt) -> EmitResult<()> {
        let condition = self.expr(&stmt.condition)?;
        self.out.open(&format!("if ({})", unwrap_parens(&condition)));
        self.emit_statements(&stmt.then_block.statements)?;

        // `else { <hoisted>; if (...) { } }` blocks still to close.
        let mut nested = 0;
        let mut branch = stmt.else_branch.as_deref();
        while let Some(next) = branch {
            branch = None;
            match &next.node {
                Statement::If(inner) => {
                    let mut condition = String::new();
                    let hoisted = self.capture_at(self.out.level(), |s| {
                        condition = s.expr(&inner.condition)?;
                        Ok(())
                    })?;
                    let condition = unwrap_parens(&condition).to_string();
                    if hoisted.is_empty() {
                        self.out.reopen(&format!("else if ({condition})"));
                    } else {
                        self.out.reopen("else");
                        self.out.raw(&hoisted);
                        self.out.open(&format!("if ({condition})"));
                        nested += 1;
                    }
                    self.emit_statements(&inner.then_block.statements)?;
                    branch = inner.else_branch.as_deref();
                }
                Statement::Block(block) => {
                    self.out.reopen("else");
                    self.emit_statements(&block.statements)?;
                }
                other => {
                    self.out.reopen("else");
                    self.emit_stmt(other)?;
                }
            }
        }
        self.out.close();
        for _ in 0..nested {
            self.out.close();
        }
        Ok(())
    }

    fn emit_while(&mut self, stmt: &WhileStmt) -> EmitResult<()> {
        let mut condition = String::new();
        let hoisted = self.capture_at(self.out.level() + 1, |s| {
            condition = s.expr(&stmt.condition)?;
            Ok(())
        })?;
        let condition = unwrap_parens(&condition).to_string();
        if hoisted.is_empty() {
            self.out.open(&format!("while ({condition})"));
        } else {
            self.out.open("while (true)");
            self.out.raw(&hoisted);
            self.out.open(&format!("if (!({condition}))"));
            self.out.line("break;");
            self.out.close();
        }
        self.emit_statements(&stmt.body.statements)?;
        self.out.close();
        Ok(())
    }

    fn emit_for_in(&mut self, stmt: &ForInStmt) -> EmitResult<()> {
        let element = stmt
            .element
            .clone()
            .or_else(|| stmt.symbol.map(|id| self.symbol(id).ty.clone()))
            .unwrap_or_else(Type::any);
        let java = self.java_type(&element, stmt.var_span)?;

        if let ExprKind::Range(range) = &stmt.iterable.kind {
            // Counted loop; bounds are evaluated once, start first.
            let mut start = self.expr_as(&range.start, &element)?;
            let mut end = self.expr_as(&range.end, &element)?;
            if !is_simple(&range.end) {
                if !is_simple(&range.start) {
                    let temp = self.temp("start");
                    self.out.line(&format!("final {java} {temp} = {start};"));
                    start = temp;
                }
                let temp = self.temp("end");
                self.out.line(&format!("final {java} {temp} = {end};"));
                end = temp;
            }
            let name = self.declare_local(stmt.symbol, &stmt.var);
            if let Some(id) = stmt.symbol {
                self.counters.insert(id);
            }
            self.out
                .open(&format!("for ({java} {name} = {start}; {name} < {end}; {name}++)"));
        } else {
            let iterable = self.expr(&stmt.iterable)?;
            let source = if stmt.iterable.ty().non_null().is_string() {
                format!("{iterable}.toCharArray()")
            } else {
                iterable
            };
            let name = self.declare_local(stmt.symbol, &stmt.var);
            self.out.open(&format!("for (final {java} {name} : {source})"));
        }
        self.emit_statements(&stmt.body.statements)?;
        self.out.close();
        Ok(())
    }

    fn emit_for_c(&mut self, stmt: &ForCStmt) -> EmitResult<()> {
        let (init, condition, update) = self.without_hoisting("a `for` loop header", |s| {
            let init = match stmt.init.as_deref() {
                None => String::new(),
                Some(Spanned { node: Statement::Var(var), .. }) => {
                    let ty = s.var_type(var);
                    let java = s.java_type(&ty, var.name_span)?;
                    let value = match &var.init {
                        Some(init) => s.expr_as(init, &ty)?,
                        None => default_value(&ty).to_string(),
                    };
                    let name = s.declare_local(var.symbol, &var.name);
                    format!("{java} {name} = {value}")
                }
                Some(Spanned { node: Statement::Expr(e), span }) => match s.statement_expr(&e.expr)? {
                    Some(text) => text,
                    None => return Err(s.unsupported("this expression as a `for` initializer", *span)),
                },
                Some(other) => return Err(s.unsupported("this statement as a `for` initializer", other.span)),
            };
            let condition = match &stmt.condition {
                Some(condition) => unwrap_parens(&s.expr(condition)?).to_string(),
                None => String::new(),
            };
            let update = match &stmt.update {
                Some(update) => match s.statement_expr(update)? {
                    Some(text) => text,
                    None => return Err(s.unsupported("this expression as a `for` update", update.span)),
                },
                None => String::new(),
            };
            Ok((init, condition, update))
        })?;
        self.out.open(&format!("for ({init}; {condition}; {update})"));
        self.emit_statements(&stmt.body.statements)?;
        self.out.close();
        Ok(())
    }

    /// An expression evaluated for its effects.
    pub(super) fn emit_expr_stmt(&mut self, expr: &Expression) -> EmitResult<()> {
        if let ExprKind::MethodCall(call) = &expr.kind {
            if call.safe {
                return self.emit_safe_call_stmt(call, expr.span);
            }
        }
        if let Some(text) = self.statement_expr(expr)? {
            self.out.line(&format!("{text};"));
            return Ok(());
        }
        if matches!(
            expr.kind,
            ExprKind::Literal(_) | ExprKind::Ident(_) | ExprKind::This | ExprKind::Lambda(_)
        ) {
            return Ok(());
        }
        let text = self.expr(expr)?;
        if text.is_empty() || is_plain_name(&text) {
            return Ok(());
        }
        let temp = self.temp("d");
        self.out.line(&format!("final Object {temp} = {text};"));
        Ok(())
    }

    /// `r?.m()` as a statement: the arguments are only evaluated when `r` is not null.
    fn emit_safe_call_stmt(&mut self, call: &MethodCallExpr, span: Span) -> EmitResult<()> {
        let receiver_ty = call.receiver.ty();
        let receiver = self.expr(&call.receiver)?;
        let (receiver, guard) = self.guard_receiver(receiver, &call.receiver, &receiver_ty, true)?;
        let guard = guard.unwrap_or_else(|| receiver.clone());
        self.out.open(&format!("if ({guard} != null)"));
        let access = self.method_access(call, &receiver, &receiver_ty.non_null(), span)?;
        self.out.line(&format!("{access};"));
        self.out.close();
        Ok(())
    }
}

fn is_plain_name(text: &str) -> bool {
    text.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '.')
}
