//! Lower checked sugar into core forms shared by every backend.
//!
//! - `[e | for x in xs if c]` becomes a block expression that fills an accumulator list:
//!   `{ var $acc0 = []; for x in xs { if c { $acc0.add(e) } }; $acc0 }`
//! - `"a ${b} c"` becomes the left-nested concatenation `("a" + b) + " c"`
//!
//! Runs bottom-up after checking, so every synthesized node carries its type.

use starlight_core::lang::members::MemberId;
use starlight_core::types::Type;

use crate::frontend::ast::*;
use crate::frontend::symbols::{Symbol, SymbolKind, SymbolTable};

use super::iteration_element;

pub(super) fn desugar(program: &mut Program, symbols: &mut SymbolTable) {
    let mut desugarer = Desugarer { symbols, next_acc: 0 };
    for decl in &mut program.declarations {
        desugarer.visit_declaration(&mut decl.node);
    }
}

struct Desugarer<'s> {
    symbols: &'s mut SymbolTable,
    next_acc: u32,
}

impl Desugarer<'_> {
    fn visit_declaration(&mut self, decl: &mut Declaration) {
        match decl {
            Declaration::Function(f) => self.visit_function(f),
            Declaration::Class(c) => {
                for member in &mut c.members {
                    match member {
                        ClassMember::Field(field) => self.visit_var(&mut field.node),
                        ClassMember::Method(method) => self.visit_function(&mut method.node),
                    }
                }
            }
            Declaration::Data(d) => {
                for method in &mut d.methods {
                    self.visit_function(&mut method.node);
                }
            }
            Declaration::Interface(_) => {}
            Declaration::Extension(e) => {
                for func in &mut e.functions {
                    self.visit_function(&mut func.node);
                }
            }
            Declaration::Statement(stmt) => self.visit_stmt(stmt),
        }
    }

    fn visit_function(&mut self, f: &mut FunctionDecl) {
        for param in &mut f.params {
            if let Some(default) = &mut param.default {
                self.visit_expr(default);
            }
        }
        match &mut f.body {
            FunctionBody::Block(block) => self.visit_block(block),
            FunctionBody::Expr(expr) => self.visit_expr(expr),
        }
    }

    fn visit_block(&mut self, block: &mut Block) {
        self.visit_statements(&mut block.statements);
    }

    fn visit_statements(&mut self, statements: &mut [Spanned<Statement>]) {
        for stmt in statements {
            self.visit_stmt(&mut stmt.node);
        }
    }

    fn visit_var(&mut self, var: &mut VarDecl) {
        if let Some(init) = &mut var.init {
            self.visit_expr(init);
        }
    }

    fn visit_stmt(&mut self, stmt: &mut Statement) {
        match stmt {
            Statement::Var(var) => self.visit_var(var),
            Statement::Block(block) => self.visit_block(block),
            Statement::If(stmt) => {
                self.visit_expr(&mut stmt.condition);
                self.visit_block(&mut stmt.then_block);
                if let Some(else_branch) = &mut stmt.else_branch {
                    self.visit_stmt(&mut else_branch.node);
                }
            }
            Statement::While(stmt) => {
                self.visit_expr(&mut stmt.condition);
                self.visit_block(&mut stmt.body);
            }
            Statement::ForIn(stmt) => {
                self.visit_expr(&mut stmt.iterable);
                self.visit_block(&mut stmt.body);
            }
            Statement::ForC(stmt) => {
                if let Some(init) = &mut stmt.init {
                    self.visit_stmt(&mut init.node);
                }
                if let Some(condition) = &mut stmt.condition {
                    self.visit_expr(condition);
                }
                if let Some(update) = &mut stmt.update {
                    self.visit_expr(update);
                }
                self.visit_block(&mut stmt.body);
            }
            Statement::Return(ret) => {
                if let Some(value) = &mut ret.value {
                    self.visit_expr(value);
                }
            }
            Statement::Break | Statement::Continue => {}
            Statement::Expr(stmt) => self.visit_expr(&mut stmt.expr),
        }
    }

    fn visit_expr(&mut self, expr: &mut Expression) {
        match &mut expr.kind {
            ExprKind::Literal(_) | ExprKind::Ident(_) | ExprKind::This => {}
            ExprKind::Template(t) => {
                for part in &mut t.parts {
                    if let TemplatePart::Expr(e) = part {
                        self.visit_expr(e);
                    }
                }
            }
            ExprKind::List(list) => {
                for e in &mut list.elements {
                    self.visit_expr(e);
                }
            }
            ExprKind::Map(map) => {
                for (k, v) in &mut map.entries {
                    self.visit_expr(k);
                    self.visit_expr(v);
                }
            }
            ExprKind::Binary(b) => {
                self.visit_expr(&mut b.left);
                self.visit_expr(&mut b.right);
            }
            ExprKind::Unary(u) => self.visit_expr(&mut u.operand),
            ExprKind::Postfix(p) => self.visit_expr(&mut p.operand),
            ExprKind::Assign(a) => {
                self.visit_expr(&mut a.target);
                self.visit_expr(&mut a.value);
            }
            ExprKind::Conditional(c) => {
                self.visit_expr(&mut c.condition);
                self.visit_expr(&mut c.then_expr);
                self.visit_expr(&mut c.else_expr);
            }
            ExprKind::Call(call) => {
                self.visit_expr(&mut call.callee);
                for arg in &mut call.args {
                    self.visit_expr(arg);
                }
            }
            ExprKind::MethodCall(call) => {
                self.visit_expr(&mut call.receiver);
                for arg in &mut call.args {
                    self.visit_expr(arg);
                }
            }
            ExprKind::Member(m) => self.visit_expr(&mut m.object),
            ExprKind::NonNull(n) => self.visit_expr(&mut n.operand),
            ExprKind::Index(i) => {
                self.visit_expr(&mut i.object);
                self.visit_expr(&mut i.index);
            }
            ExprKind::Range(r) => {
                self.visit_expr(&mut r.start);
                self.visit_expr(&mut r.end);
            }
            ExprKind::Await(a) => self.visit_expr(&mut a.operand),
            ExprKind::Lambda(lambda) => {
                for param in &mut lambda.params {
                    if let Some(default) = &mut param.default {
                        self.visit_expr(default);
                    }
                }
                match &mut lambda.body {
                    LambdaBody::Expr(e) => self.visit_expr(e),
                    LambdaBody::Block(block) => self.visit_block(block),
                }
            }
            ExprKind::Comprehension(comp) => {
                self.visit_expr(&mut comp.iterable);
                if let Some(condition) = &mut comp.condition {
                    self.visit_expr(condition);
                }
                self.visit_expr(&mut comp.element);
            }
            ExprKind::Match(m) => {
                self.visit_expr(&mut m.scrutinee);
                for arm in &mut m.arms {
                    if let Some(guard) = &mut arm.guard {
                        self.visit_expr(guard);
                    }
                    self.visit_expr(&mut arm.body);
                }
            }
            ExprKind::Block(block) => {
                self.visit_statements(&mut block.statements);
                if let Some(value) = &mut block.value {
                    self.visit_expr(value);
                }
            }
        }

        if matches!(expr.kind, ExprKind::Comprehension(_)) {
            self.lower_comprehension(expr);
        } else if matches!(expr.kind, ExprKind::Template(_)) {
            lower_template(expr);
        }
    }

    fn lower_comprehension(&mut self, expr: &mut Expression) {
        let span = expr.span;
        let ExprKind::Comprehension(comp) = std::mem::replace(&mut expr.kind, ExprKind::Literal(Literal::Null)) else {
            return;
        };
        let Comprehension {
            element,
            var,
            var_span,
            iterable,
            condition,
            symbol,
        } = *comp;
        let list_ty = expr.ty();
        let element_ty = iteration_element(&iterable.ty()).unwrap_or(Type::Unresolved);

        let name = format!("$acc{}", self.next_acc);
        self.next_acc += 1;
        let mut acc = Symbol::new(&name, SymbolKind::Variable, span).mutable(true);
        acc.ty = list_ty.clone();
        acc.used = true;
        let acc_id = self.symbols.detached(acc);
        let acc_ref = || typed(
            ExprKind::Ident(IdentRef {
                name: name.clone(),
                symbol: Some(acc_id),
            }),
            span,
            list_ty.clone(),
        );

        let declare = Statement::Var(VarDecl {
            mutable: true,
            name: name.clone(),
            name_span: span,
            ty: None,
            init: Some(typed(ExprKind::List(ListExpr { elements: Vec::new() }), span, list_ty.clone())),
            symbol: Some(acc_id),
            resolved: Some(list_ty.clone()),
        });
        let push = Spanned::new(
            Statement::Expr(ExprStmt {
                expr: typed(
                    ExprKind::MethodCall(MethodCallExpr {
                        receiver: Box::new(acc_ref()),
                        method: "add".to_string(),
                        method_span: span,
                        args: vec![element],
                        safe: false,
                        dispatch: Some(MethodDispatch::Builtin(MemberId::ListAdd)),
                    }),
                    span,
                    Type::void(),
                ),
            }),
            span,
        );
        let body = match condition {
            Some(condition) => Spanned::new(
                Statement::If(IfStmt {
                    condition,
                    then_block: Block {
                        statements: vec![push],
                        span,
                    },
                    else_branch: None,
                }),
                span,
            ),
            None => push,
        };
        let looped = Statement::ForIn(ForInStmt {
            var,
            var_span,
            iterable,
            body: Block {
                statements: vec![body],
                span,
            },
            symbol,
            element: Some(element_ty),
        });
        expr.kind = ExprKind::Block(Box::new(BlockExpr {
            statements: vec![Spanned::new(declare, span), Spanned::new(looped, span)],
            value: Some(acc_ref()),
        }));
    }
}

/// Replace a template with a left-nested `+` chain that starts from a string literal.
fn lower_template(expr: &mut Expression) {
    let span = expr.span;
    let ExprKind::Template(template) = std::mem::replace(&mut expr.kind, ExprKind::Literal(Literal::Null)) else {
        return;
    };
    let mut parts = template.parts.into_iter();
    let mut chain = match parts.next() {
        Some(TemplatePart::Text(text)) => string_literal(text, span),
        Some(TemplatePart::Expr(first)) => concat(string_literal(String::new(), span), first, span),
        None => string_literal(String::new(), span),
    };
    for part in parts {
        let next = match part {
            TemplatePart::Text(text) => string_literal(text, span),
            TemplatePart::Expr(e) => e,
        };
        chain = concat(chain, next, span);
    }
    *expr = chain;
}

fn concat(left: Expression, right: Expression, span: Span) -> Expression {
    typed(
        ExprKind::Binary(BinaryExpr {
            left: Box::new(left),
            op: BinaryOp::Add,
            right: Box::new(right),
        }),
        span,
        Type::string(),
    )
}

fn string_literal(text: String, span: Span) -> Expression {
    typed(ExprKind::Literal(Literal::String(text)), span, Type::string())
}

fn typed(kind: ExprKind, span: Span, ty: Type) -> Expression {
    Expression {
        kind,
        span,
        ty: Some(ty),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> TemplatePart {
        TemplatePart::Text(s.to_string())
    }

    fn ident(name: &str) -> TemplatePart {
        TemplatePart::Expr(typed(
            ExprKind::Ident(IdentRef {
                name: name.to_string(),
                symbol: None,
            }),
            Span::default(),
            Type::string(),
        ))
    }

    fn template(parts: Vec<TemplatePart>) -> Expression {
        typed(ExprKind::Template(TemplateExpr { parts }), Span::default(), Type::string())
    }

    #[test]
    fn test_template_starting_with_text() {
        let mut expr = template(vec![text("Hi "), ident("name"), text("!")]);
        lower_template(&mut expr);
        let ExprKind::Binary(outer) = &expr.kind else { panic!("expected +") };
        assert!(matches!(&outer.right.kind, ExprKind::Literal(Literal::String(s)) if s == "!"));
        let ExprKind::Binary(inner) = &outer.left.kind else { panic!("expected nested +") };
        assert!(matches!(&inner.left.kind, ExprKind::Literal(Literal::String(s)) if s == "Hi "));
        assert_eq!(expr.ty, Some(Type::string()));
    }

    #[test]
    fn test_template_starting_with_expression_gets_empty_prefix() {
        let mut expr = template(vec![ident("name"), text(" says hi")]);
        lower_template(&mut expr);
        let ExprKind::Binary(outer) = &expr.kind else { panic!("expected +") };
        let ExprKind::Binary(inner) = &outer.left.kind else { panic!("expected nested +") };
        assert!(matches!(&inner.left.kind, ExprKind::Literal(Literal::String(s)) if s.is_empty()));
        assert!(matches!(inner.right.kind, ExprKind::Ident(_)));
    }
}
