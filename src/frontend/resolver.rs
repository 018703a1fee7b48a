//! Scope resolution for Starlight
//!
//! A single depth-first walk that builds the [`SymbolTable`] and writes a [`SymbolId`] into every
//! declaring node and every identifier reference.
//!
//! ## Notes
//!
//! - Top-level functions and types, and the members of every type body, are hoisted: they are
//!   declared before any body is visited. Everything else is sequential, so a local used before
//!   its declaration is an unresolved identifier.
//! - A function's parameters and the statements of its body share one scope, so a body local
//!   cannot redeclare a parameter. Nested blocks may shadow freely.
//! - A missing name is reported at every reference and bound to an `Unresolved` placeholder so the
//!   type checker can keep going.
//! - Locals declared with `val`/`var` that are never read produce an unused-variable warning when
//!   their scope closes. Names starting with `_` are exempt.

use std::collections::{HashMap, HashSet};

use starlight_core::types::{LIST, MAP, PrimitiveType};

use crate::frontend::ast::*;
use crate::frontend::diagnostics::{Diagnostics, errors};
use crate::frontend::symbols::{ScopeId, ScopeKind, Symbol, SymbolKind, SymbolTable, TypeDef, TypeDefKind};

/// Resolve every name in `program`, decorating it in place.
///
/// Diagnostics are appended to `diagnostics` in source order.
#[tracing::instrument(skip_all, fields(declarations = program.declarations.len()))]
pub fn resolve(program: &mut Program, diagnostics: &mut Diagnostics) -> SymbolTable {
    let mark = diagnostics.len();
    let mut resolver = Resolver::new(diagnostics);
    resolver.hoist(program);
    for decl in &mut program.declarations {
        resolver.resolve_declaration(&mut decl.node);
    }
    let table = resolver.table;
    diagnostics.sort_stage(mark);
    tracing::debug!(
        symbols = table.len(),
        diagnostics = diagnostics.len() - mark,
        "resolved"
    );
    table
}

struct Resolver<'d> {
    table: SymbolTable,
    diagnostics: &'d mut Diagnostics,
    scope: ScopeId,
    /// Nesting depth of bodies where `this` is meaningful.
    this_depth: u32,
    /// Member scope of each declared type, keyed by the type's symbol.
    member_scopes: HashMap<SymbolId, ScopeId>,
    placeholders: HashMap<String, SymbolId>,
    /// `val`/`var` locals that warrant an unused-variable warning.
    tracked_locals: HashSet<SymbolId>,
}

impl<'d> Resolver<'d> {
    fn new(diagnostics: &'d mut Diagnostics) -> Self {
        Self {
            table: SymbolTable::new(),
            diagnostics,
            scope: ScopeId::GLOBAL,
            this_depth: 0,
            member_scopes: HashMap::new(),
            placeholders: HashMap::new(),
            tracked_locals: HashSet::new(),
        }
    }

    // ========================================================================
    // Scope helpers
    // ========================================================================

    /// Run `f` inside a fresh child scope of the current one.
    fn with_scope<T>(&mut self, kind: ScopeKind, f: impl FnOnce(&mut Self) -> T) -> T {
        let parent = self.scope;
        self.scope = self.table.push_scope(kind, parent);
        let result = f(self);
        self.report_unused(self.scope);
        self.scope = parent;
        result
    }

    /// Run `f` with `scope` as the current scope.
    fn in_scope<T>(&mut self, scope: ScopeId, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = std::mem::replace(&mut self.scope, scope);
        let result = f(self);
        self.scope = saved;
        result
    }

    /// Declare in the current scope, reporting a duplicate when the name is taken.
    ///
    /// A duplicate still gets its own (unreachable) symbol so the node can be decorated.
    fn declare(&mut self, symbol: Symbol) -> SymbolId {
        self.declare_in(self.scope, symbol)
    }

    fn declare_in(&mut self, scope: ScopeId, symbol: Symbol) -> SymbolId {
        match self.table.declare(scope, symbol.clone()) {
            Ok(id) => id,
            Err(existing) => {
                let previous = self.table.symbol(existing).span;
                self.diagnostics
                    .push(errors::duplicate_declaration(&symbol.name, symbol.span, previous));
                let mut symbol = symbol;
                symbol.scope = scope;
                self.table.detached(symbol)
            }
        }
    }

    fn declare_local(&mut self, name: &str, span: Span, mutable: bool) -> SymbolId {
        let id = self.declare(Symbol::new(name, SymbolKind::Variable, span).mutable(mutable));
        if self.table.scope(self.scope).kind != ScopeKind::Global {
            self.tracked_locals.insert(id);
        }
        id
    }

    fn report_unused(&mut self, scope: ScopeId) {
        let unused: Vec<SymbolId> = self
            .table
            .scope(scope)
            .symbols()
            .iter()
            .copied()
            .filter(|id| self.tracked_locals.contains(id))
            .collect();
        for id in unused {
            let symbol = self.table.symbol(id);
            if !symbol.used && !symbol.name.starts_with('_') {
                self.diagnostics
                    .push(errors::unused_variable(&symbol.name, symbol.span));
            }
        }
    }

    /// Resolve a name reference, substituting a placeholder when it is missing.
    fn reference(&mut self, name: &str, span: Span, read: bool) -> SymbolId {
        match self.table.lookup(self.scope, name) {
            Some(id) => {
                if read {
                    self.table.mark_used(id);
                }
                id
            }
            None => {
                self.diagnostics.push(errors::unresolved_identifier(name, span));
                if let Some(id) = self.placeholders.get(name) {
                    return *id;
                }
                let id = self
                    .table
                    .detached(Symbol::new(name, SymbolKind::Unresolved, span));
                self.placeholders.insert(name.to_string(), id);
                id
            }
        }
    }

    // ========================================================================
    // Hoisting
    // ========================================================================

    fn hoist(&mut self, program: &mut Program) {
        for decl in &mut program.declarations {
            match &mut decl.node {
                Declaration::Function(f) => {
                    let id = self.declare(Symbol::new(&f.name, SymbolKind::Function, f.name_span));
                    f.symbol = Some(id);
                }
                Declaration::Class(c) => {
                    c.symbol = Some(self.declare_type(
                        &c.name,
                        c.name_span,
                        TypeDefKind::Class,
                        &c.supertypes,
                    ));
                }
                Declaration::Data(d) => {
                    d.symbol = Some(self.declare_type(
                        &d.name,
                        d.name_span,
                        TypeDefKind::Data,
                        &d.supertypes,
                    ));
                }
                Declaration::Interface(i) => {
                    i.symbol = Some(self.declare_type(&i.name, i.name_span, TypeDefKind::Interface, &[]));
                }
                Declaration::Extension(_) | Declaration::Statement(_) => {}
            }
        }

        // Members and extensions only after every type name exists.
        for decl in &mut program.declarations {
            match &mut decl.node {
                Declaration::Class(c) => self.hoist_class_members(c),
                Declaration::Data(d) => self.hoist_data_members(d),
                Declaration::Interface(i) => self.hoist_interface_members(i),
                Declaration::Extension(e) => self.hoist_extension(e),
                Declaration::Function(_) | Declaration::Statement(_) => {}
            }
        }
    }

    fn declare_type(&mut self, name: &str, span: Span, kind: TypeDefKind, supertypes: &[Spanned<Ident>]) -> SymbolId {
        let symbol_kind = match kind {
            TypeDefKind::Class => SymbolKind::Class,
            TypeDefKind::Data => SymbolKind::DataClass,
            TypeDefKind::Interface => SymbolKind::Interface,
        };
        let mut symbol = Symbol::new(name, symbol_kind, span);
        symbol.ty = starlight_core::types::Type::named(name);
        let members = self.table.push_scope(ScopeKind::Class, ScopeId::GLOBAL);
        let duplicate = self.table.scope(ScopeId::GLOBAL).get(name).is_some();
        let id = self.declare_in(ScopeId::GLOBAL, symbol);
        self.member_scopes.insert(id, members);
        if !duplicate {
            self.table.define_type(TypeDef {
                name: name.to_string(),
                kind,
                symbol: id,
                members,
                ctor_fields: Vec::new(),
                supertypes: supertypes.iter().map(|s| s.node.clone()).collect(),
            });
        }
        id
    }

    fn member_scope(&self, owner: Option<SymbolId>) -> ScopeId {
        owner
            .and_then(|id| self.member_scopes.get(&id).copied())
            .unwrap_or(ScopeId::GLOBAL)
    }

    fn hoist_fields(&mut self, owner: &str, scope: ScopeId, fields: &mut [FieldParam]) -> Vec<SymbolId> {
        let mut ids = Vec::with_capacity(fields.len());
        for field in fields {
            let id = self.declare_in(
                scope,
                Symbol::new(&field.name, SymbolKind::Field, field.span).owned_by(owner),
            );
            field.symbol = Some(id);
            ids.push(id);
        }
        ids
    }

    fn hoist_method(&mut self, owner: &str, scope: ScopeId, method: &mut FunctionDecl) {
        let id = self.declare_in(
            scope,
            Symbol::new(&method.name, SymbolKind::Method, method.name_span).owned_by(owner),
        );
        method.symbol = Some(id);
    }

    fn hoist_class_members(&mut self, class: &mut ClassDecl) {
        let scope = self.member_scope(class.symbol);
        let ctor_fields = self.hoist_fields(&class.name, scope, &mut class.fields);
        for member in &mut class.members {
            match member {
                ClassMember::Field(field) => {
                    let var = &mut field.node;
                    let id = self.declare_in(
                        scope,
                        Symbol::new(&var.name, SymbolKind::Field, var.name_span)
                            .mutable(var.mutable)
                            .owned_by(&class.name),
                    );
                    var.symbol = Some(id);
                }
                ClassMember::Method(method) => self.hoist_method(&class.name, scope, &mut method.node),
            }
        }
        self.set_ctor_fields(&class.name, class.symbol, ctor_fields);
    }

    fn hoist_data_members(&mut self, data: &mut DataClassDecl) {
        let scope = self.member_scope(data.symbol);
        let ctor_fields = self.hoist_fields(&data.name, scope, &mut data.fields);
        for method in &mut data.methods {
            self.hoist_method(&data.name, scope, &mut method.node);
        }
        self.set_ctor_fields(&data.name, data.symbol, ctor_fields);
    }

    fn hoist_interface_members(&mut self, interface: &mut InterfaceDecl) {
        let scope = self.member_scope(interface.symbol);
        for sig in &mut interface.methods {
            let id = self.declare_in(
                scope,
                Symbol::new(&sig.node.name, SymbolKind::Method, sig.span).owned_by(&interface.name),
            );
            sig.node.symbol = Some(id);
        }
    }

    fn set_ctor_fields(&mut self, name: &str, owner: Option<SymbolId>, fields: Vec<SymbolId>) {
        let Some(def) = self.table.type_def(name) else { return };
        if Some(def.symbol) != owner {
            return;
        }
        let mut def = def.clone();
        def.ctor_fields = fields;
        self.table.define_type(def);
    }

    fn hoist_extension(&mut self, ext: &mut ExtensionDecl) {
        let Some(key) = receiver_key_of(&ext.receiver.node) else {
            self.diagnostics.push(errors::invalid_context(
                "extension receivers must be a named type such as `string`, `List` or a class",
                ext.receiver.span,
            ));
            return;
        };
        for func in &mut ext.functions {
            let f = &mut func.node;
            let mut symbol = Symbol::new(&f.name, SymbolKind::Function, f.name_span).owned_by(&key);
            symbol.scope = ScopeId::GLOBAL;
            let id = self.table.detached(symbol);
            if let Err(existing) = self.table.add_extension(&key, &f.name, id) {
                let previous = self.table.symbol(existing).span;
                self.diagnostics
                    .push(errors::duplicate_declaration(&f.name, f.name_span, previous));
            }
            f.symbol = Some(id);
        }
        ext.receiver_key = Some(key);
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    fn resolve_declaration(&mut self, decl: &mut Declaration) {
        match decl {
            Declaration::Function(f) => self.resolve_function(f, ScopeId::GLOBAL, ScopeKind::Function, false),
            Declaration::Class(c) => {
                let scope = self.member_scope(c.symbol);
                for field in &c.fields {
                    self.resolve_type(&field.ty);
                }
                self.resolve_supertypes(&c.supertypes);
                for member in &mut c.members {
                    match member {
                        ClassMember::Field(field) => self.in_scope(scope, |r| {
                            let var = &mut field.node;
                            if let Some(ty) = &var.ty {
                                r.resolve_type(ty);
                            }
                            if let Some(init) = &mut var.init {
                                r.this_depth += 1;
                                r.resolve_expr(init);
                                r.this_depth -= 1;
                            }
                        }),
                        ClassMember::Method(method) => {
                            self.resolve_function(&mut method.node, scope, ScopeKind::Function, true)
                        }
                    }
                }
            }
            Declaration::Data(d) => {
                let scope = self.member_scope(d.symbol);
                for field in &d.fields {
                    self.resolve_type(&field.ty);
                }
                self.resolve_supertypes(&d.supertypes);
                for method in &mut d.methods {
                    self.resolve_function(&mut method.node, scope, ScopeKind::Function, true);
                }
            }
            Declaration::Interface(i) => {
                for sig in &mut i.methods {
                    let sig = &mut sig.node;
                    self.with_scope(ScopeKind::Function, |r| {
                        for param in &mut sig.params {
                            r.resolve_param(param);
                        }
                        if let Some(ret) = &sig.return_type {
                            r.resolve_type(ret);
                        }
                    });
                }
            }
            Declaration::Extension(e) => {
                self.resolve_type(&e.receiver);
                for func in &mut e.functions {
                    self.resolve_function(&mut func.node, ScopeId::GLOBAL, ScopeKind::Extension, true);
                }
            }
            Declaration::Statement(stmt) => self.resolve_stmt(stmt),
        }
    }

    fn resolve_supertypes(&mut self, supertypes: &[Spanned<Ident>]) {
        for s in supertypes {
            if self.table.type_def(&s.node).is_none() {
                self.diagnostics.push(errors::unresolved_type(&s.node, s.span));
            }
        }
    }

    fn resolve_function(&mut self, f: &mut FunctionDecl, parent: ScopeId, kind: ScopeKind, allows_this: bool) {
        self.in_scope(parent, |r| {
            r.with_scope(kind, |r| {
                if allows_this {
                    r.this_depth += 1;
                }
                for param in &mut f.params {
                    r.resolve_param(param);
                }
                if let Some(ret) = &f.return_type {
                    r.resolve_type(ret);
                }
                match &mut f.body {
                    FunctionBody::Block(block) => r.resolve_statements(&mut block.statements),
                    FunctionBody::Expr(expr) => r.resolve_expr(expr),
                }
                if allows_this {
                    r.this_depth -= 1;
                }
            })
        });
    }

    fn resolve_param(&mut self, param: &mut Param) {
        if let Some(ty) = &param.ty {
            self.resolve_type(ty);
        }
        if let Some(default) = &mut param.default {
            self.resolve_expr(default);
        }
        let id = self.declare(Symbol::new(&param.name, SymbolKind::Parameter, param.span));
        param.symbol = Some(id);
    }

    fn resolve_type(&mut self, ty: &Spanned<TypeExpr>) {
        match &ty.node {
            TypeExpr::Named { name, args } => {
                let known = PrimitiveType::from_str(name).is_some()
                    || name == LIST
                    || name == MAP
                    || self.table.type_def(name).is_some();
                if !known {
                    self.diagnostics.push(errors::unresolved_type(name, ty.span));
                }
                for arg in args {
                    self.resolve_type(arg);
                }
            }
            TypeExpr::Nullable { inner } => self.resolve_type(inner),
            TypeExpr::Function { params, ret } => {
                for p in params {
                    self.resolve_type(p);
                }
                self.resolve_type(ret);
            }
            TypeExpr::Union { members } | TypeExpr::Intersection { members } => {
                for m in members {
                    self.resolve_type(m);
                }
            }
        }
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn resolve_statements(&mut self, statements: &mut [Spanned<Statement>]) {
        for stmt in statements {
            self.resolve_stmt(&mut stmt.node);
        }
    }

    fn resolve_block(&mut self, block: &mut Block) {
        self.with_scope(ScopeKind::Block, |r| r.resolve_statements(&mut block.statements));
    }

    fn resolve_stmt(&mut self, stmt: &mut Statement) {
        match stmt {
            Statement::Var(var) => self.resolve_var(var),
            Statement::Block(block) => self.resolve_block(block),
            Statement::If(stmt) => {
                self.resolve_expr(&mut stmt.condition);
                self.resolve_block(&mut stmt.then_block);
                if let Some(else_branch) = &mut stmt.else_branch {
                    self.resolve_stmt(&mut else_branch.node);
                }
            }
            Statement::While(stmt) => {
                self.resolve_expr(&mut stmt.condition);
                self.resolve_block(&mut stmt.body);
            }
            Statement::ForIn(stmt) => {
                self.resolve_expr(&mut stmt.iterable);
                self.with_scope(ScopeKind::Block, |r| {
                    let id = r.declare(Symbol::new(&stmt.var, SymbolKind::Variable, stmt.var_span));
                    stmt.symbol = Some(id);
                    r.resolve_statements(&mut stmt.body.statements);
                });
            }
            Statement::ForC(stmt) => {
                self.with_scope(ScopeKind::Block, |r| {
                    if let Some(init) = &mut stmt.init {
                        r.resolve_stmt(&mut init.node);
                    }
                    if let Some(cond) = &mut stmt.condition {
                        r.resolve_expr(cond);
                    }
                    if let Some(update) = &mut stmt.update {
                        r.resolve_expr(update);
                    }
                    r.resolve_block(&mut stmt.body);
                });
            }
            Statement::Return(ret) => {
                if let Some(value) = &mut ret.value {
                    self.resolve_expr(value);
                }
            }
            Statement::Break | Statement::Continue => {}
            Statement::Expr(stmt) => self.resolve_expr(&mut stmt.expr),
        }
    }

    fn resolve_var(&mut self, var: &mut VarDecl) {
        // The initializer sees the enclosing binding, not the one being declared.
        if let Some(init) = &mut var.init {
            self.resolve_expr(init);
        }
        if let Some(ty) = &var.ty {
            self.resolve_type(ty);
        }
        var.symbol = Some(self.declare_local(&var.name, var.name_span, var.mutable));
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn resolve_expr(&mut self, expr: &mut Expression) {
        let span = expr.span;
        match &mut expr.kind {
            ExprKind::Literal(_) => {}
            ExprKind::Ident(ident) => {
                ident.symbol = Some(self.reference(&ident.name, span, true));
            }
            ExprKind::This => {
                if self.this_depth == 0 {
                    self.diagnostics.push(errors::invalid_context(
                        "`this` is only available inside class methods and extension functions",
                        span,
                    ));
                }
            }
            ExprKind::Template(t) => {
                for part in &mut t.parts {
                    if let TemplatePart::Expr(e) = part {
                        self.resolve_expr(e);
                    }
                }
            }
            ExprKind::List(list) => {
                for e in &mut list.elements {
                    self.resolve_expr(e);
                }
            }
            ExprKind::Map(map) => {
                for (k, v) in &mut map.entries {
                    self.resolve_expr(k);
                    self.resolve_expr(v);
                }
            }
            ExprKind::Binary(b) => {
                self.resolve_expr(&mut b.left);
                self.resolve_expr(&mut b.right);
            }
            ExprKind::Unary(u) => self.resolve_expr(&mut u.operand),
            ExprKind::Postfix(p) => self.resolve_expr(&mut p.operand),
            ExprKind::Assign(a) => {
                self.resolve_expr(&mut a.value);
                let target_span = a.target.span;
                match &mut a.target.kind {
                    // A plain store does not count as a read.
                    ExprKind::Ident(ident) if a.op == AssignOp::Assign => {
                        ident.symbol = Some(self.reference(&ident.name, target_span, false));
                    }
                    _ => self.resolve_expr(&mut a.target),
                }
            }
            ExprKind::Conditional(c) => {
                self.resolve_expr(&mut c.condition);
                self.resolve_expr(&mut c.then_expr);
                self.resolve_expr(&mut c.else_expr);
            }
            ExprKind::Call(call) => {
                self.resolve_expr(&mut call.callee);
                for arg in &mut call.args {
                    self.resolve_expr(arg);
                }
            }
            ExprKind::MethodCall(call) => {
                self.resolve_expr(&mut call.receiver);
                for arg in &mut call.args {
                    self.resolve_expr(arg);
                }
            }
            ExprKind::Member(m) => self.resolve_expr(&mut m.object),
            ExprKind::NonNull(n) => self.resolve_expr(&mut n.operand),
            ExprKind::Index(i) => {
                self.resolve_expr(&mut i.object);
                self.resolve_expr(&mut i.index);
            }
            ExprKind::Range(r) => {
                self.resolve_expr(&mut r.start);
                self.resolve_expr(&mut r.end);
            }
            ExprKind::Await(a) => self.resolve_expr(&mut a.operand),
            ExprKind::Lambda(lambda) => {
                self.with_scope(ScopeKind::Lambda, |r| {
                    for param in &mut lambda.params {
                        r.resolve_param(param);
                    }
                    if let Some(ret) = &lambda.return_type {
                        r.resolve_type(ret);
                    }
                    match &mut lambda.body {
                        LambdaBody::Expr(e) => r.resolve_expr(e),
                        LambdaBody::Block(block) => r.resolve_statements(&mut block.statements),
                    }
                });
            }
            ExprKind::Comprehension(comp) => {
                self.resolve_expr(&mut comp.iterable);
                self.with_scope(ScopeKind::Comprehension, |r| {
                    let id = r.declare(Symbol::new(&comp.var, SymbolKind::Variable, comp.var_span));
                    comp.symbol = Some(id);
                    if let Some(cond) = &mut comp.condition {
                        r.resolve_expr(cond);
                    }
                    r.resolve_expr(&mut comp.element);
                });
            }
            ExprKind::Match(m) => {
                self.resolve_expr(&mut m.scrutinee);
                for arm in &mut m.arms {
                    self.with_scope(ScopeKind::MatchArm, |r| {
                        r.resolve_pattern(&mut arm.pattern);
                        if let Some(guard) = &mut arm.guard {
                            r.resolve_expr(guard);
                        }
                        r.resolve_expr(&mut arm.body);
                    });
                }
            }
            ExprKind::Block(block) => {
                self.with_scope(ScopeKind::Block, |r| {
                    r.resolve_statements(&mut block.statements);
                    if let Some(value) = &mut block.value {
                        r.resolve_expr(value);
                    }
                });
            }
        }
    }

    fn resolve_pattern(&mut self, pattern: &mut Spanned<Pattern>) {
        let span = pattern.span;
        match &mut pattern.node {
            Pattern::Literal(_) | Pattern::Wildcard => {}
            Pattern::Binding(binding) => {
                binding.symbol = Some(self.declare(Symbol::new(&binding.name, SymbolKind::Variable, span)));
            }
            Pattern::Typed(typed) => {
                self.resolve_type(&typed.ty);
                typed.symbol = Some(self.declare(Symbol::new(&typed.name, SymbolKind::Variable, span)));
            }
            Pattern::Constructor(ctor) => {
                let name_span = Span::new(span.start, span.start + ctor.name.len());
                ctor.symbol = Some(self.reference(&ctor.name, name_span, true));
                for arg in &mut ctor.args {
                    self.resolve_pattern(arg);
                }
            }
            Pattern::Destructure(d) => {
                for element in &mut d.elements {
                    self.resolve_pattern(element);
                }
            }
        }
    }
}

/// Extension registry key for a receiver written in source.
fn receiver_key_of(ty: &TypeExpr) -> Option<String> {
    match ty {
        TypeExpr::Named { name, .. } => Some(name.clone()),
        TypeExpr::Nullable { inner } => receiver_key_of(&inner.node),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::diagnostics::DiagnosticKind;
    use crate::frontend::parser;

    fn resolve_source(source: &str) -> (Program, SymbolTable, Diagnostics) {
        let mut program = parser::parse_source(source).unwrap_or_else(|errs| panic!("parse failed: {errs:#?}"));
        let mut diags = Diagnostics::new();
        let table = resolve(&mut program, &mut diags);
        (program, table, diags)
    }

    fn kinds(diags: &Diagnostics) -> Vec<DiagnosticKind> {
        diags.iter().map(|d| d.kind).collect()
    }

    #[test]
    fn test_inner_declaration_shadows_outer() {
        let (program, table, diags) = resolve_source("val x = 1\nfun f() {\n  if true { val x = \"s\"; println(x) }\n  println(x)\n}");
        assert!(diags.is_empty(), "{diags:#?}");
        let Declaration::Function(f) = &program.declarations[1].node else { panic!() };
        let FunctionBody::Block(body) = &f.body else { panic!() };
        let Statement::If(stmt) = &body.statements[0].node else { panic!() };
        let Statement::Expr(inner_print) = &stmt.then_block.statements[1].node else { panic!() };
        let Statement::Expr(outer_print) = &body.statements[1].node else { panic!() };

        let arg_symbol = |e: &Expression| match &e.kind {
            ExprKind::Call(call) => match &call.args[0].kind {
                ExprKind::Ident(i) => i.symbol.unwrap(),
                _ => panic!(),
            },
            _ => panic!(),
        };
        let inner = arg_symbol(&inner_print.expr);
        let outer = arg_symbol(&outer_print.expr);
        assert_ne!(inner, outer);
        assert_eq!(table.symbol(outer).scope, ScopeId::GLOBAL);
    }

    #[test]
    fn test_duplicate_in_same_scope_reported_once() {
        let (_, _, diags) = resolve_source("fun f() {\n  val a = 1\n  val a = 2\n  println(a)\n}");
        assert_eq!(diags.count_of(DiagnosticKind::DuplicateDeclaration), 1);
        let dup = diags.iter().find(|d| d.kind == DiagnosticKind::DuplicateDeclaration).unwrap();
        assert_eq!(dup.related.len(), 1);
    }

    #[test]
    fn test_parameter_and_body_local_share_a_scope() {
        let (_, _, diags) = resolve_source("fun f(x: int) { val x = 2; println(x) }");
        assert_eq!(kinds(&diags), vec![DiagnosticKind::DuplicateDeclaration]);
    }

    #[test]
    fn test_functions_and_types_are_hoisted() {
        let (_, _, diags) = resolve_source("fun a() = b()\nfun b() = Point(1, 2)\ndata Point(x: int, y: int)");
        assert!(diags.is_empty(), "{diags:#?}");
    }

    #[test]
    fn test_locals_are_sequential() {
        let (_, _, diags) = resolve_source("fun f() {\n  println(y)\n  val y = 1\n}");
        let kinds = kinds(&diags);
        assert_eq!(kinds[0], DiagnosticKind::UnresolvedIdentifier);
    }

    #[test]
    fn test_unresolved_gets_placeholder() {
        let (program, table, diags) = resolve_source("fun f() { return y }");
        assert_eq!(kinds(&diags), vec![DiagnosticKind::UnresolvedIdentifier]);
        let Declaration::Function(f) = &program.declarations[0].node else { panic!() };
        let FunctionBody::Block(body) = &f.body else { panic!() };
        let Statement::Return(ReturnStmt { value: Some(value) }) = &body.statements[0].node else { panic!() };
        let ExprKind::Ident(ident) = &value.kind else { panic!() };
        assert_eq!(table.symbol(ident.symbol.unwrap()).kind, SymbolKind::Unresolved);
    }

    #[test]
    fn test_this_outside_method_is_invalid() {
        let (_, _, diags) = resolve_source("fun f() = this\nclass C(x: int) { fun g() = this.x }\nextend string { fun h() = this }");
        assert_eq!(kinds(&diags), vec![DiagnosticKind::InvalidContext]);
    }

    #[test]
    fn test_unused_locals_warn() {
        let (_, _, diags) = resolve_source("fun f() {\n  val used = 1\n  val unused = 2\n  var _ignored = 3\n  println(used)\n}");
        assert_eq!(kinds(&diags), vec![DiagnosticKind::UnusedVariable]);
        assert!(diags.iter().all(|d| !d.is_error()));
        assert!(diags.as_slice()[0].message.contains("never used"));
    }

    #[test]
    fn test_store_is_not_a_read() {
        let (_, _, diags) = resolve_source("fun f() {\n  var n = 0\n  n = 1\n}");
        assert_eq!(kinds(&diags), vec![DiagnosticKind::UnusedVariable]);
    }

    #[test]
    fn test_extensions_go_to_side_table() {
        let (program, table, diags) = resolve_source("extend string { fun shout() = this + \"!\" }");
        assert!(diags.is_empty(), "{diags:#?}");
        let Declaration::Extension(ext) = &program.declarations[0].node else { panic!() };
        assert_eq!(ext.receiver_key.as_deref(), Some("string"));
        assert!(table.extension("string", "shout").is_some());
        assert!(table.lookup(ScopeId::GLOBAL, "shout").is_none());
    }

    #[test]
    fn test_unknown_type_annotation() {
        let (_, _, diags) = resolve_source("val p: Pointt? = null");
        assert_eq!(kinds(&diags), vec![DiagnosticKind::UnresolvedIdentifier]);
        assert!(diags.as_slice()[0].message.contains("Pointt"));
    }

    #[test]
    fn test_class_members_visible_in_methods() {
        let (_, _, diags) = resolve_source(
            "class Counter(start: int) {\n  var count: int = start\n  fun bump() { count += 1; helper() }\n  fun helper() {}\n}",
        );
        assert!(diags.is_empty(), "{diags:#?}");
    }

    #[test]
    fn test_match_arm_bindings_are_scoped() {
        let (_, _, diags) = resolve_source(
            "data P(a: int, b: int)\nfun f(p: P) = match p {\n  P(a, b) if a > b => a\n  {x, y} => x + y\n}\nfun g() = a",
        );
        assert_eq!(kinds(&diags), vec![DiagnosticKind::UnresolvedIdentifier]);
    }
}
