//! Expressions.
//!
//! Every emitter returns Java expression text. Sub-expressions that need statements (`match`,
//! block expressions, `?.` on a computed receiver) write those statements to the output first.

use std::collections::HashSet;

use starlight_core::lang::builtins::BuiltinFnId;
use starlight_core::lang::members;
use starlight_core::types::{MAP, Type};

use crate::frontend::ast::*;
use crate::frontend::symbols::{SymbolKind, TypeDefKind};

use super::super::EmitResult;
use super::super::emitter::{capitalize, format_floating, quote_string};
use super::types::{coerce, is_java_primitive};
use super::{JvmEmitter, extension_name, member_name};

impl JvmEmitter<'_> {
    pub(super) fn expr(&mut self, expr: &Expression) -> EmitResult<String> {
        let span = expr.span;
        match &expr.kind {
            ExprKind::Literal(lit) => Ok(literal(lit)),
            ExprKind::Ident(ident) => self.ident(ident, span),
            ExprKind::This => Ok(self.receiver.to_string()),
            ExprKind::Template(_) => Err(self.unsupported("unlowered string template", span)),
            ExprKind::Comprehension(_) => Err(self.unsupported("unlowered comprehension", span)),
            ExprKind::List(list) => self.list(list, &expr.ty(), span),
            ExprKind::Map(map) => self.map(map, &expr.ty(), span),
            ExprKind::Binary(binary) => self.binary(binary),
            ExprKind::Unary(unary) => {
                let operand = self.expr(&unary.operand)?;
                let op = unary.op.as_str();
                Ok(if operand.starts_with(['-', '+', '!']) {
                    format!("{op}({operand})")
                } else {
                    format!("{op}{operand}")
                })
            }
            ExprKind::Postfix(postfix) => {
                let target = self.place(&postfix.operand, "`++`/`--`")?;
                Ok(format!("{target}{}", postfix.op.as_str()))
            }
            ExprKind::Assign(assign) => Ok(format!("({})", self.assign(assign)?)),
            ExprKind::Conditional(cond) => {
                let condition = self.expr(&cond.condition)?;
                let ty = expr.ty();
                let (then_text, else_text) = self.without_hoisting("a conditional expression branch", |s| {
                    Ok((s.expr_as(&cond.then_expr, &ty)?, s.expr_as(&cond.else_expr, &ty)?))
                })?;
                Ok(format!("({condition} ? {then_text} : {else_text})"))
            }
            ExprKind::Call(call) => self.call(call, span),
            ExprKind::MethodCall(call) => self.method_call(call, span),
            ExprKind::Member(member) => self.member(member),
            ExprKind::NonNull(nn) => Ok(format!("java.util.Objects.requireNonNull({})", self.expr(&nn.operand)?)),
            ExprKind::Index(index) => self.index(index),
            ExprKind::Range(range) => self.range_value(range, &expr.ty()),
            ExprKind::Await(_) => Err(self.unsupported("`await`", span)),
            ExprKind::Lambda(lambda) => self.lambda(lambda, &expr.ty(), span),
            ExprKind::Match(m) => self.match_expr(m, &expr.ty(), span),
            ExprKind::Block(block) => self.block_expr(block, span),
        }
    }

    /// `expr` converted for a slot of type `target`.
    pub(super) fn expr_as(&mut self, expr: &Expression, target: &Type) -> EmitResult<String> {
        let text = self.expr(expr)?;
        Ok(coerce(text, &expr.ty(), target))
    }

    fn args_as(&mut self, args: &[Expression], params: &[Type]) -> EmitResult<Vec<String>> {
        let mut out = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            out.push(match params.get(i) {
                Some(param) => self.expr_as(arg, param)?,
                None => self.expr(arg)?,
            });
        }
        Ok(out)
    }

    /// Text of an expression that Java accepts as a statement, or `None` for other expressions.
    pub(super) fn statement_expr(&mut self, expr: &Expression) -> EmitResult<Option<String>> {
        Ok(match &expr.kind {
            ExprKind::Assign(assign) => Some(self.assign(assign)?),
            ExprKind::Call(_) | ExprKind::Postfix(_) => Some(self.expr(expr)?),
            ExprKind::MethodCall(call) if !call.safe => Some(self.expr(expr)?),
            _ => None,
        })
    }

    // ========================================================================
    // Names
    // ========================================================================

    fn ident(&mut self, ident: &IdentRef, span: Span) -> EmitResult<String> {
        let Some(id) = ident.symbol else {
            return Ok(member_name(&ident.name));
        };
        let name = member_name(&ident.name);
        match self.symbol(id).kind {
            SymbolKind::Variable | SymbolKind::Parameter => {
                if self.globals.contains(&id) {
                    return Ok(format!("{}.{name}", self.class_name));
                }
                self.check_capture(id, &ident.name, span)?;
                Ok(self.local_name(Some(id), &ident.name))
            }
            SymbolKind::Field => Ok(format!("this.{name}")),
            SymbolKind::Function => Ok(format!("{}::{name}", self.class_name)),
            SymbolKind::Method => Ok(format!("this::{name}")),
            SymbolKind::Class | SymbolKind::DataClass => Ok(format!("{}::new", ident.name)),
            SymbolKind::Builtin(_) => Err(self.unsupported(format!("builtin `{}` used as a value", ident.name), span)),
            SymbolKind::Interface | SymbolKind::Unresolved => {
                Err(self.unsupported(format!("`{}` used as a value", ident.name), span))
            }
        }
    }

    /// Java lambdas cannot capture locals that change.
    fn check_capture(&self, id: SymbolId, name: &str, span: Span) -> EmitResult<()> {
        let Some(own) = self.lambda_locals.last() else {
            return Ok(());
        };
        if own.contains(&id) {
            return Ok(());
        }
        if self.symbol(id).mutable || self.counters.contains(&id) {
            return Err(self.unsupported(format!("capturing the mutable variable `{name}` in a lambda"), span));
        }
        Ok(())
    }

    /// An assignable location.
    fn place(&mut self, target: &Expression, what: &str) -> EmitResult<String> {
        match &target.kind {
            ExprKind::Ident(ident) => self.ident(ident, target.span),
            ExprKind::Member(m) if !m.safe => {
                let object = self.expr(&m.object)?;
                Ok(format!("{object}.{}", member_name(&m.field)))
            }
            _ => Err(self.unsupported(format!("{what} on this target"), target.span)),
        }
    }

    // ========================================================================
    // Collections
    // ========================================================================

    fn list(&mut self, list: &ListExpr, ty: &Type, span: Span) -> EmitResult<String> {
        let element = ty.non_null().element_type().cloned().unwrap_or(Type::any());
        let java = self.boxed_type(&element, span)?;
        if list.elements.is_empty() {
            return Ok(format!("new java.util.ArrayList<{java}>()"));
        }
        let params = vec![element; list.elements.len()];
        let items: Vec<String> = self
            .args_as(&list.elements, &params)?
            .into_iter()
            .map(|item| if item == "null" { format!("({java}) null") } else { item })
            .collect();
        Ok(format!(
            "new java.util.ArrayList<{java}>(java.util.Arrays.asList({}))",
            items.join(", ")
        ))
    }

    fn map(&mut self, map: &MapExpr, ty: &Type, span: Span) -> EmitResult<String> {
        let (key, value) = match ty.non_null().as_generic() {
            Some((MAP, [k, v])) => (k.clone(), v.clone()),
            _ => (Type::any(), Type::any()),
        };
        let key_java = self.boxed_type(&key, span)?;
        let value_java = self.boxed_type(&value, span)?;
        if map.entries.is_empty() {
            return Ok(format!("new java.util.LinkedHashMap<{key_java}, {value_java}>()"));
        }
        let mut parts = Vec::with_capacity(map.entries.len() * 2);
        for (k, v) in &map.entries {
            parts.push(self.expr_as(k, &key)?);
            parts.push(self.expr_as(v, &value)?);
        }
        self.needs_map_of = true;
        Ok(format!(
            "{}.<{key_java}, {value_java}>$mapOf({})",
            self.class_name,
            parts.join(", ")
        ))
    }

    fn index(&mut self, index: &IndexExpr) -> EmitResult<String> {
        let object_ty = index.object.ty().non_null();
        let object = self.expr(&index.object)?;
        if object_ty.is_string() {
            let i = self.expr_as(&index.index, &Type::int())?;
            return Ok(format!("{object}.charAt({i})"));
        }
        let key = match object_ty.as_generic() {
            Some((MAP, [key, _])) => key.clone(),
            _ => Type::int(),
        };
        let key = self.expr_as(&index.index, &key)?;
        Ok(format!("{object}.get({key})"))
    }

    /// `list[i] = v` / `map[k] op= v`.
    fn index_store(&mut self, index: &IndexExpr, assign: &AssignExpr) -> EmitResult<String> {
        let object_ty = index.object.ty().non_null();
        let (key_ty, element) = match object_ty.as_generic() {
            Some((MAP, [key, value])) => (key.clone(), value.clone()),
            _ => (Type::int(), object_ty.element_type().cloned().unwrap_or(Type::any())),
        };
        let method = if object_ty.as_generic().is_some_and(|(n, _)| n == MAP) { "put" } else { "set" };
        let object = self.expr(&index.object)?;
        let key = self.expr_as(&index.index, &key_ty)?;
        let value = match assign.op.binary_op() {
            None => self.expr_as(&assign.value, &element)?,
            Some(op) => {
                if !is_simple(&index.object) || !is_simple(&index.index) {
                    return Err(self.unsupported("compound assignment to a computed index", assign.target.span));
                }
                let rhs = self.expr(&assign.value)?;
                format!("({object}.get({key}) {} {rhs})", op.as_str())
            }
        };
        Ok(format!("{object}.{method}({key}, {value})"))
    }

    fn range_value(&mut self, range: &RangeExpr, ty: &Type) -> EmitResult<String> {
        let stream = if ty.element_type() == Some(&Type::long()) { "LongStream" } else { "IntStream" };
        let start = self.expr(&range.start)?;
        let end = self.expr(&range.end)?;
        Ok(format!(
            "java.util.stream.{stream}.range({start}, {end}).boxed().collect(java.util.stream.Collectors.toList())"
        ))
    }

    // ========================================================================
    // Operators
    // ========================================================================

    fn binary(&mut self, binary: &BinaryExpr) -> EmitResult<String> {
        let left = self.expr(&binary.left)?;
        let right = if binary.op.is_logical() {
            self.without_hoisting("the right operand of `&&` or `||`", |s| s.expr(&binary.right))?
        } else {
            self.expr(&binary.right)?
        };
        let (left_ty, right_ty) = (binary.left.ty(), binary.right.ty());
        let op = binary.op;
        Ok(if op.is_equality() {
            equality(op, &left, &right, &left_ty, &right_ty)
        } else if op.is_comparison() && left_ty.non_null().is_string() {
            format!("({left}.compareTo({right}) {} 0)", op.as_str())
        } else {
            format!("({left} {} {right})", op.as_str())
        })
    }

    /// Assignment without surrounding parentheses.
    pub(super) fn assign(&mut self, assign: &AssignExpr) -> EmitResult<String> {
        if let ExprKind::Index(index) = &assign.target.kind {
            return self.index_store(index, assign);
        }
        let target = self.place(&assign.target, "assignment")?;
        let value = match assign.op {
            AssignOp::Assign => self.expr_as(&assign.value, &assign.target.ty())?,
            _ => self.expr(&assign.value)?,
        };
        Ok(format!("{target} {} {value}", assign.op.as_str()))
    }

    // ========================================================================
    // Calls and member access
    // ========================================================================

    fn call(&mut self, call: &CallExpr, span: Span) -> EmitResult<String> {
        let callee_ty = call.callee.ty().non_null();
        let params = function_params(&callee_ty);
        match &call.call_kind {
            Some(CallKind::Builtin(id)) => self.builtin_call(*id, &call.args),
            Some(CallKind::Constructor(name)) => {
                let args = self.args_as(&call.args, &params)?;
                Ok(format!("new {name}({})", args.join(", ")))
            }
            Some(CallKind::Function) => {
                let ExprKind::Ident(ident) = &call.callee.kind else {
                    return Err(self.unsupported("call of a computed function", span));
                };
                let args = self.args_as(&call.args, &params)?.join(", ");
                let name = member_name(&ident.name);
                let is_function = ident.symbol.is_some_and(|id| self.symbol(id).kind == SymbolKind::Function);
                // A nested type's own member hides the outer static method.
                let hidden = is_function
                    && self
                        .current_type
                        .as_deref()
                        .is_some_and(|t| self.unit.symbols.member(t, &ident.name).is_some());
                Ok(if hidden {
                    format!("{}.{name}({args})", self.class_name)
                } else {
                    format!("{name}({args})")
                })
            }
            Some(CallKind::Closure) | None => {
                let Type::Function { params, ret } = callee_ty else {
                    return Err(self.unsupported("call of a value that is not a function", span));
                };
                let functional = self.functional(&params, &ret, call.callee.span)?;
                let mut callee = self.expr(&call.callee)?;
                if matches!(call.callee.kind, ExprKind::Lambda(_)) {
                    callee = format!("(({}) {callee})", functional.java);
                }
                let args = self.args_as(&call.args, &params)?;
                Ok(format!("{callee}.{}({})", functional.invoke, args.join(", ")))
            }
        }
    }

    fn builtin_call(&mut self, id: BuiltinFnId, args: &[Expression]) -> EmitResult<String> {
        let mut texts = Vec::with_capacity(args.len());
        for arg in args {
            let text = self.expr(arg)?;
            // `println(null)` is ambiguous between overloads.
            texts.push(if arg.ty().is_null() { "(Object) null".to_string() } else { text });
        }
        let args = texts.join(", ");
        Ok(match id {
            BuiltinFnId::Println => format!("System.out.println({args})"),
            BuiltinFnId::Print => format!("System.out.print({args})"),
            BuiltinFnId::ToString => format!("String.valueOf({args})"),
            BuiltinFnId::ParseInt => format!("Integer.parseInt({args})"),
            BuiltinFnId::ParseFloat => format!("Double.parseDouble({args})"),
            BuiltinFnId::Assert => {
                self.needs_assert = true;
                format!("$assert({args})")
            }
        })
    }

    fn method_call(&mut self, call: &MethodCallExpr, span: Span) -> EmitResult<String> {
        let receiver_ty = call.receiver.ty();
        let receiver = self.expr(&call.receiver)?;
        let (receiver, guard) = self.guard_receiver(receiver, &call.receiver, &receiver_ty, call.safe)?;
        let access = self.method_access(call, &receiver, &receiver_ty.non_null(), span)?;
        Ok(match guard {
            Some(guard) => format!("({guard} == null ? null : {access})"),
            None => access,
        })
    }

    /// The receiver call itself, without the null guard of `?.`.
    pub(super) fn method_access(
        &mut self,
        call: &MethodCallExpr,
        receiver: &str,
        base: &Type,
        span: Span,
    ) -> EmitResult<String> {
        match &call.dispatch {
            Some(MethodDispatch::Builtin(member)) => {
                let info = members::info_for(*member);
                let type_args = base.as_generic().map(|(_, args)| args.to_vec()).unwrap_or_default();
                let (params, _) = info.instantiate(&type_args);
                let args = self.args_as(&call.args, &params)?;
                Ok(format!("{receiver}.{}({})", info.name, args.join(", ")))
            }
            Some(MethodDispatch::Extension { receiver_key }) => {
                let params = self
                    .unit
                    .symbols
                    .extension(receiver_key, &call.method)
                    .map(|id| function_params(&self.symbol(id).ty))
                    .unwrap_or_default();
                let mut args = vec![receiver.to_string()];
                args.extend(self.args_as(&call.args, &params)?);
                Ok(format!("{}({})", extension_name(receiver_key, &call.method), args.join(", ")))
            }
            Some(MethodDispatch::FieldClosure) => {
                let field_ty = self.member_type(base, &call.method);
                let Type::Function { params, ret } = field_ty else {
                    return Err(self.unsupported(format!("call of field `{}`", call.method), span));
                };
                let functional = self.functional(&params, &ret, span)?;
                let field = self.field_read(receiver, &call.receiver, base, &call.method);
                let args = self.args_as(&call.args, &params)?;
                Ok(format!("{field}.{}({})", functional.invoke, args.join(", ")))
            }
            Some(MethodDispatch::Instance) | None => {
                let params = function_params(&self.member_type(base, &call.method));
                let args = self.args_as(&call.args, &params)?;
                Ok(format!("{receiver}.{}({})", member_name(&call.method), args.join(", ")))
            }
        }
    }

    fn member(&mut self, member: &MemberExpr) -> EmitResult<String> {
        let object_ty = member.object.ty();
        let base = object_ty.non_null();
        let object = self.expr(&member.object)?;
        let (object, guard) = self.guard_receiver(object, &member.object, &object_ty, member.safe)?;
        let is_method = self
            .member_symbol(&base, &member.field)
            .is_some_and(|id| self.symbol(id).kind == SymbolKind::Method);
        let access = if is_method {
            format!("{object}::{}", member_name(&member.field))
        } else {
            self.field_read(&object, &member.object, &base, &member.field)
        };
        Ok(match guard {
            Some(guard) => format!("({guard} == null ? null : {access})"),
            None => access,
        })
    }

    /// For `?.`, the receiver text to use and the text to compare with `null`.
    ///
    /// A receiver that is not a plain name is evaluated once into a temporary.
    pub(super) fn guard_receiver(
        &mut self,
        text: String,
        receiver: &Expression,
        ty: &Type,
        safe: bool,
    ) -> EmitResult<(String, Option<String>)> {
        if !safe {
            return Ok((text, None));
        }
        if is_simple(receiver) {
            return Ok((text.clone(), Some(text)));
        }
        self.check_hoist("`?.` on a computed receiver", receiver.span)?;
        let java = self.boxed_type(ty, receiver.span)?;
        let temp = self.temp("r");
        self.out.line(&format!("final {java} {temp} = {text};"));
        Ok((temp.clone(), Some(temp)))
    }

    /// Read of a field: data classes keep their fields private behind getters.
    fn field_read(&self, object: &str, object_expr: &Expression, base: &Type, field: &str) -> String {
        let is_data = base
            .as_generic()
            .and_then(|(name, _)| self.unit.symbols.type_def(name))
            .is_some_and(|def| def.kind == TypeDefKind::Data);
        let own_instance = matches!(object_expr.kind, ExprKind::This) && self.receiver == "this";
        if is_data && !own_instance {
            format!("{object}.get{}()", capitalize(field))
        } else {
            format!("{object}.{}", member_name(field))
        }
    }

    fn member_symbol(&self, base: &Type, name: &str) -> Option<SymbolId> {
        let (type_name, _) = base.as_generic()?;
        self.unit.symbols.member(type_name, name)
    }

    fn member_type(&self, base: &Type, name: &str) -> Type {
        self.member_symbol(base, name)
            .map(|id| self.symbol(id).ty.clone())
            .unwrap_or(Type::Unresolved)
    }

    // ========================================================================
    // Lambdas and block expressions
    // ========================================================================

    fn lambda(&mut self, lambda: &LambdaExpr, ty: &Type, span: Span) -> EmitResult<String> {
        let Type::Function { params, ret } = ty.non_null() else {
            return Err(self.unsupported("lambda without a function type", span));
        };
        if let Some(param) = lambda.params.iter().find(|p| p.default.is_some()) {
            return Err(self.unsupported("default value on a lambda parameter", param.span));
        }
        self.functional(&params, &ret, span)?;

        self.lambda_locals.push(HashSet::new());
        let names: Vec<String> = lambda
            .params
            .iter()
            .map(|p| self.declare_local(p.symbol, &p.name))
            .collect();
        let saved_ret = self.return_ty.replace((*ret).clone());
        let body = self.lambda_body(&lambda.body, &ret);
        self.return_ty = saved_ret;
        self.lambda_locals.pop();
        Ok(format!("({}) -> {}", names.join(", "), body?))
    }

    fn lambda_body(&mut self, body: &LambdaBody, ret: &Type) -> EmitResult<String> {
        let indent = self.out.indentation();
        let inner = format!("{indent}    ");
        match body {
            LambdaBody::Block(block) => {
                let lines = self.capture(|s| s.emit_statements(&block.statements))?;
                Ok(format!("{{\n{lines}{indent}}}"))
            }
            LambdaBody::Expr(expr) => {
                let mut value = None;
                let lines = self.capture(|s| {
                    if ret.is_void() {
                        match s.statement_expr(expr)? {
                            Some(text) => value = Some(format!("{text};")),
                            None => s.emit_expr_stmt(expr)?,
                        }
                    } else {
                        value = Some(s.expr_as(expr, ret)?);
                    }
                    Ok(())
                })?;
                Ok(match value {
                    Some(text) if lines.is_empty() => text.trim_end_matches(';').to_string(),
                    Some(text) if ret.is_void() => format!("{{\n{lines}{inner}{text}\n{indent}}}"),
                    Some(text) => format!("{{\n{lines}{inner}return {text};\n{indent}}}"),
                    None => format!("{{\n{lines}{indent}}}"),
                })
            }
        }
    }

    fn block_expr(&mut self, block: &BlockExpr, span: Span) -> EmitResult<String> {
        self.check_hoist("comprehension or block expression", span)?;
        self.emit_statements(&block.statements)?;
        match &block.value {
            Some(value) => self.expr(value),
            None => Ok(String::new()),
        }
    }
}

pub(super) fn literal(lit: &Literal) -> String {
    match lit {
        Literal::Int(v) => v.to_string(),
        Literal::Long(v) => format!("{v}L"),
        Literal::Float(v) => format!("{}f", format_floating(*v)),
        Literal::Double(v) => format_floating(*v),
        Literal::String(s) => quote_string(s),
        Literal::Bool(b) => b.to_string(),
        Literal::Null => "null".to_string(),
    }
}

fn equality(op: BinaryOp, left: &str, right: &str, left_ty: &Type, right_ty: &Type) -> String {
    if left_ty.is_null() || right_ty.is_null() || (is_java_primitive(left_ty) && is_java_primitive(right_ty)) {
        return format!("({left} {} {right})", op.as_str());
    }
    let call = format!("java.util.Objects.equals({left}, {right})");
    if op == BinaryOp::NotEq { format!("!{call}") } else { call }
}

/// Names, literals and field chains: evaluating them twice is harmless.
pub(super) fn is_simple(expr: &Expression) -> bool {
    match &expr.kind {
        ExprKind::Literal(_) | ExprKind::Ident(_) | ExprKind::This => true,
        ExprKind::Member(m) => !m.safe && is_simple(&m.object),
        _ => false,
    }
}

fn function_params(ty: &Type) -> Vec<Type> {
    match ty {
        Type::Function { params, .. } => params.clone(),
        _ => Vec::new(),
    }
}
