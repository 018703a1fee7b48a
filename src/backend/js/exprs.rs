//! Expressions.

use starlight_core::lang::builtins::BuiltinFnId;
use starlight_core::lang::members::MemberId;
use starlight_core::types::{LIST, MAP, Type};

use crate::frontend::ast::*;
use crate::frontend::symbols::SymbolKind;

use super::super::EmitResult;
use super::super::emitter::{CodeWriter, format_floating, quote_string};
use super::{Frame, JsEmitter, binding_name, extension_name, is_js_primitive, property_name};

impl JsEmitter<'_> {
    pub(super) fn expr(&mut self, expr: &Expression) -> EmitResult<String> {
        let span = expr.span;
        match &expr.kind {
            ExprKind::Literal(lit) => Ok(literal(lit)),
            ExprKind::Ident(ident) => self.ident(ident, span),
            ExprKind::This => Ok(self.receiver.to_string()),
            ExprKind::Template(_) => Err(self.unsupported("unlowered string template", span)),
            ExprKind::Comprehension(_) => Err(self.unsupported("unlowered comprehension", span)),
            ExprKind::List(list) => {
                let items = self.exprs(&list.elements)?;
                Ok(format!("[{}]", items.join(", ")))
            }
            ExprKind::Map(map) => {
                if map.entries.is_empty() {
                    return Ok("new Map()".to_string());
                }
                let mut entries = Vec::with_capacity(map.entries.len());
                for (key, value) in &map.entries {
                    entries.push(format!("[{}, {}]", self.expr(key)?, self.expr(value)?));
                }
                Ok(format!("new Map([{}])", entries.join(", ")))
            }
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
                let then_text = self.expr(&cond.then_expr)?;
                let else_text = self.expr(&cond.else_expr)?;
                Ok(format!("({condition} ? {then_text} : {else_text})"))
            }
            ExprKind::Call(call) => self.call(call, span),
            ExprKind::MethodCall(call) => self.method_call(call),
            ExprKind::Member(member) => self.member(member),
            ExprKind::NonNull(nn) => {
                self.needs_nn = true;
                Ok(format!("$nn({})", self.expr(&nn.operand)?))
            }
            ExprKind::Index(index) => self.index(index),
            ExprKind::Range(range) => {
                self.needs_range = true;
                Ok(format!("$range({}, {})", self.expr(&range.start)?, self.expr(&range.end)?))
            }
            ExprKind::Await(await_expr) => {
                if !self.frame().is_async {
                    return Err(self.unsupported("`await` inside a lambda", span));
                }
                Ok(format!("(await {})", self.expr(&await_expr.operand)?))
            }
            ExprKind::Lambda(lambda) => self.lambda(lambda),
            ExprKind::Match(m) => self.match_expr(m),
            ExprKind::Block(block) => self.block_expr(block),
        }
    }

    fn exprs(&mut self, exprs: &[Expression]) -> EmitResult<Vec<String>> {
        exprs.iter().map(|e| self.expr(e)).collect()
    }

    // ========================================================================
    // Names
    // ========================================================================

    fn ident(&mut self, ident: &IdentRef, span: Span) -> EmitResult<String> {
        let Some(id) = ident.symbol else {
            return Ok(binding_name(&ident.name));
        };
        match self.symbol(id).kind {
            SymbolKind::Variable | SymbolKind::Parameter | SymbolKind::Function => {
                Ok(self.local_name(Some(id), &ident.name))
            }
            SymbolKind::Field => Ok(format!("this.{}", property_name(&ident.name))),
            SymbolKind::Method => {
                let name = property_name(&ident.name);
                Ok(format!("this.{name}.bind(this)"))
            }
            SymbolKind::Class | SymbolKind::DataClass => {
                Ok(format!("((...args) => new {}(...args))", self.type_name(&ident.name)))
            }
            SymbolKind::Builtin(builtin) => Ok(self.builtin_value(builtin)),
            SymbolKind::Interface | SymbolKind::Unresolved => {
                Err(self.unsupported(format!("`{}` used as a value", ident.name), span))
            }
        }
    }

    /// An assignable location.
    fn place(&mut self, target: &Expression, what: &str) -> EmitResult<String> {
        match &target.kind {
            ExprKind::Ident(ident) => self.ident(ident, target.span),
            ExprKind::Member(m) if !m.safe => {
                let object = self.expr(&m.object)?;
                Ok(format!("{object}.{}", property_name(&m.field)))
            }
            _ => Err(self.unsupported(format!("{what} on this target"), target.span)),
        }
    }

    // ========================================================================
    // Operators
    // ========================================================================

    fn binary(&mut self, binary: &BinaryExpr) -> EmitResult<String> {
        let left = self.expr(&binary.left)?;
        let right = self.expr(&binary.right)?;
        let (left_ty, right_ty) = (binary.left.ty(), binary.right.ty());
        let op = binary.op;
        Ok(if op.is_equality() {
            self.equality(op, &left, &right, &left_ty, &right_ty)
        } else if op == BinaryOp::Div && integral(&left_ty) && integral(&right_ty) {
            format!("Math.trunc({left} / {right})")
        } else {
            format!("({left} {} {right})", op.as_str())
        })
    }

    fn equality(&mut self, op: BinaryOp, left: &str, right: &str, left_ty: &Type, right_ty: &Type) -> String {
        let negated = op == BinaryOp::NotEq;
        if left_ty.is_null() || right_ty.is_null() {
            // Loose comparison also catches `undefined`.
            return format!("({left} {} {right})", if negated { "!=" } else { "==" });
        }
        if is_js_primitive(left_ty) && is_js_primitive(right_ty) {
            return format!("({left} {} {right})", if negated { "!==" } else { "===" });
        }
        self.needs_eq = true;
        let call = format!("$eq({left}, {right})");
        if negated { format!("!{call}") } else { call }
    }

    /// Assignment without surrounding parentheses.
    pub(super) fn assign(&mut self, assign: &AssignExpr) -> EmitResult<String> {
        if let ExprKind::Index(index) = &assign.target.kind {
            return self.index_store(index, assign);
        }
        let target = self.place(&assign.target, "assignment")?;
        let value = self.expr(&assign.value)?;
        if assign.op.binary_op() == Some(BinaryOp::Div) && integral(&assign.target.ty()) {
            if !is_simple(&assign.target) {
                return Err(self.unsupported("integer `/=` on a computed target", assign.target.span));
            }
            return Ok(format!("{target} = Math.trunc({target} / {value})"));
        }
        Ok(format!("{target} {} {value}", assign.op.as_str()))
    }

    // ========================================================================
    // Collections
    // ========================================================================

    fn index(&mut self, index: &IndexExpr) -> EmitResult<String> {
        let object_ty = index.object.ty().non_null();
        let object = self.expr(&index.object)?;
        let key = self.expr(&index.index)?;
        Ok(if is_map(&object_ty) {
            format!("({object}.get({key}) ?? null)")
        } else {
            format!("{object}[{key}]")
        })
    }

    /// `list[i] = v` / `map[k] op= v`.
    fn index_store(&mut self, index: &IndexExpr, assign: &AssignExpr) -> EmitResult<String> {
        let object_ty = index.object.ty().non_null();
        let object = self.expr(&index.object)?;
        let key = self.expr(&index.index)?;
        let value = self.expr(&assign.value)?;
        let compound = assign.op.binary_op();
        if compound.is_some() && (!is_simple(&index.object) || !is_simple(&index.index)) {
            return Err(self.unsupported("compound assignment to a computed index", assign.target.span));
        }
        let element = if is_map(&object_ty) {
            format!("{object}.get({key})")
        } else {
            format!("{object}[{key}]")
        };
        let combined = match compound {
            None => value,
            Some(BinaryOp::Div) if integral(&assign.target.ty()) => format!("Math.trunc({element} / {value})"),
            Some(op) => format!("({element} {} {value})", op.as_str()),
        };
        Ok(if is_map(&object_ty) {
            format!("{object}.set({key}, {combined})")
        } else {
            format!("{element} = {combined}")
        })
    }

    // ========================================================================
    // Calls and member access
    // ========================================================================

    fn call(&mut self, call: &CallExpr, span: Span) -> EmitResult<String> {
        match &call.call_kind {
            Some(CallKind::Builtin(id)) => self.builtin_call(*id, &call.args),
            Some(CallKind::Constructor(name)) => {
                let args = self.exprs(&call.args)?;
                Ok(format!("new {}({})", self.type_name(name), args.join(", ")))
            }
            Some(CallKind::Function) => {
                let ExprKind::Ident(ident) = &call.callee.kind else {
                    return Err(self.unsupported("call of a computed function", span));
                };
                let args = self.exprs(&call.args)?.join(", ");
                let is_method = ident
                    .symbol
                    .is_some_and(|id| self.symbol(id).kind == SymbolKind::Method);
                Ok(if is_method {
                    format!("this.{}({args})", property_name(&ident.name))
                } else {
                    format!("{}({args})", self.local_name(ident.symbol, &ident.name))
                })
            }
            Some(CallKind::Closure) | None => {
                let mut callee = self.expr(&call.callee)?;
                if matches!(call.callee.kind, ExprKind::Lambda(_)) {
                    callee = format!("({callee})");
                }
                let args = self.exprs(&call.args)?;
                Ok(format!("{callee}({})", args.join(", ")))
            }
        }
    }

    fn builtin_call(&mut self, id: BuiltinFnId, args: &[Expression]) -> EmitResult<String> {
        let mut texts = Vec::with_capacity(args.len());
        for arg in args {
            let text = self.expr(arg)?;
            let text = match id {
                BuiltinFnId::Println | BuiltinFnId::Print | BuiltinFnId::ToString => {
                    self.rendered(text, &arg.ty(), matches!(id, BuiltinFnId::Println))
                }
                _ => text,
            };
            texts.push(text);
        }
        let args = texts.join(", ");
        Ok(match id {
            BuiltinFnId::Println => format!("console.log({args})"),
            BuiltinFnId::Print => format!("process.stdout.write({args})"),
            BuiltinFnId::ToString => args,
            BuiltinFnId::ParseInt => format!("Number.parseInt({args}, 10)"),
            BuiltinFnId::ParseFloat => format!("Number.parseFloat({args})"),
            BuiltinFnId::Assert => {
                self.needs_assert = true;
                format!("$assert({args})")
            }
        })
    }

    /// Text of a value the way its `toString` renders it. Collections render as `[a, b]`
    /// and `{k=v}`.
    fn rendered(&mut self, text: String, ty: &Type, keep_primitive: bool) -> String {
        if is_collection(ty) {
            self.needs_str = true;
            format!("$str({text})")
        } else if keep_primitive && is_js_primitive(ty) {
            text
        } else {
            format!("String({text})")
        }
    }

    /// A builtin function used as a value.
    fn builtin_value(&mut self, id: BuiltinFnId) -> String {
        match id {
            BuiltinFnId::Println => {
                self.needs_str = true;
                "((value) => console.log($str(value)))".to_string()
            }
            BuiltinFnId::Print => {
                self.needs_str = true;
                "((value) => process.stdout.write($str(value)))".to_string()
            }
            BuiltinFnId::ToString => {
                self.needs_str = true;
                "$str".to_string()
            }
            BuiltinFnId::ParseInt => "((text) => Number.parseInt(text, 10))".to_string(),
            BuiltinFnId::ParseFloat => "Number.parseFloat".to_string(),
            BuiltinFnId::Assert => {
                self.needs_assert = true;
                "$assert".to_string()
            }
        }
    }

    fn method_call(&mut self, call: &MethodCallExpr) -> EmitResult<String> {
        let base = call.receiver.ty().non_null();
        let receiver = self.expr(&call.receiver)?;
        match &call.dispatch {
            Some(MethodDispatch::Builtin(member)) => {
                let member = *member;
                self.null_guarded(receiver, call.safe, |s, r| {
                    let args = s.exprs(&call.args)?;
                    Ok(s.builtin_member(member, r, &args, &base))
                })
            }
            Some(MethodDispatch::Extension { receiver_key }) => {
                let name = extension_name(receiver_key, &call.method);
                self.null_guarded(receiver, call.safe, |s, r| {
                    let mut args = vec![r.to_string()];
                    args.extend(s.exprs(&call.args)?);
                    Ok(format!("{name}({})", args.join(", ")))
                })
            }
            Some(MethodDispatch::FieldClosure | MethodDispatch::Instance) | None => {
                let args = self.exprs(&call.args)?.join(", ");
                let method = property_name(&call.method);
                Ok(if call.safe {
                    format!("({receiver}?.{method}({args}) ?? null)")
                } else {
                    format!("{receiver}.{method}({args})")
                })
            }
        }
    }

    /// `access` applied to `receiver`; for `?.` the receiver is bound once and `null` short-circuits.
    fn null_guarded(
        &mut self,
        receiver: String,
        safe: bool,
        access: impl FnOnce(&mut Self, &str) -> EmitResult<String>,
    ) -> EmitResult<String> {
        if !safe {
            return access(self, &receiver);
        }
        let param = self.temp("r");
        let body = access(self, &param)?;
        Ok(format!("(({param}) => {param} == null ? null : {body})({receiver})"))
    }

    fn builtin_member(&mut self, member: MemberId, r: &str, args: &[String], base: &Type) -> String {
        let arg = |i: usize| args.get(i).map(String::as_str).unwrap_or("undefined");
        match member {
            MemberId::StringLength | MemberId::ListSize => format!("{r}.length"),
            MemberId::StringIsEmpty | MemberId::ListIsEmpty => format!("({r}.length === 0)"),
            MemberId::StringToUpperCase => format!("{r}.toUpperCase()"),
            MemberId::StringToLowerCase => format!("{r}.toLowerCase()"),
            MemberId::StringContains => format!("{r}.includes({})", arg(0)),
            MemberId::StringSubstring => format!("{r}.substring({}, {})", arg(0), arg(1)),
            MemberId::ListAdd => format!("{r}.push({})", arg(0)),
            MemberId::ListGet => format!("{r}[{}]", arg(0)),
            MemberId::ListContains => {
                if base.element_type().is_some_and(is_js_primitive) {
                    format!("{r}.includes({})", arg(0))
                } else {
                    self.needs_eq = true;
                    self.needs_has = true;
                    format!("$has({r}, {})", arg(0))
                }
            }
            MemberId::MapSize => format!("{r}.size"),
            MemberId::MapIsEmpty => format!("({r}.size === 0)"),
            MemberId::MapGet => format!("({r}.get({}) ?? null)", arg(0)),
            MemberId::MapPut => format!("{r}.set({}, {})", arg(0), arg(1)),
            MemberId::MapContainsKey => format!("{r}.has({})", arg(0)),
        }
    }

    fn member(&mut self, member: &MemberExpr) -> EmitResult<String> {
        let base = member.object.ty().non_null();
        let object = self.expr(&member.object)?;
        let field = property_name(&member.field);
        let is_method = base
            .as_generic()
            .and_then(|(type_name, _)| self.unit.symbols.member(type_name, &member.field))
            .is_some_and(|id| self.symbol(id).kind == SymbolKind::Method);
        if is_method {
            if !member.safe && is_simple(&member.object) {
                return Ok(format!("{object}.{field}.bind({object})"));
            }
            let param = self.temp("r");
            let guard = if member.safe { format!("{param} == null ? null : ") } else { String::new() };
            return Ok(format!("(({param}) => {guard}{param}.{field}.bind({param}))({object})"));
        }
        Ok(if member.safe {
            format!("({object}?.{field} ?? null)")
        } else {
            format!("{object}.{field}")
        })
    }

    // ========================================================================
    // Lambdas and block expressions
    // ========================================================================

    fn lambda(&mut self, lambda: &LambdaExpr) -> EmitResult<String> {
        self.in_frame(Frame::function(false), |s| {
            let mut params = Vec::with_capacity(lambda.params.len());
            for param in &lambda.params {
                let name = s.declare_local(param.symbol, &param.name);
                params.push(match &param.default {
                    Some(default) => format!("{name} = {}", s.expr(default)?),
                    None => name,
                });
            }
            let body = match &lambda.body {
                LambdaBody::Block(block) => s.braced(|s| s.emit_statements(&block.statements))?,
                LambdaBody::Expr(expr) => s.expr(expr)?,
            };
            Ok(format!("({}) => {body}", params.join(", ")))
        })
    }

    /// Statements written by `f`, wrapped in braces one level deeper than the current line.
    pub(super) fn braced(&mut self, f: impl FnOnce(&mut Self) -> EmitResult<()>) -> EmitResult<String> {
        let indent = self.out.indentation();
        let nested = CodeWriter::with_level(self.out.level() + 1);
        let saved = std::mem::replace(&mut self.out, nested);
        let result = f(self);
        let body = std::mem::replace(&mut self.out, saved).finish();
        result?;
        Ok(format!("{{\n{body}{indent}}}"))
    }

    fn block_expr(&mut self, block: &BlockExpr) -> EmitResult<String> {
        if block.statements.is_empty() {
            return match &block.value {
                Some(value) => self.expr(value),
                None => Ok("undefined".to_string()),
            };
        }
        self.iife(|s| {
            s.emit_statements(&block.statements)?;
            if let Some(value) = &block.value {
                let value = s.expr(value)?;
                s.out.line(&format!("return {value};"));
            }
            Ok(())
        })
    }
}

pub(super) fn literal(lit: &Literal) -> String {
    match lit {
        Literal::Int(v) | Literal::Long(v) => v.to_string(),
        Literal::Float(v) | Literal::Double(v) => format_floating(*v),
        Literal::String(s) => quote_string(s),
        Literal::Bool(b) => b.to_string(),
        Literal::Null => "null".to_string(),
    }
}

fn integral(ty: &Type) -> bool {
    ty.non_null().is_integral()
}

fn is_map(ty: &Type) -> bool {
    ty.as_generic().is_some_and(|(name, _)| name == MAP)
}

fn is_collection(ty: &Type) -> bool {
    ty.non_null().as_generic().is_some_and(|(name, _)| name == LIST || name == MAP)
}

/// Names, literals and field chains: evaluating them twice is harmless.
pub(super) fn is_simple(expr: &Expression) -> bool {
    match &expr.kind {
        ExprKind::Literal(_) | ExprKind::Ident(_) | ExprKind::This => true,
        ExprKind::Member(m) => !m.safe && is_simple(&m.object),
        _ => false,
    }
}
