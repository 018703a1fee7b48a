//! Check calls: declared functions, builtins, constructors, and closures.

use starlight_core::lang::builtins;
use starlight_core::types::Type;

use crate::frontend::ast::*;
use crate::frontend::diagnostics::{Diagnostic, errors};
use crate::frontend::symbols::SymbolKind;

use super::TypeChecker;

impl TypeChecker<'_> {
    /// Type-check a call expression and record its [`CallKind`].
    pub(in crate::frontend::typechecker) fn check_call(&mut self, call: &mut CallExpr, span: Span) -> Type {
        let callee_ty = self.check_expr(&mut call.callee, None);
        let named = match &call.callee.kind {
            ExprKind::Ident(IdentRef { name, symbol: Some(id) }) => Some((name.clone(), *id)),
            _ => None,
        };

        if let Some((name, id)) = named {
            let kind = self.symbols.symbol(id).kind;
            match kind {
                SymbolKind::Function | SymbolKind::Method => {
                    let (params, required) = self
                        .signatures
                        .get(&id)
                        .map(|s| (s.params.clone(), s.required))
                        .unwrap_or_default();
                    self.check_args(&name, &params, required, &mut call.args, span);
                    call.call_kind = Some(CallKind::Function);
                    return self.return_type_of(id);
                }
                SymbolKind::Builtin(builtin) => {
                    let info = builtins::info_for(builtin);
                    let params: Vec<Type> = info.params.iter().map(|p| Type::Primitive(*p)).collect();
                    self.check_args(&name, &params, params.len(), &mut call.args, span);
                    call.call_kind = Some(CallKind::Builtin(builtin));
                    return Type::Primitive(info.ret);
                }
                SymbolKind::Class | SymbolKind::DataClass => {
                    let params = self.signatures.get(&id).map(|s| s.params.clone()).unwrap_or_default();
                    self.check_args(&name, &params, params.len(), &mut call.args, span);
                    call.call_kind = Some(CallKind::Constructor(name.clone()));
                    return Type::named(name);
                }
                SymbolKind::Interface => {
                    self.error(errors::invalid_context(
                        format!("interface `{name}` cannot be instantiated"),
                        call.callee.span,
                    ));
                    self.check_args_unchecked(&mut call.args);
                    return Type::Unresolved;
                }
                SymbolKind::Unresolved => {
                    self.check_args_unchecked(&mut call.args);
                    return Type::Unresolved;
                }
                SymbolKind::Variable | SymbolKind::Parameter | SymbolKind::Field => {}
            }
        }

        // Call through a function-typed value.
        match callee_ty.non_null() {
            Type::Function { params, ret } => {
                if callee_ty.is_nullable() {
                    self.error(
                        errors::type_mismatch(&callee_ty.non_null().to_string(), &callee_ty.to_string(), call.callee.span)
                            .with_hint("check the function value for null first, or assert it with `!!`"),
                    );
                }
                let callee = callee_display(&call.callee);
                self.check_args(&callee, &params, params.len(), &mut call.args, span);
                call.call_kind = Some(CallKind::Closure);
                *ret
            }
            Type::Unresolved => {
                self.check_args_unchecked(&mut call.args);
                Type::Unresolved
            }
            other => {
                self.error(Diagnostic::type_mismatch(
                    format!("expected a function, found `{other}`"),
                    call.callee.span,
                ));
                self.check_args_unchecked(&mut call.args);
                Type::Unresolved
            }
        }
    }

    /// Check arguments against parameter types.
    ///
    /// An arity mismatch is reported once per call; every argument is still checked, against its
    /// parameter when one exists.
    pub(in crate::frontend::typechecker) fn check_args(
        &mut self,
        callee: &str,
        params: &[Type],
        required: usize,
        args: &mut [Expression],
        span: Span,
    ) {
        if args.len() < required || args.len() > params.len() {
            let expected = if args.len() < required { required } else { params.len() };
            let mut diagnostic = errors::arity_mismatch(callee, expected, args.len(), span);
            if required < params.len() {
                diagnostic = diagnostic.with_note(format!(
                    "`{callee}` accepts between {required} and {} arguments",
                    params.len()
                ));
            }
            self.error(diagnostic);
        }
        for (i, arg) in args.iter_mut().enumerate() {
            match params.get(i) {
                Some(expected) => {
                    let found = self.check_expr(arg, Some(expected));
                    self.expect_assignable(&found, expected, arg.span);
                }
                None => {
                    self.check_expr(arg, None);
                }
            }
        }
    }

    pub(in crate::frontend::typechecker) fn check_args_unchecked(&mut self, args: &mut [Expression]) {
        for arg in args {
            self.check_expr(arg, None);
        }
    }
}

fn callee_display(callee: &Expression) -> String {
    match &callee.kind {
        ExprKind::Ident(ident) => ident.name.clone(),
        ExprKind::Member(member) => member.field.clone(),
        _ => "function value".to_string(),
    }
}
