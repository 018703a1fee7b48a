//! Check indexing, field access, and method calls.
//!
//! Method lookup order on a receiver is: members of a user type (methods, then function-typed
//! fields), builtin members of `string`/`List`/`Map`, then extension functions registered for
//! the receiver's key.

use starlight_core::lang::members::{self, Receiver};
use starlight_core::types::{MAP, Type};

use crate::frontend::ast::*;
use crate::frontend::diagnostics::{Diagnostic, errors};
use crate::frontend::symbols::{SymbolKind, receiver_key};

use super::TypeChecker;

/// How a method call resolved, before argument checking.
struct MethodTarget {
    params: Vec<Type>,
    required: usize,
    ret: Type,
    dispatch: MethodDispatch,
}

impl TypeChecker<'_> {
    /// Type-check an indexing expression (`base[index]`).
    ///
    /// When `store` is set the expression is an assignment target and a map yields `V` instead of
    /// `V?`.
    pub(in crate::frontend::typechecker) fn check_index(&mut self, index: &mut IndexExpr, span: Span, store: bool) -> Type {
        let base = self.check_expr(&mut index.object, None);
        if base.is_unresolved() {
            self.check_expr(&mut index.index, None);
            return Type::Unresolved;
        }
        if base.is_nullable() {
            self.error(
                errors::type_mismatch(&base.non_null().to_string(), &base.to_string(), index.object.span)
                    .with_hint("check the value for null first, or assert it with `!!`"),
            );
        }
        let base = base.non_null();

        if let Some((MAP, [key, value])) = base.as_generic() {
            let (key, value) = (key.clone(), value.clone());
            let found = self.check_expr(&mut index.index, Some(&key));
            self.expect_assignable(&found, &key, index.index.span);
            return if store { value } else { Type::nullable(value) };
        }

        let element = if base.is_string() {
            if store {
                self.error(errors::invalid_context("strings are immutable and cannot be assigned by index", span));
            }
            Some(Type::char())
        } else {
            base.element_type().filter(|_| base.as_generic().is_some_and(|(n, _)| n != "Range")).cloned()
        };
        let Some(element) = element else {
            self.check_expr(&mut index.index, None);
            self.error(Diagnostic::type_mismatch(format!("type `{base}` cannot be indexed"), span));
            return Type::Unresolved;
        };
        let found = self.check_expr(&mut index.index, Some(&Type::int()));
        if !found.is_unresolved() && !found.is_integral() {
            self.error(errors::type_mismatch("int", &found.to_string(), index.index.span));
        }
        element
    }

    /// Type-check a field access (`object.field` / `object?.field`).
    pub(in crate::frontend::typechecker) fn check_member(&mut self, member: &mut MemberExpr, span: Span) -> Type {
        let object = self.check_expr(&mut member.object, None);
        if object.is_unresolved() {
            return Type::Unresolved;
        }
        self.check_nullable_receiver(&object, member.safe, span);
        let base = object.non_null();
        let ty = match self.field_symbol(&member.object, &member.field) {
            Some(id) => self.symbols.symbol(id).ty.clone(),
            None => match self.user_member(&base, &member.field) {
                // A method referenced without calling it.
                Some(id) if self.symbols.symbol(id).kind == SymbolKind::Method => self.function_type_of(id),
                _ => {
                    self.error(errors::unknown_member(&base.to_string(), &member.field, member.field_span));
                    return Type::Unresolved;
                }
            },
        };
        if member.safe { Type::nullable(ty) } else { ty }
    }

    /// The field symbol `object.field` refers to, using the already recorded object type.
    pub(in crate::frontend::typechecker) fn field_symbol(&self, object: &Expression, field: &str) -> Option<SymbolId> {
        let base = object.ty().non_null();
        self.user_member(&base, field)
            .filter(|id| self.symbols.symbol(*id).kind == SymbolKind::Field)
    }

    fn user_member(&self, base: &Type, name: &str) -> Option<SymbolId> {
        match base.as_generic() {
            Some((type_name, [])) => self.symbols.member(type_name, name),
            _ => None,
        }
    }

    fn check_nullable_receiver(&mut self, receiver: &Type, safe: bool, span: Span) {
        if receiver.is_nullable() && !safe && !receiver.is_null() {
            self.error(
                Diagnostic::type_mismatch(format!("receiver of type `{receiver}` may be null"), span)
                    .with_hint("use `?.` for a null-safe access, or assert non-null with `!!`"),
            );
        }
    }

    /// Type-check a method call and record how it dispatches.
    pub(in crate::frontend::typechecker) fn check_method_call(&mut self, call: &mut MethodCallExpr, span: Span) -> Type {
        let receiver = self.check_expr(&mut call.receiver, None);
        if receiver.is_unresolved() {
            self.check_args_unchecked(&mut call.args);
            return Type::Unresolved;
        }
        self.check_nullable_receiver(&receiver, call.safe, span);
        let base = receiver.non_null();

        let Some(target) = self.resolve_method(&base, &call.method, call.method_span) else {
            self.check_args_unchecked(&mut call.args);
            return Type::Unresolved;
        };
        let callee = format!("{base}.{}", call.method);
        self.check_args(&callee, &target.params, target.required, &mut call.args, span);
        call.dispatch = Some(target.dispatch);
        if call.safe && !target.ret.is_void() {
            Type::nullable(target.ret)
        } else {
            target.ret
        }
    }

    fn resolve_method(&mut self, base: &Type, method: &str, method_span: Span) -> Option<MethodTarget> {
        if let Some(id) = self.user_member(base, method) {
            let symbol = self.symbols.symbol(id);
            return match (symbol.kind, symbol.ty.clone()) {
                (SymbolKind::Method, _) => {
                    let (params, required) = self
                        .signatures
                        .get(&id)
                        .map(|s| (s.params.clone(), s.required))
                        .unwrap_or_default();
                    let ret = self.return_type_of(id);
                    Some(MethodTarget {
                        params,
                        required,
                        ret,
                        dispatch: MethodDispatch::Instance,
                    })
                }
                (SymbolKind::Field, Type::Function { params, ret }) => Some(MethodTarget {
                    required: params.len(),
                    params,
                    ret: *ret,
                    dispatch: MethodDispatch::FieldClosure,
                }),
                (_, ty) => {
                    self.error(Diagnostic::type_mismatch(
                        format!("`{method}` has type `{ty}` and cannot be called"),
                        method_span,
                    ));
                    None
                }
            };
        }

        if let Some(info) = Receiver::of(base).and_then(|r| members::lookup(r, method)) {
            let args = base.as_generic().map(|(_, args)| args.to_vec()).unwrap_or_default();
            let (params, ret) = info.instantiate(&args);
            return Some(MethodTarget {
                required: params.len(),
                params,
                ret,
                dispatch: MethodDispatch::Builtin(info.id),
            });
        }

        if let Some(key) = receiver_key(base) {
            if let Some(id) = self.symbols.extension(&key, method) {
                let (params, required) = self
                    .signatures
                    .get(&id)
                    .map(|s| (s.params.clone(), s.required))
                    .unwrap_or_default();
                let ret = self.return_type_of(id);
                return Some(MethodTarget {
                    params,
                    required,
                    ret,
                    dispatch: MethodDispatch::Extension { receiver_key: key },
                });
            }
        }

        self.error(errors::unknown_member(&base.to_string(), method, method_span));
        None
    }
}
