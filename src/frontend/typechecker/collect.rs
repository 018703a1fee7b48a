//! First pass: type every declared signature before any body is checked.

use starlight_core::types::{LIST, MAP, PrimitiveType, Type};

use crate::frontend::ast::*;
use crate::frontend::diagnostics::Diagnostic;

use super::{PendingBody, ReturnState, Signature, TypeChecker};

impl TypeChecker<'_> {
    pub(super) fn collect(&mut self, program: &mut Program) {
        for decl in &mut program.declarations {
            match &mut decl.node {
                Declaration::Function(f) => self.collect_function(f, None),
                Declaration::Class(c) => {
                    let this_ty = Type::named(&c.name);
                    self.collect_constructor(c.symbol, &mut c.fields, &this_ty);
                    for member in &mut c.members {
                        match member {
                            ClassMember::Field(field) => {
                                let var = &mut field.node;
                                if let (Some(ty), Some(id)) = (&var.ty, var.symbol) {
                                    let ty = self.lower_type(ty);
                                    var.resolved = Some(ty.clone());
                                    self.symbols.set_type(id, ty);
                                }
                            }
                            ClassMember::Method(method) => {
                                self.collect_function(&mut method.node, Some(this_ty.clone()))
                            }
                        }
                    }
                }
                Declaration::Data(d) => {
                    let this_ty = Type::named(&d.name);
                    self.collect_constructor(d.symbol, &mut d.fields, &this_ty);
                    for method in &mut d.methods {
                        self.collect_function(&mut method.node, Some(this_ty.clone()));
                    }
                }
                Declaration::Interface(i) => {
                    for sig in &mut i.methods {
                        let sig = &mut sig.node;
                        let params = self.collect_params(&mut sig.params);
                        let ret = match &sig.return_type {
                            Some(ty) => self.lower_type(ty),
                            None => Type::void(),
                        };
                        if let Some(id) = sig.symbol {
                            let required = required_params(&sig.params);
                            self.signatures.insert(
                                id,
                                Signature {
                                    params,
                                    required,
                                    ret: ReturnState::Known(ret),
                                },
                            );
                            self.refresh_function_type(id);
                        }
                    }
                }
                Declaration::Extension(e) => {
                    let receiver = self.lower_type(&e.receiver);
                    for func in &mut e.functions {
                        self.collect_function(&mut func.node, Some(receiver.clone()));
                    }
                    e.resolved_receiver = Some(receiver);
                }
                Declaration::Statement(Statement::Var(var)) => {
                    // Annotated globals are usable from any function body.
                    if let (Some(ty), Some(id)) = (&var.ty, var.symbol) {
                        let ty = self.lower_type(ty);
                        self.symbols.set_type(id, ty);
                    }
                }
                Declaration::Statement(_) => {}
            }
        }

        // Unannotated class fields need every signature in place before they can be inferred.
        for decl in &mut program.declarations {
            let Declaration::Class(c) = &mut decl.node else { continue };
            let this_ty = Type::named(&c.name);
            for member in &mut c.members {
                let ClassMember::Field(field) = member else { continue };
                let var = &mut field.node;
                if var.ty.is_some() {
                    continue;
                }
                let (Some(id), Some(init)) = (var.symbol, &var.init) else { continue };
                let mut init = init.clone();
                let ty = self.silently(Some(this_ty.clone()), |c| c.check_expr(&mut init, None));
                self.symbols.set_type(id, ty);
            }
        }
    }

    /// Run `f` with diagnostics muted inside a fresh frame.
    pub(super) fn silently<T>(&mut self, this_ty: Option<Type>, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved_diagnostics = std::mem::take(&mut self.diagnostics);
        let saved_frames = std::mem::take(&mut self.frames);
        self.frames.push(super::Frame {
            declared_ret: None,
            returns: Vec::new(),
            is_async: false,
            this_ty,
        });
        let result = f(self);
        self.diagnostics = saved_diagnostics;
        self.frames = saved_frames;
        result
    }

    fn collect_constructor(&mut self, owner: Option<SymbolId>, fields: &mut [FieldParam], this_ty: &Type) {
        let mut params = Vec::with_capacity(fields.len());
        for field in fields.iter_mut() {
            let ty = self.lower_type(&field.ty);
            field.resolved = Some(ty.clone());
            if let Some(id) = field.symbol {
                self.symbols.set_type(id, ty.clone());
            }
            params.push(ty);
        }
        if let Some(id) = owner {
            self.signatures.insert(
                id,
                Signature {
                    required: params.len(),
                    params,
                    ret: ReturnState::Known(this_ty.clone()),
                },
            );
        }
    }

    fn collect_function(&mut self, f: &mut FunctionDecl, this_ty: Option<Type>) {
        let params = self.collect_params(&mut f.params);
        let ret = match &f.return_type {
            Some(ty) => {
                let ty = self.lower_type(ty);
                f.resolved_return = Some(ty.clone());
                ReturnState::Known(ty)
            }
            None => ReturnState::Pending,
        };
        let Some(id) = f.symbol else { return };
        if matches!(ret, ReturnState::Pending) {
            self.pending.insert(
                id,
                PendingBody {
                    decl: f.clone(),
                    this_ty,
                },
            );
        }
        self.signatures.insert(
            id,
            Signature {
                params,
                required: required_params(&f.params),
                ret,
            },
        );
        self.refresh_function_type(id);
    }

    fn collect_params(&mut self, params: &mut [Param]) -> Vec<Type> {
        let mut types = Vec::with_capacity(params.len());
        for param in params.iter_mut() {
            let ty = match &param.ty {
                Some(ty) => self.lower_type(ty),
                None => {
                    self.error(crate::frontend::diagnostics::errors::cannot_infer(
                        &format!("parameter `{}`", param.name),
                        param.span,
                    ));
                    Type::Unresolved
                }
            };
            param.resolved = Some(ty.clone());
            if let Some(id) = param.symbol {
                self.symbols.set_type(id, ty.clone());
            }
            types.push(ty);
        }
        types
    }

    // ========================================================================
    // Type expressions
    // ========================================================================

    /// Convert a written type into a semantic [`Type`].
    ///
    /// Unknown names were already reported by the resolver and lower to `Unresolved`.
    pub(super) fn lower_type(&mut self, ty: &Spanned<TypeExpr>) -> Type {
        match &ty.node {
            TypeExpr::Named { name, args } => {
                let args: Vec<Type> = args.iter().map(|a| self.lower_type(a)).collect();
                if let Some(p) = PrimitiveType::from_str(name) {
                    if !args.is_empty() {
                        self.type_arg_error(name, 0, args.len(), ty.span);
                    }
                    return Type::Primitive(p);
                }
                let expected = match name.as_str() {
                    LIST => 1,
                    MAP => 2,
                    _ if self.symbols.type_def(name).is_some() => 0,
                    _ => return Type::Unresolved,
                };
                if args.len() != expected {
                    self.type_arg_error(name, expected, args.len(), ty.span);
                    return if expected == 0 { Type::named(name) } else { Type::Unresolved };
                }
                Type::Generic {
                    name: name.clone(),
                    args,
                }
            }
            TypeExpr::Nullable { inner } => Type::nullable(self.lower_type(inner)),
            TypeExpr::Function { params, ret } => {
                let params = params.iter().map(|p| self.lower_type(p)).collect();
                Type::function(params, self.lower_type(ret))
            }
            TypeExpr::Union { members } => Type::union(members.iter().map(|m| self.lower_type(m)).collect::<Vec<_>>()),
            TypeExpr::Intersection { members } => {
                Type::Intersection(members.iter().map(|m| self.lower_type(m)).collect())
            }
        }
    }

    fn type_arg_error(&mut self, name: &str, expected: usize, found: usize, span: Span) {
        let plural = if expected == 1 { "" } else { "s" };
        self.error(Diagnostic::type_mismatch(
            format!("`{name}` takes {expected} type argument{plural} but {found} were given"),
            span,
        ));
    }
}

/// Parameters before the first one with a default value must always be supplied.
fn required_params(params: &[Param]) -> usize {
    params.iter().rposition(|p| p.default.is_none()).map_or(0, |i| i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(name: &str, default: bool) -> Param {
        Param {
            name: name.to_string(),
            span: Span::default(),
            ty: None,
            default: default.then(|| Expression::new(ExprKind::Literal(Literal::Int(1)), Span::default())),
            symbol: None,
            resolved: None,
        }
    }

    #[test]
    fn test_required_params_counts_up_to_last_without_default() {
        assert_eq!(required_params(&[]), 0);
        assert_eq!(required_params(&[param("a", false), param("b", true)]), 1);
        assert_eq!(required_params(&[param("a", true), param("b", true)]), 0);
        assert_eq!(required_params(&[param("a", false), param("b", false)]), 2);
    }
}
