//! Check `match` expressions and their patterns.

use starlight_core::types::Type;

use crate::frontend::ast::*;
use crate::frontend::diagnostics::{Diagnostic, errors};
use crate::frontend::symbols::{SymbolKind, TypeDefKind};

use super::{TypeChecker, literal_type, unify};

impl TypeChecker<'_> {
    /// Type-check a match expression; the result unifies every arm's value.
    pub(in crate::frontend::typechecker) fn check_match(&mut self, m: &mut MatchExpr, expected: Option<&Type>) -> Type {
        let scrutinee = self.check_expr(&mut m.scrutinee, None);
        let mut result: Option<Type> = None;
        for arm in &mut m.arms {
            self.check_pattern(&mut arm.pattern, &scrutinee);
            if let Some(guard) = &mut arm.guard {
                let ty = self.check_expr(guard, Some(&Type::boolean()));
                self.expect_boolean(&ty, guard.span);
            }
            let ty = self.check_expr(&mut arm.body, expected);
            result = Some(match result {
                None => ty,
                Some(acc) => unify(&acc, &ty),
            });
        }
        result.unwrap_or_else(Type::void)
    }

    fn check_pattern(&mut self, pattern: &mut Spanned<Pattern>, scrutinee: &Type) {
        let span = pattern.span;
        match &mut pattern.node {
            Pattern::Wildcard => {}
            Pattern::Literal(lit) => {
                let ty = literal_type(&lit.value);
                if !self.compatible(&ty, scrutinee) {
                    self.error(errors::type_mismatch(&scrutinee.to_string(), &ty.to_string(), span));
                }
            }
            Pattern::Binding(binding) => {
                if let Some(id) = binding.symbol {
                    self.symbols.set_type(id, scrutinee.clone());
                }
            }
            Pattern::Typed(typed) => {
                let ty = self.lower_type(&typed.ty);
                if !self.compatible(&ty, scrutinee) {
                    self.error(errors::type_mismatch(&scrutinee.to_string(), &ty.to_string(), typed.ty.span));
                }
                if let Some(id) = typed.symbol {
                    self.symbols.set_type(id, ty.clone());
                }
                typed.resolved = Some(ty);
            }
            Pattern::Constructor(ctor) => {
                let is_data = ctor
                    .symbol
                    .map(|id| self.symbols.symbol(id).kind)
                    .is_some_and(|k| k == SymbolKind::DataClass);
                if !is_data {
                    // Unresolved names were already reported by the resolver.
                    if ctor.symbol.is_some_and(|id| self.symbols.symbol(id).kind != SymbolKind::Unresolved) {
                        self.error(Diagnostic::type_mismatch(
                            format!("`{}` is not a data class and cannot be used as a pattern", ctor.name),
                            span,
                        ));
                    }
                    self.bind_unresolved(&mut ctor.args);
                    return;
                }
                let data_ty = Type::named(&ctor.name);
                if !self.compatible(&data_ty, scrutinee) {
                    self.error(errors::type_mismatch(&scrutinee.to_string(), &ctor.name, span));
                }
                let fields = self.field_types(&ctor.name);
                if fields.len() != ctor.args.len() {
                    self.error(errors::arity_mismatch(&ctor.name, fields.len(), ctor.args.len(), span));
                }
                self.check_sub_patterns(&mut ctor.args, &fields);
            }
            Pattern::Destructure(d) => {
                let base = scrutinee.non_null();
                let data = base
                    .as_generic()
                    .filter(|(_, args)| args.is_empty())
                    .and_then(|(name, _)| self.symbols.type_def(name))
                    .filter(|def| def.kind == TypeDefKind::Data)
                    .map(|def| def.name.clone());
                let Some(data) = data else {
                    if !scrutinee.is_unresolved() {
                        self.error(errors::type_mismatch("a data class", &scrutinee.to_string(), span));
                    }
                    self.bind_unresolved(&mut d.elements);
                    return;
                };
                let fields = self.field_types(&data);
                if fields.len() != d.elements.len() {
                    self.error(errors::arity_mismatch(&data, fields.len(), d.elements.len(), span));
                }
                self.check_sub_patterns(&mut d.elements, &fields);
                d.data_class = Some(data);
            }
        }
    }

    fn check_sub_patterns(&mut self, patterns: &mut [Spanned<Pattern>], fields: &[Type]) {
        for (i, sub) in patterns.iter_mut().enumerate() {
            let field = fields.get(i).cloned().unwrap_or(Type::Unresolved);
            self.check_pattern(sub, &field);
        }
    }

    fn bind_unresolved(&mut self, patterns: &mut [Spanned<Pattern>]) {
        for sub in patterns {
            self.check_pattern(sub, &Type::Unresolved);
        }
    }

    /// Declared types of a data class's header fields, in order.
    fn field_types(&self, data: &str) -> Vec<Type> {
        self.symbols
            .type_def(data)
            .map(|def| {
                def.ctor_fields
                    .iter()
                    .map(|id| self.symbols.symbol(*id).ty.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// A pattern type can match a scrutinee when either could hold the other.
    fn compatible(&self, pattern: &Type, scrutinee: &Type) -> bool {
        self.assignable(pattern, scrutinee) || self.assignable(scrutinee, pattern)
    }
}
