//! `match` expressions, lowered to a labeled block:
//!
//! ```text
//! String $m0;
//! $match0: {
//!     final Shape $s0 = shape;
//!     if ($s0 instanceof Circle) {
//!         final double r = ((Circle) $s0).getRadius();
//!         $m0 = "circle";
//!         break $match0;
//!     }
//!     throw new IllegalStateException("no match arm matched");
//! }
//! ```
//!
//! An arm without conditions or guard is emitted inline and ends the block, since Java rejects
//! the unreachable code that would follow it.

use starlight_core::types::Type;

use crate::frontend::ast::*;

use super::super::EmitResult;
use super::super::emitter::capitalize;
use super::exprs::literal;
use super::types::{coerce, is_java_primitive};
use super::{JvmEmitter, unwrap_parens};

/// What an arm's pattern checks and binds, in evaluation order.
#[derive(Debug, Default)]
struct ArmTest {
    conditions: Vec<String>,
    bindings: Vec<String>,
}

impl JvmEmitter<'_> {
    pub(super) fn match_expr(&mut self, m: &MatchExpr, ty: &Type, span: Span) -> EmitResult<String> {
        self.check_hoist("`match` expression", span)?;
        let n = self.next_temp;
        self.next_temp += 1;
        let result = format!("$m{n}");
        let label = format!("$match{n}");
        let subject = format!("$s{n}");
        for name in [&result, &label, &subject] {
            self.locals.reserve(name);
        }

        let produces = !ty.is_void();
        if produces {
            let java = self.java_type(ty, span)?;
            self.out.line(&format!("{java} {result};"));
        }
        let subject_ty = m.scrutinee.ty();
        let scrutinee = self.expr(&m.scrutinee)?;
        let subject_java = self.java_type(&subject_ty, m.scrutinee.span)?;
        self.out.open(&format!("{label}:"));
        self.out.line(&format!("final {subject_java} {subject} = {scrutinee};"));

        let mut exhaustive = false;
        for arm in &m.arms {
            let mut test = ArmTest::default();
            self.pattern_test(&arm.pattern, &subject, &subject_ty, &mut test)?;

            if test.conditions.is_empty() && arm.guard.is_none() {
                for binding in &test.bindings {
                    self.out.line(binding);
                }
                self.emit_arm_body(&arm.body, ty, &result, produces)?;
                exhaustive = true;
                break;
            }

            if test.conditions.is_empty() {
                self.out.line("{");
                self.out.indent();
            } else {
                self.out.open(&format!("if ({})", test.conditions.join(" && ")));
            }
            for binding in &test.bindings {
                self.out.line(binding);
            }
            let guarded = match &arm.guard {
                Some(guard) => {
                    let guard = self.expr(guard)?;
                    self.out.open(&format!("if ({})", unwrap_parens(&guard)));
                    true
                }
                None => false,
            };
            if !self.emit_arm_body(&arm.body, ty, &result, produces)? {
                self.out.line(&format!("break {label};"));
            }
            if guarded {
                self.out.close();
            }
            self.out.close();
        }
        if !exhaustive {
            self.out.line("throw new IllegalStateException(\"no match arm matched\");");
        }
        self.out.close();
        Ok(if produces { result } else { String::new() })
    }

    /// Emit an arm's value into `result`; returns `true` when the arm leaves the match itself.
    fn emit_arm_body(&mut self, body: &Expression, ty: &Type, result: &str, produces: bool) -> EmitResult<bool> {
        if let ExprKind::Block(block) = &body.kind {
            if block.value.is_none() && ends_in_jump(&block.statements) {
                self.emit_statements(&block.statements)?;
                return Ok(true);
            }
        }
        if produces {
            let value = self.expr_as(body, ty)?;
            self.out.line(&format!("{result} = {value};"));
        } else {
            self.emit_expr_stmt(body)?;
        }
        Ok(false)
    }

    fn pattern_test(
        &mut self,
        pattern: &Spanned<Pattern>,
        subject: &str,
        subject_ty: &Type,
        test: &mut ArmTest,
    ) -> EmitResult<()> {
        match &pattern.node {
            Pattern::Wildcard => {}
            Pattern::Binding(binding) => {
                let java = self.java_type(subject_ty, pattern.span)?;
                let name = self.declare_local(binding.symbol, &binding.name);
                test.bindings.push(format!("final {java} {name} = {subject};"));
            }
            Pattern::Literal(lit) => test.conditions.push(literal_condition(&lit.value, subject, subject_ty)),
            Pattern::Typed(typed) => {
                let target = typed.resolved.clone().unwrap_or_else(Type::any);
                let java = self.java_type(&target, typed.ty.span)?;
                let name = self.declare_local(typed.symbol, &typed.name);
                if target.non_null() == subject_ty.non_null() {
                    if subject_ty.is_nullable() && !target.is_nullable() {
                        test.conditions.push(format!("{subject} != null"));
                    }
                    test.bindings.push(format!("final {java} {name} = {subject};"));
                } else {
                    if is_java_primitive(subject_ty) {
                        return Err(self.unsupported(
                            format!("type pattern `{target}` on a `{subject_ty}` value"),
                            pattern.span,
                        ));
                    }
                    let raw = self.instanceof_type(&target, typed.ty.span)?;
                    test.conditions.push(format!("{subject} instanceof {raw}"));
                    test.bindings.push(format!("final {java} {name} = ({java}) {subject};"));
                }
            }
            Pattern::Constructor(ctor) => {
                let narrowed = narrow(subject, subject_ty, &ctor.name, test);
                self.field_patterns(&ctor.name, &ctor.args, &narrowed, test)?;
            }
            Pattern::Destructure(destructure) => {
                let Some(data) = &destructure.data_class else {
                    return Err(self.unsupported("destructuring a value that is not a data class", pattern.span));
                };
                let narrowed = narrow(subject, subject_ty, data, test);
                self.field_patterns(data, &destructure.elements, &narrowed, test)?;
            }
        }
        Ok(())
    }

    /// Match sub-patterns positionally against a data class's header fields.
    fn field_patterns(
        &mut self,
        data: &str,
        patterns: &[Spanned<Pattern>],
        subject: &str,
        test: &mut ArmTest,
    ) -> EmitResult<()> {
        let fields: Vec<(String, Type)> = self
            .unit
            .symbols
            .type_def(data)
            .map(|def| {
                def.ctor_fields
                    .iter()
                    .map(|id| {
                        let symbol = self.symbol(*id);
                        (symbol.name.clone(), symbol.ty.clone())
                    })
                    .collect()
            })
            .unwrap_or_default();
        for (pattern, (field, ty)) in patterns.iter().zip(fields) {
            if matches!(pattern.node, Pattern::Wildcard) {
                continue;
            }
            let access = format!("{subject}.get{}()", capitalize(&field));
            self.pattern_test(pattern, &access, &ty, test)?;
        }
        Ok(())
    }
}

/// Condition that `subject` is a `name` instance; returns the subject viewed as one.
fn narrow(subject: &str, subject_ty: &Type, name: &str, test: &mut ArmTest) -> String {
    if subject_ty.non_null() == Type::named(name) {
        if subject_ty.is_nullable() {
            test.conditions.push(format!("{subject} != null"));
        }
        subject.to_string()
    } else {
        test.conditions.push(format!("{subject} instanceof {name}"));
        format!("(({name}) {subject})")
    }
}

fn literal_condition(lit: &Literal, subject: &str, subject_ty: &Type) -> String {
    if matches!(lit, Literal::Null) {
        return format!("{subject} == null");
    }
    let text = coerce(literal(lit), &literal_type(lit), &subject_ty.non_null());
    if is_java_primitive(subject_ty) {
        format!("{subject} == {text}")
    } else {
        format!("java.util.Objects.equals({subject}, {text})")
    }
}

fn literal_type(lit: &Literal) -> Type {
    match lit {
        Literal::Int(_) => Type::int(),
        Literal::Long(_) => Type::long(),
        Literal::Float(_) => Type::float(),
        Literal::Double(_) => Type::double(),
        Literal::String(_) => Type::string(),
        Literal::Bool(_) => Type::boolean(),
        Literal::Null => Type::null(),
    }
}

fn ends_in_jump(statements: &[Spanned<Statement>]) -> bool {
    matches!(
        statements.last().map(|s| &s.node),
        Some(Statement::Return(_) | Statement::Break | Statement::Continue)
    )
}
