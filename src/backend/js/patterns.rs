//! `match`, either as an immediately invoked arrow function (value position) or as a labeled
//! block (statement position):
//!
//! ```text
//! $match0: {
//!     const $s1 = shape;
//!     if ($s1 instanceof Circle) {
//!         const r = $s1.radius;
//!         draw(r);
//!         break $match0;
//!     }
//!     throw new Error("no match arm matched");
//! }
//! ```

use starlight_core::types::{LIST, MAP, PrimitiveType, RANGE, Type};

use crate::frontend::ast::*;
use crate::frontend::symbols::TypeDefKind;

use super::super::EmitResult;
use super::super::emitter::unwrap_parens;
use super::exprs::literal;
use super::{JsEmitter, property_name};

/// How an arm hands control back once its body ran.
enum ArmExit {
    /// `return value;` from the arrow function.
    Return,
    /// `break label;` out of the labeled block.
    Break(String),
}

#[derive(Debug, Default)]
struct ArmTest {
    conditions: Vec<String>,
    bindings: Vec<String>,
}

impl JsEmitter<'_> {
    pub(super) fn match_expr(&mut self, m: &MatchExpr) -> EmitResult<String> {
        self.iife(|s| s.emit_match_body(m, &ArmExit::Return))
    }

    pub(super) fn emit_match_stmt(&mut self, m: &MatchExpr) -> EmitResult<()> {
        let label = self.temp("match");
        self.out.open(&format!("{label}:"));
        self.emit_match_body(m, &ArmExit::Break(label))?;
        self.out.close();
        Ok(())
    }

    fn emit_match_body(&mut self, m: &MatchExpr, exit: &ArmExit) -> EmitResult<()> {
        let subject_ty = m.scrutinee.ty();
        let scrutinee = self.expr(&m.scrutinee)?;
        let subject = self.temp("s");
        self.out.line(&format!("const {subject} = {scrutinee};"));

        for arm in &m.arms {
            let mut test = ArmTest::default();
            self.pattern_test(&arm.pattern, &subject, &subject_ty, &mut test)?;

            if test.conditions.is_empty() && arm.guard.is_none() {
                for binding in &test.bindings {
                    self.out.line(binding);
                }
                return self.emit_arm_body(&arm.body, exit, true);
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
            self.emit_arm_body(&arm.body, exit, false)?;
            if guarded {
                self.out.close();
            }
            self.out.close();
        }
        self.out.line("throw new Error(\"no match arm matched\");");
        Ok(())
    }

    /// Run an arm's body and leave the match; `last` arms fall out of a labeled block on their own.
    fn emit_arm_body(&mut self, body: &Expression, exit: &ArmExit, last: bool) -> EmitResult<()> {
        match exit {
            ArmExit::Return => {
                let (statements, value) = match &body.kind {
                    ExprKind::Block(block) => (block.statements.as_slice(), block.value.as_ref()),
                    _ => (&[][..], Some(body)),
                };
                self.emit_statements(statements)?;
                match value {
                    Some(value) if !body.ty().is_void() => {
                        let value = self.expr(value)?;
                        self.out.line(&format!("return {value};"));
                    }
                    Some(value) => {
                        self.emit_expr_stmt(value)?;
                        self.out.line("return;");
                    }
                    None => self.out.line("return;"),
                }
            }
            ArmExit::Break(label) => {
                self.emit_expr_stmt(body)?;
                let jumps = matches!(&body.kind, ExprKind::Block(block) if block.value.is_none() && ends_in_jump(&block.statements));
                if !last && !jumps {
                    self.out.line(&format!("break {label};"));
                }
            }
        }
        Ok(())
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
                let name = self.declare_local(binding.symbol, &binding.name);
                test.bindings.push(format!("const {name} = {subject};"));
            }
            Pattern::Literal(lit) => test.conditions.push(match &lit.value {
                Literal::Null => format!("{subject} == null"),
                value => format!("{subject} === {}", literal(value)),
            }),
            Pattern::Typed(typed) => {
                let target = typed.resolved.clone().unwrap_or_else(Type::any);
                let name = self.declare_local(typed.symbol, &typed.name);
                if target.non_null() == subject_ty.non_null() {
                    if subject_ty.is_nullable() && !target.is_nullable() {
                        test.conditions.push(format!("{subject} != null"));
                    }
                } else {
                    let Some(check) = self.runtime_check(&target.non_null(), subject) else {
                        return Err(self.unsupported(format!("type pattern `{target}`"), pattern.span));
                    };
                    test.conditions.push(if target.is_nullable() {
                        format!("({subject} == null || {check})")
                    } else {
                        check
                    });
                }
                test.bindings.push(format!("const {name} = {subject};"));
            }
            Pattern::Constructor(ctor) => {
                self.narrow(subject, subject_ty, &ctor.name, test);
                self.field_patterns(&ctor.name, &ctor.args, subject, test)?;
            }
            Pattern::Destructure(destructure) => {
                let Some(data) = &destructure.data_class else {
                    return Err(self.unsupported("destructuring a value that is not a data class", pattern.span));
                };
                self.narrow(subject, subject_ty, data, test);
                self.field_patterns(data, &destructure.elements, subject, test)?;
            }
        }
        Ok(())
    }

    /// Condition that `subject` is a `name` instance.
    fn narrow(&self, subject: &str, subject_ty: &Type, name: &str, test: &mut ArmTest) {
        if subject_ty.non_null() == Type::named(name) {
            if subject_ty.is_nullable() {
                test.conditions.push(format!("{subject} != null"));
            }
        } else {
            test.conditions
                .push(format!("{subject} instanceof {}", self.type_name(name)));
        }
    }

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
            let access = format!("{subject}.{}", property_name(&field));
            self.pattern_test(pattern, &access, &ty, test)?;
        }
        Ok(())
    }

    /// Runtime test that `subject` holds a `target`; `None` when JavaScript cannot tell.
    fn runtime_check(&self, target: &Type, subject: &str) -> Option<String> {
        Some(match target {
            Type::Primitive(PrimitiveType::Int | PrimitiveType::Long) => format!("Number.isInteger({subject})"),
            Type::Primitive(PrimitiveType::Float | PrimitiveType::Double) => {
                format!("typeof {subject} === \"number\"")
            }
            Type::Primitive(PrimitiveType::String) => format!("typeof {subject} === \"string\""),
            Type::Primitive(PrimitiveType::Char) => {
                format!("(typeof {subject} === \"string\" && {subject}.length === 1)")
            }
            Type::Primitive(PrimitiveType::Boolean) => format!("typeof {subject} === \"boolean\""),
            Type::Primitive(PrimitiveType::Any) => format!("{subject} != null"),
            Type::Function { .. } => format!("typeof {subject} === \"function\""),
            Type::Generic { name, .. } if name == LIST || name == RANGE => format!("Array.isArray({subject})"),
            Type::Generic { name, .. } if name == MAP => format!("{subject} instanceof Map"),
            Type::Generic { name, .. } => {
                let def = self.unit.symbols.type_def(name)?;
                if def.kind == TypeDefKind::Interface {
                    return None;
                }
                format!("{subject} instanceof {}", self.type_name(name))
            }
            _ => return None,
        })
    }
}

fn ends_in_jump(statements: &[Spanned<Statement>]) -> bool {
    matches!(
        statements.last().map(|s| &s.node),
        Some(Statement::Return(_) | Statement::Break | Statement::Continue)
    )
}
