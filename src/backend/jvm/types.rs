//! Mapping of Starlight types to Java types.

use starlight_core::types::{LIST, MAP, PrimitiveType, RANGE, Type};

use crate::frontend::ast::Span;

use super::super::EmitResult;
use super::JvmEmitter;

/// A functional interface and the method that invokes it.
pub(super) struct Functional {
    pub java: String,
    pub invoke: &'static str,
}

impl JvmEmitter<'_> {
    /// Java type in a position where primitives may stay unboxed (locals, fields, parameters).
    pub(super) fn java_type(&self, ty: &Type, span: Span) -> EmitResult<String> {
        match ty {
            Type::Primitive(p) => Ok(primitive(*p).to_string()),
            _ => self.boxed_type(ty, span),
        }
    }

    /// Java reference type, used for nullable types and type arguments.
    pub(super) fn boxed_type(&self, ty: &Type, span: Span) -> EmitResult<String> {
        Ok(match ty {
            Type::Primitive(p) => boxed(*p).to_string(),
            Type::Nullable(inner) if inner.is_unresolved() => "Object".to_string(),
            Type::Nullable(inner) => self.boxed_type(inner, span)?,
            Type::Generic { name, args } => match (name.as_str(), args.as_slice()) {
                (LIST, [element]) => format!("java.util.List<{}>", self.boxed_type(element, span)?),
                (MAP, [key, value]) => format!(
                    "java.util.Map<{}, {}>",
                    self.boxed_type(key, span)?,
                    self.boxed_type(value, span)?
                ),
                (RANGE, [element]) => format!("java.util.List<{}>", self.boxed_type(element, span)?),
                _ => name.clone(),
            },
            Type::Function { params, ret } => self.functional(params, ret, span)?.java,
            Type::Union(_) | Type::Intersection(_) | Type::Unresolved => "Object".to_string(),
        })
    }

    /// Raw class usable after `instanceof` (`java.util.List`, `Integer`, `Point`).
    pub(super) fn instanceof_type(&self, ty: &Type, span: Span) -> EmitResult<String> {
        Ok(match ty.non_null() {
            Type::Generic { name, .. } if name == LIST || name == RANGE => "java.util.List".to_string(),
            Type::Generic { name, .. } if name == MAP => "java.util.Map".to_string(),
            Type::Function { params, ret } => {
                let java = self.functional(&params, &ret, span)?.java;
                java.split('<').next().unwrap_or_default().to_string()
            }
            other => self.boxed_type(&other, span)?,
        })
    }

    /// Functional interface for a function type of up to two parameters.
    pub(super) fn functional(&self, params: &[Type], ret: &Type, span: Span) -> EmitResult<Functional> {
        let args = params
            .iter()
            .map(|p| self.boxed_type(p, span))
            .collect::<EmitResult<Vec<_>>>()?;
        let returns = !ret.is_void();
        let (java, invoke) = match (args.as_slice(), returns) {
            ([], false) => ("Runnable".to_string(), "run"),
            ([], true) => (format!("java.util.function.Supplier<{}>", self.boxed_type(ret, span)?), "get"),
            ([a], false) => (format!("java.util.function.Consumer<{a}>"), "accept"),
            ([a], true) => (
                format!("java.util.function.Function<{a}, {}>", self.boxed_type(ret, span)?),
                "apply",
            ),
            ([a, b], false) => (format!("java.util.function.BiConsumer<{a}, {b}>"), "accept"),
            ([a, b], true) => (
                format!("java.util.function.BiFunction<{a}, {b}, {}>", self.boxed_type(ret, span)?),
                "apply",
            ),
            _ => {
                return Err(self.unsupported(
                    format!("function type with {} parameters", params.len()),
                    span,
                ));
            }
        };
        Ok(Functional { java, invoke })
    }
}

fn primitive(p: PrimitiveType) -> &'static str {
    match p {
        PrimitiveType::Int => "int",
        PrimitiveType::Long => "long",
        PrimitiveType::Float => "float",
        PrimitiveType::Double => "double",
        PrimitiveType::Boolean => "boolean",
        PrimitiveType::Char => "char",
        PrimitiveType::String => "String",
        PrimitiveType::Void => "void",
        PrimitiveType::Any => "Object",
    }
}

fn boxed(p: PrimitiveType) -> &'static str {
    match p {
        PrimitiveType::Int => "Integer",
        PrimitiveType::Long => "Long",
        PrimitiveType::Float => "Float",
        PrimitiveType::Double => "Double",
        PrimitiveType::Boolean => "Boolean",
        PrimitiveType::Char => "Character",
        PrimitiveType::String => "String",
        PrimitiveType::Void => "Void",
        PrimitiveType::Any => "Object",
    }
}

/// `true` when values of `ty` are Java primitives (compared with `==`, never `null`).
pub(super) fn is_java_primitive(ty: &Type) -> bool {
    matches!(
        ty,
        Type::Primitive(
            PrimitiveType::Int
                | PrimitiveType::Long
                | PrimitiveType::Float
                | PrimitiveType::Double
                | PrimitiveType::Boolean
                | PrimitiveType::Char
        )
    )
}

/// Convert `text` of type `from` for a slot of type `to`.
///
/// Java widens primitives implicitly but never boxes across numeric types (`int` into `Double`),
/// so numeric moves between different types get an explicit cast.
pub(super) fn coerce(text: String, from: &Type, to: &Type) -> String {
    let target = to.non_null();
    match (from.as_primitive(), target.as_primitive()) {
        (Some(f), Some(t)) if f != t && f.is_numeric() && t.is_numeric() => {
            format!("(({}) {text})", primitive(t))
        }
        _ => text,
    }
}

/// Zero value of a Java type, for declarations without an initializer.
pub(super) fn default_value(ty: &Type) -> &'static str {
    match ty {
        Type::Primitive(PrimitiveType::Int) => "0",
        Type::Primitive(PrimitiveType::Long) => "0L",
        Type::Primitive(PrimitiveType::Float) => "0.0f",
        Type::Primitive(PrimitiveType::Double) => "0.0",
        Type::Primitive(PrimitiveType::Boolean) => "false",
        Type::Primitive(PrimitiveType::Char) => "'\\0'",
        _ => "null",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_casts_only_across_numeric_types() {
        assert_eq!(coerce("x".into(), &Type::int(), &Type::double()), "((double) x)");
        assert_eq!(coerce("x".into(), &Type::int(), &Type::nullable(Type::long())), "((long) x)");
        assert_eq!(coerce("x".into(), &Type::int(), &Type::int()), "x");
        assert_eq!(coerce("s".into(), &Type::string(), &Type::any()), "s");
    }

    #[test]
    fn test_default_values() {
        assert_eq!(default_value(&Type::long()), "0L");
        assert_eq!(default_value(&Type::nullable(Type::int())), "null");
    }
}
