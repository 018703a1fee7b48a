//! The semantic type model shared by the type checker and the backends.
//!
//! Types are values: they are compared structurally, cloned freely and never mutated after
//! construction. The constructors on [`Type`] normalize their input (no `T??`, flattened unions)
//! so structural equality is meaningful.
//!
//! ## Numeric widening
//!
//! Mixed arithmetic widens along `int < long < float < double`. [`Type::widen_numeric`] returns the
//! wider operand type and [`Type::is_assignable_to`] accepts any narrower-to-wider numeric move.
//!
//! ## Examples
//! ```rust
//! use starlight_core::types::Type;
//!
//! assert!(Type::int().is_assignable_to(&Type::nullable(Type::int())));
//! assert!(!Type::nullable(Type::int()).is_assignable_to(&Type::int()));
//! assert!(Type::int().is_assignable_to(&Type::double()));
//! assert_eq!(Type::list(Type::string()).to_string(), "List<string>");
//! ```

use std::fmt;

use serde::{Serialize, Serializer};

/// Builtin primitive types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Int,
    Long,
    Float,
    Double,
    Boolean,
    Char,
    String,
    Void,
    /// Top type: every value is assignable to `any`.
    Any,
}

impl PrimitiveType {
    pub const ALL: &'static [PrimitiveType] = &[
        PrimitiveType::Int,
        PrimitiveType::Long,
        PrimitiveType::Float,
        PrimitiveType::Double,
        PrimitiveType::Boolean,
        PrimitiveType::Char,
        PrimitiveType::String,
        PrimitiveType::Void,
        PrimitiveType::Any,
    ];

    /// Source spelling of the primitive.
    pub fn as_str(self) -> &'static str {
        match self {
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Char => "char",
            PrimitiveType::String => "string",
            PrimitiveType::Void => "void",
            PrimitiveType::Any => "any",
        }
    }

    /// Lookup by source spelling.
    pub fn from_str(s: &str) -> Option<PrimitiveType> {
        Self::ALL.iter().copied().find(|p| p.as_str() == s)
    }

    /// Position in the widening order, or `None` for non-numeric primitives.
    pub fn numeric_rank(self) -> Option<u8> {
        match self {
            PrimitiveType::Int => Some(0),
            PrimitiveType::Long => Some(1),
            PrimitiveType::Float => Some(2),
            PrimitiveType::Double => Some(3),
            _ => None,
        }
    }

    pub fn is_numeric(self) -> bool {
        self.numeric_rank().is_some()
    }

    pub fn is_integral(self) -> bool {
        matches!(self, PrimitiveType::Int | PrimitiveType::Long)
    }
}

/// Name of the builtin list type.
pub const LIST: &str = "List";
/// Name of the builtin map type.
pub const MAP: &str = "Map";
/// Name of the builtin range type produced by `a..b`.
pub const RANGE: &str = "Range";

/// A Starlight type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Primitive(PrimitiveType),
    Nullable(Box<Type>),
    /// Named type with arguments. User classes are `Generic` with no arguments.
    Generic { name: String, args: Vec<Type> },
    Function { params: Vec<Type>, ret: Box<Type> },
    Union(Vec<Type>),
    Intersection(Vec<Type>),
    /// Placeholder for a type that could not be determined.
    Unresolved,
}

impl Type {
    pub fn int() -> Type {
        Type::Primitive(PrimitiveType::Int)
    }

    pub fn long() -> Type {
        Type::Primitive(PrimitiveType::Long)
    }

    pub fn float() -> Type {
        Type::Primitive(PrimitiveType::Float)
    }

    pub fn double() -> Type {
        Type::Primitive(PrimitiveType::Double)
    }

    pub fn boolean() -> Type {
        Type::Primitive(PrimitiveType::Boolean)
    }

    pub fn char() -> Type {
        Type::Primitive(PrimitiveType::Char)
    }

    pub fn string() -> Type {
        Type::Primitive(PrimitiveType::String)
    }

    pub fn void() -> Type {
        Type::Primitive(PrimitiveType::Void)
    }

    pub fn any() -> Type {
        Type::Primitive(PrimitiveType::Any)
    }

    /// Type of the `null` literal.
    pub fn null() -> Type {
        Type::Nullable(Box::new(Type::Unresolved))
    }

    /// `T?`. Wrapping an already nullable type is a no-op.
    pub fn nullable(inner: Type) -> Type {
        match inner {
            Type::Nullable(_) | Type::Unresolved => inner,
            other => Type::Nullable(Box::new(other)),
        }
    }

    pub fn named(name: impl Into<String>) -> Type {
        Type::Generic {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn list(element: Type) -> Type {
        Type::Generic {
            name: LIST.to_string(),
            args: vec![element],
        }
    }

    pub fn map(key: Type, value: Type) -> Type {
        Type::Generic {
            name: MAP.to_string(),
            args: vec![key, value],
        }
    }

    pub fn range(element: Type) -> Type {
        Type::Generic {
            name: RANGE.to_string(),
            args: vec![element],
        }
    }

    pub fn function(params: Vec<Type>, ret: Type) -> Type {
        Type::Function {
            params,
            ret: Box::new(ret),
        }
    }

    /// Build a union, flattening nested unions and removing duplicates.
    ///
    /// A union of a single distinct member is that member. If any member is
    /// [`Type::Unresolved`] the result is `Unresolved`.
    pub fn union(members: impl IntoIterator<Item = Type>) -> Type {
        let mut flat: Vec<Type> = Vec::new();
        for member in members {
            match member {
                Type::Unresolved => return Type::Unresolved,
                Type::Union(inner) => {
                    for m in inner {
                        if !flat.contains(&m) {
                            flat.push(m);
                        }
                    }
                }
                other => {
                    if !flat.contains(&other) {
                        flat.push(other);
                    }
                }
            }
        }
        match flat.len() {
            0 => Type::Unresolved,
            1 => flat.remove(0),
            _ => Type::Union(flat),
        }
    }

    pub fn as_primitive(&self) -> Option<PrimitiveType> {
        match self {
            Type::Primitive(p) => Some(*p),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.as_primitive().is_some_and(PrimitiveType::is_numeric)
    }

    pub fn is_integral(&self) -> bool {
        self.as_primitive().is_some_and(PrimitiveType::is_integral)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Type::Primitive(PrimitiveType::String))
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, Type::Primitive(PrimitiveType::Boolean))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Primitive(PrimitiveType::Void))
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, Type::Unresolved)
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, Type::Nullable(_))
    }

    /// `true` for the type of the `null` literal.
    pub fn is_null(&self) -> bool {
        matches!(self, Type::Nullable(inner) if inner.is_unresolved())
    }

    /// `true` if the type contains an [`Type::Unresolved`] anywhere.
    pub fn contains_unresolved(&self) -> bool {
        match self {
            Type::Unresolved => true,
            Type::Primitive(_) => false,
            Type::Nullable(inner) => inner.contains_unresolved(),
            Type::Generic { args, .. } => args.iter().any(Type::contains_unresolved),
            Type::Function { params, ret } => {
                params.iter().any(Type::contains_unresolved) || ret.contains_unresolved()
            }
            Type::Union(members) | Type::Intersection(members) => members.iter().any(Type::contains_unresolved),
        }
    }

    /// Strip one level of nullability.
    pub fn non_null(&self) -> Type {
        match self {
            Type::Nullable(inner) => (**inner).clone(),
            other => other.clone(),
        }
    }

    /// Name and arguments of a [`Type::Generic`].
    pub fn as_generic(&self) -> Option<(&str, &[Type])> {
        match self {
            Type::Generic { name, args } => Some((name.as_str(), args.as_slice())),
            _ => None,
        }
    }

    /// Element type of `List<T>` or `Range<T>`.
    pub fn element_type(&self) -> Option<&Type> {
        match self.as_generic() {
            Some((LIST | RANGE, [element])) => Some(element),
            _ => None,
        }
    }

    /// Wider of two numeric types, or `None` unless both are numeric.
    pub fn widen_numeric(&self, other: &Type) -> Option<Type> {
        let a = self.as_primitive()?;
        let b = other.as_primitive()?;
        let ra = a.numeric_rank()?;
        let rb = b.numeric_rank()?;
        Some(Type::Primitive(if ra >= rb { a } else { b }))
    }

    /// Least upper bound used when unifying branch and return types.
    ///
    /// Equal types unify to themselves, numerics widen, `null` joins into a nullable type, and
    /// anything else becomes a union. Types are never narrowed.
    pub fn join(&self, other: &Type) -> Type {
        if self == other {
            return self.clone();
        }
        if self.is_unresolved() || other.is_unresolved() {
            return Type::Unresolved;
        }
        if let Some(widened) = self.widen_numeric(other) {
            return widened;
        }
        if self.is_null() {
            return Type::nullable(other.clone());
        }
        if other.is_null() {
            return Type::nullable(self.clone());
        }
        if let (Type::Nullable(inner), _) = (self, other) {
            if **inner == other.non_null() {
                return self.clone();
            }
        }
        if let (_, Type::Nullable(inner)) = (self, other) {
            if **inner == self.non_null() {
                return other.clone();
            }
        }
        Type::union([self.clone(), other.clone()])
    }

    /// Assignability without nominal subtyping.
    ///
    /// See [`Type::is_assignable_with`] for the full rule set.
    pub fn is_assignable_to(&self, target: &Type) -> bool {
        self.is_assignable_with(target, &|_, _| false)
    }

    /// Return `true` if a value of `self` may be used where `target` is expected.
    ///
    /// Rules, in order:
    /// - `Unresolved` on either side is accepted so earlier errors do not cascade.
    /// - everything is assignable to `any`.
    /// - identical types.
    /// - `T` (and `null`) into `T?`; `T?` is never assignable to `T`.
    /// - numeric widening along `int < long < float < double`.
    /// - into a union when assignable to one member; from a union when every member is.
    /// - into an intersection when assignable to every member.
    /// - named types when `is_subtype(from, to)` holds (class implementing an interface).
    /// - generic and function types structurally, with invariant arguments.
    pub fn is_assignable_with(&self, target: &Type, is_subtype: &dyn Fn(&str, &str) -> bool) -> bool {
        if self.is_unresolved() || target.is_unresolved() {
            return true;
        }
        if matches!(target, Type::Primitive(PrimitiveType::Any)) {
            return true;
        }
        if self == target {
            return true;
        }
        match (self, target) {
            (_, Type::Nullable(inner)) => {
                if self.is_null() {
                    return true;
                }
                match self {
                    Type::Nullable(from_inner) => from_inner.is_assignable_with(inner, is_subtype),
                    _ => self.is_assignable_with(inner, is_subtype),
                }
            }
            (Type::Nullable(_), _) => false,
            (Type::Union(members), _) => members.iter().all(|m| m.is_assignable_with(target, is_subtype)),
            (_, Type::Union(members)) => members.iter().any(|m| self.is_assignable_with(m, is_subtype)),
            (_, Type::Intersection(members)) => members.iter().all(|m| self.is_assignable_with(m, is_subtype)),
            (Type::Intersection(members), _) => members.iter().any(|m| m.is_assignable_with(target, is_subtype)),
            (Type::Primitive(a), Type::Primitive(b)) => match (a.numeric_rank(), b.numeric_rank()) {
                (Some(ra), Some(rb)) => ra <= rb,
                _ => false,
            },
            (
                Type::Generic { name: fname, args: fargs },
                Type::Generic { name: tname, args: targs },
            ) => {
                if fname == tname {
                    fargs.len() == targs.len() && fargs.iter().zip(targs).all(|(a, b)| a.invariant_match(b))
                } else {
                    fargs.is_empty() && targs.is_empty() && is_subtype(fname, tname)
                }
            }
            (
                Type::Function { params: fp, ret: fr },
                Type::Function { params: tp, ret: tr },
            ) => {
                fp.len() == tp.len()
                    && fp.iter().zip(tp).all(|(a, b)| a.invariant_match(b))
                    && (tr.is_void() || fr.is_assignable_with(tr, is_subtype))
            }
            _ => false,
        }
    }

    /// Equality that treats `Unresolved` as a wildcard (used for generic arguments).
    fn invariant_match(&self, other: &Type) -> bool {
        if self.is_unresolved() || other.is_unresolved() {
            return true;
        }
        match (self, other) {
            (Type::Nullable(a), Type::Nullable(b)) => a.invariant_match(b),
            (Type::Generic { name: an, args: aa }, Type::Generic { name: bn, args: ba }) => {
                an == bn && aa.len() == ba.len() && aa.iter().zip(ba).all(|(a, b)| a.invariant_match(b))
            }
            (Type::Function { params: ap, ret: ar }, Type::Function { params: bp, ret: br }) => {
                ap.len() == bp.len() && ap.iter().zip(bp).all(|(a, b)| a.invariant_match(b)) && ar.invariant_match(br)
            }
            _ => self == other,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive(p) => write!(f, "{}", p.as_str()),
            Type::Nullable(inner) if inner.is_unresolved() => write!(f, "null"),
            Type::Nullable(inner) => match **inner {
                Type::Function { .. } | Type::Union(_) | Type::Intersection(_) => write!(f, "({inner})?"),
                _ => write!(f, "{inner}?"),
            },
            Type::Generic { name, args } => {
                write!(f, "{name}")?;
                if !args.is_empty() {
                    write!(f, "<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
            Type::Function { params, ret } => {
                write!(f, "(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{p}")?;
                }
                write!(f, ") -> {ret}")
            }
            Type::Union(members) => write_joined(f, members, " | "),
            Type::Intersection(members) => write_joined(f, members, " & "),
            Type::Unresolved => write!(f, "<unresolved>"),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, members: &[Type], sep: &str) -> fmt::Result {
    for (i, m) in members.iter().enumerate() {
        if i > 0 {
            write!(f, "{sep}")?;
        }
        match m {
            Type::Function { .. } => write!(f, "({m})")?,
            _ => write!(f, "{m}")?,
        }
    }
    Ok(())
}

/// Types serialize as their source spelling so AST dumps stay readable.
impl Serialize for Type {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widening_order() {
        assert_eq!(Type::int().widen_numeric(&Type::long()), Some(Type::long()));
        assert_eq!(Type::float().widen_numeric(&Type::long()), Some(Type::float()));
        assert_eq!(Type::double().widen_numeric(&Type::int()), Some(Type::double()));
        assert_eq!(Type::string().widen_numeric(&Type::int()), None);
    }

    #[test]
    fn test_nullable_assignability_is_one_way() {
        let opt = Type::nullable(Type::string());
        assert!(Type::string().is_assignable_to(&opt));
        assert!(Type::null().is_assignable_to(&opt));
        assert!(!opt.is_assignable_to(&Type::string()));
        assert!(!Type::null().is_assignable_to(&Type::string()));
    }

    #[test]
    fn test_numeric_assignability_only_widens() {
        assert!(Type::int().is_assignable_to(&Type::long()));
        assert!(Type::long().is_assignable_to(&Type::double()));
        assert!(!Type::double().is_assignable_to(&Type::int()));
        assert!(!Type::boolean().is_assignable_to(&Type::int()));
    }

    #[test]
    fn test_union_membership() {
        let u = Type::union([Type::int(), Type::string()]);
        assert!(Type::string().is_assignable_to(&u));
        assert!(!Type::boolean().is_assignable_to(&u));
        assert_eq!(u.to_string(), "int | string");
    }

    #[test]
    fn test_union_normalizes() {
        let u = Type::union([Type::int(), Type::union([Type::int(), Type::string()])]);
        assert_eq!(u, Type::Union(vec![Type::int(), Type::string()]));
        assert_eq!(Type::union([Type::int(), Type::int()]), Type::int());
    }

    #[test]
    fn test_join() {
        assert_eq!(Type::int().join(&Type::double()), Type::double());
        assert_eq!(Type::null().join(&Type::string()), Type::nullable(Type::string()));
        assert_eq!(
            Type::int().join(&Type::string()),
            Type::Union(vec![Type::int(), Type::string()])
        );
    }

    #[test]
    fn test_subtype_hook() {
        let circle = Type::named("Circle");
        let shape = Type::named("Shape");
        assert!(!circle.is_assignable_to(&shape));
        assert!(circle.is_assignable_with(&shape, &|a, b| a == "Circle" && b == "Shape"));
    }

    #[test]
    fn test_display() {
        let f = Type::function(vec![Type::int()], Type::nullable(Type::string()));
        assert_eq!(f.to_string(), "(int) -> string?");
        assert_eq!(Type::nullable(f).to_string(), "((int) -> string?)?");
        assert_eq!(Type::map(Type::string(), Type::int()).to_string(), "Map<string, int>");
    }
}
