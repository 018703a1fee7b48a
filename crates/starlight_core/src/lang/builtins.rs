//! Builtin free functions available in every compilation unit.
//!
//! The resolver seeds its prelude scope from [`BUILTIN_FUNCTIONS`]; the type checker reads the
//! signatures; each backend maps a [`BuiltinFnId`] to its own runtime spelling.
//!
//! ## Examples
//! ```rust
//! use starlight_core::lang::builtins::{self, BuiltinFnId};
//!
//! assert_eq!(builtins::from_str("println"), Some(BuiltinFnId::Println));
//! assert_eq!(builtins::info_for(BuiltinFnId::ParseInt).params.len(), 1);
//! ```

use super::registry::Since;
use crate::types::{PrimitiveType, Type};

/// Stable identifier for builtin functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinFnId {
    Println,
    Print,
    ToString,
    ParseInt,
    ParseFloat,
    Assert,
}

/// Metadata for a builtin function.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinFnInfo {
    pub id: BuiltinFnId,
    pub name: &'static str,
    pub params: &'static [PrimitiveType],
    pub ret: PrimitiveType,
    pub description: &'static str,
    pub since: Since,
}

impl BuiltinFnInfo {
    /// The builtin's signature as a [`Type::Function`].
    pub fn signature(&self) -> Type {
        Type::function(
            self.params.iter().map(|p| Type::Primitive(*p)).collect(),
            Type::Primitive(self.ret),
        )
    }
}

/// Registry of builtin functions, in [`BuiltinFnId`] order.
pub const BUILTIN_FUNCTIONS: &[BuiltinFnInfo] = &[
    builtin(
        BuiltinFnId::Println,
        "println",
        &[PrimitiveType::Any],
        PrimitiveType::Void,
        "Print a value followed by a line break.",
    ),
    builtin(
        BuiltinFnId::Print,
        "print",
        &[PrimitiveType::Any],
        PrimitiveType::Void,
        "Print a value without a trailing line break.",
    ),
    builtin(
        BuiltinFnId::ToString,
        "toString",
        &[PrimitiveType::Any],
        PrimitiveType::String,
        "Render any value as a string.",
    ),
    builtin(
        BuiltinFnId::ParseInt,
        "parseInt",
        &[PrimitiveType::String],
        PrimitiveType::Int,
        "Parse a base-10 integer.",
    ),
    builtin(
        BuiltinFnId::ParseFloat,
        "parseFloat",
        &[PrimitiveType::String],
        PrimitiveType::Double,
        "Parse a floating point number.",
    ),
    builtin(
        BuiltinFnId::Assert,
        "assert",
        &[PrimitiveType::Boolean],
        PrimitiveType::Void,
        "Fail at runtime when the condition is false.",
    ),
];

pub fn info_for(id: BuiltinFnId) -> &'static BuiltinFnInfo {
    &BUILTIN_FUNCTIONS[id as usize]
}

pub fn as_str(id: BuiltinFnId) -> &'static str {
    info_for(id).name
}

/// Lookup by name.
pub fn from_str(name: &str) -> Option<BuiltinFnId> {
    BUILTIN_FUNCTIONS.iter().find(|b| b.name == name).map(|b| b.id)
}

const fn builtin(
    id: BuiltinFnId,
    name: &'static str,
    params: &'static [PrimitiveType],
    ret: PrimitiveType,
    description: &'static str,
) -> BuiltinFnInfo {
    BuiltinFnInfo {
        id,
        name,
        params,
        ret,
        description,
        since: Since(0, 1),
    }
}
