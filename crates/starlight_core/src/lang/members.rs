//! Members the compiler knows on builtin types (`string`, `List<T>`, `Map<K, V>`).
//!
//! Signatures are written in terms of [`MemberTy`] placeholders and instantiated against the
//! receiver's type arguments with [`MemberInfo::instantiate`].
//!
//! ## Examples
//! ```rust
//! use starlight_core::lang::members::{self, MemberId, Receiver};
//! use starlight_core::types::Type;
//!
//! let info = members::lookup(Receiver::List, "add").unwrap();
//! assert_eq!(info.id, MemberId::ListAdd);
//! let (params, ret) = info.instantiate(&[Type::int()]);
//! assert_eq!(params, vec![Type::int()]);
//! assert!(ret.is_void());
//! ```

use crate::types::{LIST, MAP, PrimitiveType, Type};

/// Builtin receiver families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Receiver {
    String,
    List,
    Map,
}

impl Receiver {
    /// Classify a receiver type, looking through nothing (callers strip nullability first).
    pub fn of(ty: &Type) -> Option<Receiver> {
        match ty {
            Type::Primitive(PrimitiveType::String) => Some(Receiver::String),
            Type::Generic { name, .. } if name == LIST => Some(Receiver::List),
            Type::Generic { name, .. } if name == MAP => Some(Receiver::Map),
            _ => None,
        }
    }
}

/// Stable identifier for builtin members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberId {
    StringLength,
    StringIsEmpty,
    StringToUpperCase,
    StringToLowerCase,
    StringContains,
    StringSubstring,
    ListSize,
    ListIsEmpty,
    ListAdd,
    ListGet,
    ListContains,
    MapSize,
    MapIsEmpty,
    MapGet,
    MapPut,
    MapContainsKey,
}

/// Type placeholders used in member signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberTy {
    Prim(PrimitiveType),
    /// `T` of `List<T>`.
    Element,
    /// `K` of `Map<K, V>`.
    Key,
    /// `V` of `Map<K, V>`.
    Value,
    /// `V?` of `Map<K, V>`.
    NullableValue,
}

/// Metadata for a builtin member method.
#[derive(Debug, Clone, Copy)]
pub struct MemberInfo {
    pub id: MemberId,
    pub receiver: Receiver,
    pub name: &'static str,
    pub params: &'static [MemberTy],
    pub ret: MemberTy,
}

impl MemberInfo {
    /// Instantiate the signature against the receiver's type arguments.
    ///
    /// Missing arguments instantiate to [`Type::Unresolved`].
    pub fn instantiate(&self, receiver_args: &[Type]) -> (Vec<Type>, Type) {
        let resolve = |t: MemberTy| -> Type {
            match t {
                MemberTy::Prim(p) => Type::Primitive(p),
                MemberTy::Element | MemberTy::Key => receiver_args.first().cloned().unwrap_or(Type::Unresolved),
                MemberTy::Value => receiver_args.get(1).cloned().unwrap_or(Type::Unresolved),
                MemberTy::NullableValue => Type::nullable(receiver_args.get(1).cloned().unwrap_or(Type::Unresolved)),
            }
        };
        (self.params.iter().map(|p| resolve(*p)).collect(), resolve(self.ret))
    }
}

const INT: MemberTy = MemberTy::Prim(PrimitiveType::Int);
const BOOL: MemberTy = MemberTy::Prim(PrimitiveType::Boolean);
const STR: MemberTy = MemberTy::Prim(PrimitiveType::String);
const VOID: MemberTy = MemberTy::Prim(PrimitiveType::Void);

/// Registry of builtin members, in [`MemberId`] order.
pub const MEMBERS: &[MemberInfo] = &[
    member(MemberId::StringLength, Receiver::String, "length", &[], INT),
    member(MemberId::StringIsEmpty, Receiver::String, "isEmpty", &[], BOOL),
    member(MemberId::StringToUpperCase, Receiver::String, "toUpperCase", &[], STR),
    member(MemberId::StringToLowerCase, Receiver::String, "toLowerCase", &[], STR),
    member(MemberId::StringContains, Receiver::String, "contains", &[STR], BOOL),
    member(MemberId::StringSubstring, Receiver::String, "substring", &[INT, INT], STR),
    member(MemberId::ListSize, Receiver::List, "size", &[], INT),
    member(MemberId::ListIsEmpty, Receiver::List, "isEmpty", &[], BOOL),
    member(MemberId::ListAdd, Receiver::List, "add", &[MemberTy::Element], VOID),
    member(MemberId::ListGet, Receiver::List, "get", &[INT], MemberTy::Element),
    member(MemberId::ListContains, Receiver::List, "contains", &[MemberTy::Element], BOOL),
    member(MemberId::MapSize, Receiver::Map, "size", &[], INT),
    member(MemberId::MapIsEmpty, Receiver::Map, "isEmpty", &[], BOOL),
    member(MemberId::MapGet, Receiver::Map, "get", &[MemberTy::Key], MemberTy::NullableValue),
    member(MemberId::MapPut, Receiver::Map, "put", &[MemberTy::Key, MemberTy::Value], VOID),
    member(MemberId::MapContainsKey, Receiver::Map, "containsKey", &[MemberTy::Key], BOOL),
];

pub fn info_for(id: MemberId) -> &'static MemberInfo {
    &MEMBERS[id as usize]
}

/// Find the member `name` on a receiver family.
pub fn lookup(receiver: Receiver, name: &str) -> Option<&'static MemberInfo> {
    MEMBERS.iter().find(|m| m.receiver == receiver && m.name == name)
}

const fn member(
    id: MemberId,
    receiver: Receiver,
    name: &'static str,
    params: &'static [MemberTy],
    ret: MemberTy,
) -> MemberInfo {
    MemberInfo {
        id,
        receiver,
        name,
        params,
        ret,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_get_is_nullable() {
        let info = lookup(Receiver::Map, "get").unwrap();
        let (params, ret) = info.instantiate(&[Type::string(), Type::int()]);
        assert_eq!(params, vec![Type::string()]);
        assert_eq!(ret, Type::nullable(Type::int()));
    }

    #[test]
    fn test_unknown_member() {
        assert!(lookup(Receiver::String, "push").is_none());
        assert_eq!(Receiver::of(&Type::int()), None);
    }
}
