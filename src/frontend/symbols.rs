//! Symbol table and scope management for Starlight
//!
//! Scopes live in an arena and refer to their parent by [`ScopeId`], so the scope chain is a tree
//! of indices rather than owning pointers. Symbols live in a second arena addressed by
//! [`SymbolId`]; the resolver writes those ids into the AST so later stages never repeat a lookup.
//!
//! ## Layout
//!
//! - Scope 0 is the builtin prelude (one symbol per builtin function).
//! - Scope 1 is the global scope of the unit; its parent is the prelude.
//! - Every other scope is pushed by the resolver while it walks the tree.
//!
//! Class, data class and interface declarations additionally get a [`TypeDef`] entry keyed by
//! name, and extension functions are kept in a side table keyed by receiver type.

use std::collections::HashMap;

use starlight_core::lang::builtins::{self, BuiltinFnId};
use starlight_core::types::Type;

use crate::frontend::ast::{Span, SymbolId};

/// Index of a scope in the scope arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

impl ScopeId {
    pub const PRELUDE: ScopeId = ScopeId(0);
    pub const GLOBAL: ScopeId = ScopeId(1);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What introduced a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Prelude,
    Global,
    Function,
    Block,
    /// Members of a class, data class or interface.
    Class,
    Lambda,
    Comprehension,
    MatchArm,
    /// Body of an extension function; `this` is the receiver.
    Extension,
}

/// Kind of symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Parameter,
    Function,
    Class,
    DataClass,
    Interface,
    Field,
    Method,
    Builtin(BuiltinFnId),
    /// Placeholder substituted for a name that could not be resolved.
    Unresolved,
}

impl SymbolKind {
    /// `true` for class, data class and interface symbols.
    pub fn is_type(self) -> bool {
        matches!(self, SymbolKind::Class | SymbolKind::DataClass | SymbolKind::Interface)
    }
}

/// A named entity.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Declared or inferred type; `Unresolved` until the type checker fills it in.
    pub ty: Type,
    pub scope: ScopeId,
    pub mutable: bool,
    pub span: Span,
    /// Set when the symbol is read somewhere.
    pub used: bool,
    /// Declaring type for fields and methods.
    pub owner: Option<String>,
}

impl Symbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind, span: Span) -> Self {
        Self {
            name: name.into(),
            kind,
            ty: Type::Unresolved,
            scope: ScopeId::GLOBAL,
            mutable: false,
            span,
            used: false,
            owner: None,
        }
    }

    pub fn mutable(mut self, mutable: bool) -> Self {
        self.mutable = mutable;
        self
    }

    pub fn owned_by(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }
}

/// A lexical scope: names unique within it, in declaration order.
#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    order: Vec<SymbolId>,
    names: HashMap<String, SymbolId>,
}

impl Scope {
    fn new(kind: ScopeKind, parent: Option<ScopeId>) -> Self {
        Self {
            kind,
            parent,
            order: Vec::new(),
            names: HashMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<SymbolId> {
        self.names.get(name).copied()
    }

    /// Symbols declared directly in this scope, in declaration order.
    pub fn symbols(&self) -> &[SymbolId] {
        &self.order
    }
}

/// Which kind of type declaration a [`TypeDef`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeDefKind {
    Class,
    Data,
    Interface,
}

/// A user-declared class, data class or interface.
#[derive(Debug, Clone)]
pub struct TypeDef {
    pub name: String,
    pub kind: TypeDefKind,
    pub symbol: SymbolId,
    /// Scope holding the fields and methods.
    pub members: ScopeId,
    /// Fields introduced by the header, in order. These are the constructor parameters.
    pub ctor_fields: Vec<SymbolId>,
    pub supertypes: Vec<String>,
}

/// Symbol table managing all named entities of one compilation unit.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    scopes: Vec<Scope>,
    types: HashMap<String, TypeDef>,
    extensions: HashMap<String, HashMap<String, SymbolId>>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// Create a table holding the builtin prelude and an empty global scope.
    pub fn new() -> Self {
        let mut table = Self {
            symbols: Vec::new(),
            scopes: vec![
                Scope::new(ScopeKind::Prelude, None),
                Scope::new(ScopeKind::Global, Some(ScopeId::PRELUDE)),
            ],
            types: HashMap::new(),
            extensions: HashMap::new(),
        };
        table.add_builtins();
        table
    }

    fn add_builtins(&mut self) {
        for info in builtins::BUILTIN_FUNCTIONS {
            let mut symbol = Symbol::new(info.name, SymbolKind::Builtin(info.id), Span::default());
            symbol.ty = info.signature();
            // Builtins never trigger duplicate errors; the prelude is populated once.
            let _ = self.declare(ScopeId::PRELUDE, symbol);
        }
    }

    // ========================================================================
    // Scopes
    // ========================================================================

    pub fn push_scope(&mut self, kind: ScopeKind, parent: ScopeId) -> ScopeId {
        self.scopes.push(Scope::new(kind, Some(parent)));
        ScopeId((self.scopes.len() - 1) as u32)
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    /// Insert `symbol` into `scope`.
    ///
    /// ## Errors
    /// Returns the id of the existing symbol when the name is already declared in that same scope.
    pub fn declare(&mut self, scope: ScopeId, mut symbol: Symbol) -> Result<SymbolId, SymbolId> {
        if let Some(existing) = self.scopes[scope.index()].get(&symbol.name) {
            return Err(existing);
        }
        symbol.scope = scope;
        let id = self.push_symbol(symbol);
        let slot = &mut self.scopes[scope.index()];
        slot.names.insert(self.symbols[id.index()].name.clone(), id);
        slot.order.push(id);
        Ok(id)
    }

    /// Add a symbol that is not visible through any scope (placeholders, extension functions).
    pub fn detached(&mut self, symbol: Symbol) -> SymbolId {
        self.push_symbol(symbol)
    }

    fn push_symbol(&mut self, symbol: Symbol) -> SymbolId {
        self.symbols.push(symbol);
        SymbolId((self.symbols.len() - 1) as u32)
    }

    /// Walk `scope` and its ancestors looking for `name`.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = &self.scopes[id.index()];
            if let Some(symbol) = scope.get(name) {
                return Some(symbol);
            }
            current = scope.parent;
        }
        None
    }

    /// Nearest enclosing scope (including `scope` itself) of one of `kinds`.
    pub fn enclosing(&self, scope: ScopeId, kinds: &[ScopeKind]) -> Option<ScopeId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = &self.scopes[id.index()];
            if kinds.contains(&s.kind) {
                return Some(id);
            }
            current = s.parent;
        }
        None
    }

    // ========================================================================
    // Symbols
    // ========================================================================

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.index()]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.index()]
    }

    pub fn set_type(&mut self, id: SymbolId, ty: Type) {
        self.symbols[id.index()].ty = ty;
    }

    pub fn mark_used(&mut self, id: SymbolId) {
        self.symbols[id.index()].used = true;
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(i, s)| (SymbolId(i as u32), s))
    }

    // ========================================================================
    // Types
    // ========================================================================

    pub fn define_type(&mut self, def: TypeDef) {
        self.types.insert(def.name.clone(), def);
    }

    pub fn type_def(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    /// Find a field or method on a user type, searching declared supertypes as well.
    pub fn member(&self, type_name: &str, member: &str) -> Option<SymbolId> {
        let mut pending = vec![type_name];
        let mut seen: Vec<&str> = Vec::new();
        while let Some(name) = pending.pop() {
            if seen.contains(&name) {
                continue;
            }
            seen.push(name);
            let Some(def) = self.types.get(name) else {
                continue;
            };
            if let Some(id) = self.scope(def.members).get(member) {
                return Some(id);
            }
            pending.extend(def.supertypes.iter().map(String::as_str));
        }
        None
    }

    /// `true` if `sub` declares `sup` as a supertype, directly or transitively.
    pub fn is_subtype(&self, sub: &str, sup: &str) -> bool {
        let mut pending = vec![sub];
        let mut seen: Vec<&str> = Vec::new();
        while let Some(name) = pending.pop() {
            if name == sup && name != sub {
                return true;
            }
            if seen.contains(&name) {
                continue;
            }
            seen.push(name);
            if let Some(def) = self.types.get(name) {
                pending.extend(def.supertypes.iter().map(String::as_str));
            }
        }
        false
    }

    // ========================================================================
    // Extensions
    // ========================================================================

    /// Register an extension function under `receiver_key`.
    ///
    /// ## Errors
    /// Returns the existing symbol when `name` is already registered for that receiver.
    pub fn add_extension(&mut self, receiver_key: &str, name: &str, id: SymbolId) -> Result<(), SymbolId> {
        let table = self.extensions.entry(receiver_key.to_string()).or_default();
        if let Some(existing) = table.get(name) {
            return Err(*existing);
        }
        table.insert(name.to_string(), id);
        Ok(())
    }

    pub fn extension(&self, receiver_key: &str, name: &str) -> Option<SymbolId> {
        self.extensions.get(receiver_key)?.get(name).copied()
    }
}

/// Key under which extension functions for `ty` are registered (`string`, `List`, `Point`).
pub fn receiver_key(ty: &Type) -> Option<String> {
    match ty.non_null() {
        Type::Primitive(p) => Some(p.as_str().to_string()),
        Type::Generic { name, .. } => Some(name),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_holds_builtins() {
        let table = SymbolTable::new();
        let id = table.lookup(ScopeId::GLOBAL, "println").unwrap();
        assert_eq!(table.symbol(id).kind, SymbolKind::Builtin(BuiltinFnId::Println));
        assert_eq!(table.symbol(id).scope, ScopeId::PRELUDE);
    }

    #[test]
    fn test_scope_lookup_and_shadowing() {
        let mut table = SymbolTable::new();
        let outer = table
            .declare(ScopeId::GLOBAL, Symbol::new("x", SymbolKind::Variable, Span::default()))
            .unwrap();
        let inner_scope = table.push_scope(ScopeKind::Block, ScopeId::GLOBAL);
        assert_eq!(table.lookup(inner_scope, "x"), Some(outer));

        let inner = table
            .declare(inner_scope, Symbol::new("x", SymbolKind::Variable, Span::default()))
            .unwrap();
        assert_eq!(table.lookup(inner_scope, "x"), Some(inner));
        assert_eq!(table.lookup(ScopeId::GLOBAL, "x"), Some(outer));
    }

    #[test]
    fn test_duplicate_in_same_scope() {
        let mut table = SymbolTable::new();
        let first = table
            .declare(ScopeId::GLOBAL, Symbol::new("f", SymbolKind::Function, Span::default()))
            .unwrap();
        let second = table.declare(ScopeId::GLOBAL, Symbol::new("f", SymbolKind::Variable, Span::default()));
        assert_eq!(second, Err(first));
    }

    #[test]
    fn test_subtypes_and_inherited_members() {
        let mut table = SymbolTable::new();
        let shape_scope = table.push_scope(ScopeKind::Class, ScopeId::GLOBAL);
        let area = table
            .declare(shape_scope, Symbol::new("area", SymbolKind::Method, Span::default()))
            .unwrap();
        let shape = table.detached(Symbol::new("Shape", SymbolKind::Interface, Span::default()));
        table.define_type(TypeDef {
            name: "Shape".into(),
            kind: TypeDefKind::Interface,
            symbol: shape,
            members: shape_scope,
            ctor_fields: vec![],
            supertypes: vec![],
        });
        let circle_scope = table.push_scope(ScopeKind::Class, ScopeId::GLOBAL);
        let circle = table.detached(Symbol::new("Circle", SymbolKind::DataClass, Span::default()));
        table.define_type(TypeDef {
            name: "Circle".into(),
            kind: TypeDefKind::Data,
            symbol: circle,
            members: circle_scope,
            ctor_fields: vec![],
            supertypes: vec!["Shape".into()],
        });

        assert!(table.is_subtype("Circle", "Shape"));
        assert!(!table.is_subtype("Shape", "Circle"));
        assert_eq!(table.member("Circle", "area"), Some(area));
    }

    #[test]
    fn test_receiver_keys() {
        assert_eq!(receiver_key(&Type::string()).as_deref(), Some("string"));
        assert_eq!(receiver_key(&Type::list(Type::int())).as_deref(), Some("List"));
        assert_eq!(receiver_key(&Type::nullable(Type::named("Point"))).as_deref(), Some("Point"));
        assert_eq!(receiver_key(&Type::Unresolved), None);
    }
}
