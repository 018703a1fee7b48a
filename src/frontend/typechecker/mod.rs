//! Type checker for the Starlight programming language.
//!
//! Infers and validates the type of every expression of a resolved program, decorating the AST
//! in place, then desugars the constructs the backends do not handle directly.
//!
//! ## Notes
//!
//! - **Collect, then check**: [`TypeChecker::collect`] types every declared signature (parameters,
//!   fields, declared returns) so bodies can be checked in source order afterwards.
//! - **Demand-driven return inference**: a function without a declared return type is inferred the
//!   first time anything asks for it, by checking a copy of its body with diagnostics muted.
//!   Re-entering a function whose inference is in progress (recursion) yields `Unresolved`.
//! - **Error accumulation**: expressions that fail to check are typed `Unresolved`, which is
//!   accepted everywhere so one mistake does not cascade.
//!
//! ## What is validated
//!
//! - Operator operand types, numeric widening, string concatenation
//! - Call arity and argument assignability, constructors, closures
//! - Member access on user types, builtin receivers and extension receivers, null safety
//! - Mutability of assignment targets
//! - Match patterns against the scrutinee type
//! - `await` placement and interface conformance
//!
//! ## See also
//!
//! - [`symbols`](super::symbols) – symbol table and scope management
//! - [`resolver`](super::resolver) – the pass that runs before this one

mod check_decl;
mod check_expr;
mod check_stmt;
mod collect;
mod desugar;

#[cfg(test)]
mod tests;

use std::collections::HashMap;

use starlight_core::types::Type;

use crate::frontend::ast::*;
use crate::frontend::diagnostics::{Diagnostic, Diagnostics, errors};
use crate::frontend::symbols::SymbolTable;

/// Type check `program`, recording types on the AST and in `symbols`.
///
/// Diagnostics of this stage are appended to `diagnostics` sorted by source position. The
/// program is desugared afterwards, so it must not be re-checked.
#[tracing::instrument(skip_all, fields(declarations = program.declarations.len()))]
pub fn typecheck(program: &mut Program, symbols: &mut SymbolTable, diagnostics: &mut Diagnostics) {
    let mark = diagnostics.len();
    let mut checker = TypeChecker::new(symbols);
    checker.collect(program);
    checker.check_program(program);
    let found = std::mem::take(&mut checker.diagnostics);
    diagnostics.extend(found.into_vec());
    desugar::desugar(program, symbols);
    diagnostics.sort_stage(mark);
    tracing::debug!(diagnostics = diagnostics.len() - mark, "type checked");
}

/// Parameter and return types of a callable.
#[derive(Debug, Clone)]
pub(crate) struct Signature {
    pub params: Vec<Type>,
    /// Number of leading parameters without a default value.
    pub required: usize,
    pub ret: ReturnState,
}

#[derive(Debug, Clone)]
pub(crate) enum ReturnState {
    Known(Type),
    /// Not declared and not inferred yet.
    Pending,
    InProgress,
}

/// A function body kept aside for return type inference.
#[derive(Debug, Clone)]
struct PendingBody {
    decl: FunctionDecl,
    this_ty: Option<Type>,
}

/// Per-function checking context.
#[derive(Debug, Clone)]
struct Frame {
    declared_ret: Option<Type>,
    returns: Vec<Type>,
    is_async: bool,
    this_ty: Option<Type>,
}

/// Type checker state for one compilation unit.
pub(crate) struct TypeChecker<'s> {
    pub(crate) symbols: &'s mut SymbolTable,
    pub(crate) diagnostics: Diagnostics,
    signatures: HashMap<SymbolId, Signature>,
    pending: HashMap<SymbolId, PendingBody>,
    frames: Vec<Frame>,
}

impl<'s> TypeChecker<'s> {
    pub(crate) fn new(symbols: &'s mut SymbolTable) -> Self {
        Self {
            symbols,
            diagnostics: Diagnostics::new(),
            signatures: HashMap::new(),
            pending: HashMap::new(),
            frames: Vec::new(),
        }
    }

    fn error(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    // ========================================================================
    // Return type inference
    // ========================================================================

    /// Return type of a function or method, inferring it on first use.
    pub(crate) fn return_type_of(&mut self, id: SymbolId) -> Type {
        match self.signatures.get(&id).map(|s| &s.ret) {
            Some(ReturnState::Known(ty)) => ty.clone(),
            Some(ReturnState::InProgress) | None => Type::Unresolved,
            Some(ReturnState::Pending) => {
                let Some(mut body) = self.pending.get(&id).cloned() else {
                    return Type::Unresolved;
                };
                self.set_return(id, ReturnState::InProgress);
                let saved_diagnostics = std::mem::take(&mut self.diagnostics);
                let saved_frames = std::mem::take(&mut self.frames);
                let ty = self.infer_function(&mut body.decl, body.this_ty);
                self.diagnostics = saved_diagnostics;
                self.frames = saved_frames;
                self.set_return(id, ReturnState::Known(ty.clone()));
                self.refresh_function_type(id);
                ty
            }
        }
    }

    fn set_return(&mut self, id: SymbolId, state: ReturnState) {
        if let Some(sig) = self.signatures.get_mut(&id) {
            sig.ret = state;
        }
    }

    /// Store the callable's full function type on its symbol.
    fn refresh_function_type(&mut self, id: SymbolId) {
        if let Some(sig) = self.signatures.get(&id) {
            let ret = match &sig.ret {
                ReturnState::Known(ty) => ty.clone(),
                _ => Type::Unresolved,
            };
            let ty = Type::function(sig.params.clone(), ret);
            self.symbols.set_type(id, ty);
        }
    }

    /// Function type of a callable symbol, with its return type inferred.
    fn function_type_of(&mut self, id: SymbolId) -> Type {
        let Some(params) = self.signatures.get(&id).map(|s| s.params.clone()) else {
            return Type::Unresolved;
        };
        let ret = self.return_type_of(id);
        Type::function(params, ret)
    }

    // ========================================================================
    // Type relations
    // ========================================================================

    /// `true` if a `from` value may be stored where `to` is expected.
    pub(crate) fn assignable(&self, from: &Type, to: &Type) -> bool {
        let symbols = &*self.symbols;
        from.is_assignable_with(to, &|sub, sup| symbols.is_subtype(sub, sup))
    }

    /// Report a mismatch unless `found` is assignable to `expected`.
    fn expect_assignable(&mut self, found: &Type, expected: &Type, span: Span) -> bool {
        if self.assignable(found, expected) {
            return true;
        }
        self.error(errors::type_mismatch(&expected.to_string(), &found.to_string(), span));
        false
    }

    fn expect_boolean(&mut self, found: &Type, span: Span) {
        if !found.is_unresolved() && !found.is_boolean() {
            self.error(errors::type_mismatch("boolean", &found.to_string(), span));
        }
    }

    fn this_type(&self) -> Option<Type> {
        self.frames.last().and_then(|f| f.this_ty.clone())
    }
}

/// Combine two branch types; an `Unresolved` side defers to the other.
pub(crate) fn unify(a: &Type, b: &Type) -> Type {
    match (a, b) {
        (Type::Unresolved, other) | (other, Type::Unresolved) => other.clone(),
        _ => a.join(b),
    }
}

/// Element type produced by iterating a value of type `ty`, if it is iterable.
pub(crate) fn iteration_element(ty: &Type) -> Option<Type> {
    if ty.is_string() {
        return Some(Type::char());
    }
    ty.element_type().cloned()
}
