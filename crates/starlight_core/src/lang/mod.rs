//! Starlight language vocabulary registries.
//!
//! This module is the front door for language-level vocabulary: reserved keywords, operators,
//! punctuation, builtin functions, and the members the compiler knows on builtin types.
//!
//! Callers work with **stable IDs** (e.g. `KeywordId`, `OperatorId`) and look up spellings and
//! metadata via registry tables instead of comparing strings across the compiler.
//!
//! ## Notes
//! - Registries are **pure**: no AST types, no IO, no side effects.
//! - The lexer/parser enforce syntax; registries provide spellings and metadata for shared use
//!   (diagnostics, dumps, code generation).
//!
//! ## Examples
//! ```rust
//! use starlight_core::lang::keywords::{self, KeywordId};
//!
//! assert_eq!(keywords::from_str("while"), Some(KeywordId::While));
//! assert_eq!(keywords::as_str(KeywordId::While), "while");
//! ```

pub mod builtins;
pub mod keywords;
pub mod members;
pub mod operators;
pub mod punctuation;
pub mod registry;
