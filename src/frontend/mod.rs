//! Starlight compiler frontend
//!
//! - `lexer`: tokenization of source code
//! - `parser`: parsing tokens into the AST
//! - `ast`: abstract syntax tree definitions
//! - `diagnostics`: diagnostic model and rendering
//! - `resolver`: scope resolution, producing the symbol table
//! - `symbols`: symbol table and scope management
//! - `typechecker`: type inference and checking

// Syntax components are provided by the shared starlight_syntax crate.
pub use starlight_syntax::{ast, diagnostics, lexer, parser};

// Semantic passes remain local.
pub mod resolver;
pub mod symbols;
pub mod typechecker;
