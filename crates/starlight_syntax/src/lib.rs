//! Shared syntax frontend for the Starlight language: lexer, parser, AST, diagnostics.
//!
//! The compiler crate builds name resolution, type checking and code generation on top of this.
//!
//! ## Notes
//! - This crate is "syntax-only": it does not resolve names or check types. The AST carries
//!   empty decoration slots (`symbol`, `ty`, ...) that later stages fill in.
//! - Vocabulary identity (keywords/operators/punctuation) comes from `starlight_core::lang`
//!   registries.
//!
//! ## Examples
//! ```rust
//! use starlight_syntax::{lexer, parser};
//!
//! let tokens = lexer::lex("fun main() { println(\"hi\") }").unwrap();
//! let program = parser::parse_tokens(&tokens).unwrap();
//! assert_eq!(program.declarations.len(), 1);
//! ```

#![forbid(unsafe_code)]

pub mod ast;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod token_helpers;
