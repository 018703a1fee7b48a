//! Parser for the Starlight programming language
//!
//! Recursive descent over the token stream for declarations and statements, precedence climbing
//! for binary operators (binding powers come from `starlight_core::lang::operators`).
//!
//! ## Statement termination
//!
//! Semicolons are optional. A simple statement ends at `;`, before `}` or end of file, or when
//! the next token starts a new line. While scanning an expression, an operator that starts a new
//! line ends the expression, except `.` and `?.` (leading-dot chaining). Inside `(...)` and
//! `[...]` line breaks are insignificant.
//!
//! ## Examples
//!
//! ```rust
//! use starlight_syntax::{lexer, parser};
//!
//! let source = "fun add(a: int, b: int) -> int {\n    return a + b\n}\n";
//! let tokens = lexer::lex(source).unwrap();
//! let ast = parser::parse_tokens(&tokens).unwrap();
//! assert_eq!(ast.declarations.len(), 1);
//! ```

use crate::ast::*;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::lexer::{self, Token, TokenKind};
use starlight_core::lang::keywords::{self, KeywordId};
use starlight_core::lang::operators::{self, OperatorId};
use starlight_core::lang::punctuation::PunctuationId;

// NOTE: This module is split across multiple files using `include!` to keep all parser
// methods in the same Rust module (preserving privacy + call patterns) while avoiding
// a single large source file.

include!("parser/core.rs");
include!("parser/helpers.rs");
include!("parser/decl.rs");
include!("parser/types.rs");
include!("parser/stmts.rs");
include!("parser/expr.rs");
include!("parser/patterns.rs");
include!("parser/api.rs");
include!("parser/tests.rs");
