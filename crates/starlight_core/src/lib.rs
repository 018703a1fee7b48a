//! Shared vocabulary and semantic helpers for the Starlight compiler.
//!
//! This crate is intentionally small and free of I/O. It owns the pieces that both the syntax
//! crate and the compiler need to agree on:
//!
//! - [`lang`]: registry-first vocabularies (keywords, operators, punctuation, builtin functions and
//!   builtin member surfaces).
//! - [`types`]: the semantic [`types::Type`] model, primitive types and the numeric widening order.
//!
//! ## Examples
//! ```rust
//! use starlight_core::lang::keywords::{self, KeywordId};
//! use starlight_core::types::{PrimitiveType, Type};
//!
//! assert_eq!(keywords::from_str("fun"), Some(KeywordId::Fun));
//! let widened = Type::int().widen_numeric(&Type::double());
//! assert_eq!(widened, Some(Type::Primitive(PrimitiveType::Double)));
//! ```

#![forbid(unsafe_code)]

pub mod lang;
pub mod types;
