#![forbid(unsafe_code)]
//! Starlight Programming Language Compiler
//!
//! Starlight is a small statically typed language that compiles to Java source for the JVM and to
//! JavaScript. This crate provides the compiler: frontend (resolver, type checker on top of the
//! `starlight_syntax` lexer and parser), backends (JVM, JavaScript), the compilation driver and
//! the CLI.
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` and `backend` modules
//!   enforce `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **User input**: Malformed programs produce diagnostics, never panics.

pub mod backend;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod frontend;
pub mod version;

pub use frontend::ast;
pub use frontend::diagnostics;
pub use frontend::lexer;
pub use frontend::parser;
pub use frontend::resolver;
pub use frontend::symbols;
pub use frontend::typechecker;

pub use backend::{Backend, Target, TypedUnit};
pub use compiler::{Compilation, CompileError, compile_files, compile_source};
pub use config::CompilerConfig;
