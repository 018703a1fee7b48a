//! Starlight compiler backends
//!
//! Each backend turns one checked, desugared unit into the source text of its target language.
//!
//! ## Module Organization
//!
//! - `emitter.rs` - Indentation-aware text buffer and literal helpers shared by the backends
//! - `errors.rs` - [`EmitError`], the one failure a backend reports
//! - `jvm/` - Java source for the managed runtime
//! - `js/` - JavaScript (ES2020) for the dynamic runtime
//!
//! ## Notes
//!
//! - Backends only run on units without front-end errors, so every expression carries a type and
//!   every identifier a symbol. Anything the target cannot express is reported as
//!   [`EmitError::Unsupported`] rather than emitted incorrectly.
//! - A [`TypedUnit`] is immutable; the driver shares one through an `Arc` and runs every
//!   requested backend over it in parallel.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod emitter;
mod errors;
pub mod js;
pub mod jvm;

use std::fmt;

use serde::Serialize;

use crate::config::CompilerConfig;
use crate::frontend::ast::Program;
use crate::frontend::symbols::SymbolTable;

pub use emitter::CodeWriter;
pub use errors::EmitError;

pub type EmitResult<T> = Result<T, EmitError>;

/// Output language of a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    /// Java source for the JVM.
    Jvm,
    /// JavaScript for Node.js and browsers.
    Js,
}

impl Target {
    /// Flag spelling (`jvm`, `js`).
    pub fn as_str(self) -> &'static str {
        match self {
            Target::Jvm => "jvm",
            Target::Js => "js",
        }
    }

    /// File extension of generated sources, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Target::Jvm => "java",
            Target::Js => "js",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Target::Jvm => "JVM",
            Target::Js => "JavaScript",
        })
    }
}

/// A checked and desugared compilation unit, ready for code generation.
#[derive(Debug, Clone)]
pub struct TypedUnit {
    /// Unit name, normally the source file stem.
    pub name: String,
    pub program: Program,
    pub symbols: SymbolTable,
}

/// A code generator for one target.
pub trait Backend: Send + Sync {
    fn target(&self) -> Target;

    /// Generate the complete target source for `unit`.
    ///
    /// ## Errors
    /// Returns [`EmitError::Unsupported`] for the first construct the target cannot express.
    fn generate(&self, unit: &TypedUnit) -> EmitResult<String>;

    /// File name (with extension) the generated source is written to.
    fn output_file_name(&self, unit: &TypedUnit) -> String {
        format!("{}.{}", unit.name, self.target().extension())
    }
}

/// Construct the backend for `target`, configured from `config`.
pub fn backend_for(target: Target, config: &CompilerConfig) -> Box<dyn Backend> {
    match target {
        Target::Jvm => Box::new(jvm::JvmBackend::new(config.jvm_class_name.clone())),
        Target::Js => Box::new(js::JsBackend::new(config.js_strict_mode)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_names() {
        assert_eq!(Target::Jvm.as_str(), "jvm");
        assert_eq!(Target::Js.extension(), "js");
        assert_eq!(Target::Jvm.to_string(), "JVM");
    }

    #[test]
    fn test_backend_for_respects_target() {
        let config = CompilerConfig::default();
        assert_eq!(backend_for(Target::Jvm, &config).target(), Target::Jvm);
        assert_eq!(backend_for(Target::Js, &config).target(), Target::Js);
    }
}
