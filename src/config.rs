//! Compiler configuration
//!
//! One [`CompilerConfig`] drives a whole invocation: which targets to generate, where outputs
//! go, how diagnostics are rendered and how much work runs in parallel. The CLI builds it from
//! flags; library users start from [`CompilerConfig::default`] and chain `with_*` setters.

use std::path::PathBuf;

use thiserror::Error;

use crate::backend::Target;
use crate::frontend::diagnostics::OutputFormat;

/// Sources larger than this are rejected before lexing (16 MiB).
pub const DEFAULT_MAX_SOURCE_SIZE: u64 = 16 * 1024 * 1024;

/// Settings for one compiler invocation.
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Targets to generate, in order. Empty means front end only.
    pub targets: Vec<Target>,
    /// Directory for generated files; `None` writes next to each input.
    pub output_dir: Option<PathBuf>,
    /// How diagnostics are rendered.
    pub format: OutputFormat,
    /// Treat warnings as errors (they then block code generation).
    pub warnings_as_errors: bool,
    /// Largest accepted source, in bytes.
    pub max_source_size: u64,
    /// Overrides the JVM class name derived from the file stem.
    pub jvm_class_name: Option<String>,
    /// Emit a `"use strict";` header in JavaScript output.
    pub js_strict_mode: bool,
    /// Cap on worker threads; `None` uses the number of CPUs.
    pub parallelism: Option<usize>,
}

/// Invalid combinations of settings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("parallelism must be at least 1")]
    ZeroParallelism,
    #[error("maximum source size must be greater than zero")]
    ZeroSourceSize,
    #[error("`{0}` is not a valid JVM class name")]
    InvalidClassName(String),
    #[error("target `{0}` was requested more than once")]
    DuplicateTarget(&'static str),
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            output_dir: None,
            format: OutputFormat::Plain,
            warnings_as_errors: false,
            max_source_size: DEFAULT_MAX_SOURCE_SIZE,
            jvm_class_name: None,
            js_strict_mode: true,
            parallelism: None,
        }
    }
}

impl CompilerConfig {
    /// Create a config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a target to generate.
    pub fn with_target(mut self, target: Target) -> Self {
        self.targets.push(target);
        self
    }

    pub fn with_targets(mut self, targets: impl IntoIterator<Item = Target>) -> Self {
        self.targets.extend(targets);
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_warnings_as_errors(mut self, enabled: bool) -> Self {
        self.warnings_as_errors = enabled;
        self
    }

    pub fn with_max_source_size(mut self, bytes: u64) -> Self {
        self.max_source_size = bytes;
        self
    }

    pub fn with_jvm_class_name(mut self, name: impl Into<String>) -> Self {
        self.jvm_class_name = Some(name.into());
        self
    }

    pub fn with_js_strict_mode(mut self, strict: bool) -> Self {
        self.js_strict_mode = strict;
        self
    }

    pub fn with_parallelism(mut self, threads: usize) -> Self {
        self.parallelism = Some(threads);
        self
    }

    /// Check the settings before any work starts.
    ///
    /// ## Errors
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.parallelism == Some(0) {
            return Err(ConfigError::ZeroParallelism);
        }
        if self.max_source_size == 0 {
            return Err(ConfigError::ZeroSourceSize);
        }
        if let Some(name) = &self.jvm_class_name {
            if !is_java_identifier(name) {
                return Err(ConfigError::InvalidClassName(name.clone()));
            }
        }
        for (i, target) in self.targets.iter().enumerate() {
            if self.targets[..i].contains(target) {
                return Err(ConfigError::DuplicateTarget(target.as_str()));
            }
        }
        Ok(())
    }
}

fn is_java_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CompilerConfig::default();
        assert!(config.targets.is_empty());
        assert_eq!(config.max_source_size, 16 * 1024 * 1024);
        assert_eq!(config.format, OutputFormat::Plain);
        assert!(config.js_strict_mode);
        assert!(!config.warnings_as_errors);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_builder_chain() {
        let config = CompilerConfig::new()
            .with_target(Target::Jvm)
            .with_target(Target::Js)
            .with_output_dir("out")
            .with_format(OutputFormat::Json)
            .with_js_strict_mode(false)
            .with_parallelism(2);
        assert_eq!(config.targets, vec![Target::Jvm, Target::Js]);
        assert_eq!(config.output_dir, Some(PathBuf::from("out")));
        assert_eq!(config.format, OutputFormat::Json);
        assert!(!config.js_strict_mode);
        assert_eq!(config.parallelism, Some(2));
    }

    #[test]
    fn test_validate_rejects_zero_parallelism() {
        let config = CompilerConfig::new().with_parallelism(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroParallelism));
    }

    #[test]
    fn test_validate_rejects_bad_class_name() {
        let config = CompilerConfig::new().with_jvm_class_name("9lives");
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidClassName("9lives".to_string()))
        );
        assert_eq!(CompilerConfig::new().with_jvm_class_name("Main").validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_duplicate_target() {
        let config = CompilerConfig::new().with_targets([Target::Js, Target::Js]);
        assert_eq!(config.validate(), Err(ConfigError::DuplicateTarget("js")));
    }
}
