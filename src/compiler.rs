//! Compilation driver
//!
//! Runs the pipeline for each input and writes the generated files:
//!
//! ```text
//! source ─▶ lex ─▶ parse ─┬─▶ resolve ─▶ typecheck ─┬─▶ backend (per target) ─▶ <dir>/<unit>.<ext>
//!                         │                          │
//!                         └─ syntax errors: stop     └─ any error: stop
//! ```
//!
//! ## Notes
//!
//! - Lexing and parsing always run to surface every syntax error. Resolution and checking only run
//!   on a tree without syntax errors; code generation only on a unit without errors.
//! - Every unit owns its [`Diagnostics`]. Units compile concurrently on a `tokio` runtime and the
//!   backends of one unit run in parallel over a shared [`Arc<TypedUnit>`]. A failing unit never
//!   affects its siblings and results come back in input order.
//! - A file is written only once its complete text exists: it goes to a temporary file in the
//!   output directory and is renamed into place.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinSet;

use crate::backend::{Backend, Target, TypedUnit, backend_for};
use crate::config::{CompilerConfig, ConfigError};
use crate::frontend::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::frontend::{lexer, parser, resolver, typechecker};

/// Failures that stop a unit (or the whole run) outside of user diagnostics.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("cannot read `{}`: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("`{}` is too large ({size} bytes, the limit is {limit} bytes)", path.display())]
    TooLarge { path: PathBuf, size: u64, limit: u64 },
    #[error("cannot write `{}`: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("cannot start the compiler runtime: {0}")]
    Runtime(#[source] io::Error),
    #[error("compiling `{}` was interrupted: {message}", path.display())]
    Interrupted { path: PathBuf, message: String },
}

pub type CompileResult<T> = Result<T, CompileError>;

/// Front-end result for one unit.
#[derive(Debug)]
pub struct Checked {
    /// Present when the front end reported no errors.
    pub unit: Option<TypedUnit>,
    pub diagnostics: Diagnostics,
}

/// Complete text of one generated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    pub target: Target,
    pub file_name: String,
    pub text: String,
}

/// In-memory result of compiling one source.
#[derive(Debug)]
pub struct Compilation {
    pub diagnostics: Vec<Diagnostic>,
    pub outputs: Vec<Generated>,
}

impl Compilation {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Output for `target`, if it was generated.
    pub fn output(&self, target: Target) -> Option<&Generated> {
        self.outputs.iter().find(|g| g.target == target)
    }
}

/// Result of compiling one file from disk.
#[derive(Debug)]
pub struct UnitReport {
    pub path: PathBuf,
    /// Source text, kept for rendering diagnostics.
    pub source: String,
    pub diagnostics: Vec<Diagnostic>,
    /// Files written, in target order.
    pub written: Vec<PathBuf>,
}

impl UnitReport {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

// ============================================================================
// Front end
// ============================================================================

/// Unit name of a source path: its file stem.
pub fn unit_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("main")
        .to_string()
}

/// Run the front end on `source`.
#[tracing::instrument(skip_all, fields(unit = name))]
pub fn check_source(name: &str, source: &str, config: &CompilerConfig) -> Checked {
    let mut diagnostics = Diagnostics::new();
    let tokens = lexer::tokenize(source, &mut diagnostics);
    let mut program = parser::parse(&tokens, &mut diagnostics);

    if diagnostics.has_errors() {
        tracing::debug!(errors = diagnostics.error_count(), "syntax errors, skipping semantic analysis");
        return Checked { unit: None, diagnostics };
    }

    let mut symbols = resolver::resolve(&mut program, &mut diagnostics);
    typechecker::typecheck(&mut program, &mut symbols, &mut diagnostics);
    if config.warnings_as_errors {
        diagnostics.promote_warnings();
    }
    tracing::debug!(
        errors = diagnostics.error_count(),
        warnings = diagnostics.warning_count(),
        "front end finished"
    );

    let unit = (!diagnostics.has_errors()).then(|| TypedUnit {
        name: name.to_string(),
        program,
        symbols,
    });
    Checked { unit, diagnostics }
}

// ============================================================================
// Code generation
// ============================================================================

fn run_backend(backend: &dyn Backend, unit: &TypedUnit) -> Result<Generated, Diagnostic> {
    match backend.generate(unit) {
        Ok(text) => Ok(Generated {
            target: backend.target(),
            file_name: backend.output_file_name(unit),
            text,
        }),
        Err(err) => {
            tracing::debug!(backend = %backend.target(), error = %err, "backend failed");
            Err(err.to_diagnostic())
        }
    }
}

/// Generate every configured target for `unit`, one after another.
pub fn generate(unit: &TypedUnit, config: &CompilerConfig) -> Vec<Result<Generated, Diagnostic>> {
    config
        .targets
        .iter()
        .map(|&target| run_backend(backend_for(target, config).as_ref(), unit))
        .collect()
}

/// Generate every configured target for `unit` in parallel. Results follow the target order.
async fn generate_parallel(
    unit: Arc<TypedUnit>,
    config: &CompilerConfig,
) -> Vec<Result<Generated, Diagnostic>> {
    let mut tasks = JoinSet::new();
    for (index, &target) in config.targets.iter().enumerate() {
        let backend = backend_for(target, config);
        let unit = Arc::clone(&unit);
        tasks.spawn_blocking(move || (index, run_backend(backend.as_ref(), &unit)));
    }

    let mut slots: Vec<Option<Result<Generated, Diagnostic>>> = config.targets.iter().map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, result)) => slots[index] = Some(result),
            Err(err) => tracing::error!(error = %err, "backend task failed"),
        }
    }
    slots
        .into_iter()
        .zip(&config.targets)
        .map(|(slot, target)| {
            slot.unwrap_or_else(|| {
                Err(Diagnostic::new(
                    DiagnosticKind::UnsupportedConstruct,
                    format!("the {target} backend stopped unexpectedly"),
                    Default::default(),
                ))
            })
        })
        .collect()
}

/// Compile `source` in memory. Backends only run when the front end reported no errors.
///
/// ## Errors
/// Returns [`CompileError::TooLarge`] when `source` exceeds the configured limit.
pub fn compile_source(name: &str, source: &str, config: &CompilerConfig) -> CompileResult<Compilation> {
    check_size(Path::new(name), source.len() as u64, config)?;
    let checked = check_source(name, source, config);
    let mut diagnostics = checked.diagnostics.into_vec();
    let mut outputs = Vec::new();
    if let Some(unit) = checked.unit {
        for result in generate(&unit, config) {
            match result {
                Ok(generated) => outputs.push(generated),
                Err(diagnostic) => diagnostics.push(diagnostic),
            }
        }
    }
    Ok(Compilation { diagnostics, outputs })
}

// ============================================================================
// Files
// ============================================================================

fn check_size(path: &Path, size: u64, config: &CompilerConfig) -> CompileResult<()> {
    if size > config.max_source_size {
        return Err(CompileError::TooLarge {
            path: path.to_path_buf(),
            size,
            limit: config.max_source_size,
        });
    }
    Ok(())
}

/// Read a source file, rejecting it before reading when it exceeds the size limit.
///
/// ## Errors
/// I/O failures and oversized files.
pub fn read_source(path: &Path, config: &CompilerConfig) -> CompileResult<String> {
    let read_error = |source| CompileError::Read {
        path: path.to_path_buf(),
        source,
    };
    let metadata = fs::metadata(path).map_err(read_error)?;
    check_size(path, metadata.len(), config)?;
    fs::read_to_string(path).map_err(read_error)
}

/// Directory generated files for `input` go to.
pub fn output_dir_for(input: &Path, config: &CompilerConfig) -> PathBuf {
    match &config.output_dir {
        Some(dir) => dir.clone(),
        None => match input.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        },
    }
}

/// Write `text` to `dir/file_name` through a temporary file renamed into place.
///
/// ## Errors
/// I/O failures; a partially written temporary file is removed.
pub fn write_atomically(dir: &Path, file_name: &str, text: &str) -> CompileResult<PathBuf> {
    let target = dir.join(file_name);
    let write_error = |source| CompileError::Write {
        path: target.clone(),
        source,
    };
    fs::create_dir_all(dir).map_err(write_error)?;
    let temp = dir.join(format!(".{file_name}.{}.tmp", std::process::id()));
    if let Err(err) = fs::write(&temp, text).and_then(|()| fs::rename(&temp, &target)) {
        let _ = fs::remove_file(&temp);
        return Err(write_error(err));
    }
    Ok(target)
}

/// Compile one file: read, check, generate, write.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
async fn compile_unit(path: PathBuf, config: Arc<CompilerConfig>) -> CompileResult<UnitReport> {
    let source = read_source(&path, &config)?;
    let name = unit_name(&path);

    let checked = {
        let config = Arc::clone(&config);
        let source = source.clone();
        tokio::task::spawn_blocking(move || check_source(&name, &source, &config))
            .await
            .map_err(|err| CompileError::Interrupted {
                path: path.clone(),
                message: err.to_string(),
            })?
    };

    let mut diagnostics = checked.diagnostics.into_vec();
    let mut written = Vec::new();
    if let Some(unit) = checked.unit {
        let dir = output_dir_for(&path, &config);
        for result in generate_parallel(Arc::new(unit), &config).await {
            match result {
                Ok(generated) => {
                    let file = write_atomically(&dir, &generated.file_name, &generated.text)?;
                    tracing::debug!(file = %file.display(), "wrote output");
                    written.push(file);
                }
                Err(diagnostic) => diagnostics.push(diagnostic),
            }
        }
    }

    Ok(UnitReport {
        path,
        source,
        diagnostics,
        written,
    })
}

async fn compile_all(paths: Vec<PathBuf>, config: Arc<CompilerConfig>) -> Vec<CompileResult<UnitReport>> {
    let mut tasks = JoinSet::new();
    for (index, path) in paths.iter().cloned().enumerate() {
        let config = Arc::clone(&config);
        tasks.spawn(async move { (index, compile_unit(path, config).await) });
    }

    let mut slots: Vec<Option<CompileResult<UnitReport>>> = paths.iter().map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, result)) => slots[index] = Some(result),
            Err(err) => tracing::error!(error = %err, "compilation task failed"),
        }
    }
    slots
        .into_iter()
        .zip(paths)
        .map(|(slot, path)| {
            slot.unwrap_or_else(|| {
                Err(CompileError::Interrupted {
                    path,
                    message: "the task stopped before reporting".to_string(),
                })
            })
        })
        .collect()
}

/// Compile every file in `paths` concurrently and write the outputs of the ones that succeed.
///
/// Each entry of the result belongs to the path at the same index.
///
/// ## Errors
/// Fails as a whole only for an invalid config or when the runtime cannot start. Per-file
/// problems are reported in the entries.
pub fn compile_files(paths: &[PathBuf], config: &CompilerConfig) -> CompileResult<Vec<CompileResult<UnitReport>>> {
    config.validate()?;
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(threads) = config.parallelism {
        builder.worker_threads(threads).max_blocking_threads(threads);
    }
    let runtime = builder.build().map_err(CompileError::Runtime)?;
    tracing::debug!(files = paths.len(), targets = config.targets.len(), "compiling");
    Ok(runtime.block_on(compile_all(paths.to_vec(), Arc::new(config.clone()))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_name_is_file_stem() {
        assert_eq!(unit_name(Path::new("src/greet.sl")), "greet");
        assert_eq!(unit_name(Path::new("")), "main");
    }

    #[test]
    fn test_syntax_errors_skip_semantic_analysis() {
        // `y` is unresolved, but the missing operand stops the pipeline first.
        let checked = check_source("t", "val x = \nval z = y", &CompilerConfig::default());
        assert!(checked.unit.is_none());
        assert_eq!(checked.diagnostics.count_of(DiagnosticKind::UnresolvedIdentifier), 0);
        assert!(checked.diagnostics.count_of(DiagnosticKind::ParseError) >= 1);
    }

    #[test]
    fn test_compile_source_generates_every_target() {
        let config = CompilerConfig::new().with_targets([Target::Jvm, Target::Js]);
        let compilation = compile_source("greet", "fun greet(name: string) = \"Hello, \" + name", &config).unwrap();
        assert!(!compilation.has_errors(), "{:?}", compilation.diagnostics);
        assert_eq!(compilation.output(Target::Jvm).unwrap().file_name, "greet.java");
        assert_eq!(compilation.output(Target::Js).unwrap().file_name, "greet.js");
    }

    #[test]
    fn test_errors_block_generation() {
        let config = CompilerConfig::new().with_target(Target::Js);
        let compilation = compile_source("t", "val x: int = \"no\"", &config).unwrap();
        assert!(compilation.has_errors());
        assert!(compilation.outputs.is_empty());
    }

    #[test]
    fn test_warnings_as_errors_block_generation() {
        let source = "fun f() { val unused = 1 }";
        let relaxed = CompilerConfig::new().with_target(Target::Js);
        let compilation = compile_source("t", source, &relaxed).unwrap();
        assert!(!compilation.has_errors());
        assert_eq!(compilation.outputs.len(), 1);

        let strict = relaxed.with_warnings_as_errors(true);
        let compilation = compile_source("t", source, &strict).unwrap();
        assert!(compilation.has_errors());
        assert!(compilation.outputs.is_empty());
    }

    #[test]
    fn test_unsupported_construct_fails_only_that_target() {
        let config = CompilerConfig::new().with_targets([Target::Jvm, Target::Js]);
        let source = "fun one() = 1\nasync fun two() = await one()";
        let compilation = compile_source("t", source, &config).unwrap();
        assert!(compilation.output(Target::Jvm).is_none());
        assert!(compilation.output(Target::Js).is_some());
        let unsupported: Vec<_> = compilation
            .diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::UnsupportedConstruct)
            .collect();
        assert_eq!(unsupported.len(), 1);
    }

    #[test]
    fn test_oversized_source_is_rejected() {
        let config = CompilerConfig::new().with_max_source_size(4);
        assert!(matches!(
            compile_source("t", "val x = 1", &config),
            Err(CompileError::TooLarge { size: 9, limit: 4, .. })
        ));
    }

    #[test]
    fn test_output_dir_defaults_to_input_directory() {
        let config = CompilerConfig::default();
        assert_eq!(output_dir_for(Path::new("a/b/c.sl"), &config), PathBuf::from("a/b"));
        assert_eq!(output_dir_for(Path::new("c.sl"), &config), PathBuf::from("."));
        let config = config.with_output_dir("out");
        assert_eq!(output_dir_for(Path::new("a/c.sl"), &config), PathBuf::from("out"));
    }

    #[test]
    fn test_write_atomically_leaves_no_temporary_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_atomically(dir.path(), "Main.js", "x;\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "x;\n");
        let names: Vec<_> = fs::read_dir(dir.path()).unwrap().map(|e| e.unwrap().file_name()).collect();
        assert_eq!(names, vec![std::ffi::OsString::from("Main.js")]);
    }

    #[test]
    fn test_compile_files_keeps_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.sl");
        let bad = dir.path().join("bad.sl");
        fs::write(&good, "fun main() { println(\"hi\") }").unwrap();
        fs::write(&bad, "val x = y").unwrap();
        let config = CompilerConfig::new().with_target(Target::Js).with_parallelism(2);

        let reports = compile_files(&[bad.clone(), good.clone(), dir.path().join("missing.sl")], &config).unwrap();
        assert_eq!(reports.len(), 3);

        let first = reports[0].as_ref().unwrap();
        assert_eq!(first.path, bad);
        assert!(first.has_errors());
        assert!(first.written.is_empty());
        assert!(!dir.path().join("bad.js").exists());

        let second = reports[1].as_ref().unwrap();
        assert!(!second.has_errors());
        assert_eq!(second.written, vec![dir.path().join("good.js")]);

        assert!(matches!(reports[2], Err(CompileError::Read { .. })));
    }
}
