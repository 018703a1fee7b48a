//! CLI module for the Starlight compiler
//!
//! ## Commands
//!
//! - `build <file>... --target <jvm|js>` - Compile to Java and/or JavaScript source
//! - `check <file>...` - Run the front end and report diagnostics
//! - `tokens <file>` / `--tokens <file>` - Dump the token stream as JSON
//! - `ast <file>` / `--ast <file>` - Dump the syntax tree as JSON
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.
//!
//! Exit codes: 0 on success, 1 when compilation failed, 2 for usage and I/O errors.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::backend::Target;
use crate::frontend::diagnostics::OutputFormat;
use crate::version::STARLIGHT_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    /// The input did not compile.
    pub const FAILURE: ExitCode = ExitCode(1);
    /// Bad arguments, unreadable input or unwritable output.
    pub const USAGE: ExitCode = ExitCode(2);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Compilation failed (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }

    /// Usage or I/O problem (exit code 2).
    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::USAGE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// The Starlight programming language compiler
#[derive(Parser, Debug)]
#[command(name = "starlight")]
#[command(version = STARLIGHT_VERSION)]
#[command(about = "Compile Starlight programs to Java and JavaScript", long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    // Debug/development flags
    /// Print the token stream of FILE as JSON (debug)
    #[arg(long = "tokens", value_name = "FILE", conflicts_with = "ast_file")]
    pub tokens_file: Option<PathBuf>,

    /// Print the syntax tree of FILE as JSON (debug)
    #[arg(long = "ast", value_name = "FILE")]
    pub ast_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile source files for one or more targets
    Build(BuildArgs),

    /// Check source files without generating code
    Check {
        /// Source files to check
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
        #[command(flatten)]
        diagnostics: DiagnosticArgs,
    },

    /// Print the token stream as JSON
    Tokens {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Print the syntax tree as JSON
    Ast {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Source files to compile
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    /// Target to generate (repeatable)
    #[arg(short = 't', long = "target", value_enum, required = true)]
    pub targets: Vec<Target>,

    /// Output directory (default: next to each input)
    #[arg(short = 'o', long = "out-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Java class name (single input only)
    #[arg(long = "class-name", value_name = "NAME")]
    pub class_name: Option<String>,

    /// Omit the `"use strict";` header from JavaScript output
    #[arg(long = "no-strict")]
    pub no_strict: bool,

    /// Maximum number of worker threads
    #[arg(short = 'j', long = "jobs", value_name = "N")]
    pub jobs: Option<usize>,

    #[command(flatten)]
    pub diagnostics: DiagnosticArgs,
}

#[derive(Args, Debug, Clone, Copy)]
pub struct DiagnosticArgs {
    /// Diagnostic output format
    #[arg(long = "format", value_enum, default_value_t = FormatArg::Plain)]
    pub format: FormatArg,

    /// Treat warnings as errors
    #[arg(long = "warnings-as-errors")]
    pub warnings_as_errors: bool,
}

/// `--format` values.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    /// `file:line:col: severity[CODE]: message`
    Plain,
    /// Source snippets with labels
    Pretty,
    /// JSON array for tools
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Plain => OutputFormat::Plain,
            FormatArg::Pretty => OutputFormat::Pretty,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code != ExitCode::SUCCESS {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
pub fn execute(cli: Cli) -> CliResult<ExitCode> {
    // Handle debug flags first
    if let Some(file) = cli.tokens_file {
        return commands::dump_tokens(&file);
    }
    if let Some(file) = cli.ast_file {
        return commands::dump_ast(&file);
    }

    match cli.command {
        Some(Command::Build(args)) => commands::build(&args),
        Some(Command::Check { files, diagnostics }) => commands::check(&files, diagnostics),
        Some(Command::Tokens { file }) => commands::dump_tokens(&file),
        Some(Command::Ast { file }) => commands::dump_ast(&file),
        None => Err(CliError::usage("no command given; run `starlight --help`")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_build_with_repeated_targets() {
        let cli = parse(&["starlight", "build", "a.sl", "b.sl", "--target", "jvm", "-t", "js", "-o", "out"]);
        let Some(Command::Build(args)) = cli.command else {
            panic!("expected build");
        };
        assert_eq!(args.files, vec![PathBuf::from("a.sl"), PathBuf::from("b.sl")]);
        assert_eq!(args.targets, vec![Target::Jvm, Target::Js]);
        assert_eq!(args.output_dir, Some(PathBuf::from("out")));
        assert_eq!(args.diagnostics.format, FormatArg::Plain);
    }

    #[test]
    fn test_build_requires_target() {
        assert!(Cli::try_parse_from(["starlight", "build", "a.sl"]).is_err());
        assert!(Cli::try_parse_from(["starlight", "build", "a.sl", "--target", "wasm"]).is_err());
    }

    #[test]
    fn test_check_format_flag() {
        let cli = parse(&["starlight", "check", "a.sl", "--format", "json", "--warnings-as-errors"]);
        let Some(Command::Check { diagnostics, .. }) = cli.command else {
            panic!("expected check");
        };
        assert_eq!(diagnostics.format, FormatArg::Json);
        assert!(diagnostics.warnings_as_errors);
        assert_eq!(OutputFormat::from(diagnostics.format), OutputFormat::Json);
    }

    #[test]
    fn test_debug_flags() {
        let cli = parse(&["starlight", "--tokens", "a.sl"]);
        assert_eq!(cli.tokens_file, Some(PathBuf::from("a.sl")));
        assert!(Cli::try_parse_from(["starlight", "--tokens", "a.sl", "--ast", "b.sl"]).is_err());
    }
}
