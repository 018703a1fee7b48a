//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use crate::compiler::{self, CompileError, UnitReport};
use crate::config::CompilerConfig;
use crate::frontend::diagnostics::{self, Diagnostic, Diagnostics, OutputFormat};
use crate::frontend::{lexer, parser};

use super::{BuildArgs, CliError, CliResult, DiagnosticArgs, ExitCode};

// ============================================================================
// Configuration
// ============================================================================

/// Translate `build` flags into a compiler configuration.
pub fn build_config(args: &BuildArgs) -> CliResult<CompilerConfig> {
    if args.class_name.is_some() && args.files.len() > 1 {
        return Err(CliError::usage("--class-name can only be used with a single input file"));
    }
    let mut config = CompilerConfig::new()
        .with_targets(args.targets.iter().copied())
        .with_format(args.diagnostics.format.into())
        .with_warnings_as_errors(args.diagnostics.warnings_as_errors)
        .with_js_strict_mode(!args.no_strict);
    if let Some(dir) = &args.output_dir {
        if dir.is_absolute() {
            tracing::warn!(dir = %dir.display(), "using an absolute output directory");
        }
        config = config.with_output_dir(dir);
    }
    if let Some(name) = &args.class_name {
        config = config.with_jvm_class_name(name);
    }
    if let Some(jobs) = args.jobs {
        config = config.with_parallelism(jobs);
    }
    config.validate().map_err(|e| CliError::usage(e.to_string()))?;
    Ok(config)
}

// ============================================================================
// Commands
// ============================================================================

/// `starlight build`
pub fn build(args: &BuildArgs) -> CliResult<ExitCode> {
    let config = build_config(args)?;
    let reports = compiler::compile_files(&args.files, &config).map_err(|e| CliError::usage(e.to_string()))?;
    finish(reports, config.format)
}

/// `starlight check`
pub fn check(files: &[PathBuf], args: DiagnosticArgs) -> CliResult<ExitCode> {
    let config = CompilerConfig::new()
        .with_format(args.format.into())
        .with_warnings_as_errors(args.warnings_as_errors);
    let reports = compiler::compile_files(files, &config).map_err(|e| CliError::usage(e.to_string()))?;
    finish(reports, config.format)
}

/// Report every unit, then pick the exit code: I/O problems win over compile errors.
fn finish(reports: Vec<Result<UnitReport, CompileError>>, format: OutputFormat) -> CliResult<ExitCode> {
    let mut io_errors = Vec::new();
    let mut units = Vec::new();
    for report in reports {
        match report {
            Ok(unit) => units.push(unit),
            Err(err) => io_errors.push(err.to_string()),
        }
    }

    let rendered = render_reports(&units, format, std::io::stderr().is_terminal())?;
    if !rendered.is_empty() {
        eprint!("{rendered}");
    }
    for unit in &units {
        for file in &unit.written {
            tracing::info!(file = %file.display(), "generated");
        }
    }

    if !io_errors.is_empty() {
        return Err(CliError::usage(io_errors.join("\n")));
    }
    let failed = units.iter().filter(|u| u.has_errors()).count();
    if failed > 0 {
        let noun = if failed == 1 { "file" } else { "files" };
        return Err(CliError::failure(format!("error: {failed} {noun} failed to compile")));
    }
    Ok(ExitCode::SUCCESS)
}

/// `starlight tokens` / `--tokens`
pub fn dump_tokens(file: &Path) -> CliResult<ExitCode> {
    let source = read(file)?;
    let mut diags = Diagnostics::new();
    let tokens = lexer::tokenize(&source, &mut diags);
    let dump: Vec<_> = tokens.iter().map(|t| t.dump()).collect();
    let json = serde_json::to_string_pretty(&dump).map_err(|e| CliError::usage(format!("cannot serialize tokens: {e}")))?;
    println!("{json}");
    report_front_end(file, &source, diags.as_slice())
}

/// `starlight ast` / `--ast`
pub fn dump_ast(file: &Path) -> CliResult<ExitCode> {
    let source = read(file)?;
    let mut diags = Diagnostics::new();
    let tokens = lexer::tokenize(&source, &mut diags);
    let program = parser::parse(&tokens, &mut diags);
    if !diags.has_errors() {
        let json =
            serde_json::to_string_pretty(&program).map_err(|e| CliError::usage(format!("cannot serialize AST: {e}")))?;
        println!("{json}");
    }
    report_front_end(file, &source, diags.as_slice())
}

// ============================================================================
// Helpers
// ============================================================================

fn read(file: &Path) -> CliResult<String> {
    compiler::read_source(file, &CompilerConfig::default()).map_err(|e| CliError::usage(e.to_string()))
}

fn report_front_end(file: &Path, source: &str, diags: &[Diagnostic]) -> CliResult<ExitCode> {
    if diags.is_empty() {
        return Ok(ExitCode::SUCCESS);
    }
    eprint!("{}", diagnostics::render_plain(&file.display().to_string(), source, diags));
    if diags.iter().any(Diagnostic::is_error) {
        Err(CliError::failure(""))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Render the diagnostics of every unit. JSON output is one array across all units.
pub fn render_reports(units: &[UnitReport], format: OutputFormat, color: bool) -> CliResult<String> {
    let json_error = |e: serde_json::Error| CliError::usage(format!("cannot serialize diagnostics: {e}"));
    match format {
        OutputFormat::Json => {
            let mut all: Vec<serde_json::Value> = Vec::new();
            for unit in units {
                let file = unit.path.display().to_string();
                let rendered = diagnostics::render_json(&file, &unit.source, &unit.diagnostics).map_err(json_error)?;
                let items: Vec<serde_json::Value> = serde_json::from_str(&rendered).map_err(json_error)?;
                all.extend(items);
            }
            if all.is_empty() {
                return Ok(String::new());
            }
            let mut out = serde_json::to_string_pretty(&all).map_err(json_error)?;
            out.push('\n');
            Ok(out)
        }
        format => {
            let mut out = String::new();
            for unit in units.iter().filter(|u| !u.diagnostics.is_empty()) {
                let file = unit.path.display().to_string();
                let rendered =
                    diagnostics::render(format, &file, &unit.source, &unit.diagnostics, color).map_err(json_error)?;
                out.push_str(&rendered);
            }
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Target;
    use crate::cli::{Cli, Command, FormatArg};
    use clap::Parser;

    fn build_args(args: &[&str]) -> BuildArgs {
        let mut argv = vec!["starlight", "build"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Some(Command::Build(args)) => args,
            other => panic!("expected build, got {other:?}"),
        }
    }

    fn unit(path: &str, source: &str) -> UnitReport {
        let config = CompilerConfig::default();
        let checked = compiler::check_source("t", source, &config);
        UnitReport {
            path: PathBuf::from(path),
            source: source.to_string(),
            diagnostics: checked.diagnostics.into_vec(),
            written: Vec::new(),
        }
    }

    #[test]
    fn test_build_config_from_flags() {
        let config = build_config(&build_args(&["a.sl", "-t", "js", "--no-strict", "-j", "3"])).unwrap();
        assert_eq!(config.targets, vec![Target::Js]);
        assert!(!config.js_strict_mode);
        assert_eq!(config.parallelism, Some(3));
    }

    #[test]
    fn test_class_name_needs_single_input() {
        let err = build_config(&build_args(&["a.sl", "b.sl", "-t", "jvm", "--class-name", "Main"])).unwrap_err();
        assert_eq!(err.exit_code, ExitCode::USAGE);
    }

    #[test]
    fn test_zero_jobs_is_a_usage_error() {
        let err = build_config(&build_args(&["a.sl", "-t", "jvm", "-j", "0"])).unwrap_err();
        assert_eq!(err.exit_code, ExitCode::USAGE);
    }

    #[test]
    fn test_render_plain_reports() {
        let units = vec![unit("ok.sl", "val x = 1"), unit("bad.sl", "val x = 1\nval z = y")];
        let out = render_reports(&units, OutputFormat::Plain, false).unwrap();
        assert_eq!(
            out,
            "bad.sl:2:9: error[E0004]: cannot find `y` in this scope\n  = hint: did you forget to declare it with `val` or `var`?\n"
        );
    }

    #[test]
    fn test_render_json_merges_units() {
        let units = vec![unit("a.sl", "val z = y"), unit("b.sl", "val w = q")];
        let out = render_reports(&units, FormatArg::Json.into(), false).unwrap();
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0]["file"], "a.sl");
        assert_eq!(parsed[1]["code"], "E0004");
        assert_eq!(parsed[1]["line"], 1);
        assert_eq!(parsed[1]["column"], 9);
    }

    #[test]
    fn test_no_diagnostics_renders_nothing() {
        let units = vec![unit("ok.sl", "val x = 1")];
        assert_eq!(render_reports(&units, OutputFormat::Json, false).unwrap(), "");
        assert_eq!(render_reports(&units, OutputFormat::Plain, false).unwrap(), "");
    }
}
