/// Parse a token stream into an AST [`Program`], recording syntax errors into `diagnostics`.
///
/// This is the main public entrypoint for parsing. The returned program is complete when no
/// errors were recorded; otherwise it holds whatever could be recovered.
///
/// ## Parameters
/// - `tokens`: Token stream produced by `starlight_syntax::lexer`.
#[tracing::instrument(skip_all, fields(token_count = tokens.len()))]
pub fn parse(tokens: &[Token], diagnostics: &mut Diagnostics) -> Program {
    let mark = diagnostics.len();
    let (program, errors) = Parser::new(tokens).parse();
    tracing::debug!(
        declarations = program.declarations.len(),
        errors = errors.len(),
        "parsed"
    );
    diagnostics.extend(errors);
    diagnostics.sort_stage(mark);
    program
}

/// Parse a token stream, failing if any syntax error was found.
///
/// ## Errors
/// Returns every syntax error, in source order.
pub fn parse_tokens(tokens: &[Token]) -> Result<Program, Vec<Diagnostic>> {
    let mut diagnostics = Diagnostics::new();
    let program = parse(tokens, &mut diagnostics);
    if diagnostics.has_errors() {
        Err(diagnostics.into_vec())
    } else {
        Ok(program)
    }
}

/// Lex and parse `source` in one step.
///
/// ## Errors
/// Returns lexical and syntax errors, lexical ones first.
pub fn parse_source(source: &str) -> Result<Program, Vec<Diagnostic>> {
    let mut diagnostics = Diagnostics::new();
    let tokens = lexer::tokenize(source, &mut diagnostics);
    let program = parse(&tokens, &mut diagnostics);
    if diagnostics.has_errors() {
        Err(diagnostics.into_vec())
    } else {
        Ok(program)
    }
}
