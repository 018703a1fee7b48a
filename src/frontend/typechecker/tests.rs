//! Typechecker unit tests.

use super::*;
use crate::frontend::diagnostics::DiagnosticKind;
use crate::frontend::{parser, resolver};

fn check_source(source: &str) -> (Program, SymbolTable, Diagnostics) {
    let mut program = parser::parse_source(source).unwrap_or_else(|errs| panic!("parse failed: {errs:#?}"));
    let mut diags = Diagnostics::new();
    let mut symbols = resolver::resolve(&mut program, &mut diags);
    typecheck(&mut program, &mut symbols, &mut diags);
    (program, symbols, diags)
}

fn kinds(diags: &Diagnostics) -> Vec<DiagnosticKind> {
    diags.iter().map(|d| d.kind).collect()
}

fn assert_clean(diags: &Diagnostics) {
    assert!(diags.is_empty(), "unexpected diagnostics: {diags:#?}");
}

/// Resolved type of the top-level `val`/`var` called `name`.
fn global_type(program: &Program, name: &str) -> Type {
    global(program, name)
        .resolved
        .clone()
        .unwrap_or_else(|| panic!("`{name}` has no resolved type"))
}

fn global<'p>(program: &'p Program, name: &str) -> &'p VarDecl {
    program
        .declarations
        .iter()
        .find_map(|d| match &d.node {
            Declaration::Statement(Statement::Var(var)) if var.name == name => Some(var),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no global `{name}`"))
}

fn function<'p>(program: &'p Program, name: &str) -> &'p FunctionDecl {
    program
        .declarations
        .iter()
        .find_map(|d| match &d.node {
            Declaration::Function(f) if f.name == name => Some(f),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no function `{name}`"))
}

// ========================================
// Operators and widening
// ========================================

#[test]
fn test_numeric_widening() {
    let (program, _, diags) = check_source("val a = 1 + 2.0\nval b = 1 + 2.0f\nval c = 1L * 2\nval d = 7 % 2");
    assert_clean(&diags);
    assert_eq!(global_type(&program, "a"), Type::double());
    assert_eq!(global_type(&program, "b"), Type::float());
    assert_eq!(global_type(&program, "c"), Type::long());
    assert_eq!(global_type(&program, "d"), Type::int());
}

#[test]
fn test_string_concatenation() {
    let (program, _, diags) = check_source("val s = \"a\" + 1\nval t = 2.5 + \"b\"");
    assert_clean(&diags);
    assert_eq!(global_type(&program, "s"), Type::string());
    assert_eq!(global_type(&program, "t"), Type::string());
}

#[test]
fn test_invalid_operands() {
    let (_, _, diags) = check_source("val x = true - 1\nval y = !5");
    assert_eq!(kinds(&diags), vec![DiagnosticKind::TypeMismatch, DiagnosticKind::TypeMismatch]);
}

#[test]
fn test_comparison_and_logic_are_boolean() {
    let (program, _, diags) = check_source("val a = 1 < 2.5 && \"x\" == \"y\"\nval b = 'a' <= 'b' || false");
    assert_clean(&diags);
    assert_eq!(global_type(&program, "a"), Type::boolean());
    assert_eq!(global_type(&program, "b"), Type::boolean());
}

#[test]
fn test_unresolved_operand_does_not_cascade() {
    let (_, _, diags) = check_source("fun f() = missing + 1\nfun g() = f() * 2");
    assert_eq!(kinds(&diags), vec![DiagnosticKind::UnresolvedIdentifier]);
}

// ========================================
// Calls and inference
// ========================================

#[test]
fn test_arity_mismatch_reported_once_and_siblings_checked() {
    let source = r#"
fun add(a: int, b: int) = a + b
fun main() {
    add(1, 2, 3)
    val s: int = "x"
    println(s)
}
"#;
    let (_, _, diags) = check_source(source);
    assert_eq!(diags.count_of(DiagnosticKind::ArityMismatch), 1);
    assert_eq!(diags.count_of(DiagnosticKind::TypeMismatch), 1);
    let arity = diags.iter().find(|d| d.kind == DiagnosticKind::ArityMismatch).unwrap();
    assert!(arity.message.contains("`add` takes 2 argument"), "{}", arity.message);
}

#[test]
fn test_default_parameters_may_be_omitted() {
    let (_, _, diags) = check_source("fun greet(name: string, punct: string = \"!\") = name + punct\nval a = greet(\"x\")\nval b = greet(\"x\", \"?\")");
    assert_clean(&diags);
    let (_, _, diags) = check_source("fun greet(name: string, punct: string = \"!\") = name + punct\nval a = greet()");
    assert_eq!(kinds(&diags), vec![DiagnosticKind::ArityMismatch]);
    assert_eq!(diags.as_slice()[0].notes.len(), 1);
}

#[test]
fn test_argument_type_mismatch() {
    let (_, _, diags) = check_source("fun twice(n: int) = n * 2\nval x = twice(\"no\")");
    assert_eq!(kinds(&diags), vec![DiagnosticKind::TypeMismatch]);
}

#[test]
fn test_forward_call_sees_inferred_return() {
    let (program, _, diags) = check_source("fun a() = b() + 1\nfun b() = 41");
    assert_clean(&diags);
    assert_eq!(function(&program, "a").resolved_return, Some(Type::int()));
}

#[test]
fn test_recursive_inference() {
    let (program, _, diags) = check_source("fun fact(n: int) = n <= 1 ? 1 : n * fact(n - 1)");
    assert_clean(&diags);
    assert_eq!(function(&program, "fact").resolved_return, Some(Type::int()));
}

#[test]
fn test_return_inference_widens_and_unions() {
    let source = r#"
fun pick(flag: boolean) {
    if flag { return 1 }
    return 2.5
}
fun mixed(flag: boolean) {
    if flag { return 1 }
    return "one"
}
fun nothing() { println("hi") }
"#;
    let (program, _, diags) = check_source(source);
    assert_clean(&diags);
    assert_eq!(function(&program, "pick").resolved_return, Some(Type::double()));
    assert_eq!(
        function(&program, "mixed").resolved_return,
        Some(Type::union([Type::int(), Type::string()]))
    );
    assert_eq!(function(&program, "nothing").resolved_return, Some(Type::void()));
}

#[test]
fn test_declared_return_checked_on_every_path() {
    let (_, _, diags) = check_source("fun f(x: int) -> int {\n    if x > 0 { return 1 }\n}");
    assert_eq!(kinds(&diags), vec![DiagnosticKind::TypeMismatch]);
    assert!(diags.as_slice()[0].message.contains("every path"));

    let (_, _, diags) = check_source("fun f() -> int { return \"s\" }");
    assert_eq!(kinds(&diags), vec![DiagnosticKind::TypeMismatch]);
}

#[test]
fn test_constructor_calls() {
    let (program, _, diags) = check_source("data Point(x: int, y: int)\nval p = Point(1, 2)\nval bad = Point(1)");
    assert_eq!(kinds(&diags), vec![DiagnosticKind::ArityMismatch]);
    assert_eq!(global_type(&program, "p"), Type::named("Point"));
}

#[test]
fn test_lambda_parameters_from_context() {
    let source = "val inc: (int) -> int = x => x + 1\nfun apply(f: (int) -> int, v: int) = f(v)\nval r = apply(n => n * 3, 2)";
    let (program, _, diags) = check_source(source);
    assert_clean(&diags);
    assert_eq!(global_type(&program, "r"), Type::int());
}

// ========================================
// Variables and assignment
// ========================================

#[test]
fn test_immutable_assignment() {
    let source = r#"
fun f(p: int) {
    val x = 1
    x = 2
    p += 1
    var y = 1
    y += 2
    println(x + y)
}
"#;
    let (_, _, diags) = check_source(source);
    assert_eq!(
        kinds(&diags),
        vec![DiagnosticKind::ImmutableAssignment, DiagnosticKind::ImmutableAssignment]
    );
}

#[test]
fn test_header_fields_are_immutable() {
    let source = "class Box(size: int) {\n    var label: string = \"box\"\n    fun grow() { size = 2; label = \"big\" }\n}";
    let (_, _, diags) = check_source(source);
    assert_eq!(kinds(&diags), vec![DiagnosticKind::ImmutableAssignment]);
}

#[test]
fn test_empty_literal_needs_context() {
    let (program, _, diags) = check_source("val xs = []\nval ys: List<int> = []\nval m: Map<string, int> = {}");
    assert_eq!(kinds(&diags), vec![DiagnosticKind::InferenceFailure]);
    assert_eq!(global_type(&program, "ys"), Type::list(Type::int()));
}

#[test]
fn test_list_and_map_literals_widen() {
    let (program, _, diags) = check_source("val xs = [1, 2.5]\nval m = {\"a\": 1, \"b\": 2L}");
    assert_clean(&diags);
    assert_eq!(global_type(&program, "xs"), Type::list(Type::double()));
    assert_eq!(global_type(&program, "m"), Type::map(Type::string(), Type::long()));
}

#[test]
fn test_null_needs_nullable_target() {
    let (_, _, diags) = check_source("val a: string? = null\nval b: string = null\nval c = null");
    assert_eq!(
        kinds(&diags),
        vec![DiagnosticKind::TypeMismatch, DiagnosticKind::InferenceFailure]
    );
}

// ========================================
// Members and null safety
// ========================================

#[test]
fn test_nullable_receiver_requires_safe_call() {
    let (_, _, diags) = check_source("fun f(s: string?) = s.length()");
    assert_eq!(kinds(&diags), vec![DiagnosticKind::TypeMismatch]);
    assert!(!diags.as_slice()[0].hints.is_empty());

    let (program, _, diags) = check_source("fun f(s: string?) = s?.length()\nfun g(s: string?) = s!!.length()");
    assert_clean(&diags);
    assert_eq!(function(&program, "f").resolved_return, Some(Type::nullable(Type::int())));
    assert_eq!(function(&program, "g").resolved_return, Some(Type::int()));
}

#[test]
fn test_builtin_members_and_indexing() {
    let source = "val xs = [1, 2]\nval n = xs.size()\nval first = xs[0]\nval m = {\"k\": 1}\nval v = m[\"k\"]\nval c = \"abc\"[1]";
    let (program, _, diags) = check_source(source);
    assert_clean(&diags);
    assert_eq!(global_type(&program, "n"), Type::int());
    assert_eq!(global_type(&program, "first"), Type::int());
    assert_eq!(global_type(&program, "v"), Type::nullable(Type::int()));
    assert_eq!(global_type(&program, "c"), Type::char());
}

#[test]
fn test_unknown_member() {
    let (_, _, diags) = check_source("data P(a: int)\nval p = P(1)\nval q = p.b\nval r = \"s\".nope()");
    assert_eq!(
        kinds(&diags),
        vec![DiagnosticKind::UnresolvedIdentifier, DiagnosticKind::UnresolvedIdentifier]
    );
}

#[test]
fn test_extension_methods() {
    let (program, _, diags) = check_source("extend string { fun shout() = this + \"!\" }\nval s = \"hi\".shout()");
    assert_clean(&diags);
    assert_eq!(global_type(&program, "s"), Type::string());
}

// ========================================
// Interfaces, match, async
// ========================================

#[test]
fn test_interface_conformance() {
    let source = r#"
interface Shape { fun area() -> double }
class Square(side: double) : Shape {
    fun area() -> double = side * side
}
class Blob : Shape {}
val s: Shape = Square(2.0)
"#;
    let (_, _, diags) = check_source(source);
    assert_eq!(kinds(&diags), vec![DiagnosticKind::TypeMismatch]);
    assert!(diags.as_slice()[0].message.contains("Blob"), "{}", diags.as_slice()[0].message);
}

#[test]
fn test_match_patterns() {
    let source = r#"
data P(a: int, b: int)
fun sum(p: P) = match p {
    P(x, y) if x > y => x - y
    {x, y} => x + y
}
fun describe(n: int) = match n {
    0 => "zero"
    k: int => "other"
}
"#;
    let (program, _, diags) = check_source(source);
    assert_clean(&diags);
    assert_eq!(function(&program, "sum").resolved_return, Some(Type::int()));
    assert_eq!(function(&program, "describe").resolved_return, Some(Type::string()));
}

#[test]
fn test_constructor_pattern_arity() {
    let (_, _, diags) = check_source("data P(a: int, b: int)\nfun f(p: P) = match p {\n    P(x) => x\n    _ => 0\n}");
    assert_eq!(kinds(&diags), vec![DiagnosticKind::ArityMismatch]);
}

#[test]
fn test_await_outside_async() {
    let (_, _, diags) = check_source("fun g() = 1\nfun f() = await g()\nasync fun h() = await g()");
    assert_eq!(kinds(&diags), vec![DiagnosticKind::InvalidContext]);
}

// ========================================
// Desugaring
// ========================================

#[test]
fn test_comprehension_becomes_block() {
    let (program, _, diags) = check_source("val xs = [1, 2, 3]\nval ys = [x * 2 | for x in xs if x > 1]");
    assert_clean(&diags);
    let ys = global(&program, "ys");
    assert_eq!(ys.resolved, Some(Type::list(Type::int())));
    let init = ys.init.as_ref().unwrap();
    let ExprKind::Block(block) = &init.kind else { panic!("expected block, got {:?}", init.kind) };
    assert_eq!(block.statements.len(), 2);
    assert!(matches!(block.statements[0].node, Statement::Var(_)));
    let Statement::ForIn(looped) = &block.statements[1].node else { panic!("expected for-in") };
    assert_eq!(looped.element, Some(Type::int()));
    assert!(matches!(looped.body.statements[0].node, Statement::If(_)));
    assert!(matches!(block.value.as_ref().map(|v| &v.kind), Some(ExprKind::Ident(_))));
}

#[test]
fn test_template_becomes_concatenation() {
    let (program, _, diags) = check_source("val name = \"a\"\nval s = \"hi ${name}!\"");
    assert_clean(&diags);
    let init = global(&program, "s").init.as_ref().unwrap();
    let ExprKind::Binary(outer) = &init.kind else { panic!("expected +") };
    assert_eq!(outer.op, BinaryOp::Add);
    assert_eq!(init.ty, Some(Type::string()));
}
