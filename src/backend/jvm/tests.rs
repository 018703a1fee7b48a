//! Java backend unit tests.

use super::*;
use crate::frontend::diagnostics::Diagnostics;
use crate::frontend::{parser, resolver, typechecker};

fn unit(source: &str) -> TypedUnit {
    let mut program = parser::parse_source(source).unwrap_or_else(|errs| panic!("parse failed: {errs:#?}"));
    let mut diags = Diagnostics::new();
    let mut symbols = resolver::resolve(&mut program, &mut diags);
    typechecker::typecheck(&mut program, &mut symbols, &mut diags);
    assert!(!diags.has_errors(), "unexpected diagnostics: {diags:#?}");
    TypedUnit {
        name: "Main".to_string(),
        program,
        symbols,
    }
}

fn java(source: &str) -> String {
    JvmBackend::default()
        .generate(&unit(source))
        .unwrap_or_else(|err| panic!("generation failed: {err}"))
}

fn assert_contains(java: &str, needle: &str) {
    assert!(java.contains(needle), "missing `{needle}` in:\n{java}");
}

#[test]
fn test_greet_is_a_static_method() {
    let out = java("fun greet(name: string) -> string { return \"Hello, \" + name }");
    assert!(out.starts_with("public class Main {\n"), "{out}");
    assert_contains(&out, "public static String greet(String name) {");
    assert_contains(&out, "(\"Hello, \" + name)");
    assert_contains(&out, "public static void main(String[] $args) {");
}

#[test]
fn test_default_parameters_become_overloads() {
    let out = java("fun greet(name: string, punct: string = \"!\") = name + punct");
    assert_contains(&out, "public static String greet(String name, String punct) {");
    assert_contains(&out, "public static String greet(String name) {");
    assert_contains(&out, "return greet(name, \"!\");");
}

#[test]
fn test_globals_are_static_fields_assigned_in_main() {
    let out = java("val answer = 42\nfun main() { println(answer) }");
    assert_contains(&out, "private static int answer;");
    assert_contains(&out, "Main.answer = 42;");
    assert_contains(&out, "System.out.println(Main.answer);");
    assert!(out.contains("        main();\n"), "{out}");
}

#[test]
fn test_data_class_members() {
    let out = java("data Point(x: int, y: int)\nfun sum(p: Point) = p.x + p.y");
    assert_contains(&out, "public static final class Point {");
    assert_contains(&out, "private final int x;");
    assert_contains(&out, "public Point(int x, int y) {");
    assert_contains(&out, "public int getX() {");
    assert_contains(&out, "return \"Point(\" + \"x=\" + this.x + \", \" + \"y=\" + this.y + \")\";");
    assert_contains(&out, "java.util.Objects.hash(this.x, this.y)");
    assert_contains(&out, "(p.getX() + p.getY())");
}

#[test]
fn test_class_fields_and_interface() {
    let source = r#"
interface Shape { fun area() -> double }
class Square(side: double) : Shape {
    var label: string = "square"
    fun area() -> double = side * side
}
"#;
    let out = java(source);
    assert_contains(&out, "public interface Shape {");
    assert_contains(&out, "double area();");
    assert_contains(&out, "public static class Square implements Shape {");
    assert_contains(&out, "public final double side;");
    assert_contains(&out, "public String label;");
    assert_contains(&out, "this.label = \"square\";");
    assert_contains(&out, "return (this.side * this.side);");
}

#[test]
fn test_extension_takes_receiver_as_self() {
    let out = java("extend string { fun shout() = this + \"!\" }\nval s = \"hi\".shout()");
    assert_contains(&out, "public static String string_shout(String self) {");
    assert_contains(&out, "return (self + \"!\");");
    assert_contains(&out, "string_shout(\"hi\")");
}

#[test]
fn test_match_becomes_labeled_block() {
    let source = r#"
data P(a: int, b: int)
fun sum(p: P) = match p {
    P(x, y) if x > y => x - y
    {x, y} => x + y
}
"#;
    let out = java(source);
    assert_contains(&out, "int $m0;");
    assert_contains(&out, "$match0: {");
    assert_contains(&out, "final P $s0 = p;");
    assert_contains(&out, "final int x = $s0.getA();");
    assert_contains(&out, "break $match0;");
    assert_contains(&out, "return $m0;");
    assert!(!out.contains("IllegalStateException"), "last arm matches everything:\n{out}");
}

#[test]
fn test_non_exhaustive_match_throws() {
    let out = java("fun describe(n: int) = match n {\n    0 => \"zero\"\n    1 => \"one\"\n}");
    assert_contains(&out, "if ($s0 == 0) {");
    assert_contains(&out, "throw new IllegalStateException(\"no match arm matched\");");
}

#[test]
fn test_shadowed_locals_get_unique_names() {
    let out = java("fun f(x: int) -> int {\n    if x > 0 {\n        val x = 2\n        return x\n    }\n    return x\n}");
    assert_contains(&out, "final int x_1 = 2;");
    assert_contains(&out, "return x_1;");
}

#[test]
fn test_async_is_unsupported() {
    let err = JvmBackend::default()
        .generate(&unit("fun g() = 1\nasync fun h() = await g()"))
        .unwrap_err();
    let EmitError::Unsupported { target, construct, .. } = err;
    assert_eq!(target, Target::Jvm);
    assert!(construct.contains("async"), "{construct}");
}

#[test]
fn test_capturing_var_in_lambda_is_unsupported() {
    let source = "fun f() {\n    var n = 0\n    val g = () => n + 1\n    println(g())\n}";
    let err = JvmBackend::default().generate(&unit(source)).unwrap_err();
    assert!(err.to_string().contains("JVM"), "{err}");
}

#[test]
fn test_class_name_override_names_the_file() {
    let backend = JvmBackend::new(Some("hello-world".to_string()));
    let unit = unit("val x = 1");
    assert_eq!(backend.output_file_name(&unit), "hello_world.java");
    let out = backend.generate(&unit).unwrap();
    assert!(out.starts_with("public class hello_world {"), "{out}");
}

#[test]
fn test_int_literals_stay_within_java_int() {
    let out = java("val big = 2147483647\nval bigger = 3000000000L");
    assert_contains(&out, "2147483647;");
    assert_contains(&out, "3000000000L;");

    let config = crate::config::CompilerConfig::new().with_target(Target::Jvm);
    let compilation = crate::compiler::compile_source("Big", "val x = 3000000000\nprintln(x)\n", &config).unwrap();
    assert!(compilation.has_errors());
    assert!(compilation.output(Target::Jvm).is_none());
}
