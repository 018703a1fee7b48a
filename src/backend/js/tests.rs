//! JavaScript backend unit tests.

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

fn js(source: &str) -> String {
    JsBackend::default()
        .generate(&unit(source))
        .unwrap_or_else(|err| panic!("generation failed: {err}"))
}

fn assert_contains(js: &str, needle: &str) {
    assert!(js.contains(needle), "missing `{needle}` in:\n{js}");
}

#[test]
fn test_greet_function() {
    let out = js("fun greet(name: string) -> string { return \"Hello, \" + name }");
    assert_eq!(
        out,
        "\"use strict\";\n\nfunction greet(name) {\n    return (\"Hello, \" + name);\n}\n"
    );
}

#[test]
fn test_strict_header_is_optional() {
    let out = JsBackend::new(false).generate(&unit("val x = 1")).unwrap();
    assert_eq!(out, "const x = 1;\n");
}

#[test]
fn test_output_file_name() {
    assert_eq!(JsBackend::default().output_file_name(&unit("val x = 1")), "Main.js");
}

#[test]
fn test_data_class_equality() {
    let out = js("data Point(x: int, y: int)\nval p = Point(1, 2)\nprintln(p == Point(1, 2))");
    assert_contains(&out, "class Point {");
    assert_contains(&out, "constructor(x, y) {");
    assert_contains(&out, "this.x = x;");
    assert_contains(
        &out,
        "return other instanceof Point && $eq(this.x, other.x) && $eq(this.y, other.y);",
    );
    assert_contains(&out, "return \"Point(\" + \"x=\" + this.x + \", \" + \"y=\" + this.y + \")\";");
    assert_contains(&out, "const p = new Point(1, 2);");
    assert_contains(&out, "console.log($eq(p, new Point(1, 2)));");
    assert_contains(&out, "function $eq(a, b) {");
}

#[test]
fn test_integer_division_truncates() {
    let out = js("fun half(n: int) = n / 2\nfun ratio(d: double) = d / 2");
    assert_contains(&out, "return Math.trunc(n / 2);");
    assert_contains(&out, "return (d / 2);");
}

#[test]
fn test_match_expression_is_invoked_arrow() {
    let out = js("fun describe(n: int) = match n {\n    0 => \"zero\"\n    _ => \"many\"\n}");
    assert_contains(&out, "return (() => {\n        const $s0 = n;");
    assert_contains(&out, "if ($s0 === 0) {\n            return \"zero\";\n        }");
    assert_contains(&out, "return \"many\";\n    })();");
    assert!(!out.contains("no match arm matched"), "{out}");
}

#[test]
fn test_match_statement_is_labeled_block() {
    let source = r#"
fun show(n: int) {
    match n {
        0 => println("zero")
        k: int => println(k)
    }
}
"#;
    let out = js(source);
    assert_contains(&out, "$match0: {");
    assert_contains(&out, "const $s1 = n;");
    assert_contains(&out, "console.log(\"zero\");\n            break $match0;");
    assert_contains(&out, "const k = $s1;\n        console.log(k);");
}

#[test]
fn test_async_functions() {
    let out = js("fun g() = 1\nasync fun h() = await g()");
    assert_contains(&out, "async function h() {");
    assert_contains(&out, "return (await g());");
}

#[test]
fn test_safe_call_binds_receiver_once() {
    let out = js("fun f(s: string?) = s?.length()\nfun g(s: string?) = s!!.length()");
    assert_contains(&out, "(($r0) => $r0 == null ? null : $r0.length)(s)");
    assert_contains(&out, "$nn(s).length");
    assert_contains(&out, "function $nn(value) {");
}

#[test]
fn test_collections_and_members() {
    let out = js("val m = {\"a\": 1}\nval xs = [1, 2]\nval n = xs.size() + m.size()\nval a = m[\"a\"]");
    assert_contains(&out, "const m = new Map([[\"a\", 1]]);");
    assert_contains(&out, "const xs = [1, 2];");
    assert_contains(&out, "const n = (xs.length + m.size);");
    assert_contains(&out, "const a = (m.get(\"a\") ?? null);");
}

#[test]
fn test_extension_function() {
    let out = js("extend string { fun shout() = this + \"!\" }\nval s = \"hi\".shout()");
    assert_contains(&out, "function string_shout(self) {\n    return (self + \"!\");\n}");
    assert_contains(&out, "const s = string_shout(\"hi\");");
}

#[test]
fn test_user_main_runs_last() {
    let out = js("val greeting = \"hi\"\nfun main() { println(greeting) }");
    assert!(out.ends_with("const greeting = \"hi\";\n\nmain();\n"), "{out}");
    assert_contains(&out, "console.log(greeting);");
}

#[test]
fn test_class_with_body_fields() {
    let source = "class Counter(start: int) {\n    var count: int = start\n    fun bump() { count += 1 }\n}";
    let out = js(source);
    assert_contains(&out, "constructor(start) {\n        this.start = start;\n        this.count = this.start;\n    }");
    assert_contains(&out, "bump() {\n        this.count += 1;\n    }");
}

#[test]
fn test_collections_print_like_java() {
    let out = js("val m = {\"a\": 1}\nval xs = [1, 2]\nprintln(m)\nprint(xs)\nval s = toString(xs)\nprintln(1)");
    assert_contains(&out, "console.log($str(m));");
    assert_contains(&out, "process.stdout.write($str(xs));");
    assert_contains(&out, "const s = $str(xs);");
    assert_contains(&out, "console.log(1);");
    assert_contains(&out, "function $str(value) {");
    assert_contains(&out, "return \"{\" + Array.from(value, ([k, v]) => $str(k) + \"=\" + $str(v)).join(\", \") + \"}\";");
}

#[test]
fn test_str_helper_only_when_needed() {
    let out = js("val n = 2\nprintln(n)\nprint(\"x\")");
    assert_contains(&out, "process.stdout.write(String(\"x\"));");
    assert!(!out.contains("function $str"), "{out}");
}
