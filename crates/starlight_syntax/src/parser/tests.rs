#[cfg(test)]
/// Parser unit tests.
///
/// These tests focus on correctness of specific syntactic forms, semicolon inference and
/// the parser's error recovery behavior (avoiding cascaded errors).
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> Program {
        parse_source(source).unwrap_or_else(|errs| panic!("parse failed: {errs:#?}"))
    }

    fn parse_err(source: &str) -> Vec<Diagnostic> {
        parse_source(source).expect_err("expected syntax errors")
    }

    fn only_stmt(program: &Program) -> &Statement {
        match &program.declarations[0].node {
            Declaration::Statement(s) => s,
            other => panic!("expected statement, got {other:?}"),
        }
    }

    fn expr_of(source: &str) -> Expression {
        let program = parse_ok(source);
        match only_stmt(&program) {
            Statement::Expr(ExprStmt { expr }) => expr.clone(),
            Statement::Var(VarDecl { init: Some(e), .. }) => e.clone(),
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_function() {
        let program = parse_ok("fun add(a: int, b: int) -> int {\n  return a + b\n}");
        match &program.declarations[0].node {
            Declaration::Function(f) => {
                assert_eq!(f.name, "add");
                assert_eq!(f.params.len(), 2);
                assert!(f.return_type.is_some());
                assert!(!f.is_async);
            }
            other => panic!("expected function, got {other:?}"),
        }
    }

    #[test]
    fn test_expression_bodied_and_async_functions() {
        let program = parse_ok("fun double(x: int) = x * 2\nasync fun load(id: int = 1) { await fetch(id) }");
        assert_eq!(program.declarations.len(), 2);
        match &program.declarations[1].node {
            Declaration::Function(f) => {
                assert!(f.is_async);
                assert!(f.params[0].default.is_some());
            }
            other => panic!("expected function, got {other:?}"),
        }
    }

    #[test]
    fn test_precedence_ladder() {
        // a = b || c && d == e < f .. g + h * -i
        let expr = expr_of("a = b || c && d == e < f + h * -i");
        let ExprKind::Assign(assign) = &expr.kind else {
            panic!("expected assignment");
        };
        let ExprKind::Binary(or) = &assign.value.kind else {
            panic!("expected ||");
        };
        assert_eq!(or.op, BinaryOp::Or);
        let ExprKind::Binary(and) = &or.right.kind else {
            panic!("expected &&");
        };
        assert_eq!(and.op, BinaryOp::And);
        let ExprKind::Binary(eq) = &and.right.kind else {
            panic!("expected ==");
        };
        assert_eq!(eq.op, BinaryOp::Eq);
        let ExprKind::Binary(lt) = &eq.right.kind else {
            panic!("expected <");
        };
        assert_eq!(lt.op, BinaryOp::Lt);
        let ExprKind::Binary(add) = &lt.right.kind else {
            panic!("expected +");
        };
        assert_eq!(add.op, BinaryOp::Add);
        let ExprKind::Binary(mul) = &add.right.kind else {
            panic!("expected *");
        };
        assert!(matches!(mul.right.kind, ExprKind::Unary(UnaryExpr { op: UnaryOp::Neg, .. })));
    }

    #[test]
    fn test_left_associativity_and_right_assoc_conditional() {
        let expr = expr_of("a - b - c");
        let ExprKind::Binary(outer) = &expr.kind else { panic!() };
        assert!(matches!(outer.left.kind, ExprKind::Binary(_)));

        let expr = expr_of("a ? b : c ? d : e");
        let ExprKind::Conditional(cond) = &expr.kind else { panic!() };
        assert!(matches!(cond.else_expr.kind, ExprKind::Conditional(_)));
    }

    #[test]
    fn test_range_binds_looser_than_additive() {
        let expr = expr_of("0..n + 1");
        let ExprKind::Range(range) = &expr.kind else { panic!("expected range") };
        assert!(matches!(range.end.kind, ExprKind::Binary(_)));
    }

    #[test]
    fn test_postfix_chain() {
        let expr = expr_of("user?.name!!.length() + xs[0]++");
        let ExprKind::Binary(add) = &expr.kind else { panic!() };
        let ExprKind::MethodCall(call) = &add.left.kind else {
            panic!("expected method call")
        };
        assert_eq!(call.method, "length");
        assert!(!call.safe);
        assert!(matches!(call.receiver.kind, ExprKind::NonNull(_)));
        assert!(matches!(add.right.kind, ExprKind::Postfix(_)));
    }

    #[test]
    fn test_semicolon_inference() {
        let program = parse_ok("val a = 1\nval b = a\n-b; println(b)");
        assert_eq!(program.declarations.len(), 4);
    }

    #[test]
    fn test_leading_dot_continues_expression() {
        let program = parse_ok("val n = items\n  .filter(x => x > 1)\n  ?.size()");
        assert_eq!(program.declarations.len(), 1);
    }

    #[test]
    fn test_line_breaks_inside_parens_are_insignificant() {
        let program = parse_ok("val total = add(\n  1,\n  2\n) + (3\n + 4)");
        assert_eq!(program.declarations.len(), 1);
    }

    #[test]
    fn test_missing_separator_is_error() {
        let errs = parse_err("val a = 1 val b = 2");
        assert_eq!(errs.len(), 1);
        assert!(errs[0].message.contains("expected `;` or a line break"));
    }

    #[test]
    fn test_if_else_chain_with_optional_parens() {
        let program = parse_ok("if (x > 1) { a() } else if x < 0 { b() } else { c() }");
        let Statement::If(stmt) = only_stmt(&program) else { panic!() };
        let Some(else_branch) = &stmt.else_branch else { panic!() };
        assert!(matches!(else_branch.node, Statement::If(_)));
    }

    #[test]
    fn test_for_forms() {
        let program = parse_ok(
            "for x in xs { println(x) }\nfor (y in 0..3) { println(y) }\nfor (var i = 0; i < 3; i++) { continue }",
        );
        assert!(matches!(program.declarations[0].node, Declaration::Statement(Statement::ForIn(_))));
        assert!(matches!(program.declarations[1].node, Declaration::Statement(Statement::ForIn(_))));
        match &program.declarations[2].node {
            Declaration::Statement(Statement::ForC(f)) => {
                assert!(f.init.is_some() && f.condition.is_some() && f.update.is_some());
            }
            other => panic!("expected C-style for, got {other:?}"),
        }
    }

    #[test]
    fn test_lambdas() {
        let expr = expr_of("val f = (a: int, b: int) -> int => a + b");
        let ExprKind::Lambda(lambda) = &expr.kind else { panic!() };
        assert_eq!(lambda.params.len(), 2);
        assert!(lambda.return_type.is_some());

        let expr = expr_of("val g = x => { return x }");
        let ExprKind::Lambda(lambda) = &expr.kind else { panic!() };
        assert!(matches!(lambda.body, LambdaBody::Block(_)));
    }

    #[test]
    fn test_collections() {
        let expr = expr_of("val m = {\"a\": 1, \"b\": 2}");
        let ExprKind::Map(map) = &expr.kind else { panic!() };
        assert_eq!(map.entries.len(), 2);

        let expr = expr_of("val sq = [x * x | for x in xs if x > 0]");
        let ExprKind::Comprehension(c) = &expr.kind else { panic!() };
        assert_eq!(c.var, "x");
        assert!(c.condition.is_some());

        let expr = expr_of("val xs = [1, 2, 3,]");
        let ExprKind::List(list) = &expr.kind else { panic!() };
        assert_eq!(list.elements.len(), 3);
    }

    #[test]
    fn test_template_expression() {
        let expr = expr_of("val s = \"Hi ${user.name}, you have ${count + 1} items\"");
        let ExprKind::Template(t) = &expr.kind else { panic!() };
        assert_eq!(t.parts.len(), 5);
        assert!(matches!(&t.parts[1], TemplatePart::Expr(e) if matches!(e.kind, ExprKind::Member(_))));
    }

    #[test]
    fn test_match_patterns() {
        let source = r#"val r = match shape {
            0 => "zero"
            -1 => "minus one"
            Circle(r) if r > 10 => "big"
            {w, h} => "rect"
            n: int => "int"
            _ => { println("other"); "other" }
        }"#;
        let expr = expr_of(source);
        let ExprKind::Match(m) = &expr.kind else { panic!() };
        assert_eq!(m.arms.len(), 6);
        assert!(matches!(m.arms[1].pattern.node, Pattern::Literal(LiteralPattern { value: Literal::Int(-1) })));
        assert!(matches!(m.arms[2].pattern.node, Pattern::Constructor(_)));
        assert!(m.arms[2].guard.is_some());
        assert!(matches!(m.arms[3].pattern.node, Pattern::Destructure(_)));
        assert!(matches!(m.arms[4].pattern.node, Pattern::Typed(_)));
        assert!(matches!(m.arms[5].pattern.node, Pattern::Wildcard));
        let ExprKind::Block(block) = &m.arms[5].body.kind else { panic!() };
        assert_eq!(block.statements.len(), 1);
        assert!(block.value.is_some());
    }

    #[test]
    fn test_class_data_interface_extension() {
        let source = r#"
interface Shape { fun area() -> double }
data Point(x: int, y: int) { fun sum() = x + y }
class Counter(start: int) : Shape {
    var count: int = start
    fun area() -> double = 0.0
}
extend string { fun shout() -> string = this + "!" }
"#;
        let program = parse_ok(source);
        assert_eq!(program.declarations.len(), 4);
        match &program.declarations[2].node {
            Declaration::Class(c) => {
                assert_eq!(c.fields.len(), 1);
                assert_eq!(c.supertypes[0].node, "Shape");
                assert_eq!(c.members.len(), 2);
            }
            other => panic!("expected class, got {other:?}"),
        }
    }

    #[test]
    fn test_types() {
        let program = parse_ok("val f: int & any | (int, string?) -> List<Map<string, int>> = g");
        let Statement::Var(var) = only_stmt(&program) else { panic!() };
        let Some(ty) = &var.ty else { panic!() };
        let TypeExpr::Union { members } = &ty.node else { panic!("expected union") };
        assert!(matches!(members[0].node, TypeExpr::Intersection { .. }));
        let TypeExpr::Function { params, ret } = &members[1].node else {
            panic!("expected function type")
        };
        assert!(matches!(params[1].node, TypeExpr::Nullable { .. }));
        assert!(matches!(&ret.node, TypeExpr::Named { name, args } if name == "List" && args.len() == 1));
    }

    #[test]
    fn test_context_errors_for_control_flow() {
        let errs = parse_err("return 1\nbreak\nfun f() { continue }");
        assert_eq!(errs.len(), 3);
        assert!(errs[0].message.contains("`return` outside of a function"));
        assert!(errs[1].message.contains("`break` outside of a loop"));
        assert!(errs[2].message.contains("`continue` outside of a loop"));
    }

    #[test]
    fn test_recovery_reports_each_broken_statement_once() {
        let errs = parse_err("fun f() {\n  val = 1\n  val ok = 2\n  val x = )\n}\nval after = 3");
        assert_eq!(errs.len(), 2, "{errs:#?}");
        assert!(errs.iter().all(|e| e.kind == crate::diagnostics::DiagnosticKind::ParseError));
        assert!(errs[0].span.start < errs[1].span.start);
    }

    #[test]
    fn test_invalid_assignment_target() {
        let errs = parse_err("f() = 1");
        assert!(errs[0].message.contains("invalid assignment target"));
    }

    #[test]
    fn test_unclosed_block_reports_once() {
        let errs = parse_err("fun f() {\n  val x = 1\n");
        assert_eq!(errs.len(), 1);
        assert!(errs[0].message.contains("unclosed"));
    }

    #[test]
    fn test_struct_enum_alias_and_pipe_forms_are_rejected() {
        for source in [
            "struct Point { x: int }",
            "enum Color { Red, Green }",
            "type Id = int;",
            "val y = x | f",
        ] {
            let errs = parse_err(source);
            assert!(
                errs[0].message.contains("expected `;` or a line break"),
                "{source}: {errs:#?}"
            );
        }
    }

    #[test]
    fn test_type_enum_and_try_are_plain_identifiers() {
        let program = parse_ok("val type = 1\nval enum = type + 1\nfun try(struct: int) = struct");
        assert_eq!(program.declarations.len(), 3);
    }

    #[test]
    fn test_empty_token_stream_does_not_panic() {
        let (program, errors) = Parser::new(&[]).parse();
        assert!(program.declarations.is_empty());
        assert!(errors.is_empty());
    }
}
