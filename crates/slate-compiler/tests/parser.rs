mod common;

use common::{check_ok, kinds, options, tree};
use slate_compiler::env::Binding;
use slate_compiler::error::DiagnosticLog;
use slate_compiler::{lexer, CompilationContext, DiagnosticKind, Parser, ValueType};

#[test]
fn binding_with_body() {
    assert_eq!(tree("let x = 3 :: x + 2"), "(let x 3 (+ x 2))");
    assert_eq!(tree("define x: integer = 3 :: x"), "(let x 3 x)");
}

#[test]
fn binding_terminator_may_end_a_line() {
    let src = "let a = 4 ::\nlet b = a * 2 ::\nb - a\n";
    assert_eq!(tree(src), "(let a 4 (let b (* a 2) (- b a)))");
}

#[test]
fn binding_expression_cannot_see_its_own_name() {
    assert_eq!(kinds("let x = x + 1 :: x"), vec![DiagnosticKind::UndefinedVariable { name: "x".into() }]);
}

#[test]
fn conditional_chain() {
    assert_eq!(tree("if 1 < 2 { 1 } elif false { 2 } else { 3 }"), "(if (< 1 2) {1} (if false {2} {3}))");
    assert_eq!(tree("if true { 1 }"), "(if true {1})");
    assert_eq!(tree("if true {\n  1\n}\nelse {\n  2\n}"), "(if true {1} {2})");
}

#[test]
fn calls_keep_argument_order() {
    assert_eq!(tree("print(1 + 2)"), "(print (+ 1 2))");
    assert_eq!(tree("print((1))"), "(print 1)");
}

#[test]
fn multi_statement_program() {
    let src = "let a = 4 ::\nlet b = a * 2 ::\nif b > a {\n  print(b)\n} else {\n  print(a)\n}\nb\n";
    let p = check_ok(src);
    assert_eq!(p.stmts.len(), 1);
    assert_eq!(p.stmts[0].sexpr(), "(let a 4 (let b (* a 2) (if (> b a) {(print b)} {(print a)}) b))");
}

#[test]
fn block_bindings_are_gone_after_the_block() {
    assert_eq!(kinds("{ let y = 1 :: y }\ny"), vec![DiagnosticKind::UndefinedVariable { name: "y".into() }]);
    check_ok("let y = 1 :: { y }\ny");
}

#[test]
fn inner_scope_may_shadow() {
    assert_eq!(tree("let x = 1 :: { let x = true :: x }"), "(let x 1 {(let x true x)})");
}

#[test]
fn duplicate_binding_keeps_first() {
    let src = "let x = 1 :: let x = true :: x";
    let mut ctx = CompilationContext::new(options());
    let tokens = lexer::tokenize(src, &ctx.options.clone(), &mut ctx.log);
    let program = Parser::new(tokens, &mut ctx).parse_program();
    assert_eq!(program.stmts.len(), 1);
    assert_eq!(ctx.env.lookup("x"), Some(Binding { offset: 0, ty: ValueType::Integer }));
    let found: Vec<DiagnosticKind> = std::mem::take(&mut ctx.log).into_vec().into_iter().map(|d| d.kind).collect();
    assert_eq!(found, vec![DiagnosticKind::DuplicateBinding { name: "x".into() }]);
}

#[test]
fn context_starts_empty() {
    let ctx = CompilationContext::default();
    assert!(ctx.log.is_empty());
    assert_eq!(ctx.env.lookup("x"), None);
    assert!(ctx.env.is_function("print"));
    let log = DiagnosticLog::new();
    assert_eq!(log.len(), 0);
}

#[test]
fn declared_type_is_checked() {
    assert_eq!(
        kinds("let x: boolean = 1 :: x"),
        vec![DiagnosticKind::BindingTypeMismatch { expected: ValueType::Boolean, found: ValueType::Integer }]
    );
    check_ok("let x: integer = 1 :: x");
    check_ok("let b: boolean = 1 < 2 :: b");
    assert_eq!(kinds("let x: float = 1 :: x"), vec![DiagnosticKind::UnknownType { name: "float".into() }]);
}

#[test]
fn mismatched_binding_does_not_cascade() {
    // `x` is registered with its inferred type, so the use below is fine
    assert_eq!(kinds("let x: boolean = 1 :: x + 1").len(), 1);
}

#[test]
fn malformed_bindings() {
    let found = kinds("let = 1");
    assert_eq!(found[0], DiagnosticKind::ExpectedToken { expected: "variable to bind", found: "\"=\"".into() });

    let found = kinds("let x 1");
    assert_eq!(found[0], DiagnosticKind::ExpectedToken { expected: "binding assignment operator \"=\"", found: "\"1\"".into() });

    assert_eq!(
        kinds("let x = 1 x"),
        vec![DiagnosticKind::ExpectedToken { expected: "binding terminator \"::\"", found: "\"x\"".into() }]
    );
    assert_eq!(kinds("let x ="), vec![DiagnosticKind::UnexpectedTermination { construct: "binding" }]);
}

#[test]
fn malformed_binding_header_is_reported_once() {
    // `=-` lexes as one operator
    assert_eq!(
        kinds("let x=-1 :: x"),
        vec![DiagnosticKind::ExpectedToken { expected: "binding assignment operator \"=\"", found: "\"=-\"".into() }]
    );
    assert_eq!(kinds("let x 1\nx + 1").len(), 1);
    assert_eq!(kinds("let 5 = 1 :: 2").len(), 1);
}

#[test]
fn long_binding_runs_nest_without_recursing() {
    let mut src: String = (0..5_000).map(|i| format!("let v{i} = {i} ::\n")).collect();
    src.push_str("v0 + v4999");
    let p = check_ok(&src);
    assert_eq!(p.stmts.len(), 1);
    assert!(p.stmts[0].sexpr().contains("(let v4999 4999 (+ v0 v4999))"));
}

#[test]
fn unexpected_tokens_are_skipped() {
    assert_eq!(kinds("else 1"), vec![DiagnosticKind::UnexpectedToken { found: "\"else\"".into() }]);
    assert_eq!(kinds(", 1"), vec![DiagnosticKind::UnexpectedToken { found: "\",\"".into() }]);
    assert_eq!(kinds("1 = 2"), vec![DiagnosticKind::UnexpectedToken { found: "\"=\"".into() }]);
}

#[test]
fn unmatched_braces() {
    assert_eq!(kinds("1 }"), vec![DiagnosticKind::UnmatchedGrouper { text: "}".into() }]);
    assert_eq!(kinds("{ 1"), vec![DiagnosticKind::UnmatchedGrouper { text: "{".into() }]);
}

#[test]
fn conditional_needs_condition_and_block() {
    assert_eq!(kinds("if { 1 }"), vec![DiagnosticKind::ExpectedToken { expected: "condition", found: "\"{\"".into() }]);
    assert_eq!(kinds("if true 1"), vec![DiagnosticKind::ExpectedToken { expected: "\"{\"", found: "\"1\"".into() }]);
}

#[test]
fn call_errors() {
    assert_eq!(
        kinds("print(1, 2)"),
        vec![DiagnosticKind::ArityMismatch { name: "print".into(), expected: 1, found: 2 }]
    );
    assert_eq!(kinds("print()"), vec![DiagnosticKind::ArityMismatch { name: "print".into(), expected: 1, found: 0 }]);
    assert_eq!(kinds("foo(1)"), vec![DiagnosticKind::UnknownFunction { name: "foo".into() }]);
    assert_eq!(kinds("print(1"), vec![DiagnosticKind::UnmatchedGrouper { text: "(".into() }]);
}

#[test]
fn report_lists_every_diagnostic_with_position() {
    let failure = common::check_err("let x = y ::\nz");
    let report = failure.report();
    assert!(report.contains("[test.slate @ 1.9] :: undefined variable y"), "{report}");
    assert!(report.contains("[test.slate @ 2.1] :: undefined variable z"), "{report}");
    assert!(report.ends_with("2 error(s)\n"));
    assert_eq!(failure.to_string(), "compilation failed with 2 error(s)");
}
