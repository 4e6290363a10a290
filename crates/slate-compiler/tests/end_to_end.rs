mod common;

use common::{compile_ok, eval, kinds, run};
use slate_compiler::{decode_value, DiagnosticKind, RuntimeValue};

fn int(n: i64) -> RuntimeValue { RuntimeValue::Integer(n) }

fn boolean(b: bool) -> RuntimeValue { RuntimeValue::Boolean(b) }

#[test]
fn binding_then_use() {
    assert_eq!(eval("let x = 3 :: x + 2"), int(5));
}

#[test]
fn conditional_picks_a_branch() {
    assert_eq!(eval("if true { 1 } else { 2 }"), int(1));
    assert_eq!(eval("if false { 1 } else { 2 }"), int(2));
    assert_eq!(eval("let n = 5 :: if n < 3 { 1 } elif n < 10 { 2 } else { 3 }"), int(2));
    assert_eq!(eval("let n = 50 :: if n < 3 { 1 } elif n < 10 { 2 } else { 3 }"), int(3));
}

#[test]
fn lone_open_paren_fails_with_one_diagnostic() {
    assert_eq!(kinds("("), vec![DiagnosticKind::UnexpectedEndOfExpression]);
}

#[test]
fn arithmetic() {
    assert_eq!(eval("1 + 2 * 3"), int(7));
    assert_eq!(eval("(1 + 2) * 3"), int(9));
    assert_eq!(eval("10 - 4 - 3"), int(3));
    assert_eq!(eval("7 / 2"), int(3));
    assert_eq!(eval("-7 / 2"), int(-3));
    assert_eq!(eval("-6 * -7"), int(42));
    assert_eq!(eval("0x10 * 0b10 + 0o7 - 0d1"), int(38));
}

#[test]
fn comparisons_yield_booleans() {
    assert_eq!(eval("2 < 3"), boolean(true));
    assert_eq!(eval("3 <= 2"), boolean(false));
    assert_eq!(eval("3 >= 3"), boolean(true));
    assert_eq!(eval("-1 > -2"), boolean(true));
    assert_eq!(eval("!(1 == 1)"), boolean(false));
    assert_eq!(eval("true != false"), boolean(true));
    assert_eq!(eval("1 + 1 == 2 == true"), boolean(true));
}

#[test]
fn nested_scopes_and_shadowing() {
    assert_eq!(eval("let a = 2 :: let b = a * 10 :: { let a = 1 :: a + b }"), int(21));
    assert_eq!(eval("let a = 2 :: { let a = 5 :: a }\na"), int(2));
}

#[test]
fn last_statement_is_the_result() {
    assert_eq!(eval("1\n2\n3"), int(3));
}

#[test]
fn print_receives_tagged_arguments() {
    let src = "let x = 4 ::\nprint(x * 2)\nif x > 3 {\n  print(x == 4)\n}\n7\n";
    let exec = run(&compile_ok(src));
    let printed: Vec<Option<RuntimeValue>> = exec.printed.iter().map(|b| decode_value(*b)).collect();
    assert_eq!(printed, vec![Some(int(8)), Some(boolean(true))]);
    assert_eq!(exec.value(), int(7));
}

#[test]
fn multiline_program() {
    let src = "\
let limit: integer = 10 ::
let half = limit / 2 ::
let big: boolean = half > 3 ::
if big {
  half * half
} else {
  0
}
";
    assert_eq!(eval(src), int(25));
}

#[test]
fn valueless_programs_still_return_a_decodable_value() {
    for src in ["", "\n\n", "{}", "print(1)", "let p = print(1) :: p", "1\nprint(2)"] {
        let exec = run(&compile_ok(src));
        assert_eq!(decode_value(exec.bits), Some(int(0)), "{src:?}");
    }
}
