use gridtune::interp::{execute, run_source};
use gridtune::parser::parse_source;
use gridtune::SweepError;

#[test]
fn captures_printed_output() {
    let out = run_source("print(\"Accuracy:\", 0.95)\nprint(\"Loss:\", 0.1)\n")
        .expect("run ok");
    assert_eq!(out, "Accuracy: 0.95\nLoss: 0.1\n");
}

#[test]
fn integer_arithmetic_stays_integer() {
    let out = run_source("print(\"n:\", 2 + 3 * 4)\n").expect("run ok");
    assert_eq!(out, "n: 14\n");
}

#[test]
fn division_always_yields_float() {
    let out = run_source("print(\"half:\", 7 / 2)\n").expect("run ok");
    assert_eq!(out, "half: 3.5\n");
}

#[test]
fn whole_floats_print_with_decimal_point() {
    let out = run_source("print(\"x:\", 4 / 2)\n").expect("run ok");
    assert_eq!(out, "x: 2.0\n");
}

#[test]
fn calls_user_functions_with_keyword_arguments() {
    let src = r#"fn score(base, bonus):
    return base + bonus
end
print("score:", score(bonus=2, base=40))
"#;
    let out = run_source(src).expect("run ok");
    assert_eq!(out, "score: 42\n");
}

#[test]
fn while_loop_accumulates() {
    let src = r#"total = 0
i = 0
while i < 4:
    i += 1
    total += i
end
print("total:", total)
"#;
    let out = run_source(src).expect("run ok");
    assert_eq!(out, "total: 10\n");
}

#[test]
fn if_else_branches() {
    let src = r#"x = 5
if x > 3:
    print("big")
else:
    print("small")
end
"#;
    let out = run_source(src).expect("run ok");
    assert_eq!(out, "big\n");
}

#[test]
fn string_concat_and_comparison() {
    let out = run_source("print(\"ab\" + \"cd\", 2 < 3)\n").expect("run ok");
    assert_eq!(out, "abcd 1\n");
}

#[test]
fn unexpected_keyword_argument_is_execution_error() {
    let src = r#"fn train(n):
    return n
end
train(n=1, max_depth=3)
"#;
    let err = run_source(src).expect_err("should fail");
    assert!(matches!(&err, SweepError::Execution(_)));
    assert!(err.to_string().contains("max_depth"));
}

#[test]
fn undefined_name_is_execution_error() {
    let err = run_source("print(\"x:\", missing)\n").expect_err("should fail");
    assert!(matches!(err, SweepError::Execution(_)));
}

#[test]
fn division_by_zero_is_execution_error() {
    let err = run_source("x = 1 / 0\n").expect_err("should fail");
    assert!(err.to_string().contains("division by zero"));
}

#[test]
fn return_outside_function_is_execution_error() {
    let err = run_source("return 1\n").expect_err("should fail");
    assert!(matches!(err, SweepError::Execution(_)));
}

#[test]
fn runaway_recursion_is_execution_error() {
    let src = r#"fn loop_forever(n):
    return loop_forever(n + 1)
end
loop_forever(0)
"#;
    let err = run_source(src).expect_err("should fail");
    assert!(err.to_string().contains("call depth"));
}

#[test]
fn executions_share_no_state() {
    let first = parse_source("x = 41\nprint(\"x:\", x)\n").expect("parse ok");
    execute(&first).expect("run ok");
    let second = parse_source("print(\"x:\", x)\n").expect("parse ok");
    let err = execute(&second).expect_err("fresh context has no x");
    assert!(matches!(err, SweepError::Execution(_)));
}

#[test]
fn locals_do_not_leak_out_of_calls() {
    let src = r#"fn set_local():
    hidden = 1
    return hidden
end
set_local()
print("hidden:", hidden)
"#;
    let err = run_source(src).expect_err("locals are frame-scoped");
    assert!(err.to_string().contains("hidden"));
}

#[test]
fn builtin_round_and_abs() {
    let out = run_source("print(\"r:\", round(2.7), abs(-3), round(0.1234, 2))\n")
        .expect("run ok");
    assert_eq!(out, "r: 3 3 0.12\n");
}
