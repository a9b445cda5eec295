use std::collections::HashSet;

use pretty_assertions::assert_eq;

use gridtune::ast::{Call, Expr, Script, Stmt};
use gridtune::parser::parse_source;
use gridtune::rewrite::rewrite_source;
use gridtune::sweep::{Combination, Scalar};

fn allow(names: &[&str]) -> HashSet<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn combo(entries: &[(&str, Scalar)]) -> Combination {
    entries
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

fn find_call<'a>(script: &'a Script, name: &str) -> &'a Call {
    fn in_stmts<'a>(stmts: &'a [Stmt], name: &str) -> Option<&'a Call> {
        for stmt in stmts {
            let found = match stmt {
                Stmt::FnDef(def) => in_stmts(&def.body, name),
                Stmt::Assign { value, .. } => in_expr(value, name),
                Stmt::Expr(expr) => in_expr(expr, name),
                Stmt::Return(Some(expr)) => in_expr(expr, name),
                Stmt::Return(None) => None,
                Stmt::If { cond, then_body, else_body } => in_expr(cond, name)
                    .or_else(|| in_stmts(then_body, name))
                    .or_else(|| in_stmts(else_body, name)),
                Stmt::While { cond, body } => {
                    in_expr(cond, name).or_else(|| in_stmts(body, name))
                }
            };
            if found.is_some() {
                return found;
            }
        }
        None
    }
    fn in_expr<'a>(expr: &'a Expr, name: &str) -> Option<&'a Call> {
        match expr {
            Expr::Call(call) if call.name == name => Some(call),
            Expr::Call(call) => {
                call.args.iter().find_map(|arg| in_expr(&arg.value, name))
            }
            Expr::Unary { operand, .. } => in_expr(operand, name),
            Expr::Binary { left, right, .. } => {
                in_expr(left, name).or_else(|| in_expr(right, name))
            }
            _ => None,
        }
    }
    in_stmts(&script.stmts, name).expect("call present")
}

fn arg_value<'a>(call: &'a Call, name: &str) -> &'a Expr {
    &call
        .args
        .iter()
        .find(|arg| arg.name.as_deref() == Some(name))
        .expect("argument present")
        .value
}

#[test]
fn replaces_existing_keyword_argument() {
    let src = "result = Model(n_estimators=10)\n";
    let out = rewrite_source(src, &combo(&[("n_estimators", Scalar::Int(50))]), &allow(&["Model"]))
        .expect("rewrite ok");
    let script = parse_source(&out).expect("reparse ok");
    let call = find_call(&script, "Model");
    assert!(matches!(arg_value(call, "n_estimators"), Expr::Int(50)));
}

#[test]
fn leaves_non_allowlisted_calls_unchanged() {
    let src = "result = Other(n_estimators=10)\n";
    let out = rewrite_source(src, &combo(&[("n_estimators", Scalar::Int(50))]), &allow(&["Model"]))
        .expect("rewrite ok");
    let script = parse_source(&out).expect("reparse ok");
    let call = find_call(&script, "Other");
    assert!(matches!(arg_value(call, "n_estimators"), Expr::Int(10)));
}

#[test]
fn appends_missing_key_as_keyword_argument() {
    let src = "result = Model(n_estimators=10)\n";
    let out = rewrite_source(src, &combo(&[("max_depth", Scalar::Int(3))]), &allow(&["Model"]))
        .expect("rewrite ok");
    let script = parse_source(&out).expect("reparse ok");
    let call = find_call(&script, "Model");
    assert_eq!(call.args.len(), 2);
    assert!(matches!(arg_value(call, "max_depth"), Expr::Int(3)));
}

#[test]
fn resolves_positional_slot_against_declared_parameters() {
    let src = r#"fn train(n_estimators, max_depth):
    return n_estimators * max_depth
end
score = train(10, 3)
"#;
    let out = rewrite_source(src, &combo(&[("max_depth", Scalar::Int(7))]), &allow(&["train"]))
        .expect("rewrite ok");
    let script = parse_source(&out).expect("reparse ok");
    let Stmt::Assign { value: Expr::Call(call), .. } = &script.stmts[1] else {
        panic!("expected call assignment");
    };
    assert_eq!(call.args.len(), 2);
    assert_eq!(call.args[1].name, None);
    assert!(matches!(&call.args[1].value, Expr::Int(7)));
}

#[test]
fn encodes_scalar_kinds_as_matching_literals() {
    let src = "Model(a=1, b=2, c=3)\n";
    let params = combo(&[
        ("a", Scalar::Int(5)),
        ("b", Scalar::Float(0.5)),
        ("c", Scalar::Str("gini".to_string())),
    ]);
    let out = rewrite_source(src, &params, &allow(&["Model"])).expect("rewrite ok");
    let script = parse_source(&out).expect("reparse ok");
    let call = find_call(&script, "Model");
    assert!(matches!(arg_value(call, "a"), Expr::Int(5)));
    assert!(matches!(arg_value(call, "b"), Expr::Float(x) if *x == 0.5));
    assert!(matches!(arg_value(call, "c"), Expr::Str(s) if s == "gini"));
}

#[test]
fn ignores_keys_matching_no_call() {
    let src = "x = 1\nprint(\"nothing to patch:\", x)\n";
    let out = rewrite_source(src, &combo(&[("n_estimators", Scalar::Int(50))]), &allow(&["Model"]))
        .expect("rewrite ok");
    assert!(out.contains("x = 1"));
    assert!(!out.contains("n_estimators"));
}

#[test]
fn patches_nested_and_function_body_calls() {
    let src = r#"fn helper():
    return Model(n_estimators=10)
end
score = 1 + Model(n_estimators=10)
"#;
    let out = rewrite_source(src, &combo(&[("n_estimators", Scalar::Int(99))]), &allow(&["Model"]))
        .expect("rewrite ok");
    assert!(!out.contains("n_estimators=10"));
    assert_eq!(out.matches("n_estimators=99").count(), 2);
}

#[test]
fn rewriting_twice_is_idempotent() {
    let src = "result = Model(n_estimators=10, criterion=\"gini\")\n";
    let params = combo(&[
        ("n_estimators", Scalar::Int(50)),
        ("criterion", Scalar::Str("entropy".to_string())),
    ]);
    let allowed = allow(&["Model"]);
    let once = rewrite_source(src, &params, &allowed).expect("rewrite ok");
    let twice = rewrite_source(&once, &params, &allowed).expect("rewrite ok");
    assert_eq!(once, twice);
}

#[test]
fn rendered_output_reparses_for_control_flow() {
    let src = r#"fn score(depth):
    if depth > 2:
        return depth * 2.5
    else:
        return -depth
    end
end
total = 0
while total < 3:
    total += 1
end
print("total:", score(total))
"#;
    let out = rewrite_source(src, &combo(&[("depth", Scalar::Int(4))]), &allow(&["score"]))
        .expect("rewrite ok");
    let reparsed = parse_source(&out).expect("rendered output is valid source");
    assert_eq!(reparsed.stmts.len(), 4);
}
