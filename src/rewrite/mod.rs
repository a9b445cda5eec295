use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::ast::{AssignOp, BinaryOp, Call, CallArg, Expr, Script, Stmt, UnaryOp};
use crate::error::Result;
use crate::parser::parse_source;
use crate::sweep::{format_float, Combination, Scalar};

// (source text, combination, allow-list) -> rewritten source text.
// Pure: nothing is executed, the input text is never mutated.
pub fn rewrite_source(
    source: &str,
    combo: &Combination,
    allowed: &HashSet<String>,
) -> Result<String> {
    let mut script = parse_source(source)?;
    apply_combination(&mut script, combo, allowed);
    Ok(render_script(&script))
}

pub fn apply_combination(script: &mut Script, combo: &Combination, allowed: &HashSet<String>) {
    let signatures = collect_signatures(script);
    for stmt in &mut script.stmts {
        patch_stmt(stmt, combo, allowed, &signatures);
    }
}

// Declared parameter names per function defined in the script; used to
// resolve positional argument slots by name.
fn collect_signatures(script: &Script) -> HashMap<String, Vec<String>> {
    let mut signatures = HashMap::new();
    collect_from_stmts(&script.stmts, &mut signatures);
    signatures
}

fn collect_from_stmts(stmts: &[Stmt], signatures: &mut HashMap<String, Vec<String>>) {
    for stmt in stmts {
        match stmt {
            Stmt::FnDef(def) => {
                signatures.insert(def.name.clone(), def.params.clone());
                collect_from_stmts(&def.body, signatures);
            }
            Stmt::If { then_body, else_body, .. } => {
                collect_from_stmts(then_body, signatures);
                collect_from_stmts(else_body, signatures);
            }
            Stmt::While { body, .. } => collect_from_stmts(body, signatures),
            Stmt::Assign { .. } | Stmt::Return(_) | Stmt::Expr(_) => {}
        }
    }
}

fn patch_stmt(
    stmt: &mut Stmt,
    combo: &Combination,
    allowed: &HashSet<String>,
    signatures: &HashMap<String, Vec<String>>,
) {
    match stmt {
        Stmt::FnDef(def) => {
            for inner in &mut def.body {
                patch_stmt(inner, combo, allowed, signatures);
            }
        }
        Stmt::Assign { value, .. } => patch_expr(value, combo, allowed, signatures),
        Stmt::If { cond, then_body, else_body } => {
            patch_expr(cond, combo, allowed, signatures);
            for inner in then_body {
                patch_stmt(inner, combo, allowed, signatures);
            }
            for inner in else_body {
                patch_stmt(inner, combo, allowed, signatures);
            }
        }
        Stmt::While { cond, body } => {
            patch_expr(cond, combo, allowed, signatures);
            for inner in body {
                patch_stmt(inner, combo, allowed, signatures);
            }
        }
        Stmt::Return(Some(value)) => patch_expr(value, combo, allowed, signatures),
        Stmt::Return(None) => {}
        Stmt::Expr(expr) => patch_expr(expr, combo, allowed, signatures),
    }
}

fn patch_expr(
    expr: &mut Expr,
    combo: &Combination,
    allowed: &HashSet<String>,
    signatures: &HashMap<String, Vec<String>>,
) {
    match expr {
        Expr::Call(call) => {
            if allowed.contains(&call.name) {
                patch_call(call, combo, signatures);
            }
            for arg in &mut call.args {
                patch_expr(&mut arg.value, combo, allowed, signatures);
            }
        }
        Expr::Unary { operand, .. } => patch_expr(operand, combo, allowed, signatures),
        Expr::Binary { left, right, .. } => {
            patch_expr(left, combo, allowed, signatures);
            patch_expr(right, combo, allowed, signatures);
        }
        Expr::Int(_) | Expr::Float(_) | Expr::Str(_) | Expr::Ident(_) => {}
    }
}

fn patch_call(call: &mut Call, combo: &Combination, signatures: &HashMap<String, Vec<String>>) {
    let declared = signatures.get(&call.name);
    for (key, value) in combo {
        let literal = scalar_to_expr(value);
        if let Some(arg) = call
            .args
            .iter_mut()
            .find(|arg| arg.name.as_deref() == Some(key.as_str()))
        {
            arg.value = literal;
            debug!(call = %call.name, key = %key, "replaced keyword argument");
            continue;
        }
        if let Some(slot) = declared.and_then(|params| params.iter().position(|p| p == key)) {
            if let Some(arg) = call.args.get_mut(slot) {
                if arg.name.is_none() {
                    arg.value = literal;
                    debug!(call = %call.name, key = %key, slot, "replaced positional argument");
                    continue;
                }
            }
        }
        debug!(call = %call.name, key = %key, "appended keyword argument");
        call.args.push(CallArg { name: Some(key.clone()), value: literal });
    }
}

fn scalar_to_expr(value: &Scalar) -> Expr {
    match value {
        Scalar::Int(n) => Expr::Int(*n),
        Scalar::Float(x) => Expr::Float(*x),
        Scalar::Str(s) => Expr::Str(s.clone()),
    }
}

pub fn render_script(script: &Script) -> String {
    let mut out = String::new();
    for stmt in &script.stmts {
        render_stmt(stmt, 0, &mut out);
    }
    out
}

fn render_stmt(stmt: &Stmt, indent: usize, out: &mut String) {
    let pad = "    ".repeat(indent);
    match stmt {
        Stmt::FnDef(def) => {
            out.push_str(&format!("{}fn {}({}):\n", pad, def.name, def.params.join(", ")));
            for inner in &def.body {
                render_stmt(inner, indent + 1, out);
            }
            out.push_str(&format!("{}end\n", pad));
        }
        Stmt::Assign { target, op, value } => {
            let op_text = match op {
                AssignOp::Set => "=",
                AssignOp::Add => "+=",
            };
            out.push_str(&format!("{}{} {} {}\n", pad, target, op_text, render_expr(value)));
        }
        Stmt::If { cond, then_body, else_body } => {
            out.push_str(&format!("{}if {}:\n", pad, render_expr(cond)));
            for inner in then_body {
                render_stmt(inner, indent + 1, out);
            }
            if !else_body.is_empty() {
                out.push_str(&format!("{}else:\n", pad));
                for inner in else_body {
                    render_stmt(inner, indent + 1, out);
                }
            }
            out.push_str(&format!("{}end\n", pad));
        }
        Stmt::While { cond, body } => {
            out.push_str(&format!("{}while {}:\n", pad, render_expr(cond)));
            for inner in body {
                render_stmt(inner, indent + 1, out);
            }
            out.push_str(&format!("{}end\n", pad));
        }
        Stmt::Return(None) => out.push_str(&format!("{}return\n", pad)),
        Stmt::Return(Some(value)) => {
            out.push_str(&format!("{}return {}\n", pad, render_expr(value)));
        }
        Stmt::Expr(expr) => out.push_str(&format!("{}{}\n", pad, render_expr(expr))),
    }
}

pub fn render_expr(expr: &Expr) -> String {
    match expr {
        Expr::Int(n) => n.to_string(),
        Expr::Float(x) => format_float(*x),
        Expr::Str(s) => format!("\"{}\"", escape_str(s)),
        Expr::Ident(name) => name.clone(),
        Expr::Call(call) => render_call(call),
        Expr::Unary { op: UnaryOp::Neg, operand } => {
            format!("-{}", render_operand(operand))
        }
        Expr::Binary { left, op, right } => format!(
            "{} {} {}",
            render_operand(left),
            binary_op_text(*op),
            render_operand(right)
        ),
    }
}

// Nested binary operands are parenthesized so the rendered text re-parses to
// the same tree.
fn render_operand(expr: &Expr) -> String {
    match expr {
        Expr::Binary { .. } => format!("({})", render_expr(expr)),
        _ => render_expr(expr),
    }
}

fn render_call(call: &Call) -> String {
    let args = call
        .args
        .iter()
        .map(|arg| match &arg.name {
            Some(name) => format!("{}={}", name, render_expr(&arg.value)),
            None => render_expr(&arg.value),
        })
        .collect::<Vec<_>>();
    format!("{}({})", call.name, args.join(", "))
}

fn binary_op_text(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Lt => "<",
        BinaryOp::Le => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::Ge => ">=",
        BinaryOp::Eq => "==",
        BinaryOp::Ne => "!=",
    }
}

fn escape_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}
