use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::ast::{AssignOp, BinaryOp, Call, Expr, FnDef, Script, Stmt, UnaryOp};
use crate::error::{Result, SweepError};
use crate::parser::parse_source;
use crate::sweep::format_float;

const MAX_CALL_DEPTH: usize = 200;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    None,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", format_float(*x)),
            Value::Str(s) => write!(f, "{}", s),
            Value::None => write!(f, "None"),
        }
    }
}

enum Flow {
    Normal,
    Return(Value),
}

/// Parses and executes one rewritten source text in a fresh sandbox,
/// returning everything the script printed.
pub fn run_source(source: &str) -> Result<String> {
    let script = parse_source(source)?;
    execute(&script)
}

/// Executes a script in a fresh evaluation context: empty globals, empty
/// function table, empty output buffer. Only printed output is observable.
pub fn execute(script: &Script) -> Result<String> {
    let mut interp = Interp::new();
    interp.exec_block(&script.stmts)?;
    debug!(bytes = interp.out.len(), "sandbox run finished");
    Ok(interp.out)
}

struct Interp {
    scopes: Vec<HashMap<String, Value>>,
    fns: HashMap<String, FnDef>,
    out: String,
    depth: usize,
}

impl Interp {
    fn new() -> Interp {
        Interp {
            scopes: vec![HashMap::new()],
            fns: HashMap::new(),
            out: String::new(),
            depth: 0,
        }
    }

    fn exec_block(&mut self, stmts: &[Stmt]) -> Result<Flow> {
        for stmt in stmts {
            if let Flow::Return(value) = self.exec_stmt(stmt)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::FnDef(def) => {
                self.fns.insert(def.name.clone(), def.clone());
                Ok(Flow::Normal)
            }
            Stmt::Assign { target, op, value } => {
                let value = self.eval(value)?;
                match op {
                    AssignOp::Set => {
                        self.set(target, value);
                    }
                    AssignOp::Add => {
                        let current = self.get(target).ok_or_else(|| {
                            SweepError::Execution(format!("name '{}' is not defined", target))
                        })?;
                        let updated = eval_binary(BinaryOp::Add, current, value)?;
                        self.set(target, updated);
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::If { cond, then_body, else_body } => {
                if truthy(&self.eval(cond)?) {
                    self.exec_block(then_body)
                } else {
                    self.exec_block(else_body)
                }
            }
            Stmt::While { cond, body } => {
                while truthy(&self.eval(cond)?) {
                    if let Flow::Return(value) = self.exec_block(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Return(value) => {
                if self.depth == 0 {
                    return Err(SweepError::Execution("'return' outside function".into()));
                }
                let value = match value {
                    Some(expr) => self.eval(expr)?,
                    None => Value::None,
                };
                Ok(Flow::Return(value))
            }
            Stmt::Expr(expr) => {
                self.eval(expr)?;
                Ok(Flow::Normal)
            }
        }
    }

    fn eval(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Int(n) => Ok(Value::Int(*n)),
            Expr::Float(x) => Ok(Value::Float(*x)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Ident(name) => self.get(name).ok_or_else(|| {
                SweepError::Execution(format!("name '{}' is not defined", name))
            }),
            Expr::Call(call) => self.eval_call(call),
            Expr::Unary { op: UnaryOp::Neg, operand } => match self.eval(operand)? {
                Value::Int(n) => Ok(Value::Int(-n)),
                Value::Float(x) => Ok(Value::Float(-x)),
                other => Err(SweepError::Execution(format!(
                    "cannot negate {}",
                    kind_name(&other)
                ))),
            },
            Expr::Binary { left, op, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                eval_binary(*op, left, right)
            }
        }
    }

    fn eval_call(&mut self, call: &Call) -> Result<Value> {
        let mut args = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            args.push((arg.name.clone(), self.eval(&arg.value)?));
        }
        if let Some(def) = self.fns.get(&call.name).cloned() {
            return self.call_user(&def, args);
        }
        match call.name.as_str() {
            "print" => self.builtin_print(args),
            "round" => builtin_round(&call.name, args),
            "abs" => builtin_abs(&call.name, args),
            "min" => builtin_min_max(&call.name, args, true),
            "max" => builtin_min_max(&call.name, args, false),
            _ => Err(SweepError::Execution(format!(
                "function '{}' is not defined",
                call.name
            ))),
        }
    }

    fn call_user(&mut self, def: &FnDef, args: Vec<(Option<String>, Value)>) -> Result<Value> {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(SweepError::Execution(format!(
                "maximum call depth ({}) exceeded in '{}'",
                MAX_CALL_DEPTH, def.name
            )));
        }
        let mut locals: HashMap<String, Value> = HashMap::new();
        let mut positional = 0usize;
        for (name, value) in args {
            match name {
                None => {
                    let Some(param) = def.params.get(positional) else {
                        return Err(SweepError::Execution(format!(
                            "{}() takes {} argument(s) but more were given",
                            def.name,
                            def.params.len()
                        )));
                    };
                    locals.insert(param.clone(), value);
                    positional += 1;
                }
                Some(key) => {
                    if !def.params.iter().any(|p| p == &key) {
                        return Err(SweepError::Execution(format!(
                            "{}() got an unexpected keyword argument '{}'",
                            def.name, key
                        )));
                    }
                    if locals.insert(key.clone(), value).is_some() {
                        return Err(SweepError::Execution(format!(
                            "{}() got multiple values for argument '{}'",
                            def.name, key
                        )));
                    }
                }
            }
        }
        for param in &def.params {
            if !locals.contains_key(param) {
                return Err(SweepError::Execution(format!(
                    "{}() missing required argument '{}'",
                    def.name, param
                )));
            }
        }
        self.scopes.push(locals);
        self.depth += 1;
        let flow = self.exec_block(&def.body);
        self.depth -= 1;
        self.scopes.pop();
        match flow? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::None),
        }
    }

    fn builtin_print(&mut self, args: Vec<(Option<String>, Value)>) -> Result<Value> {
        let mut rendered = Vec::with_capacity(args.len());
        for (name, value) in args {
            if let Some(key) = name {
                return Err(SweepError::Execution(format!(
                    "print() got an unexpected keyword argument '{}'",
                    key
                )));
            }
            rendered.push(value.to_string());
        }
        self.out.push_str(&rendered.join(" "));
        self.out.push('\n');
        Ok(Value::None)
    }

    // Name lookup sees the current call frame and the globals, nothing in
    // between; assignment always targets the current frame.
    fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.scopes.last().and_then(|scope| scope.get(name)) {
            return Some(value.clone());
        }
        self.scopes.first().and_then(|scope| scope.get(name)).cloned()
    }

    fn set(&mut self, name: &str, value: Value) {
        self.scopes
            .last_mut()
            .expect("scope stack is never empty")
            .insert(name.to_string(), value);
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Int(n) => *n != 0,
        Value::Float(x) => *x != 0.0,
        Value::Str(s) => !s.is_empty(),
        Value::None => false,
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Int(_) => "an integer",
        Value::Float(_) => "a float",
        Value::Str(_) => "a string",
        Value::None => "None",
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Int(n) => Some(*n as f64),
        Value::Float(x) => Some(*x),
        _ => None,
    }
}

fn eval_binary(op: BinaryOp, left: Value, right: Value) -> Result<Value> {
    match op {
        BinaryOp::Add => match (&left, &right) {
            (Value::Int(a), Value::Int(b)) => a.checked_add(*b).map(Value::Int).ok_or_else(|| {
                SweepError::Execution("integer overflow in '+'".into())
            }),
            (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{}{}", a, b))),
            _ => numeric_op(op, &left, &right, |a, b| a + b),
        },
        BinaryOp::Sub => match (&left, &right) {
            (Value::Int(a), Value::Int(b)) => a.checked_sub(*b).map(Value::Int).ok_or_else(|| {
                SweepError::Execution("integer overflow in '-'".into())
            }),
            _ => numeric_op(op, &left, &right, |a, b| a - b),
        },
        BinaryOp::Mul => match (&left, &right) {
            (Value::Int(a), Value::Int(b)) => a.checked_mul(*b).map(Value::Int).ok_or_else(|| {
                SweepError::Execution("integer overflow in '*'".into())
            }),
            _ => numeric_op(op, &left, &right, |a, b| a * b),
        },
        BinaryOp::Div => {
            let (Some(a), Some(b)) = (as_f64(&left), as_f64(&right)) else {
                return Err(type_error(op, &left, &right));
            };
            if b == 0.0 {
                return Err(SweepError::Execution("division by zero".into()));
            }
            Ok(Value::Float(a / b))
        }
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge | BinaryOp::Eq | BinaryOp::Ne => {
            eval_comparison(op, &left, &right)
        }
    }
}

fn numeric_op(
    op: BinaryOp,
    left: &Value,
    right: &Value,
    apply: fn(f64, f64) -> f64,
) -> Result<Value> {
    let (Some(a), Some(b)) = (as_f64(left), as_f64(right)) else {
        return Err(type_error(op, left, right));
    };
    Ok(Value::Float(apply(a, b)))
}

fn eval_comparison(op: BinaryOp, left: &Value, right: &Value) -> Result<Value> {
    if let (Some(a), Some(b)) = (as_f64(left), as_f64(right)) {
        let result = match op {
            BinaryOp::Lt => a < b,
            BinaryOp::Le => a <= b,
            BinaryOp::Gt => a > b,
            BinaryOp::Ge => a >= b,
            BinaryOp::Eq => a == b,
            BinaryOp::Ne => a != b,
            _ => unreachable!("comparison operator expected"),
        };
        return Ok(Value::Int(result as i64));
    }
    if let (Value::Str(a), Value::Str(b)) = (left, right) {
        let result = match op {
            BinaryOp::Lt => a < b,
            BinaryOp::Le => a <= b,
            BinaryOp::Gt => a > b,
            BinaryOp::Ge => a >= b,
            BinaryOp::Eq => a == b,
            BinaryOp::Ne => a != b,
            _ => unreachable!("comparison operator expected"),
        };
        return Ok(Value::Int(result as i64));
    }
    match op {
        BinaryOp::Eq => Ok(Value::Int(0)),
        BinaryOp::Ne => Ok(Value::Int(1)),
        _ => Err(type_error(op, left, right)),
    }
}

fn type_error(op: BinaryOp, left: &Value, right: &Value) -> SweepError {
    SweepError::Execution(format!(
        "unsupported operand types for {:?}: {} and {}",
        op,
        kind_name(left),
        kind_name(right)
    ))
}

fn builtin_round(name: &str, args: Vec<(Option<String>, Value)>) -> Result<Value> {
    let args = positional_only(name, args)?;
    match args.as_slice() {
        [value] => {
            let x = as_f64(value)
                .ok_or_else(|| SweepError::Execution("round() expects a number".into()))?;
            Ok(Value::Int(x.round() as i64))
        }
        [value, Value::Int(digits)] => {
            let x = as_f64(value)
                .ok_or_else(|| SweepError::Execution("round() expects a number".into()))?;
            let scale = 10f64.powi(*digits as i32);
            Ok(Value::Float((x * scale).round() / scale))
        }
        _ => Err(SweepError::Execution(
            "round() takes a number and an optional integer digit count".into(),
        )),
    }
}

fn builtin_abs(name: &str, args: Vec<(Option<String>, Value)>) -> Result<Value> {
    let args = positional_only(name, args)?;
    match args.as_slice() {
        [Value::Int(n)] => Ok(Value::Int(n.abs())),
        [Value::Float(x)] => Ok(Value::Float(x.abs())),
        _ => Err(SweepError::Execution("abs() expects one number".into())),
    }
}

fn builtin_min_max(
    name: &str,
    args: Vec<(Option<String>, Value)>,
    want_min: bool,
) -> Result<Value> {
    let args = positional_only(name, args)?;
    match args.as_slice() {
        [Value::Int(a), Value::Int(b)] => {
            Ok(Value::Int(if want_min { *a.min(b) } else { *a.max(b) }))
        }
        [left, right] => {
            let (Some(a), Some(b)) = (as_f64(left), as_f64(right)) else {
                return Err(SweepError::Execution(format!(
                    "{}() expects two numbers",
                    name
                )));
            };
            Ok(Value::Float(if want_min { a.min(b) } else { a.max(b) }))
        }
        _ => Err(SweepError::Execution(format!(
            "{}() expects two numbers",
            name
        ))),
    }
}

fn positional_only(name: &str, args: Vec<(Option<String>, Value)>) -> Result<Vec<Value>> {
    args.into_iter()
        .map(|(key, value)| match key {
            None => Ok(value),
            Some(key) => Err(SweepError::Execution(format!(
                "{}() got an unexpected keyword argument '{}'",
                name, key
            ))),
        })
        .collect()
}
