use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
  pub stmts: Vec<Stmt>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Stmt {
  FnDef(FnDef),
  Assign { target: String, op: AssignOp, value: Expr },
  If { cond: Expr, then_body: Vec<Stmt>, else_body: Vec<Stmt> },
  While { cond: Expr, body: Vec<Stmt> },
  Return(Option<Expr>),
  Expr(Expr),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FnDef {
  pub name: String,
  pub params: Vec<String>,
  pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AssignOp {
  Set,
  Add,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expr {
  Int(i64),
  Float(f64),
  Str(String),
  Ident(String),
  Call(Call),
  Unary { op: UnaryOp, operand: Box<Expr> },
  Binary { left: Box<Expr>, op: BinaryOp, right: Box<Expr> },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum UnaryOp {
  Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BinaryOp {
  Add,
  Sub,
  Mul,
  Div,
  Lt,
  Le,
  Gt,
  Ge,
  Eq,
  Ne,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Call {
  pub name: String,
  pub args: Vec<CallArg>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallArg {
  pub name: Option<String>,
  pub value: Expr,
}
