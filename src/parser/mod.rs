use crate::ast::*;
use crate::error::{Result, SweepError};
use crate::lexer::{lex, Keyword, Token, TokenKind};

pub fn parse_source(input: &str) -> Result<Script> {
    let tokens = lex(input)?;
    let mut parser = Parser { tokens, pos: 0 };
    parser.parse_script()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

enum BlockEnd {
    End,
    Else,
}

impl Parser {
    fn parse_script(&mut self) -> Result<Script> {
        let mut stmts = Vec::new();
        self.consume_newlines();
        while !self.is_eof() {
            stmts.push(self.parse_stmt()?);
            self.consume_newlines();
        }
        Ok(Script { stmts })
    }

    fn parse_stmt(&mut self) -> Result<Stmt> {
        if self.check_keyword(Keyword::Fn) {
            return Ok(Stmt::FnDef(self.parse_fn()?));
        }
        if self.check_keyword(Keyword::If) {
            return self.parse_if();
        }
        if self.check_keyword(Keyword::While) {
            return self.parse_while();
        }
        if self.check_keyword(Keyword::Return) {
            return self.parse_return();
        }
        if self.check_keyword(Keyword::End) || self.check_keyword(Keyword::Else) {
            return Err(self.error_here("Unexpected block terminator"));
        }
        if let Some(TokenKind::Identifier(name)) = self.peek_kind().cloned() {
            if self.check_n(1, TokenKind::Eq) || self.check_n(1, TokenKind::PlusEq) {
                self.advance();
                let op = if self.check(TokenKind::Eq) {
                    self.advance();
                    AssignOp::Set
                } else {
                    self.advance();
                    AssignOp::Add
                };
                let value = self.parse_expr()?;
                return Ok(Stmt::Assign { target: name, op, value });
            }
        }
        let expr = self.parse_expr()?;
        Ok(Stmt::Expr(expr))
    }

    fn parse_fn(&mut self) -> Result<FnDef> {
        self.expect_keyword(Keyword::Fn)?;
        let name = self.expect_ident()?;
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                params.push(self.expect_ident()?);
                if self.check(TokenKind::Comma) {
                    self.advance();
                    continue;
                }
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::Colon)?;
        let (body, _) = self.parse_block(false)?;
        Ok(FnDef { name, params, body })
    }

    fn parse_if(&mut self) -> Result<Stmt> {
        self.expect_keyword(Keyword::If)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::Colon)?;
        let (then_body, ended) = self.parse_block(true)?;
        let else_body = match ended {
            BlockEnd::Else => {
                self.expect(TokenKind::Colon)?;
                let (body, _) = self.parse_block(false)?;
                body
            }
            BlockEnd::End => Vec::new(),
        };
        Ok(Stmt::If { cond, then_body, else_body })
    }

    fn parse_while(&mut self) -> Result<Stmt> {
        self.expect_keyword(Keyword::While)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::Colon)?;
        let (body, _) = self.parse_block(false)?;
        Ok(Stmt::While { cond, body })
    }

    fn parse_return(&mut self) -> Result<Stmt> {
        self.expect_keyword(Keyword::Return)?;
        if self.check(TokenKind::Newline) || self.check_keyword(Keyword::End) || self.is_eof() {
            return Ok(Stmt::Return(None));
        }
        let expr = self.parse_expr()?;
        Ok(Stmt::Return(Some(expr)))
    }

    // Parses statements up to the closing `end` (or `else` when permitted).
    fn parse_block(&mut self, allow_else: bool) -> Result<(Vec<Stmt>, BlockEnd)> {
        let mut stmts = Vec::new();
        self.consume_newlines();
        loop {
            if self.check_keyword(Keyword::End) {
                self.advance();
                return Ok((stmts, BlockEnd::End));
            }
            if allow_else && self.check_keyword(Keyword::Else) {
                self.advance();
                return Ok((stmts, BlockEnd::Else));
            }
            if self.is_eof() {
                return Err(self.error_here("Unterminated block, expected 'end'"));
            }
            stmts.push(self.parse_stmt()?);
            self.consume_newlines();
        }
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        let left = self.parse_additive()?;
        let op = match self.peek_kind() {
            Some(TokenKind::Lt) => BinaryOp::Lt,
            Some(TokenKind::Le) => BinaryOp::Le,
            Some(TokenKind::Gt) => BinaryOp::Gt,
            Some(TokenKind::Ge) => BinaryOp::Ge,
            Some(TokenKind::EqEq) => BinaryOp::Eq,
            Some(TokenKind::Neq) => BinaryOp::Ne,
            _ => return Ok(left),
        };
        self.advance();
        let right = self.parse_additive()?;
        Ok(Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Star) => BinaryOp::Mul,
                Some(TokenKind::Slash) => BinaryOp::Div,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        if self.check(TokenKind::Minus) {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        match self.peek_kind().cloned() {
            Some(TokenKind::Int(n)) => {
                self.advance();
                Ok(Expr::Int(n))
            }
            Some(TokenKind::Float(f)) => {
                self.advance();
                Ok(Expr::Float(f))
            }
            Some(TokenKind::Str(s)) => {
                self.advance();
                Ok(Expr::Str(s))
            }
            Some(TokenKind::Identifier(_)) => self.parse_call_or_ident(),
            Some(TokenKind::LParen) => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            _ => Err(self.error_here("Unexpected token in expression")),
        }
    }

    fn parse_call_or_ident(&mut self) -> Result<Expr> {
        let name = self.expect_ident()?;
        if self.check(TokenKind::LParen) {
            let args = self.parse_arg_list()?;
            Ok(Expr::Call(Call { name, args }))
        } else {
            Ok(Expr::Ident(name))
        }
    }

    fn parse_arg_list(&mut self) -> Result<Vec<CallArg>> {
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                args.push(self.parse_arg()?);
                if self.check(TokenKind::Comma) {
                    self.advance();
                    continue;
                }
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(args)
    }

    fn parse_arg(&mut self) -> Result<CallArg> {
        if let Some(TokenKind::Identifier(name)) = self.peek_kind().cloned() {
            if self.check_n(1, TokenKind::Eq) {
                self.advance();
                self.expect(TokenKind::Eq)?;
                let value = self.parse_expr()?;
                return Ok(CallArg { name: Some(name), value });
            }
        }
        let value = self.parse_expr()?;
        Ok(CallArg { name: None, value })
    }

    fn expect_ident(&mut self) -> Result<String> {
        match self.peek_kind().cloned() {
            Some(TokenKind::Identifier(name)) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.error_here("Expected identifier")),
        }
    }

    fn expect_keyword(&mut self, kw: Keyword) -> Result<()> {
        match self.peek_kind() {
            Some(TokenKind::Keyword(k)) if *k == kw => {
                self.advance();
                Ok(())
            }
            _ => Err(self.error_here(&format!("Expected keyword {:?}", kw))),
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<()> {
        if self.check(kind.clone()) {
            self.advance();
            Ok(())
        } else {
            Err(self.error_here(&format!("Expected {:?}", kind)))
        }
    }

    fn error_here(&self, message: &str) -> SweepError {
        match self.peek() {
            Some(tok) => SweepError::Parse(format!(
                "{}, found {:?} at {}:{}",
                message, tok.kind, tok.line, tok.col
            )),
            None => SweepError::Parse(format!("{} at end of input", message)),
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        matches!(self.peek_kind(), Some(k) if *k == kind)
    }

    fn check_keyword(&self, kw: Keyword) -> bool {
        matches!(self.peek_kind(), Some(TokenKind::Keyword(k)) if *k == kw)
    }

    fn check_n(&self, n: usize, kind: TokenKind) -> bool {
        self.tokens.get(self.pos + n).map(|t| t.kind.clone()) == Some(kind)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    fn consume_newlines(&mut self) {
        while self.check(TokenKind::Newline) {
            self.advance();
        }
    }

    fn is_eof(&self) -> bool {
        matches!(self.peek_kind(), Some(TokenKind::Eof))
    }
}
