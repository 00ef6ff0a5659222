//! Parser for klang source code.
//!
//! Transforms the token stream from the lexer into an AST by recursive
//! descent. Precedence, high to low: unary `!`/`-`, `* /`, `+ -`,
//! `< <= > >=`, `== !=`, `&&`, `||`; parentheses override.
//!
//! Two constructs lean on token spans and the original source text:
//!
//! - Inline JSON object literals (`x = {"a": 1};`) are captured by brace
//!   matching over the token stream and sliced verbatim from the source.
//! - kubectl arguments are regrouped into whitespace-separated words by
//!   span adjacency, so `cm/test-cm` or `--type` survive as single
//!   barewords even though they lex as several tokens.

use klang_types::Value;

use crate::ast::{
    Assignment, BinaryOp, Expr, FunctionCall, IfStmt, KubeArg, KubectlCmd, Program, Stmt,
    UnaryOp, WhileStmt,
};
use crate::error::ParseError;
use crate::lexer::{tokenize, Span, Spanned, Token};

/// Parse a complete program.
pub fn parse(source: &str) -> Result<Program, ParseError> {
    let tokens = tokenize(source)?;
    Parser {
        source,
        tokens,
        pos: 0,
    }
    .program()
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Spanned<Token>>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|s| &s.token)
    }

    fn advance(&mut self) -> Option<Spanned<Token>> {
        let spanned = self.tokens.get(self.pos).cloned();
        if spanned.is_some() {
            self.pos += 1;
        }
        spanned
    }

    fn current_span(&self) -> Span {
        match self.tokens.get(self.pos) {
            Some(s) => s.span.clone(),
            None => self.source.len()..self.source.len(),
        }
    }

    fn error_here(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(self.current_span(), message)
    }

    fn expect(&mut self, expected: &Token, what: &str) -> Result<Span, ParseError> {
        match self.advance() {
            Some(spanned) if &spanned.token == expected => Ok(spanned.span),
            Some(spanned) => Err(ParseError::new(
                spanned.span,
                format!("expected {what}, found {:?}", spanned.token),
            )),
            None => Err(self.error_here(format!("expected {what}, found end of input"))),
        }
    }

    fn program(mut self) -> Result<Program, ParseError> {
        let mut statements = Vec::new();
        while self.peek().is_some() {
            // Tolerate stray semicolons between statements.
            if self.peek() == Some(&Token::Semi) {
                self.advance();
                continue;
            }
            statements.push(self.statement()?);
        }
        Ok(Program { statements })
    }

    fn statement(&mut self) -> Result<Stmt, ParseError> {
        match self.peek() {
            Some(Token::If) => self.if_stmt().map(Stmt::If),
            Some(Token::While) => self.while_stmt().map(Stmt::While),
            Some(Token::Ident(_)) if self.peek_at(1) == Some(&Token::Assign) => {
                self.assignment().map(Stmt::Assign)
            }
            Some(Token::Ident(_)) if self.peek_at(1) == Some(&Token::LParen) => {
                let call = self.expr()?;
                self.expect(&Token::Semi, "`;`")?;
                Ok(Stmt::Expr(call))
            }
            Some(Token::Kubectl) => {
                let cmd = self.kubectl_cmd()?;
                self.expect(&Token::Semi, "`;`")?;
                Ok(Stmt::Expr(cmd))
            }
            Some(Token::ShellScript) => {
                let shell = self.shell_script()?;
                self.expect(&Token::Semi, "`;`")?;
                Ok(Stmt::Expr(shell))
            }
            Some(other) => Err(self.error_here(format!("expected a statement, found {other:?}"))),
            None => Err(self.error_here("expected a statement, found end of input")),
        }
    }

    fn if_stmt(&mut self) -> Result<IfStmt, ParseError> {
        self.expect(&Token::If, "`if`")?;
        let condition = Box::new(self.expr()?);
        let then_branch = self.block()?;
        let else_branch = if self.peek() == Some(&Token::Else) {
            self.advance();
            if self.peek() == Some(&Token::If) {
                // else-if chains nest as a single-statement else block
                Some(vec![Stmt::If(self.if_stmt()?)])
            } else {
                Some(self.block()?)
            }
        } else {
            None
        };
        Ok(IfStmt {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn while_stmt(&mut self) -> Result<WhileStmt, ParseError> {
        self.expect(&Token::While, "`while`")?;
        let condition = Box::new(self.expr()?);
        let body = self.block()?;
        Ok(WhileStmt { condition, body })
    }

    fn block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.expect(&Token::LBrace, "`{`")?;
        let mut statements = Vec::new();
        loop {
            match self.peek() {
                Some(Token::RBrace) => {
                    self.advance();
                    return Ok(statements);
                }
                Some(Token::Semi) => {
                    self.advance();
                }
                Some(_) => statements.push(self.statement()?),
                None => return Err(self.error_here("unclosed block, expected `}`")),
            }
        }
    }

    fn assignment(&mut self) -> Result<Assignment, ParseError> {
        let name = match self.advance() {
            Some(Spanned {
                token: Token::Ident(name),
                ..
            }) => name,
            _ => return Err(self.error_here("expected an identifier")),
        };
        self.expect(&Token::Assign, "`=`")?;
        let value = match self.peek() {
            Some(Token::Kubectl) => self.kubectl_cmd()?,
            Some(Token::ShellScript) => self.shell_script()?,
            _ => self.expr()?,
        };
        self.expect(&Token::Semi, "`;`")?;
        Ok(Assignment { name, value })
    }

    fn shell_script(&mut self) -> Result<Expr, ParseError> {
        self.expect(&Token::ShellScript, "`shellScript`")?;
        match self.advance() {
            Some(Spanned {
                token: Token::Backtick(body),
                ..
            }) => Ok(Expr::ShellScript(body)),
            Some(spanned) => Err(ParseError::new(
                spanned.span,
                "shellScript requires a backtick-quoted block",
            )),
            None => Err(self.error_here("shellScript requires a backtick-quoted block")),
        }
    }

    /// Parse `kubectl VERB ARGS` up to (but not including) the terminating `;`.
    fn kubectl_cmd(&mut self) -> Result<Expr, ParseError> {
        let kw_span = self.expect(&Token::Kubectl, "`kubectl`")?;
        let mut parts: Vec<Spanned<Token>> = Vec::new();
        while !matches!(self.peek(), Some(Token::Semi) | None) {
            parts.push(self.advance().expect("peeked token"));
        }

        let mut args = Vec::new();
        let mut i = 0;
        while i < parts.len() {
            let start = parts[i].span.start;
            let mut end = parts[i].span.end;
            let mut j = i + 1;
            while j < parts.len() && parts[j].span.start == end {
                end = parts[j].span.end;
                j += 1;
            }
            let arg = if j == i + 1 {
                match &parts[i].token {
                    Token::Str(text) | Token::RawStr(text) | Token::Backtick(text) => {
                        KubeArg::Literal(text.clone())
                    }
                    _ => KubeArg::Word(self.source[start..end].to_string()),
                }
            } else {
                KubeArg::Word(self.source[start..end].to_string())
            };
            args.push(arg);
            i = j;
        }

        if args.is_empty() {
            return Err(ParseError::new(kw_span, "kubectl requires a verb"));
        }
        let verb = match args.remove(0) {
            KubeArg::Word(verb) => verb,
            KubeArg::Literal(_) => {
                return Err(ParseError::new(kw_span, "kubectl verb must be a bareword"))
            }
        };
        Ok(Expr::Kubectl(KubectlCmd { verb, args }))
    }

    // --- Expressions ---

    fn expr(&mut self) -> Result<Expr, ParseError> {
        self.or_expr()
    }

    fn or_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.and_expr()?;
        while self.peek() == Some(&Token::OrOr) {
            self.advance();
            let right = self.and_expr()?;
            left = binary(left, BinaryOp::Or, right);
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.equality()?;
        while self.peek() == Some(&Token::AndAnd) {
            self.advance();
            let right = self.equality()?;
            left = binary(left, BinaryOp::And, right);
        }
        Ok(left)
    }

    fn equality(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.comparison()?;
        loop {
            let op = match self.peek() {
                Some(Token::EqEq) => BinaryOp::Eq,
                Some(Token::NotEq) => BinaryOp::NotEq,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.comparison()?;
            left = binary(left, op, right);
        }
    }

    fn comparison(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.additive()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => BinaryOp::Lt,
                Some(Token::LtEq) => BinaryOp::LtEq,
                Some(Token::Gt) => BinaryOp::Gt,
                Some(Token::GtEq) => BinaryOp::GtEq,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.additive()?;
            left = binary(left, op, right);
        }
    }

    fn additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.term()?;
            left = binary(left, op, right);
        }
    }

    fn term(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.unary()?;
            left = binary(left, op, right);
        }
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        match self.peek() {
            Some(Token::Bang) => {
                self.advance();
                let operand = self.unary()?;
                Ok(Expr::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                })
            }
            Some(Token::Minus) => {
                self.advance();
                let operand = self.unary()?;
                // Fold negation into numeric literals so `-1` is INT -1.
                Ok(match operand {
                    Expr::Literal(Value::Int(i)) => Expr::Literal(Value::Int(-i)),
                    Expr::Literal(Value::Float(x)) => Expr::Literal(Value::Float(-x)),
                    other => Expr::Unary {
                        op: UnaryOp::Neg,
                        operand: Box::new(other),
                    },
                })
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        match self.peek() {
            Some(Token::LBrace) => self.json_literal(),
            Some(Token::LParen) => {
                self.advance();
                let inner = self.expr()?;
                self.expect(&Token::RParen, "`)`")?;
                Ok(inner)
            }
            Some(Token::Ident(_)) if self.peek_at(1) == Some(&Token::LParen) => self.call(),
            _ => match self.advance() {
                Some(spanned) => match spanned.token {
                    Token::Int(i) => Ok(Expr::Literal(Value::Int(i))),
                    Token::Float(x) => Ok(Expr::Literal(Value::Float(x))),
                    Token::Str(s) | Token::RawStr(s) | Token::Backtick(s) => {
                        Ok(Expr::Literal(Value::Str(s)))
                    }
                    Token::True => Ok(Expr::Literal(Value::Bool(true))),
                    Token::False => Ok(Expr::Literal(Value::Bool(false))),
                    Token::Ident(name) => Ok(Expr::Ident(name)),
                    other => Err(ParseError::new(
                        spanned.span,
                        format!("expected an expression, found {other:?}"),
                    )),
                },
                None => Err(self.error_here("expected an expression, found end of input")),
            },
        }
    }

    fn call(&mut self) -> Result<Expr, ParseError> {
        let name = match self.advance() {
            Some(Spanned {
                token: Token::Ident(name),
                ..
            }) => name,
            _ => return Err(self.error_here("expected a function name")),
        };
        self.expect(&Token::LParen, "`(`")?;
        let mut args = Vec::new();
        if self.peek() != Some(&Token::RParen) {
            loop {
                args.push(self.expr()?);
                match self.peek() {
                    Some(Token::Comma) => {
                        self.advance();
                    }
                    _ => break,
                }
            }
        }
        self.expect(&Token::RParen, "`)`")?;
        Ok(Expr::Call(FunctionCall { name, args }))
    }

    /// Capture an inline JSON object literal as the raw source slice.
    fn json_literal(&mut self) -> Result<Expr, ParseError> {
        let open = self.advance().expect("peeked `{`");
        let start = open.span.start;
        let mut end = open.span.end;
        let mut depth = 1usize;
        while depth > 0 {
            match self.advance() {
                Some(spanned) => {
                    match spanned.token {
                        Token::LBrace => depth += 1,
                        Token::RBrace => depth -= 1,
                        _ => {}
                    }
                    end = spanned.span.end;
                }
                None => {
                    return Err(ParseError::new(
                        start..end,
                        "unterminated object literal",
                    ))
                }
            }
        }
        Ok(Expr::Literal(Value::Str(
            self.source[start..end].to_string(),
        )))
    }
}

fn binary(left: Expr, op: BinaryOp, right: Expr) -> Expr {
    Expr::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}
