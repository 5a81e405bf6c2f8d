/*!
Recursive‑descent parser: tokens → statement list.

Time & Space Complexity
=======================

* **n** = number of tokens (including the sole EOF).

Each token is consumed once via `advance()`; error recovery in
`synchronize()` only ever discards tokens, so parsing is **Θ(n)**. The AST
holds one `Box` per interior node and borrows every token from the slice
handed to [`Parser::new`]. Call‑stack depth grows with syntactic nesting.

### Logging Policy

| Location                     | Level  | Purpose                                   |
|------------------------------|--------|-------------------------------------------|
| `Parser::new`, `parse`       | `info` | Lifecycle milestones.                     |
| `declaration`, `statement`   | `debug`| High‑level descent into grammar branches. |
| Error recovery               | `debug`| Context before discarding tokens.         |

--------------------------------------------------------------------------------
Grammar (EBNF)
--------------

```text
program        → declaration* EOF ;
declaration    → funDecl | varDecl | statement ;
funDecl        → "fun" IDENT "(" parameters? ")" block ;
varDecl        → "var" IDENT ( "=" expression )? ";" ;
statement      → exprStmt | forStmt | ifStmt | printStmt
               | returnStmt | whileStmt | block ;
forStmt        → "for" "(" ( varDecl | exprStmt | ";" )
                 expression? ";" expression? ")" statement ;
exprStmt       → expression ";" ;
printStmt      → "print" expression ";" ;
whileStmt      → "while" "(" expression ")" statement ;
ifStmt         → "if" "(" expression ")" statement
               ( "else" statement )? ;
returnStmt     → "return" expression? ";" ;
block          → "{" declaration* "}" ;
parameters     → IDENT ( "," IDENT )* ;
expression     → assignment ;
assignment     → IDENT "=" assignment | logic_or ;
logic_or       → logic_and ( "or" logic_and )* ;
logic_and      → equality  ( "and" equality )* ;
equality       → comparison ( ( "!=" | "==" ) comparison )* ;
comparison     → term ( ( ">" | ">=" | "<" | "<=" ) term )* ;
term           → factor ( ( "-" | "+" ) factor )* ;
factor         → unary ( ( "/" | "*" ) unary )* ;
unary          → ( "!" | "-" ) unary | call ;
call           → primary ( "(" arguments? ")" )* ;
arguments      → expression ( "," expression )* ;
primary        → NUMBER | STRING | "true" | "false" | "nil"
               | IDENT | "(" expression ")" ;
```

`for` has no node of its own: it is lowered to `while` here.
*/

use std::rc::Rc;

use crate::ast::{Expr, ExprId, FunctionDecl, LiteralValue, Stmt};
use crate::error::{LoxError, Result};
use crate::stack::ensure_sufficient_stack;
use crate::token::{Literal, Token, TokenType};

use log::{debug, info};

/// Parameters and call arguments are capped at this count.
pub const MAX_ARITY: usize = 255;

/// Stands in for a missing trailing EOF so lookahead never runs off the slice.
static END: Token<'static> = Token {
    token_type: TokenType::EOF,
    lexeme: "",
    literal: None,
    line: 0,
};

/// Top‑level parser over an immutable slice of tokens.
pub struct Parser<'a> {
    tokens: &'a [Token<'a>],
    current: usize,
    next_id: usize,
    errors: Vec<LoxError>,
}

impl<'a> Parser<'a> {
    /// Construct a new parser.
    pub fn new(tokens: &'a [Token<'a>]) -> Self {
        info!("Parser created with {} tokens", tokens.len());

        Self {
            tokens,
            current: 0,
            next_id: 0,
            errors: Vec::new(),
        }
    }

    // ───────────────────────── public API ─────────────────────────

    /// Parse an entire program and return every statement that parsed.
    ///
    /// Statements with syntax errors are dropped after recovery; the errors
    /// themselves are available from [`Parser::errors`].
    pub fn parse(&mut self) -> Vec<Stmt<'a>> {
        info!("Beginning parse phase");

        let mut statements: Vec<Stmt<'a>> = Vec::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        info!(
            "Parsed {} statement(s), {} syntax error(s)",
            statements.len(),
            self.errors.len()
        );

        statements
    }

    /// Parse a single expression that must span the whole token stream.
    pub fn parse_expression(&mut self) -> Result<Expr<'a>> {
        info!("Parsing a single expression");

        let expr = self.expression()?;

        if !self.is_at_end() {
            return Err(LoxError::parse(self.peek(), "Expect end of expression."));
        }

        Ok(expr)
    }

    /// Syntax errors reported so far, in source order.
    pub fn errors(&self) -> &[LoxError] {
        &self.errors
    }

    pub fn had_error(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn into_errors(self) -> Vec<LoxError> {
        self.errors
    }

    // ──────────────────────── declaration rules ───────────────────

    /// Statement‑level recovery point: a failed production is recorded and
    /// the token stream is skipped to the next statement boundary.
    fn declaration(&mut self) -> Option<Stmt<'a>> {
        debug!("Entering declaration at line {}", self.peek().line);

        let result = if self.matches(TokenType::FUN) {
            self.function("function")
        } else if self.matches(TokenType::VAR) {
            self.var_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => Some(stmt),

            Err(e) => {
                debug!("Recovering from syntax error: {}", e);

                self.errors.push(e);
                self.synchronize();
                None
            }
        }
    }

    fn function(&mut self, kind: &str) -> Result<Stmt<'a>> {
        let name = self.consume(TokenType::IDENTIFIER, &format!("Expect {} name.", kind))?;

        self.consume(
            TokenType::LEFT_PAREN,
            &format!("Expect '(' after {} name.", kind),
        )?;

        let mut params: Vec<&'a Token<'a>> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if params.len() >= MAX_ARITY {
                    self.report(self.peek(), "Can't have more than 255 parameters.");
                }

                params.push(self.consume(TokenType::IDENTIFIER, "Expect parameter name.")?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after parameters.")?;

        self.consume(
            TokenType::LEFT_BRACE,
            &format!("Expect '{{' before {} body.", kind),
        )?;
        let body = self.block()?;

        debug!(
            "Parsed {} '{}' with {} parameter(s)",
            kind,
            name.lexeme,
            params.len()
        );

        Ok(Stmt::Function(Rc::new(FunctionDecl { name, params, body })))
    }

    fn var_declaration(&mut self) -> Result<Stmt<'a>> {
        let name = self.consume(TokenType::IDENTIFIER, "Expect variable name.")?;

        let initializer: Option<Expr<'a>> = if self.matches(TokenType::EQUAL) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(
            TokenType::SEMICOLON,
            "Expect ';' after variable declaration.",
        )?;

        Ok(Stmt::Var { name, initializer })
    }

    // ───────────────────────── statement rules ────────────────────

    fn statement(&mut self) -> Result<Stmt<'a>> {
        ensure_sufficient_stack(|| self.statement_inner())
    }

    fn statement_inner(&mut self) -> Result<Stmt<'a>> {
        if self.matches(TokenType::FOR) {
            self.for_statement()
        } else if self.matches(TokenType::IF) {
            self.if_statement()
        } else if self.matches(TokenType::PRINT) {
            self.print_statement()
        } else if self.matches(TokenType::RETURN) {
            self.return_statement()
        } else if self.matches(TokenType::WHILE) {
            self.while_statement()
        } else if self.matches(TokenType::LEFT_BRACE) {
            Ok(Stmt::Block(self.block()?))
        } else {
            self.expression_statement()
        }
    }

    /// `for (init; cond; incr) body` becomes
    /// `{ init; while (cond) { body; incr; } }`, dropping the pieces that
    /// are absent.
    fn for_statement(&mut self) -> Result<Stmt<'a>> {
        debug!("Desugaring for loop");

        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'for'.")?;

        let initializer = if self.matches(TokenType::SEMICOLON) {
            None
        } else if self.matches(TokenType::VAR) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if !self.check(TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::SEMICOLON, "Expect ';' after loop condition.")?;

        let increment = if !self.check(TokenType::RIGHT_PAREN) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after for clauses.")?;

        let mut body = self.statement()?;

        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
        }

        let condition = condition.unwrap_or(Expr::Literal(LiteralValue::True));
        body = Stmt::While {
            condition,
            body: Box::new(body),
        };

        if let Some(initializer) = initializer {
            body = Stmt::Block(vec![initializer, body]);
        }

        Ok(body)
    }

    fn if_statement(&mut self) -> Result<Stmt<'a>> {
        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'if'.")?;
        let condition: Expr<'a> = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after if condition.")?;

        let then_branch: Box<Stmt<'a>> = Box::new(self.statement()?);
        let else_branch: Option<Box<Stmt<'a>>> = if self.matches(TokenType::ELSE) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn print_statement(&mut self) -> Result<Stmt<'a>> {
        let value: Expr<'a> = self.expression()?;

        self.consume(TokenType::SEMICOLON, "Expect ';' after value.")?;

        Ok(Stmt::Print(value))
    }

    fn return_statement(&mut self) -> Result<Stmt<'a>> {
        let keyword = self.previous();
        let value: Option<Expr<'a>> = if !self.check(TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenType::SEMICOLON, "Expect ';' after return value.")?;

        Ok(Stmt::Return { keyword, value })
    }

    fn while_statement(&mut self) -> Result<Stmt<'a>> {
        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'while'.")?;
        let condition: Expr<'a> = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after condition.")?;
        let body: Box<Stmt<'a>> = Box::new(self.statement()?);

        Ok(Stmt::While { condition, body })
    }

    fn expression_statement(&mut self) -> Result<Stmt<'a>> {
        let expr: Expr<'a> = self.expression()?;
        self.consume(TokenType::SEMICOLON, "Expect ';' after expression.")?;

        Ok(Stmt::Expression(expr))
    }

    /// Statements up to the closing `}`; the `{` was already consumed.
    fn block(&mut self) -> Result<Vec<Stmt<'a>>> {
        let mut statements: Vec<Stmt<'a>> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        self.consume(TokenType::RIGHT_BRACE, "Expect '}' after block.")?;

        Ok(statements)
    }

    // ─────────────────────── expression rules ─────────────────────

    fn expression(&mut self) -> Result<Expr<'a>> {
        ensure_sufficient_stack(|| self.assignment())
    }

    fn assignment(&mut self) -> Result<Expr<'a>> {
        let expr: Expr<'a> = self.logical_or()?;

        if self.matches(TokenType::EQUAL) {
            let equals = self.previous();
            let value: Expr<'a> = self.assignment()?;

            if let Expr::Variable { name, .. } = expr {
                return Ok(Expr::Assign {
                    id: self.fresh_id(),
                    name,
                    value: Box::new(value),
                });
            }

            // Reported, but the parser is not confused: no need to synchronize.
            self.report(equals, "Invalid assignment target.");
        }

        Ok(expr)
    }

    fn logical_or(&mut self) -> Result<Expr<'a>> {
        let mut expr: Expr<'a> = self.logical_and()?;

        while self.matches(TokenType::OR) {
            let operator = self.previous();
            let right: Expr<'a> = self.logical_and()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn logical_and(&mut self) -> Result<Expr<'a>> {
        let mut expr: Expr<'a> = self.equality()?;

        while self.matches(TokenType::AND) {
            let operator = self.previous();
            let right: Expr<'a> = self.equality()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr<'a>> {
        self.binary_level(
            &[TokenType::BANG_EQUAL, TokenType::EQUAL_EQUAL],
            Self::comparison,
        )
    }

    fn comparison(&mut self) -> Result<Expr<'a>> {
        self.binary_level(
            &[
                TokenType::GREATER,
                TokenType::GREATER_EQUAL,
                TokenType::LESS,
                TokenType::LESS_EQUAL,
            ],
            Self::term,
        )
    }

    fn term(&mut self) -> Result<Expr<'a>> {
        self.binary_level(&[TokenType::MINUS, TokenType::PLUS], Self::factor)
    }

    fn factor(&mut self) -> Result<Expr<'a>> {
        self.binary_level(&[TokenType::SLASH, TokenType::STAR], Self::unary)
    }

    /// One left‑associative binary precedence level: `operand ( op operand )*`.
    fn binary_level(
        &mut self,
        operators: &[TokenType],
        operand: fn(&mut Self) -> Result<Expr<'a>>,
    ) -> Result<Expr<'a>> {
        let mut expr: Expr<'a> = operand(self)?;

        while self.matches_any(operators) {
            let operator = self.previous();
            let right: Expr<'a> = operand(self)?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr<'a>> {
        if self.matches_any(&[TokenType::BANG, TokenType::MINUS]) {
            let operator = self.previous();
            let right: Expr<'a> = ensure_sufficient_stack(|| self.unary())?;

            return Ok(Expr::Unary {
                operator,
                right: Box::new(right),
            });
        }

        self.call()
    }

    fn call(&mut self) -> Result<Expr<'a>> {
        let mut expr: Expr<'a> = self.primary()?;

        while self.matches(TokenType::LEFT_PAREN) {
            expr = self.finish_call(expr)?;
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr<'a>) -> Result<Expr<'a>> {
        let mut arguments: Vec<Expr<'a>> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if arguments.len() >= MAX_ARITY {
                    self.report(self.peek(), "Can't have more than 255 arguments.");
                }

                arguments.push(self.expression()?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        let paren = self.consume(TokenType::RIGHT_PAREN, "Expect ')' after arguments.")?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn primary(&mut self) -> Result<Expr<'a>> {
        if self.matches(TokenType::FALSE) {
            return Ok(Expr::Literal(LiteralValue::False));
        }
        if self.matches(TokenType::TRUE) {
            return Ok(Expr::Literal(LiteralValue::True));
        }
        if self.matches(TokenType::NIL) {
            return Ok(Expr::Literal(LiteralValue::Nil));
        }

        if self.matches_any(&[TokenType::NUMBER, TokenType::STRING]) {
            let token = self.previous();

            return match &token.literal {
                Some(Literal::Number(n)) => Ok(Expr::Literal(LiteralValue::Number(*n))),
                Some(Literal::Str(s)) => Ok(Expr::Literal(LiteralValue::Str(s.clone()))),
                None => Err(LoxError::parse(token, "Literal token without a value.")),
            };
        }

        if self.matches(TokenType::IDENTIFIER) {
            return Ok(Expr::Variable {
                id: self.fresh_id(),
                name: self.previous(),
            });
        }

        if self.matches(TokenType::LEFT_PAREN) {
            let expr: Expr<'a> = self.expression()?;

            self.consume(TokenType::RIGHT_PAREN, "Expect ')' after expression.")?;

            return Ok(Expr::Grouping(Box::new(expr)));
        }

        Err(LoxError::parse(self.peek(), "Expect expression."))
    }

    // ────────────────────── utility helpers ───────────────────────

    fn fresh_id(&mut self) -> ExprId {
        let id = ExprId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Record a syntax error that does not need recovery.
    fn report(&mut self, token: &Token<'_>, message: &str) {
        self.errors.push(LoxError::parse(token, message));
    }

    #[inline(always)]
    fn matches(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();

            return true;
        }

        false
    }

    #[inline(always)]
    fn matches_any(&mut self, ttypes: &[TokenType]) -> bool {
        ttypes.iter().any(|&ttype| self.matches(ttype))
    }

    #[inline(always)]
    fn consume(&mut self, ttype: TokenType, message: &str) -> Result<&'a Token<'a>> {
        if self.check(ttype) {
            return Ok(self.advance());
        }

        Err(LoxError::parse(self.peek(), message))
    }

    #[inline(always)]
    fn check(&self, ttype: TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().token_type == ttype
    }

    #[inline(always)]
    fn advance(&mut self) -> &'a Token<'a> {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::EOF
    }

    #[inline(always)]
    fn peek(&self) -> &'a Token<'a> {
        self.tokens.get(self.current).unwrap_or(&END)
    }

    #[inline(always)]
    fn previous(&self) -> &'a Token<'a> {
        match self.current.checked_sub(1) {
            Some(i) => &self.tokens[i],
            None => self.peek(),
        }
    }

    /// Discards tokens until it thinks it is at a statement boundary.
    fn synchronize(&mut self) {
        self.advance(); // skip the token that caused the error

        while !self.is_at_end() {
            if self.previous().token_type == TokenType::SEMICOLON {
                return;
            }

            match self.peek().token_type {
                TokenType::CLASS
                | TokenType::FUN
                | TokenType::VAR
                | TokenType::FOR
                | TokenType::IF
                | TokenType::WHILE
                | TokenType::PRINT
                | TokenType::RETURN => return,
                _ => {}
            }

            self.advance();
        }
    }
}
