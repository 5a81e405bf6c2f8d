//! Tree‑walking evaluator.
//!
//! Statements execute against a chain of [`Environment`] frames. The
//! resolver's [`Locals`] table tells each variable reference how many frames
//! out its binding lives; references missing from it are looked up by name
//! in the globals.
//!
//! `return` is not an error: statement execution yields a [`Flow`] that every
//! block and loop forwards until a function call consumes it.

use std::io::Write;
use std::rc::Rc;

use chrono::Utc;
use log::{debug, info};

use crate::ast::{Expr, ExprId, LiteralValue, Stmt};
use crate::environment::{Env, Environment};
use crate::error::{LoxError, Result};
use crate::resolver::Locals;
use crate::stack::ensure_sufficient_stack;
use crate::token::{Token, TokenType};
use crate::value::{Callable, Function, NativeFunction, Value};

/// How a statement finished.
#[derive(Debug, PartialEq)]
pub enum Flow<'a> {
    /// Fell off the end; continue with the next statement.
    Normal,

    /// A `return` is unwinding towards the nearest call.
    Return(Value<'a>),
}

pub struct Interpreter<'a, W: Write> {
    globals: Env<'a>,
    environment: Env<'a>,
    locals: Locals,
    out: W,
}

/// Seconds since the Unix epoch.
fn clock<'v>(_args: &[Value<'v>]) -> std::result::Result<Value<'v>, String> {
    let millis = Utc::now().timestamp_millis();

    Ok(Value::Number(millis as f64 / 1000.0))
}

impl<'a, W: Write> Interpreter<'a, W> {
    /// Creates an interpreter printing to `out`, with native functions such
    /// as `clock` defined in the global frame.
    pub fn new(out: W) -> Self {
        info!("Initializing Interpreter");

        let globals = Environment::new();

        debug!("Defining native function 'clock'");

        globals.borrow_mut().define(
            "clock",
            Value::Callable(Callable::Native(NativeFunction {
                name: "clock",
                arity: 0,
                func: clock,
            })),
        );

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: Locals::new(),
            out,
        }
    }

    /// Merge a resolver table. Ids are unique per parse, so tables from
    /// separate parses of separate token buffers must not be mixed.
    pub fn load_locals(&mut self, locals: Locals) {
        debug!("Loading {} resolved local(s)", locals.len());

        self.locals.extend(locals);
    }

    pub fn globals(&self) -> &Env<'a> {
        &self.globals
    }

    /// Runs a program. The first runtime error aborts the remaining
    /// statements and is returned.
    pub fn interpret(&mut self, statements: &[Stmt<'a>]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            // A stray top‑level `return` is rejected by the resolver.
            self.execute(stmt)?;
        }

        info!("Interpretation completed successfully");

        Ok(())
    }

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt<'a>) -> Result<Flow<'a>> {
        ensure_sufficient_stack(|| self.execute_stmt(stmt))
    }

    fn execute_stmt(&mut self, stmt: &Stmt<'a>) -> Result<Flow<'a>> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.out, "{}", value)?;
                debug!("Printed value: {}", value);
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Defining variable '{}' = {}", name.lexeme, value);

                self.environment.borrow_mut().define(name.lexeme, value);
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let frame = Environment::with_enclosing(&self.environment);
                self.execute_block(statements, frame)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::Function(decl) => {
                debug!("Defining function '{}'", decl.name.lexeme);

                let function = Function {
                    declaration: Rc::clone(decl),
                    closure: Rc::clone(&self.environment),
                };

                self.environment.borrow_mut().define(
                    decl.name.lexeme,
                    Value::Callable(Callable::Function(Rc::new(function))),
                );
                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Returning value: {}", value);
                Ok(Flow::Return(value))
            }
        }
    }

    /// Runs `statements` with `frame` as the current environment, then
    /// restores the previous one whether they completed, returned or failed.
    pub fn execute_block(&mut self, statements: &[Stmt<'a>], frame: Env<'a>) -> Result<Flow<'a>> {
        let previous = std::mem::replace(&mut self.environment, frame);

        let result = self.execute_all(statements);

        self.environment = previous;
        result
    }

    fn execute_all(&mut self, statements: &[Stmt<'a>]) -> Result<Flow<'a>> {
        for stmt in statements {
            if let Flow::Return(value) = self.execute(stmt)? {
                return Ok(Flow::Return(value));
            }
        }

        Ok(Flow::Normal)
    }

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr<'a>) -> Result<Value<'a>> {
        // Lox calls recurse through here, so this also bounds call depth
        // by memory rather than by the thread's stack.
        ensure_sufficient_stack(|| self.evaluate_expr(expr))
    }

    fn evaluate_expr(&mut self, expr: &Expr<'a>) -> Result<Value<'a>> {
        match expr {
            Expr::Literal(lit) => Ok(match lit {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left_val = self.evaluate(left)?;

                let short_circuit = if operator.token_type == TokenType::OR {
                    left_val.is_truthy()
                } else {
                    !left_val.is_truthy()
                };

                if short_circuit {
                    Ok(left_val)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => {
                        Environment::assign_at(&self.environment, distance, name, value.clone())?
                    }
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_val = self.evaluate(callee)?;

                let mut arg_values = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    arg_values.push(self.evaluate(arg)?);
                }

                self.call_value(callee_val, paren, arg_values)
            }
        }
    }

    fn look_up_variable(&self, id: ExprId, name: &Token<'a>) -> Result<Value<'a>> {
        match self.locals.get(&id) {
            Some(&distance) => Environment::get_at(&self.environment, distance, name),
            None => self.globals.borrow().get(name),
        }
    }

    fn evaluate_unary(&mut self, op: &Token<'a>, expr: &Expr<'a>) -> Result<Value<'a>> {
        let right_val = self.evaluate(expr)?;

        match op.token_type {
            TokenType::MINUS => match right_val {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(LoxError::runtime(op, "Operand must be a number.")),
            },

            TokenType::BANG => Ok(Value::Bool(!right_val.is_truthy())),

            _ => Err(LoxError::runtime(op, "Invalid unary operator.")),
        }
    }

    fn evaluate_binary(
        &mut self,
        left: &Expr<'a>,
        op: &Token<'a>,
        right: &Expr<'a>,
    ) -> Result<Value<'a>> {
        let left_val = self.evaluate(left)?;
        let right_val = self.evaluate(right)?;

        match op.token_type {
            TokenType::PLUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                _ => Err(LoxError::runtime(
                    op,
                    "Operands must be two numbers or two strings.",
                )),
            },

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left_val == right_val)),
            TokenType::BANG_EQUAL => Ok(Value::Bool(left_val != right_val)),

            _ => {
                let (a, b) = match (left_val, right_val) {
                    (Value::Number(a), Value::Number(b)) => (a, b),
                    _ => return Err(LoxError::runtime(op, "Operands must be numbers.")),
                };

                match op.token_type {
                    TokenType::MINUS => Ok(Value::Number(a - b)),
                    TokenType::STAR => Ok(Value::Number(a * b)),
                    // Dividing by zero yields ±Infinity or NaN.
                    TokenType::SLASH => Ok(Value::Number(a / b)),
                    TokenType::LESS => Ok(Value::Bool(a < b)),
                    TokenType::LESS_EQUAL => Ok(Value::Bool(a <= b)),
                    TokenType::GREATER => Ok(Value::Bool(a > b)),
                    TokenType::GREATER_EQUAL => Ok(Value::Bool(a >= b)),
                    _ => Err(LoxError::runtime(op, "Invalid binary operator.")),
                }
            }
        }
    }

    /// Invokes a callable (native or user-defined function).
    fn call_value(
        &mut self,
        callee: Value<'a>,
        paren: &Token<'a>,
        args: Vec<Value<'a>>,
    ) -> Result<Value<'a>> {
        let Value::Callable(callable) = callee else {
            return Err(LoxError::runtime(paren, "Can only call functions."));
        };

        if args.len() != callable.arity() {
            return Err(LoxError::runtime(
                paren,
                format!(
                    "Expected {} arguments but got {}.",
                    callable.arity(),
                    args.len()
                ),
            ));
        }

        debug!("Calling '{}' with {} argument(s)", callable.name(), args.len());

        match callable {
            Callable::Native(native) => {
                (native.func)(&args).map_err(|msg| LoxError::runtime(paren, msg))
            }

            Callable::Function(function) => {
                // Lexical scoping: the new frame hangs off the closure, not
                // off the caller's frame.
                let frame = Environment::with_enclosing(&function.closure);

                {
                    let mut frame = frame.borrow_mut();
                    for (param, arg) in function.declaration.params.iter().zip(args) {
                        frame.define(param.lexeme, arg);
                    }
                }

                let result = match self.execute_block(&function.declaration.body, frame)? {
                    Flow::Return(value) => value,
                    Flow::Normal => Value::Nil,
                };

                debug!("'{}' returned {}", function.declaration.name.lexeme, result);

                Ok(result)
            }
        }
    }
}
