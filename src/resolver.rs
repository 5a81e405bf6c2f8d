//! Static resolver pass for the **Lox** interpreter.
//!
//! This resolver does three things in one AST walk:
//! 1. Build lexical scopes (stack of `HashMap<&str,bool>` tracking declared/defined).
//! 2. Report static errors (redeclaration, read in own initializer, top‑level `return`).
//! 3. Record, for *each* local variable occurrence, how many scopes out its
//!    declaration lives, so the interpreter never falls back to dynamic
//!    lookup that would see a later shadowing local.
//!
//! Occurrences missing from the resulting [`Locals`] table are globals.

use crate::ast::{Expr, ExprId, FunctionDecl, Stmt};
use crate::error::LoxError;
use crate::stack::ensure_sufficient_stack;
use crate::token::Token;
use log::{debug, info};
use std::collections::HashMap;

/// Scope‑distance table: expression id → number of enclosing hops.
pub type Locals = HashMap<ExprId, usize>;

/// Are we inside a user function? Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
}

/// Resolver: tracks scopes, enforces static rules, and records binding
/// distances for locals.
pub struct Resolver<'a> {
    scopes: Vec<HashMap<&'a str, bool>>, // false=declared, true=defined
    current_function: FunctionType,
    locals: Locals,
    errors: Vec<LoxError>,
}

impl<'a> Default for Resolver<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Resolver<'a> {
    pub fn new() -> Self {
        info!("Resolver instantiated");

        Resolver {
            scopes: Vec::new(),
            current_function: FunctionType::None,
            locals: HashMap::new(),
            errors: Vec::new(),
        }
    }

    /// Walk all top‑level statements. Keeps going after a static error so
    /// every one of them is reported.
    pub fn resolve(mut self, statements: &[Stmt<'a>]) -> Result<Locals, Vec<LoxError>> {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        self.resolve_stmts(statements);

        if self.errors.is_empty() {
            info!("Resolved {} local reference(s)", self.locals.len());

            Ok(self.locals)
        } else {
            info!("Resolution failed with {} error(s)", self.errors.len());

            Err(self.errors)
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmts(&mut self, statements: &[Stmt<'a>]) {
        for stmt in statements {
            self.resolve_stmt(stmt);
        }
    }

    fn resolve_stmt(&mut self, stmt: &Stmt<'a>) {
        ensure_sufficient_stack(|| self.resolve_stmt_inner(stmt))
    }

    fn resolve_stmt_inner(&mut self, stmt: &Stmt<'a>) {
        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();
                self.resolve_stmts(statements);
                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                // declare → resolve initializer → define
                self.declare(name);
                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }
                self.define(name);
            }

            Stmt::Function(decl) => {
                // Defined before the body so the function can recurse.
                self.declare(decl.name);
                self.define(decl.name);
                self.resolve_function(decl);
            }

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.error(keyword, "Can't return from top-level code.");
                }
                if let Some(expr) = value {
                    self.resolve_expr(expr);
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr<'a>) {
        ensure_sufficient_stack(|| self.resolve_expr_inner(expr))
    }

    fn resolve_expr_inner(&mut self, expr: &Expr<'a>) {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => self.resolve_expr(inner),

            Expr::Unary { right, .. } => self.resolve_expr(right),

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Variable { id, name } => {
                let in_own_initializer = self
                    .scopes
                    .last()
                    .is_some_and(|scope| scope.get(name.lexeme) == Some(&false));

                if in_own_initializer {
                    self.error(name, "Can't read local variable in its own initializer.");
                }

                self.resolve_local(*id, name);
            }

            Expr::Assign { id, name, value } => {
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Fresh scope for a function’s parameters + body.
    fn resolve_function(&mut self, decl: &FunctionDecl<'a>) {
        let enclosing = self.current_function;
        self.current_function = FunctionType::Function;

        self.begin_scope();
        for param in &decl.params {
            self.declare(param);
            self.define(param);
        }
        self.resolve_stmts(&decl.body);
        self.end_scope();

        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    /// No‑op at global scope: globals may be redeclared freely.
    fn declare(&mut self, name: &Token<'a>) {
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };

        if scope.contains_key(name.lexeme) {
            self.error(name, "Already a variable with this name in this scope.");
            return;
        }

        scope.insert(name.lexeme, false);
    }

    fn define(&mut self, name: &Token<'a>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme, true);
        }
    }

    fn error(&mut self, token: &Token<'_>, message: &str) {
        self.errors.push(LoxError::resolve(token, message));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding‑distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this occurrence as a local at depth `d`, or leave it out of
    /// the table if no scope declares it (global).
    fn resolve_local(&mut self, id: ExprId, name: &Token<'a>) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(name.lexeme) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);
                self.locals.insert(id, depth);
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }
}
