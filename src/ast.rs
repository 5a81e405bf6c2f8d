//! Syntax tree produced by the [`Parser`](crate::parser::Parser).
//!
//! Nodes borrow their tokens from the token buffer, so a tree lives no
//! longer than the scanned source it came from.

use std::rc::Rc;

use crate::token::Token;

/// Stable identity of a variable‑referencing expression.
///
/// Handed out by the parser from a counter, so two textually identical
/// references at different positions never share an id. The resolver keys
/// its scope‑distance table by this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(pub usize);

/// A **literal constant** that appears directly in the source code.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Numeric literal ‑ stored as IEEE‑754 `f64`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    /// The boolean constant `true`.
    True,

    /// The boolean constant `false`.
    False,

    /// The `nil` literal.
    Nil,
}

/// **Abstract‑Syntax‑Tree node** representing every kind of *expression*.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr<'a> {
    /// A literal constant: number, string, `true`, `false`, or `nil`.
    Literal(LiteralValue),

    /// Parenthesised sub‑expression: `"(" expression ")"`.
    Grouping(Box<Expr<'a>>),

    /// Prefix unary operator expression, `!isReady` or `-42`.
    Unary {
        /// The operator token (`!` or `-`).
        operator: &'a Token<'a>,
        right: Box<Expr<'a>>,
    },

    /// Infix binary operator expression, `a + b`, `x <= y`.
    Binary {
        left: Box<Expr<'a>>,
        operator: &'a Token<'a>,
        right: Box<Expr<'a>>,
    },

    /// Short‑circuiting logical operators `and` / `or`.
    Logical {
        left: Box<Expr<'a>>,
        operator: &'a Token<'a>, // `AND` or `OR`
        right: Box<Expr<'a>>,
    },

    /// Variable access.
    Variable { id: ExprId, name: &'a Token<'a> },

    /// Assignment expression: `identifier "=" expression`.
    Assign {
        id: ExprId,
        name: &'a Token<'a>,
        value: Box<Expr<'a>>,
    },

    /// Function call, `clock()` or `add(1, 2)`.
    Call {
        callee: Box<Expr<'a>>,
        /// The closing `)` token ‑ retained for error reporting.
        paren: &'a Token<'a>,
        arguments: Vec<Expr<'a>>,
    },
}

/// A named function declaration. Shared between the tree and every
/// function value created from it.
#[derive(Debug, PartialEq)]
pub struct FunctionDecl<'a> {
    pub name: &'a Token<'a>,

    /// Parameter name tokens (arity ≤ 255).
    pub params: Vec<&'a Token<'a>>,

    pub body: Vec<Stmt<'a>>,
}

/// **Abstract‑Syntax‑Tree node** for *statements*. A program is a sequence
/// of these nodes returned by [`Parser::parse`](crate::parser::Parser::parse).
///
/// There is no `for` node: the parser lowers it to `While` inside blocks.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt<'a> {
    /// Stand‑alone expression terminated by a semicolon.
    Expression(Expr<'a>),

    /// `print` statement used for output.
    Print(Expr<'a>),

    /// Variable declaration: `"var" IDENT ("=" initializer)? ";"`.
    Var {
        name: &'a Token<'a>,
        initializer: Option<Expr<'a>>,
    },

    /// Braced scope containing zero or more declarations/statements.
    Block(Vec<Stmt<'a>>),

    /// `if` / `else` conditional.
    If {
        condition: Expr<'a>,
        then_branch: Box<Stmt<'a>>,
        else_branch: Option<Box<Stmt<'a>>>,
    },

    /// `while` loop.
    While {
        condition: Expr<'a>,
        body: Box<Stmt<'a>>,
    },

    /// Function declaration ‑ becomes a first‑class callable value.
    Function(Rc<FunctionDecl<'a>>),

    /// `return` statement inside a function body.
    Return {
        /// The `return` keyword token (for error locations).
        keyword: &'a Token<'a>,

        /// Absent ⇒ `nil` is returned.
        value: Option<Expr<'a>>,
    },
}
