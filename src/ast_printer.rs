use crate::ast::{Expr, LiteralValue, Stmt};
use crate::stack::ensure_sufficient_stack;

/// Renders a literal the way both printers show it: numbers always keep a
/// fractional part (`3.0`).
fn literal(lit: &LiteralValue) -> String {
    match lit {
        LiteralValue::True => "true".into(),

        LiteralValue::False => "false".into(),

        LiteralValue::Nil => "nil".into(),

        LiteralValue::Str(s) => s.clone(),

        LiteralValue::Number(n) => {
            if n.fract() == 0.0 {
                format!("{:.1}", n)
            } else {
                n.to_string()
            }
        }
    }
}

/// Converts a tree to the Crafting‑Interpreters parenthesized prefix form.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr<'_>) -> String {
        ensure_sufficient_stack(|| Self::print_expr(expr))
    }

    fn print_expr(expr: &Expr<'_>) -> String {
        match expr {
            Expr::Literal(lit) => literal(lit),

            Expr::Grouping(inner) => format!("(group {})", Self::print(inner)),

            Expr::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, Self::print(right))
            }

            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                operator.lexeme,
                Self::print(left),
                Self::print(right)
            ),

            Expr::Variable { name, .. } => name.lexeme.into(),

            Expr::Assign { name, value, .. } => {
                format!("(= {} {})", name.lexeme, Self::print(value))
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                let mut s = format!("(call {}", Self::print(callee));
                for arg in arguments {
                    s.push(' ');
                    s.push_str(&Self::print(arg));
                }
                s.push(')');
                s
            }
        }
    }

    /// Statements in the same prefix style, e.g. `(var x 1.0)`.
    pub fn print_stmt(stmt: &Stmt<'_>) -> String {
        match stmt {
            Stmt::Expression(expr) => format!("(; {})", Self::print(expr)),

            Stmt::Print(expr) => format!("(print {})", Self::print(expr)),

            Stmt::Var { name, initializer } => match initializer {
                Some(init) => format!("(var {} {})", name.lexeme, Self::print(init)),
                None => format!("(var {})", name.lexeme),
            },

            Stmt::Block(statements) => {
                let mut s = String::from("(block");
                for inner in statements {
                    s.push(' ');
                    s.push_str(&Self::print_stmt(inner));
                }
                s.push(')');
                s
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(eb) => format!(
                    "(if-else {} {} {})",
                    Self::print(condition),
                    Self::print_stmt(then_branch),
                    Self::print_stmt(eb)
                ),
                None => format!(
                    "(if {} {})",
                    Self::print(condition),
                    Self::print_stmt(then_branch)
                ),
            },

            Stmt::While { condition, body } => format!(
                "(while {} {})",
                Self::print(condition),
                Self::print_stmt(body)
            ),

            Stmt::Function(decl) => {
                let params: Vec<&str> = decl.params.iter().map(|p| p.lexeme).collect();
                let mut s = format!("(fun {}({})", decl.name.lexeme, params.join(" "));
                for inner in &decl.body {
                    s.push(' ');
                    s.push_str(&Self::print_stmt(inner));
                }
                s.push(')');
                s
            }

            Stmt::Return { value, .. } => match value {
                Some(v) => format!("(return {})", Self::print(v)),
                None => "(return)".into(),
            },
        }
    }
}

/// Reverse‑Polish form: operands first, operator last, no grouping
/// parentheses. `(1 + 2) * (4 - 3)` prints as `1.0 2.0 + 4.0 3.0 - *`.
pub struct RpnPrinter;

impl RpnPrinter {
    pub fn print(expr: &Expr<'_>) -> String {
        ensure_sufficient_stack(|| Self::print_expr(expr))
    }

    fn print_expr(expr: &Expr<'_>) -> String {
        match expr {
            Expr::Literal(lit) => literal(lit),

            Expr::Grouping(inner) => Self::print(inner),

            Expr::Unary { operator, right } => {
                format!("{} {}", Self::print(right), operator.lexeme)
            }

            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => format!(
                "{} {} {}",
                Self::print(left),
                Self::print(right),
                operator.lexeme
            ),

            Expr::Variable { name, .. } => name.lexeme.into(),

            Expr::Assign { name, value, .. } => format!("{} {} =", name.lexeme, Self::print(value)),

            Expr::Call {
                callee, arguments, ..
            } => {
                let mut parts: Vec<String> = arguments.iter().map(Self::print).collect();
                parts.push(Self::print(callee));
                parts.push(format!("call/{}", arguments.len()));
                parts.join(" ")
            }
        }
    }
}
