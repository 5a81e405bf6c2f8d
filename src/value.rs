use std::fmt;
use std::rc::Rc;

use crate::ast::FunctionDecl;
use crate::environment::Env;

/// Host function signature: receives already‑evaluated arguments.
pub type NativeFn = for<'v> fn(&[Value<'v>]) -> Result<Value<'v>, String>;

/// A runtime value. Closed set: there is no user‑extensible variant.
#[derive(Debug, Clone)]
pub enum Value<'a> {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    Callable(Callable<'a>),
}

/// Anything that can appear on the left of `(...)`.
#[derive(Clone)]
pub enum Callable<'a> {
    /// A `fun` declaration paired with the frame it was declared in.
    Function(Rc<Function<'a>>),

    /// A function supplied by the host, such as `clock`.
    Native(NativeFunction),
}

/// A user‑defined function value.
pub struct Function<'a> {
    pub declaration: Rc<FunctionDecl<'a>>,

    /// Frame active when the declaration executed.
    pub closure: Env<'a>,
}

#[derive(Clone)]
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: NativeFn,
}

impl<'a> Callable<'a> {
    pub fn arity(&self) -> usize {
        match self {
            Callable::Function(f) => f.declaration.params.len(),
            Callable::Native(n) => n.arity,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Callable::Function(f) => f.declaration.name.lexeme,
            Callable::Native(n) => n.name,
        }
    }
}

// Closure frames can point back at the function itself, so Debug must not
// descend into them.
impl<'a> fmt::Debug for Callable<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Function(func) => write!(f, "Function({})", func.declaration.name.lexeme),
            Callable::Native(n) => write!(f, "Native({}/{})", n.name, n.arity),
        }
    }
}

impl<'a> Value<'a> {
    /// `nil` and `false` are falsey; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            _ => true,
        }
    }
}

impl<'a> PartialEq for Value<'a> {
    /// No cross‑variant coercion. Functions are equal only to themselves.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => same_number(*a, *b),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Callable(Callable::Function(a)), Value::Callable(Callable::Function(b))) => {
                Rc::ptr_eq(a, b)
            }
            (Value::Callable(Callable::Native(a)), Value::Callable(Callable::Native(b))) => {
                a.name == b.name
            }
            _ => false,
        }
    }
}

/// Number identity as Lox sees it: `NaN` equals itself and `0` differs
/// from `-0`.
fn same_number(a: f64, b: f64) -> bool {
    if a.is_nan() || b.is_nan() {
        a.is_nan() && b.is_nan()
    } else {
        a.to_bits() == b.to_bits()
    }
}

/// Integral numbers drop the ".0" suffix. Very large or very small
/// magnitudes use `1.0E21` style, and non-finite values are spelled out.
fn write_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.is_nan() {
        return write!(f, "NaN");
    }

    if n.is_infinite() {
        return write!(f, "{}", if n > 0.0 { "Infinity" } else { "-Infinity" });
    }

    let magnitude = n.abs();

    if magnitude >= 1e7 || (magnitude != 0.0 && magnitude < 1e-3) {
        let sci = format!("{:e}", n);
        let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));

        return if mantissa.contains('.') {
            write!(f, "{}E{}", mantissa, exponent)
        } else {
            write!(f, "{}.0E{}", mantissa, exponent)
        };
    }

    if n.fract() == 0.0 {
        write!(f, "{:.0}", n)
    } else {
        write!(f, "{}", n)
    }
}

impl<'a> fmt::Display for Value<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Number(n) => write_number(f, *n),

            Value::String(s) => write!(f, "{}", s),

            Value::Callable(Callable::Function(func)) => {
                write!(f, "<fn {}>", func.declaration.name.lexeme)
            }

            Value::Callable(Callable::Native(_)) => write!(f, "<native fn>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_numbers_print_without_fraction() {
        assert_eq!(Value::Number(3.0).to_string(), "3");
        assert_eq!(Value::Number(-12.0).to_string(), "-12");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
    }

    #[test]
    fn extreme_numbers_use_exponent_form() {
        assert_eq!(Value::Number(1e21).to_string(), "1.0E21");
        assert_eq!(Value::Number(1.5e-5).to_string(), "1.5E-5");
        assert_eq!(Value::Number(-12345678.0).to_string(), "-1.2345678E7");
        assert_eq!(Value::Number(9999999.0).to_string(), "9999999");
        assert_eq!(Value::Number(0.001).to_string(), "0.001");
    }

    #[test]
    fn non_finite_numbers_are_spelled_out() {
        assert_eq!(Value::Number(f64::INFINITY).to_string(), "Infinity");
        assert_eq!(Value::Number(f64::NEG_INFINITY).to_string(), "-Infinity");
        assert_eq!(Value::Number(f64::NAN).to_string(), "NaN");
    }

    #[test]
    fn nan_equals_itself_and_zero_signs_differ() {
        assert_eq!(Value::Number(f64::NAN), Value::Number(f64::NAN));
        assert_ne!(Value::Number(0.0), Value::Number(-0.0));
        assert_eq!(Value::Number(0.5), Value::Number(0.5));
    }

    #[test]
    fn nil_and_bools_print_as_keywords() {
        assert_eq!(Value::Nil.to_string(), "nil");
        assert_eq!(Value::Bool(true).to_string(), "true");
    }

    #[test]
    fn truthiness_only_rejects_nil_and_false() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Number(0.0).is_truthy());
        assert!(Value::String(String::new()).is_truthy());
    }

    #[test]
    fn equality_never_coerces_across_variants() {
        assert_eq!(Value::Nil, Value::Nil);
        assert_ne!(Value::Nil, Value::Bool(false));
        assert_ne!(Value::Number(1.0), Value::String("1".into()));
        assert_eq!(Value::String("a".into()), Value::String("a".into()));
    }
}
