//! Chained scope frames.
//!
//! Frames are shared (`Rc<RefCell<_>>`): every block or call creates a child
//! of the frame active at that point, and closures keep their declaring
//! frame alive. A write through any handle is visible through all of them.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;

/// Shared handle to a frame.
pub type Env<'a> = Rc<RefCell<Environment<'a>>>;

#[derive(Default)]
pub struct Environment<'a> {
    values: HashMap<&'a str, Value<'a>>,
    enclosing: Option<Env<'a>>,
}

impl<'a> Environment<'a> {
    /// A root (global) frame.
    pub fn new() -> Env<'a> {
        Rc::new(RefCell::new(Environment::default()))
    }

    /// A child frame of `enclosing`.
    pub fn with_enclosing(enclosing: &Env<'a>) -> Env<'a> {
        Rc::new(RefCell::new(Environment {
            values: HashMap::new(),
            enclosing: Some(Rc::clone(enclosing)),
        }))
    }

    pub fn enclosing(&self) -> Option<Env<'a>> {
        self.enclosing.clone()
    }

    /// Bind `name` in this frame, shadowing any earlier binding here.
    pub fn define(&mut self, name: &'a str, value: Value<'a>) {
        self.values.insert(name, value);
    }

    /// Look `name` up by walking the chain outward.
    pub fn get(&self, name: &Token<'a>) -> Result<Value<'a>> {
        if let Some(value) = self.values.get(name.lexeme) {
            return Ok(value.clone());
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.borrow().get(name),
            None => Err(undefined(name)),
        }
    }

    /// Overwrite an existing binding found by walking the chain outward.
    /// Never declares.
    pub fn assign(&mut self, name: &Token<'a>, value: Value<'a>) -> Result<()> {
        if let Some(slot) = self.values.get_mut(name.lexeme) {
            *slot = value;
            return Ok(());
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.borrow_mut().assign(name, value),
            None => Err(undefined(name)),
        }
    }

    /// The frame exactly `distance` links out from `env`.
    ///
    /// The resolver guarantees the chain is at least that deep.
    pub fn ancestor(env: &Env<'a>, distance: usize) -> Env<'a> {
        let mut frame = Rc::clone(env);

        for _ in 0..distance {
            let next = frame.borrow().enclosing();

            match next {
                Some(next) => frame = next,
                None => break,
            }
        }

        frame
    }

    /// Read `name` directly from the frame `distance` hops out.
    pub fn get_at(env: &Env<'a>, distance: usize, name: &Token<'a>) -> Result<Value<'a>> {
        debug!("get_at: '{}' at distance {}", name.lexeme, distance);

        let frame = Self::ancestor(env, distance);
        let value = frame.borrow().values.get(name.lexeme).cloned();

        value.ok_or_else(|| undefined(name))
    }

    /// Write `name` directly into the frame `distance` hops out.
    pub fn assign_at(
        env: &Env<'a>,
        distance: usize,
        name: &Token<'a>,
        value: Value<'a>,
    ) -> Result<()> {
        debug!("assign_at: '{}' at distance {}", name.lexeme, distance);

        let frame = Self::ancestor(env, distance);
        let mut frame = frame.borrow_mut();

        match frame.values.get_mut(name.lexeme) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(undefined(name)),
        }
    }
}

fn undefined(name: &Token<'_>) -> LoxError {
    LoxError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;

    fn ident(name: &str) -> Token<'_> {
        Token::new(TokenType::IDENTIFIER, name, 1)
    }

    #[test]
    fn get_walks_outward_to_the_root() {
        let globals = Environment::new();
        globals.borrow_mut().define("a", Value::Number(1.0));

        let inner = Environment::with_enclosing(&Environment::with_enclosing(&globals));

        assert_eq!(inner.borrow().get(&ident("a")).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn assign_to_unbound_name_is_an_error() {
        let globals = Environment::new();
        let err = globals
            .borrow_mut()
            .assign(&ident("missing"), Value::Nil)
            .unwrap_err();

        assert_eq!(err.message(), "Undefined variable 'missing'.");
        assert!(globals.borrow().get(&ident("missing")).is_err());
    }

    #[test]
    fn redefine_in_same_frame_overwrites() {
        let env = Environment::new();
        env.borrow_mut().define("a", Value::Number(1.0));
        env.borrow_mut().define("a", Value::Number(2.0));

        assert_eq!(env.borrow().get(&ident("a")).unwrap(), Value::Number(2.0));
    }

    #[test]
    fn get_at_skips_nearer_shadowing_bindings() {
        let outer = Environment::new();
        outer.borrow_mut().define("a", Value::String("outer".into()));

        let inner = Environment::with_enclosing(&outer);
        inner.borrow_mut().define("a", Value::String("inner".into()));

        let a = ident("a");
        assert_eq!(
            Environment::get_at(&inner, 1, &a).unwrap(),
            Value::String("outer".into())
        );
        assert_eq!(
            Environment::get_at(&inner, 0, &a).unwrap(),
            Value::String("inner".into())
        );
    }

    #[test]
    fn assign_at_is_visible_through_every_alias() {
        let shared = Environment::new();
        shared.borrow_mut().define("count", Value::Number(0.0));

        let first = Environment::with_enclosing(&shared);
        let second = Environment::with_enclosing(&shared);

        let count = ident("count");
        Environment::assign_at(&first, 1, &count, Value::Number(5.0)).unwrap();

        assert_eq!(
            Environment::get_at(&second, 1, &count).unwrap(),
            Value::Number(5.0)
        );
    }
}
