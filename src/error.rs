//! Centralised error hierarchy for the **Lox interpreter**.
//!
//! All subsystems (scanner, parser, resolver, runtime, CLI) convert their
//! internal failure modes into one of the variants defined here. Syntax and
//! resolution errors are static: they are collected and reported together,
//! and they prevent execution. Runtime errors abort the current run.
//!
//! The module **does not** print diagnostics itself

use std::io;
use thiserror::Error;

use log::info;

use crate::token::{Token, TokenType};

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,

        /// ` at 'lexeme'` or ` at end`.
        location: String,
        line: usize,
    },

    /// Static‑analysis failure (redeclaration, self‑initializer, stray `return`).
    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        location: String,
        line: usize,
    },

    /// Runtime evaluation error, located at the offending token.
    #[error("{message}\n[line {line}]")]
    Runtime { message: String, line: usize },

    /// Wrapper around `std::io::Error` (transparent). Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),
}

/// Renders where in the token stream an error happened.
fn location(token: &Token<'_>) -> String {
    if token.token_type == TokenType::EOF {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(token: &Token<'_>, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", token.line, message);

        LoxError::Parse {
            message,
            location: location(token),
            line: token.line,
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(token: &Token<'_>, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: line={}, msg={}", token.line, message);

        LoxError::Resolve {
            message,
            location: location(token),
            line: token.line,
        }
    }

    /// Helper constructor for the **interpreter**.
    pub fn runtime<S: Into<String>>(token: &Token<'_>, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Runtime error: line={}, msg={}", token.line, message);

        LoxError::Runtime {
            message,
            line: token.line,
        }
    }

    /// The bare message, without line decoration.
    pub fn message(&self) -> String {
        match self {
            LoxError::Lex { message, .. }
            | LoxError::Parse { message, .. }
            | LoxError::Resolve { message, .. }
            | LoxError::Runtime { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Why a whole run of the pipeline failed.
#[derive(Debug, Error)]
pub enum Failure {
    /// Lexing, parsing or resolution reported errors; nothing was executed.
    #[error("{} static error(s)", .0.len())]
    Static(Vec<LoxError>),

    /// Execution started and was aborted by a runtime error.
    #[error(transparent)]
    Runtime(LoxError),
}

impl Failure {
    /// Conventional process exit status (sysexits `EX_DATAERR` / `EX_SOFTWARE`).
    pub fn exit_code(&self) -> i32 {
        match self {
            Failure::Static(_) => 65,
            Failure::Runtime(_) => 70,
        }
    }

    /// Every error carried by this failure, in report order.
    pub fn errors(&self) -> Vec<&LoxError> {
        match self {
            Failure::Static(errors) => errors.iter().collect(),
            Failure::Runtime(e) => vec![e],
        }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;
