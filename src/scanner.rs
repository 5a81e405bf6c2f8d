//! Module `scanner` implements a one‑pass, streaming lexer for the Lox language.
//!
//! It transforms a source string into a sequence of `Token<'a>`s, skipping whitespace
//! and comments, and emitting exactly one `EOF` token at the end. Designed as a `FusedIterator`,
//! it can be chained safely with other iterator adapters.
//!
//! # Public API
//!
//! - `Scanner::new(src: &'a str) -> Scanner<'a>`
//!   Create a new lexer over the input buffer.
//!
//! - `impl Iterator for Scanner<'a>`
//!   Yields `Result<Token<'a>, LoxError>` on each `.next()`. A lexing error does not stop
//!   the scan: the next call resumes after the offending character.
//!
//! - `Scanner::scan_all(self) -> (Vec<Token<'a>>, Vec<LoxError>)`
//!   Drains the iterator, splitting tokens from errors.
//!
//! # Token Recognition
//!
//! - Single‑character tokens: `(`, `)`, `{`, `}`, `,`, `.`, `-`, `+`, `;`, `*`.
//! - Two‑character operators: `!=`, `==`, `<=`, `>=`.
//! - String literals: `"` … `"`, allowing multi‑line and reporting unterminated errors.
//! - Numeric literals: integer and optional fractional part.
//! - Identifiers/keywords: alphanumeric/_ sequences, resolved via a perfect‑hash `KEYWORDS` map.
//!
//! Comments are skipped in bulk via `memchr`; lexemes are zero‑copy slices of the source.

use crate::error::{LoxError, Result};
use crate::token::{Literal, Token, TokenType};
use log::{debug, info};
use memchr::memchr;
use phf::phf_map;
use std::iter::FusedIterator;

// ─────────────────────────────────────────────────────────────────────────────
// Static keyword map (compile‑time perfect hash)
// ─────────────────────────────────────────────────────────────────────────────

static KEYWORDS: phf::Map<&'static str, TokenType> = phf_map! {
    "and"    => TokenType::AND,
    "class"  => TokenType::CLASS,
    "else"   => TokenType::ELSE,
    "false"  => TokenType::FALSE,
    "fun"    => TokenType::FUN,
    "for"    => TokenType::FOR,
    "if"     => TokenType::IF,
    "nil"    => TokenType::NIL,
    "or"     => TokenType::OR,
    "print"  => TokenType::PRINT,
    "return" => TokenType::RETURN,
    "super"  => TokenType::SUPER,
    "this"   => TokenType::THIS,
    "true"   => TokenType::TRUE,
    "var"    => TokenType::VAR,
    "while"  => TokenType::WHILE,
};

/// A single pass **scanner / lexer** that converts source text into a
/// sequence of [`Token`]s. The lifetime `'a` ties every emitted token’s
/// `lexeme` slice back to the original source buffer.
pub struct Scanner<'a> {
    src: &'a str,
    bytes: &'a [u8],
    start: usize,                // first byte of the current lexeme
    curr: usize,                 // one past the last byte examined
    line: usize,                 // 1‑based
    pending: Option<TokenType>,  // recognised token kind waiting to be emitted
    literal: Option<Literal>,    // payload for the pending token
}

impl<'a> Scanner<'a> {
    /// Create a new lexer over `src`.
    #[inline]
    pub fn new(src: &'a str) -> Self {
        info!("Scanner created over {} bytes", src.len());

        Self {
            src,
            bytes: src.as_bytes(),
            start: 0,
            curr: 0,
            line: 1,
            pending: None,
            literal: None,
        }
    }

    /// Scan the whole input, separating tokens from lexing errors.
    pub fn scan_all(self) -> (Vec<Token<'a>>, Vec<LoxError>) {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();

        for result in self {
            match result {
                Ok(token) => tokens.push(token),
                Err(e) => errors.push(e),
            }
        }

        info!(
            "Scanned {} tokens with {} error(s)",
            tokens.len(),
            errors.len()
        );

        (tokens, errors)
    }

    // ───────────────────────────── primitive helpers ────────────────────────

    #[inline(always)]
    const fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.len()
    }

    /// Advance one byte and return it. Callers guard with [`is_at_end`].
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.bytes[self.curr];
        self.curr += 1;
        b
    }

    /// Peek at the current byte; `0` past EOF.
    #[inline(always)]
    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.bytes[self.curr]
        }
    }

    #[inline(always)]
    fn peek_next(&self) -> u8 {
        if self.curr + 1 >= self.len() {
            0
        } else {
            self.bytes[self.curr + 1]
        }
    }

    #[inline(always)]
    fn match_byte(&mut self, expected: u8) -> bool {
        if !self.is_at_end() && self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    #[inline(always)]
    fn lexeme(&self) -> &'a str {
        &self.src[self.start..self.curr]
    }

    // ───────────────────────────── core lexing ─────────────────────────────

    /// Scan a *single* lexeme starting at `self.curr`. Whitespace and comments
    /// return `Ok(())` with `pending = None`.
    fn scan_token(&mut self) -> Result<()> {
        let b = self.advance();

        match b {
            b'(' => self.pending = Some(TokenType::LEFT_PAREN),
            b')' => self.pending = Some(TokenType::RIGHT_PAREN),
            b'{' => self.pending = Some(TokenType::LEFT_BRACE),
            b'}' => self.pending = Some(TokenType::RIGHT_BRACE),
            b',' => self.pending = Some(TokenType::COMMA),
            b'.' => self.pending = Some(TokenType::DOT),
            b'-' => self.pending = Some(TokenType::MINUS),
            b'+' => self.pending = Some(TokenType::PLUS),
            b';' => self.pending = Some(TokenType::SEMICOLON),
            b'*' => self.pending = Some(TokenType::STAR),

            b'!' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::BANG_EQUAL
                } else {
                    TokenType::BANG
                };

                self.pending = Some(tt);
            }

            b'=' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::EQUAL_EQUAL
                } else {
                    TokenType::EQUAL
                };

                self.pending = Some(tt);
            }

            b'<' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::LESS_EQUAL
                } else {
                    TokenType::LESS
                };

                self.pending = Some(tt);
            }

            b'>' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::GREATER_EQUAL
                } else {
                    TokenType::GREATER
                };

                self.pending = Some(tt);
            }

            b' ' | b'\r' | b'\t' => {
                return Ok(());
            }

            b'\n' => {
                self.line += 1;

                return Ok(());
            }

            b'/' => {
                if self.match_byte(b'/') {
                    // Fast‑forward to the next newline; the newline itself is
                    // left for the main loop so the line counter stays right.
                    if let Some(pos) = memchr(b'\n', &self.bytes[self.curr..]) {
                        self.curr += pos;
                    } else {
                        self.curr = self.len();
                    }

                    return Ok(());
                }

                self.pending = Some(TokenType::SLASH);
            }

            b'"' => {
                return self.parse_string();
            }

            b'0'..=b'9' => {
                self.parse_number();
            }

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                self.parse_identifier();
            }

            _ => {
                // Swallow UTF‑8 continuation bytes so the next lexeme starts on
                // a char boundary.
                while self.peek() & 0b1100_0000 == 0b1000_0000 {
                    self.advance();
                }

                return Err(LoxError::lex(
                    self.line,
                    format!("Unexpected character: {}", self.lexeme()),
                ));
            }
        }

        Ok(())
    }

    /// Parse a double‑quoted string literal. On return `self.curr` points
    /// past the closing `"`.
    fn parse_string(&mut self) -> Result<()> {
        while !self.is_at_end() && self.peek() != b'"' {
            if self.advance() == b'\n' {
                self.line += 1;
            }
        }

        if self.is_at_end() {
            return Err(LoxError::lex(self.line, "Unterminated string."));
        }

        self.advance(); // closing quote

        let contents: &str = &self.src[self.start + 1..self.curr - 1];

        self.pending = Some(TokenType::STRING);
        self.literal = Some(Literal::Str(contents.to_owned()));

        Ok(())
    }

    /// Parse a numeric literal (`123`, `3.14`). Fractions are optional.
    fn parse_number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance(); // "."

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        // Only digits and one interior '.' were consumed.
        let n: f64 = self.lexeme().parse::<f64>().unwrap_or(0.0);

        self.pending = Some(TokenType::NUMBER);
        self.literal = Some(Literal::Number(n));
    }

    /// Parse an identifier and decide if it is a **keyword** or a generic
    /// `IDENTIFIER` token.
    fn parse_identifier(&mut self) {
        while {
            let c: u8 = self.peek();
            c.is_ascii_alphanumeric() || c == b'_'
        } {
            self.advance();
        }

        let tt: TokenType = KEYWORDS
            .get(self.lexeme())
            .copied()
            .unwrap_or(TokenType::IDENTIFIER);

        self.pending = Some(tt);
    }
}

// ───────────────────────── Iterator implementation ─────────────────────────

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.curr <= self.len() {
            // Emit exactly one EOF, then terminate.
            if self.curr == self.len() {
                self.curr += 1;
                return Some(Ok(Token::new(TokenType::EOF, "", self.line)));
            }

            self.start = self.curr;
            self.pending = None;
            self.literal = None;

            if let Err(e) = self.scan_token() {
                return Some(Err(e));
            }

            if let Some(tt) = self.pending.take() {
                let lexeme = self.lexeme();
                debug!("Scanned token ({:?}) on line {}", tt, self.line);

                let token = match self.literal.take() {
                    Some(literal) => Token::with_literal(tt, lexeme, literal, self.line),
                    None => Token::new(tt, lexeme, self.line),
                };

                return Some(Ok(token));
            }
            // Whitespace / comment: keep scanning.
        }

        None
    }
}

impl<'a> FusedIterator for Scanner<'a> {}
