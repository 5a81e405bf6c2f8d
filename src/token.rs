use serde::Serialize;
use std::fmt;

/// The different kinds of tokens recognized by the Lox scanner.
///
/// Literal payloads live on [`Token::literal`], so the tag itself is a
/// plain `Copy` value that compares by variant.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenType {
    /// '('
    LEFT_PAREN,

    /// ')'
    RIGHT_PAREN,

    /// '{'
    LEFT_BRACE,

    /// '}'
    RIGHT_BRACE,

    /// ','
    COMMA,

    /// '.'
    DOT,

    /// '-'
    MINUS,

    /// '+'
    PLUS,

    /// ';'
    SEMICOLON,

    /// '/'
    SLASH,

    /// '*'
    STAR,

    /// '!'
    BANG,

    /// '!='
    BANG_EQUAL,

    /// '='
    EQUAL,

    /// '=='
    EQUAL_EQUAL,

    /// '>'
    GREATER,

    /// '>='
    GREATER_EQUAL,

    /// '<'
    LESS,

    /// '<='
    LESS_EQUAL,

    /// A user‑defined identifier
    IDENTIFIER,

    /// A string literal
    STRING,

    /// A numeric literal
    NUMBER,

    /// 'and'
    AND,

    /// 'class'
    CLASS,

    /// 'else'
    ELSE,

    /// 'false'
    FALSE,

    /// 'fun'
    FUN,

    /// 'for'
    FOR,

    /// 'if'
    IF,

    /// 'nil'
    NIL,

    /// 'or'
    OR,

    /// 'print'
    PRINT,

    /// 'return'
    RETURN,

    /// 'super'
    SUPER,

    /// 'this'
    THIS,

    /// 'true'
    TRUE,

    /// 'var'
    VAR,

    /// 'while'
    WHILE,

    /// End‑of‑file marker
    EOF,
}

impl TokenType {
    /// Upper‑case variant name, as printed by the `tokenize` command.
    pub fn name(self) -> &'static str {
        match self {
            TokenType::LEFT_PAREN => "LEFT_PAREN",
            TokenType::RIGHT_PAREN => "RIGHT_PAREN",
            TokenType::LEFT_BRACE => "LEFT_BRACE",
            TokenType::RIGHT_BRACE => "RIGHT_BRACE",
            TokenType::COMMA => "COMMA",
            TokenType::DOT => "DOT",
            TokenType::MINUS => "MINUS",
            TokenType::PLUS => "PLUS",
            TokenType::SEMICOLON => "SEMICOLON",
            TokenType::SLASH => "SLASH",
            TokenType::STAR => "STAR",
            TokenType::BANG => "BANG",
            TokenType::BANG_EQUAL => "BANG_EQUAL",
            TokenType::EQUAL => "EQUAL",
            TokenType::EQUAL_EQUAL => "EQUAL_EQUAL",
            TokenType::GREATER => "GREATER",
            TokenType::GREATER_EQUAL => "GREATER_EQUAL",
            TokenType::LESS => "LESS",
            TokenType::LESS_EQUAL => "LESS_EQUAL",
            TokenType::IDENTIFIER => "IDENTIFIER",
            TokenType::STRING => "STRING",
            TokenType::NUMBER => "NUMBER",
            TokenType::AND => "AND",
            TokenType::CLASS => "CLASS",
            TokenType::ELSE => "ELSE",
            TokenType::FALSE => "FALSE",
            TokenType::FUN => "FUN",
            TokenType::FOR => "FOR",
            TokenType::IF => "IF",
            TokenType::NIL => "NIL",
            TokenType::OR => "OR",
            TokenType::PRINT => "PRINT",
            TokenType::RETURN => "RETURN",
            TokenType::SUPER => "SUPER",
            TokenType::THIS => "THIS",
            TokenType::TRUE => "TRUE",
            TokenType::VAR => "VAR",
            TokenType::WHILE => "WHILE",
            TokenType::EOF => "EOF",
        }
    }
}

/// Pre‑parsed literal value carried by `NUMBER` and `STRING` tokens.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Literal {
    /// Numeric literal; integral lexemes such as `"3"` still become `3.0`.
    Number(f64),

    /// String literal contents without the surrounding quotes.
    Str(String),
}

/// A scanned token: type tag, the original lexeme, an optional literal
/// and the line number where it was found.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Token<'a> {
    /// The category of this token.
    pub token_type: TokenType,

    /// The exact substring from the source that produced this token.
    pub lexeme: &'a str,

    /// Literal payload for `NUMBER` / `STRING`, `None` otherwise.
    pub literal: Option<Literal>,

    /// 1‑based line number in the source.
    pub line: usize,
}

impl<'a> Token<'a> {
    /// Create a token without a literal payload.
    pub fn new(token_type: TokenType, lexeme: &'a str, line: usize) -> Self {
        Self {
            token_type,
            lexeme,
            literal: None,
            line,
        }
    }

    /// Create a `NUMBER` / `STRING` token carrying its literal value.
    pub fn with_literal(token_type: TokenType, lexeme: &'a str, literal: Literal, line: usize) -> Self {
        Self {
            token_type,
            lexeme,
            literal: Some(literal),
            line,
        }
    }
}

impl<'a> fmt::Display for Token<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ", self.token_type.name(), self.lexeme)?;

        match &self.literal {
            Some(Literal::Str(s)) => write!(f, "{}", s),

            // 3 → "3.0", 3.14 → "3.14"
            Some(Literal::Number(n)) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                let mut buf = itoa::Buffer::new();
                write!(f, "{}.0", buf.format(*n as i64))
            }

            Some(Literal::Number(n)) => write!(f, "{}", n),

            None => write!(f, "null"),
        }
    }
}
