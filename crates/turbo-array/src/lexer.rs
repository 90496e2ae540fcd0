//! Expression lexer.
//!
//! Turns an expression string such as `"sin(x) + 2 * x"` into a fully
//! materialized token sequence. Positions are byte offsets into the source.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
#[error("Unexpected character '{found}' at offset {offset}")]
pub struct LexError {
    pub offset: usize,
    pub found: char,
}

/// Operator symbols recognized by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
    Ne,
    Bang,
}

impl Operator {
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Star => "*",
            Operator::Slash => "/",
            Operator::Caret => "^",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Ge => ">=",
            Operator::Le => "<=",
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Bang => "!",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Identifier(String),
    Operator(Operator),
    /// An identifier immediately followed (modulo whitespace) by `(`.
    Function(String),
    LParen,
    RParen,
    Comma,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Number(n) => write!(f, "{n}"),
            TokenKind::Identifier(name) | TokenKind::Function(name) => f.write_str(name),
            TokenKind::Operator(op) => f.write_str(op.symbol()),
            TokenKind::LParen => f.write_str("("),
            TokenKind::RParen => f.write_str(")"),
            TokenKind::Comma => f.write_str(","),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset of the first character.
    pub offset: usize,
    /// Length in bytes.
    pub len: usize,
}

impl Token {
    fn new(kind: TokenKind, offset: usize, len: usize) -> Self {
        Token { kind, offset, len }
    }

    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// Tokenizes an expression.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Lexer {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Token>, LexError> {
        while let Some(c) = self.peek() {
            let start = self.pos;
            match c {
                b' ' | b'\t' | b'\n' | b'\r' => self.pos += 1,
                b'0'..=b'9' | b'.' => self.number()?,
                b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier(),
                b'(' => self.single(TokenKind::LParen),
                b')' => self.single(TokenKind::RParen),
                b',' => self.single(TokenKind::Comma),
                b'+' => self.single(TokenKind::Operator(Operator::Plus)),
                b'-' => self.single(TokenKind::Operator(Operator::Minus)),
                b'*' => self.single(TokenKind::Operator(Operator::Star)),
                b'/' => self.single(TokenKind::Operator(Operator::Slash)),
                b'^' => self.single(TokenKind::Operator(Operator::Caret)),
                b'>' => self.with_eq(Operator::Gt, Operator::Ge),
                b'<' => self.with_eq(Operator::Lt, Operator::Le),
                b'!' => self.with_eq(Operator::Bang, Operator::Ne),
                b'=' if self.peek_at(1) == Some(b'=') => {
                    self.pos += 2;
                    self.tokens
                        .push(Token::new(TokenKind::Operator(Operator::Eq), start, 2));
                }
                _ => return Err(self.error_at(start)),
            }
        }
        Ok(self.tokens)
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn error_at(&self, offset: usize) -> LexError {
        let found = self.source[offset..].chars().next().unwrap_or('\0');
        LexError { offset, found }
    }

    fn single(&mut self, kind: TokenKind) {
        self.tokens.push(Token::new(kind, self.pos, 1));
        self.pos += 1;
    }

    fn with_eq(&mut self, bare: Operator, with_eq: Operator) {
        let start = self.pos;
        let op = if self.peek_at(1) == Some(b'=') {
            self.pos += 2;
            with_eq
        } else {
            self.pos += 1;
            bare
        };
        self.tokens
            .push(Token::new(TokenKind::Operator(op), start, self.pos - start));
    }

    fn number(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        let mut seen_dot = false;
        let mut digits = 0;
        while let Some(c) = self.peek() {
            match c {
                b'0'..=b'9' => digits += 1,
                b'.' if !seen_dot => seen_dot = true,
                _ => break,
            }
            self.pos += 1;
        }
        // A lone "." is not a number.
        if digits == 0 {
            return Err(self.error_at(start));
        }
        let value = self.source[start..self.pos]
            .parse::<f64>()
            .map_err(|_| self.error_at(start))?;
        self.tokens
            .push(Token::new(TokenKind::Number(value), start, self.pos - start));
        Ok(())
    }

    fn identifier(&mut self) {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == b'_' {
                self.pos += 1;
            } else {
                break;
            }
        }
        let name = self.source[start..self.pos].to_string();

        let mut look = self.pos;
        while matches!(self.bytes.get(look), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            look += 1;
        }
        let kind = if self.bytes.get(look) == Some(&b'(') {
            TokenKind::Function(name)
        } else {
            TokenKind::Identifier(name)
        };
        self.tokens.push(Token::new(kind, start, self.pos - start));
    }
}
