use thiserror::Error;

use crate::syntax::token::{Token, TokenKind};

/// Error codes prefixed by phase: L = lexer, P = parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Lexer
    L001, // unexpected character
    L002, // unterminated string literal

    // Parser
    P001, // unexpected token
    P002, // missing expected token
    P003, // invalid assignment target
    P004, // leftover tokens after the program
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::L001 => "L001",
            Self::L002 => "L002",
            Self::P001 => "P001",
            Self::P002 => "P002",
            Self::P003 => "P003",
            Self::P004 => "P004",
        }
    }
}

// ─── Lexical errors ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Error)]
#[error("[line {line}] Error: {message}")]
pub struct LexError {
    pub code: ErrorCode,
    pub line: usize,
    pub message: String,
}

impl LexError {
    pub fn new(code: ErrorCode, line: usize, message: impl Into<String>) -> Self {
        Self { code, line, message: message.into() }
    }
}

/// A failed scan. Every lexical error is kept, along with the tokens that
/// were still recognised, so callers can show both.
#[derive(Debug, Clone, Error)]
#[error("{} lexical error(s)", .errors.len())]
pub struct ScanFailure {
    pub tokens: Vec<Token>,
    pub errors: Vec<LexError>,
}

// ─── Parse errors ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Error)]
#[error("[line {}] Error{}: {message}", .token.line, location(.token))]
pub struct ParseError {
    pub code: ErrorCode,
    pub token: Token,
    pub message: String,
}

impl ParseError {
    pub fn new(code: ErrorCode, token: Token, message: impl Into<String>) -> Self {
        Self { code, token, message: message.into() }
    }
}

fn location(token: &Token) -> String {
    match token.kind {
        TokenKind::Eof => " at end".to_string(),
        _ => format!(" at '{}'", token.lexeme),
    }
}

// ─── Runtime errors ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    UndefinedVariable,
    TypeMismatch,
    DivisionByZero,
    NotCallable,
    Arity,
    StackOverflow,
    TopLevelReturn,
    Native,
    Output,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}\n[line {line}]")]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub line: usize,
    pub message: String,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind, line: usize, message: impl Into<String>) -> Self {
        Self { kind, line, message: message.into() }
    }
}

// ─────────────────────────────────────────────────────────────────────────────

/// Any failure `compile` or `Interpreter::interpret` can hand back.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error(transparent)]
    Scan(#[from] ScanFailure),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
