use tracing::{debug, trace};

use crate::error::{ErrorCode, LexError, ScanFailure};
use crate::syntax::token::{Token, TokenKind, keyword_or_ident};

pub struct Lexer<'a> {
    source: &'a str,
    start: usize,
    pos: usize,
    line: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, start: 0, pos: 0, line: 1 }
    }

    /// Scans the whole source. Errors don't stop the scan; all of them are
    /// returned together with whatever tokens were recognised.
    pub fn tokenize(mut self) -> Result<Vec<Token>, ScanFailure> {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();

        loop {
            self.skip_trivia();
            self.start = self.pos;

            if self.is_at_end() {
                tokens.push(Token::new(TokenKind::Eof, "", self.line));
                break;
            }

            match self.next_token() {
                Ok(tok) => {
                    trace!(token = %tok, "scanned");
                    tokens.push(tok);
                }
                Err(e) => errors.push(e),
            }
        }

        debug!(tokens = tokens.len(), errors = errors.len(), "scan finished");
        if errors.is_empty() { Ok(tokens) } else { Err(ScanFailure { tokens, errors }) }
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        let line = self.line;
        let ch = self.advance();

        let kind = match ch {
            b'(' => TokenKind::LeftParen,
            b')' => TokenKind::RightParen,
            b'{' => TokenKind::LeftBrace,
            b'}' => TokenKind::RightBrace,
            b',' => TokenKind::Comma,
            b'.' => TokenKind::Dot,
            b'-' => TokenKind::Minus,
            b'+' => TokenKind::Plus,
            b';' => TokenKind::Semicolon,
            b'*' => TokenKind::Star,
            b'/' => TokenKind::Slash,

            b'!' => if self.matches(b'=') { TokenKind::BangEqual } else { TokenKind::Bang },
            b'=' => if self.matches(b'=') { TokenKind::EqualEqual } else { TokenKind::Equal },
            b'<' => if self.matches(b'=') { TokenKind::LessEqual } else { TokenKind::Less },
            b'>' => if self.matches(b'=') { TokenKind::GreaterEqual } else { TokenKind::Greater },

            b'"' => TokenKind::String(self.read_string(line)?),
            b'0'..=b'9' => TokenKind::Number(self.read_number()),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                self.read_ident();
                keyword_or_ident(self.lexeme())
            }

            _ => {
                // Report the whole character, not just its first UTF-8 byte.
                let c = self.source[self.start..].chars().next().unwrap_or(ch as char);
                self.pos = self.start + c.len_utf8();
                return Err(LexError::new(ErrorCode::L001, line,
                    format!("Unexpected character '{c}'.")));
            }
        };

        Ok(Token::new(kind, self.lexeme(), line))
    }

    // ─── Primitives ──────────────────────────────────────────────────────────

    fn bytes(&self) -> &'a [u8] {
        self.source.as_bytes()
    }

    fn lexeme(&self) -> &'a str {
        &self.source[self.start..self.pos]
    }

    fn advance(&mut self) -> u8 {
        let ch = self.bytes()[self.pos];
        self.pos += 1;
        if ch == b'\n' { self.line += 1; }
        ch
    }

    fn matches(&mut self, expected: u8) -> bool {
        if self.peek() == expected && !self.is_at_end() {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn peek(&self) -> u8 {
        if self.is_at_end() { 0 } else { self.bytes()[self.pos] }
    }

    fn peek_next(&self) -> u8 {
        if self.pos + 1 >= self.bytes().len() { 0 } else { self.bytes()[self.pos + 1] }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.bytes().len()
    }

    /// Whitespace and `//` comments.
    fn skip_trivia(&mut self) {
        while !self.is_at_end() {
            match self.peek() {
                b' ' | b'\t' | b'\r' | b'\n' => { self.advance(); }
                b'/' if self.peek_next() == b'/' => self.skip_line(),
                _ => break,
            }
        }
    }

    fn skip_line(&mut self) {
        while !self.is_at_end() && self.peek() != b'\n' { self.advance(); }
    }

    // ─── Readers ─────────────────────────────────────────────────────────────

    /// Strings may span lines and have no escape sequences.
    fn read_string(&mut self, start_line: usize) -> Result<String, LexError> {
        while !self.is_at_end() && self.peek() != b'"' {
            self.advance();
        }
        if self.is_at_end() {
            return Err(LexError::new(ErrorCode::L002, start_line, "Unterminated string."));
        }
        self.advance(); // closing "
        Ok(self.source[self.start + 1..self.pos - 1].to_string())
    }

    fn read_number(&mut self) -> f64 {
        while self.peek().is_ascii_digit() {
            self.advance();
        }
        // consume the fraction only if a digit follows the dot (`123.` is NUMBER DOT)
        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }
        // digits with at most one inner dot always parse
        self.lexeme().parse().unwrap_or_default()
    }

    fn read_ident(&mut self) {
        while self.peek().is_ascii_alphanumeric() || self.peek() == b'_' {
            self.advance();
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
