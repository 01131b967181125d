use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Identifier(String),
    String(String),
    Number(f64),

    // Keywords
    And,
    Class,
    Else,
    False,
    Fun,
    For,
    If,
    Nil,
    Or,
    Print,
    Return,
    Super,
    This,
    True,
    Var,
    While,

    // Operators
    Minus,        // -
    Plus,         // +
    Slash,        // /
    Star,         // *
    Bang,         // !
    BangEqual,    // !=
    Equal,        // =
    EqualEqual,   // ==
    Greater,      // >
    GreaterEqual, // >=
    Less,         // <
    LessEqual,    // <=

    // Punctuation
    LeftParen,  // (
    RightParen, // )
    LeftBrace,  // {
    RightBrace, // }
    Comma,      // ,
    Dot,        // .
    Semicolon,  // ;

    Eof,
}

impl TokenKind {
    /// Upper-snake category name, used by the verbose token dump.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Identifier(_) => "IDENTIFIER",
            Self::String(_)     => "STRING",
            Self::Number(_)     => "NUMBER",
            Self::And    => "AND",
            Self::Class  => "CLASS",
            Self::Else   => "ELSE",
            Self::False  => "FALSE",
            Self::Fun    => "FUN",
            Self::For    => "FOR",
            Self::If     => "IF",
            Self::Nil    => "NIL",
            Self::Or     => "OR",
            Self::Print  => "PRINT",
            Self::Return => "RETURN",
            Self::Super  => "SUPER",
            Self::This   => "THIS",
            Self::True   => "TRUE",
            Self::Var    => "VAR",
            Self::While  => "WHILE",
            Self::Minus        => "MINUS",
            Self::Plus         => "PLUS",
            Self::Slash        => "SLASH",
            Self::Star         => "STAR",
            Self::Bang         => "BANG",
            Self::BangEqual    => "BANG_EQUAL",
            Self::Equal        => "EQUAL",
            Self::EqualEqual   => "EQUAL_EQUAL",
            Self::Greater      => "GREATER",
            Self::GreaterEqual => "GREATER_EQUAL",
            Self::Less         => "LESS",
            Self::LessEqual    => "LESS_EQUAL",
            Self::LeftParen  => "LEFT_PAREN",
            Self::RightParen => "RIGHT_PAREN",
            Self::LeftBrace  => "LEFT_BRACE",
            Self::RightBrace => "RIGHT_BRACE",
            Self::Comma      => "COMMA",
            Self::Dot        => "DOT",
            Self::Semicolon  => "SEMICOLON",
            Self::Eof => "EOF",
        }
    }
}

/// Maps an identifier to its keyword token, or returns `Identifier`.
pub fn keyword_or_ident(s: &str) -> TokenKind {
    match s {
        "and"    => TokenKind::And,
        "class"  => TokenKind::Class,
        "else"   => TokenKind::Else,
        "false"  => TokenKind::False,
        "fun"    => TokenKind::Fun,
        "for"    => TokenKind::For,
        "if"     => TokenKind::If,
        "nil"    => TokenKind::Nil,
        "or"     => TokenKind::Or,
        "print"  => TokenKind::Print,
        "return" => TokenKind::Return,
        "super"  => TokenKind::Super,
        "this"   => TokenKind::This,
        "true"   => TokenKind::True,
        "var"    => TokenKind::Var,
        "while"  => TokenKind::While,
        _        => TokenKind::Identifier(s.to_string()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: usize) -> Self {
        Self { kind, lexeme: lexeme.into(), line }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}' (line {})", self.kind.name(), self.lexeme, self.line)
    }
}
