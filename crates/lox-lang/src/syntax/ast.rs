use std::rc::Rc;

use crate::syntax::token::Token;

// ─── Top level ───────────────────────────────────────────────────────────────

/// A parsed script: top-level statements in source order.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

// ─── Statements ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Stmt {
    /// `expr;`
    Expression(Expr),
    /// `print expr;`
    Print(Expr),
    /// `var name;` or `var name = expr;`
    Var {
        name: Token,
        initializer: Option<Expr>,
    },
    /// `fun name(a, b) { ... }`
    Function(Rc<FunctionDecl>),
    /// `return;` or `return expr;`
    Return {
        keyword: Token,
        value: Option<Expr>,
    },
    /// `{ ... }`
    Block(Vec<Stmt>),
    /// `if (cond) stmt else stmt`
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    /// `while (cond) stmt`. Also the target of `for` desugaring.
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
}

/// Shared between the AST and every function value created from it.
#[derive(Debug)]
pub struct FunctionDecl {
    pub name: Token,
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
}

// ─── Expressions ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Expr {
    Literal(Literal),

    /// `-x`, `!x`
    Unary {
        op: UnaryOp,
        operator: Token,
        operand: Box<Expr>,
    },

    /// `a + b`, `a == b`, etc.
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        operator: Token,
        right: Box<Expr>,
    },

    /// `a and b`, `a or b` — short-circuiting.
    Logical {
        left: Box<Expr>,
        op: LogicalOp,
        right: Box<Expr>,
    },

    /// `( expr )`
    Grouping(Box<Expr>),

    Variable(Token),

    /// `name = value`
    Assign {
        name: Token,
        value: Box<Expr>,
    },

    /// `callee(args)`. `paren` is the closing parenthesis, for error lines.
    Call {
        callee: Box<Expr>,
        paren: Token,
        args: Vec<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
}

// ─── Operators ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add, Sub, Mul, Div,
    Equal, NotEqual,
    Less, LessEqual, Greater, GreaterEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add  => "+",  Self::Sub => "-",
            Self::Mul  => "*",  Self::Div => "/",
            Self::Equal => "==", Self::NotEqual => "!=",
            Self::Less  => "<",  Self::LessEqual => "<=",
            Self::Greater => ">", Self::GreaterEqual => ">=",
        }
    }
}
