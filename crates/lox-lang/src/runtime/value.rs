use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::runtime::builtins::NativeFunction;
use crate::runtime::environment::Environment;
use crate::syntax::ast::FunctionDecl;

#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    Str(String),
    Callable(Callable),
}

impl Value {
    /// `nil` and `false` are falsey, everything else (including `0` and `""`) is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil         => "nil",
            Value::Bool(_)     => "bool",
            Value::Number(_)   => "number",
            Value::Str(_)      => "string",
            Value::Callable(_) => "function",
        }
    }
}

/// Nil equals only nil; callables compare by identity; mixed tags are unequal.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil,         Value::Nil)         => true,
            (Value::Bool(a),     Value::Bool(b))     => a == b,
            (Value::Number(a),   Value::Number(b))   => a == b,
            (Value::Str(a),      Value::Str(b))      => a == b,
            (Value::Callable(a), Value::Callable(b)) => a.same(b),
            _ => false,
        }
    }
}

/// Canonical text form written by `print`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil         => write!(f, "nil"),
            Value::Bool(b)     => write!(f, "{b}"),
            // f64's Display already drops a trailing `.0`
            Value::Number(n)   => write!(f, "{n}"),
            Value::Str(s)      => write!(f, "{s}"),
            Value::Callable(c) => write!(f, "{c}"),
        }
    }
}

// ─── Callables ────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub enum Callable {
    Function(Rc<Function>),
    Native(Rc<dyn NativeFunction>),
}

impl Callable {
    pub fn arity(&self) -> usize {
        match self {
            Callable::Function(f) => f.decl.params.len(),
            Callable::Native(n)   => n.arity(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Callable::Function(f) => &f.decl.name.lexeme,
            Callable::Native(n)   => n.name(),
        }
    }

    fn same(&self, other: &Callable) -> bool {
        match (self, other) {
            (Callable::Function(a), Callable::Function(b)) => Rc::ptr_eq(a, b),
            (Callable::Native(a),   Callable::Native(b))   => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Function(_) => write!(f, "<fn {}>", self.name()),
            Callable::Native(_)   => write!(f, "<native fn {}>", self.name()),
        }
    }
}

// The closure can (and for recursive functions does) contain this very
// function, so Debug must not descend into it.
impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

/// A user-defined function: its declaration plus the scope it was declared in.
pub struct Function {
    pub decl: Rc<FunctionDecl>,
    pub closure: Rc<RefCell<Environment>>,
}

impl Function {
    pub fn new(decl: Rc<FunctionDecl>, closure: Rc<RefCell<Environment>>) -> Self {
        Self { decl, closure }
    }
}
