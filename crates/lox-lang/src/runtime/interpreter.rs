//! Tree-walking interpreter. Executes a parsed `Program` against a chain of
//! shared scopes, writing `print` output to a caller-supplied sink.
//! All state lives in `Interpreter`; nothing is global.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::error::{Error, RuntimeError, RuntimeErrorKind};
use crate::runtime::builtins::{self, NativeFunction};
use crate::runtime::environment::Environment;
use crate::runtime::value::{Callable, Function, Value};
use crate::stack;
use crate::syntax::ast::{BinaryOp, Expr, Literal, LogicalOp, Program, Stmt, UnaryOp};
use crate::syntax::lexer::Lexer;
use crate::syntax::parser::Parser;

// ─── Options ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct InterpreterOptions {
    /// Active user-function frames allowed before a call fails with
    /// "Stack overflow." instead of exhausting the host stack.
    pub max_call_depth: usize,
}

impl Default for InterpreterOptions {
    fn default() -> Self {
        Self { max_call_depth: 255 }
    }
}

/// Outcome of `Interpreter::run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Ok,
    /// Lexical or parse failure; nothing was executed.
    StaticError,
    /// At least one top-level statement failed at runtime.
    RuntimeError,
}

/// How a statement finished. A `Return` unwinds every enclosing block, loop
/// and `if` untouched until the nearest call frame absorbs it.
#[derive(Debug)]
enum Flow {
    Normal,
    Return(Value),
}

// ─── Interpreter ──────────────────────────────────────────────────────────────

pub struct Interpreter<'out> {
    globals: Rc<RefCell<Environment>>,
    env: Rc<RefCell<Environment>>,
    out: Box<dyn Write + 'out>,
    options: InterpreterOptions,
    depth: usize,
    line: usize,
}

impl<'out> Interpreter<'out> {
    pub fn new(out: impl Write + 'out) -> Self {
        Self::with_options(out, InterpreterOptions::default())
    }

    pub fn with_options(out: impl Write + 'out, options: InterpreterOptions) -> Self {
        let globals = Environment::global();
        let mut interp = Self {
            env: globals.clone(),
            globals,
            out: Box::new(out),
            options,
            depth: 0,
            line: 0,
        };
        for native in builtins::standard() {
            interp.define_native(native);
        }
        interp
    }

    /// Binds a builtin in the global scope under its own name.
    pub fn define_native(&mut self, native: Rc<dyn NativeFunction>) {
        let name = native.name().to_string();
        self.globals.borrow_mut().define(&name, Value::Callable(Callable::Native(native)));
    }

    /// Source line of the node most recently evaluated. Builtins use it to
    /// attribute their own errors.
    pub fn current_line(&self) -> usize {
        self.line
    }

    // ─── Entry points ─────────────────────────────────────────────────────────

    /// Scans, parses and executes `source`. Lexical and parse errors are
    /// written to the output and abort the run. A runtime error aborts only
    /// the top-level statement it happened in. Globals persist between runs.
    pub fn run(&mut self, source: &str) -> RunStatus {
        let tokens = match Lexer::new(source).tokenize() {
            Ok(tokens) => tokens,
            Err(failure) => {
                for e in &failure.errors {
                    debug!(code = e.code.as_str(), line = e.line, "lexical error");
                    self.report(e);
                }
                return RunStatus::StaticError;
            }
        };

        let program = match Parser::new(tokens).parse() {
            Ok(program) => program,
            Err(e) => {
                debug!(code = e.code.as_str(), line = e.token.line, "parse error");
                self.report(&e);
                return RunStatus::StaticError;
            }
        };

        let mut status = RunStatus::Ok;
        for stmt in &program.statements {
            if let Err(e) = self.exec_top_level(stmt) {
                debug!(line = e.line, kind = ?e.kind, "statement failed");
                self.report(&e);
                status = RunStatus::RuntimeError;
            }
        }
        status
    }

    /// Executes every statement in order, stopping at the first runtime error.
    pub fn execute(&mut self, program: &Program) -> Result<(), RuntimeError> {
        for stmt in &program.statements {
            self.exec_top_level(stmt)?;
        }
        Ok(())
    }

    /// Scans, parses and executes `source`, stopping at the first error of
    /// any kind and handing it back instead of writing it to the output.
    pub fn interpret(&mut self, source: &str) -> Result<(), Error> {
        let program = crate::compile(source)?;
        self.execute(&program)?;
        Ok(())
    }

    fn exec_top_level(&mut self, stmt: &Stmt) -> Result<(), RuntimeError> {
        // leftovers from an aborted statement must not leak into the next one
        self.env = self.globals.clone();
        self.depth = 0;
        match self.exec_stmt(stmt)? {
            Flow::Normal => Ok(()),
            Flow::Return(_) => Err(self.err(RuntimeErrorKind::TopLevelReturn, self.line,
                "Can't return from top-level code.")),
        }
    }

    fn report(&mut self, e: &dyn std::fmt::Display) {
        if let Err(io) = writeln!(self.out, "{e}") {
            warn!(error = %io, "failed to write diagnostic");
        }
    }

    fn err(&self, kind: RuntimeErrorKind, line: usize, msg: impl Into<String>) -> RuntimeError {
        RuntimeError::new(kind, line, msg)
    }

    // ─── Statement executor ───────────────────────────────────────────────────

    fn exec_stmt(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        stack::guard(|| self.exec_stmt_inner(stmt))
    }

    fn exec_stmt_inner(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                let line = self.line;
                writeln!(self.out, "{value}").map_err(|io| {
                    RuntimeError::new(RuntimeErrorKind::Output, line, format!("Output error: {io}."))
                })?;
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                self.env.borrow_mut().define(&name.lexeme, value);
            }

            Stmt::Function(decl) => {
                let function = Function::new(decl.clone(), self.env.clone());
                let value = Value::Callable(Callable::Function(Rc::new(function)));
                self.env.borrow_mut().define(&decl.name.lexeme, value);
            }

            Stmt::Return { keyword, value } => {
                self.line = keyword.line;
                if self.depth == 0 {
                    return Err(self.err(RuntimeErrorKind::TopLevelReturn, keyword.line,
                        "Can't return from top-level code."));
                }
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                return Ok(Flow::Return(value));
            }

            Stmt::Block(stmts) => {
                let scope = Environment::child_of(self.env.clone());
                return self.exec_block(stmts, scope);
            }

            Stmt::If { condition, then_branch, else_branch } => {
                if self.evaluate(condition)?.is_truthy() {
                    return self.exec_stmt(then_branch);
                }
                if let Some(else_branch) = else_branch {
                    return self.exec_stmt(else_branch);
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.exec_stmt(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
            }
        }
        Ok(Flow::Normal)
    }

    /// Runs `stmts` inside `scope`, restoring the enclosing scope on every
    /// exit: normal completion, return, or error.
    fn exec_block(&mut self, stmts: &[Stmt], scope: Rc<RefCell<Environment>>) -> Result<Flow, RuntimeError> {
        let previous = std::mem::replace(&mut self.env, scope);
        let result = self.exec_stmts(stmts);
        self.env = previous;
        result
    }

    fn exec_stmts(&mut self, stmts: &[Stmt]) -> Result<Flow, RuntimeError> {
        for stmt in stmts {
            if let Flow::Return(value) = self.exec_stmt(stmt)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    // ─── Expression evaluator ─────────────────────────────────────────────────

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        stack::guard(|| self.eval_expr(expr))
    }

    fn eval_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(lit) => Ok(match lit {
                Literal::Nil       => Value::Nil,
                Literal::Bool(b)   => Value::Bool(*b),
                Literal::Number(n) => Value::Number(*n),
                Literal::String(s) => Value::Str(s.clone()),
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { op, operator, operand } => {
                let value = self.evaluate(operand)?;
                self.line = operator.line;
                eval_unary(*op, value, operator.line)
            }

            Expr::Binary { left, op, operator, right } => {
                let l = self.evaluate(left)?;
                let r = self.evaluate(right)?;
                self.line = operator.line;
                eval_binary(*op, l, r, operator.line)
            }

            // The result is always a Bool, never the operand itself.
            Expr::Logical { left, op, right } => {
                let left = self.evaluate(left)?.is_truthy();
                match op {
                    LogicalOp::Or  if left  => Ok(Value::Bool(true)),
                    LogicalOp::And if !left => Ok(Value::Bool(false)),
                    _ => Ok(Value::Bool(self.evaluate(right)?.is_truthy())),
                }
            }

            Expr::Variable(name) => {
                self.line = name.line;
                let found = self.env.borrow().get(&name.lexeme);
                found.ok_or_else(|| self.err(RuntimeErrorKind::UndefinedVariable, name.line,
                    format!("Undefined variable '{}'.", name.lexeme)))
            }

            Expr::Assign { name, value } => {
                let value = self.evaluate(value)?;
                self.line = name.line;
                let assigned = self.env.borrow_mut().assign(&name.lexeme, value.clone());
                if assigned {
                    Ok(value)
                } else {
                    Err(self.err(RuntimeErrorKind::UndefinedVariable, name.line,
                        format!("Undefined variable '{}'.", name.lexeme)))
                }
            }

            Expr::Call { callee, paren, args } => {
                let callee = self.evaluate(callee)?;
                let arg_vals: Vec<Value> = args.iter()
                    .map(|a| self.evaluate(a))
                    .collect::<Result<_, _>>()?;
                self.line = paren.line;
                self.call_value(callee, arg_vals, paren.line)
            }
        }
    }

    // ─── Call dispatch ────────────────────────────────────────────────────────

    fn call_value(&mut self, callee: Value, args: Vec<Value>, line: usize) -> Result<Value, RuntimeError> {
        let Value::Callable(callable) = callee else {
            return Err(self.err(RuntimeErrorKind::NotCallable, line, format!(
                "Can only call functions, got {}.", callee.type_name()
            )));
        };

        if args.len() != callable.arity() {
            return Err(self.err(RuntimeErrorKind::Arity, line, format!(
                "Expected {} arguments but got {}.", callable.arity(), args.len()
            )));
        }

        match callable {
            Callable::Native(native) => {
                trace!(name = native.name(), "native call");
                native.call(self, &args)
            }
            Callable::Function(function) => self.call_function(&function, args, line),
        }
    }

    /// Binds arguments in a fresh scope whose parent is the function's
    /// defining scope, not the caller's.
    fn call_function(&mut self, function: &Function, args: Vec<Value>, line: usize) -> Result<Value, RuntimeError> {
        if self.depth >= self.options.max_call_depth {
            return Err(self.err(RuntimeErrorKind::StackOverflow, line, "Stack overflow."));
        }

        let scope = Environment::child_of(function.closure.clone());
        {
            let mut scope = scope.borrow_mut();
            for (param, arg) in function.decl.params.iter().zip(args) {
                scope.define(&param.lexeme, arg);
            }
        }

        debug!(name = %function.decl.name.lexeme, depth = self.depth, "call");
        self.depth += 1;
        let result = self.exec_block(&function.decl.body, scope);
        self.depth -= 1;

        match result? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Nil),
        }
    }
}

// ─── Binary / unary operators ─────────────────────────────────────────────────

fn eval_binary(op: BinaryOp, l: Value, r: Value, line: usize) -> Result<Value, RuntimeError> {
    // Equality works on every pair of values; the rest need two numbers.
    if let BinaryOp::Equal    = op { return Ok(Value::Bool(l == r)); }
    if let BinaryOp::NotEqual = op { return Ok(Value::Bool(l != r)); }

    let (Value::Number(a), Value::Number(b)) = (&l, &r) else {
        return Err(RuntimeError::new(RuntimeErrorKind::TypeMismatch, line, format!(
            "Operands of '{}' must be numbers, got {} and {}.",
            op.symbol(), l.type_name(), r.type_name()
        )));
    };
    let (a, b) = (*a, *b);

    Ok(match op {
        BinaryOp::Add => Value::Number(a + b),
        BinaryOp::Sub => Value::Number(a - b),
        BinaryOp::Mul => Value::Number(a * b),
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(RuntimeError::new(RuntimeErrorKind::DivisionByZero, line, "Division by zero."));
            }
            Value::Number(a / b)
        }
        BinaryOp::Less         => Value::Bool(a < b),
        BinaryOp::LessEqual    => Value::Bool(a <= b),
        BinaryOp::Greater      => Value::Bool(a > b),
        BinaryOp::GreaterEqual => Value::Bool(a >= b),
        BinaryOp::Equal | BinaryOp::NotEqual => unreachable!(),
    })
}

fn eval_unary(op: UnaryOp, v: Value, line: usize) -> Result<Value, RuntimeError> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!v.is_truthy())),
        UnaryOp::Negate => match v {
            Value::Number(n) => Ok(Value::Number(-n)),
            other => Err(RuntimeError::new(RuntimeErrorKind::TypeMismatch, line, format!(
                "Operand of '-' must be a number, got {}.", other.type_name()
            ))),
        },
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn program(src: &str) -> Program {
        let tokens = Lexer::new(src).tokenize().expect("lex failed");
        Parser::new(tokens).parse().expect("parse failed")
    }

    fn eval_src(src: &str) -> Result<Value, RuntimeError> {
        let tokens = Lexer::new(src).tokenize().expect("lex failed");
        let expr = Parser::new(tokens).parse_expr().expect("parse failed");
        let mut out = Vec::new();
        let mut interp = Interpreter::new(&mut out);
        interp.evaluate(&expr)
    }

    fn output(src: &str) -> String {
        let mut out = Vec::new();
        Interpreter::new(&mut out).run(src);
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn arithmetic() {
        assert_eq!(eval_src("1 + 2 * 3").unwrap(), Value::Number(7.0));
        assert_eq!(eval_src("(1 + 2) * 3").unwrap(), Value::Number(9.0));
        assert_eq!(eval_src("10 / 4").unwrap(), Value::Number(2.5));
        assert_eq!(eval_src("-(3 - 5)").unwrap(), Value::Number(2.0));
    }

    #[test]
    fn comparisons() {
        assert_eq!(eval_src("1 < 2").unwrap(), Value::Bool(true));
        assert_eq!(eval_src("2 <= 2").unwrap(), Value::Bool(true));
        assert_eq!(eval_src("1 > 2").unwrap(), Value::Bool(false));
        assert_eq!(eval_src("3 >= 4").unwrap(), Value::Bool(false));
    }

    #[test]
    fn equality_rules() {
        assert_eq!(eval_src("nil == nil").unwrap(), Value::Bool(true));
        assert_eq!(eval_src("nil == 0").unwrap(), Value::Bool(false));
        assert_eq!(eval_src("nil == false").unwrap(), Value::Bool(false));
        assert_eq!(eval_src("\"a\" == \"a\"").unwrap(), Value::Bool(true));
        assert_eq!(eval_src("1 != 2").unwrap(), Value::Bool(true));
        assert_eq!(eval_src("true == 1").unwrap(), Value::Bool(false));
    }

    #[test]
    fn not_uses_truthiness() {
        assert_eq!(eval_src("!nil").unwrap(), Value::Bool(true));
        assert_eq!(eval_src("!0").unwrap(), Value::Bool(false));
        assert_eq!(eval_src("!\"\"").unwrap(), Value::Bool(false));
    }

    #[test]
    fn logical_results_are_bools() {
        assert_eq!(eval_src("1 or 2").unwrap(), Value::Bool(true));
        assert_eq!(eval_src("nil or \"x\"").unwrap(), Value::Bool(true));
        assert_eq!(eval_src("1 and 2").unwrap(), Value::Bool(true));
        assert_eq!(eval_src("1 and nil").unwrap(), Value::Bool(false));
    }

    #[test]
    fn short_circuit_skips_right_operand() {
        assert_eq!(eval_src("1 or (1 / 0)").unwrap(), Value::Bool(true));
        assert_eq!(eval_src("false and (1 / 0)").unwrap(), Value::Bool(false));
    }

    #[test]
    fn division_by_zero() {
        let err = eval_src("1 / 0").unwrap_err();
        assert_eq!(err.kind, RuntimeErrorKind::DivisionByZero);
    }

    #[test]
    fn plus_is_numeric_only() {
        let err = eval_src("\"a\" + \"b\"").unwrap_err();
        assert_eq!(err.kind, RuntimeErrorKind::TypeMismatch);
    }

    #[test]
    fn negate_requires_number() {
        let err = eval_src("-\"a\"").unwrap_err();
        assert_eq!(err.kind, RuntimeErrorKind::TypeMismatch);
    }

    #[test]
    fn undefined_variable() {
        let err = eval_src("nope").unwrap_err();
        assert_eq!(err.kind, RuntimeErrorKind::UndefinedVariable);
        assert_eq!(err.message, "Undefined variable 'nope'.");
    }

    #[test]
    fn execute_stops_at_first_error() {
        let mut out = Vec::new();
        let result = Interpreter::new(&mut out).execute(&program("print 1; print x; print 2;"));
        assert_eq!(result.unwrap_err().kind, RuntimeErrorKind::UndefinedVariable);
        assert_eq!(String::from_utf8(out).unwrap(), "1\n");
    }

    #[test]
    fn return_unwinds_through_loop_and_block() {
        let src = "
            fun first() {
                var i = 0;
                while (true) {
                    { if (i == 3) return i; }
                    i = i + 1;
                }
                print \"unreachable\";
            }
            print first();
        ";
        assert_eq!(output(src), "3\n");
    }

    #[test]
    fn function_without_return_yields_nil() {
        assert_eq!(output("fun f() {} print f();"), "nil\n");
    }

    #[test]
    fn scope_restored_after_error_in_block() {
        let src = "var a = 1; { var a = 2; print 1 / 0; } print a;";
        assert_eq!(output(src), "Division by zero.\n[line 1]\n1\n");
    }

    #[test]
    fn stack_overflow_is_a_runtime_error() {
        let mut out = Vec::new();
        let options = InterpreterOptions { max_call_depth: 32 };
        let mut interp = Interpreter::with_options(&mut out, options);
        let status = interp.run("fun f() { f(); } f(); print \"after\";");
        drop(interp);
        assert_eq!(status, RunStatus::RuntimeError);
        assert_eq!(String::from_utf8(out).unwrap(), "Stack overflow.\n[line 1]\nafter\n");
    }

    #[test]
    fn depth_resets_between_statements() {
        let mut out = Vec::new();
        let options = InterpreterOptions { max_call_depth: 8 };
        let mut interp = Interpreter::with_options(&mut out, options);
        interp.run("fun d(n) { if (n > 0) d(n - 1); } d(100); d(5); print \"ok\";");
        drop(interp);
        assert!(String::from_utf8(out).unwrap().ends_with("ok\n"));
    }

    #[test]
    fn natives_are_callable_values() {
        assert_eq!(output("print clock;"), "<native fn clock>\n");
        assert_eq!(output("print clock() > 0;"), "true\n");
        assert_eq!(output("print clock == clock;"), "true\n");
    }

    struct ClosedSink;

    impl Write for ClosedSink {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }
        fn flush(&mut self) -> std::io::Result<()> { Ok(()) }
    }

    #[test]
    fn failed_print_is_an_output_error() {
        let err = Interpreter::new(ClosedSink).execute(&program("print 1;")).unwrap_err();
        assert_eq!(err.kind, RuntimeErrorKind::Output);
        assert_eq!(err.line, 1);
    }

    struct Double;

    impl NativeFunction for Double {
        fn name(&self) -> &str { "double" }
        fn arity(&self) -> usize { 1 }
        fn call(&self, interp: &mut Interpreter<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
            match &args[0] {
                Value::Number(n) => Ok(Value::Number(n * 2.0)),
                other => Err(RuntimeError::new(RuntimeErrorKind::Native, interp.current_line(),
                    format!("double: expected number, got {}", other.type_name()))),
            }
        }
    }

    #[test]
    fn custom_native_registration() {
        let mut out = Vec::new();
        let mut interp = Interpreter::new(&mut out);
        interp.define_native(Rc::new(Double));
        interp.run("print double(21);\nprint double(1, 2);\nprint double(nil);");
        drop(interp);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "42\nExpected 1 arguments but got 2.\n[line 2]\ndouble: expected number, got nil\n[line 3]\n"
        );
    }
}
