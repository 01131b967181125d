pub mod syntax;
pub mod runtime;
pub mod error;

mod stack;

pub use error::{Error, ErrorCode, LexError, ParseError, RuntimeError, RuntimeErrorKind, ScanFailure};
pub use syntax::token::{Token, TokenKind};
pub use syntax::ast::Program;
pub use runtime::value::Value;
pub use runtime::builtins::NativeFunction;
pub use runtime::interpreter::{Interpreter, InterpreterOptions, RunStatus};

use std::io::Write;

// ─── Public API ───────────────────────────────────────────────────────────────

/// Turns source text into tokens, ending with `Eof`.
pub fn scan(source: &str) -> Result<Vec<Token>, ScanFailure> {
    syntax::lexer::Lexer::new(source).tokenize()
}

/// Builds a program from tokens. Fails on the first grammar violation.
pub fn parse(tokens: Vec<Token>) -> Result<Program, ParseError> {
    syntax::parser::Parser::new(tokens).parse()
}

/// Scan and parse in one step.
pub fn compile(source: &str) -> Result<Program, Error> {
    let tokens = scan(source)?;
    Ok(parse(tokens)?)
}

/// Runs `source` in a fresh interpreter, writing program output and
/// diagnostics to `output`.
pub fn run<'out>(source: &str, output: impl Write + 'out) -> RunStatus {
    Interpreter::new(output).run(source)
}
