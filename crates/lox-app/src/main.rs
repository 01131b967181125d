use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use lox_lang::{Interpreter, InterpreterOptions, RunStatus};
use tracing::{debug, info};

/// lox - a tree-walking interpreter for the Lox language
#[derive(Parser, Debug)]
#[command(name = "lox")]
#[command(about = "Run a Lox script, or start a prompt", long_about = None)]
struct Args {
    /// Print the token stream and parsed AST before running
    #[arg(short, long)]
    verbose: bool,

    /// Nested function calls allowed before "Stack overflow."
    #[arg(long, default_value_t = InterpreterOptions::default().max_call_depth)]
    max_call_depth: usize,

    /// Script to run (if not provided, starts an interactive prompt)
    script: Option<PathBuf>,
}

const EXIT_STATIC_ERROR: u8 = 65;
const EXIT_NO_INPUT: u8 = 66;
const EXIT_RUNTIME_ERROR: u8 = 70;

fn init_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    // LOX_LOG first, then RUST_LOG, otherwise warnings only
    let filter = EnvFilter::try_from_env("LOX_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Token and AST dump for `--verbose`. Errors are left for `run` to report.
fn dump(source: &str) {
    let tokens = match lox_lang::scan(source) {
        Ok(tokens) => tokens,
        Err(failure) => {
            for tok in &failure.tokens {
                println!("{tok}");
            }
            return;
        }
    };
    for tok in &tokens {
        println!("{tok}");
    }

    if let Ok(program) = lox_lang::parse(tokens) {
        println!("=== Parsed AST ===");
        println!("{program:#?}");
        println!();
    }
}

fn run_file(path: &Path, args: &Args) -> ExitCode {
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Could not read {}: {e}", path.display());
            return ExitCode::from(EXIT_NO_INPUT);
        }
    };
    info!(path = %path.display(), bytes = source.len(), "running script");

    if args.verbose {
        dump(&source);
    }

    let options = InterpreterOptions { max_call_depth: args.max_call_depth };
    let mut interp = Interpreter::with_options(io::stdout(), options);
    match interp.run(&source) {
        RunStatus::Ok => ExitCode::SUCCESS,
        RunStatus::StaticError => ExitCode::from(EXIT_STATIC_ERROR),
        RunStatus::RuntimeError => ExitCode::from(EXIT_RUNTIME_ERROR),
    }
}

fn run_prompt(args: &Args) -> ExitCode {
    let options = InterpreterOptions { max_call_depth: args.max_call_depth };
    let mut interp = Interpreter::with_options(io::stdout(), options);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        if let Err(e) = io::stdout().flush() {
            eprintln!("Output error: {e}");
            return ExitCode::FAILURE;
        }

        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                eprintln!("Input error: {e}");
                return ExitCode::FAILURE;
            }
            None => {
                println!();
                return ExitCode::SUCCESS;
            }
        };

        if args.verbose {
            dump(&line);
        }
        // a failing line is reported and the session carries on
        let status = interp.run(&line);
        debug!(?status, "line finished");
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging();

    match &args.script {
        Some(path) => run_file(path, &args),
        None => run_prompt(&args),
    }
}
