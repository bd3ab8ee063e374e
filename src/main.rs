//! Read lambda calculus expressions line by line, evaluate each one and print
//! the result to standard output.
//!
//! Example usage:
//!
//!     cargo run -- --max-steps 10000
//!     cargo run -- --src-filepath expressions.lc --verbose

use std::process::ExitCode;

use clap::Parser;
use lambda_eval::end_to_end::{run_interpreter, InterpreterConfig};
use tracing::Level;

fn main() -> ExitCode {
    let interpreter_config = InterpreterConfig::parse();

    let max_level = if interpreter_config.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(max_level)
        .with_writer(std::io::stderr)
        .init();

    match run_interpreter(&interpreter_config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(run_error) => {
            eprintln!("{}", run_error);
            ExitCode::FAILURE
        }
    }
}
