//! Code to configure the interpreter and run it over lines of input.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;
use tracing::{debug, info};

use crate::box_tree_impl::box_tree_ast::{Environment, Expression};
use crate::box_tree_impl::box_tree_execution::{EvalError, Evaluator};
use crate::box_tree_impl::box_tree_parsing::{parse_expression, SyntaxError};

/// Reduction steps allowed per line unless configured otherwise.
pub const DEFAULT_MAX_STEPS: usize = 1_000_000;

const FIRST_PROMPT: &str = "Enter a lambda calculus expression:";
const NEXT_PROMPT: &str = "Enter another lambda calculus expression or type 'exit' to quit:";

/// Config for the interpreter. Instantiate via `InterpreterConfig::parse()`.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct InterpreterConfig {
    /// Read expressions from this file, one per line, instead of standard
    /// input.
    #[arg(short, long)]
    pub src_filepath: Option<PathBuf>,

    /// Give up on an expression after this many reduction steps.
    #[arg(short, long, default_value_t = DEFAULT_MAX_STEPS)]
    pub max_steps: usize,

    /// Never give up; non-terminating expressions hang the interpreter.
    #[arg(long)]
    pub unbounded: bool,

    /// Log every reduction step to standard error.
    #[arg(short, long)]
    pub verbose: bool,

    /// Do not print prompts.
    #[arg(short, long)]
    pub quiet: bool,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            src_filepath: None,
            max_steps: DEFAULT_MAX_STEPS,
            unbounded: false,
            verbose: false,
            quiet: false,
        }
    }
}

impl InterpreterConfig {
    /// The step budget handed to each evaluation.
    pub fn step_limit(&self) -> Option<usize> {
        if self.unbounded {
            None
        } else {
            Some(self.max_steps)
        }
    }
}

/// Errors that may be thrown when running the interpreter.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),
    #[error("evaluation error: {0}")]
    Eval(#[from] EvalError),
    #[error("input/output error: {0}")]
    Io(#[from] io::Error),
}

/// Parses one line and evaluates it with an empty environment.
pub fn run_line(line: &str, config: &InterpreterConfig) -> Result<Expression, RunError> {
    // Run lexer and parser.
    let expression = parse_expression(line)?;
    debug!(%expression, "parsed");

    // Evaluate with an empty environment.
    let mut evaluator = Evaluator::new(config.step_limit());
    let result = evaluator.evaluate(&expression, &Environment::new())?;
    debug!(steps = evaluator.steps(), "evaluated");

    // Return the result.
    return Ok(result);
}

fn is_exit_command(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("exit")
}

/// Reads lines from `input` until it runs out or an `exit` line shows up,
/// writing one `Result:` or `Error:` line per expression to `output`.
pub fn run_lines<R: BufRead, W: Write>(
    input: R,
    output: &mut W,
    config: &InterpreterConfig,
    show_prompts: bool,
) -> Result<(), RunError> {
    if show_prompts {
        writeln!(output, "{}", FIRST_PROMPT)?;
        output.flush()?;
    }

    for line in input.lines() {
        let line = line?;

        if is_exit_command(&line) {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        match run_line(&line, config) {
            Ok(result) => writeln!(output, "Result: {}", result)?,
            Err(run_error) => writeln!(output, "Error: {}", run_error)?,
        }

        if show_prompts {
            writeln!(output, "{}", NEXT_PROMPT)?;
        }
        output.flush()?;
    }

    Ok(())
}

/// Run the interpreter on the configured source file, or on standard input
/// when there is none.
pub fn run_interpreter(config: &InterpreterConfig) -> Result<(), RunError> {
    let stdout = io::stdout();
    let mut output = stdout.lock();

    match &config.src_filepath {
        Some(src_filepath) => {
            info!(path = %src_filepath.display(), "reading expressions from file");
            let input = BufReader::new(File::open(src_filepath)?);
            run_lines(input, &mut output, config, false)
        }
        None => {
            let stdin = io::stdin();
            run_lines(stdin.lock(), &mut output, config, !config.quiet)
        }
    }
}
