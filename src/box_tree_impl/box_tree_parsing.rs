//! Shift/reduce parser that constructs lambda-calculus expressions in the
//! box-tree representation given a slice of tokens.

use thiserror::Error;

use crate::box_tree_impl::box_tree_ast::Expression;
use crate::lexical_analysis::{run_lexical_analysis, LexError, Token, TokenClass};

/// Represents a parsing error. Columns are 1-based character positions in
/// the input line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyntaxError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("empty expression")]
    EmptyExpression,
    #[error("empty parentheses at column {column}")]
    EmptyParentheses { column: usize },
    #[error("unbalanced parentheses: `(` at column {column} is never closed")]
    UnclosedParenthesis { column: usize },
    #[error("unbalanced parentheses: unexpected `)` at column {column}")]
    UnmatchedCloseParenthesis { column: usize },
    #[error("expected a parameter name after the lambda at column {column}")]
    MissingParameter { column: usize },
    #[error("abstraction over `{parameter}` at column {column} has no body")]
    EmptyBody { parameter: String, column: usize },
    #[error("unexpected `.` at column {column}")]
    UnexpectedDot { column: usize },
}

// An entry of the parse stack: either the position of a pending `(` or a
// fully built expression.
#[derive(Debug)]
enum StackEntry {
    Marker { column: usize },
    Expr(Expression),
}

// Pushes a complete expression. Two adjacent expressions combine into an
// application, which makes juxtaposition left-associative.
fn shift_expression(stack: &mut Vec<StackEntry>, expression: Expression) {
    let combined = match stack.pop() {
        Some(StackEntry::Expr(function)) => Expression::application(function, expression),
        Some(marker) => {
            stack.push(marker);
            expression
        }
        None => expression,
    };

    stack.push(StackEntry::Expr(combined));
}

// Handles a `)`: the expression built since the matching `(` replaces it.
fn reduce_parenthesis(stack: &mut Vec<StackEntry>, column: usize) -> Result<(), SyntaxError> {
    let inner = match stack.pop() {
        Some(StackEntry::Expr(inner)) => inner,
        Some(StackEntry::Marker { column: open_column }) => {
            return Err(SyntaxError::EmptyParentheses {
                column: open_column,
            })
        }
        None => return Err(SyntaxError::UnmatchedCloseParenthesis { column }),
    };

    match stack.pop() {
        Some(StackEntry::Marker { .. }) => {
            shift_expression(stack, inner);
            Ok(())
        }
        _ => Err(SyntaxError::UnmatchedCloseParenthesis { column }),
    }
}

// Finds where an abstraction body starting at `start_idx` ends: at the first
// `)` without a matching `(` inside the body, or at the end of the tokens.
fn find_body_end(tokens: &[Token], start_idx: usize) -> usize {
    let mut depth: usize = 0;

    for (idx, token) in tokens.iter().enumerate().skip(start_idx) {
        match token.token_class {
            TokenClass::OpenParen => depth += 1,
            TokenClass::CloseParen if depth == 0 => return idx,
            TokenClass::CloseParen => depth -= 1,
            _ => {}
        }
    }

    tokens.len()
}

// Parses an abstraction whose lambda token is at `lambda_idx`. Returns the
// abstraction and the index of the first token after its body.
fn parse_abstraction(
    tokens: &[Token],
    lambda_idx: usize,
) -> Result<(Expression, usize), SyntaxError> {
    let lambda_column = tokens[lambda_idx].column;

    let parameter = match tokens.get(lambda_idx + 1) {
        Some(token) if token.token_class == TokenClass::Identifier => token.token_text.clone(),
        Some(token) => return Err(SyntaxError::MissingParameter { column: token.column }),
        None => {
            return Err(SyntaxError::MissingParameter {
                column: lambda_column,
            })
        }
    };

    let mut body_start = lambda_idx + 2;
    if let Some(Token {
        token_class: TokenClass::Dot,
        ..
    }) = tokens.get(body_start)
    {
        body_start += 1;
    }

    let body_end = find_body_end(tokens, body_start);
    if body_start >= body_end {
        return Err(SyntaxError::EmptyBody {
            parameter,
            column: lambda_column,
        });
    }

    let body = parse_tokens(&tokens[body_start..body_end])?;

    Ok((Expression::abstraction(parameter, body), body_end))
}

/// Parses a token slice (whitespace already discarded) into an expression.
pub fn parse_tokens(tokens: &[Token]) -> Result<Expression, SyntaxError> {
    let mut stack: Vec<StackEntry> = Vec::new();
    let mut idx = 0;

    while idx < tokens.len() {
        let token = &tokens[idx];

        match token.token_class {
            TokenClass::OpenParen => {
                stack.push(StackEntry::Marker {
                    column: token.column,
                });
                idx += 1;
            }
            TokenClass::CloseParen => {
                reduce_parenthesis(&mut stack, token.column)?;
                idx += 1;
            }
            TokenClass::Lambda => {
                let (abstraction, next_idx) = parse_abstraction(tokens, idx)?;
                shift_expression(&mut stack, abstraction);
                idx = next_idx;
            }
            TokenClass::Identifier => {
                shift_expression(&mut stack, Expression::variable(token.token_text.as_str()));
                idx += 1;
            }
            TokenClass::Dot => {
                return Err(SyntaxError::UnexpectedDot {
                    column: token.column,
                })
            }
            TokenClass::Whitespace => idx += 1,
        }
    }

    let expression = match stack.pop() {
        Some(StackEntry::Expr(expression)) => expression,
        Some(StackEntry::Marker { column }) => {
            return Err(SyntaxError::UnclosedParenthesis { column })
        }
        None => return Err(SyntaxError::EmptyExpression),
    };

    // Adjacent expressions are combined when shifted, so anything left below
    // is an unclosed `(`.
    match stack.pop() {
        Some(StackEntry::Marker { column }) => Err(SyntaxError::UnclosedParenthesis { column }),
        _ => Ok(expression),
    }
}

/// Lexes and parses a line of text into an expression.
pub fn parse_expression(program_str: &str) -> Result<Expression, SyntaxError> {
    // Run lexer.
    let tokens = run_lexical_analysis(program_str, true)?;

    // Run parser.
    return parse_tokens(&tokens);
}
