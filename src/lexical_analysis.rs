//! Splits lambda calculus source text into classified tokens.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

/// The different classes of tokens that compose the language.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum TokenClass {
    OpenParen,
    CloseParen,
    Lambda,
    Dot,
    Identifier,
    Whitespace,
}

/// Represents a single token of the language.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Token {
    pub token_class: TokenClass,
    pub token_text: String,
    /// 1-based character column of the first character of the token.
    pub column: usize,
}

/// Errors produced while splitting the input into tokens.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LexError {
    #[error("unrecognized character {character:?} at column {column}")]
    UnrecognizedCharacter { character: char, column: usize },
}

// Represents how to recognize a token class.
#[derive(Debug)]
struct TokenRule {
    token_class: TokenClass,
    regex: Regex,
}

// Anchored regex patterns for each token class.
lazy_static! {
    static ref TOKEN_RULES: Vec<TokenRule> = vec![
        TokenRule {
            token_class: TokenClass::OpenParen,
            regex: Regex::new(r"^\(").expect("Unable to compile OpenParen rule regex."),
        },
        TokenRule {
            token_class: TokenClass::CloseParen,
            regex: Regex::new(r"^\)").expect("Unable to compile CloseParen rule regex."),
        },
        TokenRule {
            token_class: TokenClass::Lambda,
            regex: Regex::new(r"^(\\|λ)").expect("Unable to compile Lambda rule regex."),
        },
        TokenRule {
            token_class: TokenClass::Dot,
            regex: Regex::new(r"^\.").expect("Unable to compile Dot rule regex."),
        },
        TokenRule {
            token_class: TokenClass::Identifier,
            regex: Regex::new(r"^[^\s().\\λ\p{Cc}]+")
                .expect("Unable to compile Identifier rule regex."),
        },
        TokenRule {
            token_class: TokenClass::Whitespace,
            regex: Regex::new(r"^\s+").expect("Unable to compile Whitespace rule regex."),
        },
    ];
}

// Finds the rule that matches the most characters from the start of the input
// string, if any rule matches at all.
fn get_longest_matching_rule(input_str: &str) -> Option<(&'static TokenRule, usize)> {
    TOKEN_RULES
        .iter()
        .filter_map(|token_rule| {
            token_rule
                .regex
                .find(input_str)
                .map(|match_obj| (token_rule, match_obj.len()))
        })
        .filter(|&(_, match_len)| match_len > 0)
        .max_by_key(|&(_, match_len)| match_len)
}

/// Given a string, returns the tokens that comprise it. When
/// `discard_uninteresting` is set, whitespace tokens are dropped. Control
/// characters other than whitespace are rejected.
pub fn run_lexical_analysis(
    program_str: &str,
    discard_uninteresting: bool,
) -> Result<Vec<Token>, LexError> {
    let mut curr_idx: usize = 0;
    let mut column: usize = 1;
    let mut out = Vec::new();

    while curr_idx < program_str.len() {
        let rest = &program_str[curr_idx..];

        // Find the token starting here, if there is one.
        let Some((token_rule, match_len)) = get_longest_matching_rule(rest) else {
            return Err(LexError::UnrecognizedCharacter {
                character: rest.chars().next().unwrap_or_default(),
                column,
            });
        };

        let token_text = &rest[..match_len];
        let token_width = token_text.chars().count();

        if !(discard_uninteresting && token_rule.token_class == TokenClass::Whitespace) {
            out.push(Token {
                token_class: token_rule.token_class,
                token_text: String::from(token_text),
                column,
            });
        }

        curr_idx += match_len;
        column += token_width;
    }

    return Ok(out);
}
