//! This crate contains code for a small untyped lambda calculus evaluator.

pub mod box_tree_impl;
pub mod end_to_end;
pub mod lexical_analysis;

pub use box_tree_impl::box_tree_ast::{Environment, Expression};
pub use box_tree_impl::box_tree_execution::{EvalError, Evaluator, NameSupply};
pub use box_tree_impl::box_tree_parsing::{parse_expression, SyntaxError};
