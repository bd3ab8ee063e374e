//! Data structures to represent lambda calculus expressions, and some utility
//! functions to display and inspect them.

use std::collections::{HashMap, HashSet};
use std::fmt;

/// Represents a lambda-calculus expression. Children are exclusively owned
/// by their parent and trees are never mutated after construction.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Expression {
    Variable {
        name: String,
    },
    Abstraction {
        parameter: String,
        body: Box<Expression>,
    },
    Application {
        function: Box<Expression>,
        argument: Box<Expression>,
    },
}

/// Maps names to the expressions they stand for while evaluating.
pub type Environment = HashMap<String, Expression>;

impl Expression {
    pub fn variable(name: impl Into<String>) -> Self {
        Self::Variable { name: name.into() }
    }

    pub fn abstraction(parameter: impl Into<String>, body: Expression) -> Self {
        Self::Abstraction {
            parameter: parameter.into(),
            body: Box::new(body),
        }
    }

    pub fn application(function: Expression, argument: Expression) -> Self {
        Self::Application {
            function: Box::new(function),
            argument: Box::new(argument),
        }
    }

    /// Computes the free variables of this expression.
    pub fn free_variables(&self) -> HashSet<&str> {
        match self {
            Self::Variable { name } => HashSet::from([name.as_str()]),
            Self::Abstraction { parameter, body } => {
                let mut body_free_vars = body.free_variables();
                body_free_vars.remove(parameter.as_str());
                body_free_vars
            }
            Self::Application { function, argument } => {
                let mut free_vars = function.free_variables();
                free_vars.extend(argument.free_variables());
                free_vars
            }
        }
    }

    /// Whether `variable` occurs free in this expression.
    pub fn has_free_variable(&self, variable: &str) -> bool {
        match self {
            Self::Variable { name } => name == variable,
            Self::Abstraction { parameter, body } => {
                parameter != variable && body.has_free_variable(variable)
            }
            Self::Application { function, argument } => {
                function.has_free_variable(variable) || argument.has_free_variable(variable)
            }
        }
    }

    /// Finds all variable names used in this expression, binders included.
    pub fn all_variables(&self) -> HashSet<&str> {
        match self {
            Self::Variable { name } => HashSet::from([name.as_str()]),
            Self::Abstraction { parameter, body } => {
                let mut body_vars = body.all_variables();
                body_vars.insert(parameter.as_str());
                body_vars
            }
            Self::Application { function, argument } => {
                let mut vars = function.all_variables();
                vars.extend(argument.all_variables());
                vars
            }
        }
    }

    /// Returns a copy of this expression with the free occurrences of
    /// `old_name` renamed to `new_name`. The caller must make sure `new_name`
    /// is not bound anywhere inside.
    pub fn rename_free(&self, old_name: &str, new_name: &str) -> Expression {
        match self {
            Self::Variable { name } if name == old_name => Self::variable(new_name),
            Self::Variable { .. } => self.clone(),
            Self::Abstraction { parameter, .. } if parameter == old_name => self.clone(),
            Self::Abstraction { parameter, body } => {
                Self::abstraction(parameter.clone(), body.rename_free(old_name, new_name))
            }
            Self::Application { function, argument } => Self::application(
                function.rename_free(old_name, new_name),
                argument.rename_free(old_name, new_name),
            ),
        }
    }
}

// An abstraction in function position gets its own parentheses, otherwise its
// body would swallow the argument when the text is parsed again.
fn write_expression(expression: &Expression, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match expression {
        Expression::Variable { name } => f.write_str(name),
        Expression::Abstraction { parameter, body } => {
            write!(f, "\\{}.", parameter)?;
            write_expression(body, f)
        }
        Expression::Application { function, argument } => {
            f.write_str("(")?;
            if let Expression::Abstraction { .. } = **function {
                f.write_str("(")?;
                write_expression(function, f)?;
                f.write_str(")")?;
            } else {
                write_expression(function, f)?;
            }
            f.write_str(" ")?;
            write_expression(argument, f)?;
            f.write_str(")")
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_expression(self, f)
    }
}
