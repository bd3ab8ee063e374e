//! Evaluates lambda-calculus expressions given in the box-tree
//! representation.

use std::collections::HashSet;

use thiserror::Error;
use tracing::{debug, trace};

use crate::box_tree_impl::box_tree_ast::{Environment, Expression};

/// Errors that may stop an evaluation before it reaches a normal form.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EvalError {
    #[error("evaluation did not finish within {limit} reduction steps")]
    EvaluationTimeout { limit: usize },
}

/// Hands out binder names that have not been used before. The counter only
/// ever grows, so two names from the same supply never coincide.
#[derive(Debug, Default, Clone)]
pub struct NameSupply {
    counter: usize,
}

impl NameSupply {
    pub fn new() -> Self {
        Self::default()
    }

    /// Produces a name derived from `base` that is not in `avoid`.
    pub fn fresh(&mut self, base: &str, avoid: &HashSet<&str>) -> String {
        let stem = match base.trim_end_matches(|c: char| c.is_ascii_digit()) {
            "" => "v",
            stem => stem,
        };

        loop {
            self.counter += 1;
            let candidate = format!("{}{}", stem, self.counter);
            if !avoid.contains(candidate.as_str()) {
                return candidate;
            }
        }
    }
}

impl Expression {
    /// Replaces every free occurrence of `variable` with `value`, renaming
    /// binders that would otherwise capture a free variable of `value`.
    pub fn substitute(
        &self,
        variable: &str,
        value: &Expression,
        names: &mut NameSupply,
    ) -> Expression {
        let value_free_vars = value.free_variables();
        substitute_helper(self, variable, value, &value_free_vars, names)
    }
}

fn substitute_helper(
    expression: &Expression,
    variable: &str,
    value: &Expression,
    value_free_vars: &HashSet<&str>,
    names: &mut NameSupply,
) -> Expression {
    match expression {
        Expression::Variable { name } if name == variable => value.clone(),
        Expression::Variable { .. } => expression.clone(),

        Expression::Abstraction { parameter, .. } if parameter == variable => expression.clone(),
        Expression::Abstraction { body, .. } if !body.has_free_variable(variable) => {
            expression.clone()
        }
        Expression::Abstraction { parameter, body } => {
            if value_free_vars.contains(parameter.as_str()) {
                let mut avoid = body.all_variables();
                avoid.extend(value_free_vars.iter().copied());
                let fresh_parameter = names.fresh(parameter, &avoid);
                trace!(
                    from = %parameter,
                    to = %fresh_parameter,
                    "alpha-renaming binder to avoid capture"
                );

                let renamed_body = body.rename_free(parameter, &fresh_parameter);
                let substituted_body =
                    substitute_helper(&renamed_body, variable, value, value_free_vars, names);
                return Expression::abstraction(fresh_parameter, substituted_body);
            }

            Expression::abstraction(
                parameter.clone(),
                substitute_helper(body, variable, value, value_free_vars, names),
            )
        }

        Expression::Application { function, argument } => Expression::application(
            substitute_helper(function, variable, value, value_free_vars, names),
            substitute_helper(argument, variable, value, value_free_vars, names),
        ),
    }
}

// Work left to do once the term currently being evaluated becomes a value.
#[derive(Debug)]
enum Frame {
    // The function of an application is being evaluated; its argument waits.
    EvalFunction { argument: Expression },
    // The argument is being evaluated; the function value waits.
    EvalArgument { function: Expression },
}

/// Reduces expressions under call-by-value, optionally bounded by a number of
/// reduction steps. Pending work is kept on an explicit stack of frames, so
/// deeply nested reductions never grow the host call stack.
#[derive(Debug, Clone)]
pub struct Evaluator {
    max_steps: Option<usize>,
    steps: usize,
    names: NameSupply,
}

impl Evaluator {
    /// An evaluator that gives up after `max_steps` reductions, or never when
    /// `None`.
    pub fn new(max_steps: Option<usize>) -> Self {
        Self {
            max_steps,
            steps: 0,
            names: NameSupply::new(),
        }
    }

    pub fn unbounded() -> Self {
        Self::new(None)
    }

    /// Number of steps taken by the most recent call to `evaluate`.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Evaluates `expression` to weak normal form. Names bound in `env` are
    /// looked up when they would otherwise be free; unbound names are left
    /// as they are. Every call starts from a fresh step count and name
    /// supply, so the same input always gives the same result.
    pub fn evaluate(
        &mut self,
        expression: &Expression,
        env: &Environment,
    ) -> Result<Expression, EvalError> {
        self.steps = 0;
        self.names = NameSupply::new();
        return self.evaluate_term(expression, env);
    }

    fn tick(&mut self) -> Result<(), EvalError> {
        self.steps += 1;
        match self.max_steps {
            Some(limit) if self.steps > limit => Err(EvalError::EvaluationTimeout { limit }),
            _ => Ok(()),
        }
    }

    fn evaluate_term(
        &mut self,
        expression: &Expression,
        env: &Environment,
    ) -> Result<Expression, EvalError> {
        let mut frames: Vec<Frame> = Vec::new();
        let mut current = expression.clone();

        loop {
            // Descend into function positions until we reach a value.
            let mut value = match current {
                Expression::Variable { ref name } => match env.get(name) {
                    Some(bound) => {
                        self.tick()?;
                        debug!(name = %name, "expanding bound variable");
                        current = bound.clone();
                        continue;
                    }
                    None => current,
                },

                Expression::Abstraction { .. } => current,

                Expression::Application { function, argument } => {
                    frames.push(Frame::EvalFunction {
                        argument: *argument,
                    });
                    current = *function;
                    continue;
                }
            };

            // Hand the value back to the waiting frames until one of them has
            // more evaluating to do.
            current = loop {
                match frames.pop() {
                    None => return Ok(value),

                    Some(Frame::EvalFunction { argument }) => {
                        frames.push(Frame::EvalArgument { function: value });
                        break argument;
                    }

                    // The function is an abstraction, so we are at a redex.
                    Some(Frame::EvalArgument {
                        function: Expression::Abstraction { parameter, body },
                    }) => {
                        self.tick()?;
                        debug!(
                            step = self.steps,
                            parameter = %parameter,
                            argument = %value,
                            "beta-reducing"
                        );
                        break body.substitute(&parameter, &value, &mut self.names);
                    }

                    // Anything else applied to the value is stuck.
                    Some(Frame::EvalArgument { function }) => {
                        value = Expression::application(function, value);
                    }
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::box_tree_impl::box_tree_parsing::parse_expression;

    use super::*;

    fn parse(program_str: &str) -> Expression {
        parse_expression(program_str).expect("Unable to parse program string.")
    }

    // Parses and evaluates program_str with an empty environment and renders
    // the result.
    fn eval_to_string(program_str: &str) -> String {
        Evaluator::unbounded()
            .evaluate(&parse(program_str), &Environment::new())
            .expect("Evaluation failed.")
            .to_string()
    }

    #[test]
    fn test_fresh_names() {
        let mut names = NameSupply::new();
        let avoid = HashSet::from(["y2"]);

        assert_eq!(names.fresh("y", &avoid), "y1");
        assert_eq!(names.fresh("y", &avoid), "y3");
        assert_eq!(names.fresh("x7", &avoid), "x4");
        assert_eq!(names.fresh("42", &avoid), "v5");
    }

    #[test]
    fn test_substitute_variable() {
        let mut names = NameSupply::new();
        let value = parse(r"\z.z");

        assert_eq!(parse("x").substitute("x", &value, &mut names), value);
        assert_eq!(parse("y").substitute("x", &value, &mut names), parse("y"));
        assert_eq!(
            parse("(x (y x))").substitute("x", &value, &mut names).to_string(),
            r"((\z.z) (y \z.z))"
        );
    }

    // A binder with the substituted name shadows it.
    #[test]
    fn test_substitute_shadowed() {
        let mut names = NameSupply::new();
        let expr = parse(r"\x.\y.x");

        let result = expr.substitute("x", &parse("y"), &mut names);

        assert_eq!(result, expr);
        assert_ne!(result.to_string(), r"\y.y");
    }

    // Substituting a free `y` under a `y` binder must rename the binder.
    #[test]
    fn test_substitute_avoids_capture() {
        let mut names = NameSupply::new();

        let result = parse(r"\y.x").substitute("x", &parse("y"), &mut names);

        assert_eq!(result.to_string(), r"\y1.y");
    }

    // The fresh name may not collide with anything in the body either.
    #[test]
    fn test_substitute_fresh_name_skips_body_names() {
        let mut names = NameSupply::new();

        let result = parse(r"\y.(x y1)").substitute("x", &parse("y"), &mut names);

        assert_eq!(result.to_string(), r"\y2.(y y1)");
    }

    #[test]
    fn test_capture_avoided_during_evaluation() {
        assert_eq!(eval_to_string(r"((\x.\y.x) y)"), r"\y1.y");

        // The renamed function still ignores its argument.
        assert_eq!(eval_to_string(r"(((\x.\y.x) y) z)"), "y");
    }

    #[test]
    fn test_identity() {
        let identity = parse(r"\x.x");
        let mut evaluator = Evaluator::unbounded();

        assert_eq!(
            evaluator
                .evaluate(&identity, &Environment::new())
                .expect("Evaluation failed."),
            identity
        );
        assert_eq!(eval_to_string(r"((\x.x) e)"), "e");
        assert_eq!(eval_to_string(r"((\x.x) ((\y.y) e))"), "e");
        assert_eq!(eval_to_string(r"((\x.x) \y.y)"), r"\y.y");
    }

    // Free variables are stuck, not errors.
    #[test]
    fn test_stuck_terms() {
        assert_eq!(eval_to_string("y"), "y");
        assert_eq!(eval_to_string("(y z)"), "(y z)");
        assert_eq!(eval_to_string(r"(y ((\x.x) z))"), "(y z)");
    }

    // Bodies of abstractions are left alone.
    #[test]
    fn test_abstraction_bodies_not_reduced() {
        assert_eq!(eval_to_string(r"\z.((\x.x) z)"), r"\z.((\x.x) z)");
    }

    #[test]
    fn test_church_successor_of_zero() {
        let zero = r"\f.\x.x";
        let succ = r"\n.\f.\x.(f ((n f) x))";
        let one = format!("(({}) {})", succ, zero);

        assert_eq!(eval_to_string(&one), r"\f.\x.(f (((\f.\x.x) f) x))");

        // Applied to fresh names it behaves like \f.\x.(f x).
        assert_eq!(eval_to_string(&format!("(({} a) b)", one)), "(a b)");
        assert_eq!(eval_to_string(r"(((\f.\x.(f x)) a) b)"), "(a b)");
    }

    #[test]
    fn test_church_addition() {
        let two = r"\f.\x.(f (f x))";
        let three = r"\f.\x.(f (f (f x)))";
        let add = r"\m.\n.\f.\x.((m f) ((n f) x))";
        let program = format!("((((({}) {}) {}) s) z)", add, two, three);

        assert_eq!(eval_to_string(&program), "(s (s (s (s (s z)))))");
    }

    // Reusing an evaluator gives the same fresh names every time.
    #[test]
    fn test_determinism() {
        let expr = parse(r"((\x.\y.(x y)) y)");
        let mut evaluator = Evaluator::unbounded();

        let first = evaluator
            .evaluate(&expr, &Environment::new())
            .expect("Evaluation failed.");
        let second = evaluator
            .evaluate(&expr, &Environment::new())
            .expect("Evaluation failed.");

        assert_eq!(first, second);
        assert_eq!(first.to_string(), r"\y1.(y y1)");
    }

    #[test]
    fn test_environment_lookup() {
        let mut env = Environment::new();
        env.insert(String::from("id"), parse(r"\x.x"));
        env.insert(String::from("alias"), parse("id"));

        let mut evaluator = Evaluator::unbounded();

        let direct = evaluator
            .evaluate(&parse("(id a)"), &env)
            .expect("Evaluation failed.");
        let chained = evaluator
            .evaluate(&parse("(alias a)"), &env)
            .expect("Evaluation failed.");

        assert_eq!(direct.to_string(), "a");
        assert_eq!(chained.to_string(), "a");
    }

    #[test]
    fn test_step_limit_on_self_application() {
        let omega = parse(r"((\x.(x x)) \x.(x x))");
        let mut evaluator = Evaluator::new(Some(100));

        let result = evaluator.evaluate(&omega, &Environment::new());

        assert_eq!(result, Err(EvalError::EvaluationTimeout { limit: 100 }));
    }

    // Each reduct nests the next redex in function position, which must not
    // exhaust the call stack before the step limit is reached.
    #[test]
    fn test_step_limit_on_growing_function_position() {
        let expr = parse(r"((\x.(x x)) \x.((x x) a))");
        let mut evaluator = Evaluator::new(Some(200_000));

        let result = evaluator.evaluate(&expr, &Environment::new());

        assert_eq!(result, Err(EvalError::EvaluationTimeout { limit: 200_000 }));
    }

    // Stuck applications nested under a redex are rebuilt on the way out.
    #[test]
    fn test_stuck_function_with_reducible_arguments() {
        assert_eq!(
            eval_to_string(r"((f ((\x.x) a)) ((\y.y) b))"),
            "((f a) b)"
        );
    }

    // A self-referencing binding is caught by the step limit too.
    #[test]
    fn test_step_limit_on_cyclic_binding() {
        let mut env = Environment::new();
        env.insert(String::from("loop"), parse("loop"));

        let result = Evaluator::new(Some(10)).evaluate(&parse("loop"), &env);

        assert!(matches!(result, Err(EvalError::EvaluationTimeout { limit: 10 })));
    }

    #[test]
    fn test_step_count_resets() {
        let expr = parse(r"((\x.x) ((\y.y) e))");
        let mut evaluator = Evaluator::new(Some(2));

        evaluator
            .evaluate(&expr, &Environment::new())
            .expect("Evaluation failed.");
        assert_eq!(evaluator.steps(), 2);

        evaluator
            .evaluate(&expr, &Environment::new())
            .expect("Evaluation failed.");
        assert_eq!(evaluator.steps(), 2);
    }
}
