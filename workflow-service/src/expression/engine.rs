// Expression Engine
// Evaluates inline expressions against node input and workflow variables

use crate::expression::compare::is_truthy;
use crate::expression::sandbox::{EvalError, ExpressionContext};
use crate::expression::script::Script;

use serde_json::Value;

/// High-level expression engine
pub struct ExpressionEngine<'a> {
    context: ExpressionContext<'a>,
}

impl<'a> ExpressionEngine<'a> {
    pub fn new(context: ExpressionContext<'a>) -> Self {
        Self { context }
    }

    /// Evaluate an expression, propagating parse and evaluation errors
    pub fn try_evaluate(&self, expr: &str) -> Result<Value, EvalError> {
        Script::expression(expr)?.run(self.context, &[])
    }

    /// Evaluate an expression. Any failure yields `false` and is noted in
    /// `warnings`.
    pub fn evaluate(&self, expr: &str, warnings: &mut Vec<String>) -> Value {
        match self.try_evaluate(expr) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(expression = expr, error = %e, "expression evaluation failed");
                warnings.push(format!("expression `{}` failed: {}", expr, e.message));
                Value::Bool(false)
            }
        }
    }

    /// Evaluate an expression as a condition
    pub fn evaluate_condition(&self, expr: &str, warnings: &mut Vec<String>) -> bool {
        is_truthy(&self.evaluate(expr, warnings))
    }

    pub fn context(&self) -> ExpressionContext<'a> {
        self.context
    }
}
