// Script Runner
// Runs lambda, transform, filter and condition bodies through the sandbox

use crate::expression::sandbox::{EvalError, ExpressionContext, Sandbox, SandboxLimits};

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Form {
    /// A single expression. Its value is the result.
    Expression,
    /// Statements. The result is the `return` value, or null.
    Body,
}

/// Parsed and security-checked script
#[derive(Debug, Clone)]
pub struct Script {
    source: String,
    form: Form,
    sandbox: Sandbox,
}

impl Script {
    /// Accept either a single expression or a statement body
    pub fn parse(source: &str) -> Result<Self, EvalError> {
        Self::parse_with(source, Sandbox::default())
    }

    pub fn parse_with(source: &str, sandbox: Sandbox) -> Result<Self, EvalError> {
        let trimmed = trim_source(source);
        if let Ok(script) = Self::expression_with(trimmed, sandbox.clone()) {
            return Ok(script);
        }

        sandbox.validate(trimmed, &body_wrapper(trimmed, &[], ""))?;
        Ok(Self {
            source: trimmed.to_string(),
            form: Form::Body,
            sandbox,
        })
    }

    /// Accept a single expression only
    pub fn expression(source: &str) -> Result<Self, EvalError> {
        Self::expression_with(trim_source(source), Sandbox::default())
    }

    fn expression_with(source: &str, sandbox: Sandbox) -> Result<Self, EvalError> {
        if source.is_empty() {
            return Err(EvalError::new("parse error: empty expression"));
        }
        sandbox.validate(source, &format!("(\n{}\n)", source))?;
        Ok(Self {
            source: source.to_string(),
            form: Form::Expression,
            sandbox,
        })
    }

    /// Replace the sandbox limits
    pub fn with_limits(mut self, limits: SandboxLimits) -> Self {
        self.sandbox = Sandbox::new(limits);
        self
    }

    pub fn is_expression(&self) -> bool {
        self.form == Form::Expression
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Run with extra bindings such as `item` and `index`
    pub fn run(
        &self,
        context: ExpressionContext<'_>,
        bindings: &[(&str, Value)],
    ) -> Result<Value, EvalError> {
        let names: Vec<&str> = bindings.iter().map(|(name, _)| *name).collect();
        let values: Vec<Value> = bindings.iter().map(|(_, value)| value.clone()).collect();

        let function = match self.form {
            Form::Expression => format!(
                "(function ({}) {{ return (\n{}\n); }})",
                names.join(", "),
                self.source
            ),
            Form::Body => body_wrapper(&self.source, &names, ""),
        };
        self.sandbox
            .call(context, &self.source, &function, &values)
    }

    /// Run the body, then call `entry(input)` when the body declares it.
    ///
    /// A top-level `return` ends the run early. A script that never declares
    /// `entry` hands `input` back unchanged.
    pub fn run_entry(&self, context: ExpressionContext<'_>, entry: &str) -> Result<Value, EvalError> {
        let tail = format!(
            "return typeof {entry} === 'function' ? {entry}(input) : input;",
            entry = entry
        );
        let function = body_wrapper(&self.source, &[], &tail);
        self.sandbox.call(context, &self.source, &function, &[])
    }
}

fn trim_source(source: &str) -> &str {
    source.trim().trim_end_matches(';').trim_end()
}

fn body_wrapper(source: &str, params: &[&str], tail: &str) -> String {
    format!(
        "(function ({}) {{\n{}\n;{}\n}})",
        params.join(", "),
        source,
        tail
    )
}
