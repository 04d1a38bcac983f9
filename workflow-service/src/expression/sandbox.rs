// Script Sandbox
// Runs JavaScript snippets in a fresh boa context with runtime limits and JSON in/out

use crate::expression::security;

use boa_engine::{Context, Source};
use serde_json::{Map, Value};
use std::fmt;

/// Evaluation error
#[derive(Debug, Clone, PartialEq)]
pub struct EvalError {
    pub message: String,
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "evaluation error: {}", self.message)
    }
}

impl std::error::Error for EvalError {}

impl EvalError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Data a script can see: the node input and the variable store
#[derive(Debug, Clone, Copy)]
pub struct ExpressionContext<'a> {
    pub input: &'a Value,
    pub variables: &'a Map<String, Value>,
}

impl<'a> ExpressionContext<'a> {
    pub fn new(input: &'a Value, variables: &'a Map<String, Value>) -> Self {
        Self { input, variables }
    }
}

/// Resource limits applied to every run
#[derive(Debug, Clone)]
pub struct SandboxLimits {
    /// Max source length in bytes
    pub max_code_length: usize,
    /// Iterations a single loop may run
    pub loop_iteration_limit: u64,
    /// Nested call depth
    pub recursion_limit: usize,
    /// VM stack slots
    pub stack_size_limit: usize,
    /// Max serialized result size in bytes
    pub max_output_bytes: usize,
}

impl Default for SandboxLimits {
    fn default() -> Self {
        Self {
            max_code_length: 64 * 1024,
            loop_iteration_limit: 1_000_000,
            recursion_limit: 256,
            stack_size_limit: 10 * 1024,
            max_output_bytes: 4 * 1024 * 1024,
        }
    }
}

/// JavaScript sandbox built on boa_engine.
///
/// Every run gets its own `Context`, so nothing leaks between nodes or
/// between the elements of a transform. Inputs and results cross the
/// boundary as JSON text.
#[derive(Debug, Clone, Default)]
pub struct Sandbox {
    limits: SandboxLimits,
}

impl Sandbox {
    pub fn new(limits: SandboxLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &SandboxLimits {
        &self.limits
    }

    /// Check code length and the security rules for a wrapped source
    pub fn validate(&self, code: &str, wrapped: &str) -> Result<(), EvalError> {
        if code.len() > self.limits.max_code_length {
            return Err(EvalError::new(format!(
                "code too large: {} bytes (max {})",
                code.len(),
                self.limits.max_code_length
            )));
        }
        security::check(wrapped)
    }

    /// Evaluate `function` (any expression that yields a callable) and call
    /// it with `args`.
    ///
    /// `input`, `variables` and one `$name` constant per variable referenced
    /// in `code` are in scope. `undefined` results come back as null.
    pub fn call(
        &self,
        context: ExpressionContext<'_>,
        code: &str,
        function: &str,
        args: &[Value],
    ) -> Result<Value, EvalError> {
        let mut source = String::new();
        source.push_str("const __stringify = JSON.stringify;\n");
        source.push_str(&format!("const input = {};\n", json_literal(context.input)?));
        source.push_str(&format!(
            "const variables = {};\n",
            json_literal(&Value::Object(context.variables.clone()))?
        ));
        for name in dollar_names(code) {
            let value = match context.variables.get(&name) {
                Some(value) => json_literal(value)?,
                None => "undefined".to_string(),
            };
            source.push_str(&format!("const ${} = {};\n", name, value));
        }

        let mut arguments = Vec::with_capacity(args.len());
        for value in args {
            arguments.push(json_literal(value)?);
        }
        source.push_str(&format!(
            "(function (__result) {{ return __result === undefined ? 'null' : __stringify(__result); }})(({})({}));\n",
            function,
            arguments.join(", ")
        ));

        self.eval(&source)
    }

    fn eval(&self, source: &str) -> Result<Value, EvalError> {
        let mut context = Context::default();
        let limits = context.runtime_limits_mut();
        limits.set_loop_iteration_limit(self.limits.loop_iteration_limit);
        limits.set_recursion_limit(self.limits.recursion_limit);
        limits.set_stack_size_limit(self.limits.stack_size_limit);

        let result = context
            .eval(Source::from_bytes(source))
            .map_err(|e| EvalError::new(e.to_string()))?;

        let text = result
            .as_string()
            .map(|s| s.to_std_string_escaped())
            .ok_or_else(|| EvalError::new("result is not serializable"))?;

        if text.len() > self.limits.max_output_bytes {
            return Err(EvalError::new(format!(
                "output too large: {} bytes (max {})",
                text.len(),
                self.limits.max_output_bytes
            )));
        }

        serde_json::from_str(&text).map_err(|e| EvalError::new(format!("invalid result: {}", e)))
    }
}

/// JS source that rebuilds `value` through `JSON.parse`, so keys such as
/// `__proto__` stay plain data
fn json_literal(value: &Value) -> Result<String, EvalError> {
    let text = serde_json::to_string(value).map_err(|e| EvalError::new(e.to_string()))?;
    let quoted = serde_json::to_string(&text).map_err(|e| EvalError::new(e.to_string()))?;
    Ok(format!("JSON.parse({})", quoted))
}

/// Names referenced as `$name` in the code, in first-seen order
pub fn dollar_names(code: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut chars = code.chars().peekable();
    let mut previous: Option<char> = None;

    while let Some(c) = chars.next() {
        let starts_token = c == '$'
            && !previous
                .map(|p| p.is_alphanumeric() || p == '_' || p == '$')
                .unwrap_or(false);
        previous = Some(c);
        if !starts_token {
            continue;
        }

        let mut name = String::new();
        while let Some(&next) = chars.peek() {
            if !(next.is_ascii_alphanumeric() || next == '_') {
                break;
            }
            name.push(next);
            previous = Some(next);
            chars.next();
        }

        let valid = name
            .chars()
            .next()
            .map(|first| first.is_ascii_alphabetic() || first == '_')
            .unwrap_or(false);
        if valid && !names.contains(&name) {
            names.push(name);
        }
    }

    names
}
