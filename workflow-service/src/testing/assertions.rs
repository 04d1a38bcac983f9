// Assertion Logic
// Evaluates test assertions against workflow execution results

use crate::execution::context::NodeStatus;
use crate::execution::executor::ExecutionResult;
use crate::expression::compare::to_display;
use crate::expression::strict_equals;

use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// An evaluable assertion against a workflow execution result
#[derive(Debug, Clone)]
pub enum Assertion {
    WorkflowSucceeded,
    WorkflowFailed,
    FinalOutputEquals { expected: Value },
    OutputContains { pattern: String },
    VariableEquals { name: String, expected: Value },
    NodeStatusIs { node: String, expected: NodeStatus },
    BranchTaken { node: String, branch: String },
    FailedAt { node: String },
}

/// Result of evaluating a single assertion
#[derive(Debug, Clone, Serialize)]
pub struct AssertionResult {
    /// The assertion that was evaluated
    pub assertion: String,
    /// Whether the assertion passed
    pub passed: bool,
    /// Human-readable description of what was checked
    pub message: String,
    /// Details about the failure (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_detail: Option<String>,
}

impl AssertionResult {
    fn pass(assertion: &Assertion, message: impl Into<String>) -> Self {
        Self {
            assertion: assertion.to_string(),
            passed: true,
            message: message.into(),
            failure_detail: None,
        }
    }

    fn fail(assertion: &Assertion, message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            assertion: assertion.to_string(),
            passed: false,
            message: message.into(),
            failure_detail: Some(detail.into()),
        }
    }
}

impl fmt::Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Assertion::WorkflowSucceeded => write!(f, "success(true)"),
            Assertion::WorkflowFailed => write!(f, "success(false)"),
            Assertion::FinalOutputEquals { expected } => write!(f, "final_output({})", expected),
            Assertion::OutputContains { pattern } => write!(f, "output_contains({})", pattern),
            Assertion::VariableEquals { name, expected } => {
                write!(f, "variables.{}({})", name, expected)
            }
            Assertion::NodeStatusIs { node, expected } => {
                write!(f, "node_status.{}({})", node, expected)
            }
            Assertion::BranchTaken { node, branch } => write!(f, "branch.{}({})", node, branch),
            Assertion::FailedAt { node } => write!(f, "error_node({})", node),
        }
    }
}

/// Evaluates assertions against one execution result
pub struct AssertionEvaluator<'a> {
    result: &'a ExecutionResult,
}

impl<'a> AssertionEvaluator<'a> {
    pub fn new(result: &'a ExecutionResult) -> Self {
        Self { result }
    }

    pub fn evaluate(&self, assertion: &Assertion) -> AssertionResult {
        match assertion {
            Assertion::WorkflowSucceeded => self.eval_success(assertion, true),
            Assertion::WorkflowFailed => self.eval_success(assertion, false),
            Assertion::FinalOutputEquals { expected } => {
                self.eval_final_output(assertion, expected)
            }
            Assertion::OutputContains { pattern } => self.eval_output_contains(assertion, pattern),
            Assertion::VariableEquals { name, expected } => {
                self.eval_variable(assertion, name, expected)
            }
            Assertion::NodeStatusIs { node, expected } => {
                self.eval_node_status(assertion, node, *expected)
            }
            Assertion::BranchTaken { node, branch } => self.eval_branch(assertion, node, branch),
            Assertion::FailedAt { node } => self.eval_failed_at(assertion, node),
        }
    }

    pub fn evaluate_all(&self, assertions: &[Assertion]) -> Vec<AssertionResult> {
        assertions.iter().map(|a| self.evaluate(a)).collect()
    }

    fn eval_success(&self, assertion: &Assertion, expected: bool) -> AssertionResult {
        let wanted = if expected { "succeed" } else { "fail" };
        let message = format!("workflow should {}", wanted);

        if self.result.success == expected {
            AssertionResult::pass(assertion, message)
        } else {
            let detail = match &self.result.error {
                Some(err) => format!("workflow failed: {}", err),
                None => "workflow succeeded".to_string(),
            };
            AssertionResult::fail(assertion, message, detail)
        }
    }

    fn eval_final_output(&self, assertion: &Assertion, expected: &Value) -> AssertionResult {
        let message = format!("final output should equal {}", expected);
        if strict_equals(&self.result.final_output, expected) {
            AssertionResult::pass(assertion, message)
        } else {
            AssertionResult::fail(
                assertion,
                message,
                format!("actual: {}", self.result.final_output),
            )
        }
    }

    fn eval_output_contains(&self, assertion: &Assertion, pattern: &str) -> AssertionResult {
        let message = format!("final output should contain '{}'", pattern);
        let rendered = to_display(&self.result.final_output);
        if rendered.contains(pattern) {
            AssertionResult::pass(assertion, message)
        } else {
            AssertionResult::fail(assertion, message, format!("actual: {}", rendered))
        }
    }

    fn eval_variable(&self, assertion: &Assertion, name: &str, expected: &Value) -> AssertionResult {
        let message = format!("variable '{}' should equal {}", name, expected);
        match self.result.variables.get(name) {
            Some(actual) if strict_equals(actual, expected) => {
                AssertionResult::pass(assertion, message)
            }
            Some(actual) => AssertionResult::fail(assertion, message, format!("actual: {}", actual)),
            None => AssertionResult::fail(
                assertion,
                message,
                format!("variable '{}' was never set", name),
            ),
        }
    }

    fn eval_node_status(
        &self,
        assertion: &Assertion,
        node: &str,
        expected: NodeStatus,
    ) -> AssertionResult {
        let message = format!("node '{}' should be {}", node, expected);
        match self.result.statuses.get(node) {
            Some(actual) if *actual == expected => AssertionResult::pass(assertion, message),
            Some(actual) => AssertionResult::fail(assertion, message, format!("actual: {}", actual)),
            None => AssertionResult::fail(assertion, message, self.unknown_node(node)),
        }
    }

    fn eval_branch(&self, assertion: &Assertion, node: &str, branch: &str) -> AssertionResult {
        let message = format!("node '{}' should take branch '{}'", node, branch);
        match self.result.branch(node) {
            Some(actual) if actual == branch => AssertionResult::pass(assertion, message),
            Some(actual) => AssertionResult::fail(assertion, message, format!("actual: {}", actual)),
            None if self.result.statuses.contains_key(node) => AssertionResult::fail(
                assertion,
                message,
                format!("node '{}' reported no branch", node),
            ),
            None => AssertionResult::fail(assertion, message, self.unknown_node(node)),
        }
    }

    fn eval_failed_at(&self, assertion: &Assertion, node: &str) -> AssertionResult {
        let message = format!("workflow should fail at node '{}'", node);
        match &self.result.error {
            Some(err) if err.node_id() == node => AssertionResult::pass(assertion, message),
            Some(err) => AssertionResult::fail(assertion, message, format!("failed with: {}", err)),
            None => AssertionResult::fail(assertion, message, "workflow succeeded"),
        }
    }

    fn unknown_node(&self, node: &str) -> String {
        let known: Vec<&str> = self.result.statuses.keys().map(String::as_str).collect();
        format!("node '{}' not found. Available: {}", node, known.join(", "))
    }
}
