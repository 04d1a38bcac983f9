// Testing Framework Module
// Declarative workflow test suites: definitions, execution, assertions, and reporting

pub mod assertions;
pub mod parser;
pub mod reporter;
pub mod runner;

// Re-export key types
pub use assertions::{Assertion, AssertionEvaluator, AssertionResult};
pub use parser::{TestFileParser, TestParseError};
pub use reporter::{ReportFormat, TestReporter};
pub use runner::{TestError, TestResult, TestRunner, TestRunnerConfig, TestSuiteResult};

use crate::execution::context::NodeStatus;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

// =============================================================================
// Test Definition Models
// =============================================================================

/// A test suite loaded from a YAML file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuite {
    /// Optional suite name
    #[serde(default)]
    pub name: Option<String>,
    /// Workflow used by tests that do not name their own
    #[serde(default)]
    pub workflow: Option<PathBuf>,
    /// Seed variables applied to every test
    #[serde(default)]
    pub variables: Map<String, Value>,
    /// Test definitions
    pub tests: Vec<WorkflowTest>,
}

/// A single workflow test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowTest {
    /// Test name (used in reporting)
    pub name: String,
    /// Workflow file, overriding the suite default
    #[serde(default)]
    pub workflow: Option<PathBuf>,
    /// Session input
    #[serde(default)]
    pub input: Value,
    /// Seed variables for this test, on top of the suite's
    #[serde(default)]
    pub variables: Map<String, Value>,
    /// What the run must produce
    #[serde(default)]
    pub expect: Expectations,
}

/// Expected outcome of a test run. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Expectations {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub final_output: Option<Value>,
    /// Text that must appear in the rendered final output
    #[serde(default)]
    pub output_contains: Option<String>,
    #[serde(default)]
    pub variables: BTreeMap<String, Value>,
    #[serde(default)]
    pub node_status: BTreeMap<String, NodeStatus>,
    /// Branch label per if_else node id
    #[serde(default)]
    pub branch: BTreeMap<String, String>,
    /// Node the session must fail at
    #[serde(default)]
    pub error_node: Option<String>,
}

impl Expectations {
    /// Convert the expectations into evaluable assertions
    pub fn to_assertions(&self) -> Vec<Assertion> {
        let mut assertions = Vec::new();

        match self.success {
            Some(true) => assertions.push(Assertion::WorkflowSucceeded),
            Some(false) => assertions.push(Assertion::WorkflowFailed),
            None => {}
        }

        if let Some(expected) = &self.final_output {
            assertions.push(Assertion::FinalOutputEquals {
                expected: expected.clone(),
            });
        }

        if let Some(pattern) = &self.output_contains {
            assertions.push(Assertion::OutputContains {
                pattern: pattern.clone(),
            });
        }

        for (name, expected) in &self.variables {
            assertions.push(Assertion::VariableEquals {
                name: name.clone(),
                expected: expected.clone(),
            });
        }

        for (node, expected) in &self.node_status {
            assertions.push(Assertion::NodeStatusIs {
                node: node.clone(),
                expected: *expected,
            });
        }

        for (node, branch) in &self.branch {
            assertions.push(Assertion::BranchTaken {
                node: node.clone(),
                branch: branch.clone(),
            });
        }

        if let Some(node) = &self.error_node {
            assertions.push(Assertion::FailedAt { node: node.clone() });
        }

        assertions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_suite_deserialize() {
        let yaml = r#"
name: Scoring
workflow: scoring.json
variables:
  threshold: 80
tests:
  - name: high score takes the if branch
    input:
      score: 85
    expect:
      success: true
      branch:
        check: if
      node_status:
        check: success
  - name: broken lambda
    workflow: broken.yaml
    expect:
      success: false
      error_node: code
"#;
        let suite: TestSuite = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(suite.name.as_deref(), Some("Scoring"));
        assert_eq!(suite.workflow, Some(PathBuf::from("scoring.json")));
        assert_eq!(suite.variables["threshold"], json!(80));
        assert_eq!(suite.tests.len(), 2);
        assert_eq!(suite.tests[0].input, json!({"score": 85}));
        assert_eq!(
            suite.tests[0].expect.node_status.get("check"),
            Some(&NodeStatus::Success)
        );
        assert_eq!(suite.tests[1].input, Value::Null);
        assert_eq!(suite.tests[1].workflow, Some(PathBuf::from("broken.yaml")));
    }

    #[test]
    fn test_expectations_to_assertions() {
        let expect = Expectations {
            success: Some(true),
            final_output: Some(json!([2, 4])),
            variables: BTreeMap::from([("total".to_string(), json!(6))]),
            branch: BTreeMap::from([("check".to_string(), "else".to_string())]),
            ..Default::default()
        };

        let assertions = expect.to_assertions();
        assert_eq!(assertions.len(), 4);
        assert!(matches!(assertions[0], Assertion::WorkflowSucceeded));
        assert!(matches!(
            &assertions[3],
            Assertion::BranchTaken { node, branch } if node == "check" && branch == "else"
        ));
    }

    #[test]
    fn test_empty_expectations() {
        assert!(Expectations::default().to_assertions().is_empty());
    }
}
