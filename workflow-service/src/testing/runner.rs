// Test Runner
// Executes workflow tests and collects results

use crate::error::WorkflowError;
use crate::execution::context::VariableStore;
use crate::execution::executor::{serialize_millis, WorkflowExecutor};
use crate::parser::loader::WorkflowParser;
use crate::testing::assertions::{AssertionEvaluator, AssertionResult};
use crate::testing::{TestFileParser, TestParseError, TestSuite, WorkflowTest};

use serde::Serialize;
use std::path::Path;
use std::time::{Duration, Instant};
use thiserror::Error;

// =============================================================================
// Test Result Types
// =============================================================================

/// Result of running a single workflow test
#[derive(Debug, Clone, Serialize)]
pub struct TestResult {
    /// Test name
    pub name: String,
    /// Whether all assertions passed
    pub passed: bool,
    /// Test execution duration
    #[serde(serialize_with = "serialize_millis")]
    pub duration: Duration,
    /// Individual assertion results
    pub assertions: Vec<AssertionResult>,
    /// Summary failure message (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_message: Option<String>,
    /// The workflow file that was tested
    pub workflow_path: String,
}

/// Result of running a test suite
#[derive(Debug, Clone, Serialize)]
pub struct TestSuiteResult {
    /// Suite name
    pub suite_name: String,
    /// Individual test results
    pub results: Vec<TestResult>,
    /// Number of selected tests
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Selected tests not run because of fail-fast
    pub skipped: usize,
    #[serde(serialize_with = "serialize_millis")]
    pub duration: Duration,
}

impl TestSuiteResult {
    /// Whether all tests passed
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Errors that stop a suite from running at all
#[derive(Debug, Error)]
pub enum TestError {
    #[error("failed to load test file: {0}")]
    Suite(#[from] TestParseError),

    #[error("workflow file not found: {0}")]
    WorkflowNotFound(String),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

// =============================================================================
// Test Runner
// =============================================================================

/// Configuration for the test runner
#[derive(Debug, Clone, Default)]
pub struct TestRunnerConfig {
    /// Optional filter pattern for test names
    pub filter: Option<String>,
    /// Stop after the first failing test
    pub fail_fast: bool,
}

/// Executes workflow tests
#[derive(Debug, Default)]
pub struct TestRunner {
    config: TestRunnerConfig,
}

impl TestRunner {
    /// Create a new test runner with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new test runner with the given configuration
    pub fn with_config(config: TestRunnerConfig) -> Self {
        Self { config }
    }

    /// Set the test name filter
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.config.filter = Some(filter.into());
        self
    }

    /// Set fail-fast mode
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.config.fail_fast = fail_fast;
        self
    }

    /// Run a single test of `suite`
    pub async fn run_test(&self, suite: &TestSuite, test: &WorkflowTest) -> TestResult {
        let start = Instant::now();
        let workflow_path = test
            .workflow
            .as_ref()
            .or(suite.workflow.as_ref())
            .cloned()
            .unwrap_or_default();

        let executor = match load_executor(&workflow_path) {
            Ok(executor) => executor,
            Err(e) => {
                return TestResult {
                    name: test.name.clone(),
                    passed: false,
                    duration: start.elapsed(),
                    assertions: vec![],
                    failure_message: Some(e.to_string()),
                    workflow_path: workflow_path.display().to_string(),
                };
            }
        };

        let mut seed = VariableStore::from_map(suite.variables.clone());
        for (name, value) in &test.variables {
            seed.set(name.clone(), value.clone());
        }

        tracing::debug!(test = %test.name, workflow = %workflow_path.display(), "running workflow test");
        let exec_result = executor.execute(test.input.clone(), seed).await;

        let assertions = test.expect.to_assertions();
        let assertion_results = AssertionEvaluator::new(&exec_result).evaluate_all(&assertions);

        let failed_count = assertion_results.iter().filter(|r| !r.passed).count();
        let failure_message = if failed_count > 0 {
            Some(format!(
                "{} of {} assertions failed",
                failed_count,
                assertion_results.len()
            ))
        } else {
            None
        };

        TestResult {
            name: test.name.clone(),
            passed: failed_count == 0,
            duration: start.elapsed(),
            assertions: assertion_results,
            failure_message,
            workflow_path: workflow_path.display().to_string(),
        }
    }

    /// Run a test suite
    pub async fn run_suite(&self, suite: &TestSuite) -> TestSuiteResult {
        let start = Instant::now();
        let suite_name = suite
            .name
            .clone()
            .unwrap_or_else(|| "Workflow Tests".to_string());

        let tests = self.select_tests(suite);
        let mut results = Vec::with_capacity(tests.len());

        for test in &tests {
            let result = self.run_test(suite, test).await;
            let failed = !result.passed;
            results.push(result);

            if self.config.fail_fast && failed {
                break;
            }
        }

        let total = tests.len();
        let passed = results.iter().filter(|r| r.passed).count();
        let failed = results.len() - passed;

        TestSuiteResult {
            suite_name,
            total,
            passed,
            failed,
            skipped: total - results.len(),
            results,
            duration: start.elapsed(),
        }
    }

    /// Run a test suite from a file
    pub async fn run_file(&self, path: &Path) -> Result<TestSuiteResult, TestError> {
        let suite = TestFileParser::parse_file(path)?;
        Ok(self.run_suite(&suite).await)
    }

    fn select_tests<'s>(&self, suite: &'s TestSuite) -> Vec<&'s WorkflowTest> {
        suite
            .tests
            .iter()
            .filter(|t| match &self.config.filter {
                Some(filter) => matches_filter(&t.name, filter),
                None => true,
            })
            .collect()
    }
}

fn load_executor(path: &Path) -> Result<WorkflowExecutor, TestError> {
    if !path.exists() {
        return Err(TestError::WorkflowNotFound(path.display().to_string()));
    }

    let workflow = WorkflowParser::parse_file(path).map_err(WorkflowError::from)?;
    Ok(WorkflowExecutor::from_workflow(&workflow)?)
}

/// Case-insensitive name filter. `*` matches any run of characters; a filter
/// without `*` matches as a substring.
pub fn matches_filter(name: &str, filter: &str) -> bool {
    if filter.is_empty() {
        return true;
    }

    let name = name.to_lowercase();
    let filter = filter.to_lowercase();

    if !filter.contains('*') {
        return name.contains(&filter);
    }

    let parts: Vec<&str> = filter.split('*').collect();
    let (first, rest) = match parts.split_first() {
        Some(split) => split,
        None => return true,
    };
    let Some(mut remaining) = name.strip_prefix(first) else {
        return false;
    };

    let (last, middle) = match rest.split_last() {
        Some(split) => split,
        None => return true,
    };

    for part in middle {
        match remaining.find(part) {
            Some(pos) => remaining = &remaining[pos + part.len()..],
            None => return false,
        }
    }

    remaining.ends_with(last)
}
