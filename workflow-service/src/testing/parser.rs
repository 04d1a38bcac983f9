// Test File Parser
// Loads and checks workflow test suite files

use crate::testing::TestSuite;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Parser for workflow test suite files
pub struct TestFileParser;

/// Errors that can occur during test file parsing
#[derive(Debug, Error)]
pub enum TestParseError {
    #[error("test file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("IO error reading test file: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error in test file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("test file validation error: {0}")]
    Validation(String),
}

impl TestFileParser {
    /// Parse a test suite from a YAML string
    pub fn parse(content: &str) -> Result<TestSuite, TestParseError> {
        let suite: TestSuite = serde_yaml::from_str(content)?;
        Self::validate(&suite)?;
        Ok(suite)
    }

    /// Parse a test suite from a file, resolving workflow paths against its directory
    pub fn parse_file(path: &Path) -> Result<TestSuite, TestParseError> {
        if !path.exists() {
            return Err(TestParseError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let mut suite = Self::parse(&content)?;

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base_dir.join(&*p);
            }
        };

        if let Some(workflow) = suite.workflow.as_mut() {
            resolve(workflow);
        }
        for test in &mut suite.tests {
            if let Some(workflow) = test.workflow.as_mut() {
                resolve(workflow);
            }
        }

        Ok(suite)
    }

    fn validate(suite: &TestSuite) -> Result<(), TestParseError> {
        if suite.tests.is_empty() {
            return Err(TestParseError::Validation(
                "test suite must contain at least one test".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for (i, test) in suite.tests.iter().enumerate() {
            if test.name.trim().is_empty() {
                return Err(TestParseError::Validation(format!(
                    "test at index {} must have a non-empty name",
                    i
                )));
            }

            if test.workflow.is_none() && suite.workflow.is_none() {
                return Err(TestParseError::Validation(format!(
                    "test '{}' has no workflow and the suite sets no default",
                    test.name
                )));
            }

            if !names.insert(test.name.as_str()) {
                return Err(TestParseError::Validation(format!(
                    "duplicate test name: '{}'",
                    test.name
                )));
            }
        }

        Ok(())
    }
}
