// Test Reporter
// Renders suite results for the terminal or as JSON

use crate::testing::runner::TestSuiteResult;

use std::fmt;

/// Output format for test reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// Human-readable terminal output
    #[default]
    Terminal,
    /// Machine-readable JSON document
    Json,
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFormat::Terminal => write!(f, "terminal"),
            ReportFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "terminal" | "text" | "console" => Ok(ReportFormat::Terminal),
            "json" => Ok(ReportFormat::Json),
            _ => Err(format!(
                "unknown report format '{}'. Valid formats: terminal, json",
                s
            )),
        }
    }
}

/// Test reporter that generates output in various formats
pub struct TestReporter;

impl TestReporter {
    /// Generate a report in the specified format
    pub fn report(results: &TestSuiteResult, format: ReportFormat) -> serde_json::Result<String> {
        match format {
            ReportFormat::Terminal => Ok(Self::to_terminal(results)),
            ReportFormat::Json => Self::to_json(results),
        }
    }

    pub fn to_json(results: &TestSuiteResult) -> serde_json::Result<String> {
        serde_json::to_string_pretty(results)
    }

    /// Generate human-readable terminal output
    pub fn to_terminal(results: &TestSuiteResult) -> String {
        let mut out = String::new();

        out.push_str(&format!("\nTest Suite: {}\n", results.suite_name));
        out.push_str(&"=".repeat(60));
        out.push('\n');

        for test in &results.results {
            let (symbol, status) = if test.passed {
                ("+", "PASS")
            } else {
                ("x", "FAIL")
            };

            out.push_str(&format!(
                "  [{}] {} ({}ms) {}\n",
                symbol,
                status,
                test.duration.as_millis(),
                test.name,
            ));

            if test.passed {
                continue;
            }

            if test.assertions.is_empty() {
                if let Some(msg) = &test.failure_message {
                    out.push_str(&format!("       {}\n", msg));
                }
            }

            for assertion in test.assertions.iter().filter(|a| !a.passed) {
                out.push_str(&format!("       FAIL: {}\n", assertion.message));
                if let Some(detail) = &assertion.failure_detail {
                    out.push_str(&format!("             {}\n", detail));
                }
            }
        }

        out.push_str(&"-".repeat(60));
        out.push('\n');

        if results.failed == 0 {
            out.push_str(&format!(
                "  All {} tests passed ({}ms)\n",
                results.total,
                results.duration.as_millis()
            ));
        } else {
            out.push_str(&format!(
                "  {} of {} tests failed ({}ms)\n",
                results.failed,
                results.total,
                results.duration.as_millis()
            ));
        }

        if results.skipped > 0 {
            out.push_str(&format!("  {} tests skipped\n", results.skipped));
        }

        out.push('\n');
        out
    }
}
