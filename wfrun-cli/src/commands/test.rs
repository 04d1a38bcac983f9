use crate::output;

use std::path::PathBuf;

use clap::Args;
use color_eyre::eyre::eyre;
use color_eyre::Result;

use workflow_service::{ReportFormat, TestReporter, TestRunner, TestSuiteResult};

/// Run workflow test suites
#[derive(Args, Debug)]
pub struct TestArgs {
    /// Test suite files (YAML)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Only run tests whose name matches (supports * wildcards)
    #[arg(long, short = 'f', value_name = "PATTERN")]
    pub filter: Option<String>,

    /// Report format: terminal, json
    #[arg(long, default_value = "terminal")]
    pub format: String,

    /// Stop at the first failing test
    #[arg(long)]
    pub fail_fast: bool,
}

/// Counts across every suite file
#[derive(Debug, Default)]
struct Totals {
    passed: usize,
    failed: usize,
    skipped: usize,
    broken_files: usize,
}

impl Totals {
    fn add(&mut self, suite: &TestSuiteResult) {
        self.passed += suite.passed;
        self.failed += suite.failed;
        self.skipped += suite.skipped;
    }

    fn ok(&self) -> bool {
        self.failed == 0 && self.broken_files == 0
    }
}

pub async fn execute(args: TestArgs) -> Result<()> {
    let format: ReportFormat = args.format.parse().map_err(|e: String| eyre!(e))?;

    let mut runner = TestRunner::new().with_fail_fast(args.fail_fast);
    if let Some(filter) = &args.filter {
        runner = runner.with_filter(filter.clone());
    }

    output::status("Testing", &format!("{} suite file(s)", args.files.len()));

    let mut totals = Totals::default();
    for file in &args.files {
        output::dim(&format!("  {}", file.display()));

        match runner.run_file(file).await {
            Ok(suite) => {
                totals.add(&suite);
                println!("{}", TestReporter::report(&suite, format)?);
            }
            Err(e) => {
                totals.broken_files += 1;
                output::error(&format!("{}: {}", file.display(), e));
            }
        }

        if args.fail_fast && !totals.ok() {
            break;
        }
    }

    let total = totals.passed + totals.failed + totals.skipped;
    if totals.ok() {
        output::success(&format!(
            "{} passed, {} skipped ({} total)",
            totals.passed, totals.skipped, total
        ));
        return Ok(());
    }

    output::failure(&format!(
        "{} failed, {} passed, {} skipped ({} total)",
        totals.failed, totals.passed, totals.skipped, total
    ));
    if totals.broken_files > 0 {
        output::failure(&format!("{} suite file(s) could not be run", totals.broken_files));
    }
    std::process::exit(1);
}
