use crate::commands::load_workflow;
use crate::output;

use std::path::PathBuf;

use clap::Args;
use color_eyre::Result;

use workflow_service::{execution_order, WorkflowValidator};

/// Validate a workflow graph file
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the workflow file (JSON or YAML)
    pub workflow: PathBuf,
}

pub fn execute(args: ValidateArgs) -> Result<()> {
    let workflow_path = &args.workflow;

    // Step 1: Parse document
    output::status("Validating", &format!("{}", workflow_path.display()));
    let workflow = load_workflow(workflow_path)?;
    output::check("Document syntax valid");

    let summary = workflow.summary();
    output::check(&format!(
        "Structure: {} nodes, {} edges",
        summary.total_nodes, summary.total_edges
    ));

    // Step 2: Structural validation
    let result = WorkflowValidator::validate(&workflow);
    if !result.valid {
        output::error(&format!("{} validation error(s):", result.errors.len()));
        for error in &result.errors {
            output::error(&format!("  - [{}] {}", error.path, error.message));
            if let Some(suggestion) = &error.suggestion {
                output::info(&format!("    Suggestion: {}", suggestion));
            }
        }
        std::process::exit(1);
    }
    output::check("Structural validation passed");

    // Step 3: Execution order
    match execution_order(&workflow) {
        Ok(order) => output::check(&format!("Execution order resolved ({} nodes)", order.len())),
        Err(e) => {
            output::error(&e.to_string());
            std::process::exit(1);
        }
    }

    let stubs: Vec<&str> = workflow
        .nodes
        .iter()
        .filter(|n| !n.kind.is_executable())
        .map(|n| n.id.as_str())
        .collect();
    if !stubs.is_empty() {
        output::warning(&format!(
            "{} node(s) will run as simulated stubs: {}",
            stubs.len(),
            stubs.join(", ")
        ));
    }

    println!();
    output::success("Workflow is valid");

    Ok(())
}
