use crate::commands::load_workflow;
use crate::output;

use std::path::PathBuf;

use clap::Args;
use color_eyre::Result;

use workflow_service::{ExecutionGraph, WorkflowValidator};

/// Print the order a preview session would run nodes in
#[derive(Args, Debug)]
pub struct OrderArgs {
    /// Path to the workflow file (JSON or YAML)
    pub workflow: PathBuf,

    /// Only show the nodes needed to run this node
    #[arg(long, value_name = "NODE")]
    pub until: Option<String>,
}

pub fn execute(args: OrderArgs) -> Result<()> {
    let workflow = load_workflow(&args.workflow)?;

    let validation = WorkflowValidator::validate(&workflow);
    for error in &validation.errors {
        output::warning(&error.message);
    }

    let graph = ExecutionGraph::new(&workflow);
    let order = match &args.until {
        Some(target) => graph.order_until(target)?,
        None => graph.execution_order()?,
    };

    for (i, node_id) in order.iter().enumerate() {
        let label = workflow
            .node(node_id)
            .map(|n| format!("{} ({})", n.display_name(), n.kind))
            .unwrap_or_default();
        println!("{:>3}. {:<20} {}", i + 1, node_id, label);
    }

    Ok(())
}
