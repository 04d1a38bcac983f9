use crate::commands::load_workflow;

use std::path::PathBuf;

use clap::Args;
use color_eyre::Result;

/// Show node and edge counts for a workflow
#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Path to the workflow file (JSON or YAML)
    pub workflow: PathBuf,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: SummaryArgs) -> Result<()> {
    let summary = load_workflow(&args.workflow)?.summary();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Nodes: {}", summary.total_nodes);
    println!("Edges: {}", summary.total_edges);
    for (kind, count) in &summary.node_type_count {
        println!("  {:<16} {}", kind, count);
    }

    Ok(())
}
