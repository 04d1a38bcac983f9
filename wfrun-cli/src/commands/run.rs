use crate::commands::load_workflow;
use crate::output;

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use color_eyre::eyre::{bail, eyre, WrapErr};
use color_eyre::Result;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use workflow_service::{
    progress_channel, DocumentFormat, ExecutionEvent, ExecutorConfig, LogLevel, NodeStatus,
    VariableStore, WorkflowExecutor,
};

/// Run a preview session over a workflow graph
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the workflow file (JSON or YAML)
    pub workflow: PathBuf,

    /// Session input as JSON (plain text when it is not valid JSON)
    #[arg(long, value_name = "JSON", conflicts_with = "input_file")]
    pub input: Option<String>,

    /// Read the session input from a JSON or YAML file
    #[arg(long, value_name = "PATH")]
    pub input_file: Option<PathBuf>,

    /// Seed a variable (can be repeated, format: name=value)
    #[arg(long = "var", value_name = "NAME=VALUE")]
    pub variables: Vec<String>,

    /// Seed variables from a JSON or YAML mapping
    #[arg(long, value_name = "PATH")]
    pub vars_file: Option<PathBuf>,

    /// Pause between nodes, in milliseconds
    #[arg(long, value_name = "MS")]
    pub delay_ms: Option<u64>,

    /// Print the full execution result as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: RunArgs) -> Result<()> {
    let workflow = load_workflow(&args.workflow)?;

    let input = match (&args.input, &args.input_file) {
        (Some(text), _) => parse_value(text),
        (None, Some(path)) => read_document(path)?,
        (None, None) => Value::Null,
    };
    let seed = seed_variables(&args)?;

    let mut config = ExecutorConfig::default();
    if let Some(ms) = args.delay_ms {
        config = config.with_node_delay(Duration::from_millis(ms));
    }

    let (tx, mut rx) = progress_channel();
    let cancel = CancellationToken::new();

    let executor = WorkflowExecutor::from_workflow(&workflow)?
        .with_config(config)
        .with_progress(tx)
        .with_cancellation(cancel.clone());

    output::status("Running", &format!("{}", args.workflow.display()));

    // Spawn execution in background
    let exec_handle = tokio::spawn(async move { executor.execute(input, seed).await });

    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    // Process events in the foreground
    while let Some(event) = rx.recv().await {
        render_event(&event);
    }

    let result = exec_handle.await?;
    cancel.cancel();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!();
        println!("{}", serde_json::to_string_pretty(&result.final_output)?);
    }

    if !result.success {
        std::process::exit(1);
    }

    Ok(())
}

fn render_event(event: &ExecutionEvent) {
    match event {
        ExecutionEvent::WorkflowStarted { total_nodes, order } => {
            output::header(&format!("Workflow ({} nodes)", total_nodes));
            output::dim(&format!("  order: {}", order.join(" -> ")));
        }

        ExecutionEvent::WorkflowCompleted { success, duration } => {
            if *success {
                output::success(&format!(
                    "Workflow completed successfully in {:.2}s",
                    duration.as_secs_f64()
                ));
            } else {
                output::failure(&format!(
                    "Workflow failed after {:.2}s",
                    duration.as_secs_f64()
                ));
            }
        }

        ExecutionEvent::NodeStarted {
            node_id,
            label,
            kind,
            ..
        } => {
            output::node_header(node_id, label, kind);
        }

        ExecutionEvent::NodeCompleted {
            result, duration, ..
        } => {
            output::dim_success(&format!("      OK ({:.2}s)", duration.as_secs_f64()));
            output::node_result(&result.to_string());
        }

        ExecutionEvent::NodeFailed { message, .. } => {
            output::dim_failure(&format!("      FAIL {}", message));
        }

        ExecutionEvent::NodeStatusChanged { node_id, status } => {
            if *status == NodeStatus::Running {
                tracing::debug!(node_id = %node_id, "node running");
            }
        }

        ExecutionEvent::VariableSet { name, value, .. } => {
            output::dim(&format!("      [var] {} = {}", name, value));
        }

        ExecutionEvent::Log { level, message, .. } => match level {
            LogLevel::Warning => output::warning(message),
            LogLevel::Info => output::info(message),
        },
    }
}

/// Parse a command line value as JSON, falling back to plain text
fn parse_value(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

fn read_document(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;

    let value: Value = match DocumentFormat::from_path(path) {
        DocumentFormat::Yaml => serde_yaml::from_str(&content)
            .wrap_err_with(|| format!("invalid YAML in {}", path.display()))?,
        DocumentFormat::Json => serde_json::from_str(&content)
            .wrap_err_with(|| format!("invalid JSON in {}", path.display()))?,
    };
    Ok(value)
}

fn seed_variables(args: &RunArgs) -> Result<VariableStore> {
    let mut seed = match &args.vars_file {
        Some(path) => match read_document(path)? {
            Value::Object(map) => VariableStore::from_map(map),
            Value::Null => VariableStore::from_map(Map::new()),
            _ => bail!("variables file {} must contain a mapping", path.display()),
        },
        None => VariableStore::new(),
    };

    for var in &args.variables {
        let (name, value) = var
            .split_once('=')
            .ok_or_else(|| eyre!("Invalid variable format '{}'. Expected name=value", var))?;
        if !VariableStore::is_valid_name(name) {
            bail!("Invalid variable name '{}'", name);
        }
        seed.set(name, parse_value(value));
    }

    Ok(seed)
}
