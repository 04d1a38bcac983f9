// Node Handlers
// Maps a node's declared kind to the handler that executes it

pub mod branch;
pub mod code;
pub mod collect;
pub mod template;
pub mod variables;

use crate::error::{HandlerError, NodeExecutionError};
use crate::execution::context::VariableStore;
use crate::parser::models::{Node, NodeKind};

use serde_json::{json, Value};

/// Execute one node against its input.
///
/// `prior_results` holds the results of every node that already ran in this
/// session, in production order. Only `merge` reads it. Problems that do not
/// fail the node, such as a simulated stub or a swallowed expression error,
/// are pushed onto `warnings`.
pub fn execute(
    node: &Node,
    input: &Value,
    variables: &mut VariableStore,
    prior_results: &[Value],
    warnings: &mut Vec<String>,
) -> Result<Value, NodeExecutionError> {
    dispatch(node, input, variables, prior_results, warnings).map_err(|cause| {
        NodeExecutionError {
            node_id: node.id.clone(),
            label: node.display_name().to_string(),
            cause,
        }
    })
}

fn dispatch(
    node: &Node,
    input: &Value,
    variables: &mut VariableStore,
    prior_results: &[Value],
    warnings: &mut Vec<String>,
) -> Result<Value, HandlerError> {
    match &node.kind {
        NodeKind::SetVariable => variables::set_variable(node, input, variables, warnings),
        NodeKind::GetVariable => variables::get_variable(node, variables),
        NodeKind::IfElse => Ok(branch::if_else(node, input, variables, warnings)),
        NodeKind::Lambda => code::lambda(node, input, variables),
        NodeKind::Transform => code::transform(node, input, variables),
        NodeKind::Filter => code::filter(node, input, variables),
        NodeKind::Merge => Ok(collect::merge(node, input, prior_results)),
        NodeKind::Template => template::render(node, input, variables),
        NodeKind::Unsupported(name) => {
            warnings.push(simulation_notice(&node.kind));
            Ok(simulated(name, input))
        }
    }
}

/// Warning attached to a node that ran as a simulated stub
pub fn simulation_notice(kind: &NodeKind) -> String {
    if kind.is_integration() {
        format!("\"{}\" is an external integration; output is simulated", kind)
    } else {
        format!("unknown node kind \"{}\"; output is simulated", kind)
    }
}

/// Pass-through result for kinds with no executable handler
fn simulated(kind: &str, input: &Value) -> Value {
    tracing::warn!(kind = %kind, "node kind has no handler, returning simulated output");

    json!({
        "nodeType": kind,
        "input": input,
        "output": format!("{} node output (simulated)", kind),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })
}
