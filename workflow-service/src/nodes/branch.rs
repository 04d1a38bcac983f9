// Branch Node
// if_else: selects a branch label from the primary condition and else-if chain

use crate::execution::context::VariableStore;
use crate::expression::{
    check_type, compare, resolve_path, resolve_present, ExpressionContext, ExpressionEngine,
};
use crate::parser::models::Node;

use serde_json::{json, Value};

/// Evaluate the branch conditions. Expression failures count as "not met"
/// and are noted in `warnings`.
pub fn if_else(
    node: &Node,
    input: &Value,
    variables: &VariableStore,
    warnings: &mut Vec<String>,
) -> Value {
    let engine = ExpressionEngine::new(ExpressionContext::new(input, variables.as_map()));

    let (condition_met, branch) = if primary_condition(node, input, &engine, warnings) {
        (true, "if".to_string())
    } else {
        match else_if_branch(node, &engine, warnings) {
            Some(index) => (true, format!("else_if_{}", index)),
            None => (false, "else".to_string()),
        }
    };

    tracing::debug!(node_id = %node.id, branch = %branch, "branch selected");

    json!({
        "conditionMet": condition_met,
        "branch": branch,
        "input": input,
    })
}

fn primary_condition(
    node: &Node,
    input: &Value,
    engine: &ExpressionEngine<'_>,
    warnings: &mut Vec<String>,
) -> bool {
    let path = |key: &str| node.config_str(key).unwrap_or("");

    match node.config_str("condition_type") {
        Some("expression") => node
            .config_str("if_condition")
            .or_else(|| node.config_str("expression"))
            .map(|expr| engine.evaluate_condition(expr, warnings))
            .unwrap_or(false),
        Some("compare") => {
            let left = resolve_path(input, path("left_value"));
            let right = node
                .config_value("right_value")
                .cloned()
                .unwrap_or(Value::Null);
            let operator = node.config_str("operator").unwrap_or("equals");
            compare(left, &right, operator)
        }
        Some("exists") => resolve_present(input, path("check_path")).is_some(),
        Some("type") => {
            let expected = node.config_str("expected_type").unwrap_or("string");
            resolve_path(input, path("check_field"))
                .map(|value| check_type(value, expected))
                .unwrap_or(false)
        }
        _ => false,
    }
}

fn else_if_branch(
    node: &Node,
    engine: &ExpressionEngine<'_>,
    warnings: &mut Vec<String>,
) -> Option<usize> {
    let conditions = node.config_value("else_if_conditions")?.as_array()?;

    conditions.iter().position(|entry| {
        entry
            .get("condition")
            .and_then(Value::as_str)
            .map(|expr| engine.evaluate_condition(expr, warnings))
            .unwrap_or(false)
    })
}
