// Variable Nodes
// set_variable and get_variable handlers

use crate::error::HandlerError;
use crate::execution::context::VariableStore;
use crate::expression::{resolve_path, ExpressionContext, ExpressionEngine};
use crate::parser::models::Node;

use serde_json::{json, Map, Value};

/// Write a value into the store, taken from static config, the input or an expression
pub fn set_variable(
    node: &Node,
    input: &Value,
    variables: &mut VariableStore,
    warnings: &mut Vec<String>,
) -> Result<Value, HandlerError> {
    let name = node
        .config_str("variable_name")
        .ok_or_else(|| HandlerError::missing("variable name"))?;

    if !VariableStore::is_valid_name(name) {
        return Err(HandlerError::InvalidVariableName(name.to_string()));
    }

    let value = match node.config_str("value_source") {
        Some("static") => static_value(node.config_value("variable_value")),
        Some("input") => {
            let path = node.config_str("input_path").unwrap_or("");
            resolve_path(input, path).cloned().unwrap_or(Value::Null)
        }
        Some("expression") => match node.config_str("expression") {
            Some(expr) => {
                let engine = ExpressionEngine::new(ExpressionContext::new(input, variables.as_map()));
                engine.evaluate(expr, warnings)
            }
            None => Value::Null,
        },
        _ => Value::Null,
    };

    tracing::debug!(node_id = %node.id, variable = name, "variable set");
    variables.set(name, value.clone());

    Ok(json!({
        "variable": name,
        "value": value,
        "input": input,
    }))
}

/// Static values are JSON text when they parse, plain text otherwise.
/// Empty text is null.
fn static_value(raw: Option<&Value>) -> Value {
    match raw {
        Some(Value::String(text)) if text.is_empty() => Value::Null,
        Some(Value::String(text)) => {
            serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.clone()))
        }
        Some(other) => other.clone(),
        None => Value::Null,
    }
}

/// Read a value from the store into `{ <output_field>: value }`
pub fn get_variable(node: &Node, variables: &VariableStore) -> Result<Value, HandlerError> {
    let name = node
        .config_str("variable_name")
        .ok_or_else(|| HandlerError::missing("variable name"))?;

    let value = match variables.get(name) {
        Some(value) if !value.is_null() => value.clone(),
        _ => node
            .config_value("default_value")
            .cloned()
            .unwrap_or(Value::Null),
    };

    let field = node.config_str("output_field").unwrap_or("value");
    let mut output = Map::new();
    output.insert(field.to_string(), value);
    Ok(Value::Object(output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::models::NodeKind;

    fn setter(source: &str) -> Node {
        Node::new("set", NodeKind::SetVariable)
            .with_config("variable_name", "result")
            .with_config("value_source", source)
    }

    #[test]
    fn test_static_json_value() {
        let node = setter("static").with_config("variable_value", r#"{"x":1}"#);
        let mut vars = VariableStore::new();
        let out = set_variable(&node, &json!("in"), &mut vars, &mut Vec::new()).unwrap();

        assert_eq!(vars.get("result"), Some(&json!({"x": 1})));
        assert_eq!(out, json!({"variable": "result", "value": {"x": 1}, "input": "in"}));
    }

    #[test]
    fn test_static_falls_back_to_text() {
        let node = setter("static").with_config("variable_value", "hello world");
        let mut vars = VariableStore::new();
        set_variable(&node, &json!(null), &mut vars, &mut Vec::new()).unwrap();
        assert_eq!(vars.get("result"), Some(&json!("hello world")));
    }

    #[test]
    fn test_static_empty_text_is_null() {
        let node = setter("static").with_config("variable_value", "");
        let mut vars = VariableStore::new();
        let out = set_variable(&node, &json!(1), &mut vars, &mut Vec::new()).unwrap();
        assert_eq!(vars.get("result"), Some(&Value::Null));
        assert_eq!(out["value"], Value::Null);
    }

    #[test]
    fn test_static_non_text_config_used_as_is() {
        let node = setter("static").with_config("variable_value", json!([1, 2]));
        let mut vars = VariableStore::new();
        set_variable(&node, &json!(null), &mut vars, &mut Vec::new()).unwrap();
        assert_eq!(vars.get("result"), Some(&json!([1, 2])));
    }

    #[test]
    fn test_input_path_source() {
        let node = setter("input").with_config("input_path", "user.name");
        let mut vars = VariableStore::new();
        set_variable(&node, &json!({"user": {"name": "Ada"}}), &mut vars, &mut Vec::new()).unwrap();
        assert_eq!(vars.get("result"), Some(&json!("Ada")));
    }

    #[test]
    fn test_input_missing_path_is_null() {
        let node = setter("input").with_config("input_path", "user.age");
        let mut vars = VariableStore::new();
        set_variable(&node, &json!({"user": {}}), &mut vars, &mut Vec::new()).unwrap();
        assert_eq!(vars.get("result"), Some(&Value::Null));
    }

    #[test]
    fn test_expression_source_reads_variables() {
        let node = setter("expression").with_config("expression", "input.price * $qty");
        let mut vars: VariableStore = vec![("qty", json!(3))].into_iter().collect();
        set_variable(&node, &json!({"price": 5}), &mut vars, &mut Vec::new()).unwrap();
        assert_eq!(vars.get("result"), Some(&json!(15)));
    }

    #[test]
    fn test_failed_expression_is_false_and_noted() {
        let node = setter("expression").with_config("expression", "input.a.b");
        let mut vars = VariableStore::new();
        let mut warnings = Vec::new();
        set_variable(&node, &json!({}), &mut vars, &mut warnings).unwrap();
        assert_eq!(vars.get("result"), Some(&json!(false)));
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_unknown_source_is_null() {
        let node = Node::new("set", NodeKind::SetVariable).with_config("variable_name", "x");
        let mut vars = VariableStore::new();
        set_variable(&node, &json!(1), &mut vars, &mut Vec::new()).unwrap();
        assert_eq!(vars.get("x"), Some(&Value::Null));
    }

    #[test]
    fn test_missing_and_invalid_names() {
        let mut vars = VariableStore::new();

        let node = Node::new("set", NodeKind::SetVariable);
        assert_eq!(
            set_variable(&node, &json!(null), &mut vars, &mut Vec::new()).unwrap_err().to_string(),
            "variable name not set"
        );

        let node = Node::new("set", NodeKind::SetVariable).with_config("variable_name", "9lives");
        assert_eq!(
            set_variable(&node, &json!(null), &mut vars, &mut Vec::new()).unwrap_err(),
            HandlerError::InvalidVariableName("9lives".to_string())
        );
        assert!(vars.is_empty());
    }

    #[test]
    fn test_set_then_get_roundtrip() {
        let mut vars = VariableStore::new();
        let set = setter("static").with_config("variable_value", r#"{"x":1}"#);
        set_variable(&set, &json!(null), &mut vars, &mut Vec::new()).unwrap();

        let get = Node::new("get", NodeKind::GetVariable).with_config("variable_name", "result");
        assert_eq!(get_variable(&get, &vars).unwrap(), json!({"value": {"x": 1}}));
    }

    #[test]
    fn test_get_default_and_output_field() {
        let mut vars = VariableStore::new();
        vars.set("empty", Value::Null);

        let get = Node::new("get", NodeKind::GetVariable)
            .with_config("variable_name", "empty")
            .with_config("default_value", "fallback")
            .with_config("output_field", "greeting");
        assert_eq!(get_variable(&get, &vars).unwrap(), json!({"greeting": "fallback"}));

        let get = Node::new("get", NodeKind::GetVariable).with_config("variable_name", "absent");
        assert_eq!(get_variable(&get, &vars).unwrap(), json!({"value": null}));
    }

    #[test]
    fn test_get_requires_name() {
        let get = Node::new("get", NodeKind::GetVariable);
        assert_eq!(
            get_variable(&get, &VariableStore::new()).unwrap_err(),
            HandlerError::missing("variable name")
        );
    }
}
