// Code Nodes
// lambda, transform and filter handlers running user-authored scripts

use crate::error::HandlerError;
use crate::execution::context::VariableStore;
use crate::expression::{is_truthy, ExpressionContext, Script};
use crate::parser::models::Node;

use serde_json::{json, Value};

/// Entry point a lambda script may declare
const LAMBDA_ENTRY: &str = "process";

/// Run the lambda script and call its `process(input)` function
pub fn lambda(node: &Node, input: &Value, variables: &VariableStore) -> Result<Value, HandlerError> {
    let code = node
        .config_str("code")
        .ok_or_else(|| HandlerError::missing("lambda code"))?;

    let context = ExpressionContext::new(input, variables.as_map());
    Script::parse(code)
        .and_then(|script| script.run_entry(context, LAMBDA_ENTRY))
        .map_err(|e| HandlerError::Script(e.message))
}

/// Apply the transform function element-wise with map, filter or reduce
pub fn transform(
    node: &Node,
    input: &Value,
    variables: &VariableStore,
) -> Result<Value, HandlerError> {
    let source = node
        .config_str("transform_function")
        .ok_or_else(|| HandlerError::missing("transform function"))?;
    let script = Script::parse(source).map_err(|e| HandlerError::Transform(e.message))?;
    let context = ExpressionContext::new(input, variables.as_map());

    let call = |bindings: &[(&str, Value)]| {
        script
            .run(context, bindings)
            .map_err(|e| HandlerError::Transform(e.message))
    };

    let items = match input {
        Value::Array(items) => items,
        other => return call(&[("item", other.clone()), ("index", json!(0))]),
    };

    match node.config_str("transform_type").unwrap_or("map") {
        "map" => items
            .iter()
            .enumerate()
            .map(|(i, item)| call(&[("item", item.clone()), ("index", json!(i))]))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        "filter" => {
            let mut kept = Vec::new();
            for (i, item) in items.iter().enumerate() {
                if is_truthy(&call(&[("item", item.clone()), ("index", json!(i))])?) {
                    kept.push(item.clone());
                }
            }
            Ok(Value::Array(kept))
        }
        "reduce" => {
            let mut iter = items.iter().enumerate();
            let mut acc = match iter.next() {
                Some((_, first)) => first.clone(),
                None => {
                    return Err(HandlerError::Transform(
                        "reduce of empty array with no initial value".to_string(),
                    ))
                }
            };
            for (i, item) in iter {
                acc = call(&[("acc", acc), ("item", item.clone()), ("index", json!(i))])?;
            }
            Ok(acc)
        }
        _ => Ok(input.clone()),
    }
}

/// Keep the elements for which the filter condition is truthy
pub fn filter(node: &Node, input: &Value, variables: &VariableStore) -> Result<Value, HandlerError> {
    let condition = node
        .config_str("filter_condition")
        .ok_or_else(|| HandlerError::missing("filter condition"))?;
    let script = Script::parse(condition).map_err(|e| HandlerError::Filter(e.message))?;
    let context = ExpressionContext::new(input, variables.as_map());

    let holds = |item: &Value, index: usize| {
        script
            .run(context, &[("item", item.clone()), ("index", json!(index))])
            .map(|v| is_truthy(&v))
            .map_err(|e| HandlerError::Filter(e.message))
    };

    match input {
        Value::Array(items) => {
            let mut kept = Vec::new();
            for (i, item) in items.iter().enumerate() {
                if holds(item, i)? {
                    kept.push(item.clone());
                }
            }
            Ok(Value::Array(kept))
        }
        other => Ok(if holds(other, 0)? {
            other.clone()
        } else {
            Value::Null
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::models::NodeKind;

    fn run_lambda(code: &str, input: Value) -> Result<Value, HandlerError> {
        let node = Node::new("l", NodeKind::Lambda).with_config("code", code);
        lambda(&node, &input, &VariableStore::new())
    }

    fn run_transform(kind: &str, body: &str, input: Value) -> Result<Value, HandlerError> {
        let node = Node::new("t", NodeKind::Transform)
            .with_config("transform_type", kind)
            .with_config("transform_function", body);
        transform(&node, &input, &VariableStore::new())
    }

    fn run_filter(condition: &str, input: Value) -> Result<Value, HandlerError> {
        let node = Node::new("f", NodeKind::Filter).with_config("filter_condition", condition);
        filter(&node, &input, &VariableStore::new())
    }

    #[test]
    fn test_lambda_function_declaration() {
        let code = r#"
            function process(data) {
                return { total: data.items.reduce((a, b) => a + b, 0), count: data.items.length };
            }
        "#;
        assert_eq!(
            run_lambda(code, json!({"items": [1, 2, 3]})).unwrap(),
            json!({"total": 6, "count": 3})
        );
    }

    #[test]
    fn test_lambda_for_of_loop() {
        let code = "function process(input) { let total = 0; for (const x of input) { total += x; } return total; }";
        assert_eq!(run_lambda(code, json!([1, 2, 3])).unwrap(), json!(6));
    }

    #[test]
    fn test_lambda_runaway_loop_fails() {
        let err = run_lambda("while (true) {}", json!(null)).unwrap_err();
        assert!(matches!(err, HandlerError::Script(_)));
    }

    #[test]
    fn test_lambda_forbidden_code_fails() {
        let err = run_lambda("function process(x) { return eval('x') }", json!(1)).unwrap_err();
        assert!(err.to_string().contains("forbidden code"));
    }

    #[test]
    fn test_lambda_arrow_entry() {
        let code = "const process = (x) => x.name.toUpperCase()";
        assert_eq!(run_lambda(code, json!({"name": "ada"})).unwrap(), json!("ADA"));
    }

    #[test]
    fn test_lambda_reads_variables() {
        let node = Node::new("l", NodeKind::Lambda)
            .with_config("code", "function process(x) { return x * variables.factor + $offset }");
        let vars: VariableStore = vec![("factor", json!(10)), ("offset", json!(2))]
            .into_iter()
            .collect();
        assert_eq!(lambda(&node, &json!(4), &vars).unwrap(), json!(42));
    }

    #[test]
    fn test_lambda_top_level_return() {
        assert_eq!(run_lambda("return input.a", json!({"a": 7})).unwrap(), json!(7));
    }

    #[test]
    fn test_lambda_without_process_passes_through() {
        assert_eq!(
            run_lambda("let unused = 1", json!({"keep": true})).unwrap(),
            json!({"keep": true})
        );
    }

    #[test]
    fn test_lambda_errors() {
        assert_eq!(
            run_lambda("", json!(null)).unwrap_err(),
            HandlerError::missing("lambda code")
        );

        let err = run_lambda("function process(x) { return missing + 1 }", json!(1)).unwrap_err();
        assert!(matches!(err, HandlerError::Script(_)));
        assert!(err.to_string().starts_with("code execution error: "));
        assert!(err.to_string().contains("missing is not defined"));
    }

    #[test]
    fn test_transform_map() {
        assert_eq!(
            run_transform("map", "return item * 2", json!([1, 2, 3])).unwrap(),
            json!([2, 4, 6])
        );
    }

    #[test]
    fn test_transform_map_with_index() {
        assert_eq!(
            run_transform("map", "item + index", json!([10, 10])).unwrap(),
            json!([10, 11])
        );
    }

    #[test]
    fn test_transform_filter() {
        assert_eq!(
            run_transform("filter", "item % 2 == 0", json!([1, 2, 3, 4])).unwrap(),
            json!([2, 4])
        );
    }

    #[test]
    fn test_transform_reduce() {
        assert_eq!(
            run_transform("reduce", "return acc + item", json!([1, 2, 3, 4])).unwrap(),
            json!(10)
        );
    }

    #[test]
    fn test_transform_reduce_empty_is_error() {
        let err = run_transform("reduce", "acc + item", json!([])).unwrap_err();
        assert!(matches!(err, HandlerError::Transform(_)));
    }

    #[test]
    fn test_transform_non_array_input() {
        assert_eq!(
            run_transform("map", "item.n + index", json!({"n": 5})).unwrap(),
            json!(5)
        );
    }

    #[test]
    fn test_transform_unknown_type_returns_array() {
        assert_eq!(
            run_transform("shuffle", "item", json!([3, 1])).unwrap(),
            json!([3, 1])
        );
    }

    #[test]
    fn test_transform_missing_function() {
        let node = Node::new("t", NodeKind::Transform);
        assert_eq!(
            transform(&node, &json!([]), &VariableStore::new())
                .unwrap_err()
                .to_string(),
            "transform function not set"
        );
    }

    #[test]
    fn test_filter_array() {
        assert_eq!(
            run_filter("item.age >= 18", json!([{"age": 20}, {"age": 10}, {"age": 18}])).unwrap(),
            json!([{"age": 20}, {"age": 18}])
        );
    }

    #[test]
    fn test_filter_non_array() {
        assert_eq!(run_filter("item > 3", json!(5)).unwrap(), json!(5));
        assert_eq!(run_filter("item > 3", json!(1)).unwrap(), Value::Null);
    }

    #[test]
    fn test_filter_error_is_fatal() {
        let err = run_filter("item.a.b", json!([{}])).unwrap_err();
        assert!(err.to_string().starts_with("filter execution error: "));
    }
}
