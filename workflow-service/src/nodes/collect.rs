// Merge Node
// Combines the current input with every result produced earlier in the session

use crate::parser::models::Node;

use serde_json::{Map, Value};

/// How merged values are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Flatten one level into a single array
    Concat,
    /// Shallow key union, later values win
    Merge,
    /// The collected values as they are
    Raw,
}

impl MergeStrategy {
    pub fn from_config(node: &Node) -> Self {
        match node.config_str("merge_strategy").unwrap_or("concat") {
            "concat" => MergeStrategy::Concat,
            "merge" => MergeStrategy::Merge,
            _ => MergeStrategy::Raw,
        }
    }
}

pub fn merge(node: &Node, input: &Value, prior_results: &[Value]) -> Value {
    let values = std::iter::once(input).chain(prior_results.iter());

    match MergeStrategy::from_config(node) {
        MergeStrategy::Concat => {
            let mut flat = Vec::new();
            for value in values {
                match value {
                    Value::Array(items) => flat.extend(items.iter().cloned()),
                    other => flat.push(other.clone()),
                }
            }
            Value::Array(flat)
        }
        MergeStrategy::Merge => {
            let mut merged = Map::new();
            for value in values {
                match value {
                    Value::Object(map) => {
                        for (key, v) in map {
                            merged.insert(key.clone(), v.clone());
                        }
                    }
                    Value::Array(items) => {
                        for (i, v) in items.iter().enumerate() {
                            merged.insert(i.to_string(), v.clone());
                        }
                    }
                    _ => {}
                }
            }
            Value::Object(merged)
        }
        MergeStrategy::Raw => Value::Array(values.cloned().collect()),
    }
}
