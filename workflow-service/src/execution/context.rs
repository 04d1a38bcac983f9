// Runtime Execution Context
// Session-scoped variable store, node statuses and produced results

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use std::collections::BTreeMap;
use std::fmt;

/// Mutable key/value scope shared by all nodes of one execution session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableStore {
    values: Map<String, Value>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(values: Map<String, Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Insert or overwrite a variable, returning the previous value
    pub fn set(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(name.into(), value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Copy of the current mapping
    pub fn snapshot(&self) -> Map<String, Value> {
        self.values.clone()
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.values
    }

    /// Variable names follow `[A-Za-z_][A-Za-z0-9_]*`
    pub fn is_valid_name(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for VariableStore {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Per-node execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Pending,
    Running,
    Success,
    Error,
}

impl NodeStatus {
    /// Success and error are final for a session
    pub fn is_terminal(&self) -> bool {
        matches!(self, NodeStatus::Success | NodeStatus::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeStatus::Pending => "pending",
            NodeStatus::Running => "running",
            NodeStatus::Success => "success",
            NodeStatus::Error => "error",
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State owned by one execution session
#[derive(Debug, Clone)]
pub struct RuntimeContext {
    /// Session input handed to nodes without a predecessor
    pub input: Value,

    /// Variables visible to handlers and expressions
    pub variables: VariableStore,

    /// Status of every node in the workflow
    pub statuses: BTreeMap<String, NodeStatus>,

    /// Results keyed by node id, in production order
    pub results: Map<String, Value>,

    /// Id of the node that produced the most recent result
    last_producer: Option<String>,
}

impl RuntimeContext {
    /// Start a session with every node pending
    pub fn new<'a>(
        node_ids: impl IntoIterator<Item = &'a str>,
        input: Value,
        variables: VariableStore,
    ) -> Self {
        Self {
            input,
            variables,
            statuses: node_ids
                .into_iter()
                .map(|id| (id.to_string(), NodeStatus::Pending))
                .collect(),
            results: Map::new(),
            last_producer: None,
        }
    }

    pub fn status(&self, node_id: &str) -> NodeStatus {
        self.statuses
            .get(node_id)
            .copied()
            .unwrap_or(NodeStatus::Pending)
    }

    pub fn set_status(&mut self, node_id: &str, status: NodeStatus) {
        self.statuses.insert(node_id.to_string(), status);
    }

    pub fn record_result(&mut self, node_id: &str, result: Value) {
        self.results.insert(node_id.to_string(), result);
        self.last_producer = Some(node_id.to_string());
    }

    pub fn result(&self, node_id: &str) -> Option<&Value> {
        self.results.get(node_id)
    }

    /// The most recently produced result
    pub fn latest_result(&self) -> Option<&Value> {
        self.last_producer
            .as_deref()
            .and_then(|id| self.results.get(id))
    }

    /// All results produced so far, in production order
    pub fn prior_results(&self) -> Vec<Value> {
        self.results.values().cloned().collect()
    }

    /// Pick the input for a node from its predecessors.
    ///
    /// A single predecessor hands over its result, a start node receives the
    /// session input, and a node joining several branches receives the most
    /// recent result.
    pub fn input_for(&self, predecessors: &[&str]) -> Value {
        match predecessors {
            [] => self.input.clone(),
            [single] => self.result(single).cloned().unwrap_or(Value::Null),
            _ => self
                .latest_result()
                .cloned()
                .unwrap_or_else(|| self.input.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_variable_store_get_set() {
        let mut store = VariableStore::new();
        assert!(store.is_empty());
        assert_eq!(store.set("name", json!("Ada")), None);
        assert_eq!(store.set("name", json!("Grace")), Some(json!("Ada")));
        assert_eq!(store.get("name"), Some(&json!("Grace")));
        assert!(store.contains("name"));
        assert!(store.get("missing").is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_variable_store_from_iter_and_snapshot() {
        let store: VariableStore = vec![("a", json!(1)), ("b", json!([1, 2]))]
            .into_iter()
            .collect();
        let snapshot = store.snapshot();
        assert_eq!(Value::Object(snapshot), json!({"a": 1, "b": [1, 2]}));
    }

    #[test]
    fn test_variable_store_serializes_as_map() {
        let store: VariableStore = vec![("x", json!(true))].into_iter().collect();
        assert_eq!(serde_json::to_value(&store).unwrap(), json!({"x": true}));
    }

    #[test]
    fn test_valid_variable_names() {
        assert!(VariableStore::is_valid_name("name"));
        assert!(VariableStore::is_valid_name("_private1"));
        assert!(VariableStore::is_valid_name("A_b_C"));
        assert!(!VariableStore::is_valid_name(""));
        assert!(!VariableStore::is_valid_name("1abc"));
        assert!(!VariableStore::is_valid_name("has space"));
        assert!(!VariableStore::is_valid_name("dash-ed"));
    }

    #[test]
    fn test_node_status_terminal() {
        assert!(!NodeStatus::Pending.is_terminal());
        assert!(!NodeStatus::Running.is_terminal());
        assert!(NodeStatus::Success.is_terminal());
        assert!(NodeStatus::Error.is_terminal());
        assert_eq!(serde_json::to_value(NodeStatus::Error).unwrap(), json!("error"));
        assert_eq!(NodeStatus::Running.to_string(), "running");
    }

    #[test]
    fn test_runtime_context_starts_pending() {
        let ctx = RuntimeContext::new(["a", "b"], json!(null), VariableStore::new());
        assert_eq!(ctx.status("a"), NodeStatus::Pending);
        assert_eq!(ctx.status("b"), NodeStatus::Pending);
        assert!(ctx.latest_result().is_none());
    }

    #[test]
    fn test_input_selection() {
        let mut ctx = RuntimeContext::new(["a", "b", "c"], json!("seed"), VariableStore::new());
        assert_eq!(ctx.input_for(&[]), json!("seed"));

        ctx.record_result("a", json!(1));
        ctx.record_result("b", json!(2));

        assert_eq!(ctx.input_for(&["a"]), json!(1));
        assert_eq!(ctx.input_for(&["a", "b"]), json!(2));
        assert_eq!(ctx.prior_results(), vec![json!(1), json!(2)]);
    }
}
