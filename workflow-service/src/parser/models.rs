// Workflow Data Models
// Nodes, edges and workflow definitions as authored in the editor

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use std::collections::BTreeMap;
use std::fmt;

/// Node kinds that stand for external integrations. The preview engine
/// executes them as simulated pass-through steps.
pub const INTEGRATION_KINDS: &[&str] = &[
    "chatmodel",
    "tool",
    "retriever",
    "condition",
    "loop",
    "switch",
    "http",
    "webhook",
    "delay",
];

/// The declared type of a node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    SetVariable,
    GetVariable,
    IfElse,
    Lambda,
    Transform,
    Filter,
    Merge,
    Template,
    /// Any other kind, executed as a simulated stub
    Unsupported(String),
}

impl NodeKind {
    pub fn as_str(&self) -> &str {
        match self {
            NodeKind::SetVariable => "set_variable",
            NodeKind::GetVariable => "get_variable",
            NodeKind::IfElse => "if_else",
            NodeKind::Lambda => "lambda",
            NodeKind::Transform => "transform",
            NodeKind::Filter => "filter",
            NodeKind::Merge => "merge",
            NodeKind::Template => "template",
            NodeKind::Unsupported(kind) => kind,
        }
    }

    /// Whether the engine has a real handler for this kind
    pub fn is_executable(&self) -> bool {
        !matches!(self, NodeKind::Unsupported(_))
    }

    /// Whether this kind is one of the known integration stubs
    pub fn is_integration(&self) -> bool {
        match self {
            NodeKind::Unsupported(kind) => INTEGRATION_KINDS.contains(&kind.as_str()),
            _ => false,
        }
    }
}

impl From<String> for NodeKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "set_variable" => NodeKind::SetVariable,
            "get_variable" => NodeKind::GetVariable,
            "if_else" => NodeKind::IfElse,
            "lambda" => NodeKind::Lambda,
            "transform" => NodeKind::Transform,
            "filter" => NodeKind::Filter,
            "merge" => NodeKind::Merge,
            "template" => NodeKind::Template,
            _ => NodeKind::Unsupported(kind),
        }
    }
}

impl From<&str> for NodeKind {
    fn from(kind: &str) -> Self {
        NodeKind::from(kind.to_string())
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Unsupported(kind) => kind,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canvas coordinates of a node. Carried through serialization only.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A typed unit of work in a workflow graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique node identifier
    #[serde(default)]
    pub id: String,

    /// Declared node type
    #[serde(rename = "type")]
    pub kind: NodeKind,

    /// Human readable label
    #[serde(default)]
    pub label: String,

    /// Handler configuration
    #[serde(default)]
    pub config: Map<String, Value>,

    /// Editor position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl Node {
    pub fn new(id: impl Into<String>, kind: impl Into<NodeKind>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            label: String::new(),
            config: Map::new(),
            position: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.position = Some(Position { x, y });
        self
    }

    /// Label if set, otherwise the id
    pub fn display_name(&self) -> &str {
        if self.label.is_empty() {
            &self.id
        } else {
            &self.label
        }
    }

    /// Raw config value for a key
    pub fn config_value(&self, key: &str) -> Option<&Value> {
        self.config.get(key)
    }

    /// Config value as a non-empty string
    pub fn config_str(&self, key: &str) -> Option<&str> {
        match self.config.get(key) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        }
    }
}

/// A directed dependency from one node to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Source node id
    #[serde(default)]
    pub source: String,

    /// Target node id
    #[serde(default)]
    pub target: String,

    /// Declared field mapping. Not applied by the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_mapping: Option<BTreeMap<String, String>>,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            field_mapping: None,
        }
    }
}

/// The node and edge definition of a workflow
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl WorkflowDefinition {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    /// Look up a node by id
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Ids of nodes with an edge pointing at `id`, in edge order
    pub fn predecessors<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.edges
            .iter()
            .filter(move |e| e.target == id)
            .map(|e| e.source.as_str())
    }

    /// Nodes without an incoming edge, in node-list order
    pub fn start_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes
            .iter()
            .filter(move |n| !self.edges.iter().any(|e| e.target == n.id))
    }

    pub fn summary(&self) -> WorkflowSummary {
        WorkflowSummary::of(self)
    }
}

/// A workflow as stored and exchanged through import/export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedWorkflow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub workflow_definition: WorkflowDefinition,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl SavedWorkflow {
    pub fn new(name: impl Into<String>, workflow_definition: WorkflowDefinition) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
            workflow_definition,
            created_at: None,
            updated_at: None,
        }
    }
}

/// Node and edge counts of a workflow
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkflowSummary {
    pub total_nodes: usize,
    pub total_edges: usize,
    /// Number of nodes per declared type
    pub node_type_count: BTreeMap<String, usize>,
}

impl WorkflowSummary {
    pub fn of(workflow: &WorkflowDefinition) -> Self {
        let mut node_type_count = BTreeMap::new();
        for node in &workflow.nodes {
            *node_type_count
                .entry(node.kind.as_str().to_string())
                .or_insert(0) += 1;
        }

        Self {
            total_nodes: workflow.nodes.len(),
            total_edges: workflow.edges.len(),
            node_type_count,
        }
    }
}
