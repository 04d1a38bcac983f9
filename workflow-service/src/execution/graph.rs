// Execution Graph
// Resolves a predecessor-first execution order for workflow nodes and detects cycles

use crate::parser::models::WorkflowDefinition;

use std::collections::{HashMap, HashSet};
use std::fmt;

/// Error type for graph operations
#[derive(Debug, Clone)]
pub struct GraphError {
    pub message: String,
    pub kind: GraphErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphErrorKind {
    /// Circular dependency detected
    CyclicDependency,
    /// Reference to a node id that is not in the graph
    UnknownNode,
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "graph error: {}", self.message)
    }
}

impl std::error::Error for GraphError {}

impl GraphError {
    pub fn cyclic(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: GraphErrorKind::CyclicDependency,
        }
    }

    pub fn unknown_node(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: GraphErrorKind::UnknownNode,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Visited,
}

/// Dependency view over a workflow graph
#[derive(Debug, Clone)]
pub struct ExecutionGraph<'a> {
    workflow: &'a WorkflowDefinition,
    /// Incoming edge sources per node, in edge order
    predecessors: HashMap<&'a str, Vec<&'a str>>,
    node_ids: HashSet<&'a str>,
}

impl<'a> ExecutionGraph<'a> {
    pub fn new(workflow: &'a WorkflowDefinition) -> Self {
        let node_ids: HashSet<&str> = workflow.nodes.iter().map(|n| n.id.as_str()).collect();

        let mut predecessors: HashMap<&str, Vec<&str>> = HashMap::new();
        for edge in &workflow.edges {
            predecessors
                .entry(edge.target.as_str())
                .or_default()
                .push(edge.source.as_str());
        }

        Self {
            workflow,
            predecessors,
            node_ids,
        }
    }

    /// Sources of the edges pointing at `id`
    pub fn predecessors(&self, id: &str) -> &[&'a str] {
        self.predecessors
            .get(id)
            .map(|p| p.as_slice())
            .unwrap_or_default()
    }

    /// Nodes with no incoming edge, in node-list order
    pub fn start_nodes(&self) -> Vec<&'a str> {
        self.workflow
            .nodes
            .iter()
            .map(|n| n.id.as_str())
            .filter(|id| self.predecessors(id).is_empty())
            .collect()
    }

    /// Resolve the full execution order.
    ///
    /// Start nodes are walked first in node-list order, then every remaining
    /// node, so each node appears exactly once and after all of its
    /// predecessors.
    pub fn execution_order(&self) -> Result<Vec<String>, GraphError> {
        let mut marks = HashMap::new();
        let mut order = Vec::with_capacity(self.workflow.nodes.len());

        let seeds = self
            .start_nodes()
            .into_iter()
            .chain(self.workflow.nodes.iter().map(|n| n.id.as_str()));

        for id in seeds {
            self.visit(id, &mut marks, &mut order)?;
        }

        tracing::debug!(nodes = order.len(), "resolved execution order");
        Ok(order)
    }

    /// Order restricted to `target` and everything it transitively depends on
    pub fn order_until(&self, target: &str) -> Result<Vec<String>, GraphError> {
        if !self.node_ids.contains(target) {
            return Err(GraphError::unknown_node(format!(
                "node does not exist: {}",
                target
            )));
        }

        // A cycle anywhere still means there is no valid order
        let full = self.execution_order()?;

        let mut marks = HashMap::new();
        let mut upstream = Vec::new();
        self.visit(target, &mut marks, &mut upstream)?;
        let upstream: HashSet<&str> = upstream.iter().map(String::as_str).collect();

        Ok(full
            .into_iter()
            .filter(|id| upstream.contains(id.as_str()))
            .collect())
    }

    fn visit(
        &self,
        id: &'a str,
        marks: &mut HashMap<&'a str, Mark>,
        order: &mut Vec<String>,
    ) -> Result<(), GraphError> {
        match marks.get(id) {
            Some(Mark::Visited) => return Ok(()),
            Some(Mark::Visiting) => {
                return Err(GraphError::cyclic(format!(
                    "circular dependency detected at node '{}': no valid execution order exists",
                    id
                )))
            }
            None => {}
        }

        marks.insert(id, Mark::Visiting);

        for &pred in self.predecessors(id) {
            // Dangling edge sources are reported by validation, not here
            if self.node_ids.contains(pred) {
                self.visit(pred, marks, order)?;
            }
        }

        marks.insert(id, Mark::Visited);
        order.push(id.to_string());
        Ok(())
    }
}

/// Resolve the execution order of a workflow graph
pub fn execution_order(workflow: &WorkflowDefinition) -> Result<Vec<String>, GraphError> {
    ExecutionGraph::new(workflow).execution_order()
}
