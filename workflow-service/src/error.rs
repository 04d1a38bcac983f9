// Workflow Errors
// Error types shared by the loader, resolver, node handlers and execution session

use crate::execution::executor::SessionError;
use crate::execution::graph::GraphError;
use crate::parser::{ParseError, ValidationError};

use std::io;
use thiserror::Error;

pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Top-level error for loading, checking and running a workflow
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("workflow is invalid: {}", join_messages(.0))]
    Validation(Vec<ValidationError>),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Why a node handler failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    #[error("{0} not set")]
    MissingConfig(String),

    #[error("invalid variable name: {0}")]
    InvalidVariableName(String),

    #[error("code execution error: {0}")]
    Script(String),

    #[error("transform execution error: {0}")]
    Transform(String),

    #[error("filter execution error: {0}")]
    Filter(String),
}

impl HandlerError {
    pub fn missing(field: impl Into<String>) -> Self {
        HandlerError::MissingConfig(field.into())
    }
}

/// A handler failure attributed to the node that raised it
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("node \"{label}\" ({node_id}) failed: {cause}")]
pub struct NodeExecutionError {
    pub node_id: String,
    pub label: String,
    pub cause: HandlerError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_error_messages() {
        assert_eq!(
            HandlerError::missing("variable name").to_string(),
            "variable name not set"
        );
        assert_eq!(
            HandlerError::Script("x is not defined".to_string()).to_string(),
            "code execution error: x is not defined"
        );
    }

    #[test]
    fn test_node_execution_error_names_node() {
        let err = NodeExecutionError {
            node_id: "n2".to_string(),
            label: "Double".to_string(),
            cause: HandlerError::Transform("boom".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "node \"Double\" (n2) failed: transform execution error: boom"
        );
    }

    #[test]
    fn test_validation_error_batch_message() {
        let err = WorkflowError::Validation(vec![
            ValidationError::new("workflow requires at least one node", "nodes"),
            ValidationError::new("duplicate node id: a", "nodes[1]"),
        ]);
        assert_eq!(
            err.to_string(),
            "workflow is invalid: workflow requires at least one node; duplicate node id: a"
        );
    }
}
