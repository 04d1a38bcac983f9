// Workflow Validator
// Structural checks on a workflow graph: node presence, id uniqueness, edge endpoints

use crate::parser::error::ValidationError;
use crate::parser::models::WorkflowDefinition;

use serde::Serialize;
use std::collections::HashSet;

/// Outcome of validating a workflow graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(serialize_with = "serialize_messages")]
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    fn from_errors(errors: Vec<ValidationError>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Error messages without location info
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.message.clone()).collect()
    }

    pub fn into_result(self) -> Result<(), Vec<ValidationError>> {
        if self.valid {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

fn serialize_messages<S>(errors: &[ValidationError], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_seq(errors.iter().map(|e| e.message.as_str()))
}

/// Validator for workflow graphs. Accumulates every violation instead of
/// stopping at the first one.
pub struct WorkflowValidator;

impl WorkflowValidator {
    pub fn validate(workflow: &WorkflowDefinition) -> ValidationResult {
        let mut errors = Vec::new();

        if workflow.nodes.is_empty() {
            errors.push(
                ValidationError::new("workflow requires at least one node", "nodes")
                    .with_suggestion("add a node before running the workflow"),
            );
        }

        let mut ids = HashSet::new();
        for (i, node) in workflow.nodes.iter().enumerate() {
            let path = format!("nodes[{}]", i);

            if node.id.trim().is_empty() {
                errors.push(ValidationError::new(
                    format!("node at index {} is missing an id", i),
                    path,
                ));
                continue;
            }

            if !ids.insert(node.id.as_str()) {
                errors.push(
                    ValidationError::new(format!("duplicate node id: {}", node.id), path)
                        .with_suggestion("node ids must be unique within a workflow"),
                );
            }
        }

        for (i, edge) in workflow.edges.iter().enumerate() {
            Self::validate_endpoint(&edge.source, "source", i, &ids, &mut errors);
            Self::validate_endpoint(&edge.target, "target", i, &ids, &mut errors);
        }

        ValidationResult::from_errors(errors)
    }

    fn validate_endpoint(
        id: &str,
        end: &str,
        index: usize,
        ids: &HashSet<&str>,
        errors: &mut Vec<ValidationError>,
    ) {
        let path = format!("edges[{}].{}", index, end);

        if id.trim().is_empty() {
            errors.push(ValidationError::new(
                format!("edge at index {} is missing a {}", index, end),
                path,
            ));
        } else if !ids.contains(id) {
            errors.push(ValidationError::new(
                format!("edge {} node does not exist: {}", end, id),
                path,
            ));
        }
    }
}
