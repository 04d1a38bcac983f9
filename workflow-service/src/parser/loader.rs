// Workflow Document Loader
// Reads workflow graphs from JSON or YAML, bare or wrapped in a saved-workflow envelope

use crate::parser::error::{ParseError, ParseResult};
use crate::parser::models::{SavedWorkflow, WorkflowDefinition};

use std::fs;
use std::path::Path;

/// Key that marks a saved-workflow envelope
const ENVELOPE_KEY: &str = "workflow_definition";

/// Serialization format of a workflow document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Pick the format from a file extension. Anything but .yaml/.yml is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("yaml") | Some("yml") => DocumentFormat::Yaml,
            _ => DocumentFormat::Json,
        }
    }
}

/// Loader for workflow documents
pub struct WorkflowParser;

impl WorkflowParser {
    /// Parse a workflow graph from JSON text
    pub fn parse_json(content: &str) -> ParseResult<WorkflowDefinition> {
        Self::parse(content, DocumentFormat::Json)
    }

    /// Parse a workflow graph from YAML text
    pub fn parse_yaml(content: &str) -> ParseResult<WorkflowDefinition> {
        Self::parse(content, DocumentFormat::Yaml)
    }

    /// Parse a workflow graph. Both a bare `{nodes, edges}` document and a
    /// saved-workflow envelope are accepted.
    pub fn parse(content: &str, format: DocumentFormat) -> ParseResult<WorkflowDefinition> {
        if Self::is_envelope(content, format)? {
            Ok(Self::parse_saved(content, format)?.workflow_definition)
        } else {
            match format {
                DocumentFormat::Json => serde_json::from_str(content)
                    .map_err(|e| ParseError::from_json_error(&e, content)),
                DocumentFormat::Yaml => serde_yaml::from_str(content)
                    .map_err(|e| ParseError::from_yaml_error(&e, content)),
            }
        }
    }

    /// Parse a saved-workflow envelope
    pub fn parse_saved(content: &str, format: DocumentFormat) -> ParseResult<SavedWorkflow> {
        match format {
            DocumentFormat::Json => serde_json::from_str(content)
                .map_err(|e| ParseError::from_json_error(&e, content)),
            DocumentFormat::Yaml => serde_yaml::from_str(content)
                .map_err(|e| ParseError::from_yaml_error(&e, content)),
        }
    }

    /// Parse a workflow graph from a file, choosing the format by extension
    pub fn parse_file<P: AsRef<Path>>(path: P) -> ParseResult<WorkflowDefinition> {
        let path = path.as_ref();
        let content = Self::read(path)?;
        Self::parse(&content, DocumentFormat::from_path(path))
    }

    /// Import a saved workflow exported as JSON
    pub fn import_json(content: &str) -> ParseResult<SavedWorkflow> {
        Self::parse_saved(content, DocumentFormat::Json)
    }

    /// Export a saved workflow as pretty JSON
    pub fn export_json(workflow: &SavedWorkflow) -> ParseResult<String> {
        serde_json::to_string_pretty(workflow).map_err(|e| {
            ParseError::new(format!("failed to serialize workflow: {}", e), 0, 0)
        })
    }

    fn read(path: &Path) -> ParseResult<String> {
        fs::read_to_string(path)
            .map_err(|e| ParseError::io(format!("failed to read {}: {}", path.display(), e)))
    }

    fn is_envelope(content: &str, format: DocumentFormat) -> ParseResult<bool> {
        match format {
            DocumentFormat::Json => {
                let value: serde_json::Value = serde_json::from_str(content)
                    .map_err(|e| ParseError::from_json_error(&e, content))?;
                Ok(value.get(ENVELOPE_KEY).is_some())
            }
            DocumentFormat::Yaml => {
                let value: serde_yaml::Value = serde_yaml::from_str(content)
                    .map_err(|e| ParseError::from_yaml_error(&e, content))?;
                Ok(value.get(ENVELOPE_KEY).is_some())
            }
        }
    }
}
