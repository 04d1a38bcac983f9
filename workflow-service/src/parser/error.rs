// Parser error types with helpful error messages
// Provides context, line/column info, and suggestions for common workflow mistakes

use std::fmt;

/// Detailed parse error with location and context
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Error message
    pub message: String,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
    /// Surrounding context (a few lines around the error)
    pub context: String,
    /// Optional suggestion for fixing the error
    pub suggestion: Option<String>,
    /// The kind of error
    pub kind: ParseErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// JSON syntax error
    JsonSyntax,
    /// YAML syntax error
    YamlSyntax,
    /// Invalid schema (wrong types, missing fields)
    InvalidSchema,
    /// IO error (file not found, etc.)
    IoError,
}

impl ParseError {
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
            context: String::new(),
            suggestion: None,
            kind: ParseErrorKind::InvalidSchema,
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(message, 0, 0).with_kind(ParseErrorKind::IoError)
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_kind(mut self, kind: ParseErrorKind) -> Self {
        self.kind = kind;
        self
    }

    fn with_suggestion_opt(mut self, suggestion: Option<String>) -> Self {
        self.suggestion = suggestion;
        self
    }

    /// Create context from source content
    pub fn with_source_context(mut self, source: &str, context_lines: usize) -> Self {
        let lines: Vec<&str> = source.lines().collect();
        let start = self.line.saturating_sub(context_lines + 1);
        let end = (self.line + context_lines).min(lines.len());

        let mut context = String::new();
        for (i, line) in lines.iter().enumerate().take(end).skip(start) {
            let line_num = i + 1;
            let prefix = if line_num == self.line { ">" } else { " " };
            context.push_str(&format!("{} {:4} | {}\n", prefix, line_num, line));

            if line_num == self.line && self.column > 0 {
                let indicator = " ".repeat(self.column.saturating_sub(1)) + "^";
                context.push_str(&format!("       | {}\n", indicator));
            }
        }

        self.context = context;
        self
    }

    /// Create from serde_yaml error
    pub fn from_yaml_error(err: &serde_yaml::Error, source: &str) -> Self {
        let (line, column) = err
            .location()
            .map(|loc| (loc.line(), loc.column()))
            .unwrap_or((1, 1));

        let raw = err.to_string();
        let kind = if raw.contains("missing field")
            || raw.contains("unknown field")
            || raw.contains("invalid type")
        {
            ParseErrorKind::InvalidSchema
        } else {
            ParseErrorKind::YamlSyntax
        };

        ParseError::new(format_serde_message(&raw), line, column)
            .with_kind(kind)
            .with_source_context(source, 2)
            .with_suggestion_opt(suggest_fix(&raw))
    }

    /// Create from serde_json error
    pub fn from_json_error(err: &serde_json::Error, source: &str) -> Self {
        let kind = match err.classify() {
            serde_json::error::Category::Data => ParseErrorKind::InvalidSchema,
            serde_json::error::Category::Io => ParseErrorKind::IoError,
            _ => ParseErrorKind::JsonSyntax,
        };

        let raw = err.to_string();
        ParseError::new(format_serde_message(&raw), err.line(), err.column())
            .with_kind(kind)
            .with_source_context(source, 2)
            .with_suggestion_opt(suggest_fix(&raw))
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error: {}", self.message)?;
        if self.line > 0 {
            writeln!(f, "  --> line {}:{}", self.line, self.column)?;
        }

        if !self.context.is_empty() {
            writeln!(f)?;
            write!(f, "{}", self.context)?;
        }

        if let Some(suggestion) = &self.suggestion {
            writeln!(f)?;
            writeln!(f, "help: {}", suggestion)?;
        }

        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// Strip serde's location suffix and reword common messages
fn format_serde_message(raw: &str) -> String {
    let msg = match raw.find(" at line ") {
        Some(idx) => &raw[..idx],
        None => raw,
    };

    if msg.contains("missing field") {
        if let Some(field) = extract_field_name(msg, "missing field `", "`") {
            return format!("missing required field '{}'", field);
        }
    }

    if msg.contains("invalid type") {
        if let (Some(found), Some(expected)) = (
            extract_field_name(msg, "invalid type: ", ","),
            msg.find("expected ").map(|i| msg[i + "expected ".len()..].to_string()),
        ) {
            return format!("expected {}, but found {}", expected, found);
        }
    }

    msg.to_string()
}

fn extract_field_name(msg: &str, prefix: &str, suffix: &str) -> Option<String> {
    let start = msg.find(prefix)? + prefix.len();
    let end = msg[start..].find(suffix)? + start;
    Some(msg[start..end].to_string())
}

/// Suggest fixes for common workflow document mistakes
fn suggest_fix(raw: &str) -> Option<String> {
    if raw.contains("missing field `type`") {
        return Some(
            "every node needs a 'type', for example set_variable, if_else, lambda or template"
                .to_string(),
        );
    }

    if raw.contains("missing field `workflow_definition`") {
        return Some(
            "saved workflows wrap their graph in 'workflow_definition: { nodes, edges }'"
                .to_string(),
        );
    }

    if raw.contains("missing field `name`") {
        return Some("saved workflows need a 'name'".to_string());
    }

    if raw.contains("trailing comma") {
        return Some("JSON does not allow a comma after the last element".to_string());
    }

    if raw.contains("invalid type") && raw.contains("expected a sequence") {
        return Some("'nodes' and 'edges' must be lists".to_string());
    }

    None
}

/// Result type for parser operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Validation error for structural checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub message: String,
    pub path: String,
    pub suggestion: Option<String>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: path.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation error at '{}': {}", self.path, self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " ({})", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::new("missing required field 'type'", 4, 7)
            .with_context("   3 |   {\n>  4 |     \"id\": \"a\"\n   5 |   }")
            .with_suggestion("every node needs a 'type'");

        let output = format!("{}", err);
        assert!(output.contains("missing required field"));
        assert!(output.contains("line 4:7"));
        assert!(output.contains("help:"));
    }

    #[test]
    fn test_parse_error_with_source_context() {
        let source = "{\n  \"nodes\": [\n    {\"id\": \"a\"}\n  ]\n}";
        let err = ParseError::new("missing required field 'type'", 3, 5).with_source_context(source, 1);

        assert!(err.context.contains("> "));
        assert!(err.context.contains("\"id\": \"a\""));
        assert!(err.context.contains('^'));
    }

    #[test]
    fn test_from_json_error_locates_problem() {
        let source = "{\n  \"nodes\": [\n    {\"id\": \"a\"}\n  ]\n}";
        let err = serde_json::from_str::<crate::parser::models::WorkflowDefinition>(source)
            .unwrap_err();
        let parse_err = ParseError::from_json_error(&err, source);

        assert_eq!(parse_err.kind, ParseErrorKind::InvalidSchema);
        assert_eq!(parse_err.message, "missing required field 'type'");
        assert_eq!(parse_err.line, 3);
        assert!(parse_err.suggestion.is_some());
    }

    #[test]
    fn test_from_json_syntax_error() {
        let source = "{\"nodes\": [}";
        let err = serde_json::from_str::<serde_json::Value>(source).unwrap_err();
        let parse_err = ParseError::from_json_error(&err, source);
        assert_eq!(parse_err.kind, ParseErrorKind::JsonSyntax);
        assert_eq!(parse_err.line, 1);
    }

    #[test]
    fn test_from_yaml_error() {
        let source = "nodes:\n  - id: a\n    label: x\n";
        let err = serde_yaml::from_str::<crate::parser::models::WorkflowDefinition>(source)
            .unwrap_err();
        let parse_err = ParseError::from_yaml_error(&err, source);
        assert_eq!(parse_err.kind, ParseErrorKind::InvalidSchema);
        assert!(parse_err.message.contains("type"));
    }

    #[test]
    fn test_extract_field_name() {
        let msg = "missing field `type` at line 10";
        assert_eq!(
            extract_field_name(msg, "missing field `", "`"),
            Some("type".to_string())
        );
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new("duplicate node id: a", "nodes[1]")
            .with_suggestion("node ids must be unique");
        assert_eq!(
            err.to_string(),
            "validation error at 'nodes[1]': duplicate node id: a (node ids must be unique)"
        );
    }
}
