// CLI Commands
// One module per subcommand plus shared workflow loading

pub mod order;
pub mod run;
pub mod summary;
pub mod test;
pub mod validate;

use crate::output;

use std::path::Path;

use color_eyre::Result;
use workflow_service::{WorkflowDefinition, WorkflowParser};

/// Parse a workflow file, printing location and suggestion on failure
pub fn load_workflow(path: &Path) -> Result<WorkflowDefinition> {
    if !path.exists() {
        color_eyre::eyre::bail!("Workflow file not found: {}", path.display());
    }

    match WorkflowParser::parse_file(path) {
        Ok(workflow) => Ok(workflow),
        Err(e) => {
            output::error(&format!("Parse error: {}", e.message));
            if e.line > 0 {
                output::dim(&format!("  at line {}, column {}", e.line, e.column));
            }
            if !e.context.is_empty() {
                output::dim(&e.context);
            }
            if let Some(suggestion) = &e.suggestion {
                output::info(&format!("Suggestion: {}", suggestion));
            }
            color_eyre::eyre::bail!("failed to parse {}", path.display())
        }
    }
}
