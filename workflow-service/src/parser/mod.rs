// Parser module for workflow documents
// Provides the graph model, JSON/YAML loading, and structural validation

pub mod error;
pub mod loader;
pub mod models;
pub mod validator;

pub use error::{ParseError, ParseErrorKind, ParseResult, ValidationError};
pub use loader::{DocumentFormat, WorkflowParser};
pub use models::*;
pub use validator::{ValidationResult, WorkflowValidator};
