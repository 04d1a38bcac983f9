// Workflow Service Library
// Workflow graph validation, ordering, node execution and preview sessions

pub mod error;
pub mod execution;
pub mod expression;
pub mod nodes;
pub mod parser;
pub mod testing;

// Re-export commonly used types
pub use error::{HandlerError, NodeExecutionError, WorkflowError, WorkflowResult};

// Re-export parser types
pub use parser::{
    DocumentFormat, Edge, Node, NodeKind, ParseError, ParseErrorKind, ParseResult, SavedWorkflow,
    ValidationError, ValidationResult, WorkflowDefinition, WorkflowParser, WorkflowSummary,
    WorkflowValidator,
};

// Re-export expression types
pub use expression::{
    EvalError, ExpressionContext, ExpressionEngine, Sandbox, SandboxLimits, Script,
};

// Re-export execution types
pub use execution::{
    execution_order, progress_channel, EventSender, ExecutionEvent, ExecutionGraph,
    ExecutionResult, ExecutorConfig, GraphError, GraphErrorKind, LogLevel, NodeStatus,
    ProgressReceiver, ProgressSender, SessionError, SessionOutput, VariableStore,
    WorkflowExecutor,
};

// Re-export testing types
pub use testing::{ReportFormat, TestReporter, TestRunner, TestSuiteResult};
