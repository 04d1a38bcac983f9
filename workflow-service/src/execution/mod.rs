// Execution Engine Module
// Order resolution, session state, progress events and the workflow executor

pub mod context;
pub mod events;
pub mod executor;
pub mod graph;

// Re-export key types
pub use context::{NodeStatus, RuntimeContext, VariableStore};
pub use events::{progress_channel, EventSender, ExecutionEvent, LogLevel, ProgressReceiver, ProgressSender};
pub use executor::{ExecutionResult, ExecutorConfig, SessionError, SessionOutput, WorkflowExecutor};
pub use graph::{execution_order, ExecutionGraph, GraphError, GraphErrorKind};
