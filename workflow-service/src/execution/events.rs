// Execution Events
// Progress reporting and event types for workflow execution

use crate::execution::context::NodeStatus;

use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc;

/// Sender for execution progress events
pub type ProgressSender = mpsc::UnboundedSender<ExecutionEvent>;

/// Receiver for execution progress events
pub type ProgressReceiver = mpsc::UnboundedReceiver<ExecutionEvent>;

/// Create a new progress channel
pub fn progress_channel() -> (ProgressSender, ProgressReceiver) {
    mpsc::unbounded_channel()
}

/// Events emitted during workflow execution
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    /// Session started with a resolved order
    WorkflowStarted {
        total_nodes: usize,
        order: Vec<String>,
    },

    /// Session finished, successfully or not
    WorkflowCompleted { success: bool, duration: Duration },

    /// A node moved to a new status
    NodeStatusChanged { node_id: String, status: NodeStatus },

    /// Node handler invoked
    NodeStarted {
        node_id: String,
        label: String,
        kind: String,
        input: Value,
    },

    /// Node handler returned a result
    NodeCompleted {
        node_id: String,
        result: Value,
        duration: Duration,
    },

    /// Node handler failed
    NodeFailed {
        node_id: String,
        label: String,
        message: String,
    },

    /// A set_variable node wrote to the store
    VariableSet { node_id: String, name: String, value: Value },

    /// Note about the session that is not a node result
    Log {
        level: LogLevel,
        message: String,
        node_id: Option<String>,
    },
}

/// Log level for log events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
}

impl ExecutionEvent {
    pub fn workflow_started(order: &[String]) -> Self {
        Self::WorkflowStarted {
            total_nodes: order.len(),
            order: order.to_vec(),
        }
    }

    pub fn workflow_completed(success: bool, duration: Duration) -> Self {
        Self::WorkflowCompleted { success, duration }
    }

    pub fn status_changed(node_id: impl Into<String>, status: NodeStatus) -> Self {
        Self::NodeStatusChanged {
            node_id: node_id.into(),
            status,
        }
    }

    pub fn node_started(
        node_id: impl Into<String>,
        label: impl Into<String>,
        kind: impl Into<String>,
        input: Value,
    ) -> Self {
        Self::NodeStarted {
            node_id: node_id.into(),
            label: label.into(),
            kind: kind.into(),
            input,
        }
    }

    pub fn node_completed(node_id: impl Into<String>, result: Value, duration: Duration) -> Self {
        Self::NodeCompleted {
            node_id: node_id.into(),
            result,
            duration,
        }
    }

    pub fn node_failed(
        node_id: impl Into<String>,
        label: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::NodeFailed {
            node_id: node_id.into(),
            label: label.into(),
            message: message.into(),
        }
    }

    pub fn variable_set(node_id: impl Into<String>, name: impl Into<String>, value: Value) -> Self {
        Self::VariableSet {
            node_id: node_id.into(),
            name: name.into(),
            value,
        }
    }

    /// Create an info log event
    pub fn info(message: impl Into<String>, node_id: Option<String>) -> Self {
        Self::Log {
            level: LogLevel::Info,
            message: message.into(),
            node_id,
        }
    }

    /// Create a warning log event
    pub fn warning(message: impl Into<String>, node_id: Option<String>) -> Self {
        Self::Log {
            level: LogLevel::Warning,
            message: message.into(),
            node_id,
        }
    }
}

/// Helper trait for sending events, ignoring errors (fire-and-forget)
pub trait EventSender {
    fn send_event(&self, event: ExecutionEvent);
}

impl EventSender for ProgressSender {
    fn send_event(&self, event: ExecutionEvent) {
        let _ = self.send(event);
    }
}

impl EventSender for Option<ProgressSender> {
    fn send_event(&self, event: ExecutionEvent) {
        if let Some(sender) = self {
            let _ = sender.send(event);
        }
    }
}
