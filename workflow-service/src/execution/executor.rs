// Workflow Executor
// Runs the resolved node sequence and owns status tracking and failure propagation

use crate::error::{NodeExecutionError, WorkflowError, WorkflowResult};
use crate::execution::context::{NodeStatus, RuntimeContext, VariableStore};
use crate::execution::events::{EventSender, ExecutionEvent, ProgressSender};
use crate::execution::graph::ExecutionGraph;
use crate::nodes;
use crate::parser::models::{NodeKind, WorkflowDefinition};
use crate::parser::validator::WorkflowValidator;

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Configuration for workflow execution
#[derive(Debug, Clone, Default)]
pub struct ExecutorConfig {
    /// Pause before each node after the first, for live status displays
    pub node_delay: Option<Duration>,
}

impl ExecutorConfig {
    pub fn with_node_delay(mut self, delay: Duration) -> Self {
        self.node_delay = Some(delay);
        self
    }
}

/// Why a session stopped before finishing
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionError {
    #[error("node \"{label}\" ({node_id}) failed: {message}")]
    NodeFailed {
        node_id: String,
        label: String,
        message: String,
    },

    #[error("execution cancelled before node {next_node}")]
    Cancelled { next_node: String },
}

impl SessionError {
    /// Id of the node that failed or would have run next
    pub fn node_id(&self) -> &str {
        match self {
            SessionError::NodeFailed { node_id, .. } => node_id,
            SessionError::Cancelled { next_node } => next_node,
        }
    }
}

impl From<NodeExecutionError> for SessionError {
    fn from(err: NodeExecutionError) -> Self {
        SessionError::NodeFailed {
            node_id: err.node_id,
            label: err.label,
            message: err.cause.to_string(),
        }
    }
}

/// Output of a session that ran every node
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOutput {
    pub final_output: Value,
    pub node_results: Map<String, Value>,
    pub variables: Map<String, Value>,
}

/// Full report of one execution session
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    /// Overall success
    pub success: bool,
    /// Result of the last node in order, null if nothing ran
    pub final_output: Value,
    /// Results keyed by node id, in production order
    pub node_results: Map<String, Value>,
    /// Final variable store
    pub variables: Map<String, Value>,
    /// Status of every node
    pub statuses: BTreeMap<String, NodeStatus>,
    /// Resolved execution order
    pub order: Vec<String>,
    /// Total duration
    #[serde(serialize_with = "serialize_millis")]
    pub duration: Duration,
    /// Why the session stopped early
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<SessionError>,
}

pub(crate) fn serialize_millis<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u128(duration.as_millis())
}

impl ExecutionResult {
    pub fn status(&self, node_id: &str) -> NodeStatus {
        self.statuses
            .get(node_id)
            .copied()
            .unwrap_or(NodeStatus::Pending)
    }

    /// Branch label reported by an if_else node
    pub fn branch(&self, node_id: &str) -> Option<&str> {
        self.node_results.get(node_id)?.get("branch")?.as_str()
    }

    pub fn into_result(self) -> Result<SessionOutput, SessionError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(SessionOutput {
                final_output: self.final_output,
                node_results: self.node_results,
                variables: self.variables,
            }),
        }
    }
}

/// Workflow executor
pub struct WorkflowExecutor {
    /// Workflow being executed
    workflow: WorkflowDefinition,
    /// Resolved execution order
    order: Vec<String>,
    /// Configuration
    config: ExecutorConfig,
    /// Progress event sender
    event_tx: Option<ProgressSender>,
    /// Checked between nodes
    cancel: Option<CancellationToken>,
}

impl WorkflowExecutor {
    /// Validate the workflow and resolve its execution order
    pub fn from_workflow(workflow: &WorkflowDefinition) -> WorkflowResult<Self> {
        WorkflowValidator::validate(workflow)
            .into_result()
            .map_err(WorkflowError::Validation)?;

        let order = ExecutionGraph::new(workflow).execution_order()?;
        Ok(Self::with_order(workflow.clone(), order))
    }

    fn with_order(workflow: WorkflowDefinition, order: Vec<String>) -> Self {
        Self {
            workflow,
            order,
            config: ExecutorConfig::default(),
            event_tx: None,
            cancel: None,
        }
    }

    /// Set executor configuration
    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set progress event sender
    pub fn with_progress(mut self, tx: ProgressSender) -> Self {
        self.event_tx = Some(tx);
        self
    }

    /// Stop the session at the next node boundary once `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn workflow(&self) -> &WorkflowDefinition {
        &self.workflow
    }

    /// Run every node in order against `input`, starting from `seed` variables
    pub async fn execute(&self, input: Value, seed: VariableStore) -> ExecutionResult {
        let start = Instant::now();
        let graph = ExecutionGraph::new(&self.workflow);
        let mut runtime = RuntimeContext::new(
            self.workflow.nodes.iter().map(|n| n.id.as_str()),
            input,
            seed,
        );

        tracing::info!(nodes = self.order.len(), "workflow execution started");
        self.event_tx
            .send_event(ExecutionEvent::workflow_started(&self.order));

        let mut error = None;
        for (index, node_id) in self.order.iter().enumerate() {
            if let Err(err) = self.pause(node_id, index > 0).await {
                error = Some(err);
                break;
            }

            if let Err(err) = self.run_node(node_id, &graph, &mut runtime) {
                error = Some(err);
                break;
            }
        }

        let duration = start.elapsed();
        let success = error.is_none();

        match &error {
            None => tracing::info!(?duration, "workflow execution succeeded"),
            Some(err) => tracing::error!(?duration, error = %err, "workflow execution failed"),
        }
        self.event_tx
            .send_event(ExecutionEvent::workflow_completed(success, duration));

        let final_output = self
            .order
            .last()
            .and_then(|id| runtime.result(id))
            .filter(|_| success)
            .cloned()
            .unwrap_or(Value::Null);

        ExecutionResult {
            success,
            final_output,
            node_results: runtime.results,
            variables: runtime.variables.into_map(),
            statuses: runtime.statuses,
            order: self.order.clone(),
            duration,
            error,
        }
    }

    /// Check the cancellation token before a node. The configured delay
    /// applies only when `wait` is set.
    async fn pause(&self, next_node: &str, wait: bool) -> Result<(), SessionError> {
        let cancelled = || SessionError::Cancelled {
            next_node: next_node.to_string(),
        };

        let delay = self.config.node_delay.filter(|_| wait);
        match (&self.cancel, delay) {
            (Some(token), Some(delay)) => {
                tokio::select! {
                    _ = token.cancelled() => return Err(cancelled()),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            (None, Some(delay)) => tokio::time::sleep(delay).await,
            _ => {}
        }

        match &self.cancel {
            Some(token) if token.is_cancelled() => {
                tracing::warn!(next_node, "workflow execution cancelled");
                self.event_tx.send_event(ExecutionEvent::info(
                    format!("execution cancelled before node {}", next_node),
                    None,
                ));
                Err(cancelled())
            }
            _ => Ok(()),
        }
    }

    fn run_node(
        &self,
        node_id: &str,
        graph: &ExecutionGraph<'_>,
        runtime: &mut RuntimeContext,
    ) -> Result<(), SessionError> {
        let Some(node) = self.workflow.node(node_id) else {
            return Err(SessionError::NodeFailed {
                node_id: node_id.to_string(),
                label: node_id.to_string(),
                message: "node does not exist".to_string(),
            });
        };

        self.set_status(runtime, node_id, NodeStatus::Running);

        let input = runtime.input_for(graph.predecessors(node_id));
        tracing::debug!(node_id = %node.id, kind = %node.kind, "node started");
        self.event_tx.send_event(ExecutionEvent::node_started(
            &node.id,
            node.display_name(),
            node.kind.as_str(),
            input.clone(),
        ));

        let started = Instant::now();
        let prior = runtime.prior_results();
        let mut warnings = Vec::new();
        let outcome = nodes::execute(node, &input, &mut runtime.variables, &prior, &mut warnings);
        for warning in warnings {
            self.event_tx
                .send_event(ExecutionEvent::warning(warning, Some(node.id.clone())));
        }

        match outcome {
            Ok(result) => {
                if node.kind == NodeKind::SetVariable {
                    if let Some(name) = result.get("variable").and_then(Value::as_str) {
                        self.event_tx.send_event(ExecutionEvent::variable_set(
                            &node.id,
                            name,
                            result.get("value").cloned().unwrap_or(Value::Null),
                        ));
                    }
                }

                tracing::debug!(node_id = %node.id, "node succeeded");
                self.event_tx.send_event(ExecutionEvent::node_completed(
                    &node.id,
                    result.clone(),
                    started.elapsed(),
                ));
                runtime.record_result(&node.id, result);
                self.set_status(runtime, node_id, NodeStatus::Success);
                Ok(())
            }
            Err(err) => {
                tracing::error!(node_id = %node.id, error = %err.cause, "node failed");
                self.event_tx.send_event(ExecutionEvent::node_failed(
                    &err.node_id,
                    &err.label,
                    err.cause.to_string(),
                ));
                self.set_status(runtime, node_id, NodeStatus::Error);
                Err(err.into())
            }
        }
    }

    fn set_status(&self, runtime: &mut RuntimeContext, node_id: &str, status: NodeStatus) {
        runtime.set_status(node_id, status);
        self.event_tx
            .send_event(ExecutionEvent::status_changed(node_id, status));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::events::{progress_channel, LogLevel};
    use crate::parser::models::{Edge, Node};
    use serde_json::json;

    fn chain() -> WorkflowDefinition {
        WorkflowDefinition::new(
            vec![
                Node::new("start", NodeKind::Lambda)
                    .with_config("code", "function process(x) { return x }"),
                Node::new("double", NodeKind::Transform)
                    .with_label("Double")
                    .with_config("transform_type", "map")
                    .with_config("transform_function", "return item * 2"),
                Node::new("end", NodeKind::Lambda)
                    .with_config("code", "const process = (x) => x"),
            ],
            vec![Edge::new("start", "double"), Edge::new("double", "end")],
        )
    }

    #[tokio::test]
    async fn test_linear_chain() {
        let executor = WorkflowExecutor::from_workflow(&chain()).unwrap();
        assert_eq!(executor.order(), &["start", "double", "end"]);

        let result = executor.execute(json!([1, 2, 3]), VariableStore::new()).await;
        assert!(result.success);
        assert_eq!(result.final_output, json!([2, 4, 6]));
        assert_eq!(result.node_results["double"], json!([2, 4, 6]));
        assert!(result
            .statuses
            .values()
            .all(|status| *status == NodeStatus::Success));
    }

    #[tokio::test]
    async fn test_failure_aborts_remaining_nodes() {
        let mut workflow = chain();
        workflow.nodes[1] = Node::new("double", NodeKind::Transform)
            .with_label("Double")
            .with_config("transform_function", "return missing * 2");

        let executor = WorkflowExecutor::from_workflow(&workflow).unwrap();
        let result = executor.execute(json!([1]), VariableStore::new()).await;

        assert!(!result.success);
        assert_eq!(result.status("start"), NodeStatus::Success);
        assert_eq!(result.status("double"), NodeStatus::Error);
        assert_eq!(result.status("end"), NodeStatus::Pending);
        assert_eq!(result.final_output, Value::Null);

        let err = result.into_result().unwrap_err();
        assert_eq!(err.node_id(), "double");
        match err {
            SessionError::NodeFailed { label, message, .. } => {
                assert_eq!(label, "Double");
                assert!(message.starts_with("transform execution error"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_variables_flow_between_nodes() {
        let workflow = WorkflowDefinition::new(
            vec![
                Node::new("set", NodeKind::SetVariable)
                    .with_config("variable_name", "user")
                    .with_config("value_source", "input")
                    .with_config("input_path", "name"),
                Node::new("greet", NodeKind::Template).with_config("template", "Hi {{$user}}"),
            ],
            vec![Edge::new("set", "greet")],
        );

        let seed: VariableStore = vec![("unused", json!(1))].into_iter().collect();
        let result = WorkflowExecutor::from_workflow(&workflow)
            .unwrap()
            .execute(json!({"name": "Ada"}), seed)
            .await;

        let output = result.into_result().unwrap();
        assert_eq!(output.final_output["result"], "Hi Ada");
        assert_eq!(output.variables["user"], "Ada");
        assert_eq!(output.variables["unused"], 1);
    }

    #[tokio::test]
    async fn test_join_node_receives_latest_result() {
        let workflow = WorkflowDefinition::new(
            vec![
                Node::new("a", NodeKind::Lambda).with_config("code", "return 'a'"),
                Node::new("b", NodeKind::Lambda).with_config("code", "return 'b'"),
                Node::new("join", NodeKind::Lambda)
                    .with_config("code", "function process(x) { return x }"),
            ],
            vec![Edge::new("a", "join"), Edge::new("b", "join")],
        );

        let result = WorkflowExecutor::from_workflow(&workflow)
            .unwrap()
            .execute(json!(null), VariableStore::new())
            .await;
        assert_eq!(result.final_output, json!("b"));
    }

    #[tokio::test]
    async fn test_invalid_workflow_rejected_before_running() {
        let workflow = WorkflowDefinition::new(
            vec![Node::new("a", NodeKind::Lambda)],
            vec![Edge::new("a", "ghost")],
        );
        match WorkflowExecutor::from_workflow(&workflow) {
            Err(WorkflowError::Validation(errors)) => {
                assert!(errors.iter().any(|e| e.message.contains("ghost")));
            }
            other => panic!("expected validation error, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_cycle_rejected() {
        let workflow = WorkflowDefinition::new(
            vec![
                Node::new("a", NodeKind::Lambda),
                Node::new("b", NodeKind::Lambda),
            ],
            vec![Edge::new("a", "b"), Edge::new("b", "a")],
        );
        assert!(matches!(
            WorkflowExecutor::from_workflow(&workflow),
            Err(WorkflowError::Graph(_))
        ));
    }

    #[tokio::test]
    async fn test_events_emitted() {
        let (tx, mut rx) = progress_channel();
        let executor = WorkflowExecutor::from_workflow(&chain())
            .unwrap()
            .with_progress(tx);
        executor.execute(json!([1]), VariableStore::new()).await;
        drop(executor);

        let mut statuses = Vec::new();
        let mut completed = None;
        while let Some(event) = rx.recv().await {
            match event {
                ExecutionEvent::NodeStatusChanged { node_id, status } => {
                    statuses.push((node_id, status))
                }
                ExecutionEvent::WorkflowCompleted { success, .. } => completed = Some(success),
                _ => {}
            }
        }

        assert_eq!(statuses.len(), 6);
        assert_eq!(statuses[0], ("start".to_string(), NodeStatus::Running));
        assert_eq!(statuses[1], ("start".to_string(), NodeStatus::Success));
        assert_eq!(completed, Some(true));
    }

    #[tokio::test]
    async fn test_cancelled_token_runs_no_nodes() {
        let token = CancellationToken::new();
        token.cancel();

        let executor = WorkflowExecutor::from_workflow(&chain())
            .unwrap()
            .with_cancellation(token);
        let result = executor.execute(json!([1]), VariableStore::new()).await;

        assert!(!result.success);
        assert!(result.node_results.is_empty());
        assert_eq!(result.status("start"), NodeStatus::Pending);
        assert_eq!(result.status("double"), NodeStatus::Pending);
        assert_eq!(
            result.error,
            Some(SessionError::Cancelled {
                next_node: "start".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_cancelled_during_delay_stops_before_next_node() {
        let token = CancellationToken::new();
        let executor = WorkflowExecutor::from_workflow(&chain())
            .unwrap()
            .with_config(ExecutorConfig::default().with_node_delay(Duration::from_secs(30)))
            .with_cancellation(token.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            token.cancel();
        });
        let result = executor.execute(json!([1]), VariableStore::new()).await;
        canceller.await.unwrap();

        assert_eq!(result.status("start"), NodeStatus::Success);
        assert_eq!(result.status("double"), NodeStatus::Pending);
        assert_eq!(result.error.unwrap().node_id(), "double");
    }

    #[tokio::test]
    async fn test_simulated_node_emits_warning() {
        let workflow = WorkflowDefinition::new(
            vec![
                Node::new("fetch", "http"),
                Node::new("check", NodeKind::IfElse)
                    .with_config("condition_type", "expression")
                    .with_config("if_condition", "input.a.b"),
            ],
            vec![Edge::new("fetch", "check")],
        );
        let (tx, mut rx) = progress_channel();
        let executor = WorkflowExecutor::from_workflow(&workflow)
            .unwrap()
            .with_progress(tx);
        let result = executor.execute(json!({}), VariableStore::new()).await;
        drop(executor);
        assert!(result.success);

        let mut logs = Vec::new();
        while let Some(event) = rx.recv().await {
            if let ExecutionEvent::Log {
                level,
                message,
                node_id,
            } = event
            {
                logs.push((level, message, node_id));
            }
        }

        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].0, LogLevel::Warning);
        assert_eq!(logs[0].1, "\"http\" is an external integration; output is simulated");
        assert_eq!(logs[0].2.as_deref(), Some("fetch"));
        assert_eq!(logs[1].2.as_deref(), Some("check"));
        assert!(logs[1].1.contains("input.a.b"));
    }

    #[tokio::test]
    async fn test_node_delay_applies() {
        let executor = WorkflowExecutor::from_workflow(&chain())
            .unwrap()
            .with_config(ExecutorConfig::default().with_node_delay(Duration::from_millis(5)));
        let result = executor.execute(json!([1]), VariableStore::new()).await;
        assert!(result.success);
        assert!(result.duration >= Duration::from_millis(10));
    }

    #[tokio::test]
    async fn test_executor_reusable_across_sessions() {
        let executor = WorkflowExecutor::from_workflow(&chain()).unwrap();
        let first = executor.execute(json!([1]), VariableStore::new()).await;
        let second = executor.execute(json!([5]), VariableStore::new()).await;
        assert_eq!(first.final_output, json!([2]));
        assert_eq!(second.final_output, json!([10]));
    }

    #[test]
    fn test_executor_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<WorkflowExecutor>();
    }
}
