use workflow_service::{NodeStatus, VariableStore, WorkflowExecutor, WorkflowParser};

use serde_json::json;

#[tokio::main]
async fn main() {
    let yaml = r#"
nodes:
  - id: pick
    type: filter
    label: Active users
    config:
      filter_condition: item.active
  - id: names
    type: transform
    config:
      transform_type: map
      transform_function: return item.name
  - id: greet
    type: template
    config:
      template: "{{ $greeting }} {{ input.0 }}"
edges:
  - source: pick
    target: names
  - source: names
    target: greet
"#;

    let workflow = WorkflowParser::parse_yaml(yaml).expect("Failed to parse");
    let summary = workflow.summary();
    println!("✓ Parsed workflow");
    println!("✓ Nodes: {}, edges: {}", summary.total_nodes, summary.total_edges);

    let executor = WorkflowExecutor::from_workflow(&workflow).expect("Invalid workflow");
    println!("✓ Execution order: {}", executor.order().join(" -> "));

    let input = json!([
        {"name": "Ada", "active": true},
        {"name": "Bob", "active": false}
    ]);
    let seed: VariableStore = vec![("greeting", json!("Hello"))].into_iter().collect();

    println!("\n🚀 Running preview session...\n");
    let result = executor.execute(input, seed).await;

    for node_id in &result.order {
        let status_icon = match result.status(node_id) {
            NodeStatus::Success => "✓",
            NodeStatus::Error => "✗",
            _ => "•",
        };
        println!("  {} {} - {:?}", status_icon, node_id, result.status(node_id));
    }

    println!("\nFinal output: {}", result.final_output);
}
