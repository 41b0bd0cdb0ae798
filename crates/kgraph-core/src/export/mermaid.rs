use std::fmt::Write;

use serde_json::Value;

use crate::graph::Graph;
use crate::node::{Node, NodeType};

/// Subgraph title, node type and style class, in reading order.
const GROUPS: [(&str, NodeType, &str); 7] = [
    ("Companies", NodeType::Company, "company"),
    ("Platforms", NodeType::Platform, "platform"),
    ("Services", NodeType::Service, "service"),
    ("Partners", NodeType::Partner, "partner"),
    ("Capabilities", NodeType::Capability, "capability"),
    ("Events", NodeType::Event, "event"),
    ("Sources", NodeType::Source, "source"),
];

const CLASS_DEFS: &str = "    classDef company    fill:#e3f2fd,stroke:#1976d2,stroke-width:2px
    classDef platform   fill:#f3e5f5,stroke:#7b1fa2,stroke-width:2px
    classDef service    fill:#e8f5e9,stroke:#388e3c,stroke-width:2px
    classDef partner    fill:#fff3e0,stroke:#f57c00,stroke-width:2px
    classDef capability fill:#f1f8e9,stroke:#689f38,stroke-width:2px
    classDef event      fill:#ffebee,stroke:#d32f2f,stroke-width:2px
    classDef source     fill:#f5f5f5,stroke:#616161,stroke-width:1px";

/// Mermaid `graph TD` flowchart grouped by node type.
///
/// Nodes of types without a group (Product, custom types) are not drawn,
/// though edges touching them still are.
#[must_use]
pub fn render_mermaid(graph: &Graph) -> String {
    let mut out = String::from("graph TD\n");

    for (title, node_type, _) in &GROUPS {
        let mut nodes: Vec<&Node> = graph.nodes_of_type(node_type).collect();
        if nodes.is_empty() {
            continue;
        }
        nodes.sort_by(|a, b| a.label.cmp(&b.label));

        let _ = writeln!(out, "    subgraph {title}");
        for node in nodes {
            let _ = writeln!(out, "        {}[\"{}\"]", node.id, node_text(node));
        }
        out.push_str("    end\n");
    }

    out.push('\n');
    let mut edges: Vec<_> = graph.edges.iter().collect();
    edges.sort_by(|a, b| (&a.from_id, a.relation.as_str()).cmp(&(&b.from_id, b.relation.as_str())));
    for edge in edges {
        let _ = writeln!(out, "    {} -->|{}| {}", edge.from_id, edge.relation, edge.to_id);
    }

    out.push_str("\n    %% styling\n");
    for (_, node_type, class) in &GROUPS {
        let ids: Vec<&str> = graph.nodes_of_type(node_type).map(|n| n.id.as_str()).collect();
        if !ids.is_empty() {
            let _ = writeln!(out, "    class {} {class}", ids.join(","));
        }
    }
    out.push_str(CLASS_DEFS);
    out.push('\n');

    out
}

fn node_text(node: &Node) -> String {
    let mut text = escape(&node.label);
    for (key, value) in &node.attributes {
        if let Some(value) = display_value(value) {
            let _ = write!(text, "<br/>{key}: {}", escape(&value));
        }
    }
    text
}

/// `None` for values that would read as empty (null, false, 0, "", []).
fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::Bool(true) => Some("true".into()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) if items.is_empty() => None,
        Value::Array(items) => Some(
            items
                .iter()
                .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_string))
                .collect::<Vec<_>>()
                .join(", "),
        ),
        Value::Object(map) if map.is_empty() => None,
        Value::Object(_) => Some(value.to_string()),
    }
}

fn escape(text: &str) -> String {
    text.replace('"', "#quot;")
}
