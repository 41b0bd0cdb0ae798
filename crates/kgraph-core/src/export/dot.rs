use std::collections::HashMap;

use petgraph::dot::Dot;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::graph::Graph;

/// Node weights read `label (type)`, edge weights are relation names.
/// Edges with an endpoint missing from `graph.nodes` are skipped.
#[must_use]
pub fn to_petgraph(graph: &Graph) -> DiGraph<String, String> {
    let mut out = DiGraph::with_capacity(graph.nodes.len(), graph.edges.len());
    let mut index: HashMap<&str, NodeIndex> = HashMap::with_capacity(graph.nodes.len());

    for node in &graph.nodes {
        let idx = out.add_node(format!("{} ({})", node.label, node.node_type));
        index.insert(node.id.as_str(), idx);
    }

    for edge in &graph.edges {
        if let (Some(&from), Some(&to)) = (
            index.get(edge.from_id.as_str()),
            index.get(edge.to_id.as_str()),
        ) {
            out.add_edge(from, to, edge.relation.to_string());
        }
    }

    out
}

#[must_use]
pub fn render_dot(graph: &Graph) -> String {
    format!("{}", Dot::new(&to_petgraph(graph)))
}
