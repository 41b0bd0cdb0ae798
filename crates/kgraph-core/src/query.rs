use std::collections::BTreeSet;

use crate::graph::Graph;
use crate::node::Node;

/// Chunk ids relevant to `query`, sorted and deduplicated.
///
/// A node matches when its label or any attribute value contains the query,
/// case-insensitively. An edge matches on its relation name and contributes
/// the sources of both endpoints.
#[must_use]
pub fn retrieve_chunks(query: &str, graph: &Graph) -> Vec<String> {
    let needle = query.trim().to_lowercase();
    let mut chunks = BTreeSet::new();

    let mut collect = |node: &Node| {
        for source in &node.sources {
            chunks.insert(source.chunk_id.clone());
        }
    };

    for node in graph.nodes.iter().filter(|n| node_matches(n, &needle)) {
        collect(node);
    }

    for edge in &graph.edges {
        if !edge.relation.as_str().contains(&needle) {
            continue;
        }
        for node in graph
            .nodes
            .iter()
            .filter(|n| n.id == edge.from_id || n.id == edge.to_id)
        {
            collect(node);
        }
    }

    chunks.into_iter().collect()
}

fn node_matches(node: &Node, needle: &str) -> bool {
    node.label.to_lowercase().contains(needle)
        || node.attributes.values().any(|v| {
            let text = v.as_str().map_or_else(|| v.to_string(), str::to_string);
            text.to_lowercase().contains(needle)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeType;
    use crate::relation::{Edge, Relation};
    use crate::source::SourceRef;

    fn graph() -> Graph {
        let mut quantum = Node::new("QuantumAI", NodeType::Company)
            .with_source(SourceRef::new("chunk_003", 42));
        quantum
            .attributes
            .insert("focus".into(), "Quantum Computing".into());

        Graph::new(
            vec![
                Node::new("AI-powered analytics service", NodeType::Service)
                    .with_source(SourceRef::new("chunk_002", 25)),
                Node::new("NovaCloud", NodeType::Platform)
                    .with_source(SourceRef::new("chunk_001", 10))
                    .with_source(SourceRef::new("chunk_002", 25)),
                quantum,
            ],
            vec![Edge::new(
                "service_ai_powered_analytics_service",
                "platform_novacloud",
                Relation::IntegratedWith,
            )
            .unwrap()],
        )
    }

    #[test]
    fn test_label_match() {
        assert_eq!(retrieve_chunks("Analytics Service", &graph()), ["chunk_002"]);
    }

    #[test]
    fn test_attribute_match() {
        assert_eq!(retrieve_chunks("quantum computing", &graph()), ["chunk_003"]);
    }

    #[test]
    fn test_relation_match_pulls_both_endpoints() {
        assert_eq!(
            retrieve_chunks("integrated", &graph()),
            ["chunk_001", "chunk_002"]
        );
    }

    #[test]
    fn test_no_match() {
        assert!(retrieve_chunks("blockchain", &graph()).is_empty());
    }
}
