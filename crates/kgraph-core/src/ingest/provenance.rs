use std::collections::HashSet;

use super::extractor::ChunkExtraction;
use crate::node::{Node, NodeType};
use crate::relation::{EdgeSet, Relation};
use crate::source::{source_node, source_node_id};

/// Adds one Source node per distinct chunk and a `described_in` edge from
/// every core node to each chunk it was observed in.
///
/// Running it twice over the same graph adds nothing the second time.
pub fn attach_provenance(
    nodes: &mut Vec<Node>,
    edges: &mut EdgeSet,
    extractions: &[ChunkExtraction],
    document: &str,
) {
    let mut known: HashSet<String> = nodes
        .iter()
        .filter(|n| n.node_type == NodeType::Source)
        .map(|n| n.id.clone())
        .collect();

    for chunk in extractions {
        let id = source_node_id(&chunk.chunk_id);
        if known.insert(id) {
            nodes.push(source_node(&chunk.chunk_id, chunk.page, document));
        }
    }

    let mut linked = 0usize;
    for node in nodes.iter().filter(|n| n.node_type.is_core()) {
        for source in &node.sources {
            let source_id = source_node_id(&source.chunk_id);
            if !known.contains(&source_id) {
                continue;
            }
            if !edges.contains(&node.id, &source_id, Relation::DescribedIn)
                && edges.upsert(&node.id, &source_id, Relation::DescribedIn, source.clone())
            {
                linked += 1;
            }
        }
    }

    tracing::debug!("Attached {} provenance edges", linked);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::extractor::ExtractionOutput;
    use crate::source::SourceRef;

    fn chunks() -> Vec<ChunkExtraction> {
        vec![
            ChunkExtraction::new("chunk_001", 1, ExtractionOutput::new()),
            ChunkExtraction::new("chunk_002", 2, ExtractionOutput::new()),
            ChunkExtraction::new("chunk_001", 1, ExtractionOutput::new()),
        ]
    }

    #[test]
    fn test_source_nodes_and_links() {
        let mut nodes = vec![
            Node::new("NovaCloud", NodeType::Platform)
                .with_source(SourceRef::new("chunk_001", 1))
                .with_source(SourceRef::new("chunk_002", 2)),
            Node::new("Acquisition of QuantumAI", NodeType::Event)
                .with_source(SourceRef::new("chunk_002", 2)),
        ];
        let mut edges = EdgeSet::new();

        attach_provenance(&mut nodes, &mut edges, &chunks(), "report.pdf");

        let sources: Vec<&Node> = nodes.iter().filter(|n| n.node_type == NodeType::Source).collect();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].id, "source_chunk_001");
        assert_eq!(sources[0].attributes["document"], "report.pdf");
        assert_eq!(sources[0].label, "Chunk chunk_001 (page 1)");

        assert_eq!(edges.len(), 3);
        assert!(edges.contains(
            "event_acquisition_of_quantumai",
            "source_chunk_002",
            Relation::DescribedIn
        ));
        assert!(edges.contains("platform_novacloud", "source_chunk_001", Relation::DescribedIn));
        assert!(edges.contains("platform_novacloud", "source_chunk_002", Relation::DescribedIn));
    }

    #[test]
    fn test_idempotent() {
        let mut nodes = vec![Node::new("Machine Learning", NodeType::Capability)
            .with_source(SourceRef::new("chunk_001", 1))];
        let mut edges = EdgeSet::new();

        attach_provenance(&mut nodes, &mut edges, &chunks(), "report.pdf");
        let (node_count, edge_count) = (nodes.len(), edges.len());
        attach_provenance(&mut nodes, &mut edges, &chunks(), "report.pdf");

        assert_eq!(nodes.len(), node_count);
        assert_eq!(edges.len(), edge_count);
    }

    #[test]
    fn test_unknown_chunk_not_linked() {
        let mut nodes = vec![Node::new("TechNova", NodeType::Company)
            .with_source(SourceRef::new("chunk_999", 9))];
        let mut edges = EdgeSet::new();

        attach_provenance(&mut nodes, &mut edges, &chunks(), "report.pdf");
        assert!(edges.is_empty());
    }
}
