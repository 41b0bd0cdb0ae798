use super::assembler::assemble;
use super::extractor::ChunkExtraction;
use super::merger::merge_entities;
use super::normalizer::normalize_graph;
use super::provenance::attach_provenance;
use crate::graph::Graph;

/// Merge, assemble and attach provenance, without normalizing.
#[must_use]
pub fn assemble_graph(extractions: &[ChunkExtraction], document_name: &str) -> Graph {
    let merged = merge_entities(extractions);
    let (mut nodes, mut edges) = assemble(merged, extractions);
    attach_provenance(&mut nodes, &mut edges, extractions, document_name);

    Graph::new(nodes, edges.into_vec())
}

/// The whole core: per-chunk extractions in, a normalized graph out.
///
/// Pure and deterministic; the same extractions always produce the same
/// graph, regardless of which process or thread runs it.
#[must_use]
pub fn build_graph(extractions: &[ChunkExtraction], document_name: &str) -> Graph {
    let graph = assemble_graph(extractions, document_name);
    tracing::debug!(
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        "Assembled graph before normalization"
    );

    normalize_graph(graph)
}
