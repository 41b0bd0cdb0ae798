use std::path::Path;

use anyhow::Result;

use super::load_graph;

pub fn run(path: &Path) -> Result<()> {
    let graph = load_graph(path)?;
    let stats = graph.stats();

    println!("Nodes: {}", stats.nodes);
    println!("Edges: {}", stats.edges);
    for (node_type, count) in &stats.node_types {
        println!("  {node_type}: {count}");
    }
    Ok(())
}
