use std::path::Path;

use anyhow::Result;
use console::style;
use kgraph_core::retrieve_chunks;

use super::load_graph;

pub fn run(path: &Path, text: &str) -> Result<()> {
    let graph = load_graph(path)?;
    let chunks = retrieve_chunks(text, &graph);

    if chunks.is_empty() {
        eprintln!("{} No chunks mention '{text}'", style("○").dim());
        return Ok(());
    }

    for chunk in chunks {
        println!("{chunk}");
    }
    Ok(())
}
