use std::path::Path;

use anyhow::{bail, Result};
use console::style;

use super::load_graph;

pub fn run(path: &Path) -> Result<()> {
    let graph = load_graph(path)?;
    let violations = graph.validate();

    if violations.is_empty() {
        eprintln!(
            "{} {} nodes, {} edges, no violations",
            style("✓").green(),
            graph.nodes.len(),
            graph.edges.len()
        );
        return Ok(());
    }

    for violation in &violations {
        eprintln!("  {} {violation}", style("✗").red().bold());
    }
    bail!("{} violation(s) in {}", violations.len(), path.display())
}
