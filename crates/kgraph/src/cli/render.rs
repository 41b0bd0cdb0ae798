use std::path::Path;

use anyhow::Result;

use super::{emit, load_graph, Format};

pub fn run(path: &Path, format: Format) -> Result<()> {
    let graph = load_graph(path)?;
    emit(None, &format.render(&graph)?)
}
