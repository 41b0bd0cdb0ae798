use std::fs;

use anyhow::{Context, Result};
use console::style;
use kgraph_core::{Chunk, ExportFormat, IngestPipeline, PipelineConfig};

use super::{emit, BuildArgs};

pub async fn run(args: BuildArgs) -> Result<()> {
    let mut config = PipelineConfig::from_env()?;
    if let Some(extractor) = args.extractor {
        config = config.with_extractor(extractor);
    }
    if let Some(document) = args.document {
        config = config.with_document_name(document);
    }
    if args.strict {
        config = config.with_strict(true);
    }

    let json = fs::read_to_string(&args.chunks)
        .with_context(|| format!("Failed to read {}", args.chunks.display()))?;
    let chunks = Chunk::list_from_json(&json)
        .with_context(|| format!("{} is not a JSON array of chunks", args.chunks.display()))?;

    let pipeline = IngestPipeline::from_config(&config)?;
    let output = pipeline.ingest(&chunks).await?;
    let graph = &output.graph;

    emit(args.output.as_deref(), &graph.to_json_pretty()?)?;

    if let Some(path) = &args.mermaid {
        emit(Some(path), &ExportFormat::Mermaid.render(graph))?;
    }
    if let Some(path) = &args.dot {
        emit(Some(path), &ExportFormat::Dot.render(graph))?;
    }

    let stats = &output.stats;
    eprintln!(
        "{} Built graph with {} ({})",
        style("✓").green(),
        style(config.extractor.as_str()).bold(),
        config.document_name
    );
    eprintln!("  Chunks: {}", stats.chunks_processed);
    if stats.chunks_skipped > 0 {
        eprintln!("  Skipped blank: {}", stats.chunks_skipped);
    }
    if stats.chunks_failed > 0 {
        eprintln!(
            "  {} {} chunk(s) failed extraction",
            style("!").yellow(),
            stats.chunks_failed
        );
    }
    eprintln!("  Nodes: {}", stats.nodes);
    eprintln!("  Edges: {}", stats.edges);

    Ok(())
}
