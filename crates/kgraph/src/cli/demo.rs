use anyhow::Result;
use kgraph_core::sample::{sample_chunks, SAMPLE_DOCUMENT};
use kgraph_core::{ExtractionStrategy, IngestPipeline, PipelineConfig};

use super::{emit, Format};

pub async fn run(format: Format) -> Result<()> {
    let config = PipelineConfig::default()
        .with_extractor(ExtractionStrategy::RuleBased)
        .with_document_name(SAMPLE_DOCUMENT);

    let output = IngestPipeline::from_config(&config)?
        .ingest(&sample_chunks())
        .await?;

    emit(None, &format.render(&output.graph)?)
}
