use std::time::Instant;

use thiserror::Error;

use super::builder::build_graph;
use super::extractor::{
    ChunkExtraction, ExtractionError, ExtractionOutput, ExtractionStrategy, Extractor,
    RuleBasedExtractor,
};
use super::llm::LlmExtractor;
use super::normalizer::{GraphNormalizer, LlmNormalizer};
use crate::config::{ConfigError, PipelineConfig, DEFAULT_DOCUMENT};
use crate::graph::Graph;
use crate::source::Chunk;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Extraction error in chunk {chunk_id}: {source}")]
    Extraction {
        chunk_id: String,
        #[source]
        source: ExtractionError,
    },
    #[error("Extractor setup failed: {0}")]
    Setup(#[from] ExtractionError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type IngestResult<T> = Result<T, IngestError>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub chunks_processed: usize,
    pub chunks_skipped: usize,
    pub chunks_failed: usize,
    pub entities_extracted: usize,
    pub relations_extracted: usize,
    pub events_extracted: usize,
    pub nodes: usize,
    pub edges: usize,
    pub duration_ms: u64,
}

impl IngestStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn total_records(&self) -> usize {
        self.entities_extracted + self.relations_extracted + self.events_extracted
    }

    fn record(&mut self, extraction: &ExtractionOutput) {
        self.chunks_processed += 1;
        self.entities_extracted += extraction.entities.len();
        self.relations_extracted += extraction.relations.len();
        self.events_extracted += extraction.events.len();
    }
}

pub struct IngestOutput {
    pub graph: Graph,
    pub extractions: Vec<ChunkExtraction>,
    pub stats: IngestStats,
}

/// Chunks in, normalized graph out.
///
/// Chunks are extracted one at a time in input order. Blank chunks are
/// skipped. A failing chunk aborts the run in strict mode; otherwise it is
/// logged and contributes an empty extraction.
pub struct IngestPipeline {
    extractor: Box<dyn Extractor>,
    normalizers: Vec<Box<dyn GraphNormalizer>>,
    document_name: String,
    strict: bool,
}

impl IngestPipeline {
    #[must_use]
    pub fn new(extractor: Box<dyn Extractor>) -> Self {
        Self {
            extractor,
            normalizers: Vec::new(),
            document_name: DEFAULT_DOCUMENT.to_string(),
            strict: false,
        }
    }

    /// Builds the extractor the config asks for. LLM extraction also gets the
    /// LLM normalization pass.
    pub fn from_config(config: &PipelineConfig) -> IngestResult<Self> {
        config.validate()?;

        let pipeline = match config.extractor {
            ExtractionStrategy::RuleBased => Self::new(Box::new(RuleBasedExtractor::new()?)),
            ExtractionStrategy::LlmBased => {
                Self::new(Box::new(LlmExtractor::new(config.llm.clone())?))
                    .with_normalizer(Box::new(LlmNormalizer))
            }
        };

        Ok(pipeline
            .with_document_name(config.document_name.clone())
            .with_strict(config.strict))
    }

    #[must_use]
    pub fn with_normalizer(mut self, normalizer: Box<dyn GraphNormalizer>) -> Self {
        self.normalizers.push(normalizer);
        self
    }

    #[must_use]
    pub fn with_document_name(mut self, name: impl Into<String>) -> Self {
        self.document_name = name.into();
        self
    }

    #[must_use]
    pub const fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    #[must_use]
    pub fn strategy(&self) -> ExtractionStrategy {
        self.extractor.strategy()
    }

    pub async fn extract_all(
        &self,
        chunks: &[Chunk],
        stats: &mut IngestStats,
    ) -> IngestResult<Vec<ChunkExtraction>> {
        let mut extractions = Vec::with_capacity(chunks.len());

        for chunk in chunks {
            if chunk.is_blank() {
                tracing::debug!(chunk_id = %chunk.chunk_id, "Skipping blank chunk");
                stats.chunks_skipped += 1;
                continue;
            }

            let extraction = match self.extractor.extract(chunk).await {
                Ok(extraction) => extraction,
                Err(source) if self.strict => {
                    return Err(IngestError::Extraction {
                        chunk_id: chunk.chunk_id.clone(),
                        source,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        chunk_id = %chunk.chunk_id,
                        "Extraction failed, continuing with empty result: {}",
                        e
                    );
                    stats.chunks_failed += 1;
                    ExtractionOutput::new()
                }
            };

            stats.record(&extraction);
            extractions.push(ChunkExtraction::new(
                chunk.chunk_id.clone(),
                chunk.page,
                extraction,
            ));
        }

        Ok(extractions)
    }

    pub async fn ingest(&self, chunks: &[Chunk]) -> IngestResult<IngestOutput> {
        let start = Instant::now();
        let mut stats = IngestStats::new();

        let extractions = self.extract_all(chunks, &mut stats).await?;

        let mut graph = build_graph(&extractions, &self.document_name);
        for normalizer in &self.normalizers {
            tracing::debug!("Applying {} normalizer", normalizer.name());
            graph = normalizer.normalize(graph);
        }

        stats.nodes = graph.nodes.len();
        stats.edges = graph.edges.len();
        stats.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        tracing::info!(
            strategy = %self.strategy(),
            chunks = stats.chunks_processed,
            skipped = stats.chunks_skipped,
            failed = stats.chunks_failed,
            nodes = stats.nodes,
            edges = stats.edges,
            "Built knowledge graph"
        );

        Ok(IngestOutput {
            graph,
            extractions,
            stats,
        })
    }
}
