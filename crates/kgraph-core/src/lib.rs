pub mod config;
pub mod error;
pub mod export;
pub mod graph;
pub mod ingest;
pub mod node;
pub mod query;
pub mod relation;
pub mod sample;
pub mod source;
pub mod text;

pub use config::{ConfigError, LlmConfig, PipelineConfig};
pub use error::{Error, Result};
pub use export::{render_dot, render_mermaid, ExportFormat};
pub use graph::{Graph, GraphStats, Violation};
pub use ingest::{
    build_graph, normalize_graph, normalize_llm_graph, ChunkExtraction, ExtractionOutput,
    ExtractionStrategy, Extractor, IngestPipeline,
};
pub use node::{Attributes, Node, NodeType};
pub use query::retrieve_chunks;
pub use relation::{Edge, EdgeSet, Relation};
pub use source::{Chunk, SourceRef};
