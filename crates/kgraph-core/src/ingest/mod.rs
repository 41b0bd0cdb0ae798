mod assembler;
mod builder;
mod extractor;
mod llm;
mod merger;
mod normalizer;
mod pipeline;
mod provenance;

pub use assembler::{assemble, Assembler};
pub use builder::{assemble_graph, build_graph};
pub use extractor::{
    ChunkExtraction, EventKind, ExtractedEntity, ExtractedEvent, ExtractedRelation,
    ExtractionError, ExtractionOutput, ExtractionResult, ExtractionStrategy, Extractor,
    RuleBasedExtractor,
};
pub use llm::LlmExtractor;
pub use merger::{merge_entities, EntityMerger, MergedEntities, NameIndex};
pub use normalizer::{
    merge_aliases, normalize_graph, normalize_llm_graph, reclassify_partners, GraphNormalizer,
    IdRemap, LlmNormalizer, StructuralNormalizer,
};
pub use pipeline::{IngestError, IngestOutput, IngestPipeline, IngestResult, IngestStats};
pub use provenance::attach_provenance;
