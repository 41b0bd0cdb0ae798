//! A three-page company prospectus used by `kgraph demo` and the tests.

use crate::source::Chunk;

pub const SAMPLE_DOCUMENT: &str = "TechNova_Annual_Report_2024.pdf";

#[must_use]
pub fn sample_chunks() -> Vec<Chunk> {
    vec![
        Chunk::new(
            "chunk_001",
            10,
            "TechNova Inc. was founded in 2015 and is headquartered in San Francisco.\n\
             The company operates a cloud platform called NovaCloud that offers scalable storage solutions.\n\
             TechNova has partnered with DataFlow Systems.",
        ),
        Chunk::new(
            "chunk_002",
            25,
            "In 2020, TechNova launched its AI-powered analytics service,\n\
             which is integrated with the NovaCloud platform.",
        ),
        Chunk::new(
            "chunk_003",
            42,
            "TechNova acquired QuantumAI in 2023, a startup specializing in quantum computing.\n\
             This acquisition enabled new capabilities in machine learning.",
        ),
    ]
}
