use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid node type: {0}")]
    InvalidNodeType(String),

    #[error("Invalid relation: {0}")]
    InvalidRelation(String),

    #[error("Self-referential edge not allowed: {0}")]
    SelfReference(String),

    #[error("Unknown export format: {0} (expected mermaid or dot)")]
    UnknownFormat(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
