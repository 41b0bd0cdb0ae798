use serde::{Deserialize, Serialize};

use crate::node::{Attributes, Node, NodeType};

/// Where a node or edge was observed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceRef {
    pub chunk_id: String,
    pub page: u32,
}

impl SourceRef {
    #[must_use]
    pub fn new(chunk_id: impl Into<String>, page: u32) -> Self {
        Self {
            chunk_id: chunk_id.into(),
            page,
        }
    }
}

/// Appends `source` unless an equal record is already present.
pub(crate) fn push_unique(sources: &mut Vec<SourceRef>, source: SourceRef) -> bool {
    if sources.contains(&source) {
        return false;
    }
    sources.push(source);
    true
}

/// A unit of text handed to an extractor, typically one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: String,
    pub page: u32,
    pub text: String,
}

impl Chunk {
    #[must_use]
    pub fn new(chunk_id: impl Into<String>, page: u32, text: impl Into<String>) -> Self {
        Self {
            chunk_id: chunk_id.into(),
            page,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn source_ref(&self) -> SourceRef {
        SourceRef::new(self.chunk_id.clone(), self.page)
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Parses a JSON array of `{chunk_id, page, text}` objects.
    pub fn list_from_json(json: &str) -> crate::Result<Vec<Self>> {
        Ok(serde_json::from_str(json)?)
    }
}

#[must_use]
pub fn source_node_id(chunk_id: &str) -> String {
    format!("source_{chunk_id}")
}

/// The per-chunk Source node. Its id is not label-derived.
#[must_use]
pub fn source_node(chunk_id: &str, page: u32, document: &str) -> Node {
    let mut attributes = Attributes::new();
    attributes.insert("chunk_id".into(), chunk_id.into());
    attributes.insert("page".into(), page.into());
    attributes.insert("document".into(), document.into());

    Node {
        id: source_node_id(chunk_id),
        node_type: NodeType::Source,
        label: format!("Chunk {chunk_id} (page {page})"),
        attributes,
        sources: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_node_shape() {
        let node = source_node("chunk_001", 10, "report.pdf");

        assert_eq!(node.id, "source_chunk_001");
        assert_eq!(node.node_type, NodeType::Source);
        assert_eq!(node.label, "Chunk chunk_001 (page 10)");
        assert_eq!(node.attributes["page"], 10);
        assert_eq!(node.attributes["document"], "report.pdf");
        assert!(node.sources.is_empty());
    }

    #[test]
    fn test_push_unique() {
        let mut sources = vec![SourceRef::new("a", 1)];
        assert!(!push_unique(&mut sources, SourceRef::new("a", 1)));
        assert!(push_unique(&mut sources, SourceRef::new("b", 1)));
        assert_eq!(sources.len(), 2);
    }

    #[test]
    fn test_blank_chunk() {
        assert!(Chunk::new("c", 1, "  \n\t").is_blank());
        assert!(!Chunk::new("c", 1, "TechNova").is_blank());
    }

    #[test]
    fn test_chunk_list_from_json() {
        let chunks = Chunk::list_from_json(
            r#"[{"chunk_id": "chunk_001", "page": 10, "text": "TechNova"}]"#,
        )
        .unwrap();
        assert_eq!(chunks, [Chunk::new("chunk_001", 10, "TechNova")]);

        assert!(Chunk::list_from_json(r#"{"chunk_id": "chunk_001"}"#).is_err());
    }
}
