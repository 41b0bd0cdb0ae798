use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::source::SourceRef;
use crate::text::generate_id;

pub type Attributes = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum NodeType {
    Company,
    Platform,
    Service,
    Partner,
    Capability,
    Product,
    Event,
    Source,
    /// Anything else an extractor emits, carried verbatim.
    Other(String),
}

impl NodeType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Company => "Company",
            Self::Platform => "Platform",
            Self::Service => "Service",
            Self::Partner => "Partner",
            Self::Capability => "Capability",
            Self::Product => "Product",
            Self::Event => "Event",
            Self::Source => "Source",
            Self::Other(s) => s,
        }
    }

    /// Rank used when chunks disagree about an entity's type.
    #[must_use]
    pub const fn precedence(&self) -> u8 {
        match self {
            Self::Platform => 4,
            Self::Service => 3,
            Self::Partner => 2,
            Self::Company | Self::Capability => 1,
            _ => 0,
        }
    }

    /// Content types that receive `described_in` provenance edges.
    #[must_use]
    pub const fn is_core(&self) -> bool {
        matches!(
            self,
            Self::Company
                | Self::Platform
                | Self::Service
                | Self::Product
                | Self::Capability
                | Self::Partner
                | Self::Event
        )
    }

    pub(crate) fn entity_default() -> Self {
        Self::Other("Entity".to_string())
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NodeType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err(crate::Error::InvalidNodeType(s.to_string())),
            "Company" => Ok(Self::Company),
            "Platform" => Ok(Self::Platform),
            "Service" => Ok(Self::Service),
            "Partner" => Ok(Self::Partner),
            "Capability" => Ok(Self::Capability),
            "Product" => Ok(Self::Product),
            "Event" => Ok(Self::Event),
            "Source" => Ok(Self::Source),
            other => Ok(Self::Other(other.to_string())),
        }
    }
}

impl TryFrom<String> for NodeType {
    type Error = crate::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NodeType> for String {
    fn from(value: NodeType) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub label: String,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub sources: Vec<SourceRef>,
}

impl Node {
    #[must_use]
    pub fn new(label: impl Into<String>, node_type: NodeType) -> Self {
        let label = label.into();
        Self {
            id: generate_id(&label, node_type.as_str()),
            node_type,
            label,
            attributes: Attributes::new(),
            sources: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: SourceRef) -> Self {
        self.add_source(source);
        self
    }

    /// Adds the record unless the same `(chunk_id, page)` is already present.
    pub fn add_source(&mut self, source: SourceRef) -> bool {
        crate::source::push_unique(&mut self.sources, source)
    }

    /// Upgrades the type when `incoming` ranks strictly higher. The id follows.
    pub fn promote(&mut self, incoming: &NodeType) -> bool {
        if incoming.precedence() <= self.node_type.precedence() {
            return false;
        }

        self.node_type = incoming.clone();
        self.refresh_id();
        true
    }

    /// Changes type unconditionally (reclassification), recomputing the id.
    pub fn retype(&mut self, node_type: NodeType) {
        self.node_type = node_type;
        self.refresh_id();
    }

    pub fn relabel(&mut self, label: impl Into<String>) {
        self.label = label.into();
        self.refresh_id();
    }

    #[must_use]
    pub fn expected_id(&self) -> String {
        generate_id(&self.label, self.node_type.as_str())
    }

    fn refresh_id(&mut self) {
        self.id = self.expected_id();
    }

    pub(crate) fn sort_key(&self) -> (&str, &str, &str) {
        (self.node_type.as_str(), &self.label, &self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_follows_label_and_type() {
        let mut node = Node::new("NovaCloud", NodeType::Company);
        assert_eq!(node.id, "company_novacloud");

        assert!(node.promote(&NodeType::Platform));
        assert_eq!(node.id, "platform_novacloud");

        node.relabel("NovaCloud Platform");
        assert_eq!(node.id, "platform_novacloud_platform");
    }

    #[test]
    fn test_promote_never_downgrades() {
        let mut node = Node::new("NovaCloud", NodeType::Platform);

        assert!(!node.promote(&NodeType::Company));
        assert!(!node.promote(&NodeType::Service));
        assert!(!node.promote(&NodeType::Platform));
        assert_eq!(node.node_type, NodeType::Platform);
        assert_eq!(node.id, "platform_novacloud");
    }

    #[test]
    fn test_equal_rank_keeps_first_type() {
        let mut node = Node::new("Machine Learning", NodeType::Capability);
        assert!(!node.promote(&NodeType::Company));
        assert_eq!(node.node_type, NodeType::Capability);
    }

    #[test]
    fn test_node_type_round_trip_and_other() {
        assert_eq!("Platform".parse::<NodeType>().unwrap(), NodeType::Platform);
        assert_eq!(
            "Person".parse::<NodeType>().unwrap(),
            NodeType::Other("Person".into())
        );
        assert!("".parse::<NodeType>().is_err());
        assert_eq!(NodeType::Other("Person".into()).precedence(), 0);
    }

    #[test]
    fn test_add_source_is_idempotent() {
        let mut node = Node::new("TechNova", NodeType::Company);
        assert!(node.add_source(SourceRef::new("chunk_001", 10)));
        assert!(!node.add_source(SourceRef::new("chunk_001", 10)));
        assert!(node.add_source(SourceRef::new("chunk_001", 11)));
        assert_eq!(node.sources.len(), 2);
    }

    #[test]
    fn test_node_serialization_uses_type_key() {
        let node = Node::new("TechNova", NodeType::Company)
            .with_source(SourceRef::new("chunk_001", 10));
        let json = serde_json::to_value(&node).unwrap();

        assert_eq!(json["type"], "Company");
        assert_eq!(json["sources"][0]["chunk_id"], "chunk_001");
        assert_eq!(json["sources"][0]["page"], 10);
    }
}
