use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::node::{Node, NodeType};
use crate::relation::Edge;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    pub node_types: BTreeMap<String, usize>,
}

/// A structural rule a graph breaks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    SelfLoop(String),
    UncontrolledRelation { from_id: String, to_id: String, relation: String },
    DuplicateEdge { from_id: String, to_id: String, relation: String },
    DuplicateNode(String),
    DuplicateSource(String),
    DanglingEndpoint { edge: String, missing: String },
    MissingProvenance(String),
    StaleId { id: String, expected: String },
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelfLoop(id) => write!(f, "self-loop on {id}"),
            Self::UncontrolledRelation { from_id, to_id, relation } => {
                write!(f, "relation {relation} outside vocabulary: {from_id} -> {to_id}")
            }
            Self::DuplicateEdge { from_id, to_id, relation } => {
                write!(f, "duplicate edge {from_id} -{relation}-> {to_id}")
            }
            Self::DuplicateNode(id) => write!(f, "duplicate node id {id}"),
            Self::DuplicateSource(owner) => write!(f, "duplicate provenance on {owner}"),
            Self::DanglingEndpoint { edge, missing } => {
                write!(f, "edge {edge} references missing node {missing}")
            }
            Self::MissingProvenance(id) => write!(f, "node {id} has no provenance"),
            Self::StaleId { id, expected } => write!(f, "node id {id} should be {expected}"),
        }
    }
}

impl Graph {
    #[must_use]
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn nodes_of_type<'a>(&'a self, node_type: &'a NodeType) -> impl Iterator<Item = &'a Node> {
        self.nodes.iter().filter(move |n| &n.node_type == node_type)
    }

    #[must_use]
    pub fn has_edge(&self, from_id: &str, to_id: &str, relation: crate::Relation) -> bool {
        self.edges
            .iter()
            .any(|e| e.from_id == from_id && e.to_id == to_id && e.relation == relation)
    }

    /// Nodes by `(type, label, id)`, edges by `(from_id, relation, to_id)`,
    /// provenance lists by `(chunk_id, page)`.
    pub fn sort(&mut self) {
        for node in &mut self.nodes {
            node.sources.sort();
        }
        for edge in &mut self.edges {
            edge.sources.sort();
        }
        self.nodes.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        self.edges.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    }

    #[must_use]
    pub fn content_node_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.node_type != NodeType::Source)
            .count()
    }

    #[must_use]
    pub fn stats(&self) -> GraphStats {
        let mut node_types = BTreeMap::new();
        for node in &self.nodes {
            *node_types.entry(node.node_type.to_string()).or_insert(0) += 1;
        }

        GraphStats {
            nodes: self.nodes.len(),
            edges: self.edges.len(),
            node_types,
        }
    }

    /// Every structural rule the pipeline guarantees, checked after the fact.
    #[must_use]
    pub fn validate(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        let mut ids = HashSet::new();

        for node in &self.nodes {
            if !ids.insert(node.id.as_str()) {
                violations.push(Violation::DuplicateNode(node.id.clone()));
            }
            if has_duplicates(&node.sources) {
                violations.push(Violation::DuplicateSource(node.id.clone()));
            }
            if node.node_type == NodeType::Source {
                continue;
            }
            if node.sources.is_empty() {
                violations.push(Violation::MissingProvenance(node.id.clone()));
            }
            let expected = node.expected_id();
            if node.id != expected {
                violations.push(Violation::StaleId {
                    id: node.id.clone(),
                    expected,
                });
            }
        }

        let mut keys = HashSet::new();
        for edge in &self.edges {
            let label = format!("{} -{}-> {}", edge.from_id, edge.relation, edge.to_id);

            if edge.is_self_loop() {
                violations.push(Violation::SelfLoop(edge.from_id.clone()));
            }
            if !edge.relation.is_controlled() {
                violations.push(Violation::UncontrolledRelation {
                    from_id: edge.from_id.clone(),
                    to_id: edge.to_id.clone(),
                    relation: edge.relation.to_string(),
                });
            }
            if !keys.insert(edge.key()) {
                violations.push(Violation::DuplicateEdge {
                    from_id: edge.from_id.clone(),
                    to_id: edge.to_id.clone(),
                    relation: edge.relation.to_string(),
                });
            }
            if has_duplicates(&edge.sources) {
                violations.push(Violation::DuplicateSource(label.clone()));
            }
            for endpoint in [&edge.from_id, &edge.to_id] {
                if !ids.contains(endpoint.as_str()) {
                    violations.push(Violation::DanglingEndpoint {
                        edge: label.clone(),
                        missing: endpoint.clone(),
                    });
                }
            }
        }

        violations
    }

    pub fn to_json_pretty(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

fn has_duplicates<T: std::hash::Hash + Eq>(items: &[T]) -> bool {
    let mut seen = HashSet::new();
    items.iter().any(|item| !seen.insert(item))
}
