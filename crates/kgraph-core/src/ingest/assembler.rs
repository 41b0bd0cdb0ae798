use std::collections::HashMap;

use super::extractor::{ChunkExtraction, ExtractedEvent, ExtractedRelation};
use super::merger::{MergedEntities, NameIndex};
use crate::node::{Node, NodeType};
use crate::relation::{EdgeSet, Relation};
use crate::source::SourceRef;
use crate::text::{choose_best_label, normalize_name};

/// Turns relation and event records into edges between resolved nodes.
///
/// Event records also produce Event nodes, so the assembler owns the node
/// list from here on. Records whose endpoints do not resolve to a known name
/// are dropped quietly.
#[derive(Debug)]
pub struct Assembler {
    names: NameIndex,
    nodes: Vec<Node>,
    slots: HashMap<String, usize>,
    edges: EdgeSet,
}

impl Assembler {
    #[must_use]
    pub fn new(merged: MergedEntities) -> Self {
        let slots = merged
            .nodes
            .iter()
            .enumerate()
            .map(|(slot, node)| (node.id.clone(), slot))
            .collect();

        Self {
            names: merged.names,
            nodes: merged.nodes,
            slots,
            edges: EdgeSet::new(),
        }
    }

    pub fn add_relations(&mut self, chunk: &ChunkExtraction) {
        let source = chunk.source_ref();
        for relation in &chunk.extraction.relations {
            self.add_relation(relation, &source);
        }
    }

    fn add_relation(&mut self, record: &ExtractedRelation, source: &SourceRef) {
        let (Some(from), Some(to)) = (self.names.resolve(&record.from), self.names.resolve(&record.to))
        else {
            tracing::debug!(
                "Dropping relation {} -> {}: unresolved endpoint",
                record.from,
                record.to
            );
            return;
        };

        let relation = Relation::coerce(&record.relation);
        if relation == Relation::FALLBACK && record.relation.trim() != Relation::FALLBACK.as_str() {
            tracing::debug!("Coerced relation '{}' to {}", record.relation, relation);
        }

        self.edges.upsert(from, to, relation, source.clone());
    }

    pub fn add_events(&mut self, chunk: &ChunkExtraction) {
        let source = chunk.source_ref();
        for event in &chunk.extraction.events {
            self.add_event(event, &source);
        }
    }

    fn add_event(&mut self, event: &ExtractedEvent, source: &SourceRef) {
        let name = event.name.trim();
        if name.is_empty() {
            tracing::debug!(chunk_id = %source.chunk_id, "Skipping event with empty name");
            return;
        }

        let event_id = format!("event_{}", normalize_name(name));
        self.observe_event(&event_id, name, event, source);

        let company = event.company.as_deref().and_then(|n| self.names.resolve(n));
        let related = event.related_to.as_deref().and_then(|n| self.names.resolve(n));

        if let Some(company) = company {
            self.edges
                .upsert(company, &event_id, Relation::HasEvent, source.clone());
        }

        if let Some(related) = related {
            self.edges
                .upsert(&event_id, related, event.kind.relation(), source.clone());
        }

        // Provisional; the normalizer removes it again once the event carries it.
        if let (Some(company), Some(related), Some(direct)) =
            (company, related, event.kind.direct_relation())
        {
            self.edges.upsert(company, related, direct, source.clone());
        }
    }

    fn observe_event(&mut self, event_id: &str, name: &str, event: &ExtractedEvent, source: &SourceRef) {
        if let Some(&slot) = self.slots.get(event_id) {
            let node = &mut self.nodes[slot];
            if node.node_type == NodeType::Event {
                if let Some(best) = choose_best_label([node.label.as_str(), name]) {
                    if best != node.label {
                        node.label = best.to_string();
                    }
                }
            }
            if let Some(year) = event.year {
                node.attributes.insert("year".into(), year.into());
            }
            node.attributes
                .entry("tags".into())
                .or_insert_with(|| event.tags.clone().into());
            node.add_source(source.clone());
            return;
        }

        let mut node = Node::new(name, NodeType::Event).with_source(source.clone());
        node.attributes
            .insert("year".into(), event.year.map_or(serde_json::Value::Null, Into::into));
        node.attributes.insert("tags".into(), event.tags.clone().into());

        self.slots.insert(event_id.to_string(), self.nodes.len());
        self.nodes.push(node);
    }

    /// A chunk naming exactly one Service and one Platform, and carrying an
    /// explicit `integrated_with` signal, links the two.
    pub fn infer_integration(&mut self, chunk: &ChunkExtraction) {
        let entities = &chunk.extraction.entities;
        let services: Vec<&str> = entities
            .iter()
            .filter(|e| e.entity_type == NodeType::Service)
            .map(|e| e.name.as_str())
            .collect();
        let platforms: Vec<&str> = entities
            .iter()
            .filter(|e| e.entity_type == NodeType::Platform)
            .map(|e| e.name.as_str())
            .collect();

        let ([service], [platform]) = (services.as_slice(), platforms.as_slice()) else {
            return;
        };

        let signalled = chunk
            .extraction
            .relations
            .iter()
            .any(|r| r.relation.trim() == Relation::IntegratedWith.as_str());
        if !signalled {
            return;
        }

        let (Some(service), Some(platform)) = (self.names.resolve(service), self.names.resolve(platform))
        else {
            return;
        };

        if !self.edges.contains(service, platform, Relation::IntegratedWith) {
            self.edges.upsert(
                service,
                platform,
                Relation::IntegratedWith,
                chunk.source_ref(),
            );
        }
    }

    #[must_use]
    pub fn finish(self) -> (Vec<Node>, EdgeSet) {
        (self.nodes, self.edges)
    }
}

/// Relations and events per chunk in input order, then one inference pass.
#[must_use]
pub fn assemble(merged: MergedEntities, extractions: &[ChunkExtraction]) -> (Vec<Node>, EdgeSet) {
    let mut assembler = Assembler::new(merged);

    for chunk in extractions {
        assembler.add_relations(chunk);
        assembler.add_events(chunk);
    }

    for chunk in extractions {
        assembler.infer_integration(chunk);
    }

    assembler.finish()
}
