use std::collections::HashMap;

use super::extractor::{ChunkExtraction, ExtractedEntity};
use crate::node::Node;
use crate::source::SourceRef;
use crate::text::{choose_best_label, strip_legal_suffix};

/// Any observed spelling of an entity, raw or canonical, to its final node id.
#[derive(Debug, Clone, Default)]
pub struct NameIndex(HashMap<String, String>);

impl NameIndex {
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.0.get(name.trim()).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MergedEntities {
    pub nodes: Vec<Node>,
    pub names: NameIndex,
}

/// Folds entity sightings into one node per normalization key.
///
/// The key is the name with any trailing legal suffix removed, so
/// "TechNova Inc." and "TechNova" land on the same node. Different keys are
/// never merged here; looser alias detection is the normalizer's job.
#[derive(Debug, Default)]
pub struct EntityMerger {
    nodes: Vec<Node>,
    keys: HashMap<String, usize>,
    names: HashMap<String, usize>,
}

impl EntityMerger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, entity: &ExtractedEntity, source: &SourceRef) {
        let name = entity.name.trim();
        if name.is_empty() {
            tracing::debug!(chunk_id = %source.chunk_id, "Skipping entity with empty name");
            return;
        }

        let key = strip_legal_suffix(name);

        let slot = if let Some(&slot) = self.keys.get(&key) {
            let node = &mut self.nodes[slot];

            // Spelling variants settle on the longest label whatever the arrival order.
            let best = choose_best_label([node.label.as_str(), name])
                .unwrap_or(name)
                .to_string();
            if best != node.label {
                node.relabel(best);
            }

            node.add_source(source.clone());
            node.attributes
                .extend(entity.attributes.iter().map(|(k, v)| (k.clone(), v.clone())));

            let previous = node.id.clone();
            if node.promote(&entity.entity_type) {
                tracing::debug!("Promoted {} to {}", previous, node.id);
            }
            slot
        } else {
            let node = Node::new(name, entity.entity_type.clone())
                .with_attributes(entity.attributes.clone())
                .with_source(source.clone());
            self.nodes.push(node);
            self.keys.insert(key, self.nodes.len() - 1);
            self.nodes.len() - 1
        };

        self.names.insert(name.to_string(), slot);
        self.names.insert(self.nodes[slot].label.clone(), slot);
    }

    /// Ids are read only now, so a late type promotion still reaches every
    /// name that pointed at the node.
    #[must_use]
    pub fn finish(self) -> MergedEntities {
        let names = self
            .names
            .into_iter()
            .map(|(name, slot)| (name, self.nodes[slot].id.clone()))
            .collect();

        MergedEntities {
            nodes: self.nodes,
            names: NameIndex(names),
        }
    }
}

#[must_use]
pub fn merge_entities(extractions: &[ChunkExtraction]) -> MergedEntities {
    let mut merger = EntityMerger::new();

    for chunk in extractions {
        let source = chunk.source_ref();
        for entity in &chunk.extraction.entities {
            merger.observe(entity, &source);
        }
    }

    merger.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::extractor::ExtractionOutput;
    use crate::node::NodeType;

    fn chunk(id: &str, page: u32, entities: Vec<ExtractedEntity>) -> ChunkExtraction {
        let mut extraction = ExtractionOutput::new();
        extraction.entities = entities;
        ChunkExtraction::new(id, page, extraction)
    }

    #[test]
    fn test_suffix_variants_share_a_node() {
        let merged = merge_entities(&[
            chunk("c1", 1, vec![ExtractedEntity::new("TechNova Inc.", NodeType::Company)]),
            chunk("c2", 2, vec![ExtractedEntity::new("TechNova", NodeType::Company)]),
        ]);

        assert_eq!(merged.nodes.len(), 1);
        let node = &merged.nodes[0];
        assert_eq!(node.label, "TechNova Inc.");
        assert_eq!(node.sources.len(), 2);
        assert_eq!(merged.names.resolve("TechNova"), Some(node.id.as_str()));
        assert_eq!(merged.names.resolve("TechNova Inc."), Some(node.id.as_str()));
    }

    #[test]
    fn test_label_independent_of_order() {
        let merged = merge_entities(&[
            chunk("c2", 2, vec![ExtractedEntity::new("TechNova", NodeType::Company)]),
            chunk("c1", 1, vec![ExtractedEntity::new("TechNova Inc.", NodeType::Company)]),
        ]);

        assert_eq!(merged.nodes.len(), 1);
        assert_eq!(merged.nodes[0].label, "TechNova Inc.");
        assert_eq!(merged.names.resolve("TechNova"), Some("company_technova_inc_"));
    }

    #[test]
    fn test_type_precedence_upgrades_and_reindexes() {
        let merged = merge_entities(&[
            chunk("c1", 1, vec![ExtractedEntity::new("NovaCloud", NodeType::Company)]),
            chunk("c2", 2, vec![ExtractedEntity::new("NovaCloud", NodeType::Platform)]),
            chunk("c3", 3, vec![ExtractedEntity::new("NovaCloud", NodeType::Company)]),
        ]);

        assert_eq!(merged.nodes.len(), 1);
        assert_eq!(merged.nodes[0].node_type, NodeType::Platform);
        assert_eq!(merged.names.resolve("NovaCloud"), Some("platform_novacloud"));
    }

    #[test]
    fn test_late_promotion_reaches_earlier_spellings() {
        let merged = merge_entities(&[
            chunk("c1", 1, vec![ExtractedEntity::new("Nimbus Corp", NodeType::Company)]),
            chunk("c2", 2, vec![ExtractedEntity::new("Nimbus", NodeType::Service)]),
        ]);

        assert_eq!(merged.names.resolve("Nimbus Corp"), Some("service_nimbus_corp"));
        assert_eq!(merged.names.resolve("Nimbus"), Some("service_nimbus_corp"));
    }

    #[test]
    fn test_attributes_later_values_win() {
        let merged = merge_entities(&[
            chunk(
                "c1",
                1,
                vec![ExtractedEntity::new("TechNova", NodeType::Company)
                    .with_attribute("hq", "Austin".into())
                    .with_attribute("founded", 2015.into())],
            ),
            chunk(
                "c2",
                2,
                vec![ExtractedEntity::new("TechNova", NodeType::Company)
                    .with_attribute("hq", "San Francisco".into())],
            ),
        ]);

        let attrs = &merged.nodes[0].attributes;
        assert_eq!(attrs["hq"], "San Francisco");
        assert_eq!(attrs["founded"], 2015);
    }

    #[test]
    fn test_repeat_source_not_duplicated() {
        let merged = merge_entities(&[chunk(
            "c1",
            1,
            vec![
                ExtractedEntity::new("TechNova", NodeType::Company),
                ExtractedEntity::new(" TechNova ", NodeType::Company),
            ],
        )]);

        assert_eq!(merged.nodes[0].sources, [SourceRef::new("c1", 1)]);
    }

    #[test]
    fn test_distinct_keys_stay_separate() {
        let merged = merge_entities(&[chunk(
            "c1",
            1,
            vec![
                ExtractedEntity::new("Nimbus", NodeType::Company),
                ExtractedEntity::new("Nimbus Solutions", NodeType::Company),
                ExtractedEntity::new("", NodeType::Company),
            ],
        )]);

        assert_eq!(merged.nodes.len(), 2);
        assert_eq!(merged.names.resolve("unknown"), None);
    }
}
