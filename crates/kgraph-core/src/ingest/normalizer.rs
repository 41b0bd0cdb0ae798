//! Structural clean-up of an assembled graph.
//!
//! Every pass that renames nodes records `old id -> new id` in an [`IdRemap`];
//! edges are re-pointed once, through the composed table, after all renaming
//! is done.

use std::collections::{HashMap, HashSet};

use crate::graph::Graph;
use crate::node::{Node, NodeType};
use crate::relation::{Edge, EdgeSet, Relation};
use crate::text::{choose_best_label, is_alias, is_invalid_label};

/// Post-processing applied to a built graph.
pub trait GraphNormalizer: Send + Sync {
    fn name(&self) -> &'static str;

    fn normalize(&self, graph: Graph) -> Graph;
}

/// The pass every built graph goes through.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralNormalizer;

impl GraphNormalizer for StructuralNormalizer {
    fn name(&self) -> &'static str {
        "structural"
    }

    fn normalize(&self, graph: Graph) -> Graph {
        normalize_graph(graph)
    }
}

/// Extra consolidation for graphs whose extractions came from a language model.
#[derive(Debug, Clone, Copy, Default)]
pub struct LlmNormalizer;

impl GraphNormalizer for LlmNormalizer {
    fn name(&self) -> &'static str {
        "llm"
    }

    fn normalize(&self, graph: Graph) -> Graph {
        normalize_llm_graph(graph)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdRemap(HashMap<String, String>);

impl IdRemap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, old: impl Into<String>, new: impl Into<String>) {
        let (old, new) = (old.into(), new.into());
        if old != new {
            self.0.insert(old, new);
        }
    }

    /// Ids without an entry map to themselves.
    #[must_use]
    pub fn resolve<'a>(&'a self, id: &'a str) -> &'a str {
        self.0.get(id).map_or(id, String::as_str)
    }

    /// Applies `self` first, then `next`.
    #[must_use]
    pub fn then(mut self, next: &Self) -> Self {
        for target in self.0.values_mut() {
            if let Some(further) = next.0.get(target.as_str()) {
                target.clone_from(further);
            }
        }
        for (old, new) in &next.0 {
            self.0.entry(old.clone()).or_insert_with(|| new.clone());
        }
        self.0.retain(|old, new| old != new);
        self
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

/// Prune, alias-merge, re-point, enforce event-first, dedup, sort.
#[must_use]
pub fn normalize_graph(graph: Graph) -> Graph {
    let Graph { nodes, edges } = graph;

    let before = nodes.len();
    let nodes: Vec<Node> = nodes
        .into_iter()
        .filter(|n| n.node_type == NodeType::Source || !is_invalid_label(&n.label))
        .collect();
    if nodes.len() < before {
        tracing::debug!("Pruned {} invalid entities", before - nodes.len());
    }

    let (nodes, remap) = merge_aliases(nodes, |_| true);
    finish(nodes, edges, &remap)
}

/// Consolidation for model output: Services first, then everything, then
/// Companies that only ever partner are reclassified as Partners.
#[must_use]
pub fn normalize_llm_graph(graph: Graph) -> Graph {
    let Graph { nodes, edges } = graph;

    let (nodes, services) = merge_aliases(nodes, |t| *t == NodeType::Service);
    let (nodes, general) = merge_aliases(nodes, |_| true);
    let remap = services.then(&general);

    let (nodes, partners) = reclassify_partners(nodes, &edges, &remap);
    let remap = remap.then(&partners);

    finish(nodes, edges, &remap)
}

/// Groups same-type aliases in `(type, label, id)` order. Source nodes and
/// types outside `scope` pass through untouched.
pub fn merge_aliases<F>(mut nodes: Vec<Node>, scope: F) -> (Vec<Node>, IdRemap)
where
    F: Fn(&NodeType) -> bool,
{
    nodes.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    let mut slots: Vec<Option<Node>> = nodes.into_iter().map(Some).collect();
    let mut merged = Vec::with_capacity(slots.len());
    let mut remap = IdRemap::new();

    for i in 0..slots.len() {
        let Some(head) = slots[i].take() else {
            continue;
        };

        if head.node_type == NodeType::Source || !scope(&head.node_type) {
            merged.push(head);
            continue;
        }

        let mut group = Vec::new();
        for slot in slots.iter_mut().skip(i + 1) {
            let aliases = slot
                .as_ref()
                .is_some_and(|n| n.node_type == head.node_type && is_alias(&head.label, &n.label));
            if aliases {
                group.extend(slot.take());
            }
        }

        if group.is_empty() {
            merged.push(head);
            continue;
        }

        group.insert(0, head);
        merged.push(combine(&group, &mut remap));
    }

    (merged, remap)
}

fn combine(group: &[Node], remap: &mut IdRemap) -> Node {
    let first = &group[0];
    let label = choose_best_label(group.iter().map(|n| n.label.as_str())).unwrap_or(first.label.as_str());

    let mut node = Node::new(label, first.node_type.clone()).with_attributes(first.attributes.clone());
    for member in group {
        for source in &member.sources {
            node.add_source(source.clone());
        }
        remap.insert(member.id.as_str(), node.id.as_str());
    }

    tracing::debug!("Merged {} aliases into {}", group.len(), node.id);
    node
}

/// A Company whose only business relation is `partnered_with` becomes a Partner.
pub fn reclassify_partners(mut nodes: Vec<Node>, edges: &[Edge], remap: &IdRemap) -> (Vec<Node>, IdRemap) {
    let mut outgoing: HashMap<&str, HashSet<Relation>> = HashMap::new();
    for edge in edges {
        let from = remap.resolve(&edge.from_id);
        if from == remap.resolve(&edge.to_id) {
            continue;
        }
        if matches!(edge.relation, Relation::DescribedIn | Relation::HasEvent) {
            continue;
        }
        outgoing.entry(from).or_default().insert(edge.relation);
    }

    let partners: Vec<usize> = nodes
        .iter()
        .enumerate()
        .filter(|(_, n)| n.node_type == NodeType::Company)
        .filter(|(_, n)| {
            outgoing
                .get(n.id.as_str())
                .is_some_and(|rels| rels.len() == 1 && rels.contains(&Relation::PartneredWith))
        })
        .map(|(slot, _)| slot)
        .collect();

    // Existing nodes keep their slot; a reclassified Company landing on a
    // taken id folds into it.
    let mut slots: HashMap<String, usize> = nodes
        .iter()
        .enumerate()
        .filter(|(slot, _)| !partners.contains(slot))
        .map(|(slot, n)| (n.id.clone(), slot))
        .collect();

    let mut reclassified = IdRemap::new();
    let mut absorbed = HashSet::new();
    for slot in partners {
        let old = nodes[slot].id.clone();
        nodes[slot].retype(NodeType::Partner);
        let id = nodes[slot].id.clone();
        reclassified.insert(old.as_str(), id.as_str());

        if let Some(&target) = slots.get(&id) {
            for source in std::mem::take(&mut nodes[slot].sources) {
                nodes[target].add_source(source);
            }
            absorbed.insert(slot);
            tracing::debug!("Reclassified {} into existing {}", old, id);
        } else {
            tracing::debug!("Reclassified {} as {}", old, id);
            slots.insert(id, slot);
        }
    }

    let nodes = nodes
        .into_iter()
        .enumerate()
        .filter(|(slot, _)| !absorbed.contains(slot))
        .map(|(_, n)| n)
        .collect();

    (nodes, reclassified)
}

/// Steps shared by both normalizers once node identity is settled.
fn finish(nodes: Vec<Node>, edges: Vec<Edge>, remap: &IdRemap) -> Graph {
    let edges = repoint(&nodes, edges, remap);
    let edges = enforce_event_first(&nodes, edges);
    let edges: EdgeSet = edges.into_iter().collect();

    let mut graph = Graph::new(nodes, edges.into_vec());
    graph.sort();
    graph
}

fn repoint(nodes: &[Node], edges: Vec<Edge>, remap: &IdRemap) -> Vec<Edge> {
    let ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let mut kept = Vec::with_capacity(edges.len());

    for mut edge in edges {
        if !edge.relation.is_controlled() {
            tracing::debug!("Dropping uncontrolled relation {}", edge.relation);
            continue;
        }

        let from = remap.resolve(&edge.from_id).to_string();
        let to = remap.resolve(&edge.to_id).to_string();

        if !ids.contains(from.as_str()) || !ids.contains(to.as_str()) || from == to {
            continue;
        }

        edge.from_id = from;
        edge.to_id = to;
        kept.push(edge);
    }

    kept
}

/// Drops `company -> target` launched/acquired edges that an event already
/// mediates.
fn enforce_event_first(nodes: &[Node], edges: Vec<Edge>) -> Vec<Edge> {
    let events: HashSet<&str> = nodes
        .iter()
        .filter(|n| n.node_type == NodeType::Event)
        .map(|n| n.id.as_str())
        .collect();

    let mut actors: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in edges.iter().filter(|e| e.relation == Relation::HasEvent) {
        actors
            .entry(edge.to_id.as_str())
            .or_default()
            .push(edge.from_id.as_str());
    }

    let mut redundant = HashSet::new();
    for edge in &edges {
        if !edge.relation.is_event_mediated() || !events.contains(edge.from_id.as_str()) {
            continue;
        }
        for actor in actors.get(edge.from_id.as_str()).into_iter().flatten() {
            redundant.insert((actor.to_string(), edge.to_id.clone(), edge.relation));
        }
    }

    if redundant.is_empty() {
        return edges;
    }

    edges
        .into_iter()
        .filter(|e| !redundant.contains(&e.key()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{source_node, SourceRef};

    fn node(label: &str, node_type: NodeType, chunk: &str) -> Node {
        Node::new(label, node_type).with_source(SourceRef::new(chunk, 1))
    }

    fn edge(from: &str, to: &str, relation: Relation) -> Edge {
        Edge {
            from_id: from.into(),
            to_id: to.into(),
            relation,
            sources: vec![SourceRef::new("c1", 1)],
        }
    }

    #[test]
    fn test_remap_composition() {
        let mut first = IdRemap::new();
        first.insert("a", "b");
        let mut second = IdRemap::new();
        second.insert("b", "c");
        second.insert("x", "y");

        let composed = first.then(&second);
        assert_eq!(composed.resolve("a"), "c");
        assert_eq!(composed.resolve("b"), "c");
        assert_eq!(composed.resolve("x"), "y");
        assert_eq!(composed.resolve("z"), "z");
    }

    #[test]
    fn test_prunes_fragments_but_keeps_sources() {
        let graph = Graph::new(
            vec![
                node("founded in 2015", NodeType::Company, "c1"),
                node("AI", NodeType::Capability, "c1"),
                node("TechNova", NodeType::Company, "c1"),
                source_node("c1", 1, "doc.pdf"),
            ],
            vec![edge("company_technova", "company_founded_in_2015", Relation::Operates)],
        );

        let graph = normalize_graph(graph);
        let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["company_technova", "source_c1"]);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn test_alias_merge_picks_longest_label() {
        let graph = Graph::new(
            vec![
                node("Nimbus", NodeType::Company, "c1"),
                node("Nimbus Solutions", NodeType::Company, "c2"),
                node("Nimbus", NodeType::Platform, "c3"),
                node("Acme", NodeType::Company, "c1"),
            ],
            vec![
                edge("company_acme", "company_nimbus", Relation::PartneredWith),
                edge("company_nimbus", "company_nimbus_solutions", Relation::Offers),
            ],
        );

        let graph = normalize_graph(graph);
        let merged = graph.node("company_nimbus_solutions").expect("merged node");
        assert_eq!(merged.sources.len(), 2);
        assert!(graph.node("company_nimbus").is_none());
        assert!(graph.node("platform_nimbus").is_some());

        assert_eq!(graph.edges.len(), 1);
        assert!(graph.has_edge("company_acme", "company_nimbus_solutions", Relation::PartneredWith));
    }

    #[test]
    fn test_short_labels_do_not_alias_by_containment() {
        let graph = Graph::new(
            vec![node("Arc", NodeType::Company, "c1"), node("Arcadia", NodeType::Company, "c1")],
            Vec::new(),
        );

        assert_eq!(normalize_graph(graph).nodes.len(), 2);
    }

    #[test]
    fn test_uncontrolled_relations_filtered() {
        let graph = Graph::new(
            vec![node("TechNova", NodeType::Company, "c1"), node("QuantumAI", NodeType::Company, "c1")],
            vec![edge("company_technova", "company_quantumai", Relation::RelatedTo)],
        );

        assert!(normalize_graph(graph).edges.is_empty());
    }

    #[test]
    fn test_event_first_removes_direct_edge() {
        let graph = Graph::new(
            vec![
                node("TechNova", NodeType::Company, "c3"),
                node("QuantumAI", NodeType::Company, "c3"),
                node("Acquisition of QuantumAI", NodeType::Event, "c3"),
            ],
            vec![
                edge("company_technova", "event_acquisition_of_quantumai", Relation::HasEvent),
                edge("event_acquisition_of_quantumai", "company_quantumai", Relation::Acquired),
                edge("company_technova", "company_quantumai", Relation::Acquired),
            ],
        );

        let graph = normalize_graph(graph);
        assert_eq!(graph.edges.len(), 2);
        assert!(!graph.has_edge("company_technova", "company_quantumai", Relation::Acquired));
        assert!(graph.has_edge("event_acquisition_of_quantumai", "company_quantumai", Relation::Acquired));
    }

    #[test]
    fn test_merge_collapses_duplicate_edges() {
        let mut second = edge("company_technova", "platform_novacloud", Relation::Operates);
        second.sources = vec![SourceRef::new("c2", 2)];
        let graph = Graph::new(
            vec![
                node("TechNova", NodeType::Company, "c1"),
                node("TechNova Labs", NodeType::Company, "c2"),
                node("NovaCloud", NodeType::Platform, "c1"),
            ],
            vec![
                edge("company_technova", "platform_novacloud", Relation::Operates),
                Edge {
                    from_id: "company_technova_labs".into(),
                    ..second
                },
            ],
        );

        let graph = normalize_graph(graph);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].from_id, "company_technova_labs");
        assert_eq!(graph.edges[0].sources.len(), 2);
    }

    #[test]
    fn test_llm_partner_reclassification() {
        let graph = Graph::new(
            vec![
                node("TechNova", NodeType::Company, "c1"),
                node("DataFlow Systems", NodeType::Company, "c1"),
                node("NovaCloud", NodeType::Platform, "c1"),
                source_node("c1", 1, "doc.pdf"),
            ],
            vec![
                edge("company_dataflow_systems", "company_technova", Relation::PartneredWith),
                edge("company_dataflow_systems", "source_c1", Relation::DescribedIn),
                edge("company_technova", "platform_novacloud", Relation::Operates),
                edge("company_technova", "company_dataflow_systems", Relation::PartneredWith),
            ],
        );

        let graph = normalize_llm_graph(graph);
        assert!(graph.node("partner_dataflow_systems").is_some());
        assert!(graph.node("company_technova").is_some());
        assert!(graph.has_edge("partner_dataflow_systems", "source_c1", Relation::DescribedIn));
        assert!(graph.has_edge("company_technova", "partner_dataflow_systems", Relation::PartneredWith));
        assert!(graph.validate().is_empty());
    }

    #[test]
    fn test_llm_reclassified_company_folds_into_existing_partner() {
        let graph = Graph::new(
            vec![
                node("Data Flow", NodeType::Partner, "c1"),
                node("Data-Flow", NodeType::Company, "c2"),
                node("TechNova", NodeType::Company, "c1"),
                node("NovaCloud", NodeType::Platform, "c1"),
            ],
            vec![
                edge("company_data_flow", "company_technova", Relation::PartneredWith),
                edge("company_technova", "platform_novacloud", Relation::Operates),
                edge("company_technova", "partner_data_flow", Relation::PartneredWith),
                edge("company_technova", "company_data_flow", Relation::PartneredWith),
            ],
        );

        let graph = normalize_llm_graph(graph);
        assert_eq!(graph.nodes.len(), 3);
        assert!(graph.node("company_technova").is_some());
        assert!(graph.node("company_data_flow").is_none());

        let partner = graph.node("partner_data_flow").unwrap();
        assert_eq!(partner.label, "Data Flow");
        assert_eq!(partner.sources.len(), 2);
        assert!(graph.has_edge("partner_data_flow", "company_technova", Relation::PartneredWith));
        assert!(graph.has_edge("company_technova", "partner_data_flow", Relation::PartneredWith));
        assert_eq!(graph.edges.len(), 3);
        assert!(graph.validate().is_empty());
    }

    #[test]
    fn test_llm_service_merge() {
        let graph = Graph::new(
            vec![
                node("Insight", NodeType::Service, "c1"),
                node("Insight Analytics", NodeType::Service, "c2"),
                node("NovaCloud", NodeType::Platform, "c1"),
            ],
            vec![edge("service_insight", "platform_novacloud", Relation::IntegratedWith)],
        );

        let graph = normalize_llm_graph(graph);
        assert_eq!(graph.nodes_of_type(&NodeType::Service).count(), 1);
        assert!(graph.has_edge(
            "service_insight_analytics",
            "platform_novacloud",
            Relation::IntegratedWith
        ));
    }
}
