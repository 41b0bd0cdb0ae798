use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::source::{push_unique, SourceRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    // Business structure
    Operates,
    Offers,
    Includes,
    PartneredWith,

    // Technical
    EnabledBy,
    SupportedBy,
    IntegratedWith,
    ExecutedVia,

    // Events
    Acquired,
    Launched,
    HasEvent,

    // Provenance
    DescribedIn,

    /// Fallback for verbs outside the vocabulary. Not itself controlled.
    RelatedTo,
}

impl Relation {
    /// The closed vocabulary enforced by the normalizers.
    pub const CONTROLLED: [Self; 12] = [
        Self::Operates,
        Self::Offers,
        Self::EnabledBy,
        Self::SupportedBy,
        Self::Includes,
        Self::IntegratedWith,
        Self::ExecutedVia,
        Self::Acquired,
        Self::Launched,
        Self::HasEvent,
        Self::DescribedIn,
        Self::PartneredWith,
    ];

    pub const FALLBACK: Self = Self::RelatedTo;

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Operates => "operates",
            Self::Offers => "offers",
            Self::Includes => "includes",
            Self::PartneredWith => "partnered_with",
            Self::EnabledBy => "enabled_by",
            Self::SupportedBy => "supported_by",
            Self::IntegratedWith => "integrated_with",
            Self::ExecutedVia => "executed_via",
            Self::Acquired => "acquired",
            Self::Launched => "launched",
            Self::HasEvent => "has_event",
            Self::DescribedIn => "described_in",
            Self::RelatedTo => "related_to",
        }
    }

    #[must_use]
    pub const fn is_controlled(&self) -> bool {
        !matches!(self, Self::RelatedTo)
    }

    /// Relations an Event node can mediate between an actor and a target.
    #[must_use]
    pub const fn is_event_mediated(&self) -> bool {
        matches!(self, Self::Launched | Self::Acquired)
    }

    /// Soft coercion used at assembly time: unknown verbs become [`Self::FALLBACK`].
    #[must_use]
    pub fn coerce(verb: &str) -> Self {
        verb.parse().unwrap_or(Self::FALLBACK)
    }
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Relation {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "operates" => Ok(Self::Operates),
            "offers" => Ok(Self::Offers),
            "includes" => Ok(Self::Includes),
            "partnered_with" => Ok(Self::PartneredWith),
            "enabled_by" => Ok(Self::EnabledBy),
            "supported_by" => Ok(Self::SupportedBy),
            "integrated_with" => Ok(Self::IntegratedWith),
            "executed_via" => Ok(Self::ExecutedVia),
            "acquired" => Ok(Self::Acquired),
            "launched" => Ok(Self::Launched),
            "has_event" => Ok(Self::HasEvent),
            "described_in" => Ok(Self::DescribedIn),
            "related_to" => Ok(Self::RelatedTo),
            _ => Err(crate::Error::InvalidRelation(s.to_string())),
        }
    }
}

pub type EdgeKey = (String, String, Relation);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from_id: String,
    pub to_id: String,
    pub relation: Relation,
    #[serde(default)]
    pub sources: Vec<SourceRef>,
}

impl Edge {
    pub fn new(
        from_id: impl Into<String>,
        to_id: impl Into<String>,
        relation: Relation,
    ) -> crate::Result<Self> {
        let from_id = from_id.into();
        let to_id = to_id.into();

        if from_id == to_id {
            return Err(crate::Error::SelfReference(from_id));
        }

        Ok(Self {
            from_id,
            to_id,
            relation,
            sources: Vec::new(),
        })
    }

    #[must_use]
    pub fn with_source(mut self, source: SourceRef) -> Self {
        self.add_source(source);
        self
    }

    pub fn add_source(&mut self, source: SourceRef) -> bool {
        push_unique(&mut self.sources, source)
    }

    #[must_use]
    pub fn key(&self) -> EdgeKey {
        (self.from_id.clone(), self.to_id.clone(), self.relation)
    }

    #[must_use]
    pub fn is_self_loop(&self) -> bool {
        self.from_id == self.to_id
    }

    pub(crate) fn sort_key(&self) -> (&str, &str, &str) {
        (&self.from_id, self.relation.as_str(), &self.to_id)
    }
}

/// Edges keyed by `(from_id, to_id, relation)`; a repeated key merges provenance.
#[derive(Debug, Clone, Default)]
pub struct EdgeSet {
    edges: Vec<Edge>,
    index: HashMap<EdgeKey, usize>,
}

impl EdgeSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, from_id: &str, to_id: &str, relation: Relation) -> bool {
        self.index
            .contains_key(&(from_id.to_string(), to_id.to_string(), relation))
    }

    /// Inserts or merges a single observation. Self-loops are refused.
    pub fn upsert(
        &mut self,
        from_id: &str,
        to_id: &str,
        relation: Relation,
        source: SourceRef,
    ) -> bool {
        match Edge::new(from_id, to_id, relation) {
            Ok(edge) => {
                self.merge(edge.with_source(source));
                true
            }
            Err(e) => {
                tracing::debug!("Skipping edge: {}", e);
                false
            }
        }
    }

    /// Inserts `edge`, or unions its sources into the edge already holding its key.
    pub fn merge(&mut self, edge: Edge) {
        if let Some(&slot) = self.index.get(&edge.key()) {
            let existing = &mut self.edges[slot];
            for source in edge.sources {
                existing.add_source(source);
            }
        } else {
            self.index.insert(edge.key(), self.edges.len());
            self.edges.push(edge);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Edge> {
        self.edges
    }
}

impl FromIterator<Edge> for EdgeSet {
    fn from_iter<T: IntoIterator<Item = Edge>>(iter: T) -> Self {
        let mut set = Self::new();
        for edge in iter {
            set.merge(edge);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_from_str() {
        assert_eq!("operates".parse::<Relation>().unwrap(), Relation::Operates);
        assert_eq!(
            "partnered_with".parse::<Relation>().unwrap(),
            Relation::PartneredWith
        );
        assert!("serves".parse::<Relation>().is_err());
    }

    #[test]
    fn test_coerce_unknown_to_fallback() {
        assert_eq!(Relation::coerce("unsupported_verb"), Relation::RelatedTo);
        assert_eq!(Relation::coerce("acquired"), Relation::Acquired);
    }

    #[test]
    fn test_controlled_vocabulary_excludes_fallback() {
        assert!(Relation::CONTROLLED.iter().all(Relation::is_controlled));
        assert!(!Relation::FALLBACK.is_controlled());
        assert!(!Relation::CONTROLLED.contains(&Relation::FALLBACK));
    }

    #[test]
    fn test_edge_rejects_self_loop() {
        let result = Edge::new("company_a", "company_a", Relation::Acquired);
        assert!(matches!(result, Err(crate::Error::SelfReference(_))));
    }

    #[test]
    fn test_edge_set_merges_sources() {
        let mut set = EdgeSet::new();

        assert!(set.upsert("a", "b", Relation::Offers, SourceRef::new("c1", 1)));
        assert!(set.upsert("a", "b", Relation::Offers, SourceRef::new("c2", 2)));
        assert!(set.upsert("a", "b", Relation::Offers, SourceRef::new("c1", 1)));
        assert!(set.upsert("a", "b", Relation::Operates, SourceRef::new("c1", 1)));
        assert!(!set.upsert("a", "a", Relation::Offers, SourceRef::new("c1", 1)));

        assert_eq!(set.len(), 2);
        let offers = set.iter().find(|e| e.relation == Relation::Offers).unwrap();
        assert_eq!(offers.sources.len(), 2);
    }

    #[test]
    fn test_relation_serializes_snake_case() {
        let json = serde_json::to_string(&Relation::IntegratedWith).unwrap();
        assert_eq!(json, "\"integrated_with\"");
    }
}
