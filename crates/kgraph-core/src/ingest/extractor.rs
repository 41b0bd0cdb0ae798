use std::collections::HashSet;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::node::{Attributes, NodeType};
use crate::relation::Relation;
use crate::source::Chunk;
use crate::text::strip_legal_suffix;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Extraction failed: {0}")]
    Failed(String),
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("Invalid model response: {0}")]
    InvalidResponse(String),
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Malformed extraction: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub type ExtractionResult<T> = Result<T, ExtractionError>;

/// `null` reads the same as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn entity_type_or_default<'de, D>(deserializer: D) -> Result<NodeType, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<NodeType>::deserialize(deserializer)?.unwrap_or_else(NodeType::entity_default))
}

fn relation_or_fallback<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_relation))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedEntity {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(
        rename = "type",
        default = "NodeType::entity_default",
        deserialize_with = "entity_type_or_default"
    )]
    pub entity_type: NodeType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: Attributes,
}

impl ExtractedEntity {
    #[must_use]
    pub fn new(name: impl Into<String>, entity_type: NodeType) -> Self {
        Self {
            name: name.into(),
            entity_type,
            attributes: Attributes::new(),
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }
}

fn default_relation() -> String {
    Relation::FALLBACK.as_str().to_string()
}

/// Relation verbs are kept as raw strings here; coercion happens at assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedRelation {
    #[serde(default, deserialize_with = "null_as_default")]
    pub from: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub to: String,
    #[serde(default = "default_relation", deserialize_with = "relation_or_fallback")]
    pub relation: String,
}

impl ExtractedRelation {
    #[must_use]
    pub fn new(from: impl Into<String>, to: impl Into<String>, relation: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            relation: relation.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    Launch,
    Acquisition,
    Milestone,
    Other(String),
}

impl EventKind {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Launch => "Launch",
            Self::Acquisition => "Acquisition",
            Self::Milestone => "Milestone",
            Self::Other(s) => s,
        }
    }

    /// Relation from the Event node to whatever it concerns.
    #[must_use]
    pub const fn relation(&self) -> Relation {
        match self {
            Self::Launch => Relation::Launched,
            Self::Acquisition => Relation::Acquired,
            _ => Relation::FALLBACK,
        }
    }

    /// Relation of the provisional direct actor -> target edge, if any.
    #[must_use]
    pub const fn direct_relation(&self) -> Option<Relation> {
        match self {
            Self::Launch => Some(Relation::Launched),
            Self::Acquisition => Some(Relation::Acquired),
            _ => None,
        }
    }
}

impl Default for EventKind {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for EventKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Launch" => Self::Launch,
            "Acquisition" => Self::Acquisition,
            "Milestone" => Self::Milestone,
            _ => Self::Other(value),
        }
    }
}

impl From<EventKind> for String {
    fn from(value: EventKind) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedEvent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: EventKind,
    #[serde(default)]
    pub year: Option<i64>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub related_to: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
}

impl ExtractedEvent {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: EventKind) -> Self {
        Self {
            name: name.into(),
            kind,
            year: None,
            company: None,
            related_to: None,
            tags: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_year(mut self, year: i64) -> Self {
        self.year = Some(year);
        self
    }

    #[must_use]
    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    #[must_use]
    pub fn with_related(mut self, related_to: impl Into<String>) -> Self {
        self.related_to = Some(related_to.into());
        self
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

/// Per-chunk extractor output. Absent or `null` lists deserialize as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionOutput {
    #[serde(default, deserialize_with = "null_as_default")]
    pub entities: Vec<ExtractedEntity>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub relations: Vec<ExtractedRelation>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub events: Vec<ExtractedEvent>,
}

impl ExtractionOutput {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use]
    pub fn with_entity(mut self, entity: ExtractedEntity) -> Self {
        self.entities.push(entity);
        self
    }

    #[must_use]
    pub fn with_relation(mut self, relation: ExtractedRelation) -> Self {
        self.relations.push(relation);
        self
    }

    #[must_use]
    pub fn with_event(mut self, event: ExtractedEvent) -> Self {
        self.events.push(event);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relations.is_empty() && self.events.is_empty()
    }

    fn names_of(&self, entity_type: &NodeType) -> Vec<String> {
        self.entities
            .iter()
            .filter(|e| &e.entity_type == entity_type)
            .map(|e| e.name.clone())
            .collect()
    }
}

/// One chunk's extraction, tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkExtraction {
    pub chunk_id: String,
    pub page: u32,
    pub extraction: ExtractionOutput,
}

impl ChunkExtraction {
    #[must_use]
    pub fn new(chunk_id: impl Into<String>, page: u32, extraction: ExtractionOutput) -> Self {
        Self {
            chunk_id: chunk_id.into(),
            page,
            extraction,
        }
    }

    #[must_use]
    pub fn source_ref(&self) -> crate::SourceRef {
        crate::SourceRef::new(self.chunk_id.clone(), self.page)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    #[default]
    RuleBased,
    LlmBased,
}

impl ExtractionStrategy {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RuleBased => "rule_based",
            Self::LlmBased => "llm_based",
        }
    }
}

impl std::fmt::Display for ExtractionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExtractionStrategy {
    type Err = crate::config::ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "rule_based" | "rule" | "rules" => Ok(Self::RuleBased),
            "llm_based" | "llm" => Ok(Self::LlmBased),
            _ => Err(crate::config::ConfigError::UnknownExtractor(s.to_string())),
        }
    }
}

#[async_trait::async_trait]
pub trait Extractor: Send + Sync {
    fn strategy(&self) -> ExtractionStrategy;

    async fn extract(&self, chunk: &Chunk) -> ExtractionResult<ExtractionOutput>;
}

/// Regex patterns tuned for company-prospectus prose. Intentionally lossy;
/// the graph builder cleans up what it gets wrong.
pub struct RuleBasedExtractor {
    partner: Regex,
    platform: Regex,
    service: Regex,
    capability: Regex,
    company: Regex,
    launched: Regex,
    acquired: Regex,
    integrated: Regex,
    founded_event: Regex,
    launch_event: Regex,
    acquisition_event: Regex,
    clause: Regex,
}

const NAME_RUN: &str = r"[A-Z][A-Za-z0-9&]*(?:\s+[A-Z][A-Za-z0-9&]*){0,4}";

const NOT_COMPANY_WORDS: &[&str] = &[
    "san",
    "francisco",
    "this",
    "the",
    "company",
    "headquartered",
    "in",
    "a",
    "new",
    "its",
];

impl RuleBasedExtractor {
    pub fn new() -> ExtractionResult<Self> {
        Ok(Self {
            partner: Regex::new(r"(?i)partnered with ([A-Z][A-Za-z0-9\s&]+)")?,
            platform: Regex::new(
                r"(?i)(?:cloud\s+)?platform\s+(?:called|named)\s+([A-Z][A-Za-z0-9]+)",
            )?,
            service: Regex::new(r"(?i)launched (?:its |the )?([A-Z][^.,;]+?service)")?,
            capability: Regex::new(r"(?i)capabilities in ([A-Za-z0-9\s]+)")?,
            company: Regex::new(r"\b([A-Z][A-Za-z0-9&]*(?:\s+[A-Z][A-Za-z0-9&]*){0,5})\b")?,
            launched: Regex::new(&format!(
                r"(?i)({NAME_RUN}) launched (?:its |the )?([A-Z][^.,;]+?service)"
            ))?,
            acquired: Regex::new(&format!(r"(?i)({NAME_RUN})\b acquired ({NAME_RUN})\b"))?,
            integrated: Regex::new(r"(?i)integrated with the ([^ .,;]+)")?,
            founded_event: Regex::new(r"(?i)(?:founded|incorporated) in (\d{4})")?,
            launch_event: Regex::new(r"(?i)In (\d{4}), ([A-Z][A-Za-z0-9\s&]+) launched")?,
            acquisition_event: Regex::new(&format!(r"(?i)acquired ({NAME_RUN})\b in (\d{{4}})"))?,
            clause: Regex::new(r"(?i)\s+\b(?:to|for|which|that)\b\s+")?,
        })
    }

    /// "VectorSys to strengthen its offering" -> "VectorSys"
    fn clean_entity_name(&self, name: &str) -> String {
        let name = name.trim();
        self.clause
            .splitn(name, 2)
            .next()
            .unwrap_or(name)
            .trim()
            .to_string()
    }

    fn clean_company_name(&self, name: &str) -> String {
        strip_legal_suffix(&self.clean_entity_name(name))
    }

    fn captures<'t>(re: &Regex, text: &'t str) -> Vec<&'t str> {
        re.captures_iter(text)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .collect()
    }

    fn extract_entities(&self, text: &str, output: &mut ExtractionOutput) {
        let mut seen = HashSet::new();
        let mut add = |output: &mut ExtractionOutput, name: String, entity_type: NodeType| {
            if !name.is_empty() && seen.insert(name.clone()) {
                output.entities.push(ExtractedEntity::new(name, entity_type));
            }
        };

        // Specific types first so they win over the generic company pass.
        for m in Self::captures(&self.partner, text) {
            add(output, self.clean_entity_name(m), NodeType::Partner);
        }
        for m in Self::captures(&self.platform, text) {
            add(output, m.trim().to_string(), NodeType::Platform);
        }
        for m in Self::captures(&self.service, text) {
            add(output, m.trim().to_string(), NodeType::Service);
        }
        for m in Self::captures(&self.capability, text) {
            add(output, title_case(m.trim()), NodeType::Capability);
        }
        for m in Self::captures(&self.company, text) {
            let cleaned = self.clean_company_name(m);
            if is_likely_company(&cleaned) {
                add(output, cleaned, NodeType::Company);
            }
        }
    }

    fn extract_relations(&self, text: &str, output: &mut ExtractionOutput) {
        let companies = output.names_of(&NodeType::Company);
        let platforms = output.names_of(&NodeType::Platform);
        let services = output.names_of(&NodeType::Service);

        if let Some(main) = companies.first() {
            for platform in &platforms {
                output
                    .relations
                    .push(ExtractedRelation::new(main, platform, "operates"));
            }
            for service in &services {
                output
                    .relations
                    .push(ExtractedRelation::new(main, service, "offers"));
            }
        }

        for caps in self.launched.captures_iter(text) {
            if let (Some(from), Some(to)) = (caps.get(1), caps.get(2)) {
                output.relations.push(ExtractedRelation::new(
                    strip_legal_suffix(from.as_str()),
                    to.as_str().trim(),
                    "launched",
                ));
            }
        }

        for caps in self.acquired.captures_iter(text) {
            if let (Some(from), Some(to)) = (caps.get(1), caps.get(2)) {
                let from = self.clean_company_name(from.as_str());
                let to = self.clean_company_name(to.as_str());
                if !from.is_empty() && !to.is_empty() {
                    output
                        .relations
                        .push(ExtractedRelation::new(from, to, "acquired"));
                }
            }
        }

        if let Some(main) = companies.first() {
            for m in Self::captures(&self.partner, text) {
                let partner = self.clean_entity_name(m);
                if !partner.is_empty() {
                    output
                        .relations
                        .push(ExtractedRelation::new(main, partner, "partnered_with"));
                }
            }
        }

        if let Some(service) = services.first() {
            for m in Self::captures(&self.integrated, text) {
                output
                    .relations
                    .push(ExtractedRelation::new(service, m.trim(), "integrated_with"));
            }
        }
    }

    fn extract_events(&self, text: &str, output: &mut ExtractionOutput) {
        let companies = output.names_of(&NodeType::Company);
        let services = output.names_of(&NodeType::Service);

        if let (Some(year), Some(company)) = (
            first_year(&self.founded_event, text, 1),
            companies.first(),
        ) {
            output.events.push(
                ExtractedEvent::new(
                    format!("Incorporation of {company}"),
                    EventKind::Other("Incorporation".into()),
                )
                .with_year(year)
                .with_company(company)
                .with_tag("Milestone"),
            );
        }

        if let Some(caps) = self.launch_event.captures(text) {
            let year = caps.get(1).and_then(|m| m.as_str().parse().ok());
            let company = caps.get(2).map(|m| strip_legal_suffix(m.as_str()));
            if let (Some(year), Some(company), Some(service)) = (year, company, services.first()) {
                output.events.push(
                    ExtractedEvent::new(format!("Launch in {year}"), EventKind::Launch)
                        .with_year(year)
                        .with_company(company)
                        .with_related(service)
                        .with_tag("Launch"),
                );
            }
        }

        if let Some(caps) = self.acquisition_event.captures(text) {
            let acquired = caps
                .get(1)
                .map(|m| self.clean_company_name(m.as_str()))
                .unwrap_or_default();
            let year: Option<i64> = caps.get(2).and_then(|m| m.as_str().parse().ok());
            if let (Some(year), Some(acquirer)) = (year, companies.first()) {
                if !acquired.is_empty() {
                    output.events.push(
                        ExtractedEvent::new(
                            format!("Acquisition of {acquired} in {year}"),
                            EventKind::Acquisition,
                        )
                        .with_year(year)
                        .with_company(acquirer)
                        .with_related(acquired)
                        .with_tag("Acquisition"),
                    );
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl Extractor for RuleBasedExtractor {
    fn strategy(&self) -> ExtractionStrategy {
        ExtractionStrategy::RuleBased
    }

    async fn extract(&self, chunk: &Chunk) -> ExtractionResult<ExtractionOutput> {
        let mut output = ExtractionOutput::new();
        let text = chunk.text.as_str();

        self.extract_entities(text, &mut output);
        self.extract_relations(text, &mut output);
        self.extract_events(text, &mut output);

        tracing::debug!(
            chunk_id = %chunk.chunk_id,
            entities = output.entities.len(),
            relations = output.relations.len(),
            events = output.events.len(),
            "Rule-based extraction finished"
        );

        Ok(output)
    }
}

fn first_year(re: &Regex, text: &str, group: usize) -> Option<i64> {
    re.captures(text)
        .and_then(|caps| caps.get(group))
        .and_then(|m| m.as_str().parse().ok())
}

/// Accepts single-word brands like "TechNova" and multi-word names, rejects
/// place names and sentence starters.
fn is_likely_company(name: &str) -> bool {
    if name.chars().count() < 4 {
        return false;
    }

    let lower = name.to_lowercase();
    if lower
        .split_whitespace()
        .any(|word| NOT_COMPANY_WORDS.contains(&word))
    {
        return false;
    }

    if name.contains(' ') {
        return true;
    }

    name.chars().count() >= 5 && name.chars().next().is_some_and(char::is_uppercase)
}

/// Capitalizes the first letter of every alphabetic run, lowercases the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;

    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }

    out
}
