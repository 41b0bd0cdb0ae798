use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::extractor::{
    EventKind, ExtractionError, ExtractionOutput, ExtractionResult, ExtractionStrategy, Extractor,
};
use crate::config::LlmConfig;
use crate::node::NodeType;
use crate::relation::Relation;
use crate::source::Chunk;

/// Relations the model is allowed to emit.
const ALLOWED_RELATIONS: [Relation; 8] = [
    Relation::Operates,
    Relation::Offers,
    Relation::Launched,
    Relation::Acquired,
    Relation::PartneredWith,
    Relation::IntegratedWith,
    Relation::HasEvent,
    Relation::DescribedIn,
];

const PROMPT: &str = r#"Extract entities, relations, and events from the text following STRICT rules.

1. ALLOWED ENTITY TYPES ONLY:
   - Company: business organizations
   - Platform: technology platforms
   - Service: products or services offered
   - Partner: business partners
   - Capability: technical or organizational capabilities
   - Event: temporal milestones (launch, acquisition, incorporation)

2. NEVER create entities for people, users, roles, customers, beneficiaries,
   or generic concepts that are not technical capabilities.

3. ALLOWED RELATIONS ONLY (exact strings):
   operates (Company -> Platform), offers (Company -> Service),
   launched (Company/Event -> Service), acquired (Company/Event -> Company),
   partnered_with (Company -> Partner), integrated_with (Service -> Platform)

4. EVENTS need name, type (Launch|Acquisition|Milestone), year, the company
   that has the event, the entity it relates to, and tags such as ["Launch"].

5. If something is ambiguous, omit it. Only extract what is explicitly stated.

Return ONLY valid JSON, no markdown and no explanations:
{
  "entities": [{"name": "EntityName", "type": "Company|Platform|Service|Partner|Capability", "attributes": {}}],
  "relations": [{"from": "EntityName1", "to": "EntityName2", "relation": "operates|offers|launched|acquired|partnered_with|integrated_with"}],
  "events": [{"name": "Event description", "type": "Launch|Acquisition|Milestone", "year": 2023, "company": "CompanyName", "related_to": "EntityName", "tags": ["Launch"]}]
}

Text to analyze:
"#;

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    response_mime_type: &'static str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ReplyPart>,
}

#[derive(Deserialize)]
struct ReplyPart {
    #[serde(default)]
    text: String,
}

/// Extraction through the Gemini `generateContent` REST API.
///
/// Replies are parsed as [`ExtractionOutput`] JSON and then filtered down to
/// the types and relations the graph understands.
pub struct LlmExtractor {
    config: LlmConfig,
    client: Client,
}

impl LlmExtractor {
    pub fn new(config: LlmConfig) -> ExtractionResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        Ok(Self { config, client })
    }

    #[must_use]
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn prompt(text: &str) -> String {
        format!("{PROMPT}{text}\n\nJSON output:")
    }

    async fn generate(&self, prompt: &str) -> ExtractionResult<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| ExtractionError::ModelUnavailable("GEMINI_API_KEY is not set".into()))?;

        let url = self
            .config
            .generate_url()
            .map_err(|e| ExtractionError::ModelUnavailable(e.to_string()))?;

        let request = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                response_mime_type: "application/json",
            },
        };

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ExtractionError::RateLimited);
        }
        if [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN, StatusCode::NOT_FOUND].contains(&status) {
            return Err(ExtractionError::ModelUnavailable(format!(
                "{} returned {status}",
                self.config.model
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractionError::Failed(format!("HTTP {status}: {body}")));
        }

        let reply: GenerateResponse = response.json().await?;
        let text: String = reply
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ExtractionError::InvalidResponse("empty reply".into()));
        }

        Ok(text)
    }
}

#[async_trait::async_trait]
impl Extractor for LlmExtractor {
    fn strategy(&self) -> ExtractionStrategy {
        ExtractionStrategy::LlmBased
    }

    async fn extract(&self, chunk: &Chunk) -> ExtractionResult<ExtractionOutput> {
        let reply = self.generate(&Self::prompt(&chunk.text)).await?;
        let output: ExtractionOutput = serde_json::from_str(&strip_code_fences(&reply))?;

        Ok(retain_allowed(output))
    }
}

/// Models like to wrap JSON in a fenced block even when told not to.
fn strip_code_fences(reply: &str) -> String {
    let trimmed = reply.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }

    let mut lines: Vec<&str> = trimmed.lines().collect();
    if lines.len() > 2 {
        lines.remove(0);
        lines.pop();
    }

    lines
        .join("\n")
        .replace("```json", "")
        .replace("```", "")
        .trim()
        .to_string()
}

fn retain_allowed(mut output: ExtractionOutput) -> ExtractionOutput {
    let before = (
        output.entities.len(),
        output.relations.len(),
        output.events.len(),
    );

    output.entities.retain(|e| {
        matches!(
            e.entity_type,
            NodeType::Company
                | NodeType::Platform
                | NodeType::Service
                | NodeType::Partner
                | NodeType::Capability
                | NodeType::Event
        )
    });
    output
        .relations
        .retain(|r| ALLOWED_RELATIONS.iter().any(|rel| rel.as_str() == r.relation));
    output.events.retain(|e| {
        !e.name.trim().is_empty()
            && matches!(
                e.kind,
                EventKind::Launch | EventKind::Acquisition | EventKind::Milestone
            )
    });

    let dropped = (before.0 - output.entities.len())
        + (before.1 - output.relations.len())
        + (before.2 - output.events.len());
    if dropped > 0 {
        tracing::debug!("Dropped {} out-of-vocabulary records from model reply", dropped);
    }

    output
}
