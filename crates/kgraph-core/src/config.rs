use serde::{Deserialize, Serialize};

use crate::ingest::ExtractionStrategy;

pub const DEFAULT_DOCUMENT: &str = "document.pdf";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-exp";
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown extractor: {0} (expected rule-based or llm)")]
    UnknownExtractor(String),
    #[error("LLM extraction selected but no API key configured (set GEMINI_API_KEY)")]
    MissingApiKey,
    #[error("Invalid LLM endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Settings for the Gemini-backed extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API key; never serialized back out
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    /// Base URL of the generative language REST API
    pub endpoint: String,
    /// Whole-request timeout in seconds
    pub request_timeout_seconds: u64,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            request_timeout_seconds: 60,
            temperature: 0.0,
        }
    }
}

impl LlmConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            api_key: std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            model: std::env::var("GEMINI_MODEL").unwrap_or(defaults.model),
            endpoint: std::env::var("GEMINI_ENDPOINT").unwrap_or(defaults.endpoint),
            request_timeout_seconds: parse_env(
                "GEMINI_TIMEOUT_SECONDS",
                defaults.request_timeout_seconds,
            )?,
            temperature: defaults.temperature,
        })
    }

    /// `{endpoint}/models/{model}:generateContent`
    pub fn generate_url(&self) -> Result<url::Url, ConfigError> {
        let base = self.endpoint.trim_end_matches('/');
        Ok(url::Url::parse(&format!(
            "{base}/models/{}:generateContent",
            self.model
        ))?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.is_none() {
            return Err(ConfigError::MissingApiKey);
        }
        self.generate_url()?;
        Ok(())
    }
}

/// Everything the ingest pipeline needs to know up front. Extractor choice
/// is passed in here rather than read from ambient state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub extractor: ExtractionStrategy,
    /// Document name recorded on every Source node
    pub document_name: String,
    /// Abort on the first extraction failure instead of skipping the chunk
    pub strict: bool,
    #[serde(default)]
    pub llm: LlmConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            extractor: ExtractionStrategy::RuleBased,
            document_name: DEFAULT_DOCUMENT.to_string(),
            strict: false,
            llm: LlmConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let extractor = match std::env::var("KGRAPH_EXTRACTOR") {
            Ok(v) => v.parse()?,
            Err(_) => ExtractionStrategy::default(),
        };

        Ok(Self {
            extractor,
            document_name: std::env::var("KGRAPH_DOCUMENT")
                .unwrap_or_else(|_| DEFAULT_DOCUMENT.to_string()),
            strict: std::env::var("KGRAPH_STRICT")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            llm: LlmConfig::from_env()?,
        })
    }

    #[must_use]
    pub fn with_extractor(mut self, extractor: ExtractionStrategy) -> Self {
        self.extractor = extractor;
        self
    }

    #[must_use]
    pub fn with_document_name(mut self, name: impl Into<String>) -> Self {
        self.document_name = name.into();
        self
    }

    #[must_use]
    pub const fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.extractor == ExtractionStrategy::LlmBased {
            self.llm.validate()?;
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_rule_based() {
        let config = PipelineConfig::default();
        assert_eq!(config.extractor, ExtractionStrategy::RuleBased);
        assert_eq!(config.document_name, DEFAULT_DOCUMENT);
        assert!(!config.strict);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_llm_requires_api_key() {
        let config = PipelineConfig::default().with_extractor(ExtractionStrategy::LlmBased);
        assert!(matches!(config.validate(), Err(ConfigError::MissingApiKey)));

        let mut config = config;
        config.llm.api_key = Some("key".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_generate_url() {
        let config = LlmConfig {
            endpoint: "https://example.test/v1beta/".into(),
            model: "gemini-test".into(),
            ..LlmConfig::default()
        };

        assert_eq!(
            config.generate_url().unwrap().as_str(),
            "https://example.test/v1beta/models/gemini-test:generateContent"
        );
    }

    #[test]
    fn test_api_key_is_not_serialized() {
        let config = LlmConfig {
            api_key: Some("secret".into()),
            ..LlmConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();

        assert!(!json.contains("secret"));
        let parsed: LlmConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.api_key, None);
        assert_eq!(parsed.model, config.model);
    }
}
