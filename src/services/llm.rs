// src/services/llm.rs
//! Structured-generation client for the supported LLM providers
//!
//! Maps a (provider, model, credential) triple to one outbound completion
//! call configured for structured output: the response must parse directly
//! into CvContent or the call fails with SchemaViolation. Providers are a
//! closed set; an unknown identifier fails before any network traffic.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::env;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::common::CvContent;

const DEFAULT_GOOGLE_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com";

// The original system had no client-side timeout; generation calls now fail
// with a provider error instead of hanging forever.
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider '{0}' not supported")]
    UnsupportedProvider(String),

    #[error("Model output did not match the CV content schema: {0}")]
    SchemaViolation(String),

    #[error("Provider request failed: {0}")]
    Provider(String),
}

/// Closed set of supported generation providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Google,
    Groq,
}

impl Provider {
    pub fn parse(id: &str) -> Result<Self, LlmError> {
        match id.to_lowercase().as_str() {
            "google" => Ok(Provider::Google),
            "groq" => Ok(Provider::Groq),
            other => Err(LlmError::UnsupportedProvider(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::Groq => "groq",
        }
    }
}

// ============================================================================
// Wire types - Google generateContent
// ============================================================================

#[derive(Debug, Serialize)]
struct GeminiRequest {
    #[serde(rename = "systemInstruction")]
    system_instruction: GeminiContent,
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
    #[serde(rename = "responseSchema")]
    response_schema: Value,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

// ============================================================================
// Wire types - Groq (OpenAI-compatible) chat completions
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    response_format: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

// ============================================================================
// Service
// ============================================================================

#[derive(Debug)]
pub struct LlmService {
    client: Client,
    google_base_url: String,
    groq_base_url: String,
}

impl LlmService {
    pub fn new() -> Self {
        Self::with_base_urls(
            env::var("GOOGLE_API_BASE").unwrap_or_else(|_| DEFAULT_GOOGLE_BASE_URL.to_string()),
            env::var("GROQ_API_BASE").unwrap_or_else(|_| DEFAULT_GROQ_BASE_URL.to_string()),
        )
    }

    /// Build a service against explicit endpoints (used by tests and for
    /// proxy-style deployments)
    pub fn with_base_urls(google_base_url: String, groq_base_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            google_base_url,
            groq_base_url,
        }
    }

    /// Run one structured-generation call and parse the result into
    /// CvContent. No retry: any failure is terminal for this attempt.
    pub async fn generate_cv(
        &self,
        provider_id: &str,
        model: &str,
        api_key: &str,
        system_instruction: &str,
    ) -> Result<CvContent, LlmError> {
        let provider = Provider::parse(provider_id)?;

        debug!(provider = provider.as_str(), model = %model, "Dispatching structured generation request");

        let raw = match provider {
            Provider::Google => {
                self.generate_google(model, api_key, system_instruction)
                    .await?
            }
            Provider::Groq => self.generate_groq(model, api_key, system_instruction).await?,
        };

        let content: CvContent =
            serde_json::from_str(&raw).map_err(|e| LlmError::SchemaViolation(e.to_string()))?;

        info!(provider = provider.as_str(), model = %model, "Structured generation completed");
        Ok(content)
    }

    async fn generate_google(
        &self,
        model: &str,
        api_key: &str,
        system_instruction: &str,
    ) -> Result<String, LlmError> {
        let request = GeminiRequest {
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: system_instruction.to_string(),
                }],
            },
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: USER_PROMPT.to_string(),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: gemini_content_schema(),
            },
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.google_base_url.trim_end_matches('/'),
            model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Provider(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, "Google generateContent request failed");
            return Err(LlmError::Provider(format!(
                "HTTP {}: {}",
                status,
                truncate(&error_text, 200)
            )));
        }

        let body: GeminiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Provider(format!("unexpected response shape: {}", e)))?;

        body.candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.clone())
            .ok_or_else(|| LlmError::Provider("no candidates in response".to_string()))
    }

    async fn generate_groq(
        &self,
        model: &str,
        api_key: &str,
        system_instruction: &str,
    ) -> Result<String, LlmError> {
        let request = ChatCompletionRequest {
            model: model.to_string(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_instruction.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: USER_PROMPT.to_string(),
                },
            ],
            response_format: json!({
                "type": "json_schema",
                "json_schema": {
                    "name": "cv_content",
                    "schema": content_json_schema(),
                }
            }),
        };

        let url = format!(
            "{}/openai/v1/chat/completions",
            self.groq_base_url.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Provider(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, "Groq chat completion request failed");
            return Err(LlmError::Provider(format!(
                "HTTP {}: {}",
                status,
                truncate(&error_text, 200)
            )));
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Provider(format!("unexpected response shape: {}", e)))?;

        body.choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| LlmError::Provider("no choices in response".to_string()))
    }
}

impl Default for LlmService {
    fn default() -> Self {
        Self::new()
    }
}

const USER_PROMPT: &str = "Optimize the CV data for the target job description.";

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max).collect()
    }
}

// ============================================================================
// Output schema
// ============================================================================

/// JSON Schema for CvContent, sent to providers that accept standard schemas
fn content_json_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "professional_summary": {"type": "string"},
            "core_competencies": {
                "type": "object",
                "properties": {
                    "technical_skills": {"type": "array", "items": {"type": "string"}}
                },
                "required": ["technical_skills"]
            },
            "professional_experience": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "job_title": {"type": "string"},
                        "company": {"type": "string"},
                        "location": {"type": "string"},
                        "start_date": {"type": "string"},
                        "end_date": {"type": "string"},
                        "stack": {"type": "string"},
                        "achievements": {"type": "array", "items": {"type": "string"}}
                    },
                    "required": [
                        "job_title", "company", "location",
                        "start_date", "end_date", "stack", "achievements"
                    ]
                }
            },
            "education": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "degree": {"type": "string"},
                        "institution": {"type": "string"},
                        "location": {"type": "string"},
                        "graduation_year": {"type": "string"},
                        "start_year": {"type": "string"},
                        "details": {"type": "string"}
                    },
                    "required": ["degree", "institution", "location", "graduation_year"]
                }
            },
            "courses": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "provider": {"type": "string"},
                        "location": {"type": "string"},
                        "year": {"type": "string"},
                        "description": {"type": "string"}
                    },
                    "required": ["name", "provider", "location", "year", "description"]
                }
            },
            "key_projects": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "period": {"type": "string"},
                        "description": {"type": "string"},
                        "technologies": {"type": "array", "items": {"type": "string"}},
                        "details": {"type": "string"}
                    },
                    "required": ["name", "period", "description", "technologies", "details"]
                }
            },
            "languages": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "language": {"type": "string"},
                        "proficiency": {"type": "string"}
                    },
                    "required": ["language", "proficiency"]
                }
            }
        },
        "required": [
            "professional_summary", "core_competencies", "professional_experience",
            "education", "courses", "key_projects", "languages"
        ]
    })
}

/// Same schema in the Gemini responseSchema dialect (uppercase type names,
/// no additionalProperties)
fn gemini_content_schema() -> Value {
    let mut schema = content_json_schema();
    to_gemini_dialect(&mut schema);
    schema
}

fn to_gemini_dialect(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(type_name)) = map.get_mut("type") {
                *type_name = type_name.to_uppercase();
            }
            map.remove("additionalProperties");
            for (_, child) in map.iter_mut() {
                to_gemini_dialect(child);
            }
        }
        Value::Array(items) => {
            for item in items {
                to_gemini_dialect(item);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parse_known_ids() {
        assert_eq!(Provider::parse("google").unwrap(), Provider::Google);
        assert_eq!(Provider::parse("Groq").unwrap(), Provider::Groq);
    }

    #[test]
    fn test_provider_parse_unknown_id() {
        let err = Provider::parse("not-a-real-provider").unwrap_err();
        assert!(matches!(err, LlmError::UnsupportedProvider(p) if p == "not-a-real-provider"));
    }

    #[tokio::test]
    async fn test_unsupported_provider_fails_before_network() {
        // Unroutable base URLs: if dispatch attempted a network call the
        // error would be a Provider error, not UnsupportedProvider
        let service = LlmService::with_base_urls(
            "http://192.0.2.1".to_string(),
            "http://192.0.2.1".to_string(),
        );

        let err = service
            .generate_cv("not-a-real-provider", "some-model", "key", "instruction")
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::UnsupportedProvider(_)));
    }

    #[test]
    fn test_gemini_schema_dialect() {
        let schema = gemini_content_schema();
        assert_eq!(schema["type"], "OBJECT");
        assert_eq!(schema["properties"]["professional_summary"]["type"], "STRING");
        assert_eq!(
            schema["properties"]["professional_experience"]["items"]["type"],
            "OBJECT"
        );
    }

    #[test]
    fn test_json_schema_requires_all_sections() {
        let schema = content_json_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert!(required.contains(&"professional_summary"));
        assert!(required.contains(&"education"));
        assert!(required.contains(&"languages"));
    }
}
