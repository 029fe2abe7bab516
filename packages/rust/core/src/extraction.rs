//! Structured-extraction service binding.
//!
//! The orchestrator only sees [`StructuredExtractor`]; [`GeminiExtractor`] is
//! the production implementation talking to the Gemini `generateContent` API.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use siteprofiler_shared::{ModelConfig, Result, SiteProfilerError, truncate_chars};

/// Requested response shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// The model must answer with a JSON document.
    Json,
    /// Free text.
    Text,
}

/// One prompt sent to the model.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub prompt: String,
    pub format: ResponseFormat,
}

impl ModelRequest {
    pub fn json(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            format: ResponseFormat::Json,
        }
    }

    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            format: ResponseFormat::Text,
        }
    }
}

/// A language model that turns a prompt into response text.
#[async_trait]
pub trait StructuredExtractor: Send + Sync {
    /// Run one request and return the raw answer text (possibly empty).
    async fn generate(&self, request: &ModelRequest) -> Result<String>;
}

// ---------------------------------------------------------------------------
// Gemini wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GenerateContentResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CandidateContent {
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// GeminiExtractor
// ---------------------------------------------------------------------------

/// Gemini Developer API client.
#[derive(Clone)]
pub struct GeminiExtractor {
    client: reqwest::Client,
    config: ModelConfig,
}

impl GeminiExtractor {
    pub fn new(config: ModelConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SiteProfilerError::Model(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    fn endpoint_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl StructuredExtractor for GeminiExtractor {
    #[instrument(skip_all, fields(model = %self.config.model, format = ?request.format))]
    async fn generate(&self, request: &ModelRequest) -> Result<String> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart {
                    text: &request.prompt,
                }],
            }],
            generation_config: match request.format {
                ResponseFormat::Json => Some(GenerationConfig {
                    response_mime_type: "application/json",
                }),
                ResponseFormat::Text => None,
            },
        };

        debug!(prompt_chars = request.prompt.chars().count(), "sending model request");

        let resp = self
            .client
            .post(self.endpoint_url())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SiteProfilerError::Model(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(SiteProfilerError::Model(format!(
                "HTTP {status}: {}",
                truncate_chars(&detail, 300)
            )));
        }

        let parsed: GenerateContentResponse = resp
            .json()
            .await
            .map_err(|e| SiteProfilerError::Model(format!("unreadable response body: {e}")))?;

        let text = parsed.text();
        if text.is_empty() {
            warn!("model returned no text");
        }
        Ok(text)
    }
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Parse a JSON answer, tolerating a surrounding Markdown code fence.
///
/// An empty answer parses as `{}`.
pub fn parse_json_response<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let body = strip_code_fence(raw.trim());
    let body = if body.is_empty() { "{}" } else { body };
    serde_json::from_str(body).map_err(|e| {
        SiteProfilerError::ModelResponseMalformed(format!(
            "{e}; response starts with {:?}",
            truncate_chars(body, 80)
        ))
    })
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string ("json") up to the first newline.
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().trim_end_matches("```").trim()
}
