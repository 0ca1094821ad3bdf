//! Gemini REST client
//!
//! API: `POST {base}/models/{model}:generateContent` with header `x-goog-api-key`.
//! Structured output is requested through `generationConfig.responseMimeType`
//! and `generationConfig.responseSchema`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::llm::{ChatMessage, ChatRole, GenerationRequest, LanguageModel};
use super::transport::build_client;
use crate::models::config::AppConfig;
use crate::models::errors::{AppError, AppResult};
use crate::utils::constants::LLM_TIMEOUT_SECS;

// ============================================
// WIRE TYPES
// ============================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

impl Content {
    fn text(text: &str) -> Self {
        Self {
            role: None,
            parts: vec![Part {
                text: Some(text.to_string()),
            }],
        }
    }

    fn from_message(message: &ChatMessage) -> Self {
        let role = match message.role {
            ChatRole::User => "user",
            ChatRole::Model => "model",
        };
        Self {
            role: Some(role.to_string()),
            ..Self::text(&message.text)
        }
    }
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate
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

fn build_body(request: &GenerationRequest) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: request.messages.iter().map(Content::from_message).collect(),
        system_instruction: request.system_instruction.as_deref().map(Content::text),
        generation_config: request.response_schema.clone().map(|schema| GenerationConfig {
            response_mime_type: "application/json",
            response_schema: schema,
        }),
    }
}

// ============================================
// CLIENT
// ============================================

#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, base_url: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            client: build_client()?,
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(LLM_TIMEOUT_SECS),
        })
    }

    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let key = config.require_gemini_key()?;
        Self::new(key, &config.gemini_model, &config.gemini_base_url)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn generate(&self, request: GenerationRequest) -> AppResult<String> {
        let body = build_body(&request);
        let start = Instant::now();

        debug!(model = %self.model, turns = body.contents.len(), structured = body.generation_config.is_some(), "🤖 generateContent");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::analysis_failed("Model request timed out")
                } else {
                    AppError::analysis_failed(format!("Model request failed: {}", e.without_url()))
                }
            })?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| AppError::analysis_failed(format!("Model response unreadable: {}", e)))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorEnvelope>(&raw)
                .map(|env| format!("{} {}", env.error.status, env.error.message))
                .unwrap_or(raw);
            warn!(status = status.as_u16(), "❌ Gemini API error");
            return Err(AppError::analysis_failed(format!(
                "Model API error ({}): {}",
                status,
                detail.trim()
            )));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&raw)
            .map_err(|e| AppError::analysis_failed(format!("Unexpected model envelope: {}", e)))?;

        let text = parsed.text();
        info!(
            model = %self.model,
            chars = text.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "🤖 Model responded"
        );
        Ok(text)
    }
}
