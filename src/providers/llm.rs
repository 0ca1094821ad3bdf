//! Language model seam
//!
//! The audit service and chat sessions talk to `LanguageModel`; the
//! production implementation is `GeminiClient`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::errors::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
        }
    }
}

/// One generation call
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub system_instruction: Option<String>,
    /// Conversation so far, oldest first; the last entry is the new user turn
    pub messages: Vec<ChatMessage>,
    /// When set, the model must answer with JSON matching this schema
    pub response_schema: Option<serde_json::Value>,
}

impl GenerationRequest {
    pub fn prompt(text: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::user(text)],
            ..Default::default()
        }
    }

    pub fn system(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn schema(mut self, schema: serde_json::Value) -> Self {
        self.response_schema = Some(schema);
        self
    }
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Raw text of the model's answer
    async fn generate(&self, request: GenerationRequest) -> AppResult<String>;
}

/// Placeholder used when no model key is configured. Retrieval, quota and
/// credential management keep working; every generation fails with
/// `CFG_MISSING_ENV`.
pub struct UnconfiguredModel {
    env_var: &'static str,
}

impl UnconfiguredModel {
    pub fn new(env_var: &'static str) -> Self {
        Self { env_var }
    }
}

#[async_trait]
impl LanguageModel for UnconfiguredModel {
    async fn generate(&self, _request: GenerationRequest) -> AppResult<String> {
        Err(AppError::missing_env(self.env_var))
    }
}
