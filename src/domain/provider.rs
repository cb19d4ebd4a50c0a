use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::error::{AppError, Result};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    OpenAi,
    Anthropic,
    Google,
}

impl AiProvider {
    /// Models the backend accepts for this provider. Anything outside the
    /// list is rejected before a request is issued.
    pub fn allowed_models(&self) -> &'static [&'static str] {
        match self {
            AiProvider::OpenAi => &["gpt-4", "gpt-3.5-turbo", "gpt-4-turbo"],
            AiProvider::Anthropic => &[
                "claude-3-opus-20240229",
                "claude-3-sonnet-20240229",
                "claude-3-haiku-20240307",
            ],
            AiProvider::Google => &["gemini-pro", "gemini-pro-vision"],
        }
    }

    pub fn default_model(&self) -> &'static str {
        self.allowed_models()[0]
    }
}

/// Provider configuration as the backend reports it. The api_key is
/// write-only: it is part of the submission draft and never of a response.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AiProviderConfig {
    pub id: String,
    pub provider: AiProvider,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct AiProviderDraft {
    pub provider: AiProvider,
    #[validate(length(min = 1))]
    pub api_key: String,
    pub model: String,
    #[validate(range(min = 1000, max = 8000))]
    pub max_tokens: u32,
    #[validate(range(min = 0.0, max = 1.0))]
    pub temperature: f32,
}

impl AiProviderDraft {
    pub fn new(provider: AiProvider, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            model: provider.default_model().to_string(),
            max_tokens: 4000,
            temperature: 0.7,
        }
    }

    /// Local validation gate; nothing is sent to the backend unless this
    /// passes.
    pub fn validated(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Please enter your API key".to_string(),
            ));
        }
        if !self
            .provider
            .allowed_models()
            .contains(&self.model.as_str())
        {
            return Err(AppError::ValidationError(format!(
                "Model {} is not available for this provider",
                self.model
            )));
        }
        self.validate()
            .map_err(|e| AppError::ValidationError(e.to_string()))
    }
}
