//! Gemini Model Provider
//!
//! Implementation of `ModelProvider` against the Google Generative
//! Language API's `generateContent` endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use mindflow_core::{
    error::{AgentError, Result},
    message::{Message, Role},
    provider::{Completion, FinishReason, GenerationOptions, ModelProvider, TokenUsage},
};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini provider configuration
#[derive(Clone, Debug)]
pub struct GeminiConfig {
    /// API key for the Generative Language API
    pub api_key: String,

    /// Model identifier
    pub model: String,

    /// API base URL
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: "gemini-pro".into(),
            base_url: DEFAULT_BASE_URL.into(),
            timeout_secs: 120,
        }
    }

    /// Build configuration from environment variables. `GEMINI_API_KEY` is
    /// required; `GEMINI_MODEL` and `GEMINI_BASE_URL` override defaults.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| AgentError::Config("GEMINI_API_KEY is not set".into()))?;

        let mut config = Self::new(api_key);
        if let Ok(model) = std::env::var("GEMINI_MODEL") {
            config.model = model;
        }
        if let Ok(base_url) = std::env::var("GEMINI_BASE_URL") {
            config.base_url = base_url;
        }
        Ok(config)
    }
}

/// Gemini LLM provider
pub struct GeminiProvider {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiProvider {
    /// Create from configuration
    pub fn from_config(config: GeminiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(GeminiConfig::from_env()?)
    }

    /// The configured default model identifier.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn generate_url(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.config.base_url, model, self.config.api_key
        )
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<WireContent>,
    generation_config: WireGenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct WireContent {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Serialize, Deserialize)]
struct WirePart {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    temperature: f32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
    prompt_feedback: Option<WirePromptFeedback>,
    usage_metadata: Option<WireUsage>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCandidate {
    content: Option<WireContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

/// Convert gateway messages to Gemini content turns. Gemini has no system
/// role in this API version; the seed exchange already carries instructions
/// as a user turn.
fn convert_messages(messages: &[Message]) -> Vec<WireContent> {
    messages
        .iter()
        .map(|m| {
            let role = match m.role {
                Role::System | Role::User => "user",
                Role::Assistant => "model",
            };
            WireContent {
                role: role.into(),
                parts: vec![WirePart {
                    text: m.content.clone(),
                }],
            }
        })
        .collect()
}

/// Map a decoded API response to a completion, surfacing safety blocks as
/// their own error kind so the gateway's recovery policy can see them.
fn convert_completion(response: GenerateResponse, model: &str) -> Result<Completion> {
    let block_reason = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref());
    if let Some(reason) = block_reason.filter(|r| r.contains("SAFETY")) {
        return Err(AgentError::SafetyDeclined(format!(
            "prompt blocked: {reason}"
        )));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| AgentError::Provider("response has no candidates".into()))?;

    let finish_reason = candidate.finish_reason.as_deref().map(|reason| {
        if reason.contains("SAFETY") {
            FinishReason::Safety
        } else {
            match reason {
                "STOP" => FinishReason::Stop,
                "MAX_TOKENS" => FinishReason::Length,
                _ => FinishReason::Error,
            }
        }
    });

    if finish_reason == Some(FinishReason::Safety) {
        return Err(AgentError::SafetyDeclined(
            "candidate terminated: SAFETY".into(),
        ));
    }

    let content = candidate
        .content
        .map(|c| {
            c.parts
                .into_iter()
                .map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if content.is_empty() {
        return Err(AgentError::Provider("response has no text parts".into()));
    }

    Ok(Completion {
        content,
        model: model.to_string(),
        usage: response.usage_metadata.map(|u| TokenUsage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        }),
        finish_reason,
    })
}

#[async_trait]
impl ModelProvider for GeminiProvider {
    async fn generate(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let request = GenerateRequest {
            contents: convert_messages(messages),
            generation_config: WireGenerationConfig {
                temperature: options.temperature,
                top_p: options.top_p,
                max_output_tokens: options.max_tokens,
            },
        };

        let response = self
            .client
            .post(self.generate_url(&options.model))
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(AgentError::ProviderUnavailable(format!(
                "Gemini returned {status}"
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Provider(format!(
                "Gemini returned {status}: {body}"
            )));
        }

        let decoded: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Provider(format!("undecodable response: {e}")))?;

        convert_completion(decoded, &options.model)
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/models?key={}", self.config.base_url, self.config.api_key);
        match self.client.get(url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => {
                tracing::warn!("Gemini health check failed: {}", e);
                Ok(false)
            }
        }
    }
}
