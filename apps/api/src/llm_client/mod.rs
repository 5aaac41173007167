/// LLM Client: the single point of entry for all completion-service calls.
///
/// ARCHITECTURAL RULE: No other module may call the completion API directly.
/// Callers go through the `CompletionService` trait so the credential is always
/// passed in explicitly and tests can substitute a stub.
///
/// One attempt per user action: no retries, no backoff.
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;

/// Sampling temperature for every rewrite.
pub const TEMPERATURE: f32 = 0.7;
/// Output token budget for every rewrite.
pub const MAX_TOKENS: u32 = 1500;

/// A completion-service credential. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Returns `None` for blank input so an empty form field counts as missing.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into().trim().to_string();
        if raw.is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    /// Picks the stored secret first, then whatever the user typed.
    pub fn resolve(stored: Option<&str>, supplied: Option<&str>) -> Option<Self> {
        stored
            .and_then(Self::new)
            .or_else(|| supplied.and_then(Self::new))
    }

    fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("authentication failed: {message}")]
    Unauthorized { message: String },

    #[error("quota exceeded: {message}")]
    QuotaExceeded { message: String },

    #[error("rate limited: {message}")]
    RateLimited { message: String },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("completion service returned empty content")]
    EmptyContent,
}

impl CompletionError {
    /// Short machine-readable tag, used in logs and JSON error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            CompletionError::Unauthorized { .. } => "unauthorized",
            CompletionError::QuotaExceeded { .. } => "quota_exceeded",
            CompletionError::RateLimited { .. } => "rate_limited",
            CompletionError::Api { .. } => "api",
            CompletionError::Network(_) => "network",
            CompletionError::Malformed(_) => "malformed",
            CompletionError::EmptyContent => "empty_content",
        }
    }
}

/// Anything that can turn a prompt into generated text.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, credential: &ApiKey, prompt: &str) -> Result<String, CompletionError>;

    /// Model identifier, for logging.
    fn model(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatResponse {
    /// First choice's content, trimmed. `None` when absent or blank.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
    code: Option<String>,
}

/// HTTP client for an OpenAI-compatible chat-completions endpoint.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    endpoint: String,
    model: String,
}

impl LlmClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.completion_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/chat/completions",
                config.openai_base_url.trim_end_matches('/')
            ),
            model: config.openai_model.clone(),
        })
    }

    /// Makes a single call and returns the full decoded response object.
    pub async fn call(&self, credential: &ApiKey, prompt: &str) -> Result<ChatResponse, CompletionError> {
        let request_body = build_request(&self.model, prompt);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(credential.expose())
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let error = classify_failure(status, &body);
            warn!("Completion API returned {}: {}", status, error.kind());
            return Err(error);
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| CompletionError::Malformed(e.to_string()))?;

        if let Some(usage) = &parsed.usage {
            debug!(
                "Completion call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        Ok(parsed)
    }
}

#[async_trait]
impl CompletionService for LlmClient {
    async fn complete(&self, credential: &ApiKey, prompt: &str) -> Result<String, CompletionError> {
        let response = self.call(credential, prompt).await?;
        response
            .text()
            .map(str::to_string)
            .ok_or(CompletionError::EmptyContent)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

fn build_request<'a>(model: &'a str, prompt: &'a str) -> ChatRequest<'a> {
    ChatRequest {
        model,
        messages: vec![ChatMessage {
            role: "user",
            content: prompt,
        }],
        temperature: TEMPERATURE,
        max_tokens: MAX_TOKENS,
    }
}

/// Maps a non-success HTTP response onto a `CompletionError`.
fn classify_failure(status: StatusCode, body: &str) -> CompletionError {
    let parsed = serde_json::from_str::<ApiErrorEnvelope>(body).ok();
    let is_quota = parsed.as_ref().is_some_and(|e| {
        e.error.code.as_deref() == Some("insufficient_quota")
            || e.error.error_type.as_deref() == Some("insufficient_quota")
    });
    let message = parsed
        .map(|e| e.error.message)
        .unwrap_or_else(|| body.trim().to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CompletionError::Unauthorized { message },
        StatusCode::TOO_MANY_REQUESTS if is_quota => CompletionError::QuotaExceeded { message },
        StatusCode::TOO_MANY_REQUESTS => CompletionError::RateLimited { message },
        _ => CompletionError::Api {
            status: status.as_u16(),
            message,
        },
    }
}
