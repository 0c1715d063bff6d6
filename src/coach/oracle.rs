//! The text-generation service behind race plans.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::OracleConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
}

/// Turns a prompt into text. Implementations must not retry on their own;
/// retry policy belongs to the caller.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, OracleError>;
}

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("OPENAI_API_KEY is not configured")]
    MissingCredential,

    #[error("oracle request timed out after {}s", .0.as_secs_f32())]
    Timeout(Duration),

    #[error("oracle unreachable: {0}")]
    Network(String),

    #[error("oracle rejected the credential (HTTP {0})")]
    Unauthorized(u16),

    #[error("oracle rate limit exceeded")]
    RateLimited,

    #[error("oracle returned HTTP {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("oracle response malformed: {0}")]
    InvalidResponse(String),
}

impl OracleError {
    /// Failures worth one more attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Network(_) | Self::RateLimited => true,
            Self::Upstream { status, .. } => *status >= 500,
            Self::MissingCredential | Self::Unauthorized(_) | Self::InvalidResponse(_) => false,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingCredential => "CONFIG_MISSING_API_KEY",
            Self::Timeout(_) => "ORACLE_TIMEOUT",
            Self::Network(_) => "ORACLE_UNAVAILABLE",
            Self::Unauthorized(_) => "ORACLE_AUTH_FAILED",
            Self::RateLimited => "ORACLE_RATE_LIMITED",
            Self::Upstream { .. } => "ORACLE_ERROR",
            Self::InvalidResponse(_) => "ORACLE_BAD_RESPONSE",
        }
    }
}

/// Chat-completions client for OpenAI-compatible endpoints.
pub struct OpenAiClient {
    http: reqwest::Client,
    config: OracleConfig,
}

impl OpenAiClient {
    pub fn new(config: OracleConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { http, config })
    }

    pub fn has_credential(&self) -> bool {
        self.config.api_key.is_some()
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

#[async_trait]
impl Oracle for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, OracleError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(OracleError::MissingCredential)?;

        let body = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            response_format: self
                .config
                .json_mode
                .then_some(ResponseFormat { kind: "json_object" }),
        };

        let url = format!("{}/chat/completions", self.config.base_url);
        tracing::debug!(model = %self.config.model, %url, "sending completion request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_transport_error(e, self.config.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), &text));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| OracleError::InvalidResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| OracleError::InvalidResponse("response has no message content".into()))
    }
}

fn classify_transport_error(err: reqwest::Error, timeout: Duration) -> OracleError {
    if err.is_timeout() {
        OracleError::Timeout(timeout)
    } else {
        OracleError::Network(err.to_string())
    }
}

fn classify_status(status: u16, body: &str) -> OracleError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.chars().take(200).collect());

    match status {
        401 | 403 => OracleError::Unauthorized(status),
        429 => OracleError::RateLimited,
        _ => OracleError::Upstream { status, message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_upstream_statuses() {
        assert!(matches!(classify_status(401, ""), OracleError::Unauthorized(401)));
        assert!(matches!(classify_status(429, ""), OracleError::RateLimited));

        let err = classify_status(
            503,
            r#"{"error":{"message":"The engine is currently overloaded"}}"#,
        );
        assert!(err.is_transient());
        assert!(err.to_string().contains("overloaded"));

        let err = classify_status(400, "bad request");
        assert!(!err.is_transient());
        assert_eq!(err.code(), "ORACLE_ERROR");
    }

    #[test]
    fn credential_errors_are_permanent() {
        assert!(!OracleError::MissingCredential.is_transient());
        assert!(!OracleError::Unauthorized(401).is_transient());
        assert!(OracleError::Network("reset".into()).is_transient());
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let client = OpenAiClient::new(OracleConfig {
            base_url: "http://127.0.0.1:9".into(),
            ..OracleConfig::default()
        })
        .unwrap();
        assert!(!client.has_credential());

        let err = client
            .complete(&CompletionRequest {
                system: "coach".into(),
                prompt: "plan".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, OracleError::MissingCredential));
    }

    #[test]
    fn serializes_json_mode_only_when_enabled() {
        let body = ChatRequest {
            model: "gpt-4o",
            messages: [
                ChatMessage { role: "system", content: "s" },
                ChatMessage { role: "user", content: "u" },
            ],
            temperature: 0.7,
            max_tokens: 100,
            response_format: None,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("response_format").is_none());
        assert_eq!(value["messages"][1]["role"], "user");
    }
}
