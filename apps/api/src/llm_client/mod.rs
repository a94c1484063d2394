/// LLM Client — the single point of entry for chat-completion calls.
///
/// Speaks the OpenAI-compatible `/chat/completions` protocol (Groq by default).
/// No other module may call the completion endpoint directly; the generation
/// pipeline depends on the [`CompletionClient`] trait so it can be faked in tests.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::LlmConfig;

const MAX_RETRIES: u32 = 3;
const APP_TITLE: &str = "Cover Letter Generator";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("No response generated")]
    EmptyContent,
}

impl LlmError {
    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            LlmError::Api { message, .. } if !message.trim().is_empty() => message.clone(),
            LlmError::Api { status, .. } => format!("API request failed with status {status}"),
            LlmError::Http(e) if e.is_timeout() => "The request timed out".to_string(),
            LlmError::Http(_) => "API request failed".to_string(),
            LlmError::Parse(_) => "The AI service returned an unreadable response".to_string(),
            other => other.to_string(),
        }
    }
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
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<UsageBody>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct UsageBody {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A successful completion.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub usage: TokenUsage,
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<Completion, LlmError>;
}

/// Chat-completion client with retry on 429 and 5xx.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl CompletionClient for LlmClient {
    async fn complete(&self, system: &str, prompt: &str) -> Result<Completion, LlmError> {
        let request_body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Completion attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let mut request = self
                .client
                .post(&self.config.api_url)
                .header("content-type", "application/json")
                .header("X-Title", APP_TITLE)
                .json(&request_body);
            if let Some(key) = &self.config.api_key {
                request = request.bearer_auth(key);
            }

            let response = match request.send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 || status.is_server_error() {
                warn!("Completion API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: extract_error_message(&body),
                });
                continue;
            }

            if !status.is_success() {
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message: extract_error_message(&body),
                });
            }

            let completion = parse_completion(&body)?;
            debug!(
                "Completion succeeded: prompt_tokens={}, completion_tokens={}",
                completion.usage.prompt_tokens, completion.usage.completion_tokens
            );
            return Ok(completion);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

/// Pulls `error.message` out of an API error body, falling back to the raw body.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

/// Reads the first choice's content. A missing or blank payload is an error.
fn parse_completion(body: &str) -> Result<Completion, LlmError> {
    let response: ChatResponse = serde_json::from_str(body)?;

    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .filter(|t| !t.trim().is_empty())
        .ok_or(LlmError::EmptyContent)?;

    let usage = response.usage.unwrap_or_default();
    Ok(Completion {
        text,
        usage: TokenUsage {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_completion_reads_first_choice() {
        let body = r#"{
            "choices": [
                {"message": {"role": "assistant", "content": "Dear Hiring Manager,"}},
                {"message": {"role": "assistant", "content": "ignored"}}
            ],
            "usage": {"prompt_tokens": 120, "completion_tokens": 380, "total_tokens": 500}
        }"#;
        let completion = parse_completion(body).unwrap();
        assert_eq!(completion.text, "Dear Hiring Manager,");
        assert_eq!(
            completion.usage,
            TokenUsage {
                prompt_tokens: 120,
                completion_tokens: 380,
                total_tokens: 500
            }
        );
    }

    #[test]
    fn test_parse_completion_missing_usage_defaults_to_zero() {
        let body = r#"{"choices": [{"message": {"content": "Hello"}}]}"#;
        let completion = parse_completion(body).unwrap();
        assert_eq!(completion.usage, TokenUsage::default());
    }

    #[test]
    fn test_parse_completion_no_choices_is_empty_content() {
        let body = r#"{"choices": []}"#;
        assert!(matches!(parse_completion(body), Err(LlmError::EmptyContent)));
        let body = r#"{"id": "x"}"#;
        assert!(matches!(parse_completion(body), Err(LlmError::EmptyContent)));
    }

    #[test]
    fn test_parse_completion_blank_content_is_empty_content() {
        let body = r#"{"choices": [{"message": {"content": "   "}}]}"#;
        assert!(matches!(parse_completion(body), Err(LlmError::EmptyContent)));
        let body = r#"{"choices": [{"message": {"content": null}}]}"#;
        assert!(matches!(parse_completion(body), Err(LlmError::EmptyContent)));
    }

    #[test]
    fn test_parse_completion_malformed_json() {
        assert!(matches!(parse_completion("<html>"), Err(LlmError::Parse(_))));
    }

    #[test]
    fn test_extract_error_message_from_envelope() {
        let body = r#"{"error": {"message": "Invalid API Key", "type": "invalid_request_error"}}"#;
        assert_eq!(extract_error_message(body), "Invalid API Key");
    }

    #[test]
    fn test_extract_error_message_falls_back_to_body() {
        assert_eq!(extract_error_message(" Bad Gateway \n"), "Bad Gateway");
    }

    #[test]
    fn test_user_message() {
        let api = LlmError::Api {
            status: 401,
            message: "Invalid API Key".to_string(),
        };
        assert_eq!(api.user_message(), "Invalid API Key");

        let blank = LlmError::Api {
            status: 503,
            message: String::new(),
        };
        assert_eq!(blank.user_message(), "API request failed with status 503");

        assert_eq!(LlmError::EmptyContent.user_message(), "No response generated");
    }

    #[test]
    fn test_request_body_shape() {
        let body = ChatRequest {
            model: "llama-3.3-70b-versatile",
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "sys",
                },
                ChatMessage {
                    role: "user",
                    content: "hi",
                },
            ],
            temperature: 0.5,
            max_tokens: 1000,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "llama-3.3-70b-versatile");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
        assert_eq!(json["max_tokens"], 1000);
        assert_eq!(json["temperature"], 0.5);
    }
}
