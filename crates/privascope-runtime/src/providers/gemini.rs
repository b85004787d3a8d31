//! Gemini completion backend.
//!
//! Talks to the `generateContent` REST endpoint. The system message, if
//! present, is sent as the request's system instruction; remaining messages
//! become user content.
//!
//! ## Security
//!
//! The API key is held in an [`ApiCredential`]: redacted in `Debug` output,
//! zeroed on drop, exposed only when the request header is built.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::secrets::{ApiCredential, CredentialSource};
use super::{ChatMessage, CompletionBackend, CompletionConfig, CompletionResponse, ProviderError, TokenUsage};
use crate::config::ConfigError;

/// Default REST endpoint base.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model, matching the standard pipeline configuration.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Gemini completion backend.
pub struct GeminiBackend {
    credential: ApiCredential,
    base_url: String,
}

impl std::fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiBackend")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GeminiBackend {
    /// Create a backend with an explicit API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            credential: ApiCredential::new(
                api_key,
                CredentialSource::Programmatic,
                "Gemini API key",
            ),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
        }
    }

    /// Create a backend from the standard environment variable chain.
    pub fn from_env() -> Result<Self, ConfigError> {
        let credential = super::secrets::resolve_gemini_credential()?;
        Ok(Self {
            credential,
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
        })
    }

    /// Set a custom base URL (tests, proxies).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn http_client(&self) -> &reqwest::Client {
        static CLIENT: std::sync::OnceLock<reqwest::Client> = std::sync::OnceLock::new();
        CLIENT.get_or_init(|| {
            reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .build()
                .expect("default reqwest client configuration is valid")
        })
    }
}

/// `generateContent` request format.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

/// `generateContent` response format.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

#[async_trait]
impl CompletionBackend for GeminiBackend {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        // Split out the system message, if any.
        let (system, user_messages): (Option<String>, Vec<ChatMessage>) = {
            let mut system = None;
            let mut others = Vec::new();
            for msg in messages {
                if msg.role == "system" {
                    system = Some(msg.content);
                } else {
                    others.push(msg);
                }
            }
            (system, others)
        };

        let request = GenerateContentRequest {
            system_instruction: system.map(|text| GeminiContent {
                role: None,
                parts: vec![GeminiPart { text }],
            }),
            contents: user_messages
                .into_iter()
                .map(|msg| GeminiContent {
                    role: Some("user".to_string()),
                    parts: vec![GeminiPart { text: msg.content }],
                })
                .collect(),
            generation_config: GenerationConfig {
                temperature: config.temperature,
                max_output_tokens: config.max_tokens,
            },
        };

        // The credential is exposed here, at the point of use, and nowhere
        // else.
        let response = self
            .http_client()
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, config.model
            ))
            .header("x-goog-api-key", self.credential.expose())
            .header("content-type", "application/json")
            .timeout(config.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(config.timeout)
                } else {
                    ProviderError::Http(e.to_string())
                }
            })?;

        let status = response.status();

        if status == 401 || status == 403 {
            return Err(ProviderError::Auth);
        }

        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(ProviderError::RateLimited { retry_after });
        }

        if !status.is_success() {
            let message = match response.json::<GeminiErrorBody>().await {
                Ok(body) => body.error.message,
                Err(e) => format!("unreadable error body: {e}"),
            };
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        let Some(candidate) = body.candidates.into_iter().next() else {
            return Err(ProviderError::Malformed(
                "no candidates in response".to_string(),
            ));
        };

        let content = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let usage = body
            .usage_metadata
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_token_count,
                completion_tokens: u.candidates_token_count,
            })
            .unwrap_or_default();

        Ok(CompletionResponse {
            content,
            usage,
            model: body.model_version.unwrap_or_else(|| config.model.clone()),
            finish_reason: candidate.finish_reason,
        })
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_creation() {
        let backend = GeminiBackend::new("test-key");
        assert_eq!(backend.name(), "gemini");
        assert_eq!(backend.base_url, DEFAULT_GEMINI_BASE_URL);
    }

    #[test]
    fn test_api_key_not_in_debug_output() {
        let secret = "gem-super-secret-key-12345";
        let backend = GeminiBackend::new(secret);

        let debug_output = format!("{backend:?}");
        assert!(
            !debug_output.contains(secret),
            "API key leaked into Debug output"
        );
        assert!(debug_output.contains("[REDACTED]"));
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let request = GenerateContentRequest {
            system_instruction: Some(GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: "You are a privacy analyst.".to_string(),
                }],
            }),
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: "Explain data minimization.".to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.0,
                max_output_tokens: 1024,
            },
        };

        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("systemInstruction").is_some());
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 1024);
        assert!(value["systemInstruction"].get("role").is_none());
    }

    #[test]
    fn test_response_deserializes() {
        let raw = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Hello."}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 3},
            "modelVersion": "gemini-2.0-flash"
        }"#;
        let body: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(body.candidates.len(), 1);
        let usage = body.usage_metadata.unwrap();
        assert_eq!(usage.prompt_token_count, 12);
        assert_eq!(usage.candidates_token_count, 3);
    }

    #[test]
    fn test_error_body_deserializes() {
        let raw = r#"{"error": {"code": 429, "message": "Resource exhausted", "status": "RESOURCE_EXHAUSTED"}}"#;
        let body: GeminiErrorBody = serde_json::from_str(raw).unwrap();
        assert_eq!(body.error.message, "Resource exhausted");
    }
}
