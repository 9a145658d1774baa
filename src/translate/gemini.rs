//! Gemini REST client.
//!
//! Thin wrapper over the `generateContent` endpoint covering the two
//! call shapes the orchestrator needs: text completion and vision
//! completion with inline image bytes. Failure statuses are mapped to
//! the crate error taxonomy so callers can tell a throttling signal
//! from a revoked credential.

use crate::error::{Result, ScrapeError};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini content part
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

/// Inline data (for images)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

/// Content in a message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

/// Generation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

/// Generate content request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

/// Generate content response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// Candidate response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Content,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Error response from the API
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiError {
    pub error: GeminiErrorDetail,
}

/// Error detail
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiErrorDetail {
    pub code: i32,
    pub message: String,
    #[serde(default)]
    pub status: String,
}

/// Gemini API client
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a client against the production endpoint
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client against a custom endpoint (used by tests)
    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| ScrapeError::HttpFailed(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http, api_key, base_url: base_url.into() })
    }

    /// Text completion: prompt in, first candidate text out
    pub async fn generate_text(&self, model: &str, prompt: &str, config: GenerationConfig) -> Result<String> {
        self.generate(model, vec![Part::Text { text: prompt.to_string() }], config).await
    }

    /// Vision completion: instruction plus inline image bytes
    pub async fn generate_vision(
        &self,
        model: &str,
        instruction: &str,
        image_bytes: &[u8],
        mime_type: &str,
    ) -> Result<String> {
        let parts = vec![
            Part::Text { text: instruction.to_string() },
            Part::InlineData {
                inline_data: InlineData { mime_type: mime_type.to_string(), data: BASE64.encode(image_bytes) },
            },
        ];
        self.generate(model, parts, GenerationConfig::default()).await
    }

    async fn generate(&self, model: &str, parts: Vec<Part>, config: GenerationConfig) -> Result<String> {
        let url = format!("{}/models/{}:generateContent?key={}", self.base_url, model, self.api_key);
        let request = GenerateContentRequest {
            contents: vec![Content { role: "user".to_string(), parts }],
            generation_config: Some(config),
        };

        log::debug!("gemini generate: model={}", model);

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ScrapeError::HttpFailed(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ScrapeError::HttpFailed(e.to_string()))?;

        if !status.is_success() {
            let message = match serde_json::from_str::<GeminiError>(&body) {
                Ok(parsed) => parsed.error.message,
                Err(_) => body,
            };
            return Err(ScrapeError::from_model_status(status.as_u16(), message));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| ScrapeError::ModelRequestFailed(format!("Failed to parse response: {}", e)))?;

        let text = parsed
            .candidates
            .first()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .iter()
                    .filter_map(|part| match part {
                        Part::Text { text } => Some(text.as_str()),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ScrapeError::ModelRequestFailed("empty completion".to_string()));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn completion_body(text: &str) -> serde_json::Value {
        json!({
            "candidates": [
                { "content": { "role": "model", "parts": [{ "text": text }] } }
            ]
        })
    }

    #[test]
    fn test_request_serialization_shape() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part::Text { text: "hello".to_string() }],
            }],
            generation_config: Some(GenerationConfig { temperature: Some(0.2), max_output_tokens: Some(10) }),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 10);
    }

    #[test]
    fn test_response_deserialization() {
        let body = completion_body("안녕하세요");
        let response: GenerateContentResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.candidates.len(), 1);
        match &response.candidates[0].content.parts[0] {
            Part::Text { text } => assert_eq!(text, "안녕하세요"),
            _ => panic!("expected a text part"),
        }
    }

    #[tokio::test]
    async fn test_generate_text_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Handmade leather wallet")))
            .mount(&server)
            .await;

        let client = GeminiClient::with_base_url("test-key".to_string(), server.uri()).unwrap();
        let text = client
            .generate_text("gemini-1.5-flash", "translate", GenerationConfig::default())
            .await
            .unwrap();
        assert_eq!(text, "Handmade leather wallet");
    }

    #[tokio::test]
    async fn test_generate_text_maps_throttle() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": { "code": 429, "message": "quota exceeded", "status": "RESOURCE_EXHAUSTED" }
            })))
            .mount(&server)
            .await;

        let client = GeminiClient::with_base_url("test-key".to_string(), server.uri()).unwrap();
        let err = client
            .generate_text("gemini-1.5-flash", "translate", GenerationConfig::default())
            .await
            .unwrap_err();
        assert!(err.is_throttle());
    }

    #[tokio::test]
    async fn test_generate_text_maps_auth_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": { "code": 403, "message": "API key revoked", "status": "PERMISSION_DENIED" }
            })))
            .mount(&server)
            .await;

        let client = GeminiClient::with_base_url("test-key".to_string(), server.uri()).unwrap();
        let err = client
            .generate_text("gemini-1.5-flash", "translate", GenerationConfig::default())
            .await
            .unwrap_err();
        assert!(err.is_auth());
    }
}
