use std::future::Future;
use std::time::Duration;

use base64::Engine;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use crate::services::prompt::PromptPayload;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Maximum length of an upstream error body kept in our error messages.
const ERROR_BODY_LIMIT: usize = 512;

/// The generative-model interface consumed by the vision extractor and the
/// analysis pipeline.
///
/// Implementations must not retry internally; retry policy belongs to the
/// caller's enqueueing layer.
pub trait TextGenerator: Send + Sync {
    /// Invoke the model constrained to JSON output matching `response_schema`
    /// and return the parsed JSON document.
    fn generate(
        &self,
        payload: &PromptPayload,
        response_schema: &Value,
    ) -> impl Future<Output = Result<Value, GenerationError>> + Send;
}

/// Client for the Gemini `generateContent` REST API, bound to one model id.
///
/// The vision stage and the module stage each get their own instance so the
/// two model ids can be configured independently.
pub struct GeminiClient {
    http: Client,
    api_key: String,
    model: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Default, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GeminiClient {
    /// `timeout` is the per-call ceiling for one outbound request.
    pub fn new(api_key: &str, model: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    fn request_body(payload: &PromptPayload, response_schema: &Value) -> Value {
        let mut parts: Vec<Value> = Vec::with_capacity(payload.images.len() + 1);

        for image in &payload.images {
            parts.push(serde_json::json!({
                "inline_data": {
                    "mime_type": image.mime_type,
                    "data": base64::engine::general_purpose::STANDARD.encode(&image.data),
                }
            }));
        }

        if !payload.text.is_empty() {
            parts.push(serde_json::json!({ "text": payload.text }));
        }

        serde_json::json!({
            "system_instruction": { "parts": [{ "text": payload.system }] },
            "contents": [{ "role": "user", "parts": parts }],
            "generationConfig": {
                "response_mime_type": "application/json",
                "response_schema": response_schema,
            }
        })
    }
}

impl TextGenerator for GeminiClient {
    async fn generate(
        &self,
        payload: &PromptPayload,
        response_schema: &Value,
    ) -> Result<Value, GenerationError> {
        let url = format!("{}/models/{}:generateContent", GEMINI_BASE_URL, self.model);
        let body = Self::request_body(payload, response_schema);

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .map(|t| truncate(&t, ERROR_BODY_LIMIT))
                .unwrap_or_default();

            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(GenerationError::RateLimited(message));
            }
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body_text = response
            .text()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        // A well-formed call that answers with an unparseable envelope is a
        // validation failure, not a transport one: the request completed.
        let envelope: GenerateContentResponse = serde_json::from_str(&body_text).map_err(|e| {
            GenerationError::Validation(format!("unparseable generateContent response: {}", e))
        })?;

        let text = envelope
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                GenerationError::Validation("response contained no candidate text".to_string())
            })?;

        serde_json::from_str(text).map_err(|e| {
            GenerationError::Validation(format!("candidate text is not valid JSON: {}", e))
        })
    }
}

fn truncate(s: &str, limit: usize) -> String {
    if s.len() <= limit {
        s.to_string()
    } else {
        let mut end = limit;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}

/// Failure kinds of one generation call.
///
/// Callers must be able to tell "the model's answer was unusable"
/// (`Validation`) apart from "the call itself could not be made"
/// (`RateLimited`, `Transport`, `Api`).
#[derive(Debug, Clone, thiserror::Error)]
pub enum GenerationError {
    #[error("Gemini rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("transport failure calling Gemini: {0}")]
    Transport(String),

    #[error("Gemini API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Gemini response failed validation: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::prompt::{ImagePayload, PromptBuilder};

    fn sample_payload() -> PromptPayload {
        PromptBuilder::new()
            .system("You are a test model.")
            .image(ImagePayload {
                mime_type: "image/png".to_string(),
                data: vec![0x89, 0x50, 0x4e, 0x47],
            })
            .instruction("Describe the product.")
            .build()
            .unwrap()
    }

    #[test]
    fn test_request_body_shape() {
        let payload = sample_payload();
        let schema = serde_json::json!({ "type": "OBJECT" });
        let body = GeminiClient::request_body(&payload, &schema);

        assert_eq!(
            body["system_instruction"]["parts"][0]["text"],
            "You are a test model."
        );

        // One image part followed by one text part, in that order
        let parts = body["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert!(parts[0].get("inline_data").is_some());
        assert!(parts[1].get("text").is_some());

        assert_eq!(
            body["generationConfig"]["response_mime_type"],
            "application/json"
        );
        assert_eq!(body["generationConfig"]["response_schema"], schema);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let s = "répétition".repeat(100);
        let t = truncate(&s, 11);
        assert!(t.ends_with("..."));
        assert!(t.len() <= 14);
    }
}
