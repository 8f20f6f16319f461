//! Google Gemini `generateContent` REST client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{ChatModel, ChatModelError, ModelRole, ModelTurn};

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Sampling parameters sent with every request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.9,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 1024,
        }
    }
}

/// Configuration for the Gemini client.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub api_base: String,
    pub generation: GenerationConfig,
}

impl GeminiConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `GEMINI_API_KEY` is not set.
    ///
    /// | Variable          | Required | Default                                       |
    /// |-------------------|----------|-----------------------------------------------|
    /// | `GEMINI_API_KEY`  | yes      | --                                             |
    /// | `GEMINI_MODEL`    | no       | `gemini-2.0-flash`                            |
    /// | `GEMINI_API_BASE` | no       | `https://generativelanguage.googleapis.com`   |
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").ok()?;
        Some(Self {
            api_key,
            model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            api_base: std::env::var("GEMINI_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            generation: GenerationConfig::default(),
        })
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

fn role_name(role: ModelRole) -> &'static str {
    match role {
        ModelRole::User => "user",
        ModelRole::Model => "model",
    }
}

fn build_request<'a>(
    system: &'a str,
    history: &'a [ModelTurn],
    message: &'a str,
    generation: GenerationConfig,
) -> GenerateRequest<'a> {
    let mut contents: Vec<Content<'a>> = history
        .iter()
        .map(|turn| Content {
            role: Some(role_name(turn.role)),
            parts: vec![Part { text: &turn.text }],
        })
        .collect();
    contents.push(Content {
        role: Some("user"),
        parts: vec![Part { text: message }],
    });

    GenerateRequest {
        system_instruction: Content {
            role: None,
            parts: vec![Part { text: system }],
        },
        contents,
        generation_config: generation,
    }
}

/// Concatenate the text parts of the first candidate.
fn extract_text(response: GenerateResponse) -> Result<String, ChatModelError> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .map(|f| f.to_string())
            .unwrap_or_else(|| "no candidates".to_string());
        return Err(ChatModelError::EmptyResponse(reason));
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ChatModelError::EmptyResponse(
            candidate.finish_reason.unwrap_or_else(|| "empty text".to_string()),
        ));
    }
    Ok(text)
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for the Gemini API.
pub struct GeminiClient {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, ChatModelError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl ChatModel for GeminiClient {
    async fn generate(
        &self,
        system: &str,
        history: &[ModelTurn],
        message: &str,
    ) -> Result<String, ChatModelError> {
        let body = build_request(system, history, message, self.config.generation);

        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.config.api_base, self.config.model
            ))
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ChatModelError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        let text = extract_text(parsed)?;
        tracing::debug!(
            model = %self.config.model,
            history_len = history.len(),
            reply_len = text.len(),
            "Gemini reply generated",
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn request_replays_history_then_message() {
        let history = vec![
            ModelTurn {
                role: ModelRole::User,
                text: "hi".into(),
            },
            ModelTurn {
                role: ModelRole::Model,
                text: "hello!".into(),
            },
        ];
        let body =
            serde_json::to_value(build_request("sys", &history, "prices?", GenerationConfig::default()))
                .unwrap();

        assert_eq!(body["systemInstruction"], json!({ "parts": [{ "text": "sys" }] }));
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["contents"][2]["parts"][0]["text"], "prices?");
        assert_eq!(body["generationConfig"]["topK"], 40);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 1024);
    }

    #[test]
    fn extracts_first_candidate_text() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "Mastering " }, { "text": "is $40." }] },
                "finishReason": "STOP"
            }]
        }))
        .unwrap();

        assert_eq!(extract_text(response).unwrap(), "Mastering is $40.");
    }

    #[test]
    fn blocked_prompt_is_empty_response() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        }))
        .unwrap();

        assert_matches!(extract_text(response), Err(ChatModelError::EmptyResponse(r)) if r.contains("SAFETY"));
    }

    #[test]
    fn quota_errors_are_recognised() {
        let err = ChatModelError::Api {
            status: 429,
            body: "RESOURCE_EXHAUSTED".into(),
        };
        assert!(err.is_quota());
        assert!(!ChatModelError::NotConfigured.is_quota());
    }
}
