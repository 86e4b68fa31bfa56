//! Gemini `generateContent` client.
//!
//! Calls are instrumented and log model names, latencies, and response sizes (not contents).
//! The API key travels in the `x-goog-api-key` header and is never logged.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::error::GenerationError;
use crate::llm::{SamplingConfig, TextGenerator};

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Clone)]
pub struct GeminiClient {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
}

impl GeminiClient {
  /// Construct the client if we find GEMINI_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.trim().is_empty())?;
    let base_url = std::env::var("GEMINI_BASE_URL")
      .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta".into());
    Self::new(api_key, base_url)
  }

  pub fn new(api_key: String, base_url: String) -> Option<Self> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .ok()?;
    Some(Self { client, api_key, base_url: base_url.trim_end_matches('/').to_string() })
  }
}

#[async_trait]
impl TextGenerator for GeminiClient {
  #[instrument(level = "info", skip(self, sampling, prompt), fields(model = %model, prompt_len = prompt.len()))]
  async fn generate(
    &self,
    model: &str,
    sampling: &SamplingConfig,
    prompt: &str,
  ) -> Result<String, GenerationError> {
    let url = format!("{}/models/{}:generateContent", self.base_url, model);
    let body = GeminiRequest {
      contents: vec![GeminiContent {
        role: Some("user".into()),
        parts: vec![GeminiPart { text: prompt.to_string() }],
      }],
      generation_config: GeminiGenerationConfig {
        temperature: sampling.temperature,
        max_output_tokens: sampling.max_output_tokens,
        top_p: sampling.top_p,
      },
    };

    let start = std::time::Instant::now();
    let res = self.client.post(&url)
      .header(API_KEY_HEADER, &self.api_key)
      .header(USER_AGENT, "quizgen-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .json(&body).send().await?;

    let status = res.status();
    let bytes = res.bytes().await?;
    let parsed: Option<GeminiResponse> = serde_json::from_slice(&bytes).ok();

    if !status.is_success() {
      let msg = parsed
        .and_then(|r| r.error)
        .and_then(|e| e.message)
        .unwrap_or_else(|| String::from_utf8_lossy(&bytes).into_owned());
      error!(target: "quizgen_backend", %status, "Gemini call rejected");
      return Err(GenerationError::Transport(format!("Gemini HTTP {}: {}", status, msg)));
    }

    let gemini = parsed
      .ok_or_else(|| GenerationError::Transport("Gemini response was not valid JSON".into()))?;
    if let Some(err) = gemini.error {
      let msg = err.message.unwrap_or_else(|| "unspecified error".into());
      return Err(GenerationError::Transport(format!("Gemini API error: {}", msg)));
    }

    let text = gemini
      .candidates
      .into_iter()
      .find_map(|c| c.content)
      .and_then(|content| content.parts.into_iter().find_map(|p| p.text))
      .unwrap_or_default();

    info!(elapsed = ?start.elapsed(), response_len = text.len(), "Gemini response received");
    Ok(text)
  }

  fn backend_name(&self) -> &str {
    "gemini"
  }
}

// --- generateContent DTOs ---

#[derive(Debug, Serialize)]
struct GeminiRequest {
  contents: Vec<GeminiContent>,
  #[serde(rename = "generationConfig")]
  generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
  parts: Vec<GeminiPart>,
  #[serde(skip_serializing_if = "Option::is_none")]
  role: Option<String>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
  text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
  temperature: f32,
  max_output_tokens: u32,
  top_p: f32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
  #[serde(default)]
  candidates: Vec<GeminiCandidate>,
  #[serde(default)]
  error: Option<GeminiError>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
  content: Option<GeminiContentResponse>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
  #[serde(default)]
  parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
struct GeminiPartResponse {
  text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
  message: Option<String>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use wiremock::matchers::{body_partial_json, header, method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  const SAMPLING: SamplingConfig = SamplingConfig { temperature: 0.2, max_output_tokens: 1500, top_p: 0.8 };

  #[tokio::test]
  async fn posts_generation_config_and_extracts_first_text_part() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/models/gemini-2.5-flash:generateContent"))
      .and(header("x-goog-api-key", "g-key"))
      .and(body_partial_json(json!({"generationConfig": {"maxOutputTokens": 1500}})))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{"content": {"parts": [{"text": "```json\n[]\n```"}], "role": "model"}}]
      })))
      .expect(1)
      .mount(&server)
      .await;

    let client = GeminiClient::new("g-key".into(), server.uri()).unwrap();
    let text = client.generate("gemini-2.5-flash", &SAMPLING, "prompt").await.unwrap();
    assert_eq!(text, "```json\n[]\n```");
  }

  #[tokio::test]
  async fn no_candidates_yields_empty_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
      .mount(&server)
      .await;

    let client = GeminiClient::new("g-key".into(), server.uri()).unwrap();
    assert_eq!(client.generate("gemini-2.5-pro", &SAMPLING, "prompt").await.unwrap(), "");
  }

  #[tokio::test]
  async fn quota_errors_map_to_transport() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(429).set_body_json(json!({
        "error": {"code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED"}
      })))
      .mount(&server)
      .await;

    let client = GeminiClient::new("g-key".into(), server.uri()).unwrap();
    let err = client.generate("gemini-2.5-flash", &SAMPLING, "prompt").await.unwrap_err();
    assert!(matches!(&err, GenerationError::Transport(m) if m.contains("Resource has been exhausted")));
    assert!(!err.triggers_downgrade());
  }

  #[tokio::test]
  async fn connection_errors_do_not_expose_the_key() {
    let client = GeminiClient::new("SECRET_KEY_123".into(), "http://127.0.0.1:9".into()).unwrap();
    let err = client.generate("gemini-2.5-flash", &SAMPLING, "prompt").await.unwrap_err();
    assert!(matches!(err, GenerationError::Transport(_)));
    assert!(!err.to_string().contains("SECRET_KEY_123"), "{err}");
  }
}
