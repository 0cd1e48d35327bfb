//! Gemini `generateContent` client.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::trace;

use super::{ExplanationError, ExplanationService};
use crate::config::AiConfig;

#[derive(Debug, Deserialize)]
struct GenerateResponse {
	#[serde(default)]
	candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
	content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
	#[serde(default)]
	parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
	text: Option<String>,
}

impl GenerateResponse {
	fn into_text(self) -> Option<String> {
		let content = self.candidates.into_iter().next()?.content?;
		let text: String = content.parts.into_iter().filter_map(|part| part.text).collect();
		(!text.trim().is_empty()).then_some(text)
	}
}

pub struct GeminiClient {
	http: reqwest::Client,
	api_key: String,
	url: String,
}

impl GeminiClient {
	pub fn new(api_key: impl Into<String>, config: &AiConfig) -> Result<Self, ExplanationError> {
		let http = reqwest::Client::builder()
			.build()
			.map_err(|e| ExplanationError::Transport(format!("Failed to create HTTP client: {e}")))?;
		Ok(Self {
			http,
			api_key: api_key.into(),
			url: generate_url(&config.endpoint, &config.model),
		})
	}
}

fn generate_url(endpoint: &str, model: &str) -> String {
	format!("{}/models/{}:generateContent", endpoint.trim_end_matches('/'), model)
}

#[async_trait]
impl ExplanationService for GeminiClient {
	async fn generate(&self, prompt: &str) -> Result<String, ExplanationError> {
		let body = json!({
			"contents": [{ "parts": [{ "text": prompt }] }],
		});

		let response = self
			.http
			.post(&self.url)
			.header("x-goog-api-key", &self.api_key)
			.json(&body)
			.send()
			.await
			.map_err(|e| ExplanationError::Transport(e.to_string()))?;

		let status = response.status();
		if !status.is_success() {
			return Err(ExplanationError::Transport(format!("unexpected status {status}")));
		}

		let parsed: GenerateResponse = response
			.json()
			.await
			.map_err(|e| ExplanationError::Response(format!("Failed to parse response: {e}")))?;
		trace!(target: "a11y.enrich", candidates = parsed.candidates.len(), "generateContent reply");
		parsed
			.into_text()
			.ok_or_else(|| ExplanationError::Response("no candidate text".into()))
	}
}
