//! Plain-language explanations for the highest-ranked findings.
//!
//! Only the first `max_count` findings in analyzer order are sent to the
//! explanation service. Every failure for a single finding (timeout,
//! transport error, unparseable reply) attaches deterministic fallback text
//! and never aborts the batch.

mod gemini;
mod prompt;

use std::sync::Arc;
use std::time::Duration;

use a11y_protocol::{AiExplanation, Finding, Priority, RawFinding};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use thiserror::Error;
use tokio::time::{Instant, timeout};
use tracing::{debug, warn};

pub use gemini::GeminiClient;
pub use prompt::{explanation_prompt, parse_explanation, strip_code_fence, summary_prompt};

pub const FALLBACK_EXPLANATION: &str = "AI explanation unavailable";
pub const FALLBACK_REMEDIATION: &str = "Please consult the accessibility guideline reference";
pub const FALLBACK_USER_IMPACT: &str = "Users of assistive technology may be unable to perceive or operate this content";

/// Failure reported by an [`ExplanationService`].
#[derive(Debug, Error)]
pub enum ExplanationError {
	#[error("explanation service is not configured")]
	Disabled,

	#[error("explanation request failed: {0}")]
	Transport(String),

	#[error("explanation service returned an unusable response: {0}")]
	Response(String),
}

/// Why a single finding received fallback text.
#[derive(Debug, Error)]
pub enum EnrichmentFailure {
	#[error("explanation timed out after {timeout_ms}ms")]
	Timeout { timeout_ms: u64 },

	#[error(transparent)]
	Service(#[from] ExplanationError),

	#[error("could not parse explanation: {0}")]
	Parse(String),
}

/// Text generation backend used for explanations and summaries.
#[async_trait]
pub trait ExplanationService: Send + Sync {
	async fn generate(&self, prompt: &str) -> Result<String, ExplanationError>;
}

/// Used when no API key is configured; every finding takes the fallback path.
pub struct DisabledExplanations;

#[async_trait]
impl ExplanationService for DisabledExplanations {
	async fn generate(&self, _prompt: &str) -> Result<String, ExplanationError> {
		Err(ExplanationError::Disabled)
	}
}

/// Deterministic explanation attached when the service cannot provide one.
pub fn fallback_explanation(finding: &RawFinding) -> AiExplanation {
	AiExplanation {
		explanation: FALLBACK_EXPLANATION.to_string(),
		priority: Priority::from(finding.impact),
		remediation_steps: vec![FALLBACK_REMEDIATION.to_string()],
		user_impact: FALLBACK_USER_IMPACT.to_string(),
		fallback: true,
	}
}

pub struct Enricher {
	service: Arc<dyn ExplanationService>,
	concurrency: usize,
}

impl Enricher {
	pub fn new(service: Arc<dyn ExplanationService>, concurrency: usize) -> Self {
		Self {
			service,
			concurrency: concurrency.max(1),
		}
	}

	/// Explains the first `max_count` findings and returns all findings in their original order.
	///
	/// Each call gets `per_call_timeout` or whatever remains before `deadline`, whichever is shorter.
	pub async fn enrich(&self, mut findings: Vec<RawFinding>, max_count: usize, per_call_timeout: Duration, deadline: Instant) -> Vec<Finding> {
		let split = max_count.min(findings.len());
		let selected: Vec<RawFinding> = findings.drain(..split).collect();
		debug!(
			target: "a11y.enrich",
			selected = selected.len(),
			remaining = findings.len(),
			concurrency = self.concurrency,
			"enriching findings"
		);

		let mut enriched: Vec<Finding> = stream::iter(selected)
			.map(|raw| self.enrich_one(raw, per_call_timeout, deadline))
			.buffered(self.concurrency)
			.collect()
			.await;
		enriched.extend(findings.into_iter().map(Finding::unenriched));
		enriched
	}

	async fn enrich_one(&self, raw: RawFinding, per_call_timeout: Duration, deadline: Instant) -> Finding {
		let budget = per_call_timeout.min(deadline.saturating_duration_since(Instant::now()));
		match self.explain(&raw, budget).await {
			Ok(explanation) => Finding::enriched(raw, explanation),
			Err(EnrichmentFailure::Service(ExplanationError::Disabled)) => {
				let explanation = fallback_explanation(&raw);
				Finding::enriched(raw, explanation)
			}
			Err(err) => {
				warn!(target: "a11y.enrich", rule = %raw.id, error = %err, "using fallback explanation");
				let explanation = fallback_explanation(&raw);
				Finding::enriched(raw, explanation)
			}
		}
	}

	async fn explain(&self, raw: &RawFinding, per_call_timeout: Duration) -> Result<AiExplanation, EnrichmentFailure> {
		let prompt = explanation_prompt(raw);
		let reply = timeout(per_call_timeout, self.service.generate(&prompt))
			.await
			.map_err(|_| EnrichmentFailure::Timeout {
				timeout_ms: millis(per_call_timeout),
			})??;
		parse_explanation(&reply, raw)
	}

	/// One best-effort page summary; `None` on any failure.
	pub async fn summarize(&self, findings: &[RawFinding], total_violations: usize, per_call_timeout: Duration) -> Option<String> {
		if findings.is_empty() {
			return None;
		}
		let prompt = summary_prompt(findings, total_violations);
		match timeout(per_call_timeout, self.service.generate(&prompt)).await {
			Ok(Ok(text)) => {
				let text = strip_code_fence(&text).trim().to_string();
				(!text.is_empty()).then_some(text)
			}
			Ok(Err(ExplanationError::Disabled)) => None,
			Ok(Err(err)) => {
				warn!(target: "a11y.enrich", error = %err, "summary unavailable");
				None
			}
			Err(_) => {
				warn!(target: "a11y.enrich", timeout_ms = millis(per_call_timeout), "summary timed out");
				None
			}
		}
	}
}

fn millis(duration: Duration) -> u64 {
	u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
