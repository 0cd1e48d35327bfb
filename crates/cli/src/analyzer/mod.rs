//! Accessibility analysis of a navigated page.

mod axe;

use std::sync::Arc;
use std::time::Duration;

use a11y_protocol::{RawFinding, ScanSummary};
use a11y_runtime::NavigationSession;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, warn};

pub use axe::AxeEngine;

#[derive(Debug, Error)]
pub enum AnalysisError {
	#[error("Analysis timed out after {timeout_ms}ms")]
	Timeout { timeout_ms: u64 },

	#[error("Rule engine failed: {0}")]
	Engine(String),
}

/// A rule that passed or could not be decided; only counted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSummary {
	pub id: String,
}

/// Engine results for one page, violations in engine order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutcome {
	#[serde(default)]
	pub violations: Vec<RawFinding>,
	#[serde(default)]
	pub passes: Vec<RuleSummary>,
	#[serde(default)]
	pub incomplete: Vec<RuleSummary>,
}

impl AnalysisOutcome {
	pub fn empty() -> Self {
		Self::default()
	}

	pub fn summary(&self) -> ScanSummary {
		ScanSummary {
			total_violations: self.violations.len(),
			total_passes: self.passes.len(),
			total_incomplete: self.incomplete.len(),
		}
	}
}

/// Runs accessibility rules against the page loaded in a session.
#[async_trait]
pub trait RuleEngine: Send + Sync {
	async fn run(&self, session: &mut dyn NavigationSession, tags: &[String]) -> Result<AnalysisOutcome, AnalysisError>;
}

/// Races a [`RuleEngine`] against the analysis deadline.
pub struct Analyzer {
	engine: Arc<dyn RuleEngine>,
	tags: Vec<String>,
}

impl Analyzer {
	pub fn new(engine: Arc<dyn RuleEngine>, tags: Vec<String>) -> Self {
		Self { engine, tags }
	}

	pub async fn analyze(&self, session: &mut dyn NavigationSession, deadline: Instant) -> Result<AnalysisOutcome, AnalysisError> {
		let budget = deadline.saturating_duration_since(Instant::now());
		let outcome = timeout_at(deadline, self.engine.run(session, &self.tags)).await;
		match outcome {
			Ok(Ok(outcome)) => {
				debug!(
					target: "a11y.analyze",
					violations = outcome.violations.len(),
					passes = outcome.passes.len(),
					incomplete = outcome.incomplete.len(),
					"analysis complete"
				);
				Ok(outcome)
			}
			Ok(Err(err)) => {
				warn!(target: "a11y.analyze", error = %err, "rule engine failed");
				Err(err)
			}
			Err(_) => {
				let timeout_ms = millis(budget);
				warn!(target: "a11y.analyze", timeout_ms, "analysis timed out");
				Err(AnalysisError::Timeout { timeout_ms })
			}
		}
	}
}

fn millis(duration: Duration) -> u64 {
	u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
