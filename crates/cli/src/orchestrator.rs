//! Drives one scan from input validation to the final report.

use std::panic::{AssertUnwindSafe, resume_unwind};
use std::sync::Arc;
use std::time::Duration;

use a11y_protocol::{AnalysisStatus, ScanReport, ScanRequest, remaining_violation_count};
use a11y_runtime::{NavigationSession, RuntimeError, SessionProvider};
use chrono::{SecondsFormat, Utc};
use futures::FutureExt;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

use crate::analyzer::{AnalysisError, AnalysisOutcome, Analyzer, RuleEngine};
use crate::config::ScanConfig;
use crate::enricher::{Enricher, ExplanationService};
use crate::error::ScanError;

/// Below this much remaining budget the page summary is skipped.
const MIN_SUMMARY_BUDGET: Duration = Duration::from_millis(500);

/// Lifecycle of a single scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
	Idle,
	ValidatingInput,
	SessionAcquired,
	Navigated,
	Analyzed,
	ReleasingSession,
	Enriched,
	Completed,
	Failed,
}

impl std::fmt::Display for ScanPhase {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let name = match self {
			ScanPhase::Idle => "idle",
			ScanPhase::ValidatingInput => "validating_input",
			ScanPhase::SessionAcquired => "session_acquired",
			ScanPhase::Navigated => "navigated",
			ScanPhase::Analyzed => "analyzed",
			ScanPhase::ReleasingSession => "releasing_session",
			ScanPhase::Enriched => "enriched",
			ScanPhase::Completed => "completed",
			ScanPhase::Failed => "failed",
		};
		f.write_str(name)
	}
}

fn enter(phase: ScanPhase) {
	debug!(target: "a11y.scan", %phase, "scan phase");
}

/// Parses and checks the requested URL. Only absolute http(s) URLs with a host are scanned.
pub fn validate_url(request: &ScanRequest) -> Result<Url, ScanError> {
	let input = request
		.url
		.as_deref()
		.map(str::trim)
		.filter(|url| !url.is_empty())
		.ok_or(ScanError::MissingUrl)?;

	let invalid = |reason: String| ScanError::InvalidUrl {
		input: input.to_string(),
		reason,
	};

	let url = Url::parse(input).map_err(|err| invalid(err.to_string()))?;
	if !matches!(url.scheme(), "http" | "https") {
		return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
	}
	if url.host_str().is_none_or(str::is_empty) {
		return Err(invalid("missing host".to_string()));
	}
	Ok(url)
}

/// What the page yielded while the session was held.
struct Inspection {
	outcome: AnalysisOutcome,
	status: AnalysisStatus,
}

pub struct ScanOrchestrator {
	config: ScanConfig,
	provider: Arc<dyn SessionProvider>,
	analyzer: Analyzer,
	enricher: Enricher,
}

impl ScanOrchestrator {
	pub fn new(
		config: ScanConfig,
		provider: Arc<dyn SessionProvider>,
		engine: Arc<dyn RuleEngine>,
		explainer: Arc<dyn ExplanationService>,
	) -> Self {
		let analyzer = Analyzer::new(engine, config.rule_tags.clone());
		let enricher = Enricher::new(explainer, config.enrich_concurrency);
		Self {
			config,
			provider,
			analyzer,
			enricher,
		}
	}

	/// Runs one scan. The browser session is always released, including when
	/// the overall deadline fires or the scan body panics.
	pub async fn scan(&self, request: &ScanRequest) -> Result<ScanReport, ScanError> {
		let started = Instant::now();
		enter(ScanPhase::Idle);

		let result = self.run(request, started).await;
		match &result {
			Ok(report) => {
				enter(ScanPhase::Completed);
				info!(
					target: "a11y.scan",
					url = %report.url,
					violations = report.summary.total_violations,
					enriched = report.enriched_count(),
					elapsed_ms = report.processing_time_ms,
					"scan complete"
				);
			}
			Err(err) => {
				enter(ScanPhase::Failed);
				warn!(target: "a11y.scan", code = %err.code(), error = %err, "scan failed");
			}
		}
		result
	}

	async fn run(&self, request: &ScanRequest, started: Instant) -> Result<ScanReport, ScanError> {
		enter(ScanPhase::ValidatingInput);
		let url = validate_url(request)?;
		info!(target: "a11y.scan", url = %url, "scan started");

		let deadline = started + self.config.overall_timeout();

		let session = match self.provider.acquire(deadline).await {
			Ok(session) => session,
			Err(RuntimeError::LaunchTimeout { .. }) if Instant::now() >= deadline => {
				return Err(ScanError::DeadlineExceeded {
					timeout_ms: self.config.overall_timeout_ms,
				});
			}
			Err(err) => return Err(err.into()),
		};
		enter(ScanPhase::SessionAcquired);

		let inspection = self.with_session(session, &url, deadline).await?;
		let summary = inspection.outcome.summary();
		let max_count = self.config.max_enriched_findings;

		let violations = inspection.outcome.violations;
		let selected = violations[..max_count.min(violations.len())].to_vec();
		let findings = self
			.enricher
			.enrich(violations, max_count, self.config.ai_timeout(), deadline)
			.await;
		enter(ScanPhase::Enriched);

		let ai_summary = if self.config.ai_summary {
			let budget = self.config.ai_timeout().min(deadline.saturating_duration_since(Instant::now()));
			if budget >= MIN_SUMMARY_BUDGET {
				self.enricher.summarize(&selected, summary.total_violations, budget).await
			} else {
				debug!(target: "a11y.scan", budget_ms = budget.as_millis() as u64, "skipping summary; overall deadline too close");
				None
			}
		} else {
			None
		};

		Ok(ScanReport {
			url: url.to_string(),
			timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
			processing_time_ms: elapsed_ms(started),
			remaining_violation_count: remaining_violation_count(summary.total_violations, max_count),
			summary,
			findings,
			ai_summary,
			analysis_status: inspection.status,
		})
	}

	/// Runs navigation and analysis against `session`, then releases it exactly once.
	///
	/// Both steps carry deadlines clamped to `deadline`, so the body ends by then.
	async fn with_session(&self, mut session: Box<dyn NavigationSession>, url: &Url, deadline: Instant) -> Result<Inspection, ScanError> {
		let outcome = AssertUnwindSafe(self.inspect(session.as_mut(), url, deadline)).catch_unwind().await;

		enter(ScanPhase::ReleasingSession);
		session.release().await;

		match outcome {
			Ok(result) => result,
			Err(panic) => resume_unwind(panic),
		}
	}

	async fn inspect(&self, session: &mut dyn NavigationSession, url: &Url, deadline: Instant) -> Result<Inspection, ScanError> {
		let navigation_deadline = step_deadline(self.config.navigation_timeout(), deadline);
		session.navigate(url, navigation_deadline).await?;
		enter(ScanPhase::Navigated);

		let analysis_deadline = step_deadline(self.config.analysis_timeout(), deadline);
		let inspection = match self.analyzer.analyze(session, analysis_deadline).await {
			Ok(outcome) => Inspection {
				outcome,
				status: AnalysisStatus::Completed,
			},
			Err(AnalysisError::Timeout { .. }) => Inspection {
				outcome: AnalysisOutcome::empty(),
				status: AnalysisStatus::TimedOut,
			},
			Err(AnalysisError::Engine(_)) => Inspection {
				outcome: AnalysisOutcome::empty(),
				status: AnalysisStatus::Failed,
			},
		};
		enter(ScanPhase::Analyzed);
		Ok(inspection)
	}
}

/// The earlier of `now + step` and the overall deadline.
fn step_deadline(step: Duration, overall: Instant) -> Instant {
	(Instant::now() + step).min(overall)
}

fn elapsed_ms(started: Instant) -> u64 {
	u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX).max(1)
}
