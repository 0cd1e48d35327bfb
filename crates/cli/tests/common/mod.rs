//! In-process fakes for the browser, rule engine and explanation service.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use a11y_cli::ScanConfig;
use a11y_cli::ScanOrchestrator;
use a11y_cli::analyzer::{AnalysisError, AnalysisOutcome, RuleEngine, RuleSummary};
use a11y_cli::enricher::{ExplanationError, ExplanationService};
use a11y_protocol::{AffectedNode, ImpactLevel, RawFinding};
use a11y_runtime::{NavigationSession, Result as RuntimeResult, RuntimeError, SessionProvider};
use async_trait::async_trait;
use serde_json::Value;
use tokio::time::Instant;
use url::Url;

#[derive(Default)]
pub struct Counters {
	pub launches: AtomicUsize,
	pub releases: AtomicUsize,
	pub explanations: AtomicUsize,
}

impl Counters {
	pub fn launches(&self) -> usize {
		self.launches.load(Ordering::SeqCst)
	}

	pub fn releases(&self) -> usize {
		self.releases.load(Ordering::SeqCst)
	}

	pub fn explanations(&self) -> usize {
		self.explanations.load(Ordering::SeqCst)
	}
}

#[derive(Clone, Copy)]
pub enum Navigation {
	Loads,
	/// Never reaches DOM-ready; fails once the deadline passes.
	Hangs,
	Refused,
}

#[derive(Clone, Copy)]
pub enum Launch {
	Ready,
	Fails,
	/// Takes this long to start, giving up at the caller's deadline.
	Slow(Duration),
}

pub struct FakeProvider {
	counters: Arc<Counters>,
	navigation: Navigation,
	launch: Launch,
}

impl FakeProvider {
	pub fn new(counters: Arc<Counters>, navigation: Navigation) -> Self {
		Self::with_launch(counters, navigation, Launch::Ready)
	}

	pub fn with_launch(counters: Arc<Counters>, navigation: Navigation, launch: Launch) -> Self {
		Self {
			counters,
			navigation,
			launch,
		}
	}
}

#[async_trait]
impl SessionProvider for FakeProvider {
	async fn acquire(&self, deadline: Instant) -> RuntimeResult<Box<dyn NavigationSession>> {
		self.counters.launches.fetch_add(1, Ordering::SeqCst);
		match self.launch {
			Launch::Ready => {}
			Launch::Fails => return Err(RuntimeError::BrowserLaunch("no browser executable found".into())),
			Launch::Slow(startup) => {
				let started = Instant::now();
				let ready = started + startup;
				if ready > deadline {
					tokio::time::sleep_until(deadline).await;
					return Err(RuntimeError::LaunchTimeout {
						timeout_ms: deadline.saturating_duration_since(started).as_millis() as u64,
					});
				}
				tokio::time::sleep_until(ready).await;
			}
		}
		Ok(Box::new(FakeSession {
			counters: self.counters.clone(),
			navigation: self.navigation,
		}))
	}
}

struct FakeSession {
	counters: Arc<Counters>,
	navigation: Navigation,
}

#[async_trait]
impl NavigationSession for FakeSession {
	async fn navigate(&mut self, url: &Url, deadline: Instant) -> RuntimeResult<()> {
		match self.navigation {
			Navigation::Loads => Ok(()),
			Navigation::Hangs => {
				let timeout_ms = deadline.saturating_duration_since(Instant::now()).as_millis() as u64;
				tokio::time::sleep_until(deadline).await;
				Err(RuntimeError::NavigationTimeout {
					url: url.to_string(),
					timeout_ms,
				})
			}
			Navigation::Refused => Err(RuntimeError::Connection {
				url: url.to_string(),
				reason: "net::ERR_CONNECTION_REFUSED".into(),
			}),
		}
	}

	async fn evaluate(&mut self, _expression: &str) -> RuntimeResult<Value> {
		Ok(Value::Null)
	}

	async fn release(self: Box<Self>) {
		self.counters.releases.fetch_add(1, Ordering::SeqCst);
	}
}

#[derive(Clone, Copy)]
pub enum Engine {
	/// Reports this many serious violations and five passes.
	Violations(usize),
	/// Takes this long, then reports that many violations.
	SlowViolations(Duration, usize),
	Stalls,
	Fails,
	Panics,
}

#[async_trait]
impl RuleEngine for Engine {
	async fn run(&self, session: &mut dyn NavigationSession, tags: &[String]) -> Result<AnalysisOutcome, AnalysisError> {
		match *self {
			Engine::Violations(count) => Ok(AnalysisOutcome {
				violations: (0..count).map(violation).collect(),
				passes: (0..5).map(|i| RuleSummary { id: format!("pass-{i}") }).collect(),
				incomplete: Vec::new(),
			}),
			Engine::SlowViolations(delay, count) => {
				tokio::time::sleep(delay).await;
				Engine::Violations(count).run(session, tags).await
			}
			Engine::Stalls => {
				tokio::time::sleep(Duration::from_secs(3600)).await;
				Ok(AnalysisOutcome::empty())
			}
			Engine::Fails => Err(AnalysisError::Engine("axe is not defined".into())),
			Engine::Panics => panic!("rule engine exploded"),
		}
	}
}

pub fn violation(index: usize) -> RawFinding {
	RawFinding {
		id: format!("rule-{index}"),
		impact: ImpactLevel::Serious,
		description: format!("Description for rule {index}"),
		help: format!("Help for rule {index}"),
		help_url: format!("https://dequeuniversity.com/rules/axe/4.10/rule-{index}"),
		tags: vec!["wcag2aa".into()],
		nodes: vec![AffectedNode {
			html: "<div></div>".into(),
			target: vec![format!("#node-{index}")],
			failure_summary: None,
		}],
	}
}

#[derive(Clone, Copy)]
pub enum Reply {
	Valid,
	Malformed,
	Stalls,
	Errors,
}

pub struct FakeExplainer {
	counters: Arc<Counters>,
	reply: Reply,
}

impl FakeExplainer {
	pub fn new(counters: Arc<Counters>, reply: Reply) -> Self {
		Self { counters, reply }
	}
}

#[async_trait]
impl ExplanationService for FakeExplainer {
	async fn generate(&self, _prompt: &str) -> Result<String, ExplanationError> {
		self.counters.explanations.fetch_add(1, Ordering::SeqCst);
		match self.reply {
			Reply::Valid => Ok("```json\n{\"explanation\":\"Add a text alternative.\",\"priority\":\"high\",\"remediationSteps\":[\"Add alt text\"],\"userImpact\":\"Blind users miss the content.\"}\n```".into()),
			Reply::Malformed => Ok("I think this is about contrast.".into()),
			Reply::Stalls => {
				tokio::time::sleep(Duration::from_secs(3600)).await;
				Ok(String::new())
			}
			Reply::Errors => Err(ExplanationError::Transport("503 Service Unavailable".into())),
		}
	}
}

/// Defaults with AI summaries off, so call counts equal finding counts.
pub fn config() -> ScanConfig {
	ScanConfig {
		ai_summary: false,
		..ScanConfig::default()
	}
}

pub struct Harness {
	pub counters: Arc<Counters>,
	pub orchestrator: Arc<ScanOrchestrator>,
}

pub fn harness(config: ScanConfig, navigation: Navigation, engine: Engine, reply: Reply) -> Harness {
	let counters = Arc::new(Counters::default());
	let orchestrator = ScanOrchestrator::new(
		config,
		Arc::new(FakeProvider::new(counters.clone(), navigation)),
		Arc::new(engine),
		Arc::new(FakeExplainer::new(counters.clone(), reply)),
	);
	Harness {
		counters,
		orchestrator: Arc::new(orchestrator),
	}
}

pub fn failing_launch_harness() -> Harness {
	launch_harness(config(), Launch::Fails)
}

pub fn launch_harness(config: ScanConfig, launch: Launch) -> Harness {
	let counters = Arc::new(Counters::default());
	let orchestrator = ScanOrchestrator::new(
		config,
		Arc::new(FakeProvider::with_launch(counters.clone(), Navigation::Loads, launch)),
		Arc::new(Engine::Violations(0)),
		Arc::new(FakeExplainer::new(counters.clone(), Reply::Valid)),
	);
	Harness {
		counters,
		orchestrator: Arc::new(orchestrator),
	}
}
