//! axe-core rule engine, injected into the page under analysis.

use std::path::Path;
use std::sync::Arc;

use a11y_runtime::NavigationSession;
use async_trait::async_trait;
use tracing::debug;

use super::{AnalysisError, AnalysisOutcome, RuleEngine};

const RUN_TEMPLATE: &str = r#"(async () => {
	const tags = __TAGS__;
	const results = await window.axe.run(document, {
		runOnly: { type: "tag", values: tags },
		resultTypes: ["violations"],
	});
	const ids = (rules) => rules.map((rule) => ({ id: rule.id }));
	return {
		violations: results.violations.map((rule) => ({
			id: rule.id,
			impact: rule.impact,
			description: rule.description,
			help: rule.help,
			helpUrl: rule.helpUrl,
			tags: rule.tags,
			nodes: rule.nodes.map((node) => ({
				html: node.html,
				target: node.target.map(String),
				failureSummary: node.failureSummary,
			})),
		})),
		passes: ids(results.passes),
		incomplete: ids(results.incomplete),
	};
})()"#;

/// Runs axe-core inside the page. The script source is loaded once and shared.
#[derive(Clone)]
pub struct AxeEngine {
	source: Arc<str>,
}

impl AxeEngine {
	pub fn from_source(source: impl Into<Arc<str>>) -> Self {
		Self { source: source.into() }
	}

	/// Loads the axe-core script from an http(s) URL or a file path.
	pub async fn load(location: &str) -> Result<Self, AnalysisError> {
		let source = if location.starts_with("http://") || location.starts_with("https://") {
			debug!(target: "a11y.analyze", location, "fetching axe-core");
			let response = reqwest::get(location)
				.await
				.and_then(|response| response.error_for_status())
				.map_err(|err| AnalysisError::Engine(format!("failed to fetch axe-core from {location}: {err}")))?;
			response
				.text()
				.await
				.map_err(|err| AnalysisError::Engine(format!("failed to read axe-core from {location}: {err}")))?
		} else {
			tokio::fs::read_to_string(Path::new(location))
				.await
				.map_err(|err| AnalysisError::Engine(format!("failed to read axe-core from {location}: {err}")))?
		};

		if source.trim().is_empty() {
			return Err(AnalysisError::Engine(format!("axe-core script at {location} is empty")));
		}
		Ok(Self::from_source(source))
	}

	fn injection(&self) -> String {
		format!("(() => {{ if (typeof window.axe === \"undefined\") {{\n{}\n}} return typeof window.axe !== \"undefined\"; }})()", self.source)
	}
}

pub(crate) fn run_expression(tags: &[String]) -> String {
	let tags = serde_json::to_string(tags).unwrap_or_else(|_| "[]".to_string());
	RUN_TEMPLATE.replace("__TAGS__", &tags)
}

#[async_trait]
impl RuleEngine for AxeEngine {
	async fn run(&self, session: &mut dyn NavigationSession, tags: &[String]) -> Result<AnalysisOutcome, AnalysisError> {
		let loaded = session
			.evaluate(&self.injection())
			.await
			.map_err(|err| AnalysisError::Engine(format!("axe-core injection failed: {err}")))?;
		if loaded.as_bool() != Some(true) {
			return Err(AnalysisError::Engine("axe-core did not register on window".into()));
		}

		let value = session
			.evaluate(&run_expression(tags))
			.await
			.map_err(|err| AnalysisError::Engine(format!("axe.run failed: {err}")))?;
		serde_json::from_value(value).map_err(|err| AnalysisError::Engine(format!("unexpected axe-core result: {err}")))
	}
}
