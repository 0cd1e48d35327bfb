mod scan;
mod serve;

use std::path::Path;
use std::sync::Arc;

use a11y_runtime::ChromeSessionProvider;
use tracing::{debug, info};

use crate::analyzer::AxeEngine;
use crate::cli::{Cli, Commands};
use crate::config::ScanConfig;
use crate::enricher::{DisabledExplanations, ExplanationService, GeminiClient};
use crate::orchestrator::ScanOrchestrator;

pub async fn dispatch(cli: Cli) -> anyhow::Result<()> {
	let config_path = cli.config.as_deref();
	match cli.command {
		Commands::Scan(args) => scan::run(args, config_path, cli.format).await,
		Commands::Serve(args) => serve::run(args, config_path).await,
	}
}

pub(crate) fn load_config(path: Option<&Path>) -> Result<ScanConfig, crate::config::ConfigError> {
	let config = ScanConfig::load(path)?;
	debug!(target: "a11y.scan", ?path, "configuration loaded");
	Ok(config)
}

/// Wires the production collaborators: Chromium sessions, axe-core and Gemini.
pub async fn build_orchestrator(config: ScanConfig) -> anyhow::Result<ScanOrchestrator> {
	let provider = Arc::new(ChromeSessionProvider::new(config.session_options()));
	let engine = Arc::new(AxeEngine::load(&config.axe_script).await?);

	let explainer: Arc<dyn ExplanationService> = match config.ai.api_key.as_deref() {
		Some(key) => {
			info!(target: "a11y.enrich", model = %config.ai.model, "AI explanations enabled");
			Arc::new(GeminiClient::new(key, &config.ai)?)
		}
		None => {
			info!(target: "a11y.enrich", "no API key configured; explanations use fallback text");
			Arc::new(DisabledExplanations)
		}
	};

	Ok(ScanOrchestrator::new(config, provider, engine, explainer))
}
