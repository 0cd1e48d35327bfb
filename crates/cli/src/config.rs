//! Scan configuration: JSON file, then environment, then CLI flags.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use a11y_runtime::{ResourceFilter, ResourceKind, RuntimeKind, SessionOptions, Viewport};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_AXE_SCRIPT: &str = "https://cdnjs.cloudflare.com/ajax/libs/axe-core/4.10.2/axe.min.js";
pub const DEFAULT_AI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_AI_MODEL: &str = "gemini-1.5-flash";

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("Failed to read config {path}: {source}")]
	Read { path: PathBuf, source: std::io::Error },

	#[error("Failed to parse config {path}: {source}")]
	Parse { path: PathBuf, source: serde_json::Error },

	#[error("Invalid value for {key}: {value}")]
	InvalidEnv { key: String, value: String },

	#[error("Invalid config: {0}")]
	Invalid(String),
}

/// Explanation service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AiConfig {
	/// API key; enrichment falls back to fixed text when unset.
	#[serde(skip_serializing)]
	pub api_key: Option<String>,
	pub model: String,
	pub endpoint: String,
}

impl Default for AiConfig {
	fn default() -> Self {
		Self {
			api_key: None,
			model: DEFAULT_AI_MODEL.to_string(),
			endpoint: DEFAULT_AI_ENDPOINT.to_string(),
		}
	}
}

/// Browser executable selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrowserSettings {
	pub executable: Option<PathBuf>,
	pub runtime: RuntimeKind,
}

/// Every tunable of the scan pipeline. Durations are in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanConfig {
	/// Bounds the whole scan from validation to enrichment.
	pub overall_timeout_ms: u64,
	pub launch_timeout_ms: u64,
	pub navigation_timeout_ms: u64,
	pub analysis_timeout_ms: u64,
	/// Per explanation call.
	pub ai_timeout_ms: u64,
	pub max_enriched_findings: usize,
	pub enrich_concurrency: usize,
	/// Rule tags passed to the engine; a reduced subset keeps analysis fast.
	pub rule_tags: Vec<String>,
	pub blocked_resources: Vec<ResourceKind>,
	pub viewport: Viewport,
	pub user_agent: Option<String>,
	/// Request an overall summary after enrichment.
	pub ai_summary: bool,
	pub ai: AiConfig,
	/// File path or http(s) URL of the axe-core script.
	pub axe_script: String,
	pub browser: BrowserSettings,
}

impl Default for ScanConfig {
	fn default() -> Self {
		Self {
			overall_timeout_ms: 20_000,
			launch_timeout_ms: 8_000,
			navigation_timeout_ms: 15_000,
			analysis_timeout_ms: 10_000,
			ai_timeout_ms: 8_000,
			max_enriched_findings: 3,
			enrich_concurrency: 3,
			rule_tags: vec!["wcag2a".to_string(), "wcag2aa".to_string()],
			blocked_resources: vec![ResourceKind::Image],
			viewport: Viewport::default(),
			user_agent: None,
			ai_summary: true,
			ai: AiConfig::default(),
			axe_script: DEFAULT_AXE_SCRIPT.to_string(),
			browser: BrowserSettings::default(),
		}
	}
}

impl ScanConfig {
	/// Loads the optional JSON file, applies process environment overrides and validates.
	pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
		let mut config = match path {
			Some(path) => Self::from_file(path)?,
			None => Self::default(),
		};
		config.apply_env(&|key| std::env::var(key).ok())?;
		config.validate()?;
		Ok(config)
	}

	pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
		let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
			path: path.to_path_buf(),
			source,
		})?;
		serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
			path: path.to_path_buf(),
			source,
		})
	}

	/// Applies `A11Y_*` overrides and `GEMINI_API_KEY`.
	pub fn apply_env(&mut self, env: &dyn Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
		for (key, slot) in [
			("A11Y_OVERALL_TIMEOUT_MS", &mut self.overall_timeout_ms),
			("A11Y_LAUNCH_TIMEOUT_MS", &mut self.launch_timeout_ms),
			("A11Y_NAVIGATION_TIMEOUT_MS", &mut self.navigation_timeout_ms),
			("A11Y_ANALYSIS_TIMEOUT_MS", &mut self.analysis_timeout_ms),
			("A11Y_AI_TIMEOUT_MS", &mut self.ai_timeout_ms),
		] {
			if let Some(value) = env(key) {
				*slot = parse_env(key, &value)?;
			}
		}

		if let Some(value) = env("A11Y_MAX_ENRICHED") {
			self.max_enriched_findings = parse_env("A11Y_MAX_ENRICHED", &value)?;
		}
		if let Some(value) = env("A11Y_ENRICH_CONCURRENCY") {
			self.enrich_concurrency = parse_env("A11Y_ENRICH_CONCURRENCY", &value)?;
		}
		if let Some(value) = env("A11Y_AXE_SCRIPT") {
			self.axe_script = value;
		}
		if let Some(value) = env("A11Y_BROWSER_EXECUTABLE") {
			self.browser.executable = Some(PathBuf::from(value));
		}
		if let Some(value) = env("A11Y_RUNTIME") {
			self.browser.runtime = match value.to_ascii_lowercase().as_str() {
				"auto" => RuntimeKind::Auto,
				"managed" => RuntimeKind::Managed,
				"local" => RuntimeKind::Local,
				_ => {
					return Err(ConfigError::InvalidEnv {
						key: "A11Y_RUNTIME".to_string(),
						value,
					});
				}
			};
		}
		if let Some(value) = env("A11Y_AI_MODEL") {
			self.ai.model = value;
		}
		if let Some(value) = env("GEMINI_API_KEY").filter(|v| !v.trim().is_empty()) {
			self.ai.api_key = Some(value);
		}

		Ok(())
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		for (name, value) in [
			("overallTimeoutMs", self.overall_timeout_ms),
			("launchTimeoutMs", self.launch_timeout_ms),
			("navigationTimeoutMs", self.navigation_timeout_ms),
			("analysisTimeoutMs", self.analysis_timeout_ms),
			("aiTimeoutMs", self.ai_timeout_ms),
		] {
			if value == 0 {
				return Err(ConfigError::Invalid(format!("{name} must be greater than zero")));
			}
		}
		if self.enrich_concurrency == 0 {
			return Err(ConfigError::Invalid("enrichConcurrency must be at least 1".into()));
		}
		if self.rule_tags.is_empty() {
			return Err(ConfigError::Invalid("ruleTags must name at least one tag".into()));
		}
		if self.axe_script.trim().is_empty() {
			return Err(ConfigError::Invalid("axeScript must be a path or URL".into()));
		}
		Ok(())
	}

	pub fn overall_timeout(&self) -> Duration {
		Duration::from_millis(self.overall_timeout_ms)
	}

	pub fn navigation_timeout(&self) -> Duration {
		Duration::from_millis(self.navigation_timeout_ms)
	}

	pub fn analysis_timeout(&self) -> Duration {
		Duration::from_millis(self.analysis_timeout_ms)
	}

	pub fn ai_timeout(&self) -> Duration {
		Duration::from_millis(self.ai_timeout_ms)
	}

	/// Browser launch settings derived from this config.
	pub fn session_options(&self) -> SessionOptions {
		SessionOptions {
			runtime: self.browser.runtime,
			executable: self.browser.executable.clone(),
			launch_timeout: Duration::from_millis(self.launch_timeout_ms),
			viewport: self.viewport,
			user_agent: self.user_agent.clone(),
			filter: ResourceFilter::blocking(self.blocked_resources.iter().copied()),
		}
	}
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
	value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
		key: key.to_string(),
		value: value.to_string(),
	})
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;
	use std::io::Write;

	use super::*;

	fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
		move |key: &str| map.get(key).cloned()
	}

	#[test]
	fn defaults_are_valid() {
		let config = ScanConfig::default();
		config.validate().unwrap();
		assert_eq!(config.overall_timeout(), Duration::from_secs(20));
		assert_eq!(config.max_enriched_findings, 3);
		assert_eq!(config.rule_tags, vec!["wcag2a", "wcag2aa"]);
		assert!(config.ai.api_key.is_none());
	}

	#[test]
	fn env_overrides_apply() {
		let mut config = ScanConfig::default();
		let env = env_from(&[
			("A11Y_NAVIGATION_TIMEOUT_MS", "9000"),
			("A11Y_MAX_ENRICHED", "5"),
			("A11Y_RUNTIME", "managed"),
			("GEMINI_API_KEY", "secret"),
		]);
		config.apply_env(&env).unwrap();
		assert_eq!(config.navigation_timeout_ms, 9000);
		assert_eq!(config.max_enriched_findings, 5);
		assert_eq!(config.browser.runtime, RuntimeKind::Managed);
		assert_eq!(config.ai.api_key.as_deref(), Some("secret"));
	}

	#[test]
	fn bad_env_value_is_rejected() {
		let mut config = ScanConfig::default();
		let err = config.apply_env(&env_from(&[("A11Y_AI_TIMEOUT_MS", "soon")])).unwrap_err();
		assert!(err.to_string().contains("A11Y_AI_TIMEOUT_MS"));
	}

	#[test]
	fn blank_api_key_keeps_ai_disabled() {
		let mut config = ScanConfig::default();
		config.apply_env(&env_from(&[("GEMINI_API_KEY", "  ")])).unwrap();
		assert!(config.ai.api_key.is_none());
	}

	#[test]
	fn zero_timeouts_fail_validation() {
		let config = ScanConfig {
			analysis_timeout_ms: 0,
			..ScanConfig::default()
		};
		assert!(config.validate().unwrap_err().to_string().contains("analysisTimeoutMs"));

		let config = ScanConfig {
			enrich_concurrency: 0,
			..ScanConfig::default()
		};
		assert!(config.validate().is_err());
	}

	#[test]
	fn partial_json_file_keeps_defaults() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		write!(file, r#"{{"maxEnrichedFindings": 1, "blockedResources": ["image", "media"], "viewport": {{"width": 800, "height": 600}}}}"#).unwrap();

		let config = ScanConfig::from_file(file.path()).unwrap();
		assert_eq!(config.max_enriched_findings, 1);
		assert_eq!(config.overall_timeout_ms, 20_000);
		assert_eq!(config.viewport, Viewport { width: 800, height: 600 });

		let options = config.session_options();
		assert!(!options.filter.should_allow(ResourceKind::Media));
		assert!(options.filter.should_allow(ResourceKind::Script));
	}

	#[test]
	fn missing_file_reports_path() {
		let err = ScanConfig::from_file(Path::new("/nonexistent/a11y.json")).unwrap_err();
		assert!(err.to_string().contains("/nonexistent/a11y.json"));
	}
}
