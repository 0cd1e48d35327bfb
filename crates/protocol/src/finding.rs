//! Accessibility findings as produced by the rule engine and enriched by the AI service.

use serde::{Deserialize, Deserializer, Serialize};

/// Severity assigned by the rule engine to a violated rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactLevel {
	#[default]
	Minor,
	Moderate,
	Serious,
	Critical,
}

impl ImpactLevel {
	/// Parses an engine impact string, mapping unknown values to [`ImpactLevel::Minor`].
	pub fn parse_lenient(value: &str) -> Self {
		match value.trim().to_ascii_lowercase().as_str() {
			"critical" => Self::Critical,
			"serious" => Self::Serious,
			"moderate" => Self::Moderate,
			_ => Self::Minor,
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Minor => "minor",
			Self::Moderate => "moderate",
			Self::Serious => "serious",
			Self::Critical => "critical",
		}
	}
}

impl std::fmt::Display for ImpactLevel {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

fn impact_or_minor<'de, D>(deserializer: D) -> Result<ImpactLevel, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = Option::<String>::deserialize(deserializer)?;
	Ok(raw.as_deref().map(ImpactLevel::parse_lenient).unwrap_or_default())
}

/// One DOM node that failed a rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffectedNode {
	/// Outer HTML snippet of the node.
	#[serde(default)]
	pub html: String,
	/// Selector path targeting the node.
	#[serde(default)]
	pub target: Vec<String>,
	#[serde(default)]
	pub failure_summary: Option<String>,
}

/// One accessibility rule violation. Immutable once produced by the analyzer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFinding {
	/// Rule identifier, e.g. `color-contrast`.
	pub id: String,
	#[serde(default, deserialize_with = "impact_or_minor")]
	pub impact: ImpactLevel,
	#[serde(default)]
	pub description: String,
	/// Short help text for the rule.
	#[serde(default)]
	pub help: String,
	/// Link to the guideline reference for the rule.
	#[serde(default)]
	pub help_url: String,
	#[serde(default)]
	pub tags: Vec<String>,
	#[serde(default)]
	pub nodes: Vec<AffectedNode>,
}

/// Remediation priority suggested by the explanation service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
	Low,
	#[default]
	Medium,
	High,
	Critical,
}

impl Priority {
	/// Parses a priority string case-insensitively.
	pub fn parse(value: &str) -> Option<Self> {
		match value.trim().to_ascii_lowercase().as_str() {
			"low" => Some(Self::Low),
			"medium" => Some(Self::Medium),
			"high" => Some(Self::High),
			"critical" => Some(Self::Critical),
			_ => None,
		}
	}
}

impl From<ImpactLevel> for Priority {
	fn from(impact: ImpactLevel) -> Self {
		match impact {
			ImpactLevel::Minor => Priority::Low,
			ImpactLevel::Moderate => Priority::Medium,
			ImpactLevel::Serious => Priority::High,
			ImpactLevel::Critical => Priority::Critical,
		}
	}
}

/// Plain-language explanation attached to an enriched finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiExplanation {
	pub explanation: String,
	pub priority: Priority,
	/// Ordered remediation steps.
	pub remediation_steps: Vec<String>,
	pub user_impact: String,
	/// Set when the explanation service failed and deterministic text was used instead.
	#[serde(default)]
	pub fallback: bool,
}

/// A finding in the report: the raw violation plus an optional explanation.
///
/// Only the top-N findings selected for enrichment carry `aiExplanation`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
	#[serde(flatten)]
	pub raw: RawFinding,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub ai_explanation: Option<AiExplanation>,
}

impl Finding {
	pub fn unenriched(raw: RawFinding) -> Self {
		Self { raw, ai_explanation: None }
	}

	pub fn enriched(raw: RawFinding, explanation: AiExplanation) -> Self {
		Self {
			raw,
			ai_explanation: Some(explanation),
		}
	}

	pub fn is_enriched(&self) -> bool {
		self.ai_explanation.is_some()
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn engine_violation_deserializes() {
		let raw: RawFinding = serde_json::from_value(json!({
			"id": "image-alt",
			"impact": "critical",
			"description": "Ensures <img> elements have alternate text",
			"help": "Images must have alternate text",
			"helpUrl": "https://dequeuniversity.com/rules/axe/4.10/image-alt",
			"tags": ["wcag2a", "wcag111"],
			"nodes": [{
				"html": "<img src=\"logo.png\">",
				"target": ["img"],
				"failureSummary": "Fix any of the following: Element does not have an alt attribute"
			}]
		}))
		.unwrap();

		assert_eq!(raw.impact, ImpactLevel::Critical);
		assert_eq!(raw.nodes.len(), 1);
		assert_eq!(raw.nodes[0].target, vec!["img".to_string()]);
	}

	#[test]
	fn null_and_unknown_impact_become_minor() {
		let null_impact: RawFinding = serde_json::from_value(json!({ "id": "a", "impact": null })).unwrap();
		let odd_impact: RawFinding = serde_json::from_value(json!({ "id": "b", "impact": "catastrophic" })).unwrap();
		let missing: RawFinding = serde_json::from_value(json!({ "id": "c" })).unwrap();
		assert_eq!(null_impact.impact, ImpactLevel::Minor);
		assert_eq!(odd_impact.impact, ImpactLevel::Minor);
		assert_eq!(missing.impact, ImpactLevel::Minor);
	}

	#[test]
	fn unenriched_finding_omits_explanation_key() {
		let finding = Finding::unenriched(RawFinding {
			id: "label".into(),
			..Default::default()
		});
		let value = serde_json::to_value(&finding).unwrap();
		assert_eq!(value["id"], "label");
		assert!(value.get("aiExplanation").is_none());
	}

	#[test]
	fn enriched_finding_flattens_raw_fields() {
		let finding = Finding::enriched(
			RawFinding {
				id: "color-contrast".into(),
				impact: ImpactLevel::Serious,
				help_url: "https://example.com/rule".into(),
				..Default::default()
			},
			AiExplanation {
				explanation: "Text is hard to read".into(),
				priority: Priority::High,
				remediation_steps: vec!["Darken the text".into()],
				user_impact: "Low-vision users cannot read it".into(),
				fallback: false,
			},
		);
		let value = serde_json::to_value(&finding).unwrap();
		assert_eq!(value["impact"], "serious");
		assert_eq!(value["helpUrl"], "https://example.com/rule");
		assert_eq!(value["aiExplanation"]["priority"], "high");
		assert_eq!(value["aiExplanation"]["remediationSteps"][0], "Darken the text");
	}

	#[test]
	fn priority_follows_impact() {
		assert_eq!(Priority::from(ImpactLevel::Minor), Priority::Low);
		assert_eq!(Priority::from(ImpactLevel::Critical), Priority::Critical);
		assert_eq!(Priority::parse(" HIGH "), Some(Priority::High));
		assert_eq!(Priority::parse("urgent"), None);
	}
}
