//! Prompt construction and response parsing for finding explanations.

use a11y_protocol::{AiExplanation, Priority, RawFinding};
use serde::Deserialize;

use super::EnrichmentFailure;

pub fn explanation_prompt(finding: &RawFinding) -> String {
	format!(
		"You are an accessibility expert. Explain this WCAG violation for a web developer.\n\
		 Rule: {id}\n\
		 Impact: {impact}\n\
		 Description: {description}\n\
		 Help: {help}\n\n\
		 Respond with only a JSON object of the form \
		 {{\"explanation\": string, \"priority\": \"low\"|\"medium\"|\"high\"|\"critical\", \
		 \"remediationSteps\": [string], \"userImpact\": string}}.",
		id = finding.id,
		impact = finding.impact,
		description = finding.description,
		help = finding.help,
	)
}

pub fn summary_prompt(findings: &[RawFinding], total_violations: usize) -> String {
	let mut rules = String::new();
	for finding in findings {
		rules.push_str(&format!("- {} ({}): {}\n", finding.id, finding.impact, finding.help));
	}
	format!(
		"You are an accessibility expert. A page has {total_violations} accessibility violations, including:\n\
		 {rules}\n\
		 Write a two sentence plain-text summary of the page's accessibility and the most important fix."
	)
}

/// Removes a surrounding markdown code fence, with or without a language tag.
pub fn strip_code_fence(text: &str) -> &str {
	let trimmed = text.trim();
	let Some(rest) = trimmed.strip_prefix("```") else {
		return trimmed;
	};
	// Language tag, e.g. `json`, on the same line as the opening fence.
	let tag_len = rest.find(|c: char| !c.is_ascii_alphanumeric()).unwrap_or(rest.len());
	let body = rest[tag_len..].trim();
	body.strip_suffix("```").unwrap_or(body).trim()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExplanationBody {
	explanation: String,
	#[serde(default)]
	priority: Option<String>,
	#[serde(default)]
	remediation_steps: Vec<String>,
	#[serde(default)]
	user_impact: Option<String>,
}

/// Parses the service's JSON reply. Priority falls back to one derived from impact.
pub fn parse_explanation(text: &str, finding: &RawFinding) -> Result<AiExplanation, EnrichmentFailure> {
	let body: ExplanationBody = serde_json::from_str(strip_code_fence(text)).map_err(|err| EnrichmentFailure::Parse(err.to_string()))?;
	if body.explanation.trim().is_empty() {
		return Err(EnrichmentFailure::Parse("empty explanation".into()));
	}

	Ok(AiExplanation {
		explanation: body.explanation,
		priority: body
			.priority
			.as_deref()
			.and_then(Priority::parse)
			.unwrap_or_else(|| Priority::from(finding.impact)),
		remediation_steps: body.remediation_steps,
		user_impact: body.user_impact.unwrap_or_default(),
		fallback: false,
	})
}
