//! Scan request and report envelopes.

use serde::{Deserialize, Serialize};

use crate::finding::Finding;

/// Inbound scan request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
	#[serde(default)]
	pub url: Option<String>,
}

impl ScanRequest {
	pub fn new(url: impl Into<String>) -> Self {
		Self { url: Some(url.into()) }
	}
}

/// Counts derived directly from the rule engine result sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
	pub total_violations: usize,
	pub total_passes: usize,
	pub total_incomplete: usize,
}

/// How the analysis step ended.
///
/// A timed-out or failed analysis reports zero findings, so callers need this
/// to tell a clean page from a page that was never fully audited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnalysisStatus {
	#[default]
	Completed,
	TimedOut,
	Failed,
}

/// The assembled result of one scan. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
	pub url: String,
	/// RFC 3339 timestamp taken when the report was assembled.
	pub timestamp: String,
	pub processing_time_ms: u64,
	pub summary: ScanSummary,
	pub findings: Vec<Finding>,
	pub remaining_violation_count: usize,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub ai_summary: Option<String>,
	#[serde(default)]
	pub analysis_status: AnalysisStatus,
}

impl ScanReport {
	/// Number of findings carrying an explanation.
	pub fn enriched_count(&self) -> usize {
		self.findings.iter().filter(|f| f.is_enriched()).count()
	}
}

/// `max(0, total_violations - max_count)`.
pub fn remaining_violation_count(total_violations: usize, max_count: usize) -> usize {
	total_violations.saturating_sub(max_count)
}
