//! Result envelope and printers for the `scan` command.

mod format;

use std::io::{self, Write};

use a11y_protocol::{ErrorPayload, ScanReport};
use serde::Serialize;

pub use format::OutputFormat;

/// The envelope printed for every command invocation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult<T: Serialize> {
	pub ok: bool,
	pub command: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<ErrorPayload>,
}

impl<T: Serialize> CommandResult<T> {
	pub fn success(command: impl Into<String>, data: T) -> Self {
		Self {
			ok: true,
			command: command.into(),
			data: Some(data),
			error: None,
		}
	}

	pub fn failure(command: impl Into<String>, error: ErrorPayload) -> Self {
		Self {
			ok: false,
			command: command.into(),
			data: None,
			error: Some(error),
		}
	}
}

/// Print a scan result to stdout in the specified format.
pub fn print_result(result: &CommandResult<ScanReport>, format: OutputFormat) {
	match format {
		OutputFormat::Toon => {
			if let Ok(json_value) = serde_json::to_value(result) {
				println!("{}", toon::encode(&json_value, None));
			}
		}
		OutputFormat::Json => {
			if let Ok(json) = serde_json::to_string_pretty(result) {
				println!("{json}");
			}
		}
		OutputFormat::Ndjson => {
			if let Ok(json) = serde_json::to_string(result) {
				println!("{json}");
			}
		}
		OutputFormat::Text => {
			let mut stdout = io::stdout().lock();
			let _ = write_text(&mut stdout, result);
		}
	}
}

fn write_text(out: &mut impl Write, result: &CommandResult<ScanReport>) -> io::Result<()> {
	if let Some(ref error) = result.error {
		writeln!(out, "Error [{}]: {}", error.code, error.message)?;
		return Ok(());
	}
	let Some(ref report) = result.data else {
		return Ok(());
	};

	writeln!(out, "{} ({})", report.url, report.timestamp)?;
	writeln!(
		out,
		"{} violations, {} passes, {} incomplete in {}ms",
		report.summary.total_violations, report.summary.total_passes, report.summary.total_incomplete, report.processing_time_ms
	)?;
	if let Some(ref summary) = report.ai_summary {
		writeln!(out, "\n{summary}")?;
	}

	for finding in &report.findings {
		writeln!(out, "\n[{}] {}: {}", finding.raw.impact, finding.raw.id, finding.raw.help)?;
		for node in &finding.raw.nodes {
			writeln!(out, "  at {}", node.target.join(" "))?;
		}
		if let Some(ref ai) = finding.ai_explanation {
			writeln!(out, "  {}", ai.explanation)?;
			for (index, step) in ai.remediation_steps.iter().enumerate() {
				writeln!(out, "  {}. {step}", index + 1)?;
			}
		}
		if !finding.raw.help_url.is_empty() {
			writeln!(out, "  {}", finding.raw.help_url)?;
		}
	}

	if report.remaining_violation_count > 0 {
		writeln!(out, "\n{} more violations without explanations", report.remaining_violation_count)?;
	}
	Ok(())
}
